//! N-Triples reader
//!
//! Line-oriented parser for the N-Triples serialization used to ship
//! the gazetteer and taxonomy graphs.

use crate::{GraphError, Result, Term, Triple};

/// Parse a whole N-Triples document
pub fn parse(source: &str) -> Result<Vec<Triple>> {
    let mut triples = Vec::new();

    for (idx, raw) in source.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        triples.push(parse_line(line, idx + 1)?);
    }

    Ok(triples)
}

/// Parse one statement line
pub fn parse_line(line: &str, line_no: usize) -> Result<Triple> {
    let mut cursor = Cursor {
        rest: line,
        line: line_no,
    };

    let subject = cursor.term()?;
    if matches!(subject, Term::Literal { .. }) {
        return Err(cursor.error("subject must be an IRI or blank node"));
    }

    let predicate = cursor.term()?;
    if !matches!(predicate, Term::Iri(_)) {
        return Err(cursor.error("predicate must be an IRI"));
    }

    let object = cursor.term()?;

    cursor.skip_ws();
    if !cursor.eat('.') {
        return Err(cursor.error("expected '.' at end of statement"));
    }
    cursor.skip_ws();
    if !cursor.rest.is_empty() && !cursor.rest.starts_with('#') {
        return Err(cursor.error("unexpected content after '.'"));
    }

    Ok(Triple {
        subject,
        predicate,
        object,
    })
}

struct Cursor<'a> {
    rest: &'a str,
    line: usize,
}

impl<'a> Cursor<'a> {
    fn error(&self, message: &str) -> GraphError {
        GraphError::Parse {
            line: self.line,
            message: message.to_string(),
        }
    }

    fn skip_ws(&mut self) {
        self.rest = self.rest.trim_start();
    }

    fn eat(&mut self, c: char) -> bool {
        if let Some(rest) = self.rest.strip_prefix(c) {
            self.rest = rest;
            true
        } else {
            false
        }
    }

    fn term(&mut self) -> Result<Term> {
        self.skip_ws();
        match self.rest.chars().next() {
            Some('<') => Ok(Term::Iri(self.iri()?)),
            Some('_') => self.blank_node(),
            Some('"') => self.literal(),
            Some(_) => Err(self.error("expected '<', '_:' or '\"'")),
            None => Err(self.error("unexpected end of line")),
        }
    }

    fn iri(&mut self) -> Result<String> {
        self.eat('<');
        let end = self
            .rest
            .find('>')
            .ok_or_else(|| self.error("unterminated IRI"))?;
        let iri = unescape(&self.rest[..end]).map_err(|m| self.error(&m))?;
        self.rest = &self.rest[end + 1..];
        Ok(iri)
    }

    fn blank_node(&mut self) -> Result<Term> {
        let rest = self
            .rest
            .strip_prefix("_:")
            .ok_or_else(|| self.error("expected '_:'"))?;

        let mut end = rest
            .find(|c: char| !(c.is_alphanumeric() || matches!(c, '_' | '-' | '.')))
            .unwrap_or(rest.len());
        // a label never ends with '.', that one terminates the statement
        while end > 0 && rest[..end].ends_with('.') {
            end -= 1;
        }
        if end == 0 {
            return Err(self.error("empty blank node label"));
        }

        let label = rest[..end].to_string();
        self.rest = &rest[end..];
        Ok(Term::BlankNode(label))
    }

    fn literal(&mut self) -> Result<Term> {
        self.eat('"');

        let text = self.rest;
        let mut value = String::new();
        let mut chars = text.char_indices();
        let consumed = loop {
            match chars.next() {
                Some((idx, '"')) => break idx + 1,
                Some((_, '\\')) => {
                    let escaped = match chars.next() {
                        Some((_, 't')) => '\t',
                        Some((_, 'b')) => '\u{08}',
                        Some((_, 'n')) => '\n',
                        Some((_, 'r')) => '\r',
                        Some((_, 'f')) => '\u{0C}',
                        Some((_, '"')) => '"',
                        Some((_, '\'')) => '\'',
                        Some((_, '\\')) => '\\',
                        Some((_, 'u')) => hex_char(&mut chars, 4).map_err(|m| self.error(&m))?,
                        Some((_, 'U')) => hex_char(&mut chars, 8).map_err(|m| self.error(&m))?,
                        _ => return Err(self.error("invalid escape sequence")),
                    };
                    value.push(escaped);
                }
                Some((_, c)) => value.push(c),
                None => return Err(self.error("unterminated literal")),
            }
        };
        self.rest = &text[consumed..];

        let mut language = None;
        let mut datatype = None;
        if self.eat('@') {
            let end = self
                .rest
                .find(|c: char| !(c.is_ascii_alphanumeric() || c == '-'))
                .unwrap_or(self.rest.len());
            if end == 0 {
                return Err(self.error("empty language tag"));
            }
            language = Some(self.rest[..end].to_string());
            self.rest = &self.rest[end..];
        } else if let Some(rest) = self.rest.strip_prefix("^^") {
            self.rest = rest;
            if !self.rest.starts_with('<') {
                return Err(self.error("expected datatype IRI"));
            }
            datatype = Some(self.iri()?);
        }

        Ok(Term::Literal {
            value,
            language,
            datatype,
        })
    }
}

fn hex_char(chars: &mut std::str::CharIndices<'_>, len: usize) -> std::result::Result<char, String> {
    let digits: String = chars.by_ref().take(len).map(|(_, c)| c).collect();
    if digits.len() != len {
        return Err("truncated unicode escape".to_string());
    }
    u32::from_str_radix(&digits, 16)
        .ok()
        .and_then(char::from_u32)
        .ok_or_else(|| format!("invalid unicode escape \\u{digits}"))
}

fn unescape(iri: &str) -> std::result::Result<String, String> {
    if !iri.contains('\\') {
        return Ok(iri.to_string());
    }

    let mut out = String::with_capacity(iri.len());
    let mut chars = iri.char_indices();
    while let Some((_, c)) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some((_, 'u')) => out.push(hex_char(&mut chars, 4)?),
            Some((_, 'U')) => out.push(hex_char(&mut chars, 8)?),
            _ => return Err("invalid escape in IRI".to_string()),
        }
    }
    Ok(out)
}
