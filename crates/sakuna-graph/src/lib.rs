//! Sakuna Graph - Reference graph access
//!
//! Provides a read-only, in-memory triple store over the reference
//! gazetteer and taxonomy graphs, with subject-predicate-object lookup,
//! pattern queries and class-hierarchy queries.

use std::collections::HashMap;
use std::path::Path;

use sakuna_core::LoadError;
use thiserror::Error;

pub mod hierarchy;
pub mod ntriples;
pub mod vocab;

pub use hierarchy::ClassHierarchy;

// ============================================================================
// Error Types
// ============================================================================

/// Errors raised while loading a graph
#[derive(Error, Debug)]
pub enum GraphError {
    #[error("IO error reading graph: {path}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("N-Triples syntax error at line {line}: {message}")]
    Parse { line: usize, message: String },
}

impl From<GraphError> for LoadError {
    fn from(err: GraphError) -> Self {
        match err {
            GraphError::Io { path, source } => LoadError::Io {
                path: path.into(),
                source,
            },
            GraphError::Parse { line, message } => LoadError::Parse { line, message },
        }
    }
}

pub type Result<T> = std::result::Result<T, GraphError>;

// ============================================================================
// Terms and Triples
// ============================================================================

/// An RDF term
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Term {
    Iri(String),
    BlankNode(String),
    Literal {
        value: String,
        language: Option<String>,
        datatype: Option<String>,
    },
}

impl Term {
    pub fn iri(iri: impl Into<String>) -> Self {
        Self::Iri(iri.into())
    }

    pub fn literal(value: impl Into<String>) -> Self {
        Self::Literal {
            value: value.into(),
            language: None,
            datatype: None,
        }
    }

    /// IRI text, if this term is an IRI
    pub fn as_iri(&self) -> Option<&str> {
        match self {
            Self::Iri(iri) => Some(iri),
            _ => None,
        }
    }

    /// Lexical form of a literal, or the IRI / blank node label
    pub fn value(&self) -> &str {
        match self {
            Self::Iri(iri) => iri,
            Self::BlankNode(id) => id,
            Self::Literal { value, .. } => value,
        }
    }
}

impl std::fmt::Display for Term {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Iri(iri) => write!(f, "<{iri}>"),
            Self::BlankNode(id) => write!(f, "_:{id}"),
            Self::Literal {
                value,
                language: Some(lang),
                ..
            } => write!(f, "{value:?}@{lang}"),
            Self::Literal {
                value,
                datatype: Some(dt),
                ..
            } => write!(f, "{value:?}^^<{dt}>"),
            Self::Literal { value, .. } => write!(f, "{value:?}"),
        }
    }
}

/// A subject-predicate-object statement
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Triple {
    pub subject: Term,
    pub predicate: Term,
    pub object: Term,
}

/// Return the part of an IRI after the last `#` or `/`
pub fn local_name(iri: &str) -> &str {
    iri.rsplit(['#', '/']).next().unwrap_or(iri)
}

// ============================================================================
// Triple Store
// ============================================================================

/// Immutable in-memory graph with subject and predicate indexes
///
/// Query results are returned in insertion order, which makes every
/// downstream "first encountered" rule deterministic.
#[derive(Debug, Default)]
pub struct TripleStore {
    triples: Vec<Triple>,
    by_subject: HashMap<Term, Vec<usize>>,
    by_predicate: HashMap<Term, Vec<usize>>,
}

impl TripleStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from parsed triples
    pub fn from_triples(triples: impl IntoIterator<Item = Triple>) -> Self {
        let mut store = Self::new();
        for triple in triples {
            store.insert(triple);
        }
        store
    }

    /// Parse an N-Triples document
    pub fn from_ntriples(source: &str) -> Result<Self> {
        Ok(Self::from_triples(ntriples::parse(source)?))
    }

    /// Load an N-Triples file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| GraphError::Io {
            path: path.display().to_string(),
            source: e,
        })?;

        let store = Self::from_ntriples(&content)?;
        tracing::info!("Loaded {} triples from {}", store.len(), path.display());
        Ok(store)
    }

    fn insert(&mut self, triple: Triple) {
        let idx = self.triples.len();
        self.by_subject
            .entry(triple.subject.clone())
            .or_default()
            .push(idx);
        self.by_predicate
            .entry(triple.predicate.clone())
            .or_default()
            .push(idx);
        self.triples.push(triple);
    }

    pub fn len(&self) -> usize {
        self.triples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triples.is_empty()
    }

    /// Pattern query; `None` matches anything
    pub fn triples<'a, 'q>(
        &'a self,
        subject: Option<&'q Term>,
        predicate: Option<&'q Term>,
        object: Option<&'q Term>,
    ) -> impl Iterator<Item = &'a Triple> + 'q
    where
        'a: 'q,
    {
        let candidates: Box<dyn Iterator<Item = usize> + 'q> = match (subject, predicate) {
            (Some(s), _) => Box::new(Self::indexes(&self.by_subject, s)),
            (None, Some(p)) => Box::new(Self::indexes(&self.by_predicate, p)),
            (None, None) => Box::new(0..self.triples.len()),
        };

        candidates
            .map(move |idx| &self.triples[idx])
            .filter(move |t| subject.map_or(true, |s| &t.subject == s))
            .filter(move |t| predicate.map_or(true, |p| &t.predicate == p))
            .filter(move |t| object.map_or(true, |o| &t.object == o))
    }

    fn indexes<'a>(
        index: &'a HashMap<Term, Vec<usize>>,
        key: &Term,
    ) -> impl Iterator<Item = usize> + 'a {
        index.get(key).into_iter().flatten().copied()
    }

    /// First object of `subject predicate ?o`
    pub fn value(&self, subject: &Term, predicate: &Term) -> Option<&Term> {
        self.triples(Some(subject), Some(predicate), None)
            .next()
            .map(|t| &t.object)
    }

    /// Subjects typed with `class`, in insertion order, without duplicates
    pub fn subjects_of_type(&self, class: &str) -> Vec<&Term> {
        let rdf_type = Term::iri(vocab::RDF_TYPE);
        let class = Term::iri(class);

        let mut seen = std::collections::HashSet::new();
        self.triples(None, Some(&rdf_type), Some(&class))
            .map(|t| &t.subject)
            .filter(|s| seen.insert(*s))
            .collect()
    }
}

// ============================================================================
// Tests
// ============================================================================
