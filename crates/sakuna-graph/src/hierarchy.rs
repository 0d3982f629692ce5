//! Class hierarchy over `rdfs:subClassOf`

use std::collections::HashMap;

use petgraph::algo::has_path_connecting;
use petgraph::graphmap::DiGraphMap;
use petgraph::Direction;

use crate::{vocab, Term, TripleStore};

/// Directed subclass graph; edges point from child to parent
#[derive(Debug, Default)]
pub struct ClassHierarchy {
    graph: DiGraphMap<usize, ()>,
    names: Vec<String>,
    index: HashMap<String, usize>,
}

impl ClassHierarchy {
    /// Collect every `rdfs:subClassOf` edge between IRIs
    pub fn from_store(store: &TripleStore) -> Self {
        let mut hierarchy = Self::default();
        let sub_class_of = Term::iri(vocab::RDFS_SUBCLASS_OF);

        for triple in store.triples(None, Some(&sub_class_of), None) {
            if let (Some(child), Some(parent)) = (triple.subject.as_iri(), triple.object.as_iri()) {
                let c = hierarchy.node(child);
                let p = hierarchy.node(parent);
                hierarchy.graph.add_edge(c, p, ());
            }
        }

        hierarchy
    }

    fn node(&mut self, iri: &str) -> usize {
        if let Some(&idx) = self.index.get(iri) {
            return idx;
        }
        let idx = self.names.len();
        self.names.push(iri.to_string());
        self.index.insert(iri.to_string(), idx);
        self.graph.add_node(idx);
        idx
    }

    /// True if `class` reaches `ancestor` through one or more subclass steps
    pub fn descends_from(&self, class: &str, ancestor: &str) -> bool {
        let (Some(&c), Some(&a)) = (self.index.get(class), self.index.get(ancestor)) else {
            return false;
        };

        self.graph
            .neighbors_directed(c, Direction::Outgoing)
            .any(|parent| parent == a || has_path_connecting(&self.graph, parent, a, None))
    }

    /// True if no class names `class` as its parent
    pub fn is_leaf(&self, class: &str) -> bool {
        match self.index.get(class) {
            Some(&idx) => self
                .graph
                .neighbors_directed(idx, Direction::Incoming)
                .next()
                .is_none(),
            None => true,
        }
    }

    /// Every class seen in the hierarchy, in first-appearance order
    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
