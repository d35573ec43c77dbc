use rkyv::{Archive, Deserialize, Serialize};
use std::fmt;

/// A node or relation identifier.
///
/// Tensor-sourced datasets carry dense integer indices, tabular datasets carry
/// string labels. Both are plain values so triples can be compared and hashed.
#[derive(Archive, Deserialize, Serialize, Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[archive(check_bytes)]
pub enum Term {
    Id(u64),
    Label(String),
}

impl Term {
    pub fn as_id(&self) -> Option<u64> {
        match self {
            Term::Id(id) => Some(*id),
            Term::Label(_) => None,
        }
    }
}

impl From<u64> for Term {
    fn from(id: u64) -> Self {
        Term::Id(id)
    }
}

impl From<&str> for Term {
    fn from(label: &str) -> Self {
        Term::Label(label.to_string())
    }
}

impl From<String> for Term {
    fn from(label: String) -> Self {
        Term::Label(label)
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Id(id) => write!(f, "{}", id),
            Term::Label(label) => write!(f, "{}", label),
        }
    }
}

/// One typed directed edge. Repeated triples are distinct occurrences.
#[derive(Archive, Deserialize, Serialize, Debug, Clone, PartialEq, Eq, Hash)]
#[archive(check_bytes)]
pub struct Triple {
    pub head: Term,
    pub relation: Term,
    pub tail: Term,
}

impl Triple {
    pub fn new(head: impl Into<Term>, relation: impl Into<Term>, tail: impl Into<Term>) -> Self {
        Self {
            head: head.into(),
            relation: relation.into(),
            tail: tail.into(),
        }
    }
}

impl fmt::Display for Triple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.head, self.relation, self.tail)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Split {
    Train,
    Validation,
    Test,
}

impl Split {
    pub const ALL: [Split; 3] = [Split::Train, Split::Validation, Split::Test];

    /// Token used in cache file names.
    pub fn as_str(&self) -> &'static str {
        match self {
            Split::Train => "train",
            Split::Validation => "valid",
            Split::Test => "test",
        }
    }
}

impl fmt::Display for Split {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
