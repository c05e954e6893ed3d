//! Selecting documents by `(metadata.name, kind)`.
//!
//! A [`Selector`] pairs a name matcher and a kind matcher with an exclusion
//! list. It is a pure predicate: selecting never fails, and an empty store
//! simply matches nothing.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::document::{self, Document};

/// Matches one axis of a document's identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Match {
    /// Matches every value, including a missing one.
    Any,
    /// Matches exactly this value.
    Exact(String),
}

impl Match {
    /// Test a possibly missing value against this matcher.
    pub fn matches(&self, value: Option<&str>) -> bool {
        match self {
            Match::Any => true,
            Match::Exact(expected) => value == Some(expected.as_str()),
        }
    }
}

impl From<&str> for Match {
    /// `"*"` is the configuration spelling of [`Match::Any`].
    fn from(value: &str) -> Self {
        if value == "*" {
            Match::Any
        } else {
            Match::Exact(value.to_string())
        }
    }
}

impl fmt::Display for Match {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Match::Any => f.write_str("*"),
            Match::Exact(value) => f.write_str(value),
        }
    }
}

impl Serialize for Match {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Match {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Match::from(raw.as_str()))
    }
}

/// A predicate over `(name, kind)` with exclusions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    pub name: Match,
    pub kind: Match,
    /// `(name, kind)` pairs that never match, even when selected otherwise.
    pub exclude: Vec<(String, String)>,
}

impl Selector {
    pub fn new(name: impl Into<Match>, kind: impl Into<Match>) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
            exclude: Vec::new(),
        }
    }

    /// Selects every document.
    pub fn any() -> Self {
        Self::new(Match::Any, Match::Any)
    }

    pub fn excluding(mut self, exclude: Vec<(String, String)>) -> Self {
        self.exclude = exclude;
        self
    }

    /// Test a bare `(name, kind)` pair, as found in role-binding subjects.
    pub fn matches_pair(&self, name: Option<&str>, kind: Option<&str>) -> bool {
        self.name.matches(name)
            && self.kind.matches(kind)
            && !self
                .exclude
                .iter()
                .any(|(n, k)| name == Some(n.as_str()) && kind == Some(k.as_str()))
    }

    /// Test a document by its `metadata.name` and `kind`.
    pub fn matches(&self, doc: &Document) -> bool {
        self.matches_pair(document::name(doc), document::kind(doc))
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.kind, self.name)?;
        if !self.exclude.is_empty() {
            write!(f, " (excluding {} pairs)", self.exclude.len())?;
        }
        Ok(())
    }
}
