//! Human-readable name tables for states and events.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;

/// Ordered list of names indexed by state or event id.
///
/// Tables may be shorter than the declared count; lookups past the end
/// fall back to a numeric rendering through [`NameRef`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameTable {
    names: Vec<Cow<'static, str>>,
}

impl NameTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Look up a name without fallback.
    pub fn get(&self, index: usize) -> Option<&str> {
        self.names.get(index).map(|name| name.as_ref())
    }

    /// Look up a name, falling back to `#<index>` when the table has no entry.
    pub fn name(&self, index: usize) -> NameRef<'_> {
        match self.get(index) {
            Some(name) => NameRef::Named(name),
            None => NameRef::Index(index),
        }
    }
}

impl From<&'static [&'static str]> for NameTable {
    fn from(names: &'static [&'static str]) -> Self {
        Self {
            names: names.iter().map(|name| Cow::Borrowed(*name)).collect(),
        }
    }
}

impl<const N: usize> From<[&'static str; N]> for NameTable {
    fn from(names: [&'static str; N]) -> Self {
        Self {
            names: names.into_iter().map(Cow::Borrowed).collect(),
        }
    }
}

impl From<Vec<String>> for NameTable {
    fn from(names: Vec<String>) -> Self {
        Self {
            names: names.into_iter().map(Cow::Owned).collect(),
        }
    }
}

/// A resolved name, or the raw index when no name was declared.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NameRef<'a> {
    Named(&'a str),
    Index(usize),
}

impl fmt::Display for NameRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(name) => f.write_str(name),
            Self::Index(index) => write!(f, "#{index}"),
        }
    }
}
