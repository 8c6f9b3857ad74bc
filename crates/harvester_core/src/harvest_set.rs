use std::collections::BTreeSet;
use std::fmt;

/// Which relationship list a harvest run targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListKind {
    Following,
    Followers,
}

impl ListKind {
    pub fn label(self) -> &'static str {
        match self {
            ListKind::Following => "following",
            ListKind::Followers => "followers",
        }
    }
}

impl fmt::Display for ListKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Unique raw identifiers collected by one harvest run.
///
/// The set only grows while the run is active. `BTreeSet` keeps every report
/// and serialized list in a stable order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarvestSet {
    kind: ListKind,
    expected: Option<u64>,
    members: BTreeSet<String>,
}

impl HarvestSet {
    pub fn new(kind: ListKind, expected: Option<u64>) -> Self {
        Self {
            kind,
            expected,
            members: BTreeSet::new(),
        }
    }

    /// Builds a set from an already collected list; duplicates and blank
    /// entries are dropped.
    pub fn from_members<I, S>(kind: ListKind, members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut set = Self::new(kind, None);
        set.absorb(members);
        set
    }

    pub fn kind(&self) -> ListKind {
        self.kind
    }

    pub fn label(&self) -> &'static str {
        self.kind.label()
    }

    pub fn expected(&self) -> Option<u64> {
        self.expected
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn contains(&self, raw: &str) -> bool {
        self.members.contains(raw)
    }

    /// Adds one identifier. Returns `true` if it was not yet present.
    pub fn insert(&mut self, raw: impl Into<String>) -> bool {
        let raw = raw.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return false;
        }
        if trimmed.len() == raw.len() {
            self.members.insert(raw)
        } else {
            self.members.insert(trimmed.to_string())
        }
    }

    /// Unions `batch` into the set and returns how many entries were new.
    pub fn absorb<I, S>(&mut self, batch: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut added = 0;
        for raw in batch {
            if self.insert(raw) {
                added += 1;
            }
        }
        added
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.members.iter().map(String::as_str)
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.members.iter().cloned().collect()
    }

    /// Share of the expected size reached, when an expectation is known.
    pub fn achieved_ratio(&self) -> Option<f64> {
        match self.expected {
            Some(expected) if expected > 0 => Some(self.len() as f64 / expected as f64),
            _ => None,
        }
    }
}

impl<'a> IntoIterator for &'a HarvestSet {
    type Item = &'a String;
    type IntoIter = std::collections::btree_set::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.members.iter()
    }
}
