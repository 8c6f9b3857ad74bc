//! Secondary lookups used to verify reconciled candidates.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use harvester_core::{canonicalize, LookupVerdict};
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LookupError {
    #[error("cannot read follow graph {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("follow graph is malformed: {0}")]
    Format(#[from] serde_json::Error),
}

/// Answers "does this candidate follow the origin account?".
pub trait FollowLookup {
    fn lookup(&mut self, candidate: &str) -> LookupVerdict;
}

impl<F> FollowLookup for F
where
    F: FnMut(&str) -> LookupVerdict,
{
    fn lookup(&mut self, candidate: &str) -> LookupVerdict {
        self(candidate)
    }
}

/// Candidates' own following lists, captured ahead of time.
///
/// ```json
/// { "following": { "alice": ["origin", "bob"] }, "restricted": ["carol"] }
/// ```
/// A candidate absent from both sections is undetermined.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CapturedFollowGraph {
    #[serde(default)]
    following: HashMap<String, Vec<String>>,
    #[serde(default)]
    restricted: HashSet<String>,
}

impl CapturedFollowGraph {
    pub fn from_json(body: &str) -> Result<Self, LookupError> {
        Ok(serde_json::from_str(body)?)
    }

    pub fn load(path: &Path) -> Result<Self, LookupError> {
        let body = fs::read_to_string(path).map_err(|source| LookupError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&body)
    }

    /// Lookup against `origin`, matched by canonical form.
    pub fn lookup_for(&self, origin: &str) -> GraphLookup<'_> {
        GraphLookup {
            graph: self,
            origin: canonicalize(origin),
        }
    }
}

pub struct GraphLookup<'a> {
    graph: &'a CapturedFollowGraph,
    origin: String,
}

impl FollowLookup for GraphLookup<'_> {
    fn lookup(&mut self, candidate: &str) -> LookupVerdict {
        if self.graph.restricted.contains(candidate) {
            return LookupVerdict::Restricted;
        }
        match self.graph.following.get(candidate) {
            Some(follows) if follows.iter().any(|f| canonicalize(f) == self.origin) => {
                LookupVerdict::FollowsBack
            }
            Some(_) => LookupVerdict::NotFollowing,
            None => LookupVerdict::Undetermined,
        }
    }
}
