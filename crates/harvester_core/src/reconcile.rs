use std::collections::{BTreeMap, BTreeSet, HashSet};

use crate::identity::canonicalize;
use crate::HarvestSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileOptions {
    /// Compare canonical forms in addition to exact strings.
    pub normalize: bool,
    /// Re-check the merged result against the canonical followers.
    /// Only meaningful when `normalize` is set.
    pub self_check: bool,
}

impl Default for ReconcileOptions {
    fn default() -> Self {
        Self {
            normalize: true,
            self_check: true,
        }
    }
}

/// Which pass flagged a member. Diagnostic only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Derivation {
    pub normalized: bool,
    pub literal: bool,
}

/// Accounts present in `following` but missing from `followers`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DifferenceResult {
    members: BTreeMap<String, Derivation>,
    normalized_pass: BTreeSet<String>,
    literal_pass: BTreeSet<String>,
    self_check_removed: BTreeSet<String>,
    corrected: BTreeSet<String>,
}

impl DifferenceResult {
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn contains(&self, raw: &str) -> bool {
        self.members.contains_key(raw)
    }

    pub fn members(&self) -> impl Iterator<Item = &str> {
        self.members.keys().map(String::as_str)
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.members.keys().cloned().collect()
    }

    pub fn derivation(&self, raw: &str) -> Option<Derivation> {
        self.members.get(raw).copied()
    }

    /// Members flagged by the canonical-form pass, before merging.
    pub fn normalized_pass(&self) -> &BTreeSet<String> {
        &self.normalized_pass
    }

    /// Members flagged by the exact-match pass, before merging.
    pub fn literal_pass(&self) -> &BTreeSet<String> {
        &self.literal_pass
    }

    /// Entries the self-check dropped from the merged result.
    pub fn self_check_removed(&self) -> &BTreeSet<String> {
        &self.self_check_removed
    }

    /// Entries removed after verification contradicted them.
    pub fn corrected(&self) -> &BTreeSet<String> {
        &self.corrected
    }

    /// Removes identifiers that verification showed to follow back.
    /// Returns how many were actually present.
    pub fn apply_corrections<I, S>(&mut self, contradicted: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut removed = 0;
        for raw in contradicted {
            let raw = raw.as_ref();
            if self.members.remove(raw).is_some() {
                self.corrected.insert(raw.to_string());
                removed += 1;
            }
        }
        removed
    }
}

/// Computes `following − followers`.
///
/// With normalization the canonical-form pass is unioned with the exact pass,
/// then the self-check drops anything whose canonical form does appear among
/// the followers. Inputs are never mutated and iteration order does not
/// affect the result.
pub fn reconcile(
    following: &HarvestSet,
    followers: &HarvestSet,
    options: ReconcileOptions,
) -> DifferenceResult {
    let following: BTreeSet<&str> = following.iter().collect();
    let followers: HashSet<&str> = followers.iter().collect();

    let literal_pass: BTreeSet<String> = following
        .iter()
        .filter(|raw| !followers.contains(*raw))
        .map(|raw| raw.to_string())
        .collect();

    let mut result = DifferenceResult::default();

    if !options.normalize {
        for raw in &literal_pass {
            result.members.insert(
                raw.clone(),
                Derivation {
                    normalized: false,
                    literal: true,
                },
            );
        }
        result.literal_pass = literal_pass;
        return result;
    }

    let canonical_followers: HashSet<String> = followers
        .iter()
        .map(|raw| canonicalize(raw))
        .filter(|canonical| !canonical.is_empty())
        .collect();

    let normalized_pass: BTreeSet<String> = following
        .iter()
        .filter(|raw| {
            let canonical = canonicalize(raw);
            !canonical.is_empty() && !canonical_followers.contains(&canonical)
        })
        .map(|raw| raw.to_string())
        .collect();

    for raw in normalized_pass.union(&literal_pass) {
        result.members.insert(
            raw.clone(),
            Derivation {
                normalized: normalized_pass.contains(raw),
                literal: literal_pass.contains(raw),
            },
        );
    }

    if options.self_check {
        let reintroduced: Vec<String> = result
            .members
            .keys()
            .filter(|raw| canonical_followers.contains(&canonicalize(raw)))
            .cloned()
            .collect();
        for raw in reintroduced {
            result.members.remove(&raw);
            result.self_check_removed.insert(raw);
        }
    }

    result.normalized_pass = normalized_pass;
    result.literal_pass = literal_pass;
    result
}
