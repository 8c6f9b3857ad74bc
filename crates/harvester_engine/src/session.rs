//! One audit: harvest both lists, reconcile, optionally verify.

use std::path::PathBuf;

use engine_logging::{engine_error, engine_info, engine_warn};
use harvester_core::{
    reconcile, verify, CancelToken, Confidence, DifferenceResult, HarvestSet, ListKind,
    ReconcileOptions, StopReason, VerificationOutcome, VerificationPolicy,
};
use rand::Rng;
use thiserror::Error;

use crate::driver::ScrollContainer;
use crate::fallback::PageScrollFallback;
use crate::harvest::{HarvestError, HarvestOutcome, HarvestReport, Harvester};
use crate::lookup::FollowLookup;
use crate::pacing::Pacer;
use crate::persist::ListStore;

pub const NON_FOLLOWERS_LABEL: &str = "non_followers";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuditError {
    #[error("neither list could be harvested (following: {following}; followers: {followers})")]
    BothSourcesUnavailable { following: String, followers: String },
}

/// A harvested list and where it was saved.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectedList {
    pub report: HarvestReport,
    pub used_fallback: bool,
    pub saved_to: Option<PathBuf>,
}

pub struct AuditSession<P: Pacer> {
    username: String,
    harvester: Harvester<P>,
    fallback: PageScrollFallback,
    store: Option<ListStore>,
    cancel: CancelToken,
}

impl<P: Pacer> AuditSession<P> {
    pub fn new(username: impl Into<String>, harvester: Harvester<P>, cancel: CancelToken) -> Self {
        let fallback = PageScrollFallback {
            policy: harvester.config().policy.clone(),
            ..PageScrollFallback::default()
        };
        Self {
            username: username.into(),
            harvester,
            fallback,
            store: None,
            cancel,
        }
    }

    pub fn with_store(mut self, store: ListStore) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_fallback(mut self, fallback: PageScrollFallback) -> Self {
        self.fallback = fallback;
        self
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Harvests one list from `dialog`. When that fails or is untrustworthy
    /// and a full-page view is available, the page is scrolled as well and the
    /// two results are merged. A cancelled run is saved as collected so far.
    pub fn collect(
        &self,
        kind: ListKind,
        dialog: &mut dyn ScrollContainer,
        page: Option<&mut dyn ScrollContainer>,
        expected: Option<u64>,
    ) -> Result<CollectedList, HarvestError> {
        let primary = self.harvester.harvest(dialog, kind, expected, &self.cancel);

        let (report, used_fallback) = match (primary, page) {
            (Ok(outcome), _) if outcome.report().stop_reason == StopReason::Cancelled => {
                engine_warn!(
                    "{} harvest cancelled; keeping {} entries",
                    kind,
                    outcome.report().set.len()
                );
                (outcome.into_report(), false)
            }
            (Ok(HarvestOutcome::Converged(report)), _) => (report, false),
            (Ok(HarvestOutcome::LowConfidence(report)), None) => {
                engine_warn!("keeping low-confidence {} list; no page view to fall back on", kind);
                (report, false)
            }
            (Ok(HarvestOutcome::LowConfidence(report)), Some(page)) => {
                match self.run_fallback(kind, page, expected) {
                    Ok(fallback) => (self.merge(report, fallback, expected), true),
                    Err(err) => {
                        engine_warn!("fallback failed, keeping dialog result: {}", err);
                        (report, false)
                    }
                }
            }
            (Err(err), None) => return Err(err),
            (Err(err), Some(page)) => {
                engine_warn!("{}; trying the page view", err);
                (self.run_fallback(kind, page, expected)?, true)
            }
        };

        let saved_to = self.save(kind.label(), &report.set.to_vec());
        Ok(CollectedList {
            report,
            used_fallback,
            saved_to,
        })
    }

    /// Reconciles whatever was harvested. A single missing side is treated
    /// as empty; only both missing is fatal.
    pub fn reconcile(
        &self,
        following: Result<HarvestSet, HarvestError>,
        followers: Result<HarvestSet, HarvestError>,
        options: ReconcileOptions,
    ) -> Result<DifferenceResult, AuditError> {
        let (following, followers) = match (following, followers) {
            (Err(a), Err(b)) => {
                return Err(AuditError::BothSourcesUnavailable {
                    following: a.to_string(),
                    followers: b.to_string(),
                })
            }
            (following, followers) => (
                following.unwrap_or_else(|err| self.empty_after(err, ListKind::Following)),
                followers.unwrap_or_else(|err| self.empty_after(err, ListKind::Followers)),
            ),
        };

        let result = reconcile(&following, &followers, options);
        engine_info!(
            "{} following, {} followers -> {} not following back (normalized pass {}, literal pass {}, self-check removed {})",
            following.len(),
            followers.len(),
            result.len(),
            result.normalized_pass().len(),
            result.literal_pass().len(),
            result.self_check_removed().len()
        );
        self.save(NON_FOLLOWERS_LABEL, &result.to_vec());
        Ok(result)
    }

    /// Samples `result`, removes contradicted members and re-saves when
    /// anything changed.
    pub fn verify<R: Rng + ?Sized>(
        &self,
        result: &mut DifferenceResult,
        sample_size: usize,
        lookup: &mut dyn FollowLookup,
        policy: VerificationPolicy,
        rng: &mut R,
    ) -> VerificationOutcome {
        let candidates = result.to_vec();
        let outcome = verify(
            &candidates,
            sample_size,
            |raw| lookup.lookup(raw),
            policy,
            rng,
            &self.cancel,
        );

        match outcome.accuracy() {
            Some(accuracy) => engine_info!(
                "verified {} of {}: {:.1}% confirmed, {} inconclusive",
                outcome.sampled(),
                candidates.len(),
                accuracy * 100.0,
                outcome.inconclusive()
            ),
            None => engine_info!("nothing to verify"),
        }
        if outcome.was_cancelled() {
            engine_warn!("verification cancelled after {} lookups", outcome.sampled());
        }

        let contradicted = outcome.contradicted();
        if !contradicted.is_empty() {
            engine_warn!("{} sampled accounts follow back after all: {:?}", contradicted.len(), contradicted);
            if result.apply_corrections(&contradicted) > 0 {
                self.save(NON_FOLLOWERS_LABEL, &result.to_vec());
            }
        }
        outcome
    }

    fn run_fallback(
        &self,
        kind: ListKind,
        page: &mut dyn ScrollContainer,
        expected: Option<u64>,
    ) -> Result<HarvestReport, HarvestError> {
        self.fallback
            .harvest(page, kind, expected, self.harvester.pacer(), &self.cancel)
    }

    fn merge(&self, primary: HarvestReport, mut fallback: HarvestReport, expected: Option<u64>) -> HarvestReport {
        let added = fallback.set.absorb(primary.set.iter());
        fallback.iterations += primary.iterations;
        fallback.discarded += primary.discarded;
        fallback.confidence =
            Confidence::assess(fallback.set.len(), expected, &self.harvester.config().policy);
        engine_info!(
            "merged dialog and page results: {} unique ({} only seen in the dialog)",
            fallback.set.len(),
            added
        );
        fallback
    }

    fn empty_after(&self, err: HarvestError, kind: ListKind) -> HarvestSet {
        engine_warn!("{}; reconciling against an empty {} list", err, kind);
        HarvestSet::new(kind, None)
    }

    fn save(&self, label: &str, members: &[String]) -> Option<PathBuf> {
        let store = self.store.as_ref()?;
        match store.save(&self.username, label, members) {
            Ok(path) => Some(path),
            Err(err) => {
                engine_error!("could not save {} list: {}", label, err);
                None
            }
        }
    }
}
