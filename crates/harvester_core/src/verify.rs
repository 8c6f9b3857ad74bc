use std::collections::BTreeSet;

use rand::seq::SliceRandom;
use rand::Rng;

use crate::CancelToken;

/// Answer from the targeted secondary lookup for one candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupVerdict {
    /// The candidate's own list does not contain the origin account.
    NotFollowing,
    /// The candidate does follow the origin account.
    FollowsBack,
    /// The candidate's lists are not visible (private account).
    Restricted,
    /// The lookup could not reach a conclusion.
    Undetermined,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Judgment {
    Confirmed,
    FalsePositive,
    Inconclusive,
}

/// Business rules for lookups that cannot settle the question.
///
/// Both default to keeping the reconciler's classification; each can be
/// switched off on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerificationPolicy {
    /// Treat a restricted account as a confirmed non-follower.
    pub restricted_as_non_follower: bool,
    /// Let the original classification stand when a lookup is undetermined.
    pub undetermined_as_confirmed: bool,
}

impl Default for VerificationPolicy {
    fn default() -> Self {
        Self {
            restricted_as_non_follower: true,
            undetermined_as_confirmed: true,
        }
    }
}

impl VerificationPolicy {
    pub fn judge(&self, verdict: LookupVerdict) -> Judgment {
        match verdict {
            LookupVerdict::NotFollowing => Judgment::Confirmed,
            LookupVerdict::FollowsBack => Judgment::FalsePositive,
            LookupVerdict::Restricted if self.restricted_as_non_follower => Judgment::Confirmed,
            LookupVerdict::Undetermined if self.undetermined_as_confirmed => Judgment::Confirmed,
            LookupVerdict::Restricted | LookupVerdict::Undetermined => Judgment::Inconclusive,
        }
    }
}

/// Confidence report over a random sample of reconciler output.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct VerificationOutcome {
    judgments: Vec<(String, Judgment)>,
    cancelled: bool,
}

impl VerificationOutcome {
    pub fn judgments(&self) -> &[(String, Judgment)] {
        &self.judgments
    }

    pub fn sampled(&self) -> usize {
        self.judgments.len()
    }

    pub fn confirmed(&self) -> usize {
        self.count(Judgment::Confirmed)
    }

    pub fn inconclusive(&self) -> usize {
        self.count(Judgment::Inconclusive)
    }

    /// `confirmed / sampled`, or `None` when nothing was checked.
    pub fn accuracy(&self) -> Option<f64> {
        if self.judgments.is_empty() {
            None
        } else {
            Some(self.confirmed() as f64 / self.sampled() as f64)
        }
    }

    /// Identifiers the lookup showed to follow back after all.
    pub fn contradicted(&self) -> Vec<String> {
        self.judgments
            .iter()
            .filter(|(_, judgment)| *judgment == Judgment::FalsePositive)
            .map(|(raw, _)| raw.clone())
            .collect()
    }

    /// True when the sample loop stopped early on cancellation.
    pub fn was_cancelled(&self) -> bool {
        self.cancelled
    }

    fn count(&self, wanted: Judgment) -> usize {
        self.judgments
            .iter()
            .filter(|(_, judgment)| *judgment == wanted)
            .count()
    }
}

/// Re-checks a uniform sample of `min(sample_size, |candidates|)` identifiers.
///
/// Sampling is without replacement over the de-duplicated candidates.
/// Cancellation is observed before each lookup.
pub fn verify<I, S, L, R>(
    candidates: I,
    sample_size: usize,
    mut lookup: L,
    policy: VerificationPolicy,
    rng: &mut R,
    cancel: &CancelToken,
) -> VerificationOutcome
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
    L: FnMut(&str) -> LookupVerdict,
    R: Rng + ?Sized,
{
    let pool: Vec<String> = candidates
        .into_iter()
        .map(|raw| raw.as_ref().to_string())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let amount = sample_size.min(pool.len());

    let mut outcome = VerificationOutcome::default();
    for raw in pool.choose_multiple(rng, amount) {
        if cancel.is_cancelled() {
            outcome.cancelled = true;
            break;
        }
        let judgment = policy.judge(lookup(raw.as_str()));
        outcome.judgments.push((raw.clone(), judgment));
    }
    outcome
}
