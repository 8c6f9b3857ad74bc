//! Progress tracking and termination policy for one harvest run.
//!
//! [`ScrollState`] is a pure state machine: the engine feeds it one
//! [`Observation`] per scroll iteration and acts on the returned [`Verdict`].
//! Keeping the policy free of IO lets the thresholds be exercised directly
//! in tests.

use std::fmt;

/// Thresholds governing when a harvest run stops.
///
/// The ratios and counts were tuned empirically against the live site; they
/// are exposed so callers can override them rather than baked into the loop.
#[derive(Debug, Clone, PartialEq)]
pub struct HarvestPolicy {
    /// Hard ceiling on scroll iterations.
    pub max_iterations: u64,
    /// Consecutive stable iterations that end the run.
    pub stable_threshold: u32,
    /// Stable iterations beyond which the run stops regardless of overrides.
    pub emergency_stable_limit: u32,
    /// Consecutive unchanged-extent iterations tolerated before extent
    /// stagnation starts counting as a stability signal.
    pub extent_stall_grace: u32,
    /// Share of the expected size that counts as complete.
    pub target_ratio: f64,
    /// Share of the expected size at which the stability stop is held back.
    pub near_target_ratio: f64,
    /// Stable iterations after which a held stability stop is re-armed.
    pub near_target_patience: u32,
    /// Below this share the result is considered unreliable.
    pub low_confidence_ratio: f64,
    /// Below this share a shortfall warning is raised.
    pub shortfall_ratio: f64,
}

impl Default for HarvestPolicy {
    fn default() -> Self {
        Self {
            max_iterations: 1000,
            stable_threshold: 10,
            emergency_stable_limit: 25,
            extent_stall_grace: 10,
            target_ratio: 0.98,
            near_target_ratio: 0.95,
            near_target_patience: 5,
            low_confidence_ratio: 0.5,
            shortfall_ratio: 0.9,
        }
    }
}

/// What the engine measured after one scroll + extraction pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Observation {
    /// Size of the accumulated set after merging this iteration's candidates.
    pub collected: usize,
    /// Content extent, or `None` when the query failed this iteration.
    pub extent: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    Stable,
    TargetReached,
    EmergencyStop,
    IterationCeiling,
    Cancelled,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::Stable => write!(f, "collection stabilised"),
            StopReason::TargetReached => write!(f, "expected count reached"),
            StopReason::EmergencyStop => write!(f, "emergency stop after prolonged stall"),
            StopReason::IterationCeiling => write!(f, "iteration ceiling reached"),
            StopReason::Cancelled => write!(f, "cancelled"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Continue,
    Stop(StopReason),
}

/// Per-run progress record. Discarded when the run ends.
#[derive(Debug, Clone)]
pub struct ScrollState {
    policy: HarvestPolicy,
    expected: Option<u64>,
    iteration: u64,
    stable: u32,
    baseline: Option<usize>,
    last_extent: Option<u64>,
    extent_stalls: u32,
    hold_for_target: bool,
    rearmed: bool,
}

impl ScrollState {
    pub fn new(policy: HarvestPolicy, expected: Option<u64>) -> Self {
        Self {
            policy,
            expected: expected.filter(|count| *count > 0),
            iteration: 0,
            stable: 0,
            baseline: None,
            last_extent: None,
            extent_stalls: 0,
            hold_for_target: false,
            rearmed: false,
        }
    }

    pub fn policy(&self) -> &HarvestPolicy {
        &self.policy
    }

    /// Number of observations recorded so far.
    pub fn iteration(&self) -> u64 {
        self.iteration
    }

    pub fn stable_iterations(&self) -> u32 {
        self.stable
    }

    /// Whether the near-target rule is currently suppressing the stability stop.
    pub fn stability_stop_held(&self) -> bool {
        self.hold_for_target
    }

    /// Records one iteration and decides whether the run continues.
    pub fn observe(&mut self, observation: Observation) -> Verdict {
        self.iteration += 1;
        self.track_growth(observation.collected);
        if let Some(extent) = observation.extent {
            self.track_extent(extent);
        }
        self.decide(observation.collected)
    }

    fn track_growth(&mut self, collected: usize) {
        match self.baseline {
            Some(baseline) if collected <= baseline => self.stable += 1,
            _ => {
                self.stable = 0;
                self.baseline = Some(collected);
            }
        }
    }

    fn track_extent(&mut self, extent: u64) {
        if self.last_extent == Some(extent) {
            self.extent_stalls += 1;
            if self.extent_stalls > self.policy.extent_stall_grace {
                self.stable += 1;
            }
        } else {
            self.extent_stalls = 0;
        }
        self.last_extent = Some(extent);
    }

    fn decide(&mut self, collected: usize) -> Verdict {
        let policy = &self.policy;

        if self.stable >= policy.stable_threshold && !self.hold_for_target {
            return Verdict::Stop(StopReason::Stable);
        }

        if let Some(expected) = self.expected {
            let ratio = collected as f64 / expected as f64;
            if ratio >= policy.target_ratio {
                return Verdict::Stop(StopReason::TargetReached);
            }
            if ratio >= policy.near_target_ratio {
                if self.stable >= policy.near_target_patience {
                    self.hold_for_target = false;
                    self.rearmed = true;
                } else if !self.rearmed {
                    self.hold_for_target = true;
                }
            }
        }

        if self.stable > policy.emergency_stable_limit {
            return Verdict::Stop(StopReason::EmergencyStop);
        }
        if self.iteration >= policy.max_iterations {
            return Verdict::Stop(StopReason::IterationCeiling);
        }
        Verdict::Continue
    }
}

/// How far a finished run got relative to its expected size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Confidence {
    /// No usable expected count; completeness cannot be measured.
    Unmeasured,
    Met { achieved: f64 },
    Shortfall { achieved: f64 },
    /// Too far below expectation to trust; an alternate path should be tried.
    Low { achieved: f64 },
}

impl Confidence {
    pub fn assess(collected: usize, expected: Option<u64>, policy: &HarvestPolicy) -> Self {
        let Some(expected) = expected.filter(|count| *count > 0) else {
            return Confidence::Unmeasured;
        };
        let achieved = collected as f64 / expected as f64;
        if achieved < policy.low_confidence_ratio {
            Confidence::Low { achieved }
        } else if achieved < policy.shortfall_ratio {
            Confidence::Shortfall { achieved }
        } else {
            Confidence::Met { achieved }
        }
    }

    pub fn is_low(&self) -> bool {
        matches!(self, Confidence::Low { .. })
    }

    pub fn achieved(&self) -> Option<f64> {
        match *self {
            Confidence::Unmeasured => None,
            Confidence::Met { achieved }
            | Confidence::Shortfall { achieved }
            | Confidence::Low { achieved } => Some(achieved),
        }
    }
}
