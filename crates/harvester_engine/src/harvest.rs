//! The incremental harvest loop.

use std::time::Duration;

use engine_logging::{engine_debug, engine_info, engine_warn};
use harvester_core::{
    CancelToken, Confidence, HarvestPolicy, HarvestSet, ListKind, Observation, ScrollState,
    StopReason, Verdict,
};
use thiserror::Error;

use crate::driver::{Key, ScrollContainer};
use crate::extraction::{
    ExtractionPlan, ExtractionStrategy, LinkLikeElements, ProfileLinkTargets, TextMentions,
};
use crate::pacing::Pacer;
use crate::scrolling::{
    JumpToExtent, KeyboardPaging, Overshoot, ScrollContext, ScrollTechnique, StallRecovery,
};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HarvestError {
    #[error("{kind} list unavailable: {reason}")]
    SourceUnavailable { kind: ListKind, reason: String },
}

/// Tunables for one harvest run. Defaults match the live site's behaviour.
#[derive(Debug, Clone, PartialEq)]
pub struct HarvestConfig {
    pub policy: HarvestPolicy,
    /// Base wait after scrolling, before extraction.
    pub scroll_delay: Duration,
    /// Upper bound of the wait as a multiple of `scroll_delay`.
    pub jitter_factor: f64,
    pub overshoot_offset: u64,
    pub overshoot_every: u64,
    pub paging_every: u64,
    pub paging_presses: u32,
    pub key_pause: (Duration, Duration),
    pub recovery_every_stable: u32,
    pub recovery_pause: (Duration, Duration),
    pub link_min_candidates: usize,
    pub link_like_min_candidates: usize,
    pub text_scan_after_round: u64,
    /// Log progress at least this often even when nothing new arrived.
    pub progress_every: u64,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            policy: HarvestPolicy::default(),
            scroll_delay: Duration::from_secs(2),
            jitter_factor: 1.5,
            overshoot_offset: 1000,
            overshoot_every: 3,
            paging_every: 5,
            paging_presses: 10,
            key_pause: (Duration::from_millis(200), Duration::from_millis(400)),
            recovery_every_stable: 10,
            recovery_pause: (Duration::from_secs(1), Duration::from_secs(2)),
            link_min_candidates: 5,
            link_like_min_candidates: 3,
            text_scan_after_round: 3,
            progress_every: 5,
        }
    }
}

impl HarvestConfig {
    fn settle_window(&self) -> (Duration, Duration) {
        let max = self.scroll_delay.mul_f64(self.jitter_factor.max(1.0));
        (self.scroll_delay, max)
    }

    fn techniques(&self) -> Vec<Box<dyn ScrollTechnique>> {
        vec![
            Box::new(StallRecovery {
                every_stable: self.recovery_every_stable,
                pause: self.recovery_pause,
            }),
            Box::new(JumpToExtent),
            Box::new(Overshoot {
                offset: self.overshoot_offset,
                every: self.overshoot_every,
            }),
            Box::new(KeyboardPaging {
                presses: self.paging_presses,
                every: self.paging_every,
                pause: self.key_pause,
            }),
        ]
    }

    fn extraction_plan(&self) -> ExtractionPlan {
        let strategies: Vec<Box<dyn ExtractionStrategy>> = vec![
            Box::new(ProfileLinkTargets {
                min_candidates: self.link_min_candidates,
            }),
            Box::new(LinkLikeElements {
                min_candidates: self.link_like_min_candidates,
            }),
            Box::new(TextMentions {
                after_round: self.text_scan_after_round,
            }),
        ];
        ExtractionPlan::new(strategies)
    }
}

/// Everything a finished run knows about itself.
#[derive(Debug, Clone, PartialEq)]
pub struct HarvestReport {
    pub set: HarvestSet,
    pub iterations: u64,
    pub stop_reason: StopReason,
    pub confidence: Confidence,
    /// Rendered elements that yielded no valid identifier.
    pub discarded: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum HarvestOutcome {
    Converged(HarvestReport),
    /// Too far below the expected count to trust; try another path.
    LowConfidence(HarvestReport),
}

impl HarvestOutcome {
    pub fn report(&self) -> &HarvestReport {
        match self {
            HarvestOutcome::Converged(report) | HarvestOutcome::LowConfidence(report) => report,
        }
    }

    pub fn into_report(self) -> HarvestReport {
        match self {
            HarvestOutcome::Converged(report) | HarvestOutcome::LowConfidence(report) => report,
        }
    }

    pub fn is_low_confidence(&self) -> bool {
        matches!(self, HarvestOutcome::LowConfidence(_))
    }
}

pub struct Harvester<P: Pacer> {
    config: HarvestConfig,
    techniques: Vec<Box<dyn ScrollTechnique>>,
    plan: ExtractionPlan,
    pacer: P,
}

impl<P: Pacer> Harvester<P> {
    pub fn new(config: HarvestConfig, pacer: P) -> Self {
        Self {
            techniques: config.techniques(),
            plan: config.extraction_plan(),
            config,
            pacer,
        }
    }

    pub fn config(&self) -> &HarvestConfig {
        &self.config
    }

    pub fn pacer(&self) -> &P {
        &self.pacer
    }

    /// Scrolls `container` until the termination policy stops the run.
    ///
    /// Only a missing container is an error; every per-iteration driver
    /// failure is logged and absorbed.
    pub fn harvest(
        &self,
        container: &mut dyn ScrollContainer,
        kind: ListKind,
        expected: Option<u64>,
        cancel: &CancelToken,
    ) -> Result<HarvestOutcome, HarvestError> {
        engine_logging::set_harvest_context(kind.label());
        let outcome = self.run(container, kind, expected, cancel);
        engine_logging::clear_harvest_context();
        outcome
    }

    fn run(
        &self,
        container: &mut dyn ScrollContainer,
        kind: ListKind,
        expected: Option<u64>,
        cancel: &CancelToken,
    ) -> Result<HarvestOutcome, HarvestError> {
        container
            .locate()
            .map_err(|err| HarvestError::SourceUnavailable {
                kind,
                reason: err.to_string(),
            })?;

        match expected {
            Some(count) => engine_info!("harvesting {} (expecting {})", kind, count),
            None => engine_info!("harvesting {} (expected count unknown)", kind),
        }

        let mut set = HarvestSet::new(kind, expected);
        let mut state = ScrollState::new(self.config.policy.clone(), expected);
        let mut discarded = 0;
        let (settle_min, settle_max) = self.config.settle_window();

        let stop_reason = loop {
            if cancel.is_cancelled() {
                break StopReason::Cancelled;
            }
            let round = state.iteration();
            engine_logging::set_scroll_iteration(round + 1);

            self.advance(
                container,
                ScrollContext {
                    round,
                    stable: state.stable_iterations(),
                },
            );
            self.pacer.pause(settle_min, settle_max);

            let pass = self.plan.run(container, round);
            discarded += pass.discarded;
            let added = set.absorb(pass.candidates);

            let extent = match container.content_extent() {
                Ok(extent) => Some(extent),
                Err(err) => {
                    engine_debug!("extent query failed: {}", err);
                    None
                }
            };

            if added > 0 || round % self.config.progress_every.max(1) == 0 {
                engine_info!(
                    "{} collected (+{} new, via {})",
                    set.len(),
                    added,
                    pass.settled_by.unwrap_or("no strategy")
                );
            }

            if let Verdict::Stop(reason) = state.observe(Observation {
                collected: set.len(),
                extent,
            }) {
                break reason;
            }
        };

        let confidence = Confidence::assess(set.len(), expected, &self.config.policy);
        self.log_summary(&set, state.iteration(), stop_reason, confidence);

        if let Err(err) = container.press_key(Key::Escape) {
            engine_debug!("closing list view failed: {}", err);
        }

        let report = HarvestReport {
            set,
            iterations: state.iteration(),
            stop_reason,
            confidence,
            discarded,
        };
        if confidence.is_low() {
            Ok(HarvestOutcome::LowConfidence(report))
        } else {
            Ok(HarvestOutcome::Converged(report))
        }
    }

    fn advance(&self, container: &mut dyn ScrollContainer, ctx: ScrollContext) {
        for technique in self.techniques.iter().filter(|t| t.applies(&ctx)) {
            if let Err(err) = technique.advance(container, &self.pacer) {
                engine_debug!("{} failed: {}", technique.name(), err);
            }
        }
    }

    fn log_summary(
        &self,
        set: &HarvestSet,
        iterations: u64,
        stop_reason: StopReason,
        confidence: Confidence,
    ) {
        engine_info!(
            "stopped after {} iterations ({}), {} unique",
            iterations,
            stop_reason,
            set.len()
        );
        match confidence {
            Confidence::Unmeasured | Confidence::Met { .. } => {}
            Confidence::Shortfall { achieved } => engine_warn!(
                "only {:.1}% of the expected {} collected",
                achieved * 100.0,
                set.label()
            ),
            Confidence::Low { achieved } => engine_warn!(
                "collection unreliable at {:.1}% of expected {}",
                achieved * 100.0,
                set.label()
            ),
        }
    }
}
