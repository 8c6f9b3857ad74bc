use std::time::Duration;

use engine_logging::{engine_debug, engine_info};
use harvester_core::{CancelToken, Confidence, HarvestPolicy, HarvestSet, ListKind, StopReason};

use crate::driver::ScrollContainer;
use crate::extraction::{ExtractionStrategy, ProfileLinkTargets};
use crate::harvest::{HarvestError, HarvestReport};
use crate::pacing::Pacer;

/// Alternate path: scroll the whole list page instead of a dialog until the
/// page stops growing.
#[derive(Debug, Clone)]
pub struct PageScrollFallback {
    pub max_scrolls: u64,
    pub pause: (Duration, Duration),
    /// Used only to grade the result.
    pub policy: HarvestPolicy,
}

impl Default for PageScrollFallback {
    fn default() -> Self {
        Self {
            max_scrolls: 500,
            pause: (Duration::from_secs(2), Duration::from_secs(3)),
            policy: HarvestPolicy::default(),
        }
    }
}

impl PageScrollFallback {
    pub fn harvest(
        &self,
        page: &mut dyn ScrollContainer,
        kind: ListKind,
        expected: Option<u64>,
        pacer: &dyn Pacer,
        cancel: &CancelToken,
    ) -> Result<HarvestReport, HarvestError> {
        engine_logging::set_harvest_context(kind.label());
        let report = self.run(page, kind, expected, pacer, cancel);
        engine_logging::clear_harvest_context();
        report
    }

    fn run(
        &self,
        page: &mut dyn ScrollContainer,
        kind: ListKind,
        expected: Option<u64>,
        pacer: &dyn Pacer,
        cancel: &CancelToken,
    ) -> Result<HarvestReport, HarvestError> {
        page.locate().map_err(|err| HarvestError::SourceUnavailable {
            kind,
            reason: err.to_string(),
        })?;
        engine_info!("falling back to full-page scrolling for {}", kind);

        let links = ProfileLinkTargets { min_candidates: 0 };
        let mut set = HarvestSet::new(kind, expected);
        let mut discarded = 0;
        let mut last_extent = page.content_extent().unwrap_or(0);
        let mut scrolls = 0;

        let stop_reason = loop {
            if cancel.is_cancelled() {
                break StopReason::Cancelled;
            }
            if scrolls >= self.max_scrolls {
                break StopReason::IterationCeiling;
            }
            scrolls += 1;
            engine_logging::set_scroll_iteration(scrolls);

            if let Err(err) = page.scroll_to(last_extent) {
                engine_debug!("page scroll failed: {}", err);
            }
            pacer.pause(self.pause.0, self.pause.1);

            match links.extract(page) {
                Ok(extraction) => {
                    discarded += extraction.discarded;
                    set.absorb(extraction.candidates);
                }
                Err(err) => engine_debug!("page extraction failed: {}", err),
            }
            if scrolls % 10 == 0 {
                engine_info!("{} collected after {} page scrolls", set.len(), scrolls);
            }

            let extent = page.content_extent().unwrap_or(last_extent);
            if extent == last_extent {
                break StopReason::Stable;
            }
            last_extent = extent;
        };

        let confidence = Confidence::assess(set.len(), expected, &self.policy);
        engine_info!(
            "page scrolling stopped after {} scrolls ({}), {} unique",
            scrolls,
            stop_reason,
            set.len()
        );
        Ok(HarvestReport {
            set,
            iterations: scrolls,
            stop_reason,
            confidence,
            discarded,
        })
    }
}
