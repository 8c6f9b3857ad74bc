//! Candidate extraction from whatever the container currently renders.
//!
//! Strategies run in priority order. Each one's candidates are unioned into
//! the pass result; the first whose yield is acceptable ends the pass, and a
//! strategy that errors is skipped.

use std::collections::BTreeSet;

use engine_logging::engine_debug;
use harvester_core::{extract_identifier, is_valid_identifier};

use crate::driver::{DriverError, ElementQuery, RenderedElement, ScrollContainer};

/// Result of one strategy run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extraction {
    pub candidates: BTreeSet<String>,
    /// Elements the query returned.
    pub matched: usize,
    /// Elements that produced nothing valid.
    pub discarded: usize,
}

pub trait ExtractionStrategy {
    fn name(&self) -> &'static str;

    /// Whether the strategy runs on this round (completed iterations so far).
    fn eligible(&self, _round: u64) -> bool {
        true
    }

    fn extract(&self, container: &mut dyn ScrollContainer) -> Result<Extraction, DriverError>;

    fn acceptable(&self, extraction: &Extraction) -> bool;
}

/// Anchors whose targets look like profile paths.
#[derive(Debug, Clone, Copy)]
pub struct ProfileLinkTargets {
    /// Valid candidates needed before the broader strategies are skipped.
    pub min_candidates: usize,
}

impl ExtractionStrategy for ProfileLinkTargets {
    fn name(&self) -> &'static str {
        "profile-links"
    }

    fn extract(&self, container: &mut dyn ScrollContainer) -> Result<Extraction, DriverError> {
        let elements = container.elements(ElementQuery::ProfileLinks)?;
        Ok(from_link_targets(&elements))
    }

    fn acceptable(&self, extraction: &Extraction) -> bool {
        extraction.candidates.len() >= self.min_candidates
    }
}

/// Broader sweep over anything link-shaped.
#[derive(Debug, Clone, Copy)]
pub struct LinkLikeElements {
    pub min_candidates: usize,
}

impl ExtractionStrategy for LinkLikeElements {
    fn name(&self) -> &'static str {
        "link-like"
    }

    fn extract(&self, container: &mut dyn ScrollContainer) -> Result<Extraction, DriverError> {
        let elements = container.elements(ElementQuery::LinkLike)?;
        Ok(from_link_targets(&elements))
    }

    fn acceptable(&self, extraction: &Extraction) -> bool {
        extraction.candidates.len() >= self.min_candidates
    }
}

/// `@handle` tokens in rendered text. Only tried once the run is under way.
#[derive(Debug, Clone, Copy)]
pub struct TextMentions {
    pub after_round: u64,
}

impl ExtractionStrategy for TextMentions {
    fn name(&self) -> &'static str {
        "text-mentions"
    }

    fn eligible(&self, round: u64) -> bool {
        round > self.after_round
    }

    fn extract(&self, container: &mut dyn ScrollContainer) -> Result<Extraction, DriverError> {
        let elements = container.elements(ElementQuery::TextBearing)?;
        let mut extraction = Extraction {
            matched: elements.len(),
            ..Extraction::default()
        };
        for element in &elements {
            let found: Vec<String> = element
                .text
                .as_deref()
                .map(mention_tokens)
                .unwrap_or_default();
            if found.is_empty() {
                extraction.discarded += 1;
            }
            extraction.candidates.extend(found);
        }
        Ok(extraction)
    }

    fn acceptable(&self, _extraction: &Extraction) -> bool {
        true
    }
}

fn from_link_targets(elements: &[RenderedElement]) -> Extraction {
    let mut extraction = Extraction {
        matched: elements.len(),
        ..Extraction::default()
    };
    for element in elements {
        match element
            .href
            .as_deref()
            .and_then(extract_identifier)
            .filter(|id| is_valid_identifier(id))
        {
            Some(id) => {
                extraction.candidates.insert(id);
            }
            None => extraction.discarded += 1,
        }
    }
    extraction
}

fn mention_tokens(text: &str) -> Vec<String> {
    text.split_whitespace()
        .filter_map(|token| token.strip_prefix('@'))
        .map(|token| token.trim_end_matches([',', ';', ':', '!', '?', ')', '.']))
        .filter(|token| is_valid_identifier(token))
        .map(str::to_string)
        .collect()
}

/// What one extraction pass produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassYield {
    pub candidates: BTreeSet<String>,
    pub discarded: usize,
    /// Strategy whose yield ended the pass, if any was acceptable.
    pub settled_by: Option<&'static str>,
}

/// Ordered strategy list.
pub struct ExtractionPlan {
    strategies: Vec<Box<dyn ExtractionStrategy>>,
}

impl ExtractionPlan {
    pub fn new(strategies: Vec<Box<dyn ExtractionStrategy>>) -> Self {
        Self { strategies }
    }

    pub fn run(&self, container: &mut dyn ScrollContainer, round: u64) -> PassYield {
        let mut pass = PassYield::default();
        for strategy in self.strategies.iter().filter(|s| s.eligible(round)) {
            let extraction = match strategy.extract(container) {
                Ok(extraction) => extraction,
                Err(err) => {
                    engine_debug!("{} extraction failed: {}", strategy.name(), err);
                    continue;
                }
            };
            let accepted = strategy.acceptable(&extraction);
            pass.discarded += extraction.discarded;
            pass.candidates.extend(extraction.candidates);
            if accepted {
                pass.settled_by = Some(strategy.name());
                break;
            }
        }
        pass
    }
}
