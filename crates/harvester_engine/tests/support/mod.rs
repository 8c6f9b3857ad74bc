#![allow(dead_code)]

use std::sync::Once;

use harvester_core::CancelToken;
use harvester_engine::{DriverError, ElementQuery, Key, RenderedElement, ScrollContainer};

pub fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(engine_logging::initialize_for_tests);
}

const ROW_HEIGHT: u64 = 60;

/// In-memory lazy list: reaching the end reveals another batch until `cap`.
pub struct SimulatedList {
    ids: Vec<String>,
    visible: usize,
    batch: usize,
    cap: usize,
    missing: bool,
    failing: Vec<ElementQuery>,
    noise_links: usize,
    profile_links: bool,
    cancel_at: Option<(u64, CancelToken)>,
    pub scrolls: u64,
}

impl SimulatedList {
    pub fn new(total: usize, batch: usize) -> Self {
        Self {
            ids: (0..total).map(user).collect(),
            visible: batch.min(total),
            batch,
            cap: total,
            missing: false,
            failing: Vec::new(),
            noise_links: 0,
            profile_links: true,
            cancel_at: None,
            scrolls: 0,
        }
    }

    /// Stops revealing once `cap` entries are visible.
    pub fn stalling_at(mut self, cap: usize) -> Self {
        self.cap = cap.min(self.ids.len());
        self
    }

    pub fn unavailable(mut self) -> Self {
        self.missing = true;
        self
    }

    pub fn failing(mut self, query: ElementQuery) -> Self {
        self.failing.push(query);
        self
    }

    pub fn with_noise(mut self, links: usize) -> Self {
        self.noise_links = links;
        self
    }

    /// Renders members only as text, never as profile anchors.
    pub fn without_profile_links(mut self) -> Self {
        self.profile_links = false;
        self
    }

    pub fn cancel_after(mut self, scrolls: u64, token: CancelToken) -> Self {
        self.cancel_at = Some((scrolls, token));
        self
    }

    fn extent(&self) -> u64 {
        self.visible as u64 * ROW_HEIGHT
    }

    fn reveal_if_at_end(&mut self, position: u64) {
        if position >= self.extent() {
            self.visible = (self.visible + self.batch).min(self.cap);
        }
    }

    fn links(&self) -> Vec<RenderedElement> {
        let shown = if self.profile_links { self.visible } else { 0 };
        let mut out: Vec<RenderedElement> = self.ids[..shown]
            .iter()
            .map(|id| RenderedElement::link(format!("/{id}/")))
            .collect();
        out.extend((0..self.noise_links).map(|i| RenderedElement::link(format!("/explore/tags/t{i}/"))));
        out
    }
}

impl ScrollContainer for SimulatedList {
    fn locate(&mut self) -> Result<(), DriverError> {
        if self.missing {
            Err(DriverError::ContainerNotFound("list dialog".into()))
        } else {
            Ok(())
        }
    }

    fn scroll_to(&mut self, position: u64) -> Result<(), DriverError> {
        self.scrolls += 1;
        if let Some((after, token)) = &self.cancel_at {
            if self.scrolls >= *after {
                token.cancel();
            }
        }
        self.reveal_if_at_end(position);
        Ok(())
    }

    fn content_extent(&mut self) -> Result<u64, DriverError> {
        Ok(self.extent())
    }

    fn elements(&mut self, query: ElementQuery) -> Result<Vec<RenderedElement>, DriverError> {
        if self.failing.contains(&query) {
            return Err(DriverError::Stale);
        }
        Ok(match query {
            ElementQuery::ProfileLinks | ElementQuery::LinkLike => self.links(),
            ElementQuery::TextBearing => self.ids[..self.visible]
                .iter()
                .map(|id| RenderedElement::text(format!("@{id}")))
                .collect(),
        })
    }

    fn activate(&mut self) -> Result<(), DriverError> {
        Ok(())
    }

    fn press_key(&mut self, key: Key) -> Result<(), DriverError> {
        if key == Key::End {
            let end = self.extent();
            self.reveal_if_at_end(end);
        }
        Ok(())
    }
}

pub fn user(i: usize) -> String {
    format!("user_{i:04}")
}

/// One captured frame showing `ids` as profile anchors.
pub fn frame<I: IntoIterator<Item = String>>(ids: I) -> String {
    let rows: String = ids
        .into_iter()
        .map(|id| format!("<li><a href=\"/{id}/\">{id}</a></li>"))
        .collect();
    format!("<html><body><div role=\"dialog\"><ul>{rows}</ul></div></body></html>")
}
