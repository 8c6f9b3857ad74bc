//! Scroll techniques applied once per harvest iteration.
//!
//! Each technique decides for itself whether it runs on a given round. The
//! harvester applies every applicable technique in order and logs, but
//! otherwise ignores, individual failures.

use std::time::Duration;

use crate::driver::{DriverError, Key, ScrollContainer};
use crate::pacing::Pacer;

/// Where the run is when a technique is consulted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollContext {
    /// Completed iterations before this one.
    pub round: u64,
    /// Consecutive stable iterations so far.
    pub stable: u32,
}

pub trait ScrollTechnique {
    fn name(&self) -> &'static str;
    fn applies(&self, ctx: &ScrollContext) -> bool;
    fn advance(&self, container: &mut dyn ScrollContainer, pacer: &dyn Pacer)
        -> Result<(), DriverError>;
}

/// Jump to the current end of the content.
#[derive(Debug, Clone, Copy, Default)]
pub struct JumpToExtent;

impl ScrollTechnique for JumpToExtent {
    fn name(&self) -> &'static str {
        "jump-to-extent"
    }

    fn applies(&self, _ctx: &ScrollContext) -> bool {
        true
    }

    fn advance(
        &self,
        container: &mut dyn ScrollContainer,
        _pacer: &dyn Pacer,
    ) -> Result<(), DriverError> {
        let extent = container.content_extent()?;
        container.scroll_to(extent)
    }
}

/// Scroll past the end by a fixed offset to trigger the next lazy load.
#[derive(Debug, Clone, Copy)]
pub struct Overshoot {
    pub offset: u64,
    pub every: u64,
}

impl ScrollTechnique for Overshoot {
    fn name(&self) -> &'static str {
        "overshoot"
    }

    fn applies(&self, ctx: &ScrollContext) -> bool {
        self.every > 0 && ctx.round % self.every == 0
    }

    fn advance(
        &self,
        container: &mut dyn ScrollContainer,
        _pacer: &dyn Pacer,
    ) -> Result<(), DriverError> {
        let extent = container.content_extent()?;
        container.scroll_to(extent.saturating_add(self.offset))
    }
}

/// Focus the container and page down with the keyboard.
#[derive(Debug, Clone, Copy)]
pub struct KeyboardPaging {
    pub presses: u32,
    pub every: u64,
    pub pause: (Duration, Duration),
}

impl ScrollTechnique for KeyboardPaging {
    fn name(&self) -> &'static str {
        "keyboard-paging"
    }

    fn applies(&self, ctx: &ScrollContext) -> bool {
        self.every > 0 && ctx.round % self.every == 0
    }

    fn advance(
        &self,
        container: &mut dyn ScrollContainer,
        pacer: &dyn Pacer,
    ) -> Result<(), DriverError> {
        container.activate()?;
        for _ in 0..self.presses {
            container.press_key(Key::PageDown)?;
            pacer.pause(self.pause.0, self.pause.1);
        }
        Ok(())
    }
}

/// Shake a stalled list loose: top, middle, then activate and End.
#[derive(Debug, Clone, Copy)]
pub struct StallRecovery {
    /// Runs whenever the stable count is a positive multiple of this.
    pub every_stable: u32,
    pub pause: (Duration, Duration),
}

impl ScrollTechnique for StallRecovery {
    fn name(&self) -> &'static str {
        "stall-recovery"
    }

    fn applies(&self, ctx: &ScrollContext) -> bool {
        self.every_stable > 0 && ctx.stable > 0 && ctx.stable % self.every_stable == 0
    }

    fn advance(
        &self,
        container: &mut dyn ScrollContainer,
        pacer: &dyn Pacer,
    ) -> Result<(), DriverError> {
        container.scroll_to(0)?;
        pacer.pause(self.pause.0, self.pause.1);
        let extent = container.content_extent()?;
        container.scroll_to(extent / 2)?;
        pacer.pause(self.pause.0, self.pause.1);
        container.activate()?;
        container.press_key(Key::End)?;
        pacer.pause(self.pause.0, self.pause.1);
        Ok(())
    }
}
