//! Boundary to whatever renders the scrollable list.
//!
//! The harvester only needs a handful of primitives from the content source.
//! Every one of them may fail; callers treat a failure as "no effect this
//! iteration" rather than aborting the run.

use thiserror::Error;

/// Which rendered elements a query should return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementQuery {
    /// Anchors whose link target contains a path separator.
    ProfileLinks,
    /// Anything with a link target or a link role.
    LinkLike,
    /// Every non-script element, carrying its own text.
    TextBearing,
}

/// One rendered child as seen by the driver.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RenderedElement {
    pub href: Option<String>,
    pub text: Option<String>,
}

impl RenderedElement {
    pub fn link(href: impl Into<String>) -> Self {
        Self {
            href: Some(href.into()),
            text: None,
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self {
            href: None,
            text: Some(text.into()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    PageDown,
    End,
    Escape,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DriverError {
    #[error("scroll container not found: {0}")]
    ContainerNotFound(String),
    #[error("element went stale before it could be read")]
    Stale,
    #[error("driver command failed: {0}")]
    Command(String),
}

/// A lazily rendered, scrollable container.
pub trait ScrollContainer {
    /// Finds the container; fails when it is not on screen.
    fn locate(&mut self) -> Result<(), DriverError>;
    fn scroll_to(&mut self, position: u64) -> Result<(), DriverError>;
    /// Total renderable height. Grows until the list is exhausted.
    fn content_extent(&mut self) -> Result<u64, DriverError>;
    fn elements(&mut self, query: ElementQuery) -> Result<Vec<RenderedElement>, DriverError>;
    /// Click/focus the container so keyboard input reaches it.
    fn activate(&mut self) -> Result<(), DriverError>;
    fn press_key(&mut self, key: Key) -> Result<(), DriverError>;
}
