//! Replays captured list frames as a scrollable container.
//!
//! Frame `n` is the DOM after the list revealed `n` more batches. Scrolling to
//! (or past) the current end reveals the next frame, so replaying a capture
//! drives the harvester exactly as the live list would.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use ego_tree::NodeRef;
use scraper::node::Node;
use scraper::{ElementRef, Html, Selector};
use thiserror::Error;

use crate::decode::{decode_frame, DecodeError};
use crate::driver::{DriverError, ElementQuery, Key, RenderedElement, ScrollContainer};

const FRAME_HEIGHT: u64 = 800;
const PAGE_STEP: u64 = 400;
const SKIPPED_TAGS: &[&str] = &["script", "style", "noscript", "template"];

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("cannot read capture directory {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("frame {path} could not be decoded: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: DecodeError,
    },
}

pub struct SnapshotContainer {
    name: String,
    frames: Vec<Html>,
    revealed: usize,
    position: u64,
}

impl SnapshotContainer {
    pub fn from_frames<I, S>(name: impl Into<String>, frames: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            name: name.into(),
            frames: frames
                .into_iter()
                .map(|html| Html::parse_document(html.as_ref()))
                .collect(),
            revealed: 0,
            position: 0,
        }
    }

    /// Loads every `.html`/`.htm` file in `dir`, ordered by file name.
    pub fn from_dir(dir: &Path) -> Result<Self, SnapshotError> {
        let io_err = |source| SnapshotError::Io {
            path: dir.to_path_buf(),
            source,
        };
        let mut paths: Vec<PathBuf> = fs::read_dir(dir)
            .map_err(io_err)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                path.is_file()
                    && path
                        .extension()
                        .and_then(|ext| ext.to_str())
                        .is_some_and(|ext| ext.eq_ignore_ascii_case("html") || ext.eq_ignore_ascii_case("htm"))
            })
            .collect();
        paths.sort();

        let mut frames = Vec::with_capacity(paths.len());
        for path in paths {
            let bytes = fs::read(&path).map_err(|source| SnapshotError::Io {
                path: path.clone(),
                source,
            })?;
            let decoded =
                decode_frame(&bytes, None).map_err(|source| SnapshotError::Decode { path, source })?;
            frames.push(decoded.html);
        }
        Ok(Self::from_frames(dir.display().to_string(), frames))
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// Index of the frame currently on screen.
    pub fn revealed(&self) -> usize {
        self.revealed
    }

    fn extent(&self) -> u64 {
        (self.revealed as u64 + 1) * FRAME_HEIGHT
    }

    fn move_to(&mut self, position: u64) {
        self.position = position;
        if self.position >= self.extent() && self.revealed + 1 < self.frames.len() {
            self.revealed += 1;
        }
    }

    fn current(&self) -> Result<&Html, DriverError> {
        self.frames
            .get(self.revealed)
            .ok_or_else(|| DriverError::ContainerNotFound(self.name.clone()))
    }
}

impl ScrollContainer for SnapshotContainer {
    fn locate(&mut self) -> Result<(), DriverError> {
        self.current().map(|_| ())
    }

    fn scroll_to(&mut self, position: u64) -> Result<(), DriverError> {
        self.current()?;
        self.move_to(position);
        Ok(())
    }

    fn content_extent(&mut self) -> Result<u64, DriverError> {
        self.current()?;
        Ok(self.extent())
    }

    fn elements(&mut self, query: ElementQuery) -> Result<Vec<RenderedElement>, DriverError> {
        let document = self.current()?;
        match query {
            ElementQuery::ProfileLinks => select_links(document, "a[href*='/']"),
            ElementQuery::LinkLike => select_links(document, "[href*='/'], [role*='link']"),
            ElementQuery::TextBearing => {
                let mut out = Vec::new();
                for child in document.root_element().children() {
                    collect_text(child, &mut out);
                }
                Ok(out)
            }
        }
    }

    fn activate(&mut self) -> Result<(), DriverError> {
        self.current().map(|_| ())
    }

    fn press_key(&mut self, key: Key) -> Result<(), DriverError> {
        self.current()?;
        match key {
            Key::PageDown => self.move_to(self.position.saturating_add(PAGE_STEP)),
            Key::End => self.move_to(self.extent()),
            Key::Escape => {}
        }
        Ok(())
    }
}

fn select_links(document: &Html, selector: &str) -> Result<Vec<RenderedElement>, DriverError> {
    let selector =
        Selector::parse(selector).map_err(|err| DriverError::Command(err.to_string()))?;
    Ok(document
        .select(&selector)
        .map(|element| RenderedElement {
            href: element.value().attr("href").map(str::to_string),
            text: Some(element.text().collect::<String>().trim().to_string())
                .filter(|text| !text.is_empty()),
        })
        .collect())
}

fn collect_text(node: NodeRef<'_, Node>, out: &mut Vec<RenderedElement>) {
    let Some(element) = ElementRef::wrap(node) else {
        return;
    };
    let tag = element.value().name();
    if SKIPPED_TAGS.iter().any(|skipped| tag.eq_ignore_ascii_case(skipped)) {
        return;
    }
    let own: String = node
        .children()
        .filter_map(|child| match child.value() {
            Node::Text(text) => Some(&**text),
            _ => None,
        })
        .collect::<Vec<&str>>()
        .join(" ");
    let own = own.trim();
    if !own.is_empty() {
        out.push(RenderedElement {
            href: element.value().attr("href").map(str::to_string),
            text: Some(own.to_string()),
        });
    }
    for child in node.children() {
        collect_text(child, out);
    }
}
