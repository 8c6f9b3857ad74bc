//! Harvester engine: drives a scroll container, persists lists and runs audits.
mod decode;
mod driver;
mod extraction;
mod fallback;
mod filename;
mod harvest;
mod lookup;
mod pacing;
mod persist;
mod scrolling;
mod session;
mod snapshot;

pub use decode::{decode_frame, DecodeError, DecodedFrame};
pub use driver::{DriverError, ElementQuery, Key, RenderedElement, ScrollContainer};
pub use extraction::{
    Extraction, ExtractionPlan, ExtractionStrategy, LinkLikeElements, PassYield,
    ProfileLinkTargets, TextMentions,
};
pub use fallback::PageScrollFallback;
pub use filename::list_filename;
pub use harvest::{HarvestConfig, HarvestError, HarvestOutcome, HarvestReport, Harvester};
pub use lookup::{CapturedFollowGraph, FollowLookup, GraphLookup, LookupError};
pub use pacing::{JitteredPacer, NoPause, Pacer};
pub use persist::{ensure_output_dir, ListStore, StoreError};
pub use scrolling::{
    JumpToExtent, KeyboardPaging, Overshoot, ScrollContext, ScrollTechnique, StallRecovery,
};
pub use session::{AuditError, AuditSession, CollectedList, NON_FOLLOWERS_LABEL};
pub use snapshot::{SnapshotContainer, SnapshotError};
