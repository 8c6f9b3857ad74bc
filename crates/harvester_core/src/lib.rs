//! Harvester core: pure identifier handling, termination policy, reconciliation
//! and verification. No IO lives here.
mod cancel;
mod count;
mod harvest_set;
mod identity;
mod reconcile;
mod scroll;
mod verify;

pub use cancel::CancelToken;
pub use count::parse_count_text;
pub use harvest_set::{HarvestSet, ListKind};
pub use identity::{canonicalize, extract_identifier, is_valid_identifier, MAX_IDENTIFIER_LEN};
pub use reconcile::{reconcile, Derivation, DifferenceResult, ReconcileOptions};
pub use scroll::{Confidence, HarvestPolicy, Observation, ScrollState, StopReason, Verdict};
pub use verify::{verify, Judgment, LookupVerdict, VerificationOutcome, VerificationPolicy};
