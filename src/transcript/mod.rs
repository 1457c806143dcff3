//! Streaming transcript segmentation core.
//!
//! This module turns the backend's unreliable event stream into an ordered
//! transcript log:
//! - `delta` normalizes a raw result event into an incremental delta
//! - `continuity` deduplicates result indices and gates suppression windows
//! - `segment` accumulates the single in-flight, not-yet-logged segment
//! - `split` decides when the segment becomes a finished history entry
//! - `history` is the durable, append-only output of the subsystem

mod continuity;
mod delta;
mod history;
mod segment;
mod split;

pub use continuity::ContinuityTracker;
pub use delta::Delta;
pub use history::{local_time_label, HistoryEntry, HistoryLog, HISTORY_STORE_KEY};
pub use segment::SegmentBuffer;
pub use split::{SplitDecision, SplitPolicy};
