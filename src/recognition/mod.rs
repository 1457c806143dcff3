//! Recognition backend capability.
//!
//! The backend is consumed as a black box that emits indexed result events
//! and session lifecycle events. `ScriptedBackend` replays prepared scripts
//! for tests and the CLI; real engines implement `RecognitionBackend` the
//! same way.

mod backend;
mod scripted;

pub use backend::{
    BackendErrorKind, BackendEvent, Hypothesis, RecognitionBackend, ResultEvent,
};
pub use scripted::{Script, ScriptedBackend, ScriptedEvent};
