use anyhow::Result;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc;

/// A single recognition hypothesis from the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hypothesis {
    /// Position in the backend's result stream since the last session start.
    /// Monotonic non-decreasing within one session; resets across restarts.
    pub index: u64,

    /// Whether the backend will revise this hypothesis further.
    #[serde(rename = "final")]
    pub is_final: bool,

    /// Recognized text for this hypothesis.
    pub transcript: String,
}

impl Hypothesis {
    pub fn interim(index: u64, transcript: impl Into<String>) -> Self {
        Self {
            index,
            is_final: false,
            transcript: transcript.into(),
        }
    }

    pub fn fin(index: u64, transcript: impl Into<String>) -> Self {
        Self {
            index,
            is_final: true,
            transcript: transcript.into(),
        }
    }
}

/// One backend callback payload: an ordered batch of hypotheses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultEvent {
    pub hypotheses: Vec<Hypothesis>,
}

impl ResultEvent {
    pub fn new(hypotheses: Vec<Hypothesis>) -> Self {
        Self { hypotheses }
    }
}

/// Error categories reported by a recognition backend.
///
/// Only `PermissionDenied` is fatal to a recording; everything else is
/// expected to self-heal through the automatic restart cycle.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum BackendErrorKind {
    #[error("microphone or recognition access denied")]
    PermissionDenied,

    #[error("no speech detected")]
    NoSpeech,

    #[error("recognition service network error")]
    Network,

    #[error("recognition backend error: {0}")]
    Other(String),
}

impl BackendErrorKind {
    /// Fatal errors end the recording; transient ones are logged and ignored.
    pub fn is_fatal(&self) -> bool {
        matches!(self, BackendErrorKind::PermissionDenied)
    }
}

/// Lifecycle and result events emitted by a recognition backend session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BackendEvent {
    /// A new backend session is live; result indices restart from zero.
    SessionStarted,

    /// A batch of hypotheses for the current session.
    Result(ResultEvent),

    /// The backend session terminated (deliberately or on its own).
    SessionEnded,

    /// The backend reported an error; the session may still end separately.
    Error(BackendErrorKind),
}

/// Speech recognition capability consumed by the session driver.
///
/// The backend is a black box: it may end its session at any time, deliver
/// overlapping result indices across restarts, and emit events for a session
/// that was already asked to stop. The segmentation core compensates for all
/// of that; implementations only need to report what happened.
#[async_trait::async_trait]
pub trait RecognitionBackend: Send {
    /// Start a recognition session.
    ///
    /// Returns a channel receiver for the session's events. The first event
    /// is `SessionStarted`; the channel stays open until `SessionEnded` has
    /// been delivered.
    async fn start(&mut self) -> Result<mpsc::Receiver<BackendEvent>>;

    /// Ask the current session to stop. The backend confirms by emitting
    /// `SessionEnded` on the event channel.
    async fn stop(&mut self) -> Result<()>;

    /// Whether a session is currently live.
    fn is_running(&self) -> bool;

    /// Backend name for logging.
    fn name(&self) -> &str;
}
