pub mod clock;
pub mod config;
pub mod recognition;
pub mod session;
pub mod storage;
pub mod transcript;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::Config;
pub use recognition::{
    BackendErrorKind, BackendEvent, Hypothesis, RecognitionBackend, ResultEvent, Script,
    ScriptedBackend, ScriptedEvent,
};
pub use session::{
    Command, SessionConfig, SessionController, SessionDriver, SessionHandle, SessionPhase,
    SessionSnapshot, UserCommand,
};
pub use storage::{FileStore, KeyValueStore, MemoryStore};
pub use transcript::{
    ContinuityTracker, Delta, HistoryEntry, HistoryLog, SegmentBuffer, SplitDecision, SplitPolicy,
    HISTORY_STORE_KEY,
};
