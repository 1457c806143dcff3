use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::transcript::SplitPolicy;

/// Configuration for a recording session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Unique session identifier (e.g., "minutes-2026-08-25-standup").
    pub session_id: String,

    /// Minimum segment length before a cut is considered.
    /// Default: 300 seconds (5 minutes).
    pub split_interval: Duration,

    /// Delay between a backend session ending and the automatic restart.
    pub restart_delay: Duration,

    /// End-of-utterance markers for the split policy's lexical gate.
    pub end_markers: Vec<String>,

    /// Consecutive backend restarts with no accepted result before the
    /// controller gives up and hard-stops the recording.
    pub max_silent_restarts: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            session_id: format!("minutes-{}", uuid::Uuid::new_v4()),
            split_interval: Duration::from_secs(300), // 5 minutes
            restart_delay: Duration::from_millis(500),
            end_markers: SplitPolicy::default_markers(),
            max_silent_restarts: 5,
        }
    }
}
