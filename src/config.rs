use anyhow::Result;
use serde::Deserialize;
use std::time::Duration;

use crate::session::SessionConfig;
use crate::transcript::{SplitPolicy, HISTORY_STORE_KEY};

#[derive(Debug, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    pub transcript: TranscriptConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct TranscriptConfig {
    /// Minimum segment length in seconds before a cut is considered.
    pub split_interval_secs: u64,

    /// Delay in milliseconds before restarting an ended backend session.
    pub restart_delay_ms: u64,

    /// End-of-utterance markers for the split policy.
    pub end_markers: Vec<String>,

    /// Consecutive silent backend restarts before recording is hard-stopped.
    pub max_silent_restarts: u32,
}

#[derive(Debug, Deserialize)]
pub struct StorageConfig {
    /// Directory for the file-backed store.
    pub data_dir: String,

    /// Store key for the history log.
    pub history_key: String,
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .set_default("service.name", "live-minutes")?
            .set_default("transcript.split_interval_secs", 300)?
            .set_default("transcript.restart_delay_ms", 500)?
            .set_default("transcript.end_markers", SplitPolicy::default_markers())?
            .set_default("transcript.max_silent_restarts", 5)?
            .set_default("storage.data_dir", "data")?
            .set_default("storage.history_key", HISTORY_STORE_KEY)?
            .add_source(config::File::with_name(path).required(false))
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    /// Session-layer configuration derived from the transcript section.
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            split_interval: Duration::from_secs(self.transcript.split_interval_secs),
            restart_delay: Duration::from_millis(self.transcript.restart_delay_ms),
            end_markers: self.transcript.end_markers.clone(),
            max_silent_restarts: self.transcript.max_silent_restarts,
            ..SessionConfig::default()
        }
    }
}
