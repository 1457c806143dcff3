use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info};

use super::backend::{BackendEvent, RecognitionBackend};

/// One timed event in a scripted session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptedEvent {
    /// Delay before emitting this event, relative to the previous one.
    pub delay_ms: u64,
    pub event: BackendEvent,
}

impl ScriptedEvent {
    pub fn after(delay_ms: u64, event: BackendEvent) -> Self {
        Self { delay_ms, event }
    }
}

/// A full replay script: one event list per backend session, in the order
/// sessions will be started.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Script {
    pub sessions: Vec<Vec<ScriptedEvent>>,
}

/// Recognition backend that replays a prepared script.
///
/// Each `start()` consumes the next session from the script, emits
/// `SessionStarted`, then plays the session's events on their scheduled
/// delays. An explicit `SessionEnded` in the script models the engine
/// terminating on its own; otherwise the session ends when `stop()` is
/// called. Used by tests and the CLI replay mode.
pub struct ScriptedBackend {
    sessions: VecDeque<Vec<ScriptedEvent>>,
    stop_tx: Option<watch::Sender<bool>>,
    running: Arc<AtomicBool>,
}

impl ScriptedBackend {
    pub fn new(script: Script) -> Self {
        Self {
            sessions: script.sessions.into(),
            stop_tx: None,
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Build a backend with a single scripted session.
    pub fn single_session(events: Vec<ScriptedEvent>) -> Self {
        Self::new(Script {
            sessions: vec![events],
        })
    }

    /// Parse a script from its JSON form (the CLI replay file format).
    pub fn from_json(json: &str) -> Result<Self> {
        let script: Script = serde_json::from_str(json)?;
        Ok(Self::new(script))
    }

    /// Number of scripted sessions not yet started.
    pub fn remaining_sessions(&self) -> usize {
        self.sessions.len()
    }
}

#[async_trait::async_trait]
impl RecognitionBackend for ScriptedBackend {
    async fn start(&mut self) -> Result<mpsc::Receiver<BackendEvent>> {
        let Some(events) = self.sessions.pop_front() else {
            bail!("scripted backend has no sessions left");
        };

        let (tx, rx) = mpsc::channel(64);
        let (stop_tx, mut stop_rx) = watch::channel(false);
        self.stop_tx = Some(stop_tx);
        self.running.store(true, Ordering::SeqCst);

        let running = Arc::clone(&self.running);
        info!("Scripted session starting ({} events)", events.len());

        tokio::spawn(async move {
            let _ = tx.send(BackendEvent::SessionStarted).await;

            for scripted in events {
                tokio::select! {
                    _ = tokio::time::sleep(Duration::from_millis(scripted.delay_ms)) => {
                        let self_ended = scripted.event == BackendEvent::SessionEnded;
                        debug!("Scripted event: {:?}", scripted.event);
                        if tx.send(scripted.event).await.is_err() {
                            running.store(false, Ordering::SeqCst);
                            return;
                        }
                        if self_ended {
                            // Engine terminated on its own mid-script.
                            running.store(false, Ordering::SeqCst);
                            return;
                        }
                    }
                    _ = stop_rx.changed() => {
                        running.store(false, Ordering::SeqCst);
                        let _ = tx.send(BackendEvent::SessionEnded).await;
                        return;
                    }
                }
            }

            // Script exhausted: stay live until stopped, like a real engine
            // waiting for more speech.
            let _ = stop_rx.changed().await;
            running.store(false, Ordering::SeqCst);
            let _ = tx.send(BackendEvent::SessionEnded).await;
        });

        Ok(rx)
    }

    async fn stop(&mut self) -> Result<()> {
        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.send(true);
        }
        Ok(())
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    fn name(&self) -> &str {
        "scripted"
    }
}
