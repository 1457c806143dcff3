use anyhow::{anyhow, Result};
use serde::Serialize;
use std::collections::VecDeque;
use tokio::sync::{mpsc, watch};
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use super::controller::{Command, SessionController};
use crate::recognition::{BackendEvent, RecognitionBackend};
use crate::transcript::HistoryEntry;

/// User actions delivered to the driver loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserCommand {
    Start,
    Stop,
    ClearHistory,
    Shutdown,
}

/// Read-only view of the session published after every processed event.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub recording: bool,
    /// The in-flight segment (confirmed + interim, trimmed).
    pub current_text: String,
    /// Elapsed fraction of the split interval, clamped to [0, 1].
    pub progress: f64,
    pub history: Vec<HistoryEntry>,
    pub error: Option<String>,
}

/// Cloneable handle for collaborators (e.g. a presentation layer).
///
/// Collaborators only read snapshots and send commands; the session state
/// itself is owned exclusively by the driver task.
#[derive(Clone)]
pub struct SessionHandle {
    cmd_tx: mpsc::Sender<UserCommand>,
    snapshot_rx: watch::Receiver<SessionSnapshot>,
}

impl SessionHandle {
    pub async fn start_recording(&self) -> Result<()> {
        self.send(UserCommand::Start).await
    }

    pub async fn stop_recording(&self) -> Result<()> {
        self.send(UserCommand::Stop).await
    }

    pub async fn clear_history(&self) -> Result<()> {
        self.send(UserCommand::ClearHistory).await
    }

    pub async fn shutdown(&self) -> Result<()> {
        self.send(UserCommand::Shutdown).await
    }

    /// Latest published snapshot.
    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshot_rx.borrow().clone()
    }

    /// History entries as of the latest snapshot.
    pub fn history_snapshot(&self) -> Vec<HistoryEntry> {
        self.snapshot_rx.borrow().history.clone()
    }

    /// Watch channel for snapshot updates.
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshot_rx.clone()
    }

    async fn send(&self, cmd: UserCommand) -> Result<()> {
        self.cmd_tx
            .send(cmd)
            .await
            .map_err(|_| anyhow!("session driver has stopped"))
    }
}

/// Async glue between a recognition backend and the session controller.
///
/// Runs a single select loop over backend events, user commands, and the
/// pending restart timer, so every state mutation happens on one task in
/// delivery order. The restart timer is generation-tagged and re-checked
/// against the controller before executing, so a user stop always preempts a
/// scheduled restart.
pub struct SessionDriver {
    controller: SessionController,
    backend: Box<dyn RecognitionBackend>,
    cmd_rx: mpsc::Receiver<UserCommand>,
    snapshot_tx: watch::Sender<SessionSnapshot>,
}

impl SessionDriver {
    pub fn new(
        controller: SessionController,
        backend: Box<dyn RecognitionBackend>,
    ) -> (Self, SessionHandle) {
        let (cmd_tx, cmd_rx) = mpsc::channel(16);
        let (snapshot_tx, snapshot_rx) = watch::channel(Self::snapshot_of(&controller));

        let driver = Self {
            controller,
            backend,
            cmd_rx,
            snapshot_tx,
        };
        let handle = SessionHandle {
            cmd_tx,
            snapshot_rx,
        };
        (driver, handle)
    }

    /// Run until shutdown. Consumes the driver; typically spawned.
    pub async fn run(mut self) -> Result<()> {
        info!("Session driver started (backend: {})", self.backend.name());

        let mut events: Option<mpsc::Receiver<BackendEvent>> = None;
        let mut pending_restart: Option<(Instant, u64)> = None;

        loop {
            tokio::select! {
                cmd = self.cmd_rx.recv() => {
                    match cmd {
                        None | Some(UserCommand::Shutdown) => break,
                        Some(UserCommand::Start) => {
                            let next = self.controller.start_recording();
                            self.execute(next, &mut events, &mut pending_restart).await;
                        }
                        Some(UserCommand::Stop) => {
                            let next = self.controller.stop_recording();
                            self.execute(next, &mut events, &mut pending_restart).await;
                        }
                        Some(UserCommand::ClearHistory) => {
                            if let Err(e) = self.controller.clear_history() {
                                error!("Failed to clear history: {:#}", e);
                            }
                        }
                    }
                }

                event = Self::next_event(&mut events) => {
                    match event {
                        Some(event) => {
                            let next = self.controller.handle_event(event);
                            self.execute(next, &mut events, &mut pending_restart).await;
                        }
                        None => {
                            debug!("Backend event channel closed");
                            events = None;
                        }
                    }
                }

                _ = Self::restart_timer(&pending_restart) => {
                    if let Some((_, generation)) = pending_restart.take() {
                        let next = self.controller.confirm_restart(generation);
                        self.execute(next, &mut events, &mut pending_restart).await;
                    }
                }
            }

            self.publish();
        }

        // Shutdown: end any live recording so leftovers are flushed.
        if self.controller.is_recording() {
            let next = self.controller.stop_recording();
            self.execute(next, &mut events, &mut pending_restart).await;
            self.publish();
        }

        info!("Session driver stopped");
        Ok(())
    }

    /// Execute controller commands, feeding any follow-up transitions back
    /// through the controller until the queue drains.
    async fn execute(
        &mut self,
        first: Option<Command>,
        events: &mut Option<mpsc::Receiver<BackendEvent>>,
        pending_restart: &mut Option<(Instant, u64)>,
    ) {
        let mut queue: VecDeque<Command> = first.into_iter().collect();

        while let Some(cmd) = queue.pop_front() {
            match cmd {
                Command::StartBackend => match self.backend.start().await {
                    Ok(rx) => {
                        *events = Some(rx);
                    }
                    Err(e) => {
                        warn!("Backend start failed: {:#}", e);
                        // Treat as an immediately terminated session; the
                        // controller bounds the retries.
                        if let Some(next) = self.controller.handle_event(BackendEvent::SessionEnded)
                        {
                            queue.push_back(next);
                        }
                    }
                },
                Command::StopBackend => {
                    if let Err(e) = self.backend.stop().await {
                        warn!("Backend stop failed: {:#}", e);
                    }
                }
                Command::RestartBackendAfter { delay, generation } => {
                    *pending_restart = Some((Instant::now() + delay, generation));
                }
            }
        }
    }

    async fn next_event(events: &mut Option<mpsc::Receiver<BackendEvent>>) -> Option<BackendEvent> {
        match events {
            Some(rx) => rx.recv().await,
            None => std::future::pending().await,
        }
    }

    async fn restart_timer(pending: &Option<(Instant, u64)>) {
        match pending {
            Some((deadline, _)) => tokio::time::sleep_until(*deadline).await,
            None => std::future::pending().await,
        }
    }

    fn publish(&self) {
        self.snapshot_tx
            .send_replace(Self::snapshot_of(&self.controller));
    }

    fn snapshot_of(controller: &SessionController) -> SessionSnapshot {
        SessionSnapshot {
            recording: controller.is_recording(),
            current_text: controller.current_snapshot(),
            progress: controller.progress_fraction(),
            history: controller.history().entries().to_vec(),
            error: controller.last_error().map(|e| e.to_string()),
        }
    }
}
