use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use super::config::SessionConfig;
use crate::clock::Clock;
use crate::recognition::{BackendErrorKind, BackendEvent, ResultEvent};
use crate::transcript::{
    local_time_label, ContinuityTracker, Delta, HistoryLog, SegmentBuffer, SplitDecision,
    SplitPolicy,
};

/// Lifecycle phase of a recording.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// Not recording.
    Idle,
    /// Recording with a live (or about-to-restart) backend session.
    Active,
    /// Suppression window between a policy-initiated stop and the next
    /// backend session start.
    RestartPending,
}

/// Side effect requested by the controller. The driver executes these; the
/// controller itself never blocks, spawns, or touches the backend directly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Start a backend recognition session.
    StartBackend,
    /// Stop the current backend recognition session.
    StopBackend,
    /// Start a backend session after `delay`, unless the controller has
    /// moved on. `generation` tags the request; a stale generation means a
    /// user stop (or another transition) preempted the restart.
    RestartBackendAfter { delay: Duration, generation: u64 },
}

/// Orchestrates the transcript segmentation core across backend sessions.
///
/// Owns the single segment buffer, continuity tracker, and history log. All
/// mutation happens through the defined transitions below, driven one event
/// at a time; no two events are ever processed concurrently.
pub struct SessionController {
    config: SessionConfig,
    clock: Arc<dyn Clock>,
    phase: SessionPhase,
    segment: SegmentBuffer,
    continuity: ContinuityTracker,
    policy: SplitPolicy,
    history: HistoryLog,
    /// Wall-clock (monotonic) instant of the last cut or recording start.
    last_split_ms: u64,
    /// Invalidates scheduled restarts from superseded transitions.
    restart_generation: u64,
    /// Consecutive backend restarts that produced no accepted result.
    silent_restarts: u32,
    last_error: Option<BackendErrorKind>,
}

impl SessionController {
    pub fn new(config: SessionConfig, clock: Arc<dyn Clock>, history: HistoryLog) -> Self {
        let now = clock.now_ms();
        let policy = SplitPolicy::new(
            config.split_interval.as_millis() as u64,
            config.end_markers.clone(),
        );

        Self {
            config,
            clock,
            phase: SessionPhase::Idle,
            segment: SegmentBuffer::new(now),
            continuity: ContinuityTracker::new(),
            policy,
            history,
            last_split_ms: now,
            restart_generation: 0,
            silent_restarts: 0,
            last_error: None,
        }
    }

    // ------------------------------------------------------------------
    // User-facing transitions
    // ------------------------------------------------------------------

    /// Begin recording: clear the in-flight segment, reset continuity state,
    /// and ask the driver to start the backend.
    pub fn start_recording(&mut self) -> Option<Command> {
        if self.phase != SessionPhase::Idle {
            warn!("Recording already started");
            return None;
        }

        info!("Starting recording session: {}", self.config.session_id);
        let now = self.clock.now_ms();
        self.segment.restart(now);
        self.last_split_ms = now;
        self.continuity.on_session_start();
        self.silent_restarts = 0;
        self.last_error = None;
        self.phase = SessionPhase::Active;

        Some(Command::StartBackend)
    }

    /// Stop recording. A non-empty leftover segment is flushed as a final
    /// history entry; this is the only transition that flushes leftovers.
    pub fn stop_recording(&mut self) -> Option<Command> {
        if self.phase == SessionPhase::Idle {
            warn!("Recording not active");
            return None;
        }

        info!("Stopping recording session: {}", self.config.session_id);
        self.finish_recording();
        Some(Command::StopBackend)
    }

    /// Drop all logged entries.
    pub fn clear_history(&mut self) -> anyhow::Result<()> {
        self.history.clear()
    }

    // ------------------------------------------------------------------
    // Backend event transitions
    // ------------------------------------------------------------------

    pub fn handle_event(&mut self, event: BackendEvent) -> Option<Command> {
        match event {
            BackendEvent::SessionStarted => self.on_session_started(),
            BackendEvent::Result(result) => self.handle_result(result),
            BackendEvent::SessionEnded => self.on_session_ended(),
            BackendEvent::Error(kind) => self.on_error(kind),
        }
    }

    /// A fresh backend session is live. The only way suppression clears.
    fn on_session_started(&mut self) -> Option<Command> {
        debug!("Backend session started; resetting index tracking");
        self.continuity.on_session_start();
        if self.phase == SessionPhase::RestartPending {
            self.phase = SessionPhase::Active;
        }
        None
    }

    /// Fold one result event into the segment and evaluate the split policy.
    fn handle_result(&mut self, event: ResultEvent) -> Option<Command> {
        if self
            .continuity
            .should_discard(self.phase != SessionPhase::Idle)
        {
            debug!("Discarding result event (suppressed or not recording)");
            return None;
        }

        let delta = Delta::from_event(&event, self.continuity.last_consumed_index());
        for &index in &delta.accepted_indices {
            self.continuity.accept(index);
        }
        if !delta.accepted_indices.is_empty() {
            self.silent_restarts = 0;
        }

        let now = self.clock.now_ms();
        match self
            .policy
            .evaluate(&self.segment, &delta, self.last_split_ms, now)
        {
            SplitDecision::Keep => {
                self.apply_delta(&delta);
                None
            }
            SplitDecision::ResetTimerOnly => {
                debug!("Null cut: resetting split timer without logging");
                self.last_split_ms = now;
                self.apply_delta(&delta);
                None
            }
            SplitDecision::Cut { text } => {
                info!("Cutting segment ({} chars)", text.chars().count());
                self.push_history(text);
                self.segment.flush_and_clear(now);
                self.last_split_ms = now;
                self.continuity.begin_suppression();
                self.phase = SessionPhase::RestartPending;
                // The stop is what produces the restart with a clean index
                // space; audio capture (if any) is untouched.
                Some(Command::StopBackend)
            }
        }
    }

    /// The backend session terminated. While logically recording, schedule
    /// the automatic restart; past the silent-restart budget, give up and
    /// hard-stop instead of spinning forever.
    fn on_session_ended(&mut self) -> Option<Command> {
        match self.phase {
            SessionPhase::Idle => {
                debug!("Backend session ended while idle");
                None
            }
            SessionPhase::Active | SessionPhase::RestartPending => {
                self.silent_restarts += 1;
                if self.silent_restarts > self.config.max_silent_restarts {
                    error!(
                        "Backend produced no results across {} restarts; stopping recording",
                        self.config.max_silent_restarts
                    );
                    self.finish_recording();
                    return Some(Command::StopBackend);
                }

                self.restart_generation += 1;
                info!(
                    "Backend session ended; restarting in {:?}",
                    self.config.restart_delay
                );
                Some(Command::RestartBackendAfter {
                    delay: self.config.restart_delay,
                    generation: self.restart_generation,
                })
            }
        }
    }

    /// Called by the driver when a scheduled restart's timer fires. No-ops
    /// if the user stopped (or another transition superseded the schedule)
    /// in the meantime.
    pub fn confirm_restart(&mut self, generation: u64) -> Option<Command> {
        if self.phase == SessionPhase::Idle || generation != self.restart_generation {
            debug!("Ignoring stale restart timer (generation {})", generation);
            return None;
        }

        info!("Restarting backend session");
        Some(Command::StartBackend)
    }

    /// Backend error. Permission loss is fatal to the recording; anything
    /// else is logged and left to the automatic restart to heal.
    fn on_error(&mut self, kind: BackendErrorKind) -> Option<Command> {
        if kind.is_fatal() {
            error!("Fatal backend error: {}", kind);
            self.last_error = Some(kind);
            if self.phase == SessionPhase::Idle {
                return None;
            }
            self.finish_recording();
            Some(Command::StopBackend)
        } else {
            warn!("Recoverable backend error: {}", kind);
            None
        }
    }

    // ------------------------------------------------------------------
    // Read-only surface for collaborators
    // ------------------------------------------------------------------

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn is_recording(&self) -> bool {
        self.phase != SessionPhase::Idle
    }

    /// Live view of the in-flight segment (confirmed + interim, trimmed).
    pub fn current_snapshot(&self) -> String {
        self.segment.snapshot()
    }

    pub fn history(&self) -> &HistoryLog {
        &self.history
    }

    /// Elapsed fraction of the split interval, clamped to [0, 1]; 0 when
    /// idle.
    pub fn progress_fraction(&self) -> f64 {
        if self.phase == SessionPhase::Idle {
            return 0.0;
        }
        let elapsed = self.clock.now_ms().saturating_sub(self.last_split_ms) as f64;
        let interval = self.policy.split_interval_ms() as f64;
        if interval <= 0.0 {
            return 1.0;
        }
        (elapsed / interval).clamp(0.0, 1.0)
    }

    pub fn last_error(&self) -> Option<&BackendErrorKind> {
        self.last_error.as_ref()
    }

    pub fn session_id(&self) -> &str {
        &self.config.session_id
    }

    /// Take the history log back out, e.g. to export after a replay.
    pub fn into_history(self) -> HistoryLog {
        self.history
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn apply_delta(&mut self, delta: &Delta) {
        if !delta.new_final_text.is_empty() {
            self.segment.append_final(&delta.new_final_text);
        }
        self.segment.set_interim(&delta.interim_text);
    }

    /// Flush any leftover segment text and return to `Idle`, invalidating
    /// pending restarts.
    fn finish_recording(&mut self) {
        let now = self.clock.now_ms();
        if !self.segment.is_empty() {
            let leftover = self.segment.flush_and_clear(now);
            info!("Flushing leftover segment ({} chars)", leftover.chars().count());
            self.push_history(leftover);
        } else {
            self.segment.restart(now);
        }
        self.last_split_ms = now;
        self.phase = SessionPhase::Idle;
        self.restart_generation += 1;
        self.silent_restarts = 0;
    }

    fn push_history(&mut self, text: String) {
        if let Err(e) = self.history.append(text, local_time_label()) {
            // The entry stays in memory; only durability was affected.
            error!("Failed to persist history entry: {:#}", e);
        }
    }
}
