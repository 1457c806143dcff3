/// Per-backend-session dedup and suppression bookkeeping.
///
/// `last_consumed_index` is the high-water mark of final hypotheses already
/// folded into the segment buffer. `suppressing` is raised the instant a
/// policy cut decides to cycle the backend session and stays up until the
/// replacement session reports in, so that results produced for the
/// abandoned session are never counted twice.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContinuityTracker {
    last_consumed_index: Option<u64>,
    suppressing: bool,
}

impl ContinuityTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_consumed_index(&self) -> Option<u64> {
        self.last_consumed_index
    }

    pub fn is_suppressing(&self) -> bool {
        self.suppressing
    }

    /// Whether an incoming event should be dropped wholesale: either we are
    /// inside a suppression window, or recording is not active at all.
    pub fn should_discard(&self, recording_active: bool) -> bool {
        self.suppressing || !recording_active
    }

    /// Mark a final hypothesis as consumed. A stale or duplicate index is a
    /// no-op, which makes redelivery of the same event harmless.
    pub fn accept(&mut self, index: u64) {
        if self.last_consumed_index.map_or(true, |last| index > last) {
            self.last_consumed_index = Some(index);
        }
    }

    /// Enter the suppression window. Only `on_session_start` clears it.
    pub fn begin_suppression(&mut self) {
        self.suppressing = true;
    }

    /// A fresh backend session is live: reset the index space and lift
    /// suppression.
    pub fn on_session_start(&mut self) {
        self.last_consumed_index = None;
        self.suppressing = false;
    }
}
