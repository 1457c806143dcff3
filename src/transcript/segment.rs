/// The single in-flight, not-yet-logged transcript segment.
///
/// Confirmed text is append-only within a segment; interim text is replaced
/// wholesale on every delta. At most one segment exists at a time, and it is
/// cleared exactly when a cut occurs or recording stops.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentBuffer {
    confirmed: String,
    interim: String,
    started_at_ms: u64,
}

impl SegmentBuffer {
    pub fn new(now_ms: u64) -> Self {
        Self {
            confirmed: String::new(),
            interim: String::new(),
            started_at_ms: now_ms,
        }
    }

    pub fn confirmed(&self) -> &str {
        &self.confirmed
    }

    pub fn interim(&self) -> &str {
        &self.interim
    }

    pub fn started_at_ms(&self) -> u64 {
        self.started_at_ms
    }

    /// Append newly confirmed text.
    pub fn append_final(&mut self, text: &str) {
        self.confirmed.push_str(text);
    }

    /// Replace the interim tail with the backend's current best guess.
    pub fn set_interim(&mut self, text: &str) {
        self.interim.clear();
        self.interim.push_str(text);
    }

    /// What would be logged if the segment were cut now: confirmed plus
    /// interim, trimmed. Also what a presentation layer shows live.
    pub fn snapshot(&self) -> String {
        let mut full = String::with_capacity(self.confirmed.len() + self.interim.len());
        full.push_str(&self.confirmed);
        full.push_str(&self.interim);
        full.trim().to_string()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshot().is_empty()
    }

    /// Take the snapshot and reset the segment, restarting its clock at
    /// `now_ms`. Called exactly once per cut or stop-with-leftover.
    pub fn flush_and_clear(&mut self, now_ms: u64) -> String {
        let text = self.snapshot();
        self.restart(now_ms);
        text
    }

    /// Reset to an empty segment starting at `now_ms` without flushing.
    pub fn restart(&mut self, now_ms: u64) {
        self.confirmed.clear();
        self.interim.clear();
        self.started_at_ms = now_ms;
    }
}
