use super::delta::Delta;
use super::segment::SegmentBuffer;

/// Outcome of evaluating one accepted delta against the split policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SplitDecision {
    /// Keep accumulating; apply the delta to the segment buffer as usual.
    Keep,

    /// Close the segment: log `text`, clear the buffer, cycle the backend.
    Cut { text: String },

    /// Both gates held but the segment would be empty: restart the split
    /// timer so the same null cut is not re-evaluated on every delta, and
    /// otherwise carry on.
    ResetTimerOnly,
}

/// Decides when the accumulated segment becomes a finished history entry.
///
/// Two independent gates must both hold: enough time has passed since the
/// last cut, and the latest phrase shows a lexical end-of-utterance signal.
/// Tying the cut to a grammatically plausible boundary keeps entries from
/// ending mid-clause without waiting indefinitely for silence.
#[derive(Debug, Clone)]
pub struct SplitPolicy {
    split_interval_ms: u64,
    end_markers: Vec<String>,
}

impl SplitPolicy {
    pub fn new(split_interval_ms: u64, end_markers: Vec<String>) -> Self {
        Self {
            split_interval_ms,
            end_markers,
        }
    }

    /// Terminal punctuation plus sentence-final inflections for Japanese,
    /// matching the default recognition language.
    pub fn default_markers() -> Vec<String> {
        ["。", "！", "？", "です", "ます", "でした", "ました", "思う", "思った", "思いました"]
            .into_iter()
            .map(String::from)
            .collect()
    }

    pub fn split_interval_ms(&self) -> u64 {
        self.split_interval_ms
    }

    /// Lexical gate: does the phrase contain any configured end marker?
    pub fn matches_end_of_utterance(&self, phrase: &str) -> bool {
        self.end_markers
            .iter()
            .any(|marker| !marker.is_empty() && phrase.contains(marker))
    }

    /// Evaluate one delta against the state as it was immediately before the
    /// delta arrived. At most one cut per delta.
    ///
    /// On a cut, the entry text folds in the delta's final and interim text
    /// even though they have not been applied to the buffer yet, so nothing
    /// is lost at the cut boundary.
    pub fn evaluate(
        &self,
        buffer: &SegmentBuffer,
        delta: &Delta,
        last_split_ms: u64,
        now_ms: u64,
    ) -> SplitDecision {
        if now_ms.saturating_sub(last_split_ms) < self.split_interval_ms {
            return SplitDecision::Keep;
        }

        if !self.matches_end_of_utterance(&delta.latest_phrase) {
            return SplitDecision::Keep;
        }

        let mut full = String::with_capacity(
            buffer.confirmed().len() + delta.new_final_text.len() + delta.interim_text.len(),
        );
        full.push_str(buffer.confirmed());
        full.push_str(&delta.new_final_text);
        full.push_str(&delta.interim_text);
        let full = full.trim();

        if full.is_empty() {
            SplitDecision::ResetTimerOnly
        } else {
            SplitDecision::Cut {
                text: full.to_string(),
            }
        }
    }
}
