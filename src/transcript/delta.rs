use crate::recognition::ResultEvent;

/// Normalized increment extracted from one backend result event.
///
/// Pure function of the event plus the continuity tracker's last consumed
/// index; building a delta never mutates tracker state. The caller advances
/// the tracker with `accepted_indices` once it commits the delta, which keeps
/// duplicate deliveries of the same event idempotent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Delta {
    /// Newly confirmed text: transcripts of final hypotheses with an index
    /// beyond the last consumed one, concatenated in ascending index order.
    pub new_final_text: String,

    /// The backend's current best guess for not-yet-finalized speech.
    /// Replaces (never appends to) the previous interim text.
    pub interim_text: String,

    /// Every hypothesis transcript in the event, final or not. Used only by
    /// the split policy's end-of-utterance check, never for display.
    pub latest_phrase: String,

    /// Indices of the final hypotheses folded into `new_final_text`,
    /// ascending.
    pub accepted_indices: Vec<u64>,
}

impl Delta {
    /// Normalize `event` against the tracker's high-water mark.
    pub fn from_event(event: &ResultEvent, last_consumed_index: Option<u64>) -> Self {
        let mut delta = Delta::default();

        let mut finals: Vec<_> = event
            .hypotheses
            .iter()
            .filter(|h| h.is_final)
            .filter(|h| last_consumed_index.map_or(true, |last| h.index > last))
            .collect();
        finals.sort_by_key(|h| h.index);

        for hypothesis in finals {
            delta.new_final_text.push_str(&hypothesis.transcript);
            delta.accepted_indices.push(hypothesis.index);
        }

        for hypothesis in &event.hypotheses {
            if !hypothesis.is_final {
                delta.interim_text.push_str(&hypothesis.transcript);
            }
            delta.latest_phrase.push_str(&hypothesis.transcript);
        }

        delta
    }

    /// True when the event carried nothing usable at all.
    pub fn is_empty(&self) -> bool {
        self.new_final_text.is_empty() && self.interim_text.is_empty()
    }
}
