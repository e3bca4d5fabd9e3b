use serde::Serialize;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::playback::state::PlaybackState;
use crate::sequence::operation::{EventType, StepId};

/// One line of the session journal.
#[derive(Debug, Serialize)]
pub struct JournalEvent {
    pub timestamp_ms: u128,
    /// record, insert, delete, edit, compact, load, save, new, state
    pub kind: &'static str,

    pub state: String,
    pub steps: usize,

    pub step: Option<u32>,
    pub event_type: Option<&'static str>,
    pub detail: Option<String>,
}

impl JournalEvent {
    pub fn now(kind: &'static str, state: PlaybackState, steps: usize) -> Self {
        Self {
            timestamp_ms: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_millis())
                .unwrap_or_default(),
            kind,
            state: state.to_string(),
            steps,
            step: None,
            event_type: None,
            detail: None,
        }
    }

    pub fn with_step(mut self, id: StepId) -> Self {
        self.step = Some(id.0);
        self
    }

    pub fn with_event_type(mut self, event_type: EventType) -> Self {
        self.event_type = Some(event_type.as_str());
        self
    }

    pub fn with_detail(mut self, detail: impl ToString) -> Self {
        self.detail = Some(detail.to_string());
        self
    }
}
