//! Wizard state: step index, collected answers, and the display transcript.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::value::AnswerRecord;

/// Who said a transcript line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Speaker {
    Assistant,
    User,
}

/// One displayed message. Not authoritative state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    pub speaker: Speaker,
    pub text: String,
    pub at: DateTime<Utc>,
}

/// State of one wizard session.
///
/// `current_step_index == step count` means every step is answered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WizardState {
    pub current_step_index: usize,
    pub record: AnswerRecord,
    pub transcript: Vec<TranscriptEntry>,
}

impl WizardState {
    /// Move to the next step. Returns the new index.
    pub fn advance(&mut self) -> usize {
        self.current_step_index += 1;
        self.current_step_index
    }

    pub fn push_assistant(&mut self, text: impl Into<String>) {
        self.push(Speaker::Assistant, text.into());
    }

    pub fn push_user(&mut self, text: impl Into<String>) {
        self.push(Speaker::User, text.into());
    }

    fn push(&mut self, speaker: Speaker, text: String) {
        self.transcript.push(TranscriptEntry {
            speaker,
            text,
            at: Utc::now(),
        });
    }

    /// Back to `{0, {}, []}`.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Whether the state is the pristine initial state.
    pub fn is_initial(&self) -> bool {
        self.current_step_index == 0 && self.record.is_empty() && self.transcript.is_empty()
    }
}
