//! WizardEngine: applies user input to the wizard state one step at a time
//! and hands the finished record to the submission sink.

use std::sync::Arc;

use rust_decimal::Decimal;
use serde::Serialize;

use crate::error::WizardError;
use crate::notify::{Notifier, Severity};
use crate::submission::{SubmissionReceipt, SubmissionSink};

use super::parse::{NumericPolicy, parse_date, parse_number};
use super::state::WizardState;
use super::step::{StepKind, WizardStep};
use super::value::{AnswerRecord, FieldValue};

/// What an accepted input did to the wizard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Transition {
    /// A multi-choice option was flipped; the step is still active.
    Toggled { field: String, selected: Vec<String> },
    /// Moved to the step at `index`.
    Advanced { index: usize },
    /// The last step was answered and the record was accepted by the sink.
    /// The wizard has been reset for a new session.
    Completed {
        record: AnswerRecord,
        receipt: SubmissionReceipt,
    },
}

/// Drives a fixed, linear sequence of steps.
///
/// Rejected input leaves the state untouched and is reported both through
/// the notifier and the returned error.
pub struct WizardEngine {
    steps: Vec<WizardStep>,
    state: WizardState,
    numeric_policy: NumericPolicy,
    submitter: Arc<dyn SubmissionSink>,
    notifier: Arc<dyn Notifier>,
}

impl WizardEngine {
    pub fn new(
        steps: Vec<WizardStep>,
        submitter: Arc<dyn SubmissionSink>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            steps,
            state: WizardState::default(),
            numeric_policy: NumericPolicy::default(),
            submitter,
            notifier,
        }
    }

    pub fn with_numeric_policy(mut self, policy: NumericPolicy) -> Self {
        self.numeric_policy = policy;
        self
    }

    pub fn steps(&self) -> &[WizardStep] {
        &self.steps
    }

    pub fn state(&self) -> &WizardState {
        &self.state
    }

    /// The step awaiting input, or `None` once every step is answered.
    pub fn current_step(&self) -> Option<&WizardStep> {
        self.steps.get(self.state.current_step_index)
    }

    pub fn is_complete(&self) -> bool {
        self.state.current_step_index == self.steps.len()
    }

    /// `(answered, total)`.
    pub fn progress(&self) -> (usize, usize) {
        (self.state.current_step_index, self.steps.len())
    }

    /// Replace the state with a previously saved one.
    ///
    /// Refuses (and returns false) if the saved index is past the end, if
    /// the saved record holds answers for steps not reached yet, or if any
    /// answered step lacks a value it could have stored.
    pub fn restore(&mut self, state: WizardState) -> bool {
        let index = state.current_step_index;
        if index > self.steps.len() {
            tracing::warn!(index, steps = self.steps.len(), "Saved wizard state out of range");
            return false;
        }
        let reached = |field: &str| {
            self.steps
                .iter()
                .position(|s| s.target_field == field)
                .is_some_and(|pos| {
                    pos < index || (pos == index && self.steps[pos].kind == StepKind::MultiChoice)
                })
        };
        if let Some((field, _)) = state.record.iter().find(|(field, _)| !reached(*field)) {
            tracing::warn!(field, index, "Saved wizard state answers an unreached step");
            return false;
        }
        for (pos, step) in self.steps.iter().enumerate() {
            let answered = pos < index;
            match state.record.get(&step.target_field) {
                None if answered && !step.optional => {
                    tracing::warn!(
                        field = %step.target_field,
                        index,
                        "Saved wizard state misses a required answer"
                    );
                    return false;
                }
                Some(value) if !step.accepts(value) => {
                    tracing::warn!(
                        field = %step.target_field,
                        kind = %step.kind,
                        value_type = value.type_name(),
                        "Saved wizard state holds an answer the step would not store"
                    );
                    return false;
                }
                _ => {}
            }
        }
        self.state = state;
        true
    }

    /// Render the active step and add it to the transcript.
    pub fn present_step(&mut self) -> Option<String> {
        let text = self.render_prompt()?;
        self.state.push_assistant(text.clone());
        Some(text)
    }

    /// Render the active step without touching the transcript.
    pub fn render_prompt(&self) -> Option<String> {
        let step = self.current_step()?;
        let mut text = step.prompt.clone();
        if step.kind.is_choice() {
            let selected = self.state.record.selection(&step.target_field);
            for (i, choice) in step.choices.iter().enumerate() {
                let line = match step.kind {
                    StepKind::MultiChoice => {
                        let mark = if selected.contains(choice) { "x" } else { " " };
                        format!("\n  {}. [{mark}] {choice}", i + 1)
                    }
                    _ => format!("\n  {}. {choice}", i + 1),
                };
                text.push_str(&line);
            }
        }
        Some(text)
    }

    /// Answer a choice step.
    ///
    /// Single-choice sets the field and advances. Multi-choice flips the
    /// option in the selection and stays on the step.
    pub async fn submit_choice(&mut self, choice: &str) -> Result<Transition, WizardError> {
        let step = self.active_step()?.clone();
        if !step.kind.is_choice() {
            return Err(self.reject(wrong_kind(&step)));
        }
        if !step.has_choice(choice) {
            return Err(self.reject(WizardError::InvalidChoice {
                field: step.target_field.clone(),
                choice: choice.to_string(),
            }));
        }

        match step.kind {
            StepKind::MultiChoice => {
                let selected = self.state.record.toggle_choice(&step.target_field, choice);
                tracing::debug!(field = %step.target_field, choice, ?selected, "Toggled choice");
                Ok(Transition::Toggled {
                    field: step.target_field,
                    selected,
                })
            }
            _ => {
                self.state
                    .record
                    .set(&step.target_field, FieldValue::Text(choice.to_string()));
                self.state.push_user(choice);
                self.advance().await
            }
        }
    }

    /// Finish a multi-choice step. Needs at least one selected option.
    pub async fn continue_multi_choice(&mut self) -> Result<Transition, WizardError> {
        let step = self.active_step()?.clone();
        if step.kind != StepKind::MultiChoice {
            return Err(self.reject(wrong_kind(&step)));
        }
        let selected = self.state.record.selection(&step.target_field).join(", ");
        if selected.is_empty() {
            return Err(self.reject(WizardError::EmptySelection {
                field: step.target_field,
            }));
        }
        self.state.push_user(selected);
        self.advance().await
    }

    /// Answer a free-text, date, or numeric step.
    ///
    /// Blank input on an optional step skips it. Numbers that fail to parse
    /// follow the configured [`NumericPolicy`].
    pub async fn submit_freeform(&mut self, text: &str) -> Result<Transition, WizardError> {
        let step = self.active_step()?.clone();
        if !step.kind.is_freeform() {
            return Err(self.reject(wrong_kind(&step)));
        }

        let input = text.trim();
        if input.is_empty() {
            if step.optional {
                return self.skip().await;
            }
            return Err(self.reject(WizardError::EmptyInput {
                field: step.target_field,
            }));
        }

        let value = match step.kind {
            StepKind::Date => match parse_date(input) {
                Some(date) => FieldValue::Date(date),
                None => {
                    return Err(self.reject(WizardError::InvalidDate {
                        field: step.target_field,
                        input: input.to_string(),
                    }));
                }
            },
            StepKind::Numeric => match (parse_number(input), self.numeric_policy) {
                (Some(n), _) => FieldValue::Number(n),
                (None, NumericPolicy::FallbackToZero) => {
                    tracing::warn!(
                        field = %step.target_field,
                        input,
                        "Unparseable number, storing 0"
                    );
                    FieldValue::Number(Decimal::ZERO)
                }
                (None, NumericPolicy::Reject) => {
                    return Err(self.reject(WizardError::InvalidNumber {
                        field: step.target_field,
                        input: input.to_string(),
                    }));
                }
            },
            _ => {
                if let Some(format) = step.format
                    && !format.matches(input)
                {
                    return Err(self.reject(WizardError::InvalidFormat {
                        field: step.target_field,
                        input: input.to_string(),
                        expected: format.label().to_string(),
                    }));
                }
                FieldValue::Text(input.to_string())
            }
        };

        if let (FieldValue::Number(n), Some(limits)) = (&value, step.limits)
            && let Some(reason) = limits.violation(*n)
        {
            return Err(self.reject(WizardError::NumberOutOfRange {
                field: step.target_field,
                input: input.to_string(),
                reason,
            }));
        }

        self.state.record.set(&step.target_field, value);
        self.state.push_user(input);
        self.advance().await
    }

    /// Leave an optional step unanswered and move on.
    pub async fn skip(&mut self) -> Result<Transition, WizardError> {
        let step = self.active_step()?.clone();
        if !step.optional {
            return Err(self.reject(WizardError::StepNotSkippable {
                field: step.target_field,
            }));
        }
        self.state.record.remove(&step.target_field);
        self.state.push_user("(skipped)");
        self.advance().await
    }

    /// Hand the record to the sink again after a failed submission.
    pub async fn retry_submission(&mut self) -> Result<Transition, WizardError> {
        if !self.is_complete() {
            return Err(self.reject(WizardError::NotComplete));
        }
        self.complete().await
    }

    /// Discard the session and start over.
    pub fn reset(&mut self) {
        self.state.reset();
        tracing::debug!("Wizard reset");
    }

    /// User closed the wizard. Nothing is held beyond in-memory state.
    pub fn cancel(&mut self) {
        let (answered, total) = self.progress();
        tracing::info!(answered, total, "Wizard cancelled");
        self.state.reset();
    }

    fn active_step(&self) -> Result<&WizardStep, WizardError> {
        match self.current_step() {
            Some(step) => Ok(step),
            None => Err(self.reject(WizardError::AlreadyComplete)),
        }
    }

    /// Report a rejected input and hand the error back for returning.
    fn reject(&self, err: WizardError) -> WizardError {
        tracing::debug!(error = %err, index = self.state.current_step_index, "Input rejected");
        self.notifier
            .notify(error_title(&err), &err.to_string(), Severity::Error);
        err
    }

    async fn advance(&mut self) -> Result<Transition, WizardError> {
        let index = self.state.advance();
        tracing::debug!(index, total = self.steps.len(), "Wizard advanced");
        if self.is_complete() {
            return self.complete().await;
        }
        Ok(Transition::Advanced { index })
    }

    async fn complete(&mut self) -> Result<Transition, WizardError> {
        let record = self.state.record.clone();
        match self.submitter.submit(&record).await {
            Ok(receipt) => {
                tracing::info!(reference = %receipt.reference, "Wizard submission accepted");
                self.notifier
                    .notify("Request sent", &receipt.summary, Severity::Success);
                self.state.reset();
                Ok(Transition::Completed { record, receipt })
            }
            Err(e) => {
                tracing::warn!(error = %e, "Wizard submission failed");
                let err = WizardError::SubmissionFailed {
                    reason: e.to_string(),
                };
                self.notifier
                    .notify(error_title(&err), &err.to_string(), Severity::Error);
                Err(err)
            }
        }
    }
}

fn wrong_kind(step: &WizardStep) -> WizardError {
    WizardError::WrongStepKind {
        field: step.target_field.clone(),
        expected: step.kind.to_string(),
    }
}

fn error_title(err: &WizardError) -> &'static str {
    match err {
        WizardError::InvalidChoice { .. } => "Invalid choice",
        WizardError::EmptySelection { .. } => "Nothing selected",
        WizardError::EmptyInput { .. } => "Answer required",
        WizardError::StepNotSkippable { .. } => "Can't skip",
        WizardError::InvalidDate { .. } => "Invalid date",
        WizardError::InvalidNumber { .. } => "Invalid number",
        WizardError::NumberOutOfRange { .. } => "Number out of range",
        WizardError::InvalidFormat { .. } => "Invalid format",
        WizardError::WrongStepKind { .. } => "Unexpected answer",
        WizardError::AlreadyComplete => "Already complete",
        WizardError::NotComplete => "Not finished",
        WizardError::SubmissionFailed { .. } => "Submission failed",
    }
}
