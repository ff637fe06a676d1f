//! Chat wizard: a linear, UI-agnostic intake flow.
//!
//! A wizard is a fixed list of [`WizardStep`]s. The [`WizardEngine`] applies
//! one user input at a time to a [`WizardState`], rejecting anything that
//! does not fit the active step, and hands the finished [`AnswerRecord`] to
//! a submission sink once the last step is answered. Presentation layers
//! (terminal, HTTP) are thin views over the engine.

pub mod engine;
pub mod parse;
pub mod state;
pub mod step;
pub mod value;

pub use engine::{Transition, WizardEngine};
pub use parse::NumericPolicy;
pub use state::{Speaker, TranscriptEntry, WizardState};
pub use step::{NumberLimits, StepKind, TextFormat, WizardStep};
pub use value::{AnswerRecord, FieldValue};
