//! Error types for the event wizard.

/// Top-level error type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Wizard error: {0}")]
    Wizard(#[from] WizardError),

    #[error("Submission error: {0}")]
    Submission(#[from] SubmissionError),

    #[error("Intake error: {0}")]
    Intake(#[from] IntakeError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Database-related errors.
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("Connection pool error: {0}")]
    Pool(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Errors raised by wizard transitions.
///
/// Every variant except `SubmissionFailed` leaves the wizard state untouched.
/// `SubmissionFailed` leaves it completed so the caller can retry.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WizardError {
    #[error("\"{choice}\" is not one of the options for {field}")]
    InvalidChoice { field: String, choice: String },

    #[error("Select at least one option for {field} before continuing")]
    EmptySelection { field: String },

    #[error("An answer for {field} is required")]
    EmptyInput { field: String },

    #[error("Step {field} is required and cannot be skipped")]
    StepNotSkippable { field: String },

    #[error("\"{input}\" is not a valid date for {field}")]
    InvalidDate { field: String, input: String },

    #[error("\"{input}\" is not a valid number for {field}")]
    InvalidNumber { field: String, input: String },

    #[error("{input} is out of range for {field}: {reason}")]
    NumberOutOfRange {
        field: String,
        input: String,
        reason: String,
    },

    #[error("\"{input}\" is not a valid {expected} for {field}")]
    InvalidFormat {
        field: String,
        input: String,
        expected: String,
    },

    #[error("Step {field} expects {expected} input")]
    WrongStepKind { field: String, expected: String },

    #[error("All steps are already answered")]
    AlreadyComplete,

    #[error("Not all steps are answered yet")]
    NotComplete,

    #[error("Submission failed: {reason}")]
    SubmissionFailed { reason: String },
}

/// Failures reported by a submission collaborator.
#[derive(Debug, thiserror::Error)]
pub enum SubmissionError {
    #[error("Record rejected: {0}")]
    Rejected(#[from] IntakeError),

    #[error("Storage failed: {0}")]
    Storage(#[from] DatabaseError),

    #[error("Submission unavailable: {0}")]
    Unavailable(String),
}

/// Errors converting an answer record into a typed inquiry.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IntakeError {
    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Field {field} has the wrong type, expected {expected}")]
    WrongType { field: String, expected: String },

    #[error("Field {field} has an invalid value: {reason}")]
    InvalidValue { field: String, reason: String },
}

/// Result type alias.
pub type Result<T> = std::result::Result<T, Error>;
