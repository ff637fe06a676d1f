//! Step definitions for the intake wizard.

use std::sync::LazyLock;

use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::value::FieldValue;

/// Kind of input a step accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    SingleChoice,
    MultiChoice,
    FreeText,
    Date,
    Numeric,
}

impl StepKind {
    /// Whether the step is answered by picking from `choices`.
    pub fn is_choice(&self) -> bool {
        matches!(self, Self::SingleChoice | Self::MultiChoice)
    }

    /// Whether the step is answered by typing.
    pub fn is_freeform(&self) -> bool {
        !self.is_choice()
    }
}

impl std::fmt::Display for StepKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::SingleChoice => "single_choice",
            Self::MultiChoice => "multi_choice",
            Self::FreeText => "free_text",
            Self::Date => "date",
            Self::Numeric => "numeric",
        };
        write!(f, "{s}")
    }
}

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+\-]+@[A-Za-z0-9.\-]+\.[A-Za-z]{2,}$").unwrap()
});

// Optional +91 / 0 prefix, then a 10-digit mobile number starting 6-9.
static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:\+91|91|0)?[6-9]\d{9}$").unwrap());

/// Format constraint on a free-text answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextFormat {
    Email,
    /// Indian mobile number. Spaces and dashes are ignored.
    Phone,
}

impl TextFormat {
    pub fn matches(&self, input: &str) -> bool {
        match self {
            Self::Email => EMAIL_RE.is_match(input),
            Self::Phone => {
                let compact: String = input
                    .chars()
                    .filter(|c| !c.is_whitespace() && *c != '-')
                    .collect();
                PHONE_RE.is_match(&compact)
            }
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Email => "email address",
            Self::Phone => "phone number",
        }
    }
}

/// Bounds on a numeric answer, checked when the answer is given.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NumberLimits {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<Decimal>,
    /// Reject fractional values.
    #[serde(default)]
    pub whole: bool,
}

impl NumberLimits {
    /// Any amount of zero or more.
    pub fn non_negative() -> Self {
        Self {
            min: Some(Decimal::ZERO),
            max: None,
            whole: false,
        }
    }

    /// A whole count from 0 to `max`.
    pub fn count(max: u32) -> Self {
        Self {
            min: Some(Decimal::ZERO),
            max: Some(Decimal::from(max)),
            whole: true,
        }
    }

    /// Why `n` falls outside the limits, if it does.
    pub fn violation(&self, n: Decimal) -> Option<String> {
        if self.whole && !n.fract().is_zero() {
            return Some("must be a whole number".to_string());
        }
        if let Some(min) = self.min
            && n < min
        {
            return Some(format!("must be at least {min}"));
        }
        if let Some(max) = self.max
            && n > max
        {
            return Some(format!("must be at most {max}"));
        }
        None
    }
}

/// One prompt/response unit in the wizard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WizardStep {
    pub prompt: String,
    pub kind: StepKind,
    /// Record field this step populates.
    pub target_field: String,
    /// Options for choice steps, empty otherwise.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub choices: Vec<String>,
    #[serde(default)]
    pub optional: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<TextFormat>,
    /// Bounds for numeric steps.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limits: Option<NumberLimits>,
}

impl WizardStep {
    fn base(kind: StepKind, field: &str, prompt: &str) -> Self {
        Self {
            prompt: prompt.to_string(),
            kind,
            target_field: field.to_string(),
            choices: Vec::new(),
            optional: false,
            format: None,
            limits: None,
        }
    }

    fn with_choices<I, S>(kind: StepKind, field: &str, prompt: &str, choices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut unique: Vec<String> = Vec::new();
        for choice in choices {
            let choice = choice.into();
            if !unique.contains(&choice) {
                unique.push(choice);
            }
        }
        assert!(!unique.is_empty(), "choice step {field} needs at least one option");
        Self {
            choices: unique,
            ..Self::base(kind, field, prompt)
        }
    }

    /// A step answered by exactly one of `choices`.
    ///
    /// Panics if `choices` is empty.
    pub fn single_choice<I, S>(field: &str, prompt: &str, choices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_choices(StepKind::SingleChoice, field, prompt, choices)
    }

    /// A step answered by a non-empty subset of `choices`.
    ///
    /// Panics if `choices` is empty.
    pub fn multi_choice<I, S>(field: &str, prompt: &str, choices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_choices(StepKind::MultiChoice, field, prompt, choices)
    }

    pub fn free_text(field: &str, prompt: &str) -> Self {
        Self::base(StepKind::FreeText, field, prompt)
    }

    pub fn date(field: &str, prompt: &str) -> Self {
        Self::base(StepKind::Date, field, prompt)
    }

    pub fn numeric(field: &str, prompt: &str) -> Self {
        Self::base(StepKind::Numeric, field, prompt)
    }

    /// Mark the step as skippable.
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// Constrain a free-text answer to a format.
    pub fn with_format(mut self, format: TextFormat) -> Self {
        self.format = Some(format);
        self
    }

    /// Constrain a numeric answer to a range.
    pub fn with_limits(mut self, limits: NumberLimits) -> Self {
        self.limits = Some(limits);
        self
    }

    pub fn has_choice(&self, choice: &str) -> bool {
        self.choices.iter().any(|c| c == choice)
    }

    /// Whether `value` is something this step could have stored.
    pub fn accepts(&self, value: &FieldValue) -> bool {
        match (self.kind, value) {
            (StepKind::SingleChoice, FieldValue::Text(t)) => self.has_choice(t),
            (StepKind::MultiChoice, FieldValue::Choices(c)) => {
                !c.is_empty() && c.iter().all(|choice| self.has_choice(choice))
            }
            (StepKind::FreeText, FieldValue::Text(t)) => {
                !t.trim().is_empty() && self.format.is_none_or(|f| f.matches(t))
            }
            (StepKind::Date, FieldValue::Date(_)) => true,
            (StepKind::Numeric, FieldValue::Number(n)) => {
                self.limits.is_none_or(|l| l.violation(*n).is_none())
            }
            _ => false,
        }
    }
}
