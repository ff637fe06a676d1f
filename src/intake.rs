//! Event booking intake: the canonical step list and the typed inquiry it
//! produces.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::IntakeError;
use crate::wizard::{AnswerRecord, FieldValue, NumberLimits, TextFormat, WizardStep};

/// Record field names written by [`event_intake_steps`].
pub mod fields {
    pub const EVENT_TYPE: &str = "event_type";
    pub const EVENT_DATE: &str = "event_date";
    pub const LOCATION: &str = "location";
    pub const GUEST_COUNT: &str = "guest_count";
    pub const SERVICES: &str = "services";
    pub const BUDGET: &str = "budget";
    pub const THEME: &str = "theme";
    pub const CONTACT_NAME: &str = "contact_name";
    pub const CONTACT_EMAIL: &str = "contact_email";
    pub const CONTACT_PHONE: &str = "contact_phone";
}

pub const EVENT_TYPES: &[&str] = &[
    "Wedding",
    "Engagement",
    "Birthday",
    "Anniversary",
    "Baby Shower",
    "Corporate Event",
    "Other",
];

pub const SERVICES: &[&str] = &[
    "Photography",
    "Videography",
    "Catering",
    "Decoration",
    "Venue",
    "Makeup Artist",
    "Mehendi",
    "DJ & Music",
    "Entertainment",
];

/// Largest guest count the intake form accepts.
pub const MAX_GUESTS: u32 = 100_000;

/// The booking inquiry flow, in order.
pub fn event_intake_steps() -> Vec<WizardStep> {
    vec![
        WizardStep::single_choice(
            fields::EVENT_TYPE,
            "Hi! 👋 Let's plan your event. What are you celebrating?",
            EVENT_TYPES.iter().copied(),
        ),
        WizardStep::date(
            fields::EVENT_DATE,
            "When is the event? (e.g. 15/03/2026)",
        ),
        WizardStep::free_text(fields::LOCATION, "Which city or venue will it be in?"),
        WizardStep::numeric(fields::GUEST_COUNT, "Roughly how many guests are you expecting?")
            .with_limits(NumberLimits::count(MAX_GUESTS)),
        WizardStep::multi_choice(
            fields::SERVICES,
            "Which services do you need? Pick all that apply, then continue.",
            SERVICES.iter().copied(),
        ),
        WizardStep::numeric(fields::BUDGET, "What's your overall budget in ₹?")
            .with_limits(NumberLimits::non_negative()),
        WizardStep::free_text(
            fields::THEME,
            "Do you have a theme or colour palette in mind?",
        )
        .optional(),
        WizardStep::free_text(fields::CONTACT_NAME, "What's your name?"),
        WizardStep::free_text(fields::CONTACT_EMAIL, "Your email address?")
            .with_format(TextFormat::Email),
        WizardStep::free_text(fields::CONTACT_PHONE, "And a phone number we can reach you on?")
            .with_format(TextFormat::Phone),
    ]
}

/// Where an inquiry is in the provider follow-up process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InquiryStatus {
    New,
    Contacted,
    Closed,
}

impl InquiryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Contacted => "contacted",
            Self::Closed => "closed",
        }
    }

    pub fn from_str_db(s: &str) -> Option<Self> {
        match s {
            "new" => Some(Self::New),
            "contacted" => Some(Self::Contacted),
            "closed" => Some(Self::Closed),
            _ => None,
        }
    }
}

impl std::fmt::Display for InquiryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A completed booking inquiry with one typed field per step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventInquiry {
    pub id: Uuid,
    pub event_type: String,
    pub event_date: NaiveDate,
    pub location: String,
    pub guest_count: u32,
    pub services: Vec<String>,
    pub budget: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
    pub contact_name: String,
    pub contact_email: String,
    pub contact_phone: String,
    pub status: InquiryStatus,
    pub created_at: DateTime<Utc>,
}

impl EventInquiry {
    /// Build an inquiry from a completed wizard record.
    pub fn from_record(record: &AnswerRecord) -> Result<Self, IntakeError> {
        let guest_count = required_number(record, fields::GUEST_COUNT)?;
        let guest_count = guest_count
            .trunc()
            .to_u32()
            .ok_or_else(|| IntakeError::InvalidValue {
                field: fields::GUEST_COUNT.to_string(),
                reason: format!("{guest_count} is not a whole, non-negative count"),
            })?;

        let budget = required_number(record, fields::BUDGET)?;
        if budget.is_sign_negative() {
            return Err(IntakeError::InvalidValue {
                field: fields::BUDGET.to_string(),
                reason: "budget cannot be negative".to_string(),
            });
        }

        let services = match record.get(fields::SERVICES) {
            Some(FieldValue::Choices(c)) => c.clone(),
            Some(_) => return Err(wrong_type(fields::SERVICES, "choices")),
            None => return Err(IntakeError::MissingField(fields::SERVICES.to_string())),
        };

        let event_date = match record.get(fields::EVENT_DATE) {
            Some(FieldValue::Date(d)) => *d,
            Some(_) => return Err(wrong_type(fields::EVENT_DATE, "date")),
            None => return Err(IntakeError::MissingField(fields::EVENT_DATE.to_string())),
        };

        Ok(Self {
            id: Uuid::new_v4(),
            event_type: required_text(record, fields::EVENT_TYPE)?,
            event_date,
            location: required_text(record, fields::LOCATION)?,
            guest_count,
            services,
            budget,
            theme: optional_text(record, fields::THEME)?,
            contact_name: required_text(record, fields::CONTACT_NAME)?,
            contact_email: required_text(record, fields::CONTACT_EMAIL)?,
            contact_phone: required_text(record, fields::CONTACT_PHONE)?,
            status: InquiryStatus::New,
            created_at: Utc::now(),
        })
    }

    /// One-line description for logs and confirmations.
    pub fn summary(&self) -> String {
        format!(
            "{} on {} in {} for {} guests (₹{}): {}",
            self.event_type,
            self.event_date.format("%d %b %Y"),
            self.location,
            self.guest_count,
            self.budget,
            self.services.join(", ")
        )
    }
}

fn wrong_type(field: &str, expected: &str) -> IntakeError {
    IntakeError::WrongType {
        field: field.to_string(),
        expected: expected.to_string(),
    }
}

fn optional_text(record: &AnswerRecord, field: &str) -> Result<Option<String>, IntakeError> {
    match record.get(field) {
        Some(FieldValue::Text(s)) => Ok(Some(s.clone())),
        Some(_) => Err(wrong_type(field, "text")),
        None => Ok(None),
    }
}

fn required_text(record: &AnswerRecord, field: &str) -> Result<String, IntakeError> {
    optional_text(record, field)?.ok_or_else(|| IntakeError::MissingField(field.to_string()))
}

fn required_number(record: &AnswerRecord, field: &str) -> Result<Decimal, IntakeError> {
    match record.get(field) {
        Some(FieldValue::Number(n)) => Ok(*n),
        Some(_) => Err(wrong_type(field, "number")),
        None => Err(IntakeError::MissingField(field.to_string())),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    pub(crate) fn complete_record() -> AnswerRecord {
        let mut record = AnswerRecord::new();
        record.set(fields::EVENT_TYPE, FieldValue::Text("Wedding".into()));
        record.set(
            fields::EVENT_DATE,
            FieldValue::Date(NaiveDate::from_ymd_opt(2026, 2, 14).unwrap()),
        );
        record.set(fields::LOCATION, FieldValue::Text("Udaipur".into()));
        record.set(fields::GUEST_COUNT, FieldValue::Number(dec!(250)));
        record.set(
            fields::SERVICES,
            FieldValue::Choices(vec!["Catering".into(), "Photography".into()]),
        );
        record.set(fields::BUDGET, FieldValue::Number(dec!(500000)));
        record.set(fields::CONTACT_NAME, FieldValue::Text("Ananya Rao".into()));
        record.set(fields::CONTACT_EMAIL, FieldValue::Text("ananya@example.in".into()));
        record.set(fields::CONTACT_PHONE, FieldValue::Text("9876543210".into()));
        record
    }

    #[test]
    fn steps_cover_every_field_once() {
        let steps = event_intake_steps();
        let names: Vec<&str> = steps.iter().map(|s| s.target_field.as_str()).collect();
        assert_eq!(
            names,
            vec![
                fields::EVENT_TYPE,
                fields::EVENT_DATE,
                fields::LOCATION,
                fields::GUEST_COUNT,
                fields::SERVICES,
                fields::BUDGET,
                fields::THEME,
                fields::CONTACT_NAME,
                fields::CONTACT_EMAIL,
                fields::CONTACT_PHONE,
            ]
        );
        let optional: Vec<&str> = steps
            .iter()
            .filter(|s| s.optional)
            .map(|s| s.target_field.as_str())
            .collect();
        assert_eq!(optional, vec![fields::THEME]);
    }

    #[test]
    fn builds_inquiry_from_complete_record() {
        let inquiry = EventInquiry::from_record(&complete_record()).unwrap();
        assert_eq!(inquiry.event_type, "Wedding");
        assert_eq!(inquiry.guest_count, 250);
        assert_eq!(inquiry.services, vec!["Catering", "Photography"]);
        assert_eq!(inquiry.budget, dec!(500000));
        assert!(inquiry.theme.is_none());
        assert_eq!(inquiry.status, InquiryStatus::New);
        assert!(inquiry.summary().contains("Udaipur"));
    }

    #[test]
    fn fractional_guest_count_is_truncated() {
        let mut record = complete_record();
        record.set(fields::GUEST_COUNT, FieldValue::Number(dec!(120.7)));
        let inquiry = EventInquiry::from_record(&record).unwrap();
        assert_eq!(inquiry.guest_count, 120);
    }

    #[test]
    fn missing_field_is_reported() {
        let mut record = complete_record();
        record.remove(fields::CONTACT_PHONE);
        assert_eq!(
            EventInquiry::from_record(&record),
            Err(IntakeError::MissingField(fields::CONTACT_PHONE.to_string()))
        );
    }

    #[test]
    fn wrong_type_is_reported() {
        let mut record = complete_record();
        record.set(fields::BUDGET, FieldValue::Text("lots".into()));
        assert!(matches!(
            EventInquiry::from_record(&record),
            Err(IntakeError::WrongType { .. })
        ));
    }

    #[test]
    fn negative_values_rejected() {
        let mut record = complete_record();
        record.set(fields::GUEST_COUNT, FieldValue::Number(dec!(-5)));
        assert!(matches!(
            EventInquiry::from_record(&record),
            Err(IntakeError::InvalidValue { .. })
        ));

        let mut record = complete_record();
        record.set(fields::BUDGET, FieldValue::Number(dec!(-1)));
        assert!(matches!(
            EventInquiry::from_record(&record),
            Err(IntakeError::InvalidValue { .. })
        ));
    }

    #[test]
    fn status_db_strings_roundtrip() {
        for status in [InquiryStatus::New, InquiryStatus::Contacted, InquiryStatus::Closed] {
            assert_eq!(InquiryStatus::from_str_db(status.as_str()), Some(status));
        }
        assert_eq!(InquiryStatus::from_str_db("bogus"), None);
    }
}
