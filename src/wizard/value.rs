//! Answer values collected by the wizard.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A single collected answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum FieldValue {
    Text(String),
    /// Multi-choice selection in the order it was made. Never holds duplicates.
    Choices(Vec<String>),
    Date(NaiveDate),
    Number(Decimal),
}

impl FieldValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_choices(&self) -> Option<&[String]> {
        match self {
            Self::Choices(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Self::Date(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<Decimal> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::Choices(_) => "choices",
            Self::Date(_) => "date",
            Self::Number(_) => "number",
        }
    }
}

impl std::fmt::Display for FieldValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text(s) => write!(f, "{s}"),
            Self::Choices(c) => write!(f, "{}", c.join(", ")),
            Self::Date(d) => write!(f, "{}", d.format("%d %B %Y")),
            Self::Number(n) => write!(f, "{n}"),
        }
    }
}

/// Field name to answer, built up one step at a time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnswerRecord(BTreeMap<String, FieldValue>);

impl AnswerRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.0.get(field)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn set(&mut self, field: &str, value: FieldValue) {
        self.0.insert(field.to_string(), value);
    }

    pub fn remove(&mut self, field: &str) -> Option<FieldValue> {
        self.0.remove(field)
    }

    /// Flip `choice` in the multi-choice selection at `field`.
    ///
    /// An emptied selection removes the field entirely. Returns the selection
    /// after the toggle.
    pub fn toggle_choice(&mut self, field: &str, choice: &str) -> Vec<String> {
        let mut selected = match self.0.remove(field) {
            Some(FieldValue::Choices(c)) => c,
            _ => Vec::new(),
        };
        if let Some(pos) = selected.iter().position(|c| c == choice) {
            selected.remove(pos);
        } else {
            selected.push(choice.to_string());
        }
        if !selected.is_empty() {
            self.0
                .insert(field.to_string(), FieldValue::Choices(selected.clone()));
        }
        selected
    }

    /// Current multi-choice selection at `field`, empty if unset.
    pub fn selection(&self, field: &str) -> &[String] {
        self.get(field).and_then(|v| v.as_choices()).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn toggle_adds_then_removes() {
        let mut record = AnswerRecord::new();
        assert_eq!(record.toggle_choice("services", "Catering"), vec!["Catering"]);
        assert_eq!(
            record.toggle_choice("services", "Photography"),
            vec!["Catering", "Photography"]
        );
        assert_eq!(record.toggle_choice("services", "Catering"), vec!["Photography"]);
        assert_eq!(record.selection("services"), ["Photography"]);
    }

    #[test]
    fn toggle_pair_restores_prior_record() {
        let mut record = AnswerRecord::new();
        record.toggle_choice("services", "Decoration");
        let before = record.clone();

        record.toggle_choice("services", "Catering");
        record.toggle_choice("services", "Catering");
        assert_eq!(record, before);

        let mut empty = AnswerRecord::new();
        empty.toggle_choice("services", "Catering");
        empty.toggle_choice("services", "Catering");
        assert!(!empty.contains("services"));
    }

    #[test]
    fn accessors_match_variant() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 15).unwrap();
        assert_eq!(FieldValue::Date(date).as_date(), Some(date));
        assert_eq!(FieldValue::Number(dec!(12.5)).as_number(), Some(dec!(12.5)));
        assert_eq!(FieldValue::Text("Goa".into()).as_text(), Some("Goa"));
        assert!(FieldValue::Text("Goa".into()).as_number().is_none());
    }

    #[test]
    fn record_serializes_as_tagged_map() {
        let mut record = AnswerRecord::new();
        record.set("type", FieldValue::Text("Wedding".into()));
        record.set("budget", FieldValue::Number(dec!(15000)));

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["type"]["type"], "text");
        assert_eq!(json["type"]["value"], "Wedding");
        assert_eq!(json["budget"]["value"], "15000");

        let parsed: AnswerRecord = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, record);
    }

    #[test]
    fn display_formats_values() {
        let date = NaiveDate::from_ymd_opt(2025, 12, 1).unwrap();
        assert_eq!(FieldValue::Date(date).to_string(), "01 December 2025");
        assert_eq!(
            FieldValue::Choices(vec!["DJ".into(), "Catering".into()]).to_string(),
            "DJ, Catering"
        );
    }
}
