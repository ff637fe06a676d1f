//! Submission collaborator: receives the completed answer record.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::SubmissionError;
use crate::intake::EventInquiry;
use crate::store::Database;
use crate::wizard::AnswerRecord;

/// Acknowledgement returned by a successful submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionReceipt {
    /// Identifier the sink assigned to the stored record.
    pub reference: Uuid,
    /// Short human-readable confirmation.
    pub summary: String,
    pub submitted_at: DateTime<Utc>,
}

/// Persists a completed wizard record. The wizard calls this once per
/// completion and never retries on its own.
#[async_trait]
pub trait SubmissionSink: Send + Sync {
    async fn submit(&self, record: &AnswerRecord) -> Result<SubmissionReceipt, SubmissionError>;
}

/// Turns an answer record into an [`EventInquiry`] and stores it.
pub struct InquirySubmitter {
    db: Arc<dyn Database>,
}

impl InquirySubmitter {
    pub fn new(db: Arc<dyn Database>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl SubmissionSink for InquirySubmitter {
    async fn submit(&self, record: &AnswerRecord) -> Result<SubmissionReceipt, SubmissionError> {
        let inquiry = EventInquiry::from_record(record)?;
        self.db.insert_inquiry(&inquiry).await?;

        tracing::info!(
            inquiry_id = %inquiry.id,
            event_type = %inquiry.event_type,
            guests = inquiry.guest_count,
            "Inquiry submitted"
        );

        Ok(SubmissionReceipt {
            reference: inquiry.id,
            summary: inquiry.summary(),
            submitted_at: inquiry.created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::IntakeError;
    use crate::intake::fields;
    use crate::error::WizardError;
    use crate::intake::event_intake_steps;
    use crate::intake::tests::complete_record;
    use crate::notify::CollectingNotifier;
    use crate::store::LibSqlBackend;
    use crate::wizard::{Transition, WizardEngine};

    async fn submitter() -> (InquirySubmitter, Arc<dyn Database>) {
        let db: Arc<dyn Database> = Arc::new(LibSqlBackend::new_memory().await.unwrap());
        (InquirySubmitter::new(Arc::clone(&db)), db)
    }

    #[tokio::test]
    async fn stores_inquiry_and_returns_reference() {
        let (submitter, db) = submitter().await;
        let receipt = submitter.submit(&complete_record()).await.unwrap();

        let stored = db.get_inquiry(receipt.reference).await.unwrap().unwrap();
        assert_eq!(stored.contact_name, "Ananya Rao");
        assert!(receipt.summary.contains("Wedding"));
    }

    #[tokio::test]
    async fn incomplete_record_is_rejected_without_storing() {
        let (submitter, db) = submitter().await;
        let mut record = complete_record();
        record.remove(fields::CONTACT_EMAIL);

        let err = submitter.submit(&record).await.unwrap_err();
        assert!(matches!(
            err,
            SubmissionError::Rejected(IntakeError::MissingField(ref f)) if f == fields::CONTACT_EMAIL
        ));
        assert!(db.list_inquiries(10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn intake_flow_rejects_bad_guest_count_before_submission() {
        let (submitter, db) = submitter().await;
        let notifier = Arc::new(CollectingNotifier::new());
        let mut engine =
            WizardEngine::new(event_intake_steps(), Arc::new(submitter), notifier.clone());

        engine.submit_choice("Wedding").await.unwrap();
        engine.submit_freeform("14/02/2027").await.unwrap();
        engine.submit_freeform("Udaipur").await.unwrap();

        for guests in ["-5", "99999999999", "40.5"] {
            let err = engine.submit_freeform(guests).await.unwrap_err();
            assert!(matches!(err, WizardError::NumberOutOfRange { .. }), "{guests}: {err:?}");
            assert_eq!(engine.state().current_step_index, 3);
            assert!(!engine.state().record.contains(fields::GUEST_COUNT));
        }

        engine.submit_freeform("120").await.unwrap();
        engine.submit_choice("Venue").await.unwrap();
        engine.continue_multi_choice().await.unwrap();
        assert!(engine.submit_freeform("-20000").await.is_err());
        engine.submit_freeform("800000").await.unwrap();
        engine.skip().await.unwrap();
        engine.submit_freeform("Ananya Rao").await.unwrap();
        engine.submit_freeform("ananya@example.in").await.unwrap();
        let done = engine.submit_freeform("9876543210").await.unwrap();

        let receipt = match done {
            Transition::Completed { receipt, .. } => receipt,
            other => panic!("expected completion, got {other:?}"),
        };
        let stored = db.get_inquiry(receipt.reference).await.unwrap().unwrap();
        assert_eq!(stored.guest_count, 120);
        assert_eq!(stored.budget.to_string(), "800000");
    }
}
