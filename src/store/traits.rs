//! `Database` trait: single async interface for inquiry and session persistence.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::DatabaseError;
use crate::intake::{EventInquiry, InquiryStatus};
use crate::wizard::WizardState;

/// Backend-agnostic persistence for submitted inquiries and in-progress
/// wizard sessions.
#[async_trait]
pub trait Database: Send + Sync {
    /// Run all pending schema migrations.
    async fn run_migrations(&self) -> Result<(), DatabaseError>;

    // ── Inquiries ───────────────────────────────────────────────────

    /// Insert a newly submitted inquiry.
    async fn insert_inquiry(&self, inquiry: &EventInquiry) -> Result<(), DatabaseError>;

    /// Get an inquiry by ID.
    async fn get_inquiry(&self, id: Uuid) -> Result<Option<EventInquiry>, DatabaseError>;

    /// Most recent inquiries first, up to `limit`.
    async fn list_inquiries(&self, limit: usize) -> Result<Vec<EventInquiry>, DatabaseError>;

    /// Move an inquiry through the follow-up lifecycle.
    async fn update_inquiry_status(
        &self,
        id: Uuid,
        status: InquiryStatus,
    ) -> Result<(), DatabaseError>;

    // ── Wizard sessions ─────────────────────────────────────────────

    /// Save (or overwrite) an in-progress wizard state.
    async fn save_session(&self, session_id: &str, state: &WizardState)
    -> Result<(), DatabaseError>;

    /// Load a saved wizard state.
    async fn load_session(&self, session_id: &str) -> Result<Option<WizardState>, DatabaseError>;

    /// Drop a saved wizard state. Returns whether one existed.
    async fn delete_session(&self, session_id: &str) -> Result<bool, DatabaseError>;
}
