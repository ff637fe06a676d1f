//! libSQL backend: async `Database` trait implementation.
//!
//! Supports local file and in-memory databases.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use libsql::{Connection, Database as LibSqlDatabase, params};
use rust_decimal::Decimal;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::DatabaseError;
use crate::intake::{EventInquiry, InquiryStatus};
use crate::store::migrations;
use crate::store::traits::Database;
use crate::wizard::WizardState;

/// libSQL database backend.
///
/// Stores a single connection that is reused for all operations.
pub struct LibSqlBackend {
    #[allow(dead_code)]
    db: Arc<LibSqlDatabase>,
    conn: Connection,
}

impl LibSqlBackend {
    /// Open (or create) a local database file and run migrations.
    pub async fn new_local(path: &Path) -> Result<Self, DatabaseError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                DatabaseError::Pool(format!("Failed to create database directory: {e}"))
            })?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| DatabaseError::Pool(format!("Failed to open libSQL database: {e}")))?;

        let conn = db
            .connect()
            .map_err(|e| DatabaseError::Pool(format!("Failed to create connection: {e}")))?;

        let backend = Self {
            db: Arc::new(db),
            conn,
        };
        backend.run_migrations().await?;
        info!(path = %path.display(), "Database opened");
        Ok(backend)
    }

    /// Create an in-memory database (for tests).
    pub async fn new_memory() -> Result<Self, DatabaseError> {
        let db = libsql::Builder::new_local(":memory:")
            .build()
            .await
            .map_err(|e| {
                DatabaseError::Pool(format!("Failed to create in-memory database: {e}"))
            })?;

        let conn = db
            .connect()
            .map_err(|e| DatabaseError::Pool(format!("Failed to create connection: {e}")))?;

        let backend = Self {
            db: Arc::new(db),
            conn,
        };
        backend.run_migrations().await?;
        Ok(backend)
    }

    fn conn(&self) -> &Connection {
        &self.conn
    }
}

// ── Helper functions ────────────────────────────────────────────────

/// Parse an RFC 3339 or SQLite datetime string into DateTime<Utc>.
fn parse_datetime(s: &str) -> DateTime<Utc> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return dt.with_timezone(&Utc);
    }
    if let Ok(ndt) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return ndt.and_utc();
    }
    DateTime::<Utc>::MIN_UTC
}

fn opt_text(s: Option<&str>) -> libsql::Value {
    match s {
        Some(s) => libsql::Value::Text(s.to_string()),
        None => libsql::Value::Null,
    }
}

const INQUIRY_COLUMNS: &str = "id, event_type, event_date, location, guest_count, services, budget, theme, contact_name, contact_email, contact_phone, status, created_at";

fn row_to_inquiry(row: &libsql::Row) -> Result<EventInquiry, DatabaseError> {
    let col = |e: libsql::Error| DatabaseError::Query(format!("inquiry row: {e}"));

    let id_str: String = row.get(0).map_err(col)?;
    let date_str: String = row.get(2).map_err(col)?;
    let guest_count: i64 = row.get(4).map_err(col)?;
    let services_str: String = row.get(5).map_err(col)?;
    let budget_str: String = row.get(6).map_err(col)?;
    let status_str: String = row.get(11).map_err(col)?;
    let created_str: String = row.get(12).map_err(col)?;

    let id = Uuid::parse_str(&id_str)
        .map_err(|e| DatabaseError::Serialization(format!("inquiry id {id_str}: {e}")))?;
    let event_date = NaiveDate::parse_from_str(&date_str, "%Y-%m-%d")
        .map_err(|e| DatabaseError::Serialization(format!("event_date {date_str}: {e}")))?;
    let services: Vec<String> = serde_json::from_str(&services_str)
        .map_err(|e| DatabaseError::Serialization(format!("services: {e}")))?;
    let budget: Decimal = budget_str
        .parse()
        .map_err(|e| DatabaseError::Serialization(format!("budget {budget_str}: {e}")))?;

    Ok(EventInquiry {
        id,
        event_type: row.get(1).map_err(col)?,
        event_date,
        location: row.get(3).map_err(col)?,
        guest_count: u32::try_from(guest_count).unwrap_or_default(),
        services,
        budget,
        theme: row.get::<String>(7).ok(),
        contact_name: row.get(8).map_err(col)?,
        contact_email: row.get(9).map_err(col)?,
        contact_phone: row.get(10).map_err(col)?,
        status: InquiryStatus::from_str_db(&status_str).unwrap_or(InquiryStatus::New),
        created_at: parse_datetime(&created_str),
    })
}

// ── Trait implementation ────────────────────────────────────────────

#[async_trait]
impl Database for LibSqlBackend {
    async fn run_migrations(&self) -> Result<(), DatabaseError> {
        migrations::run_migrations(self.conn()).await
    }

    // ── Inquiries ───────────────────────────────────────────────────

    async fn insert_inquiry(&self, inquiry: &EventInquiry) -> Result<(), DatabaseError> {
        let conn = self.conn();
        let services = serde_json::to_string(&inquiry.services)
            .map_err(|e| DatabaseError::Serialization(e.to_string()))?;
        let created = inquiry.created_at.to_rfc3339();

        conn.execute(
            &format!(
                "INSERT INTO inquiries ({INQUIRY_COLUMNS}, updated_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)"
            ),
            params![
                inquiry.id.to_string(),
                inquiry.event_type.as_str(),
                inquiry.event_date.format("%Y-%m-%d").to_string(),
                inquiry.location.as_str(),
                i64::from(inquiry.guest_count),
                services,
                inquiry.budget.to_string(),
                opt_text(inquiry.theme.as_deref()),
                inquiry.contact_name.as_str(),
                inquiry.contact_email.as_str(),
                inquiry.contact_phone.as_str(),
                inquiry.status.as_str(),
                created.clone(),
                created,
            ],
        )
        .await
        .map_err(|e| DatabaseError::Query(format!("insert_inquiry: {e}")))?;

        debug!(inquiry_id = %inquiry.id, event_type = %inquiry.event_type, "Inquiry inserted");
        Ok(())
    }

    async fn get_inquiry(&self, id: Uuid) -> Result<Option<EventInquiry>, DatabaseError> {
        let conn = self.conn();
        let mut rows = conn
            .query(
                &format!("SELECT {INQUIRY_COLUMNS} FROM inquiries WHERE id = ?1"),
                params![id.to_string()],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("get_inquiry: {e}")))?;

        match rows.next().await {
            Ok(Some(row)) => Ok(Some(row_to_inquiry(&row)?)),
            Ok(None) => Ok(None),
            Err(e) => Err(DatabaseError::Query(format!("get_inquiry: {e}"))),
        }
    }

    async fn list_inquiries(&self, limit: usize) -> Result<Vec<EventInquiry>, DatabaseError> {
        let conn = self.conn();
        let mut rows = conn
            .query(
                &format!(
                    "SELECT {INQUIRY_COLUMNS} FROM inquiries ORDER BY created_at DESC LIMIT ?1"
                ),
                params![limit as i64],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("list_inquiries: {e}")))?;

        let mut inquiries = Vec::new();
        while let Ok(Some(row)) = rows.next().await {
            match row_to_inquiry(&row) {
                Ok(inquiry) => inquiries.push(inquiry),
                Err(e) => {
                    tracing::warn!("Skipping inquiry row: {e}");
                }
            }
        }
        Ok(inquiries)
    }

    async fn update_inquiry_status(
        &self,
        id: Uuid,
        status: InquiryStatus,
    ) -> Result<(), DatabaseError> {
        let conn = self.conn();
        let now = Utc::now().to_rfc3339();
        let count = conn
            .execute(
                "UPDATE inquiries SET status = ?1, updated_at = ?2 WHERE id = ?3",
                params![status.as_str(), now, id.to_string()],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("update_inquiry_status: {e}")))?;

        if count == 0 {
            return Err(DatabaseError::NotFound {
                entity: "inquiry".to_string(),
                id: id.to_string(),
            });
        }
        debug!(inquiry_id = %id, %status, "Inquiry status updated");
        Ok(())
    }

    // ── Wizard sessions ─────────────────────────────────────────────

    async fn save_session(
        &self,
        session_id: &str,
        state: &WizardState,
    ) -> Result<(), DatabaseError> {
        let conn = self.conn();
        let now = Utc::now().to_rfc3339();
        let state_str =
            serde_json::to_string(state).map_err(|e| DatabaseError::Serialization(e.to_string()))?;

        conn.execute(
            "INSERT INTO wizard_sessions (session_id, state, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT (session_id) DO UPDATE SET state = ?2, updated_at = ?3",
            params![session_id, state_str, now],
        )
        .await
        .map_err(|e| DatabaseError::Query(format!("save_session: {e}")))?;

        Ok(())
    }

    async fn load_session(&self, session_id: &str) -> Result<Option<WizardState>, DatabaseError> {
        let conn = self.conn();
        let mut rows = conn
            .query(
                "SELECT state FROM wizard_sessions WHERE session_id = ?1",
                params![session_id],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("load_session: {e}")))?;

        match rows.next().await {
            Ok(Some(row)) => {
                let state_str: String = row
                    .get(0)
                    .map_err(|e| DatabaseError::Query(format!("load_session: {e}")))?;
                let state = serde_json::from_str(&state_str)
                    .map_err(|e| DatabaseError::Serialization(e.to_string()))?;
                Ok(Some(state))
            }
            Ok(None) => Ok(None),
            Err(e) => Err(DatabaseError::Query(format!("load_session: {e}"))),
        }
    }

    async fn delete_session(&self, session_id: &str) -> Result<bool, DatabaseError> {
        let conn = self.conn();
        let count = conn
            .execute(
                "DELETE FROM wizard_sessions WHERE session_id = ?1",
                params![session_id],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("delete_session: {e}")))?;
        Ok(count > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intake::tests::complete_record;
    use crate::wizard::FieldValue;

    async fn test_db() -> LibSqlBackend {
        LibSqlBackend::new_memory().await.unwrap()
    }

    fn make_inquiry() -> EventInquiry {
        EventInquiry::from_record(&complete_record()).unwrap()
    }

    #[tokio::test]
    async fn insert_and_get_by_id() {
        let db = test_db().await;
        let mut inquiry = make_inquiry();
        inquiry.theme = Some("Pastel florals".to_string());
        db.insert_inquiry(&inquiry).await.unwrap();

        let fetched = db.get_inquiry(inquiry.id).await.unwrap().unwrap();
        assert_eq!(fetched.id, inquiry.id);
        assert_eq!(fetched.event_type, "Wedding");
        assert_eq!(fetched.event_date, inquiry.event_date);
        assert_eq!(fetched.guest_count, 250);
        assert_eq!(fetched.services, inquiry.services);
        assert_eq!(fetched.budget, inquiry.budget);
        assert_eq!(fetched.theme.as_deref(), Some("Pastel florals"));
        assert_eq!(fetched.status, InquiryStatus::New);
    }

    #[tokio::test]
    async fn missing_theme_reads_back_as_none() {
        let db = test_db().await;
        let inquiry = make_inquiry();
        db.insert_inquiry(&inquiry).await.unwrap();

        let fetched = db.get_inquiry(inquiry.id).await.unwrap().unwrap();
        assert!(fetched.theme.is_none());
    }

    #[tokio::test]
    async fn get_unknown_id_returns_none() {
        let db = test_db().await;
        assert!(db.get_inquiry(Uuid::new_v4()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn list_is_newest_first_and_limited() {
        let db = test_db().await;
        let mut ids = Vec::new();
        for offset in 0..3 {
            let mut inquiry = make_inquiry();
            inquiry.created_at = Utc::now() + chrono::Duration::seconds(offset);
            ids.push(inquiry.id);
            db.insert_inquiry(&inquiry).await.unwrap();
        }

        let listed = db.list_inquiries(2).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, ids[2]);
        assert_eq!(listed[1].id, ids[1]);
    }

    #[tokio::test]
    async fn update_status() {
        let db = test_db().await;
        let inquiry = make_inquiry();
        db.insert_inquiry(&inquiry).await.unwrap();

        db.update_inquiry_status(inquiry.id, InquiryStatus::Contacted)
            .await
            .unwrap();
        let fetched = db.get_inquiry(inquiry.id).await.unwrap().unwrap();
        assert_eq!(fetched.status, InquiryStatus::Contacted);

        let err = db
            .update_inquiry_status(Uuid::new_v4(), InquiryStatus::Closed)
            .await
            .unwrap_err();
        assert!(matches!(err, DatabaseError::NotFound { .. }));
    }

    #[tokio::test]
    async fn session_save_load_delete() {
        let db = test_db().await;
        assert!(db.load_session("cli").await.unwrap().is_none());

        let mut state = WizardState::default();
        state.record.set("event_type", FieldValue::Text("Birthday".into()));
        state.push_user("Birthday");
        state.advance();
        db.save_session("cli", &state).await.unwrap();

        state.advance();
        db.save_session("cli", &state).await.unwrap();

        let loaded = db.load_session("cli").await.unwrap().unwrap();
        assert_eq!(loaded, state);
        assert_eq!(loaded.current_step_index, 2);

        assert!(db.delete_session("cli").await.unwrap());
        assert!(!db.delete_session("cli").await.unwrap());
        assert!(db.load_session("cli").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn file_backed_database_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("wizard.db");
        let inquiry = make_inquiry();
        {
            let db = LibSqlBackend::new_local(&path).await.unwrap();
            db.insert_inquiry(&inquiry).await.unwrap();
        }
        let db = LibSqlBackend::new_local(&path).await.unwrap();
        assert!(db.get_inquiry(inquiry.id).await.unwrap().is_some());
    }
}
