//! Version-tracked database migrations for the libSQL backend.
//!
//! Each migration has a version number and SQL. `run_migrations()` checks
//! the current version and applies only the new ones sequentially.

use libsql::Connection;

use crate::error::DatabaseError;

/// A single migration step.
struct Migration {
    version: i64,
    name: &'static str,
    sql: &'static str,
}

/// All migrations in order. Add new versions to the end.
static MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "inquiries",
        sql: r#"
            CREATE TABLE IF NOT EXISTS inquiries (
                id TEXT PRIMARY KEY,
                event_type TEXT NOT NULL,
                event_date TEXT NOT NULL,
                location TEXT NOT NULL,
                guest_count INTEGER NOT NULL,
                services TEXT NOT NULL DEFAULT '[]',
                budget TEXT NOT NULL,
                theme TEXT,
                contact_name TEXT NOT NULL,
                contact_email TEXT NOT NULL,
                contact_phone TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'new',
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_inquiries_status ON inquiries(status);
            CREATE INDEX IF NOT EXISTS idx_inquiries_created ON inquiries(created_at);
        "#,
    },
    Migration {
        version: 2,
        name: "wizard_sessions",
        sql: r#"
            CREATE TABLE IF NOT EXISTS wizard_sessions (
                session_id TEXT PRIMARY KEY,
                state TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
        "#,
    },
];

/// Bring the schema up to the newest migration. Safe to call on every open.
pub async fn run_migrations(conn: &Connection) -> Result<(), DatabaseError> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS _migrations (
            version INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        )",
        (),
    )
    .await
    .map_err(|e| DatabaseError::Migration(format!("schema ledger: {e}")))?;

    let applied = get_current_version(conn).await?;
    let mut schema_version = applied;
    let pending = MIGRATIONS.iter().filter(move |m| m.version > applied);

    for migration in pending {
        tracing::info!(
            version = migration.version,
            name = migration.name,
            "Upgrading wizard schema"
        );
        conn.execute_batch(migration.sql).await.map_err(|e| {
            DatabaseError::Migration(format!("V{} {}: {e}", migration.version, migration.name))
        })?;
        seed_version(conn, migration).await?;
        schema_version = migration.version;
    }

    tracing::debug!(schema_version, "Wizard schema ready");
    Ok(())
}

/// Newest version recorded in `_migrations`; 0 for a fresh database.
async fn get_current_version(conn: &Connection) -> Result<i64, DatabaseError> {
    let read_err = |e: libsql::Error| DatabaseError::Migration(format!("schema version: {e}"));

    let mut rows = conn
        .query("SELECT COALESCE(MAX(version), 0) FROM _migrations", ())
        .await
        .map_err(read_err)?;
    match rows.next().await.map_err(read_err)? {
        Some(row) => row.get::<i64>(0).map_err(read_err),
        None => Ok(0),
    }
}

async fn seed_version(conn: &Connection, migration: &Migration) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT OR IGNORE INTO _migrations (version, name) VALUES (?1, ?2)",
        libsql::params![migration.version, migration.name],
    )
    .await
    .map_err(|e| {
        DatabaseError::Migration(format!("recording V{} {}: {e}", migration.version, migration.name))
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_conn() -> Connection {
        let db = libsql::Builder::new_local(":memory:")
            .build()
            .await
            .unwrap();
        db.connect().unwrap()
    }

    #[tokio::test]
    async fn migrations_create_all_tables() {
        let conn = test_conn().await;
        run_migrations(&conn).await.unwrap();

        for table in &["inquiries", "wizard_sessions", "_migrations"] {
            let mut rows = conn
                .query(
                    "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?1",
                    libsql::params![*table],
                )
                .await
                .unwrap();
            let row = rows.next().await.unwrap().unwrap();
            let count: i64 = row.get(0).unwrap();
            assert_eq!(count, 1, "Table '{}' should exist", table);
        }
    }

    #[tokio::test]
    async fn migrations_are_idempotent() {
        let conn = test_conn().await;
        run_migrations(&conn).await.unwrap();
        run_migrations(&conn).await.unwrap();

        let version = get_current_version(&conn).await.unwrap();
        assert_eq!(version, 2);
    }

    #[tokio::test]
    async fn upgrades_a_database_left_at_an_older_version() {
        let conn = test_conn().await;
        run_migrations(&conn).await.unwrap();
        conn.execute("DROP TABLE wizard_sessions", ()).await.unwrap();
        conn.execute("DELETE FROM _migrations WHERE version = 2", ())
            .await
            .unwrap();
        assert_eq!(get_current_version(&conn).await.unwrap(), 1);

        run_migrations(&conn).await.unwrap();
        assert_eq!(get_current_version(&conn).await.unwrap(), 2);
        conn.query("SELECT session_id FROM wizard_sessions", ())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn migration_future_is_send() {
        fn assert_send<T: Send>(_: &T) {}

        let conn = test_conn().await;
        let fut = run_migrations(&conn);
        assert_send(&fut);
        fut.await.unwrap();
    }
}
