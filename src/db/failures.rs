use crate::db::connection::Database;
use crate::errors::ServerError;
use chrono::Utc;
use rusqlite::params;

/// Best-effort minimal error record for a run that died before extraction
/// isolated any field. Keyed by `source_url` because no `external_id` data
/// ever materialized.
pub fn record_failure(db: &Database, source_url: &str, message: &str) -> Result<(), ServerError> {
    let now = Utc::now().naive_utc();

    db.with_conn(|conn| {
        conn.execute(
            r#"
            INSERT INTO scrape_failures (source_url, error_message, failed_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(source_url) DO UPDATE SET
                error_message = excluded.error_message,
                failed_at = excluded.failed_at
            "#,
            params![source_url, message, now],
        )
        .map_err(|e| ServerError::DbError(e.to_string()))?;
        Ok(())
    })
}

pub fn last_failure(db: &Database, source_url: &str) -> Result<Option<String>, ServerError> {
    db.with_conn(|conn| {
        use rusqlite::OptionalExtension;
        conn.query_row(
            "SELECT error_message FROM scrape_failures WHERE source_url = ?1",
            params![source_url],
            |row| row.get(0),
        )
        .optional()
        .map_err(|e| ServerError::DbError(e.to_string()))
    })
}
