use crate::db::connection::Database;
use crate::domain::ListingRecord;
use crate::errors::ServerError;
use rusqlite::{params, OptionalExtension};

/// Upserts one record keyed on `external_id` and reports whether the stored
/// price moved. `updated` is a price comparison against the previous row,
/// not mere existence of one; a first insert is `false`.
pub fn upsert_listing(db: &Database, record: &ListingRecord) -> Result<bool, ServerError> {
    let errors_json = serde_json::to_string(&record.extraction_errors)
        .map_err(|e| ServerError::DbError(e.to_string()))?;

    db.with_conn(|conn| {
        let previous_price: Option<Option<String>> = conn
            .query_row(
                "SELECT price FROM listings WHERE external_id = ?1",
                params![record.external_id],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| ServerError::DbError(e.to_string()))?;

        let updated = match &previous_price {
            Some(prior) => *prior != record.price,
            None => false,
        };

        conn.execute(
            r#"
            INSERT INTO listings (
                external_id, source_url, referral_url,
                title, details_line, description,
                price, rating, review_count,
                latitude, longitude, region_code,
                extraction_errors, raw_html_snapshot, updated_at
            ) VALUES (
                ?1, ?2, ?3,
                ?4, ?5, ?6,
                ?7, ?8, ?9,
                ?10, ?11, ?12,
                ?13, ?14, ?15
            )
            ON CONFLICT(external_id) DO UPDATE SET
                source_url = excluded.source_url,
                referral_url = excluded.referral_url,
                title = excluded.title,
                details_line = excluded.details_line,
                description = excluded.description,
                price = excluded.price,
                rating = excluded.rating,
                review_count = excluded.review_count,
                latitude = excluded.latitude,
                longitude = excluded.longitude,
                region_code = excluded.region_code,
                extraction_errors = excluded.extraction_errors,
                raw_html_snapshot = excluded.raw_html_snapshot,
                updated_at = excluded.updated_at
            "#,
            params![
                record.external_id,
                record.source_url,
                record.referral_url,
                record.title,
                record.details_line,
                record.description,
                record.price,
                record.rating,
                record.review_count,
                record.latitude,
                record.longitude,
                record.region_code,
                errors_json,
                record.raw_html_snapshot,
                record.updated_at,
            ],
        )
        .map_err(|e| ServerError::DbError(e.to_string()))?;

        Ok(updated)
    })
}

pub fn find_by_external_id(
    db: &Database,
    external_id: &str,
) -> Result<Option<ListingRecord>, ServerError> {
    db.with_conn(|conn| {
        let record = conn
            .query_row(
                r#"
                SELECT
                    external_id,        -- 0
                    source_url,         -- 1
                    referral_url,       -- 2
                    title,              -- 3
                    details_line,       -- 4
                    description,        -- 5
                    price,              -- 6
                    rating,             -- 7
                    review_count,       -- 8
                    latitude,           -- 9
                    longitude,          -- 10
                    region_code,        -- 11
                    extraction_errors,  -- 12
                    raw_html_snapshot,  -- 13
                    updated_at          -- 14
                FROM listings
                WHERE external_id = ?1
                "#,
                params![external_id],
                |row| {
                    let errors_json: String = row.get(12)?;
                    Ok(ListingRecord {
                        external_id: row.get(0)?,
                        source_url: row.get(1)?,
                        referral_url: row.get(2)?,
                        title: row.get(3)?,
                        details_line: row.get(4)?,
                        description: row.get(5)?,
                        price: row.get(6)?,
                        rating: row.get(7)?,
                        review_count: row.get(8)?,
                        latitude: row.get(9)?,
                        longitude: row.get(10)?,
                        region_code: row.get(11)?,
                        extraction_errors: serde_json::from_str(&errors_json)
                            .unwrap_or_default(),
                        raw_html_snapshot: row.get(13)?,
                        updated_at: row.get(14)?,
                    })
                },
            )
            .optional()
            .map_err(|e| ServerError::DbError(e.to_string()))?;

        Ok(record)
    })
}
