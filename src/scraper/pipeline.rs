use crate::db::connection::Database;
use crate::db::failures::record_failure;
use crate::db::listings::upsert_listing;
use crate::domain::ListingRecord;
use crate::scraper::extract::PageExtractor;
use crate::scraper::params::{date_window_candidates, regional_profile, render_candidate_url};
use crate::scraper::randomness::Randomness;
use crate::scraper::retry::{RetryController, RetryOutcome};
use crate::scraper::session::BrowserSession;
use crate::scraper::url_norm::{normalize_listing_url, NormalizedListing};
use crate::scraper::ScrapeError;
use chrono::{NaiveDateTime, Utc};
use serde::Deserialize;

pub const ERR_NO_COORDINATES: &str = "No se encontraron coordenadas";
pub const ERR_NO_PRICE: &str = "No se encontró el precio";
pub const ERR_NO_TITLE: &str = "No se encontró el título";

#[derive(Debug, Deserialize)]
pub struct ScrapeRequest {
    pub url: String,
    pub region_code: Option<String>,
    pub referral_url: Option<String>,
}

#[derive(Debug)]
pub struct ScrapeOutcome {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// True when the stored price changed relative to the previous record.
    pub updated: bool,
}

/// Full pipeline for one request: normalize → synthesize candidates →
/// browser session → retry loop → assemble → upsert.
///
/// `InvalidInput` surfaces before any browser resource is acquired. A
/// browser-setup failure aborts the run after persisting a minimal failure
/// record keyed by the canonical URL.
pub fn run_scrape(
    db: &Database,
    request: &ScrapeRequest,
    rng: &mut dyn Randomness,
) -> Result<ScrapeOutcome, ScrapeError> {
    let listing = normalize_listing_url(
        &request.url,
        request.region_code.as_deref(),
        request.referral_url.as_deref(),
    )?;

    eprintln!("🧭 Scrape run for listing {}", listing.external_id);

    let windows = date_window_candidates(
        Utc::now().date_naive(),
        listing.check_in,
        listing.check_out,
    );
    // One synthesized URL per attempt, each with its own fresh token.
    let candidates: Vec<String> = windows
        .iter()
        .map(|w| render_candidate_url(&listing, w, rng))
        .collect();

    let profile = regional_profile(&listing.region_code);
    let session = match BrowserSession::new(rng, profile.locale) {
        Ok(session) => session,
        Err(e) => {
            // Best-effort; the setup failure is what the caller needs to see.
            let _ = record_failure(db, &listing.source_url, &e.to_string());
            return Err(e);
        }
    };

    let mut engine = PageExtractor::new(session.tab());
    let outcome = RetryController::new(candidates).run(&mut engine);

    eprintln!(
        "🏁 Extraction finished after {} attempt(s); price {}",
        outcome.attempts_run,
        if outcome.fields.price.is_some() {
            "resolved"
        } else {
            "missing"
        }
    );

    let record = assemble_record(&listing, outcome, Utc::now().naive_utc());
    let updated =
        upsert_listing(db, &record).map_err(|e| ScrapeError::Persistence(e.to_string()))?;

    Ok(ScrapeOutcome {
        latitude: record.latitude,
        longitude: record.longitude,
        updated,
    })
}

/// Validates the required fields and decides what to retain. The error list
/// is non-empty exactly when one of coordinates, price or title is missing,
/// and the raw HTML snapshot is kept exactly when the error list is
/// non-empty.
pub fn assemble_record(
    listing: &NormalizedListing,
    outcome: RetryOutcome,
    now: NaiveDateTime,
) -> ListingRecord {
    let fields = outcome.fields;

    let mut extraction_errors = Vec::new();
    if fields.latitude.is_none() || fields.longitude.is_none() {
        extraction_errors.push(ERR_NO_COORDINATES.to_string());
    }
    if fields.price.is_none() {
        extraction_errors.push(ERR_NO_PRICE.to_string());
    }
    if fields.title.is_none() {
        extraction_errors.push(ERR_NO_TITLE.to_string());
    }

    let raw_html_snapshot = if extraction_errors.is_empty() {
        None
    } else {
        outcome.last_html
    };

    ListingRecord {
        external_id: listing.external_id.clone(),
        source_url: listing.source_url.clone(),
        referral_url: listing.referral_url.clone(),
        title: fields.title,
        details_line: fields.details_line,
        description: fields.description,
        price: fields.price,
        rating: fields.rating,
        review_count: fields.review_count,
        latitude: fields.latitude,
        longitude: fields.longitude,
        region_code: listing.region_code.clone(),
        extraction_errors,
        raw_html_snapshot,
        updated_at: now,
    }
}
