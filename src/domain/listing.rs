use chrono::NaiveDateTime;

/// One scraped listing, keyed by the site-assigned id from the URL path.
///
/// Field-level gaps are normal: a run that could not recover coordinates,
/// price or title still produces a record, with the gaps listed in
/// `extraction_errors` and the page HTML kept for inspection.
#[derive(Debug, Clone)]
pub struct ListingRecord {
    pub external_id: String,

    /// Canonical URL, query string stripped.
    pub source_url: String,
    /// URL exactly as supplied by the caller.
    pub referral_url: String,

    pub title: Option<String>,
    pub details_line: Option<String>,
    pub description: Option<String>,

    /// Currency-qualified display price, e.g. "$1,200 MXN".
    pub price: Option<String>,

    pub rating: Option<f64>,
    pub review_count: Option<i64>,

    pub latitude: Option<f64>,
    pub longitude: Option<f64>,

    pub region_code: String,

    /// Human-readable gaps, in a fixed order. Non-empty iff at least one of
    /// coordinates, price or title is missing.
    pub extraction_errors: Vec<String>,
    /// Full page HTML from the last attempt, kept only when
    /// `extraction_errors` is non-empty.
    pub raw_html_snapshot: Option<String>,

    pub updated_at: NaiveDateTime,
}
