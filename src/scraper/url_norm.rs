use crate::scraper::ScrapeError;
use chrono::NaiveDate;
use url::Url;

pub const DEFAULT_REGION: &str = "mx";

/// Stable identity for a listing, derived from the caller's URL before any
/// browser resource is acquired.
#[derive(Debug, Clone)]
pub struct NormalizedListing {
    /// Site-assigned id: the first all-digit path segment.
    pub external_id: String,
    /// Scheme + host + path, query and fragment stripped.
    pub source_url: String,
    /// URL exactly as the caller supplied it.
    pub referral_url: String,
    pub region_code: String,
    /// Caller-supplied dates, if both were present and parseable. These seed
    /// the first date-window candidate.
    pub check_in: Option<NaiveDate>,
    pub check_out: Option<NaiveDate>,
}

pub fn normalize_listing_url(
    raw_url: &str,
    region_code: Option<&str>,
    referral_url: Option<&str>,
) -> Result<NormalizedListing, ScrapeError> {
    let parsed = Url::parse(raw_url)
        .map_err(|e| ScrapeError::InvalidInput(format!("unparseable url: {e}")))?;

    let external_id = parsed
        .path_segments()
        .into_iter()
        .flatten()
        .find(|seg| !seg.is_empty() && seg.chars().all(|c| c.is_ascii_digit()))
        .map(str::to_string)
        .ok_or_else(|| {
            ScrapeError::InvalidInput("no listing id segment in url path".to_string())
        })?;

    let mut canonical = parsed.clone();
    canonical.set_query(None);
    canonical.set_fragment(None);

    let check_in = date_param(&parsed, "check_in");
    let check_out = date_param(&parsed, "check_out");

    Ok(NormalizedListing {
        external_id,
        source_url: canonical.to_string(),
        referral_url: referral_url.unwrap_or(raw_url).to_string(),
        region_code: region_code
            .filter(|r| !r.trim().is_empty())
            .unwrap_or(DEFAULT_REGION)
            .trim()
            .to_lowercase(),
        check_in,
        check_out,
    })
}

fn date_param(url: &Url, name: &str) -> Option<NaiveDate> {
    url.query_pairs()
        .find(|(k, _)| k == name)
        .and_then(|(_, v)| NaiveDate::parse_from_str(&v, "%Y-%m-%d").ok())
}
