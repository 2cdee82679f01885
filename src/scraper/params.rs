use crate::scraper::randomness::Randomness;
use crate::scraper::url_norm::NormalizedListing;
use chrono::{Duration, Months, NaiveDate};

/// Default stay window when the caller supplied no dates: check-in 7 days
/// out, 15 nights.
const DEFAULT_LEAD_DAYS: i64 = 7;
const SPAN_NIGHTS: i64 = 15;
const SHIFT_DAYS: i64 = 15;
const SHIFT_MONTHS: u32 = 2;

const PARTY_ADULTS: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
}

impl DateWindow {
    fn spanning(check_in: NaiveDate) -> Self {
        Self {
            check_in,
            check_out: check_in + Duration::days(SPAN_NIGHTS),
        }
    }
}

/// Regional rendering profile for the target market.
pub struct RegionalProfile {
    pub host: String,
    pub currency: &'static str,
    pub locale: &'static str,
}

pub fn regional_profile(region_code: &str) -> RegionalProfile {
    let (host, currency, locale) = match region_code {
        "mx" => ("www.airbnb.mx", "MXN", "es-MX"),
        "es" => ("www.airbnb.es", "EUR", "es-ES"),
        "us" => ("www.airbnb.com", "USD", "en-US"),
        _ => ("www.airbnb.com", "USD", "en-US"),
    };
    RegionalProfile {
        host: host.to_string(),
        currency,
        locale,
    }
}

/// Ordered date-window plan for one run. Candidate 0 honors caller dates;
/// later candidates shift the start while keeping the 15-night span, and are
/// only reached if the previous one surfaced no price.
pub fn date_window_candidates(
    today: NaiveDate,
    check_in: Option<NaiveDate>,
    check_out: Option<NaiveDate>,
) -> Vec<DateWindow> {
    let first = match (check_in, check_out) {
        (Some(ci), Some(co)) if co > ci => DateWindow {
            check_in: ci,
            check_out: co,
        },
        _ => DateWindow::spanning(today + Duration::days(DEFAULT_LEAD_DAYS)),
    };

    let second = DateWindow::spanning(first.check_in + Duration::days(SHIFT_DAYS));
    let third_start = first
        .check_in
        .checked_add_months(Months::new(SHIFT_MONTHS))
        .unwrap_or(second.check_in + Duration::days(SHIFT_DAYS));

    vec![first, second, DateWindow::spanning(third_start)]
}

/// Renders one candidate into a fully-qualified regional URL. The session
/// token is drawn fresh for every attempt so consecutive attempts never
/// share a correlated caching or rate-limit signal.
pub fn render_candidate_url(
    listing: &NormalizedListing,
    window: &DateWindow,
    rng: &mut dyn Randomness,
) -> String {
    let profile = regional_profile(&listing.region_code);
    format!(
        "https://{host}/rooms/{id}?check_in={ci}&check_out={co}&currency={currency}&locale={locale}&adults={adults}&source_impression_id=p3_{token}",
        host = profile.host,
        id = listing.external_id,
        ci = window.check_in.format("%Y-%m-%d"),
        co = window.check_out.format("%Y-%m-%d"),
        currency = profile.currency,
        locale = profile.locale,
        adults = PARTY_ADULTS,
        token = rng.session_token(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scraper::randomness::SeededRandomness;
    use crate::scraper::url_norm::normalize_listing_url;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn caller_dates_seed_candidate_zero() {
        let windows =
            date_window_candidates(d(2024, 12, 1), Some(d(2025, 1, 1)), Some(d(2025, 1, 10)));

        assert_eq!(windows.len(), 3);
        assert_eq!(windows[0].check_in, d(2025, 1, 1));
        assert_eq!(windows[0].check_out, d(2025, 1, 10));
        // shift +15 days, span reset to 15 nights
        assert_eq!(windows[1].check_in, d(2025, 1, 16));
        assert_eq!(windows[1].check_out, d(2025, 1, 31));
        // start shifted +2 months from candidate 0
        assert_eq!(windows[2].check_in, d(2025, 3, 1));
        assert_eq!(windows[2].check_out, d(2025, 3, 16));
    }

    #[test]
    fn default_window_starts_seven_days_out() {
        let windows = date_window_candidates(d(2025, 6, 1), None, None);
        assert_eq!(windows[0].check_in, d(2025, 6, 8));
        assert_eq!(windows[0].check_out, d(2025, 6, 23));
    }

    #[test]
    fn inverted_caller_dates_fall_back_to_default() {
        let windows =
            date_window_candidates(d(2025, 6, 1), Some(d(2025, 7, 10)), Some(d(2025, 7, 1)));
        assert_eq!(windows[0].check_in, d(2025, 6, 8));
    }

    #[test]
    fn rendered_url_carries_dates_and_fresh_tokens() {
        let listing = normalize_listing_url("https://www.airbnb.com/rooms/123456", None, None)
            .unwrap();
        let window = DateWindow {
            check_in: d(2025, 1, 1),
            check_out: d(2025, 1, 10),
        };

        let mut rng = SeededRandomness::new(9);
        let first = render_candidate_url(&listing, &window, &mut rng);
        let second = render_candidate_url(&listing, &window, &mut rng);

        assert!(first.starts_with("https://www.airbnb.mx/rooms/123456?"));
        assert!(first.contains("check_in=2025-01-01"));
        assert!(first.contains("check_out=2025-01-10"));
        assert!(first.contains("currency=MXN"));
        assert!(first.contains("locale=es-MX"));
        assert!(first.contains("adults=2"));
        assert!(first.contains("source_impression_id=p3_"));
        // same window, different attempt: the token must differ
        assert_ne!(first, second);
    }
}
