use crate::scraper::ScrapeError;
use headless_chrome::Tab;
use regex::Regex;
use std::time::Duration;

/// Fixed settle delay between triggering lazy rendering and probing the DOM.
const SETTLE_DELAY: Duration = Duration::from_millis(2500);

/// Field set recovered from one attempt. Every field is optional; the
/// cascade degrades to `None` instead of failing the attempt.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ExtractedFields {
    pub title: Option<String>,
    pub details_line: Option<String>,
    pub description: Option<String>,
    pub price: Option<String>,
    pub rating: Option<f64>,
    pub review_count: Option<i64>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

pub struct AttemptOutcome {
    pub fields: ExtractedFields,
    /// Full rendered HTML; retained by the caller only on partial failure.
    pub html: String,
}

/// Seam between the retry controller and the live browser, so transitions
/// can be unit-tested against a scripted engine.
pub trait ExtractionEngine {
    fn run(&mut self, url: &str) -> Result<AttemptOutcome, ScrapeError>;
}

// ---------------------------------------------------------------------------
// In-page scripts
// ---------------------------------------------------------------------------

// Best-effort dismissal of the interstitial modal (translation / login
// prompt) that covers the page on first load. Failure is fine.
const DISMISS_MODAL_JS: &str = r#"
(() => {
    const dialog = document.querySelector('[role="dialog"], [data-testid="modal-container"]');
    if (!dialog) { return false; }
    const close = dialog.querySelector('button[aria-label]') || dialog.querySelector('button');
    if (close) { close.click(); return true; }
    return false;
})()
"#;

const SCROLL_JS: &str =
    "window.scrollTo(0, Math.floor(document.body.scrollHeight / 2))";

// Walks rendered text nodes for a short currency-tagged fragment
// (currency-then-amount or amount-then-currency). Long fragments are
// rejected to avoid matching prose. Falls back to JSON-shaped price tokens
// inside script payloads.
const PRICE_PROBE_JS: &str = r#"
(() => {
    const re = /(?:\$|€|MXN|USD|EUR)\s?\d[\d.,]*|\d[\d.,]*\s?(?:MXN|USD|EUR|pesos)/;
    const walker = document.createTreeWalker(document.body, NodeFilter.SHOW_TEXT);
    while (walker.nextNode()) {
        const text = walker.currentNode.textContent.trim();
        if (text.length === 0 || text.length > 40) { continue; }
        const m = text.match(re);
        if (m) { return m[0]; }
    }
    for (const script of document.querySelectorAll('script')) {
        const m = (script.textContent || '').match(/"(?:priceString|amountFormatted)"\s*:\s*"([^"]{1,40})"/);
        if (m) { return m[1]; }
    }
    return null;
})()
"#;

// ---------------------------------------------------------------------------
// Pattern cascades
// ---------------------------------------------------------------------------

/// One entry in a field's cascade: a pattern and the capture group holding
/// the value. Entries are tried in order, first match wins; later entries
/// are fallbacks for structurally different page variants.
struct FieldPattern {
    pattern: &'static str,
    group: usize,
}

const TITLE_PATTERNS: &[FieldPattern] = &[
    FieldPattern {
        pattern: r#"<meta\s+property="og:title"\s+content="([^"]+)""#,
        group: 1,
    },
    FieldPattern {
        pattern: r#""listingTitle"\s*:\s*"([^"]+)""#,
        group: 1,
    },
    FieldPattern {
        pattern: r#"<h1[^>]*>([^<]{3,200})</h1>"#,
        group: 1,
    },
    FieldPattern {
        pattern: r#"<title[^>]*>([^<]+)</title>"#,
        group: 1,
    },
];

// Fallback only: the DOM probe is the primary price source.
const PRICE_PATTERNS: &[FieldPattern] = &[
    FieldPattern {
        pattern: r#""priceString"\s*:\s*"([^"]+)""#,
        group: 1,
    },
    FieldPattern {
        pattern: r#""amountFormatted"\s*:\s*"([^"]+)""#,
        group: 1,
    },
    FieldPattern {
        pattern: r#"([$€]\s?\d[\d.,]*(?:\s?(?:MXN|USD|EUR))?)\s*(?:por\s+noche|noche|night)"#,
        group: 1,
    },
];

const RATING_PATTERNS: &[FieldPattern] = &[
    FieldPattern {
        pattern: r#""starRating"\s*:\s*([0-5](?:\.\d+)?)"#,
        group: 1,
    },
    FieldPattern {
        pattern: r#""ratingValue"\s*:\s*"?([0-5](?:\.\d+)?)"#,
        group: 1,
    },
    FieldPattern {
        pattern: r#"([0-5](?:[.,]\d+)?)\s*(?:de 5|out of 5)"#,
        group: 1,
    },
];

const REVIEW_COUNT_PATTERNS: &[FieldPattern] = &[
    FieldPattern {
        pattern: r#""reviewsCount"\s*:\s*(\d+)"#,
        group: 1,
    },
    FieldPattern {
        pattern: r#""reviewCount"\s*:\s*"?(\d+)"#,
        group: 1,
    },
    FieldPattern {
        pattern: r#"(\d+)\s*(?:reseñas|evaluaciones|reviews)"#,
        group: 1,
    },
];

const DESCRIPTION_PATTERNS: &[FieldPattern] = &[
    FieldPattern {
        pattern: r#"<meta\s+(?:name|property)="(?:og:)?description"\s+content="([^"]+)""#,
        group: 1,
    },
    FieldPattern {
        pattern: r#""descriptionSummary"\s*:\s*"([^"]+)""#,
        group: 1,
    },
    FieldPattern {
        pattern: r#""description"\s*:\s*"([^"]{20,})""#,
        group: 1,
    },
];

const DETAILS_LINE_PATTERNS: &[FieldPattern] = &[
    FieldPattern {
        pattern: r#"(\d+\s*(?:huéspedes|guests)(?:\s*·[^<"·]{1,60}){1,5})"#,
        group: 1,
    },
    FieldPattern {
        pattern: r#""subtitle"\s*:\s*"([^"]*·[^"]*)""#,
        group: 1,
    },
];

/// Coordinate cascade entry: two capture groups, mapped explicitly because
/// the GeoJSON variant stores `[lng, lat]` in reversed order.
struct CoordPattern {
    pattern: &'static str,
    lat_group: usize,
    lng_group: usize,
}

const COORD_PATTERNS: &[CoordPattern] = &[
    CoordPattern {
        pattern: r#""?latitude"?\s*:\s*(-?\d{1,3}(?:\.\d+)?)\s*,\s*"?longitude"?\s*:\s*(-?\d{1,3}(?:\.\d+)?)"#,
        lat_group: 1,
        lng_group: 2,
    },
    CoordPattern {
        pattern: r#""?lat"?\s*:\s*(-?\d{1,3}(?:\.\d+)?)\s*,\s*"?lng"?\s*:\s*(-?\d{1,3}(?:\.\d+)?)"#,
        lat_group: 1,
        lng_group: 2,
    },
    // GeoJSON order is [lng, lat]
    CoordPattern {
        pattern: r#""?coordinates"?\s*:\s*\[\s*(-?\d{1,3}(?:\.\d+)?)\s*,\s*(-?\d{1,3}(?:\.\d+)?)\s*\]"#,
        lat_group: 2,
        lng_group: 1,
    },
];

fn cascade(html: &str, patterns: &[FieldPattern]) -> Option<String> {
    for entry in patterns {
        // Patterns are const tables; validity is a compile-time property.
        let re = Regex::new(entry.pattern).expect("cascade pattern is valid");
        if let Some(caps) = re.captures(html) {
            if let Some(m) = caps.get(entry.group) {
                let value = m.as_str().trim();
                if !value.is_empty() {
                    return Some(value.to_string());
                }
            }
        }
    }
    None
}

fn extract_coordinates(html: &str) -> Option<(f64, f64)> {
    for entry in COORD_PATTERNS {
        let re = Regex::new(entry.pattern).expect("coordinate pattern is valid");
        if let Some(caps) = re.captures(html) {
            let lat = caps.get(entry.lat_group)?.as_str().parse::<f64>().ok();
            let lng = caps.get(entry.lng_group)?.as_str().parse::<f64>().ok();
            if let (Some(lat), Some(lng)) = (lat, lng) {
                if lat != 0.0 && lng != 0.0 {
                    return Some((lat, lng));
                }
            }
        }
    }
    None
}

fn parse_rating(raw: &str) -> Option<f64> {
    let value = raw.replace(',', ".").parse::<f64>().ok()?;
    (0.0..=5.0).contains(&value).then_some(value)
}

/// Runs every field cascade over the full rendered HTML. Each cascade is
/// independent; a miss on one field never affects the others.
pub fn extract_fields(html: &str) -> ExtractedFields {
    let (latitude, longitude) = match extract_coordinates(html) {
        Some((lat, lng)) => (Some(lat), Some(lng)),
        None => (None, None),
    };

    ExtractedFields {
        title: cascade(html, TITLE_PATTERNS),
        details_line: cascade(html, DETAILS_LINE_PATTERNS),
        description: cascade(html, DESCRIPTION_PATTERNS),
        price: cascade(html, PRICE_PATTERNS),
        rating: cascade(html, RATING_PATTERNS).and_then(|r| parse_rating(&r)),
        review_count: cascade(html, REVIEW_COUNT_PATTERNS).and_then(|c| c.parse().ok()),
        latitude,
        longitude,
    }
}

// ---------------------------------------------------------------------------
// Live engine
// ---------------------------------------------------------------------------

/// Drives one browser page through navigate → probe → cascade for a single
/// candidate URL.
pub struct PageExtractor<'a> {
    tab: &'a Tab,
    settle: Duration,
}

impl<'a> PageExtractor<'a> {
    pub fn new(tab: &'a Tab) -> Self {
        Self {
            tab,
            settle: SETTLE_DELAY,
        }
    }

    /// Probes the live DOM for a price. Best-effort: any script failure is
    /// treated as "not found" and the HTML cascade still runs.
    fn probe_price(&self) -> Option<String> {
        self.tab
            .evaluate(PRICE_PROBE_JS, false)
            .ok()
            .and_then(|obj| obj.value)
            .and_then(|v| v.as_str().map(|s| s.trim().to_string()))
            .filter(|s| !s.is_empty())
    }
}

impl ExtractionEngine for PageExtractor<'_> {
    fn run(&mut self, url: &str) -> Result<AttemptOutcome, ScrapeError> {
        self.tab
            .navigate_to(url)
            .map_err(|e| ScrapeError::Navigation(e.to_string()))?;
        // Content renders asynchronously after the initial parse; wait for
        // the navigation itself, not network idle.
        self.tab
            .wait_until_navigated()
            .map_err(|e| ScrapeError::Navigation(e.to_string()))?;

        let _ = self.tab.evaluate(DISMISS_MODAL_JS, false);
        let _ = self.tab.evaluate(SCROLL_JS, false);
        std::thread::sleep(self.settle);

        let probed_price = self.probe_price();

        let html = self
            .tab
            .get_content()
            .map_err(|e| ScrapeError::Navigation(e.to_string()))?;

        let mut fields = extract_fields(&html);
        // The cascade price is a fallback; the live probe wins when present.
        if probed_price.is_some() {
            fields.price = probed_price;
        }

        Ok(AttemptOutcome { fields, html })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn og_title_wins_over_title_tag() {
        let html = r#"<html><head>
            <meta property="og:title" content="Loft en Condesa">
            <title>Loft en Condesa - Airbnb</title>
            </head><body></body></html>"#;
        assert_eq!(
            cascade(html, TITLE_PATTERNS),
            Some("Loft en Condesa".to_string())
        );
    }

    #[test]
    fn title_tag_is_the_last_fallback() {
        let html = "<html><head><title>Casa Azul</title></head></html>";
        assert_eq!(cascade(html, TITLE_PATTERNS), Some("Casa Azul".to_string()));
    }

    #[test]
    fn explicit_latitude_longitude_pair_wins() {
        let html = r#"{"latitude":19.4326,"longitude":-99.1332}"#;
        assert_eq!(extract_coordinates(html), Some((19.4326, -99.1332)));
    }

    #[test]
    fn lat_lng_variant_is_second() {
        let html = r#"{"lat":19.43,"lng":-99.13}"#;
        assert_eq!(extract_coordinates(html), Some((19.43, -99.13)));
    }

    #[test]
    fn geojson_array_order_is_reversed() {
        let html = "var map = { coordinates: [-99.13, 19.43] };";
        assert_eq!(extract_coordinates(html), Some((19.43, -99.13)));
    }

    #[test]
    fn zero_coordinates_are_rejected() {
        let html = r#"{"latitude":0,"longitude":0}"#;
        assert_eq!(extract_coordinates(html), None);
        // and the cascade keeps falling through to a later variant
        let html = r#"{"latitude":0,"longitude":0} {"lat":19.4,"lng":-99.1}"#;
        assert_eq!(extract_coordinates(html), Some((19.4, -99.1)));
    }

    #[test]
    fn price_json_token_is_found() {
        let html = r#"{"pdpDisplay":{"priceString":"$1,200 MXN"}}"#;
        assert_eq!(
            cascade(html, PRICE_PATTERNS),
            Some("$1,200 MXN".to_string())
        );
    }

    #[test]
    fn visible_price_fragment_is_the_fallback() {
        let html = "<span>$950 MXN por noche</span>";
        assert_eq!(cascade(html, PRICE_PATTERNS), Some("$950 MXN".to_string()));
    }

    #[test]
    fn rating_and_reviews_parse_from_json_shapes() {
        let html = r#"{"starRating":4.87,"reviewsCount":231}"#;
        let fields = extract_fields(html);
        assert_eq!(fields.rating, Some(4.87));
        assert_eq!(fields.review_count, Some(231));
    }

    #[test]
    fn rating_out_of_range_is_dropped() {
        assert_eq!(parse_rating("7.2"), None);
        assert_eq!(parse_rating("4,8"), Some(4.8));
    }

    #[test]
    fn details_line_matches_the_dot_chain() {
        let html = r#"<div>4 huéspedes · 2 recámaras · 2 camas · 1 baño</div>"#;
        assert_eq!(
            cascade(html, DETAILS_LINE_PATTERNS),
            Some("4 huéspedes · 2 recámaras · 2 camas · 1 baño".to_string())
        );
    }

    #[test]
    fn every_cascade_degrades_to_none_independently() {
        let html = r#"<meta property="og:title" content="Solo título">"#;
        let fields = extract_fields(html);
        assert_eq!(fields.title, Some("Solo título".to_string()));
        assert_eq!(fields.price, None);
        assert_eq!(fields.latitude, None);
        assert_eq!(fields.longitude, None);
        assert_eq!(fields.rating, None);
        assert_eq!(fields.review_count, None);
    }
}
