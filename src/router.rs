use crate::db::Database;
use crate::errors::ServerError;
use crate::responses::{html_response, json_response, ResultResp};
use crate::scraper::pipeline::{run_scrape, ScrapeRequest};
use crate::scraper::randomness::SystemRandomness;
use crate::scraper::ScrapeError;
use crate::templates;
use astra::Request;
use serde_json::json;
use std::io::Read;

pub fn handle(req: Request, db: &Database) -> ResultResp {
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    match (method.as_str(), path.as_str()) {
        ("GET", "/") => html_response(templates::pages::home_page()),
        ("GET", "/health") => json_response(200, json!({ "status": "ok" })),

        ("POST", "/api/scrape") => scrape_listing(req, db),

        _ => Err(ServerError::NotFound),
    }
}

/// POST /api/scrape — body `{url, region_code?, referral_url?}`.
///
/// 200 `{lat, lng, saved, updated}` even when extraction was partial (the
/// gap list lives on the stored record); 400 `{error}` when the input never
/// yields a listing id (no browser is created for those); 500
/// `{error, details}` when the browser or the store fails.
fn scrape_listing(mut req: Request, db: &Database) -> ResultResp {
    let mut body = Vec::new();
    if req.body_mut().reader().read_to_end(&mut body).is_err() {
        return json_response(400, json!({ "error": "unreadable request body" }));
    }

    let request: ScrapeRequest = match serde_json::from_slice(&body) {
        Ok(parsed) => parsed,
        Err(e) => {
            return json_response(400, json!({ "error": format!("invalid request body: {e}") }))
        }
    };

    let mut rng = SystemRandomness;
    match run_scrape(db, &request, &mut rng) {
        Ok(outcome) => json_response(
            200,
            json!({
                "lat": outcome.latitude,
                "lng": outcome.longitude,
                "saved": true,
                "updated": outcome.updated,
            }),
        ),
        Err(ScrapeError::InvalidInput(msg)) => json_response(400, json!({ "error": msg })),
        Err(e) => json_response(
            500,
            json!({
                "error": "scrape failed",
                "details": e.to_string(),
            }),
        ),
    }
}
