use crate::db::failures::{last_failure, record_failure};
use crate::db::listings::{find_by_external_id, upsert_listing};
use crate::domain::ListingRecord;
use crate::tests::utils::make_db;
use chrono::Utc;

fn record(external_id: &str, price: Option<&str>) -> ListingRecord {
    ListingRecord {
        external_id: external_id.to_string(),
        source_url: format!("https://www.airbnb.com/rooms/{external_id}"),
        referral_url: format!("https://www.airbnb.com/rooms/{external_id}?src=test"),
        title: Some("Loft en Condesa".to_string()),
        details_line: Some("4 huéspedes · 2 recámaras".to_string()),
        description: None,
        price: price.map(str::to_string),
        rating: Some(4.9),
        review_count: Some(120),
        latitude: Some(19.43),
        longitude: Some(-99.13),
        region_code: "mx".to_string(),
        extraction_errors: Vec::new(),
        raw_html_snapshot: None,
        updated_at: Utc::now().naive_utc(),
    }
}

#[test]
fn first_insert_is_not_an_update() {
    let db = make_db("insert");
    let updated = upsert_listing(&db, &record("100", Some("$900 MXN"))).unwrap();
    assert!(!updated);
}

#[test]
fn unchanged_price_reports_updated_false() {
    let db = make_db("same_price");
    upsert_listing(&db, &record("200", Some("$900 MXN"))).unwrap();
    let updated = upsert_listing(&db, &record("200", Some("$900 MXN"))).unwrap();
    assert!(!updated);
}

#[test]
fn changed_price_reports_updated_true() {
    let db = make_db("new_price");
    upsert_listing(&db, &record("300", Some("$900 MXN"))).unwrap();
    let updated = upsert_listing(&db, &record("300", Some("$1,100 MXN"))).unwrap();
    assert!(updated);

    let stored = find_by_external_id(&db, "300").unwrap().unwrap();
    assert_eq!(stored.price.as_deref(), Some("$1,100 MXN"));
}

#[test]
fn upsert_is_keyed_on_external_id() {
    let db = make_db("keyed");
    upsert_listing(&db, &record("400", Some("$1 MXN"))).unwrap();
    upsert_listing(&db, &record("400", Some("$2 MXN"))).unwrap();
    upsert_listing(&db, &record("401", Some("$3 MXN"))).unwrap();

    assert!(find_by_external_id(&db, "400").unwrap().is_some());
    assert!(find_by_external_id(&db, "401").unwrap().is_some());
    assert!(find_by_external_id(&db, "402").unwrap().is_none());
}

#[test]
fn extraction_errors_and_snapshot_round_trip() {
    let db = make_db("errors");
    let mut partial = record("500", None);
    partial.latitude = None;
    partial.longitude = None;
    partial.extraction_errors = vec![
        "No se encontraron coordenadas".to_string(),
        "No se encontró el precio".to_string(),
    ];
    partial.raw_html_snapshot = Some("<html>raw</html>".to_string());
    upsert_listing(&db, &partial).unwrap();

    let stored = find_by_external_id(&db, "500").unwrap().unwrap();
    assert_eq!(stored.extraction_errors, partial.extraction_errors);
    assert_eq!(stored.raw_html_snapshot.as_deref(), Some("<html>raw</html>"));

    // a later complete run clears both
    let complete = record("500", Some("$700 MXN"));
    upsert_listing(&db, &complete).unwrap();
    let stored = find_by_external_id(&db, "500").unwrap().unwrap();
    assert!(stored.extraction_errors.is_empty());
    assert_eq!(stored.raw_html_snapshot, None);
}

#[test]
fn failure_records_are_keyed_by_source_url() {
    let db = make_db("failures");
    let url = "https://www.airbnb.com/rooms/600";

    record_failure(&db, url, "browser launch failed").unwrap();
    assert_eq!(
        last_failure(&db, url).unwrap().as_deref(),
        Some("browser launch failed")
    );

    // re-recording replaces, not duplicates
    record_failure(&db, url, "chrome binary missing").unwrap();
    assert_eq!(
        last_failure(&db, url).unwrap().as_deref(),
        Some("chrome binary missing")
    );
}
