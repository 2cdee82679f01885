use crate::db::connection::{init_db, Database};
use astra::Body;
use std::time::{SystemTime, UNIX_EPOCH};

/// Returns a fresh test database using the production schema
pub fn make_db(label: &str) -> Database {
    let path = std::env::temp_dir().join(format!(
        "{label}_test_{}.sqlite",
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    ));
    let db = Database::new(path.to_string_lossy().to_string());
    init_db(&db, "sql/schema.sql").expect("Failed to initialize DB");
    db
}

/// Build a request against the router
pub fn request(method: &str, path: &str, body: &str) -> astra::Request {
    http::Request::builder()
        .method(method)
        .uri(path)
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Read a response body to a string
pub fn body_string(resp: &mut astra::Response) -> String {
    use std::io::Read;
    let mut bytes = Vec::new();
    resp.body_mut()
        .reader()
        .read_to_end(&mut bytes)
        .expect("readable body");
    String::from_utf8(bytes).expect("utf-8 body")
}
