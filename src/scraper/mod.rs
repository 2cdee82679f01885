pub mod extract;
pub mod params;
pub mod pipeline;
pub mod randomness;
pub mod retry;
pub mod scrape_error;
pub mod session;
pub mod url_norm;

pub use scrape_error::ScrapeError;
