use std::error::Error;
use std::fmt;

#[derive(Debug)]
pub enum ScrapeError {
    /// No parseable listing id in the input URL. Raised before any browser
    /// resource is touched; never retried.
    InvalidInput(String),
    /// Browser launch or session configuration failed. Fatal to the run.
    BrowserSetup(String),
    /// Navigation or in-page evaluation failed for one attempt. The retry
    /// controller degrades this to "no price for this attempt".
    Navigation(String),
    Persistence(String),
}

impl fmt::Display for ScrapeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScrapeError::InvalidInput(msg) => write!(f, "Invalid input: {msg}"),
            ScrapeError::BrowserSetup(msg) => write!(f, "Browser setup failed: {msg}"),
            ScrapeError::Navigation(msg) => write!(f, "Navigation error: {msg}"),
            ScrapeError::Persistence(msg) => write!(f, "Persistence error: {msg}"),
        }
    }
}

impl Error for ScrapeError {}
