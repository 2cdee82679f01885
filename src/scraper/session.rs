use crate::scraper::randomness::Randomness;
use crate::scraper::ScrapeError;
use headless_chrome::protocol::cdp::Page;
use headless_chrome::{Browser, LaunchOptions, Tab};
use std::collections::HashMap;
use std::ffi::OsStr;
use std::sync::Arc;
use std::time::Duration;

const USER_AGENT_POOL: &[&str] = &[
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/121.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/121.0.0.0 Safari/537.36",
];

const BASE_VIEWPORT: (u32, u32) = (1366, 768);
const VIEWPORT_JITTER: u32 = 120;
const NAVIGATION_TIMEOUT: Duration = Duration::from_secs(45);

// Page-level overrides installed before the first navigation. They reduce,
// not eliminate, automation-detection signals: no webdriver flag, a
// non-empty plugin list, populated languages, a vendor runtime object, and a
// static answer to notification permission queries.
const STEALTH_SCRIPT: &str = r#"
Object.defineProperty(navigator, 'webdriver', { get: () => false, configurable: true });
Object.defineProperty(navigator, 'plugins', { get: () => [1, 2, 3, 4, 5], configurable: true });
Object.defineProperty(navigator, 'languages', { get: () => ['es-MX', 'es', 'en'], configurable: true });
Object.defineProperty(navigator, 'vendor', { get: () => 'Google Inc.', configurable: true });

if (!window.chrome) { window.chrome = {}; }
if (!window.chrome.runtime) {
    window.chrome.runtime = {
        connect: function () { return { onDisconnect: { addListener: function () {} }, postMessage: function () {} }; },
        sendMessage: function () {},
        onMessage: { addListener: function () {}, removeListener: function () {} },
    };
}

const originalQuery = window.navigator.permissions && window.navigator.permissions.query;
if (originalQuery) {
    window.navigator.permissions.query = (parameters) => (
        parameters.name === 'notifications'
            ? Promise.resolve({ state: Notification.permission })
            : originalQuery(parameters)
    );
}
"#;

/// One stealth-configured browser page, scoped to a single run.
///
/// Teardown is RAII: dropping the session kills the browser process on every
/// exit path, success or not.
pub struct BrowserSession {
    // Held so the process outlives the tab.
    _browser: Browser,
    tab: Arc<Tab>,
}

impl BrowserSession {
    pub fn new(rng: &mut dyn Randomness, locale: &str) -> Result<Self, ScrapeError> {
        // Randomized once per run, not per attempt.
        let user_agent = USER_AGENT_POOL[rng.pick(USER_AGENT_POOL.len())];
        let width = BASE_VIEWPORT.0 + rng.jitter(VIEWPORT_JITTER);
        let height = BASE_VIEWPORT.1 + rng.jitter(VIEWPORT_JITTER);

        let options = LaunchOptions::default_builder()
            .headless(true)
            // containerized execution: no sandbox, no /dev/shm
            .sandbox(false)
            .window_size(Some((width, height)))
            .args(vec![
                OsStr::new("--disable-gpu"),
                OsStr::new("--disable-dev-shm-usage"),
                OsStr::new("--disable-blink-features=AutomationControlled"),
            ])
            .idle_browser_timeout(Duration::from_secs(300))
            .build()
            .map_err(|e| ScrapeError::BrowserSetup(e.to_string()))?;

        let browser =
            Browser::new(options).map_err(|e| ScrapeError::BrowserSetup(e.to_string()))?;
        let tab = browser
            .new_tab()
            .map_err(|e| ScrapeError::BrowserSetup(e.to_string()))?;

        tab.set_default_timeout(NAVIGATION_TIMEOUT);

        let accept_language = accept_language_for(locale);
        tab.set_user_agent(user_agent, Some(&accept_language), Some("Linux x86_64"))
            .map_err(|e| ScrapeError::BrowserSetup(e.to_string()))?;

        let mut headers = HashMap::new();
        headers.insert("Accept-Language", accept_language.as_str());
        headers.insert(
            "Accept",
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
        );
        headers.insert("Accept-Encoding", "gzip, deflate, br");
        tab.set_extra_http_headers(headers)
            .map_err(|e| ScrapeError::BrowserSetup(e.to_string()))?;

        tab.call_method(Page::AddScriptToEvaluateOnNewDocument {
            source: STEALTH_SCRIPT.to_string(),
            world_name: None,
            include_command_line_api: None,
            run_immediately: None,
        })
        .map_err(|e| ScrapeError::BrowserSetup(e.to_string()))?;

        Ok(Self {
            _browser: browser,
            tab,
        })
    }

    pub fn tab(&self) -> &Tab {
        &self.tab
    }
}

fn accept_language_for(locale: &str) -> String {
    let primary = locale.split('-').next().unwrap_or(locale);
    if primary == "en" {
        format!("{locale},en;q=0.8")
    } else {
        format!("{locale},{primary};q=0.8,en;q=0.6")
    }
}
