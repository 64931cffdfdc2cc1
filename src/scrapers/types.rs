use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Paging behaviour shared by every site crawler
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlSettings {
    /// Pause before each page fetch after the first
    pub page_delay: Duration,
    /// Last page to fetch; `None` crawls until a page has no cards
    pub max_pages: Option<u32>,
}

impl Default for CrawlSettings {
    fn default() -> Self {
        Self {
            page_delay: Duration::from_secs(2),
            max_pages: Some(50),
        }
    }
}

/// Headless Chrome launch parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserSettings {
    pub user_agent: String,
    /// Upper bound for a single navigation
    pub page_timeout: Duration,
    pub headless: bool,
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            user_agent: "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".to_string(),
            page_timeout: Duration::from_secs(30),
            headless: true,
        }
    }
}
