pub mod browser;
pub mod crawl;
pub mod normalize;
pub mod pap;
pub mod parser;
pub mod registry;
pub mod traits;
pub mod types;

#[cfg(test)]
pub mod testing;

pub use registry::ScraperRegistry;
pub use types::{BrowserSettings, CrawlSettings};
