//! Fixtures shared by the crawler tests.

use crate::scrapers::crawl::PageRenderer;
use anyhow::{bail, Result};
use url::Url;

/// PAP-style listing card
pub fn card(id: u32, price: &str, location: &str) -> String {
    format!(
        r#"<div class="search-list-item">
            <h2 class="item-title"><a href="/annonces/appartement-r{id}">Appartement {id}</a></h2>
            <span class="item-price">{price}</span>
            <div class="item-location">{location}</div>
            <div class="item-criteria">2 pièces 40 m²</div>
        </div>"#
    )
}

pub fn page(cards: &[String]) -> String {
    format!(
        "<html><body><div class=\"search-results-list\">{}</div></body></html>",
        cards.join("\n")
    )
}

/// Serves canned pages by the `page` query parameter of the requested URL.
///
/// Pages past the script render as empty documents unless `repeating` is set.
pub struct ScriptedRenderer {
    pages: Vec<String>,
    repeat_last: bool,
    fail_at: Option<u32>,
    pub requested: Vec<String>,
    pub closed: u32,
}

impl ScriptedRenderer {
    pub fn new(pages: Vec<String>) -> Self {
        Self {
            pages,
            repeat_last: false,
            fail_at: None,
            requested: Vec::new(),
            closed: 0,
        }
    }

    pub fn repeating(mut self) -> Self {
        self.repeat_last = true;
        self
    }

    pub fn failing_at(mut self, page: u32) -> Self {
        self.fail_at = Some(page);
        self
    }
}

impl PageRenderer for ScriptedRenderer {
    fn render(&mut self, url: &str) -> Result<String> {
        self.requested.push(url.to_string());

        let page: u32 = Url::parse(url)?
            .query_pairs()
            .find(|(key, _)| key == "page")
            .and_then(|(_, value)| value.parse().ok())
            .unwrap_or(1);

        if self.fail_at == Some(page) {
            bail!("navigation timed out");
        }

        let idx = page as usize - 1;
        let html = match self.pages.get(idx) {
            Some(html) => html.clone(),
            None if self.repeat_last => self.pages.last().cloned().unwrap_or_default(),
            None => String::new(),
        };
        Ok(html)
    }

    fn close(&mut self) {
        self.closed += 1;
    }
}
