use crate::models::{capture_time, Listing, Source};
use crate::scrapers::normalize::{normalize_price, normalize_size, AREA_MARKER};
use anyhow::{anyhow, Result};
use scraper::{ElementRef, Selector};
use tracing::{debug, warn};
use url::Url;

/// Why a card did not produce a listing. Never fatal to the crawl.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SkipReason {
    #[error("missing {0} fragment")]
    MissingFragment(&'static str),
    #[error("title fragment has no link")]
    MissingLink,
    #[error("cannot resolve link '{0}'")]
    InvalidLink(String),
    #[error("location is empty")]
    EmptyLocation,
}

#[derive(Debug)]
pub enum ParseOutcome {
    Parsed(Listing),
    Skip(SkipReason),
}

/// Compiled selectors locating a card and its fragments on a results page
#[derive(Debug, Clone)]
pub struct CardSelectors {
    pub card: Selector,
    pub title: Selector,
    pub link: Selector,
    pub price: Selector,
    pub location: Selector,
    pub criteria: Selector,
}

impl CardSelectors {
    pub fn new(card: &str, title: &str, price: &str, location: &str, criteria: &str) -> Result<Self> {
        Ok(Self {
            card: compile(card)?,
            title: compile(title)?,
            link: compile("a[href]")?,
            price: compile(price)?,
            location: compile(location)?,
            criteria: compile(criteria)?,
        })
    }

    /// PAP.fr search result markup
    pub fn pap() -> Result<Self> {
        Self::new(
            "div.search-list-item",
            "h2.item-title",
            "span.item-price",
            "div.item-location",
            "div.item-criteria",
        )
    }
}

fn compile(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| anyhow!("Invalid selector '{}': {:?}", css, e))
}

/// Turn one rendered card into a listing, or explain why it was skipped.
///
/// Title, price and location fragments are required; the criteria fragment
/// only contributes the surface when it mentions an area. Missing fragments
/// are routine on heterogeneous markup and only logged at debug level.
pub fn parse_card(
    card: ElementRef<'_>,
    selectors: &CardSelectors,
    source: Source,
    base_url: &Url,
) -> ParseOutcome {
    match extract_listing(card, selectors, source, base_url) {
        Ok(listing) => ParseOutcome::Parsed(listing),
        Err(reason) => {
            match reason {
                SkipReason::MissingFragment(_) => debug!(%reason, "Skipping card"),
                _ => warn!(%reason, card = %snippet(card), "Skipping card"),
            }
            ParseOutcome::Skip(reason)
        }
    }
}

fn extract_listing(
    card: ElementRef<'_>,
    selectors: &CardSelectors,
    source: Source,
    base_url: &Url,
) -> Result<Listing, SkipReason> {
    let title_el = first(card, &selectors.title).ok_or(SkipReason::MissingFragment("title"))?;
    let price_el = first(card, &selectors.price).ok_or(SkipReason::MissingFragment("price"))?;
    let location_el =
        first(card, &selectors.location).ok_or(SkipReason::MissingFragment("location"))?;

    let href = first(title_el, &selectors.link)
        .and_then(|a| a.value().attr("href"))
        .map(str::trim)
        .filter(|href| !href.is_empty())
        .ok_or(SkipReason::MissingLink)?;
    let link = resolve_link(href, base_url)?;

    let size = first(card, &selectors.criteria)
        .map(|el| size_from_criteria(&text_of(el)))
        .unwrap_or(0);

    let location = text_of(location_el);
    if location.is_empty() {
        return Err(SkipReason::EmptyLocation);
    }

    Ok(Listing {
        source,
        title: text_of(title_el),
        price: normalize_price(&text_of(price_el)),
        size,
        location,
        link,
        timestamp: capture_time(),
    })
}

/// Keep absolute http(s) links verbatim, join anything else onto the site origin.
pub fn resolve_link(href: &str, base_url: &Url) -> Result<String, SkipReason> {
    let lower = href.to_ascii_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") {
        return Ok(href.to_string());
    }

    match base_url.join(href) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(url.into()),
        _ => Err(SkipReason::InvalidLink(href.to_string())),
    }
}

/// Surface from criteria text like "3 pièces 2 chambres 45 m²".
///
/// Only the figure right before the first area marker counts: the trailing
/// run of digits and digit-group spaces ("1 234"). Room counts and any
/// separator before that run do not leak into the size.
pub fn size_from_criteria(text: &str) -> u64 {
    let Some((before, _)) = text.split_once(AREA_MARKER) else {
        return 0;
    };
    let before = before.trim_end();
    let start = before
        .char_indices()
        .rev()
        .take_while(|(_, c)| c.is_ascii_digit() || is_group_separator(*c))
        .last()
        .map_or(before.len(), |(idx, _)| idx);
    normalize_size(&before[start..])
}

fn is_group_separator(c: char) -> bool {
    matches!(c, ' ' | '\u{a0}' | '\u{202f}')
}

fn first<'a>(scope: ElementRef<'a>, selector: &Selector) -> Option<ElementRef<'a>> {
    scope.select(selector).next()
}

fn text_of(el: ElementRef<'_>) -> String {
    el.text().collect::<String>().trim().to_string()
}

fn snippet(card: ElementRef<'_>) -> String {
    let text = card.text().collect::<Vec<_>>().join(" ");
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .chars()
        .take(80)
        .collect()
}
