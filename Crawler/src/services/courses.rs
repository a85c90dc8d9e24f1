// src/services/courses.rs

//! Course crawler service.
//!
//! Fetches the learn-and-earn listing and turns each course card into a
//! [`Course`] using the configured CSS selectors.

use async_trait::async_trait;
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::error::{AppError, Result};
use crate::models::{Course, CourseSelectors, SourceConfig};
use crate::services::CourseSource;
use crate::utils::http::{create_async_client, fetch_text_async};
use crate::utils::{normalize_whitespace, resolve_url};

/// Service for scraping courses from the listing page.
pub struct CourseCrawler {
    source: SourceConfig,
    client: Client,
}

/// Parsed selectors for one scrape.
struct CardSelectors {
    card: Selector,
    title: Selector,
    description: Selector,
    status: Selector,
    link: Selector,
}

impl CardSelectors {
    fn parse(selectors: &CourseSelectors) -> Result<Self> {
        Ok(Self {
            card: parse_selector(&selectors.card_selector)?,
            title: parse_selector(&selectors.title_selector)?,
            description: parse_selector(&selectors.description_selector)?,
            status: parse_selector(&selectors.status_selector)?,
            link: parse_selector(&selectors.link_selector)?,
        })
    }
}

impl CourseCrawler {
    /// Create a new course crawler with its own HTTP client.
    pub fn new(source: SourceConfig) -> Result<Self> {
        let client = create_async_client(&source)?;
        Ok(Self { source, client })
    }

    /// Extract courses from a listing page.
    pub fn parse_courses(&self, html: &str) -> Result<Vec<Course>> {
        let base_url = Url::parse(&self.source.url)?;
        extract_courses(html, &self.source.selectors, &base_url)
    }
}

#[async_trait]
impl CourseSource for CourseCrawler {
    async fn fetch_courses(&self) -> Result<Vec<Course>> {
        log::debug!("Fetching course listing from {}", self.source.url);
        let html = fetch_text_async(&self.client, &self.source.url).await?;
        let courses = self.parse_courses(&html)?;

        if courses.is_empty() {
            log::warn!(
                "No course cards matched '{}' on {}",
                self.source.selectors.card_selector,
                self.source.url
            );
        } else {
            log::debug!("Scraped {} courses", courses.len());
        }
        Ok(courses)
    }
}

/// Extract every course card from `html`.
///
/// A page with no cards yields an empty list. A card that lacks its title,
/// description, status or link means the markup changed and fails the scrape.
pub fn extract_courses(
    html: &str,
    selectors: &CourseSelectors,
    base_url: &Url,
) -> Result<Vec<Course>> {
    let sel = CardSelectors::parse(selectors)?;
    let document = Html::parse_document(html);

    document
        .select(&sel.card)
        .enumerate()
        .map(|(index, card)| parse_card(&card, index, &sel, selectors, base_url))
        .collect()
}

fn parse_card(
    card: &ElementRef,
    index: usize,
    sel: &CardSelectors,
    selectors: &CourseSelectors,
    base_url: &Url,
) -> Result<Course> {
    let missing = |selector: &str| {
        AppError::crawl(
            base_url.as_str(),
            format!("course card #{} has no element matching '{selector}'", index + 1),
        )
    };

    let title =
        select_text(card, &sel.title).ok_or_else(|| missing(&selectors.title_selector))?;
    let description = select_text(card, &sel.description)
        .ok_or_else(|| missing(&selectors.description_selector))?;
    let status =
        select_text(card, &sel.status).ok_or_else(|| missing(&selectors.status_selector))?;

    let attr_name = selectors.attr_name.as_str();
    let link = card
        .select(&sel.link)
        .next()
        .and_then(|a| a.value().attr(attr_name))
        .or_else(|| card.value().attr(attr_name))
        .map(|href| resolve_url(base_url, href.trim()))
        .ok_or_else(|| missing(&format!("{}[{attr_name}]", selectors.link_selector)))?;

    Ok(Course {
        title,
        description,
        status,
        link,
    })
}

fn select_text(scope: &ElementRef, selector: &Selector) -> Option<String> {
    scope
        .select(selector)
        .next()
        .map(|el| normalize_whitespace(&el.text().collect::<String>()))
}

fn parse_selector(s: &str) -> Result<Selector> {
    Selector::parse(s).map_err(|e| AppError::selector(s, format!("{e:?}")))
}
