// src/models/selectors.rs

//! CSS selectors for scraping course cards.

use serde::{Deserialize, Serialize};

/// CSS selectors for scraping the course listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourseSelectors {
    /// Selector for each course card on the page
    #[serde(default = "defaults::card")]
    pub card_selector: String,

    /// Selector for the title element within a card
    #[serde(default = "defaults::title")]
    pub title_selector: String,

    /// Selector for the description element within a card
    #[serde(default = "defaults::description")]
    pub description_selector: String,

    /// Selector for the status element within a card
    #[serde(default = "defaults::status")]
    pub status_selector: String,

    /// Selector for the link element within a card
    #[serde(default = "defaults::link")]
    pub link_selector: String,

    /// HTML attribute name for extracting links (usually "href")
    #[serde(default = "defaults::attr_name")]
    pub attr_name: String,
}

impl Default for CourseSelectors {
    fn default() -> Self {
        Self {
            card_selector: defaults::card(),
            title_selector: defaults::title(),
            description_selector: defaults::description(),
            status_selector: defaults::status(),
            link_selector: defaults::link(),
            attr_name: defaults::attr_name(),
        }
    }
}

impl CourseSelectors {
    /// All selector strings paired with their config key, for validation.
    pub fn entries(&self) -> [(&'static str, &str); 5] {
        [
            ("card_selector", &self.card_selector),
            ("title_selector", &self.title_selector),
            ("description_selector", &self.description_selector),
            ("status_selector", &self.status_selector),
            ("link_selector", &self.link_selector),
        ]
    }
}

// Class names generated by the Academy frontend; they change with redeploys.
mod defaults {
    pub fn card() -> String {
        ".course-card".into()
    }
    pub fn title() -> String {
        ".course-name".into()
    }
    pub fn description() -> String {
        ".css-62w6gh".into()
    }
    pub fn status() -> String {
        ".css-0".into()
    }
    pub fn link() -> String {
        "a".into()
    }
    pub fn attr_name() -> String {
        "href".into()
    }
}
