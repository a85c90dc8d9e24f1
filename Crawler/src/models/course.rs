//! Course data structure.

use serde::{Deserialize, Serialize};

/// A course card scraped from the learn-and-earn page.
///
/// Equality covers every field; no single field acts as an identity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Course {
    /// Course name
    pub title: String,

    /// Short descriptor shown on the card
    pub description: String,

    /// Availability or enrollment state
    pub status: String,

    /// Full URL to the course
    pub link: String,
}

impl Course {
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        status: impl Into<String>,
        link: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            status: status.into(),
            link: link.into(),
        }
    }

    /// Format course for display using a template.
    ///
    /// Supported placeholders: `{title}`, `{description}`, `{status}`, `{link}`
    pub fn format(&self, template: &str) -> String {
        template
            .replace("{title}", &self.title)
            .replace("{description}", &self.description)
            .replace("{status}", &self.status)
            .replace("{link}", &self.link)
    }
}
