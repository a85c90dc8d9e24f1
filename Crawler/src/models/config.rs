//! Application configuration structures.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::CourseSelectors;

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Page to scrape and HTTP behavior
    #[serde(default)]
    pub source: SourceConfig,

    /// Check interval settings
    #[serde(default)]
    pub schedule: ScheduleConfig,

    /// Snapshot persistence settings
    #[serde(default)]
    pub storage: StorageConfig,

    /// Change detection policy
    #[serde(default)]
    pub detection: DetectionConfig,

    /// Bot API settings
    #[serde(default)]
    pub telegram: TelegramConfig,

    /// Notification and reply templates
    #[serde(default)]
    pub messages: MessagesConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        url::Url::parse(&self.source.url)
            .map_err(|e| AppError::validation(format!("source.url is invalid: {e}")))?;
        if self.source.user_agent.trim().is_empty() {
            return Err(AppError::validation("source.user_agent is empty"));
        }
        if self.source.timeout_secs == 0 {
            return Err(AppError::validation("source.timeout_secs must be > 0"));
        }
        for (key, selector) in self.source.selectors.entries() {
            scraper::Selector::parse(selector).map_err(|e| {
                AppError::validation(format!("source.selectors.{key} '{selector}': {e:?}"))
            })?;
        }
        if self.schedule.interval_secs == 0 {
            return Err(AppError::validation("schedule.interval_secs must be > 0"));
        }
        if self.schedule.retry_secs == 0 {
            return Err(AppError::validation("schedule.retry_secs must be > 0"));
        }
        if self.schedule.retry_secs >= self.schedule.interval_secs {
            return Err(AppError::validation(
                "schedule.retry_secs must be shorter than schedule.interval_secs",
            ));
        }
        if self.storage.snapshot_file.as_os_str().is_empty() {
            return Err(AppError::validation("storage.snapshot_file is empty"));
        }
        url::Url::parse(&self.telegram.api_base)
            .map_err(|e| AppError::validation(format!("telegram.api_base is invalid: {e}")))?;
        let template = &self.messages.new_course;
        if !template.contains("{title}") || !template.contains("{link}") {
            return Err(AppError::validation(
                "messages.new_course must contain {title} and {link}",
            ));
        }
        if self.telegram.parse_mode.trim().eq_ignore_ascii_case("markdownv2") {
            for (key, template) in self.messages.entries() {
                if let Some(c) = unescaped_markdown_v2(template) {
                    return Err(AppError::validation(format!(
                        "messages.{key} has an unescaped '{c}', which MarkdownV2 reserves"
                    )));
                }
            }
        }
        Ok(())
    }

    /// Resolve the snapshot file against the storage directory.
    pub fn snapshot_path(&self, storage_dir: &Path) -> PathBuf {
        storage_dir.join(&self.storage.snapshot_file)
    }
}

/// Course page and HTTP client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// URL of the learn-and-earn listing
    #[serde(default = "defaults::source_url")]
    pub url: String,

    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Selectors for course cards
    #[serde(default)]
    pub selectors: CourseSelectors,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            url: defaults::source_url(),
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            selectors: CourseSelectors::default(),
        }
    }
}

/// Check loop timing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// Seconds between successful checks
    #[serde(default = "defaults::interval")]
    pub interval_secs: u64,

    /// Seconds to wait before retrying a failed check
    #[serde(default = "defaults::retry")]
    pub retry_secs: u64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            interval_secs: defaults::interval(),
            retry_secs: defaults::retry(),
        }
    }
}

/// Snapshot persistence settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Snapshot file name, relative to the storage directory
    #[serde(default = "defaults::snapshot_file")]
    pub snapshot_file: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            snapshot_file: defaults::snapshot_file(),
        }
    }
}

/// Which part of a course decides whether it was seen before.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum DiffKey {
    /// All four fields must match
    #[default]
    Record,
    /// Only the link must match
    Link,
}

/// Change detection settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DetectionConfig {
    #[serde(default)]
    pub key: DiffKey,
}

/// Telegram Bot API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    /// Bot API base URL
    #[serde(default = "defaults::api_base")]
    pub api_base: String,

    /// `parse_mode` sent with every message; empty for plain text
    #[serde(default = "defaults::parse_mode")]
    pub parse_mode: String,

    /// Long-poll timeout for `getUpdates`
    #[serde(default = "defaults::poll_timeout")]
    pub poll_timeout_secs: u64,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            api_base: defaults::api_base(),
            parse_mode: defaults::parse_mode(),
            poll_timeout_secs: defaults::poll_timeout(),
        }
    }
}

/// Message templates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessagesConfig {
    /// Notification for one new course; see [`crate::models::Course::format`]
    #[serde(default = "defaults::msg_new_course")]
    pub new_course: String,

    /// Reply to `/start` and `/help`
    #[serde(default = "defaults::msg_welcome")]
    pub welcome: String,

    /// Reply sent when `/check` begins
    #[serde(default = "defaults::msg_check_started")]
    pub check_started: String,

    /// Reply sent when `/check` succeeds (`{count}` placeholder)
    #[serde(default = "defaults::msg_check_complete")]
    pub check_complete: String,

    /// Reply sent when `/check` fails (`{error}` placeholder)
    #[serde(default = "defaults::msg_check_failed")]
    pub check_failed: String,
}

impl MessagesConfig {
    /// All templates keyed by config name.
    pub fn entries(&self) -> [(&'static str, &str); 5] {
        [
            ("new_course", &self.new_course),
            ("welcome", &self.welcome),
            ("check_started", &self.check_started),
            ("check_complete", &self.check_complete),
            ("check_failed", &self.check_failed),
        ]
    }
}

/// First character MarkdownV2 reserves that `text` leaves unescaped outside
/// of formatting markup. Link targets in `[text](url)` are skipped.
fn unescaped_markdown_v2(text: &str) -> Option<char> {
    let mut chars = text.chars();
    let mut prev = None;
    let mut in_link_url = false;
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                chars.next();
                prev = None;
                continue;
            }
            '(' if prev == Some(']') => in_link_url = true,
            ')' if in_link_url => in_link_url = false,
            '.' | '!' | '#' | '+' | '-' | '=' | '(' | ')' if !in_link_url => return Some(c),
            _ => {}
        }
        prev = Some(c);
    }
    None
}

impl Default for MessagesConfig {
    fn default() -> Self {
        Self {
            new_course: defaults::msg_new_course(),
            welcome: defaults::msg_welcome(),
            check_started: defaults::msg_check_started(),
            check_complete: defaults::msg_check_complete(),
            check_failed: defaults::msg_check_failed(),
        }
    }
}

/// Bot credentials, read once from the environment.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub bot_token: String,
    pub chat_id: String,
}

impl Credentials {
    pub const TOKEN_VAR: &'static str = "BOT_TOKEN";
    pub const CHAT_VAR: &'static str = "CHAT_ID";

    /// Read `BOT_TOKEN` and `CHAT_ID` from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build credentials from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let require = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or_else(|| AppError::config(format!("environment variable {key} is not set")))
        };

        Ok(Self {
            bot_token: require(Self::TOKEN_VAR)?,
            chat_id: require(Self::CHAT_VAR)?,
        })
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("bot_token", &"<redacted>")
            .field("chat_id", &self.chat_id)
            .finish()
    }
}

mod defaults {
    use std::path::PathBuf;

    // Source defaults
    pub fn source_url() -> String {
        "https://academy.binance.com/es/learn-and-earn?utm_source=binance_announce".into()
    }
    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; academy-watch/0.1)".into()
    }
    pub fn timeout() -> u64 {
        30
    }

    // Schedule defaults
    pub fn interval() -> u64 {
        3600
    }
    pub fn retry() -> u64 {
        15
    }

    // Storage defaults
    pub fn snapshot_file() -> PathBuf {
        PathBuf::from("binance_courses.json")
    }

    // Telegram defaults
    pub fn api_base() -> String {
        "https://api.telegram.org".into()
    }
    pub fn parse_mode() -> String {
        "Markdown".into()
    }
    pub fn poll_timeout() -> u64 {
        30
    }

    // Message defaults
    pub fn msg_new_course() -> String {
        "*New course available:*\n\n\
         *Title:* {title}\n\
         *Description:* {description}\n\
         *Status:* {status}\n\
         *Link:* {link}"
            .into()
    }
    pub fn msg_welcome() -> String {
        "Welcome to the Binance Learn and Earn bot. Use /check to look for new courses manually."
            .into()
    }
    pub fn msg_check_started() -> String {
        "Checking Binance Learn and Earn courses...".into()
    }
    pub fn msg_check_complete() -> String {
        "Manual check complete: {count} new course(s).".into()
    }
    pub fn msg_check_failed() -> String {
        "Manual check failed: {error}".into()
    }
}
