//! Service layer for the course watcher.
//!
//! This module contains the collaborators behind the check cycle:
//! - Course fetching (`CourseCrawler`)
//! - Message delivery and bot polling (`TelegramClient`)
//! - Bot command handling (`BotListener`)

mod commands;
mod courses;
mod telegram;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::Course;

pub use commands::{BotListener, Command, bot_commands};
pub use courses::{CourseCrawler, extract_courses};
pub use telegram::{BotCommand, Chat, Message, TelegramClient, Update, User};

/// Source of the current course list.
#[async_trait]
pub trait CourseSource: Send + Sync {
    /// Fetch every course currently listed.
    async fn fetch_courses(&self) -> Result<Vec<Course>>;
}

/// Delivers formatted text to a destination.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, chat_id: &str, text: &str) -> Result<()>;
}

/// The bot operations the command listener relies on.
#[async_trait]
pub trait BotApi: Send + Sync {
    /// Long-poll for updates after `offset`.
    async fn poll(&self, offset: Option<i64>, timeout_secs: u64) -> Result<Vec<Update>>;

    /// Reply to `message` in its chat.
    async fn reply(&self, message: &Message, text: &str) -> Result<()>;
}
