// src/models/mod.rs

//! Domain models for the course watcher.

mod config;
mod course;
mod selectors;

// Re-export all public types
pub use config::{
    Config, Credentials, DetectionConfig, DiffKey, MessagesConfig, ScheduleConfig, SourceConfig,
    StorageConfig, TelegramConfig,
};
pub use course::Course;
pub use selectors::CourseSelectors;
