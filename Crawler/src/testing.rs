//! In-memory collaborators for unit tests.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::error::{AppError, Result};
use crate::models::Course;
use crate::services::{CourseSource, Notifier};
use crate::storage::SnapshotStore;

pub fn course(title: &str, status: &str) -> Course {
    Course::new(
        title,
        format!("About {title}"),
        status,
        format!("https://academy.binance.com/es/learn-and-earn/course/{}", title.to_lowercase()),
    )
}

/// Replays scripted fetch results, then keeps returning the last success.
#[derive(Default)]
pub struct ScriptedSource {
    script: Mutex<VecDeque<std::result::Result<Vec<Course>, String>>>,
    last: Mutex<Vec<Course>>,
    pub fetches: AtomicUsize,
}

impl ScriptedSource {
    pub fn new(script: Vec<std::result::Result<Vec<Course>, String>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            ..Self::default()
        }
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CourseSource for ScriptedSource {
    async fn fetch_courses(&self) -> Result<Vec<Course>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(Ok(courses)) => {
                *self.last.lock().unwrap() = courses.clone();
                Ok(courses)
            }
            Some(Err(message)) => Err(AppError::crawl("scripted", message)),
            None => Ok(self.last.lock().unwrap().clone()),
        }
    }
}

/// Records every message; fails once `fail_after` messages were delivered.
#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<(String, String)>>,
    fail_after: Option<usize>,
}

impl RecordingNotifier {
    pub fn failing_after(delivered: usize) -> Self {
        Self {
            fail_after: Some(delivered),
            ..Self::default()
        }
    }

    pub fn messages(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, chat_id: &str, text: &str) -> Result<()> {
        let mut sent = self.sent.lock().unwrap();
        if self.fail_after.is_some_and(|limit| sent.len() >= limit) {
            return Err(AppError::telegram("sendMessage", "Forbidden: bot was blocked"));
        }
        sent.push((chat_id.to_string(), text.to_string()));
        Ok(())
    }
}

/// Snapshot kept in memory; `unreadable` makes every load fail.
#[derive(Default)]
pub struct MemoryStore {
    pub courses: Mutex<Option<Vec<Course>>>,
    pub saves: AtomicUsize,
    unreadable: bool,
}

impl MemoryStore {
    pub fn with(courses: Vec<Course>) -> Self {
        Self {
            courses: Mutex::new(Some(courses)),
            ..Self::default()
        }
    }

    pub fn failing_load() -> Self {
        Self {
            unreadable: true,
            ..Self::default()
        }
    }

    pub fn snapshot(&self) -> Option<Vec<Course>> {
        self.courses.lock().unwrap().clone()
    }

    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SnapshotStore for MemoryStore {
    async fn load(&self) -> Result<Vec<Course>> {
        if self.unreadable {
            return Err(AppError::Json(
                serde_json::from_str::<Vec<Course>>("not json").unwrap_err(),
            ));
        }
        Ok(self.snapshot().unwrap_or_default())
    }

    async fn save(&self, courses: &[Course]) -> Result<()> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        *self.courses.lock().unwrap() = Some(courses.to_vec());
        Ok(())
    }

    fn location(&self) -> String {
        "memory".to_string()
    }
}
