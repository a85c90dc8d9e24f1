// src/pipeline/check.rs

//! The check cycle: fetch, diff against the snapshot, notify, persist.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use crate::error::Result;
use crate::models::{Config, Course, Credentials};
use crate::pipeline::DiffCalculator;
use crate::services::{CourseSource, Notifier};
use crate::storage::SnapshotStore;
use crate::utils::escape_markup;

/// Outcome of one completed check.
#[derive(Debug, Clone)]
pub struct CheckReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Number of courses on the page
    pub fetched: usize,
    /// Courses absent from the previous snapshot, in page order
    pub new_courses: Vec<Course>,
    /// Whether the snapshot was replaced
    pub saved: bool,
}

impl CheckReport {
    pub fn has_new(&self) -> bool {
        !self.new_courses.is_empty()
    }
}

/// Runs check cycles against one snapshot.
///
/// Cycles are serialized: a manual check waits for a scheduled one to finish
/// and vice versa, so the load-then-save on the snapshot never interleaves.
pub struct Watcher {
    source: Arc<dyn CourseSource>,
    store: Arc<dyn SnapshotStore>,
    notifier: Arc<dyn Notifier>,
    chat_id: String,
    template: String,
    parse_mode: String,
    diff: DiffCalculator,
    lock: Mutex<()>,
}

impl Watcher {
    pub fn new(
        config: &Config,
        credentials: &Credentials,
        source: Arc<dyn CourseSource>,
        store: Arc<dyn SnapshotStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            source,
            store,
            notifier,
            chat_id: credentials.chat_id.clone(),
            template: config.messages.new_course.clone(),
            parse_mode: config.telegram.parse_mode.clone(),
            diff: DiffCalculator::with_key(config.detection.key),
            lock: Mutex::new(()),
        }
    }

    /// Snapshot backend used by this watcher.
    pub fn store(&self) -> &dyn SnapshotStore {
        self.store.as_ref()
    }

    /// Run one check cycle.
    ///
    /// Any failure aborts the cycle before the snapshot is saved, so courses
    /// whose notification failed are announced again on the next cycle.
    pub async fn check(&self) -> Result<CheckReport> {
        let _guard = self.lock.lock().await;
        let started_at = Utc::now();

        let previous = self.store.load().await?;
        let current = self.source.fetch_courses().await?;
        let new_courses = self.diff.calculate(&previous, &current);

        let saved = if new_courses.is_empty() {
            log::info!(
                "No new courses ({} listed, {} known)",
                current.len(),
                previous.len()
            );
            false
        } else {
            log::info!(
                "Detected {} new course(s), sending notifications",
                new_courses.len()
            );
            for course in &new_courses {
                let message = self.render(course);
                self.notifier.notify(&self.chat_id, &message).await?;
                log::debug!("Notified: {}", course.title);
            }

            self.store.save(&current).await?;
            log::info!(
                "Snapshot of {} courses saved to {}",
                current.len(),
                self.store.location()
            );
            true
        };

        Ok(CheckReport {
            started_at,
            finished_at: Utc::now(),
            fetched: current.len(),
            new_courses,
            saved,
        })
    }

    /// Notification text for one course, with field values escaped.
    fn render(&self, course: &Course) -> String {
        let escape = |value: &str| escape_markup(&self.parse_mode, value);
        Course {
            title: escape(&course.title),
            description: escape(&course.description),
            status: escape(&course.status),
            link: escape(&course.link),
        }
        .format(&self.template)
    }
}
