//! Change detection between the stored snapshot and a fresh fetch.
//!
//! A course is "new" when nothing in the previous snapshot matches it. With
//! the default [`DiffKey::Record`] policy a match needs all four fields equal,
//! so a course whose status text changes is reported again.

use std::collections::HashSet;

use crate::models::{Course, DiffKey};

/// Calculator for finding courses absent from a previous snapshot.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiffCalculator {
    key: DiffKey,
}

impl DiffCalculator {
    /// Create a calculator using full-record equality.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a calculator with the given matching policy.
    pub fn with_key(key: DiffKey) -> Self {
        Self { key }
    }

    pub(crate) fn key(&self) -> DiffKey {
        self.key
    }

    /// Courses in `current` with no match in `previous`, in `current` order.
    pub fn calculate(&self, previous: &[Course], current: &[Course]) -> Vec<Course> {
        match self.key {
            DiffKey::Record => {
                let known: HashSet<&Course> = previous.iter().collect();
                current
                    .iter()
                    .filter(|c| !known.contains(c))
                    .cloned()
                    .collect()
            }
            DiffKey::Link => {
                let known: HashSet<&str> = previous.iter().map(|c| c.link.as_str()).collect();
                current
                    .iter()
                    .filter(|c| !known.contains(c.link.as_str()))
                    .cloned()
                    .collect()
            }
        }
    }
}

/// Courses in `new` not structurally equal to any course in `old`.
pub fn diff(old: &[Course], new: &[Course]) -> Vec<Course> {
    DiffCalculator::new().calculate(old, new)
}
