//! Pipeline entry points for watcher operations.
//!
//! - `diff`: which fetched courses are new
//! - `Watcher::check`: one fetch → diff → notify → persist cycle
//! - `Scheduler`: periodic checks with a short retry after failures
//! - `run_service`: scheduler and bot listener together

pub mod check;
pub mod diff;
pub mod schedule;
pub mod service;

pub use check::{CheckReport, Watcher};
pub use diff::{DiffCalculator, diff};
pub use schedule::Scheduler;
pub use service::{build_watcher, run_service};
