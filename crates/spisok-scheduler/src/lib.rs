//! spisok-scheduler - Weekly reminder scheduling
//!
//! This crate provides functionality for:
//! - Computing the next local fire instant of a (time, weekday) slot
//! - Tagging jobs per (reminder, weekday) for targeted cancellation
//! - Scheduling, cancelling and rebuilding reminder jobs on a delayed-job queue
//! - Handling matured jobs: render, re-validate against the store, extend the chain

pub mod error;
pub mod fire;
pub mod queue;
pub mod reconcile;
pub mod recurrence;
pub mod reminder;
pub mod scheduler;
pub mod store;
pub mod tag;
pub mod timer;
pub mod weekday;

#[cfg(test)]
mod test_support;

pub use error::SchedulerError;
pub use fire::{FireHandler, FireOutcome, Notifier, StopReason};
pub use queue::{JobQueue, TokioJobQueue};
pub use reconcile::{ReconcileReport, reconcile};
pub use recurrence::{next_fire_instant, successor_fire_instant};
pub use reminder::{JobPayload, Reminder, ReminderId};
pub use scheduler::{Clock, Scheduler, SystemClock, upcoming};
pub use store::{MemoryStore, ReminderStore, Snapshot};
pub use tag::JobTag;
pub use timer::RecurringTimer;
pub use weekday::{TimeOfDay, Weekday};
