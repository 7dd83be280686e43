//! Error types for reminder scheduling

use thiserror::Error;

use crate::tag::JobTag;

/// Errors raised inside the scheduler core.
///
/// None of these reach the user: the scheduler logs and absorbs them so one
/// corrupt reminder never blocks its siblings.
#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("invalid time of day: {0:?}")]
    InvalidTime(String),

    #[error("invalid weekday code: {0} (expected 1..=7)")]
    InvalidWeekday(u8),

    #[error("malformed job tag: {0:?}")]
    InvalidTag(String),

    #[error("refusing to enqueue {tag} with a non-positive delay")]
    PastDue { tag: JobTag },

    #[error("job queue is shut down")]
    QueueClosed,
}
