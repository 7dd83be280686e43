//! Weekly recurrence as a chain of one-shot jobs
//!
//! A [`RecurringTimer`] owns one (reminder, weekday) slot. Each `start` arms
//! the next link; the fire handler arms the following one after a firing.

use chrono::{DateTime, TimeZone};

use crate::error::SchedulerError;
use crate::queue::JobQueue;
use crate::reminder::JobPayload;
use crate::tag::JobTag;

pub struct RecurringTimer<'a> {
    queue: &'a dyn JobQueue,
    tag: JobTag,
}

impl<'a> RecurringTimer<'a> {
    pub fn new(queue: &'a dyn JobQueue, tag: JobTag) -> Self {
        Self { queue, tag }
    }

    pub fn tag(&self) -> &JobTag {
        &self.tag
    }

    /// Arm the next firing at `fire_at`, measured from `now`.
    pub fn start<Tz: TimeZone>(
        &self,
        fire_at: &DateTime<Tz>,
        now: &DateTime<Tz>,
        payload: JobPayload,
    ) -> Result<(), SchedulerError> {
        let past_due = || SchedulerError::PastDue { tag: self.tag.clone() };

        let delay = fire_at
            .clone()
            .signed_duration_since(now)
            .to_std()
            .map_err(|_| past_due())?;
        self.queue.enqueue(self.tag.clone(), delay, payload)
    }

    /// Cancel any pending firing for this slot.
    pub fn stop(&self) {
        self.queue.cancel(&self.tag);
    }

    pub fn is_active(&self) -> bool {
        self.queue.is_pending(&self.tag)
    }
}
