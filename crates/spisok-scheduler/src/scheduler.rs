//! Scheduling and cancellation of weekly reminder jobs

use chrono::{DateTime, Local, TimeZone};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::error::SchedulerError;
use crate::queue::JobQueue;
use crate::recurrence::{next_fire_instant, successor_fire_instant};
use crate::reminder::{JobPayload, Reminder, ReminderId};
use crate::tag::JobTag;
use crate::timer::RecurringTimer;
use crate::weekday::Weekday;

/// Source of "now" in the device's local zone.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Local>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// Turns reminder definitions into pending jobs on a [`JobQueue`].
///
/// Every operation is synchronous: it only submits to or cancels on the
/// queue. Errors are logged and absorbed so one bad reminder never stops
/// the rest from being scheduled.
pub struct Scheduler {
    queue: Arc<dyn JobQueue>,
    clock: Arc<dyn Clock>,
}

impl Scheduler {
    pub fn new(queue: Arc<dyn JobQueue>) -> Self {
        Self {
            queue,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn now(&self) -> DateTime<Local> {
        self.clock.now()
    }

    /// Timer for one (reminder, weekday) slot.
    pub fn timer(&self, tag: JobTag) -> RecurringTimer<'_> {
        RecurringTimer::new(self.queue.as_ref(), tag)
    }

    /// Enqueue the next firing for every weekday of an enabled reminder.
    ///
    /// Returns the number of jobs enqueued. Callers must `cancel` first when
    /// re-scheduling an edited reminder; scheduling twice duplicates jobs.
    pub fn schedule(&self, reminder: &Reminder) -> usize {
        if !reminder.is_enabled {
            debug!("Reminder {} is disabled, not scheduling", reminder.id);
            return 0;
        }

        let time = match reminder.time_of_day() {
            Ok(time) => time,
            Err(e) => {
                warn!("Skipping reminder {}: {}", reminder.id, e);
                return 0;
            }
        };

        let (days, rejected) = reminder.weekdays();
        for code in rejected {
            warn!("Reminder {} has invalid weekday code {}, skipping it", reminder.id, code);
        }
        if days.is_empty() {
            warn!("Reminder {} has no valid weekdays", reminder.id);
            return 0;
        }

        let now = self.clock.now();
        let mut enqueued = 0;

        for day in days {
            let fire_at = next_fire_instant(time, day, &now);
            let timer = self.timer(JobTag::new(reminder.id.clone(), day));

            match timer.start(&fire_at, &now, JobPayload::for_reminder(reminder, day)) {
                Ok(()) => {
                    debug!("Scheduled {} for {}", timer.tag(), fire_at);
                    enqueued += 1;
                }
                Err(e) => warn!("Failed to schedule {}: {}", timer.tag(), e),
            }
        }

        enqueued
    }

    /// Cancel every slot the reminder could own, across all seven weekdays.
    pub fn cancel(&self, reminder_id: &ReminderId) {
        for tag in JobTag::all_for(reminder_id) {
            self.timer(tag).stop();
        }
        debug!("Cancelled all jobs for reminder {}", reminder_id);
    }

    /// Flush every pending job, then schedule each enabled reminder if the
    /// global toggle is on. Used at startup and when the toggle flips.
    pub fn reschedule_all(&self, reminders: &[Reminder], global_enabled: bool) -> usize {
        self.queue.cancel_all();

        if !global_enabled {
            info!("Reminders are globally disabled; all jobs cleared");
            return 0;
        }

        let enqueued: usize = reminders
            .iter()
            .filter(|r| r.is_enabled)
            .map(|r| self.schedule(r))
            .sum();

        info!("Rescheduled {} reminder(s) into {} job(s)", reminders.len(), enqueued);
        enqueued
    }

    /// Enqueue the following week's job for one slot after it has fired.
    ///
    /// Returns `Ok(None)` when the slot already has a pending job: an edit
    /// re-armed it between the job maturing and this call, and that job now
    /// carries the chain.
    pub fn schedule_successor(
        &self,
        reminder: &Reminder,
        weekday: Weekday,
    ) -> Result<Option<DateTime<Local>>, SchedulerError> {
        let time = reminder.time_of_day()?;
        let timer = self.timer(JobTag::new(reminder.id.clone(), weekday));
        if timer.is_active() {
            debug!("{} was re-armed while firing, not queuing a successor", timer.tag());
            return Ok(None);
        }

        let now = self.clock.now();
        let fire_at = successor_fire_instant(time, weekday, &now);
        timer.start(&fire_at, &now, JobPayload::for_reminder(reminder, weekday))?;
        Ok(Some(fire_at))
    }
}

/// Next fire instant of every slot `reminders` would schedule at `now`,
/// soonest first. Invalid times and weekdays are left out.
pub fn upcoming<Tz: TimeZone>(
    reminders: &[Reminder],
    global_enabled: bool,
    now: &DateTime<Tz>,
) -> Vec<(JobTag, DateTime<Tz>)> {
    if !global_enabled {
        return Vec::new();
    }

    let mut slots: Vec<_> = reminders
        .iter()
        .filter(|r| r.is_enabled)
        .filter_map(|r| r.time_of_day().ok().map(|time| (r, time)))
        .flat_map(|(r, time)| {
            let (days, _) = r.weekdays();
            days.into_iter()
                .map(move |day| (JobTag::new(r.id.clone(), day), next_fire_instant(time, day, now)))
        })
        .collect();

    slots.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
    slots
}
