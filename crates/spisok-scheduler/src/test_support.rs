//! Test doubles shared by the unit tests

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::{DateTime, Local, TimeDelta, TimeZone};
use std::sync::Mutex;
use std::time::Duration;

use crate::error::SchedulerError;
use crate::fire::Notifier;
use crate::queue::JobQueue;
use crate::reminder::{JobPayload, Reminder};
use crate::scheduler::Clock;
use crate::store::ReminderStore;
use crate::tag::JobTag;

pub fn local(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Local> {
    Local.with_ymd_and_hms(y, m, d, h, min, 0).single().unwrap()
}

#[derive(Debug, Clone)]
pub struct Enqueued {
    pub tag: JobTag,
    pub delay: Duration,
    pub payload: JobPayload,
}

/// A [`JobQueue`] that only records what it was asked to do.
#[derive(Default)]
pub struct RecordingQueue {
    pending: Mutex<Vec<Enqueued>>,
    cancelled: Mutex<Vec<JobTag>>,
    cancel_all_calls: Mutex<usize>,
}

impl RecordingQueue {
    pub fn delays_for(&self, tag: &JobTag) -> Vec<Duration> {
        self.entries_for(tag).into_iter().map(|e| e.delay).collect()
    }

    pub fn payloads_for(&self, tag: &JobTag) -> Vec<JobPayload> {
        self.entries_for(tag).into_iter().map(|e| e.payload).collect()
    }

    pub fn fire_times_for(&self, tag: &JobTag, now: DateTime<Local>) -> Vec<DateTime<Local>> {
        self.delays_for(tag)
            .into_iter()
            .map(|delay| now + TimeDelta::from_std(delay).unwrap())
            .collect()
    }

    pub fn cancelled_tags(&self) -> Vec<JobTag> {
        self.cancelled.lock().unwrap().clone()
    }

    pub fn cancel_all_calls(&self) -> usize {
        *self.cancel_all_calls.lock().unwrap()
    }

    fn entries_for(&self, tag: &JobTag) -> Vec<Enqueued> {
        self.pending
            .lock()
            .unwrap()
            .iter()
            .filter(|e| &e.tag == tag)
            .cloned()
            .collect()
    }
}

impl JobQueue for RecordingQueue {
    fn enqueue(&self, tag: JobTag, delay: Duration, payload: JobPayload) -> Result<(), SchedulerError> {
        if delay.is_zero() {
            return Err(SchedulerError::PastDue { tag });
        }
        self.pending.lock().unwrap().push(Enqueued { tag, delay, payload });
        Ok(())
    }

    fn cancel(&self, tag: &JobTag) {
        self.cancelled.lock().unwrap().push(tag.clone());
        self.pending.lock().unwrap().retain(|e| &e.tag != tag);
    }

    fn cancel_all(&self) {
        *self.cancel_all_calls.lock().unwrap() += 1;
        self.pending.lock().unwrap().clear();
    }

    fn is_pending(&self, tag: &JobTag) -> bool {
        self.pending.lock().unwrap().iter().any(|e| &e.tag == tag)
    }

    fn pending(&self) -> Vec<JobTag> {
        let mut tags: Vec<JobTag> = self.pending.lock().unwrap().iter().map(|e| e.tag.clone()).collect();
        tags.sort();
        tags
    }
}

pub struct FixedClock {
    now: Mutex<DateTime<Local>>,
}

impl FixedClock {
    pub fn new(now: DateTime<Local>) -> Self {
        Self { now: Mutex::new(now) }
    }

    pub fn advance_minutes(&self, minutes: i64) {
        *self.now.lock().unwrap() += TimeDelta::minutes(minutes);
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Local> {
        *self.now.lock().unwrap()
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    rendered: Mutex<Vec<String>>,
    fail: bool,
}

impl RecordingNotifier {
    pub fn failing() -> Self {
        Self {
            rendered: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn rendered(&self) -> Vec<String> {
        self.rendered.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn render(&self, message: &str) -> Result<()> {
        self.rendered.lock().unwrap().push(message.to_string());
        if self.fail {
            return Err(anyhow!("notification surface unavailable"));
        }
        Ok(())
    }
}

/// A store whose reads always fail.
pub struct BrokenStore;

impl ReminderStore for BrokenStore {
    fn load_reminders(&self) -> Result<Vec<Reminder>> {
        Err(anyhow!("reminders file is corrupt"))
    }

    fn load_global_toggle(&self) -> Result<bool> {
        Err(anyhow!("reminders file is corrupt"))
    }
}
