//! What happens when a reminder job matures
//!
//! The handler renders the notification, then re-reads the store and only
//! extends the chain if the slot is still wanted. That re-read is the
//! reconciliation point between the job chain and whatever the user changed
//! since the job was queued.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Local};
use std::fmt;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::reminder::JobPayload;
use crate::scheduler::Scheduler;
use crate::store::ReminderStore;
use crate::tag::JobTag;

/// Surface that shows a reminder to the user.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn render(&self, message: &str) -> Result<()>;
}

/// Why a firing did not queue its successor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    StoreUnavailable,
    ReminderMissing,
    ReminderDisabled,
    GloballyDisabled,
    WeekdayRemoved,
    RescheduleFailed,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Self::StoreUnavailable => "store could not be read",
            Self::ReminderMissing => "reminder no longer exists",
            Self::ReminderDisabled => "reminder is disabled",
            Self::GloballyDisabled => "reminders are globally disabled",
            Self::WeekdayRemoved => "weekday was removed from the reminder",
            Self::RescheduleFailed => "successor could not be enqueued",
        };
        f.write_str(reason)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FireOutcome {
    Rescheduled { fire_at: DateTime<Local> },
    /// The slot was re-armed while this job was firing; that job continues
    /// the chain.
    AlreadyArmed,
    Stopped(StopReason),
}

pub struct FireHandler {
    scheduler: Arc<Scheduler>,
    store: Arc<dyn ReminderStore>,
    notifier: Arc<dyn Notifier>,
}

impl FireHandler {
    pub fn new(scheduler: Arc<Scheduler>, store: Arc<dyn ReminderStore>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            scheduler,
            store,
            notifier,
        }
    }

    /// Render the payload, then queue next week's job if the slot is still live.
    pub async fn handle(&self, payload: &JobPayload) -> FireOutcome {
        let tag = JobTag::new(payload.reminder_id.clone(), payload.weekday);

        if let Err(e) = self.notifier.render(&payload.message).await {
            warn!("Failed to render reminder {}: {}", tag, e);
        }

        let outcome = self.extend_chain(payload);
        match &outcome {
            FireOutcome::Rescheduled { fire_at } => debug!("Reminder {} next fires at {}", tag, fire_at),
            FireOutcome::AlreadyArmed => debug!("Reminder {} already has a pending job", tag),
            FireOutcome::Stopped(reason) => info!("Reminder {} chain stopped: {}", tag, reason),
        }
        outcome
    }

    fn extend_chain(&self, payload: &JobPayload) -> FireOutcome {
        let snapshot = match self.store.snapshot() {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!("Could not re-read reminders after firing: {:#}", e);
                return FireOutcome::Stopped(StopReason::StoreUnavailable);
            }
        };

        let Some(reminder) = snapshot.reminders.iter().find(|r| r.id == payload.reminder_id) else {
            return FireOutcome::Stopped(StopReason::ReminderMissing);
        };
        if !reminder.is_enabled {
            return FireOutcome::Stopped(StopReason::ReminderDisabled);
        }
        if !snapshot.global_enabled {
            return FireOutcome::Stopped(StopReason::GloballyDisabled);
        }
        if !reminder.fires_on(payload.weekday) {
            return FireOutcome::Stopped(StopReason::WeekdayRemoved);
        }

        match self.scheduler.schedule_successor(reminder, payload.weekday) {
            Ok(Some(fire_at)) => FireOutcome::Rescheduled { fire_at },
            Ok(None) => FireOutcome::AlreadyArmed,
            Err(e) => {
                warn!("Failed to queue successor for {}: {}", reminder.id, e);
                FireOutcome::Stopped(StopReason::RescheduleFailed)
            }
        }
    }

    /// Handle matured payloads one at a time until the queue's channel closes.
    pub async fn run(&self, mut fired_rx: mpsc::Receiver<JobPayload>) {
        info!("Fire handler started");
        while let Some(payload) = fired_rx.recv().await {
            self.handle(&payload).await;
        }
        info!("Fire handler stopped: job channel closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::JobQueue;
    use crate::reminder::{Reminder, ReminderId};
    use crate::store::MemoryStore;
    use crate::test_support::{BrokenStore, FixedClock, RecordingNotifier, RecordingQueue, local};
    use crate::weekday::Weekday;

    struct Harness {
        handler: FireHandler,
        queue: Arc<RecordingQueue>,
        store: Arc<MemoryStore>,
        notifier: Arc<RecordingNotifier>,
    }

    fn harness(reminders: Vec<Reminder>, global_enabled: bool) -> Harness {
        harness_with(reminders, global_enabled, RecordingNotifier::default())
    }

    fn harness_with(reminders: Vec<Reminder>, global_enabled: bool, notifier: RecordingNotifier) -> Harness {
        let queue = Arc::new(RecordingQueue::default());
        // Monday 09:00, the moment r1's Monday job matures
        let clock = Arc::new(FixedClock::new(local(2024, 1, 1, 9, 0)));
        let scheduler = Arc::new(Scheduler::new(queue.clone()).with_clock(clock));
        let store = Arc::new(MemoryStore::new(reminders, global_enabled));
        let notifier = Arc::new(notifier);
        let handler = FireHandler::new(scheduler, store.clone(), notifier.clone());
        Harness {
            handler,
            queue,
            store,
            notifier,
        }
    }

    fn r1() -> Reminder {
        Reminder::new("r1", "Buy milk", "09:00", [1, 3])
    }

    fn monday_payload() -> JobPayload {
        JobPayload::for_reminder(&r1(), Weekday::MONDAY)
    }

    fn monday_tag() -> JobTag {
        JobTag::new(ReminderId::new("r1"), Weekday::MONDAY)
    }

    #[tokio::test]
    async fn test_fire_renders_and_queues_next_week() {
        let h = harness(vec![r1()], true);

        let outcome = h.handler.handle(&monday_payload()).await;

        assert_eq!(outcome, FireOutcome::Rescheduled { fire_at: local(2024, 1, 8, 9, 0) });
        assert_eq!(h.notifier.rendered(), vec!["Buy milk".to_string()]);
        assert_eq!(h.queue.pending(), vec![monday_tag()]);
    }

    #[tokio::test]
    async fn test_disabled_reminder_stops_chain() {
        let mut reminder = r1();
        reminder.is_enabled = false;
        let h = harness(vec![reminder], true);

        let outcome = h.handler.handle(&monday_payload()).await;

        assert_eq!(outcome, FireOutcome::Stopped(StopReason::ReminderDisabled));
        // The in-flight firing still renders once.
        assert_eq!(h.notifier.rendered().len(), 1);
        assert!(h.queue.pending().is_empty());
    }

    #[tokio::test]
    async fn test_global_toggle_off_stops_chain() {
        let h = harness(vec![r1()], false);
        let outcome = h.handler.handle(&monday_payload()).await;
        assert_eq!(outcome, FireOutcome::Stopped(StopReason::GloballyDisabled));
        assert!(h.queue.pending().is_empty());
    }

    #[tokio::test]
    async fn test_deleted_reminder_stops_chain() {
        let h = harness(Vec::new(), true);
        let outcome = h.handler.handle(&monday_payload()).await;
        assert_eq!(outcome, FireOutcome::Stopped(StopReason::ReminderMissing));
        assert!(h.queue.pending().is_empty());
    }

    #[tokio::test]
    async fn test_removed_weekday_stops_only_that_slot() {
        let h = harness(vec![r1()], true);
        // User edits r1 down to Wednesday only after Monday's job was queued
        h.store.update(|s| s.reminders[0].days_of_week = [3].into_iter().collect());

        let monday = h.handler.handle(&monday_payload()).await;
        let wednesday = h.handler.handle(&JobPayload::for_reminder(&r1(), Weekday::WEDNESDAY)).await;

        assert_eq!(monday, FireOutcome::Stopped(StopReason::WeekdayRemoved));
        assert!(matches!(wednesday, FireOutcome::Rescheduled { .. }));
        assert_eq!(h.queue.pending(), vec![JobTag::new(ReminderId::new("r1"), Weekday::WEDNESDAY)]);
    }

    #[tokio::test]
    async fn test_store_failure_stops_chain() {
        let queue = Arc::new(RecordingQueue::default());
        let scheduler = Arc::new(Scheduler::new(queue.clone()));
        let notifier = Arc::new(RecordingNotifier::default());
        let handler = FireHandler::new(scheduler, Arc::new(BrokenStore), notifier.clone());

        let outcome = handler.handle(&monday_payload()).await;

        assert_eq!(outcome, FireOutcome::Stopped(StopReason::StoreUnavailable));
        assert_eq!(notifier.rendered().len(), 1);
        assert!(queue.pending().is_empty());
    }

    #[tokio::test]
    async fn test_render_failure_still_extends_chain() {
        let h = harness_with(vec![r1()], true, RecordingNotifier::failing());
        let outcome = h.handler.handle(&monday_payload()).await;
        assert!(matches!(outcome, FireOutcome::Rescheduled { .. }));
    }

    #[tokio::test]
    async fn test_corrupt_time_at_fire_time_stops_chain() {
        let h = harness(vec![r1()], true);
        h.store.update(|s| s.reminders[0].time = "25:99".to_string());

        let outcome = h.handler.handle(&monday_payload()).await;
        assert_eq!(outcome, FireOutcome::Stopped(StopReason::RescheduleFailed));
    }

    #[tokio::test]
    async fn test_successor_message_comes_from_store() {
        let h = harness(vec![r1()], true);
        h.store.update(|s| s.reminders[0].message = "Buy oat milk".to_string());

        h.handler.handle(&monday_payload()).await;

        let payloads = h.queue.payloads_for(&monday_tag());
        assert_eq!(payloads[0].message, "Buy oat milk");
    }

    #[tokio::test]
    async fn test_edit_during_firing_keeps_one_job_per_slot() {
        let h = harness(vec![r1()], true);
        // Edit landed between maturity and handling: Monday re-armed at 20:00.
        h.store.update(|s| s.reminders[0].time = "20:00".to_string());
        let edited = h.store.snapshot().unwrap().reminders[0].clone();
        h.handler.scheduler.cancel(&edited.id);
        h.handler.scheduler.schedule(&edited);

        let outcome = h.handler.handle(&monday_payload()).await;

        assert_eq!(outcome, FireOutcome::AlreadyArmed);
        assert_eq!(h.queue.delays_for(&monday_tag()).len(), 1);
        assert_eq!(h.notifier.rendered().len(), 1);
    }

    #[tokio::test]
    async fn test_run_drains_channel_until_closed() {
        let h = harness(vec![r1()], true);
        let (tx, rx) = mpsc::channel(4);

        tx.send(monday_payload()).await.unwrap();
        tx.send(JobPayload::for_reminder(&r1(), Weekday::WEDNESDAY)).await.unwrap();
        drop(tx);

        h.handler.run(rx).await;

        assert_eq!(h.notifier.rendered().len(), 2);
        assert_eq!(h.queue.pending().len(), 2);
    }
}
