//! Apply a change in the stored reminders to the scheduler
//!
//! Given the snapshot the scheduler last acted on and the one just read,
//! issue the same calls an editing screen would: a global toggle flip
//! rebuilds everything, otherwise each added, edited or deleted reminder is
//! cancelled and/or scheduled on its own.

use std::collections::HashMap;
use tracing::debug;

use crate::reminder::{Reminder, ReminderId};
use crate::scheduler::Scheduler;
use crate::store::Snapshot;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// The global toggle changed and every job was rebuilt.
    pub full_flush: bool,
    /// Jobs enqueued.
    pub scheduled: usize,
    /// Reminders whose slots were cancelled.
    pub cancelled: usize,
}

pub fn reconcile(scheduler: &Scheduler, previous: &Snapshot, next: &Snapshot) -> ReconcileReport {
    if previous.global_enabled != next.global_enabled {
        let scheduled = scheduler.reschedule_all(&next.reminders, next.global_enabled);
        return ReconcileReport {
            full_flush: true,
            scheduled,
            cancelled: 0,
        };
    }

    let mut report = ReconcileReport::default();
    let before: HashMap<&ReminderId, &Reminder> = previous.reminders.iter().map(|r| (&r.id, r)).collect();
    let after: HashMap<&ReminderId, &Reminder> = next.reminders.iter().map(|r| (&r.id, r)).collect();

    for reminder in &next.reminders {
        match before.get(&reminder.id) {
            Some(old) if *old == reminder => continue,
            Some(_) => {
                debug!("Reminder {} changed, rescheduling", reminder.id);
                scheduler.cancel(&reminder.id);
                report.cancelled += 1;
            }
            None => debug!("Reminder {} added", reminder.id),
        }

        if next.global_enabled {
            report.scheduled += scheduler.schedule(reminder);
        }
    }

    for id in before.keys().filter(|id| !after.contains_key(*id)) {
        debug!("Reminder {} deleted", id);
        scheduler.cancel(id);
        report.cancelled += 1;
    }

    report
}
