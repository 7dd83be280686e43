//! Read-only view of the persisted reminder definitions

use anyhow::Result;
use std::sync::RwLock;

use crate::reminder::Reminder;

/// Where reminder definitions and the global toggle live.
///
/// The scheduler only ever reads through this trait; edits happen elsewhere
/// and the scheduler sees them on its next read.
pub trait ReminderStore: Send + Sync {
    fn load_reminders(&self) -> Result<Vec<Reminder>>;

    fn load_global_toggle(&self) -> Result<bool>;

    fn snapshot(&self) -> Result<Snapshot> {
        Ok(Snapshot {
            reminders: self.load_reminders()?,
            global_enabled: self.load_global_toggle()?,
        })
    }
}

/// Reminder list and global toggle as read at one moment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub reminders: Vec<Reminder>,
    pub global_enabled: bool,
}

impl Default for Snapshot {
    fn default() -> Self {
        Self {
            reminders: Vec::new(),
            global_enabled: true,
        }
    }
}

/// A [`ReminderStore`] held in memory, for embedding and tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<Snapshot>,
}

impl MemoryStore {
    pub fn new(reminders: Vec<Reminder>, global_enabled: bool) -> Self {
        Self {
            state: RwLock::new(Snapshot { reminders, global_enabled }),
        }
    }

    pub fn update<F: FnOnce(&mut Snapshot)>(&self, f: F) {
        let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
        f(&mut *state);
    }
}

impl ReminderStore for MemoryStore {
    fn load_reminders(&self) -> Result<Vec<Reminder>> {
        Ok(self.state.read().unwrap_or_else(|e| e.into_inner()).reminders.clone())
    }

    fn load_global_toggle(&self) -> Result<bool> {
        Ok(self.state.read().unwrap_or_else(|e| e.into_inner()).global_enabled)
    }
}
