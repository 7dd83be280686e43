//! Reminder definitions and the global toggle in a single JSON file

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use spisok_scheduler::{Reminder, ReminderId, ReminderStore, TimeOfDay, Weekday};

use crate::error::{Result, StoreError};

/// Longest reminder text accepted, in characters.
pub const MAX_MESSAGE_LEN: usize = 50;

/// On-disk layout. Field names match what the mobile app wrote, so an
/// exported preferences blob loads unchanged.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoreFile {
    #[serde(default)]
    notifications: Vec<Reminder>,
    #[serde(default = "default_enabled")]
    notifications_enabled: bool,
}

impl Default for StoreFile {
    fn default() -> Self {
        Self {
            notifications: Vec::new(),
            notifications_enabled: true,
        }
    }
}

fn default_enabled() -> bool {
    true
}

/// JSON-file reminder store.
///
/// Reads always hit the file so a running daemon sees edits made by other
/// processes. Writes replace the file atomically via a sibling temp file.
#[derive(Debug, Clone)]
pub struct JsonReminderStore {
    path: PathBuf,
}

impl JsonReminderStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<StoreFile> {
        if !self.path.exists() {
            debug!("Reminder store {:?} does not exist yet, using defaults", self.path);
            return Ok(StoreFile::default());
        }

        let content = std::fs::read_to_string(&self.path).map_err(|source| StoreError::Io {
            path: self.path.clone(),
            source,
        })?;
        if content.trim().is_empty() {
            return Ok(StoreFile::default());
        }

        let value: Value = serde_json::from_str(&content).map_err(|source| StoreError::Corrupt {
            path: self.path.clone(),
            source,
        })?;

        let notifications_enabled = value
            .get("notificationsEnabled")
            .and_then(Value::as_bool)
            .unwrap_or(true);

        // One bad entry must not hide the rest.
        let notifications = match value.get("notifications") {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|item| match serde_json::from_value::<Reminder>(item.clone()) {
                    Ok(reminder) => Some(reminder),
                    Err(e) => {
                        warn!("Skipping unreadable reminder entry in {:?}: {}", self.path, e);
                        None
                    }
                })
                .collect(),
            Some(Value::Null) | None => Vec::new(),
            Some(other) => {
                warn!("Ignoring malformed reminder list in {:?}: {}", self.path, other);
                Vec::new()
            }
        };

        Ok(StoreFile {
            notifications,
            notifications_enabled,
        })
    }

    fn write(&self, file: &StoreFile) -> Result<()> {
        let io_err = |source| StoreError::Io {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(io_err)?;
            }
        }

        let json = serde_json::to_string_pretty(file)?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json).map_err(io_err)?;
        std::fs::rename(&tmp, &self.path).map_err(io_err)?;

        debug!("Saved {} reminder(s) to {:?}", file.notifications.len(), self.path);
        Ok(())
    }

    /// Create a reminder. It starts enabled only if reminders are globally on.
    pub fn add(&self, message: &str, time: &str, days: &BTreeSet<u8>) -> Result<Reminder> {
        validate(message, time, days)?;

        let mut file = self.read()?;
        let reminder = Reminder {
            id: ReminderId::new(uuid::Uuid::new_v4().to_string()),
            message: message.trim().to_string(),
            time: time.trim().parse::<TimeOfDay>().map(|t| t.to_string()).unwrap_or_else(|_| time.to_string()),
            days_of_week: days.iter().map(|&d| i64::from(d)).collect(),
            is_enabled: file.notifications_enabled,
        };
        file.notifications.push(reminder.clone());
        self.write(&file)?;

        info!("Added reminder {} at {}", reminder.id, reminder.time);
        Ok(reminder)
    }

    /// Turn one reminder on or off. Turning on has no effect while reminders
    /// are globally off.
    pub fn set_enabled(&self, id: &ReminderId, enabled: bool) -> Result<Reminder> {
        let mut file = self.read()?;
        let global = file.notifications_enabled;

        let reminder = file
            .notifications
            .iter_mut()
            .find(|r| &r.id == id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;
        reminder.is_enabled = enabled && global;
        let updated = reminder.clone();

        self.write(&file)?;
        info!("Reminder {} is now {}", id, if updated.is_enabled { "enabled" } else { "disabled" });
        Ok(updated)
    }

    /// Delete reminders by id; returns how many were removed.
    pub fn delete(&self, ids: &[ReminderId]) -> Result<usize> {
        let mut file = self.read()?;
        let before = file.notifications.len();
        file.notifications.retain(|r| !ids.contains(&r.id));
        let removed = before - file.notifications.len();

        if removed > 0 {
            self.write(&file)?;
        }
        info!("Deleted {} reminder(s)", removed);
        Ok(removed)
    }

    pub fn set_global(&self, enabled: bool) -> Result<()> {
        let mut file = self.read()?;
        file.notifications_enabled = enabled;
        self.write(&file)?;
        info!("Reminders globally {}", if enabled { "enabled" } else { "disabled" });
        Ok(())
    }
}

impl ReminderStore for JsonReminderStore {
    fn load_reminders(&self) -> anyhow::Result<Vec<Reminder>> {
        Ok(self.read()?.notifications)
    }

    fn load_global_toggle(&self) -> anyhow::Result<bool> {
        Ok(self.read()?.notifications_enabled)
    }

    fn snapshot(&self) -> anyhow::Result<spisok_scheduler::Snapshot> {
        let file = self.read()?;
        Ok(spisok_scheduler::Snapshot {
            reminders: file.notifications,
            global_enabled: file.notifications_enabled,
        })
    }
}

/// Check user input before it is stored.
pub fn validate(message: &str, time: &str, days: &BTreeSet<u8>) -> Result<()> {
    let message = message.trim();
    if message.is_empty() {
        return Err(StoreError::Invalid("message must not be empty".to_string()));
    }
    let len = message.chars().count();
    if len > MAX_MESSAGE_LEN {
        return Err(StoreError::Invalid(format!(
            "message is {} characters, at most {} allowed",
            len, MAX_MESSAGE_LEN
        )));
    }

    time.trim()
        .parse::<TimeOfDay>()
        .map_err(|e| StoreError::Invalid(e.to_string()))?;

    if days.is_empty() {
        return Err(StoreError::Invalid("pick at least one weekday".to_string()));
    }
    for &code in days {
        Weekday::from_code(code).map_err(|e| StoreError::Invalid(e.to_string()))?;
    }

    Ok(())
}
