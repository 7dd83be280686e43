//! Reminder definitions as persisted by the store, and the job payload

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use crate::error::SchedulerError;
use crate::weekday::{TimeOfDay, Weekday};

/// Opaque, stable reminder identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReminderId(String);

impl ReminderId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ReminderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ReminderId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// A user-defined weekly reminder.
///
/// Fields keep their stored representation (`time` as `"HH:mm"`, weekdays
/// as raw integers of any size) because the store may hold data the
/// scheduler has to skip rather than refuse to load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reminder {
    pub id: ReminderId,
    pub message: String,
    pub time: String,
    pub days_of_week: BTreeSet<i64>,
    #[serde(default = "default_enabled")]
    pub is_enabled: bool,
}

fn default_enabled() -> bool {
    true
}

impl Reminder {
    pub fn new(
        id: impl Into<ReminderId>,
        message: impl Into<String>,
        time: impl Into<String>,
        days_of_week: impl IntoIterator<Item = i64>,
    ) -> Self {
        Self {
            id: id.into(),
            message: message.into(),
            time: time.into(),
            days_of_week: days_of_week.into_iter().collect(),
            is_enabled: true,
        }
    }

    pub fn time_of_day(&self) -> Result<TimeOfDay, SchedulerError> {
        self.time.parse()
    }

    /// Whether the stored weekday set still contains `day`.
    pub fn fires_on(&self, day: Weekday) -> bool {
        self.days_of_week.contains(&i64::from(day.code()))
    }

    /// Split the stored weekday codes into valid weekdays and rejected codes.
    pub fn weekdays(&self) -> (Vec<Weekday>, Vec<i64>) {
        let mut valid = Vec::with_capacity(self.days_of_week.len());
        let mut rejected = Vec::new();
        for &code in &self.days_of_week {
            match u8::try_from(code).ok().and_then(|c| Weekday::from_code(c).ok()) {
                Some(day) => valid.push(day),
                None => rejected.push(code),
            }
        }
        (valid, rejected)
    }
}

impl From<String> for ReminderId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// What a matured job hands to the fire handler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobPayload {
    pub reminder_id: ReminderId,
    pub weekday: Weekday,
    pub message: String,
}

impl JobPayload {
    pub fn for_reminder(reminder: &Reminder, weekday: Weekday) -> Self {
        Self {
            reminder_id: reminder.id.clone(),
            weekday,
            message: reminder.message.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reminder_serialization_uses_store_field_names() {
        let reminder = Reminder::new("r1", "Buy milk", "09:00", [1, 3]);
        let json = serde_json::to_value(&reminder).unwrap();

        assert_eq!(json["id"], "r1");
        assert_eq!(json["daysOfWeek"], serde_json::json!([1, 3]));
        assert_eq!(json["isEnabled"], true);
    }

    #[test]
    fn test_missing_enabled_flag_defaults_to_true() {
        let json = r#"{"id":"r2","message":"Bread","time":"18:30","daysOfWeek":[5]}"#;
        let reminder: Reminder = serde_json::from_str(json).unwrap();
        assert!(reminder.is_enabled);
        assert!(reminder.fires_on(Weekday::FRIDAY));
        assert!(!reminder.fires_on(Weekday::MONDAY));
    }

    #[test]
    fn test_weekdays_splits_out_invalid_codes() {
        let reminder = Reminder::new("r3", "Eggs", "07:15", [0, 2, 7, 9, -1, 300]);
        let (valid, rejected) = reminder.weekdays();
        assert_eq!(valid, vec![Weekday::TUESDAY, Weekday::SUNDAY]);
        assert_eq!(rejected, vec![-1, 0, 9, 300]);
    }

    #[test]
    fn test_out_of_range_codes_do_not_break_loading() {
        let json = r#"{"id":"r5","message":"Milk","time":"09:00","daysOfWeek":[1,-1,300]}"#;
        let reminder: Reminder = serde_json::from_str(json).unwrap();
        assert!(reminder.fires_on(Weekday::MONDAY));
        assert_eq!(reminder.weekdays().0, vec![Weekday::MONDAY]);
    }

    #[test]
    fn test_time_of_day_reports_malformed_time() {
        let reminder = Reminder::new("r4", "Tea", "soon", [1]);
        assert!(reminder.time_of_day().is_err());
    }
}
