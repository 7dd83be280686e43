//! Job tags: the key that identifies one (reminder, weekday) slot

use std::fmt;
use std::str::FromStr;

use crate::error::SchedulerError;
use crate::reminder::ReminderId;
use crate::weekday::Weekday;

/// Identifies the pending job for one (reminder, weekday) pair.
///
/// Distinct pairs always produce distinct tags. The display form
/// `"{reminder_id}_{weekday}"` parses back with [`FromStr`], splitting on the
/// last underscore so ids containing `_` survive.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JobTag {
    pub reminder_id: ReminderId,
    pub weekday: Weekday,
}

impl JobTag {
    pub fn new(reminder_id: ReminderId, weekday: Weekday) -> Self {
        Self { reminder_id, weekday }
    }

    /// Every tag a reminder could own, one per weekday.
    ///
    /// Cancellation sweeps all of these rather than the reminder's current
    /// weekday set, so slots left behind by an earlier edit are caught too.
    pub fn all_for(reminder_id: &ReminderId) -> [JobTag; 7] {
        Weekday::ALL.map(|day| JobTag::new(reminder_id.clone(), day))
    }
}

impl fmt::Display for JobTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.reminder_id, self.weekday)
    }
}

impl FromStr for JobTag {
    type Err = SchedulerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || SchedulerError::InvalidTag(s.to_string());

        let (id, day) = s.rsplit_once('_').ok_or_else(invalid)?;
        if id.is_empty() {
            return Err(invalid());
        }
        let code: u8 = day.parse().map_err(|_| invalid())?;
        let weekday = Weekday::from_code(code).map_err(|_| invalid())?;

        Ok(JobTag::new(ReminderId::new(id), weekday))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_tag_display_and_parse() {
        let tag = JobTag::new(ReminderId::new("r1"), Weekday::WEDNESDAY);
        assert_eq!(tag.to_string(), "r1_3");
        assert_eq!("r1_3".parse::<JobTag>().unwrap(), tag);
    }

    #[test]
    fn test_parse_keeps_underscores_in_id() {
        let tag: JobTag = "weekly_shop_7".parse().unwrap();
        assert_eq!(tag.reminder_id.as_str(), "weekly_shop");
        assert_eq!(tag.weekday, Weekday::SUNDAY);
    }

    #[test]
    fn test_parse_rejects_malformed() {
        for bad in ["", "r1", "r1_", "_3", "r1_0", "r1_8", "r1_x"] {
            assert!(bad.parse::<JobTag>().is_err(), "accepted {:?}", bad);
        }
    }

    #[test]
    fn test_all_for_covers_every_weekday_once() {
        let id = ReminderId::new("0b6d7c1e-3e1f-4d1a-9a53-2c1a0f0e9d11");
        let tags = JobTag::all_for(&id);

        let days: HashSet<_> = tags.iter().map(|t| t.weekday).collect();
        assert_eq!(days.len(), 7);
        assert!(tags.iter().all(|t| t.reminder_id == id));
    }

    #[test]
    fn test_distinct_pairs_never_collide() {
        let ids = ["a", "a_1", "a_12", "1", "b"];
        let mut seen = HashSet::new();
        for id in ids {
            for tag in JobTag::all_for(&ReminderId::new(id)) {
                assert!(seen.insert(tag.to_string()), "collision on {}", tag);
            }
        }
    }
}
