//! Canonical weekday codes and time-of-day values

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::SchedulerError;

/// A weekday in the canonical encoding used everywhere in spisok:
/// `1..=7` = Monday..Sunday.
///
/// Anything with a different numbering (chrono, platform calendars) is
/// translated at this boundary via [`Weekday::to_chrono`] and
/// [`Weekday::from_chrono`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Weekday(u8);

impl Weekday {
    pub const MONDAY: Weekday = Weekday(1);
    pub const TUESDAY: Weekday = Weekday(2);
    pub const WEDNESDAY: Weekday = Weekday(3);
    pub const THURSDAY: Weekday = Weekday(4);
    pub const FRIDAY: Weekday = Weekday(5);
    pub const SATURDAY: Weekday = Weekday(6);
    pub const SUNDAY: Weekday = Weekday(7);

    /// Every weekday, Monday first.
    pub const ALL: [Weekday; 7] = [
        Self::MONDAY,
        Self::TUESDAY,
        Self::WEDNESDAY,
        Self::THURSDAY,
        Self::FRIDAY,
        Self::SATURDAY,
        Self::SUNDAY,
    ];

    /// Validate a raw weekday code.
    pub fn from_code(code: u8) -> Result<Self, SchedulerError> {
        if (1..=7).contains(&code) {
            Ok(Weekday(code))
        } else {
            Err(SchedulerError::InvalidWeekday(code))
        }
    }

    pub fn code(self) -> u8 {
        self.0
    }

    pub fn to_chrono(self) -> chrono::Weekday {
        match self.0 {
            1 => chrono::Weekday::Mon,
            2 => chrono::Weekday::Tue,
            3 => chrono::Weekday::Wed,
            4 => chrono::Weekday::Thu,
            5 => chrono::Weekday::Fri,
            6 => chrono::Weekday::Sat,
            _ => chrono::Weekday::Sun,
        }
    }

    pub fn from_chrono(day: chrono::Weekday) -> Self {
        Weekday(day.number_from_monday() as u8)
    }

    pub fn short_name(self) -> &'static str {
        match self.0 {
            1 => "Mon",
            2 => "Tue",
            3 => "Wed",
            4 => "Thu",
            5 => "Fri",
            6 => "Sat",
            _ => "Sun",
        }
    }

    /// Days from Monday (0 for Monday, 6 for Sunday).
    pub(crate) fn days_from_monday(self) -> u32 {
        u32::from(self.0 - 1)
    }
}

impl TryFrom<u8> for Weekday {
    type Error = SchedulerError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        Weekday::from_code(code)
    }
}

impl From<Weekday> for u8 {
    fn from(day: Weekday) -> u8 {
        day.0
    }
}

impl fmt::Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Local wall-clock time of day, minute precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimeOfDay {
    hour: u8,
    minute: u8,
}

impl TimeOfDay {
    pub fn new(hour: u8, minute: u8) -> Result<Self, SchedulerError> {
        if hour > 23 || minute > 59 {
            return Err(SchedulerError::InvalidTime(format!("{:02}:{:02}", hour, minute)));
        }
        Ok(Self { hour, minute })
    }

    pub fn hour(self) -> u8 {
        self.hour
    }

    pub fn minute(self) -> u8 {
        self.minute
    }

    pub(crate) fn to_naive(self) -> chrono::NaiveTime {
        // Range is checked in the constructor, so this cannot fall back.
        chrono::NaiveTime::from_hms_opt(u32::from(self.hour), u32::from(self.minute), 0)
            .unwrap_or(chrono::NaiveTime::MIN)
    }
}

impl FromStr for TimeOfDay {
    type Err = SchedulerError;

    /// Parses the persisted `"HH:mm"` form. Single-digit fields (`"9:5"`)
    /// are accepted since older stores wrote them unpadded.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || SchedulerError::InvalidTime(s.to_string());

        let (hour, minute) = s.trim().split_once(':').ok_or_else(invalid)?;
        let hour: u8 = hour.parse().map_err(|_| invalid())?;
        let minute: u8 = minute.parse().map_err(|_| invalid())?;

        TimeOfDay::new(hour, minute).map_err(|_| invalid())
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weekday_codes_map_to_chrono() {
        assert_eq!(Weekday::MONDAY.to_chrono(), chrono::Weekday::Mon);
        assert_eq!(Weekday::SUNDAY.to_chrono(), chrono::Weekday::Sun);

        for day in Weekday::ALL {
            assert_eq!(Weekday::from_chrono(day.to_chrono()), day);
        }
    }

    #[test]
    fn test_weekday_rejects_out_of_range() {
        assert!(Weekday::from_code(0).is_err());
        assert!(Weekday::from_code(8).is_err());
        assert_eq!(Weekday::from_code(3).unwrap(), Weekday::WEDNESDAY);
    }

    #[test]
    fn test_weekday_serde_validates() {
        let day: Weekday = serde_json::from_str("5").unwrap();
        assert_eq!(day, Weekday::FRIDAY);
        assert!(serde_json::from_str::<Weekday>("9").is_err());
    }

    #[test]
    fn test_parse_time_of_day() {
        let time: TimeOfDay = "09:00".parse().unwrap();
        assert_eq!((time.hour(), time.minute()), (9, 0));

        let time: TimeOfDay = "7:5".parse().unwrap();
        assert_eq!(time.to_string(), "07:05");
    }

    #[test]
    fn test_parse_time_of_day_rejects_garbage() {
        for bad in ["", "9", "ab:cd", "24:00", "12:60", "-1:30", "12:30:00"] {
            assert!(bad.parse::<TimeOfDay>().is_err(), "accepted {:?}", bad);
        }
    }
}
