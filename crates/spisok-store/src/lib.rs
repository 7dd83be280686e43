//! Persistent reminder storage for spisok
//!
//! Holds the reminder definitions and the global on/off switch, and the
//! editing operations the reminder screens perform on them.

pub mod error;
pub mod json;

pub use error::StoreError;
pub use json::{JsonReminderStore, MAX_MESSAGE_LEN, validate};
