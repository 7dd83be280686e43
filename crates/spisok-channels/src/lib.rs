//! Notification surfaces for spisok reminders
//!
//! Adapters implementing [`spisok_scheduler::Notifier`]: desktop banners
//! and a log-only fallback.

pub mod desktop;
pub mod log;

pub use desktop::DesktopNotifier;
pub use log::LogNotifier;

use serde::{Deserialize, Serialize};
use spisok_scheduler::Notifier;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Which notifier the daemon renders reminders with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotifierKind {
    #[default]
    Desktop,
    Log,
}

impl fmt::Display for NotifierKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotifierKind::Desktop => write!(f, "desktop"),
            NotifierKind::Log => write!(f, "log"),
        }
    }
}

impl FromStr for NotifierKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "desktop" => Ok(NotifierKind::Desktop),
            "log" => Ok(NotifierKind::Log),
            other => Err(anyhow::anyhow!("unknown notifier: {}", other)),
        }
    }
}

/// Create the notifier for `kind`
pub fn create_notifier(kind: NotifierKind) -> Arc<dyn Notifier> {
    match kind {
        NotifierKind::Desktop => Arc::new(DesktopNotifier::default()),
        NotifierKind::Log => Arc::new(LogNotifier),
    }
}
