//! Notifier that writes reminders to the log

use anyhow::Result;
use async_trait::async_trait;
use spisok_scheduler::Notifier;
use tracing::info;

/// Renders reminders as `info!` log lines, for headless machines.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn render(&self, message: &str) -> Result<()> {
        info!(target: "spisok::reminder", "Reminder: {}", message);
        Ok(())
    }
}
