//! Desktop notification banner via the platform's notification command

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use spisok_scheduler::Notifier;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, warn};

const NOTIFY_TIMEOUT: Duration = Duration::from_secs(30);

/// Shows reminders as desktop notifications.
///
/// macOS goes through `osascript`, other unix desktops through
/// `notify-send`.
pub struct DesktopNotifier {
    title: String,
}

impl DesktopNotifier {
    pub fn new(title: impl Into<String>) -> Self {
        Self { title: title.into() }
    }

    /// Sanitize a string for safe use in AppleScript.
    fn escape_applescript(s: &str) -> String {
        s.replace('\\', "\\\\")
            .replace('"', "\\\"")
            .replace('\n', " ")
            .replace('\r', " ")
            .chars()
            .filter(|&c| c >= ' ' || c == '\t')
            .collect()
    }

    fn command(&self, message: &str) -> Command {
        if cfg!(target_os = "macos") {
            let script = format!(
                r#"display notification "{}" with title "{}""#,
                Self::escape_applescript(message),
                Self::escape_applescript(&self.title),
            );
            let mut cmd = Command::new("osascript");
            cmd.arg("-e").arg(script);
            cmd
        } else {
            let mut cmd = Command::new("notify-send");
            cmd.arg("--app-name=spisok").arg(&self.title).arg(message);
            cmd
        }
    }
}

impl Default for DesktopNotifier {
    fn default() -> Self {
        Self::new("Reminder")
    }
}

#[async_trait]
impl Notifier for DesktopNotifier {
    async fn render(&self, message: &str) -> Result<()> {
        debug!("Showing desktop notification: {}", message);

        let output = tokio::time::timeout(NOTIFY_TIMEOUT, self.command(message).output())
            .await
            .map_err(|_| anyhow!("Notification command timed out"))?
            .map_err(|e| anyhow!("Failed to run notification command: {}", e))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!("Notification command failed: {}", stderr);
            return Err(anyhow!("Notification command failed: {}", stderr.trim()));
        }

        Ok(())
    }
}
