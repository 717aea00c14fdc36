//! Desktop notification side-channel.
//!
//! Best-effort `notify-send` wrapper: failures are logged at debug and
//! otherwise ignored, and the call never blocks the pipeline.

use tracing::debug;

/// Fire-and-forget desktop notifier.
#[derive(Debug, Clone)]
pub struct Notifier {
    enabled: bool,
}

impl Notifier {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    /// Pop a desktop notification for a newly surfaced subject.
    pub fn notify(&self, subject: &str) {
        if !self.enabled {
            return;
        }
        let subject = subject.to_string();
        tokio::spawn(async move {
            let result = tokio::process::Command::new("notify-send")
                .arg("Incoming emails")
                .arg(&subject)
                .output()
                .await;
            if let Err(e) = result {
                debug!(error = %e, "notify-send failed");
            }
        });
    }
}
