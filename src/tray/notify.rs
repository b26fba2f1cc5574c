use std::sync::Arc;

use tracing::debug;

use crate::process::CommandRunner;

const NOTIFY_SEND: &str = "notify-send";
const APP_NAME: &str = "Virtray";
const EXPIRE_MS: u32 = 3000;

/// Desktop notifications shown while the tray runs.
pub trait Notifier: Send {
    fn notify(&self, message: &str);
    fn error(&self, message: &str);
}

/// Sends notifications through `notify-send`. Delivery is best effort.
pub struct DesktopNotifier {
    runner: Arc<dyn CommandRunner>,
}

impl DesktopNotifier {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }

    fn send(&self, urgency: &str, message: &str) {
        let args = vec![
            format!("--app-name={}", APP_NAME),
            format!("--urgency={}", urgency),
            format!("--expire-time={}", EXPIRE_MS),
            APP_NAME.to_string(),
            message.to_string(),
        ];
        match self.runner.run(NOTIFY_SEND, &args) {
            Ok(output) if output.success => {}
            Ok(output) => debug!("notify-send failed: {}", output.stderr.trim()),
            Err(e) => debug!("notify-send unavailable: {}", e),
        }
    }
}

impl Notifier for DesktopNotifier {
    fn notify(&self, message: &str) {
        self.send("normal", message);
    }

    fn error(&self, message: &str) {
        self.send("critical", message);
    }
}
