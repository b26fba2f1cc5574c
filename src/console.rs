use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tracing::{debug, info};

use crate::config::ConsoleConfig;
use crate::process::CommandRunner;

const WMCTRL: &str = "wmctrl";
const FOCUS_ATTEMPTS: usize = 10;
const FOCUS_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Window {
    pub id: String,
    pub title: String,
}

/// Thin wrapper over `wmctrl`. Missing or failing wmctrl means "no windows".
pub struct WindowManager {
    runner: Arc<dyn CommandRunner>,
}

impl WindowManager {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }

    pub fn list_windows(&self) -> Vec<Window> {
        match self.runner.run(WMCTRL, &["-l".to_string()]) {
            Ok(output) if output.success => parse_window_list(&output.stdout),
            Ok(output) => {
                debug!("wmctrl -l failed: {}", output.stderr.trim());
                Vec::new()
            }
            Err(e) => {
                debug!("wmctrl unavailable: {}", e);
                Vec::new()
            }
        }
    }

    pub fn find(&self, title: &str) -> Option<Window> {
        self.list_windows().into_iter().find(|w| w.title == title)
    }

    pub fn raise(&self, window: &Window) -> bool {
        let args = ["-ia".to_string(), window.id.clone()];
        matches!(self.runner.run(WMCTRL, &args), Ok(output) if output.success)
    }
}

/// Each line is `<id> <desktop> <host> <title...>`.
fn parse_window_list(stdout: &str) -> Vec<Window> {
    stdout
        .lines()
        .filter_map(|line| {
            // Columns are separated by runs of spaces; the title may contain spaces itself.
            let mut rest = line.trim();
            let mut fields = Vec::with_capacity(3);
            for _ in 0..3 {
                let end = rest.find(char::is_whitespace)?;
                fields.push(&rest[..end]);
                rest = rest[end..].trim_start();
            }
            if rest.is_empty() {
                return None;
            }
            Some(Window {
                id: fields[0].to_string(),
                title: rest.to_string(),
            })
        })
        .collect()
}

/// Opens the external console viewer for a domain, or raises it if already open.
pub struct ConsoleLauncher {
    runner: Arc<dyn CommandRunner>,
    windows: WindowManager,
    uri: String,
    config: ConsoleConfig,
}

impl ConsoleLauncher {
    pub fn new(runner: Arc<dyn CommandRunner>, uri: &str, config: ConsoleConfig) -> Self {
        Self {
            windows: WindowManager::new(runner.clone()),
            runner,
            uri: uri.to_string(),
            config,
        }
    }

    pub fn window_title(&self, domain: &str) -> String {
        self.config.window_title.replace("{domain}", domain)
    }

    pub fn open(&self, domain: &str) -> Result<(), String> {
        let title = self.window_title(domain);
        if let Some(window) = self.windows.find(&title) {
            info!(domain, window = %window.id, "Console already open, raising it");
            self.windows.raise(&window);
            return Ok(());
        }

        let args = vec![
            format!("--connect={}", self.uri),
            format!("--show-domain-console={}", domain),
        ];
        let outcome = self
            .runner
            .launch(&self.config.command, &args)
            .map_err(|e| format!("cannot run {}: {}", self.config.command, e))?;
        if outcome.is_failure() {
            return Err(format!("{} exited with {:?}", self.config.command, outcome));
        }
        info!(domain, "Console launched");

        for _ in 0..FOCUS_ATTEMPTS {
            if let Some(window) = self.windows.find(&title) {
                self.windows.raise(&window);
                break;
            }
            thread::sleep(FOCUS_INTERVAL);
        }
        Ok(())
    }
}
