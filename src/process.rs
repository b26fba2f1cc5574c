use std::io;
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use tracing::debug;

/// How long a launched program must survive before we consider it started.
const LAUNCH_GRACE: Duration = Duration::from_millis(300);
const LAUNCH_POLL: Duration = Duration::from_millis(50);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchOutcome {
    /// Still running once the grace period elapsed.
    Running,
    /// Exited within the grace period; `None` when killed by a signal.
    Exited(Option<i32>),
}

impl LaunchOutcome {
    pub fn is_failure(self) -> bool {
        matches!(self, LaunchOutcome::Exited(code) if code != Some(0))
    }
}

/// Seam over spawning external programs (virsh, virt-manager, wmctrl, notify-send).
pub trait CommandRunner: Send + Sync {
    /// Run `program` to completion and capture its output.
    fn run(&self, program: &str, args: &[String]) -> io::Result<CommandOutput>;

    /// Start `program` without waiting for it to finish.
    fn launch(&self, program: &str, args: &[String]) -> io::Result<LaunchOutcome>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, program: &str, args: &[String]) -> io::Result<CommandOutput> {
        debug!(program, ?args, "Running command");
        let output = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .output()?;
        Ok(CommandOutput {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    fn launch(&self, program: &str, args: &[String]) -> io::Result<LaunchOutcome> {
        debug!(program, ?args, "Launching command");
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;

        let started = Instant::now();
        while started.elapsed() < LAUNCH_GRACE {
            if let Some(status) = child.try_wait()? {
                return Ok(LaunchOutcome::Exited(status.code()));
            }
            thread::sleep(LAUNCH_POLL);
        }

        // Reap the child whenever it exits so it does not linger as a zombie.
        thread::spawn(move || {
            let _ = child.wait();
        });
        Ok(LaunchOutcome::Running)
    }
}
