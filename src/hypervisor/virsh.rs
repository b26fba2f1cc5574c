use std::sync::Arc;

use tracing::info;

use super::Hypervisor;
use crate::errors::{VirtrayError, VirtrayResult};
use crate::models::PowerState;
use crate::process::{CommandOutput, CommandRunner};

const VIRSH: &str = "virsh";

/// Drives the daemon through the `virsh` command line client.
pub struct VirshHypervisor {
    uri: String,
    runner: Arc<dyn CommandRunner>,
}

impl VirshHypervisor {
    /// Checks the daemon answers before handing out a connection.
    pub fn connect(uri: &str, runner: Arc<dyn CommandRunner>) -> VirtrayResult<Self> {
        info!(uri = %uri, "Connecting to hypervisor through virsh");
        let hypervisor = Self {
            uri: uri.to_string(),
            runner,
        };
        hypervisor
            .virsh(&["uri"])
            .map_err(|e| VirtrayError::DaemonUnavailable {
                uri: uri.to_string(),
                reason: e.to_string(),
            })?;
        Ok(hypervisor)
    }

    fn virsh(&self, args: &[&str]) -> VirtrayResult<CommandOutput> {
        let mut full = vec!["-c".to_string(), self.uri.clone()];
        full.extend(args.iter().map(|a| a.to_string()));

        let output = self.runner.run(VIRSH, &full)?;
        if !output.success {
            return Err(VirtrayError::Hypervisor(format!(
                "virsh {} failed: {}",
                args.join(" "),
                output.stderr.trim()
            )));
        }
        Ok(output)
    }

    fn parse_state(output: &str) -> PowerState {
        match output.trim() {
            "running" | "idle" | "in shutdown" => PowerState::Running,
            "paused" | "pmsuspended" => PowerState::Paused,
            "shut off" => PowerState::ShutOff,
            _ => PowerState::Other,
        }
    }

    /// Reads the `Managed save:` line of `virsh dominfo`.
    fn parse_managed_save(output: &str) -> bool {
        output
            .lines()
            .filter_map(|line| line.split_once(':'))
            .any(|(key, value)| key.trim() == "Managed save" && value.trim() == "yes")
    }
}

impl Hypervisor for VirshHypervisor {
    type Domain = String;

    fn uri(&self) -> &str {
        &self.uri
    }

    fn lookup(&self, name: &str) -> VirtrayResult<String> {
        self.virsh(&["domstate", name])
            .map(|_| name.to_string())
            .map_err(|e| VirtrayError::DomainNotFound {
                domain: name.to_string(),
                reason: e.to_string(),
            })
    }

    fn power_state(&self, domain: &String) -> VirtrayResult<PowerState> {
        let output = self.virsh(&["domstate", domain])?;
        Ok(Self::parse_state(&output.stdout))
    }

    fn start(&self, domain: &String) -> VirtrayResult<()> {
        self.virsh(&["start", domain]).map(|_| ())
    }

    fn destroy(&self, domain: &String) -> VirtrayResult<()> {
        self.virsh(&["destroy", domain]).map(|_| ())
    }

    fn save(&self, domain: &String) -> VirtrayResult<()> {
        self.virsh(&["managedsave", domain]).map(|_| ())
    }

    fn has_saved_image(&self, domain: &String) -> VirtrayResult<bool> {
        let output = self.virsh(&["dominfo", domain])?;
        Ok(Self::parse_managed_save(&output.stdout))
    }

    fn restore(&self, domain: &String) -> VirtrayResult<()> {
        self.start(domain)
    }
}
