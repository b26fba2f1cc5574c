use tracing::{debug, info, warn};

use crate::errors::VirtrayResult;
use crate::hypervisor::Hypervisor;
use crate::models::{VmEntry, VmState, VmStatus};

/// What a configured entry resolved to at startup.
pub enum Binding<D> {
    Resolved(D),
    /// The daemon did not know the domain; stays disabled until restart.
    Disabled(String),
}

pub struct RegisteredVm<D> {
    pub entry: VmEntry,
    pub binding: Binding<D>,
}

impl<D> RegisteredVm<D> {
    pub fn domain(&self) -> &str {
        &self.entry.domain
    }

    pub fn handle(&self) -> Option<&D> {
        match &self.binding {
            Binding::Resolved(handle) => Some(handle),
            Binding::Disabled(_) => None,
        }
    }
}

/// Owns the daemon connection and one binding per configured entry.
pub struct VmRegistry<H: Hypervisor> {
    // Declared before the hypervisor so domain handles are released first.
    vms: Vec<RegisteredVm<H::Domain>>,
    hypervisor: H,
}

impl<H: Hypervisor> VmRegistry<H> {
    /// Resolves every entry exactly once, in configuration order. Unknown
    /// domains are kept as disabled entries rather than dropped.
    pub fn new(hypervisor: H, entries: Vec<VmEntry>) -> Self {
        let vms = entries
            .into_iter()
            .map(|entry| {
                let binding = match hypervisor.lookup(&entry.domain) {
                    Ok(handle) => {
                        debug!(domain = %entry.domain, "Domain resolved");
                        Binding::Resolved(handle)
                    }
                    Err(e) => {
                        warn!(domain = %entry.domain, "Domain unavailable: {}", e);
                        Binding::Disabled(e.to_string())
                    }
                };
                RegisteredVm { entry, binding }
            })
            .collect::<Vec<_>>();

        let resolved = vms.iter().filter(|vm| vm.handle().is_some()).count();
        info!(
            uri = %hypervisor.uri(),
            resolved,
            disabled = vms.len() - resolved,
            "Registry ready"
        );

        Self { vms, hypervisor }
    }

    pub fn hypervisor(&self) -> &H {
        &self.hypervisor
    }

    pub fn vms(&self) -> &[RegisteredVm<H::Domain>] {
        &self.vms
    }

    pub fn get(&self, index: usize) -> Option<&RegisteredVm<H::Domain>> {
        self.vms.get(index)
    }

    pub fn len(&self) -> usize {
        self.vms.len()
    }

    /// Live reading of a resolved domain; always goes to the daemon.
    pub fn status(&self, vm: &RegisteredVm<H::Domain>) -> Option<VirtrayResult<VmStatus>> {
        let handle = vm.handle()?;
        let status = self.hypervisor.power_state(handle).and_then(|power| {
            Ok(VmStatus {
                power,
                saved_image: self.hypervisor.has_saved_image(handle)?,
            })
        });
        Some(status)
    }

    /// `None` for disabled entries; `Unknown` when the daemon query fails.
    pub fn state(&self, vm: &RegisteredVm<H::Domain>) -> Option<VmState> {
        match self.status(vm)? {
            Ok(status) => Some(status.state()),
            Err(e) => {
                warn!(domain = %vm.domain(), "Failed to read domain state: {}", e);
                Some(VmState::Unknown)
            }
        }
    }
}
