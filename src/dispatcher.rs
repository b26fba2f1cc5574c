use tracing::{info, instrument, warn};

use crate::console::ConsoleLauncher;
use crate::errors::{ActionError, ActionFailure, VirtrayError};
use crate::hypervisor::Hypervisor;
use crate::models::{Action, BulkAction, VmState};
use crate::registry::{Binding, RegisteredVm, VmRegistry};

/// Carries out user-requested actions against the daemon or the console viewer.
/// Every failure comes back as an [`ActionError`]; nothing here panics or retries.
pub struct ActionDispatcher {
    console: ConsoleLauncher,
}

impl ActionDispatcher {
    pub fn new(console: ConsoleLauncher) -> Self {
        Self { console }
    }

    #[instrument(skip(self, registry), fields(domain))]
    pub fn perform<H: Hypervisor>(
        &self,
        registry: &VmRegistry<H>,
        index: usize,
        action: Action,
    ) -> Result<(), ActionError> {
        let vm = registry.get(index).ok_or_else(|| {
            ActionError::new(
                action,
                format!("#{}", index),
                ActionFailure::DomainUnavailable("no such entry".to_string()),
            )
        })?;
        tracing::Span::current().record("domain", vm.domain());

        self.perform_on(registry, vm, action)
            .map_err(|cause| ActionError::new(action, vm.domain(), cause))?;
        info!(%action, "Action completed");
        Ok(())
    }

    /// Applies `bulk` to every eligible domain, carrying on past failures.
    pub fn perform_all<H: Hypervisor>(
        &self,
        registry: &VmRegistry<H>,
        bulk: BulkAction,
    ) -> Vec<ActionError> {
        let wanted = match bulk {
            BulkAction::SaveAll => VmState::Running,
            BulkAction::RestoreAll => VmState::Saved,
        };
        let action = bulk.action();

        let mut errors = Vec::new();
        for (index, vm) in registry.vms().iter().enumerate() {
            if registry.state(vm) != Some(wanted) {
                continue;
            }
            if let Err(e) = self.perform(registry, index, action) {
                warn!("{}: {}", bulk.label(), e);
                errors.push(e);
            }
        }
        errors
    }

    fn perform_on<H: Hypervisor>(
        &self,
        registry: &VmRegistry<H>,
        vm: &RegisteredVm<H::Domain>,
        action: Action,
    ) -> Result<(), ActionFailure> {
        let handle = match &vm.binding {
            Binding::Resolved(handle) => handle,
            Binding::Disabled(reason) => {
                return Err(ActionFailure::DomainUnavailable(reason.clone()))
            }
        };
        let hypervisor = registry.hypervisor();

        match action {
            Action::Start => {
                if hypervisor.power_state(handle).map_err(daemon)?.is_active() {
                    return Err(ActionFailure::AlreadyRunning);
                }
                hypervisor.start(handle).map_err(daemon)
            }
            Action::ForceStop => {
                if !hypervisor.power_state(handle).map_err(daemon)?.is_active() {
                    return Err(ActionFailure::NotRunning);
                }
                hypervisor.destroy(handle).map_err(daemon)
            }
            Action::Save => {
                let state = registry
                    .status(vm)
                    .map(|status| status.map(|s| s.state()))
                    .transpose()
                    .map_err(daemon)?;
                if state != Some(VmState::Running) {
                    return Err(ActionFailure::SaveFailed(
                        "domain is not running".to_string(),
                    ));
                }
                hypervisor
                    .save(handle)
                    .map_err(|e| ActionFailure::SaveFailed(e.to_string()))?;
                info!("Domain saved");
                Ok(())
            }
            Action::Restore => {
                if !hypervisor.has_saved_image(handle).map_err(daemon)? {
                    return Err(ActionFailure::RestoreFailed("no saved image".to_string()));
                }
                if hypervisor.power_state(handle).map_err(daemon)?.is_active() {
                    return Err(ActionFailure::RestoreFailed(
                        "domain is already running".to_string(),
                    ));
                }
                hypervisor
                    .restore(handle)
                    .map_err(|e| ActionFailure::RestoreFailed(e.to_string()))?;
                info!("Domain restored");
                Ok(())
            }
            Action::OpenConsole => self
                .console
                .open(vm.domain())
                .map_err(ActionFailure::ConsoleLaunchFailed),
        }
    }
}

fn daemon(e: VirtrayError) -> ActionFailure {
    ActionFailure::Hypervisor(e.to_string())
}
