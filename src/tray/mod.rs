//! Tray menu: a view model rebuilt from live domain state on every render,
//! and the StatusNotifierItem adapter that displays it.

mod notify;
mod status_notifier;

pub use notify::{DesktopNotifier, Notifier};
pub use status_notifier::VirtTray;

use tracing::{error, info};

use crate::dispatcher::ActionDispatcher;
use crate::hypervisor::Hypervisor;
use crate::models::{Action, BulkAction, VmState};
use crate::registry::{Binding, VmRegistry};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryStatus {
    Ready(VmState),
    Disabled(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionView {
    pub action: Action,
    pub enabled: bool,
}

/// One configured domain as it should appear in the menu right now.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryView {
    pub index: usize,
    pub domain: String,
    pub icon: String,
    pub status: EntryStatus,
    pub actions: Vec<ActionView>,
}

impl EntryView {
    pub fn label(&self) -> String {
        match &self.status {
            EntryStatus::Ready(state) => format!("{} ({})", self.domain, state),
            EntryStatus::Disabled(_) => format!("{} (unavailable)", self.domain),
        }
    }
}

pub struct TrayPresenter<H: Hypervisor> {
    registry: VmRegistry<H>,
    dispatcher: ActionDispatcher,
    notifier: Box<dyn Notifier>,
}

impl<H: Hypervisor> TrayPresenter<H> {
    pub fn new(
        registry: VmRegistry<H>,
        dispatcher: ActionDispatcher,
        notifier: Box<dyn Notifier>,
    ) -> Self {
        Self {
            registry,
            dispatcher,
            notifier,
        }
    }

    /// Number of configured entries, resolved or not.
    pub fn domain_count(&self) -> usize {
        self.registry.len()
    }

    /// Queries every resolved domain; nothing is cached between calls.
    pub fn render(&self) -> Vec<EntryView> {
        let mut views = Vec::with_capacity(self.registry.len());
        for (index, vm) in self.registry.vms().iter().enumerate() {
            let status = match &vm.binding {
                Binding::Resolved(_) => {
                    EntryStatus::Ready(self.registry.state(vm).unwrap_or(VmState::Unknown))
                }
                Binding::Disabled(reason) => EntryStatus::Disabled(reason.clone()),
            };
            let actions = Action::ALL
                .iter()
                .map(|&action| ActionView {
                    action,
                    enabled: match &status {
                        EntryStatus::Ready(state) => state.allows(action),
                        EntryStatus::Disabled(_) => false,
                    },
                })
                .collect();
            views.push(EntryView {
                index,
                domain: vm.domain().to_string(),
                icon: vm.entry.icon.clone(),
                status,
                actions,
            });
        }
        views
    }

    pub fn trigger(&mut self, index: usize, action: Action) {
        let Some(vm) = self.registry.get(index) else {
            return;
        };
        let domain = vm.domain().to_string();
        if action != Action::OpenConsole {
            self.notifier.notify(&format!("{} {}", action.verb(), domain));
        }

        match self.dispatcher.perform(&self.registry, index, action) {
            Ok(()) => {
                if action != Action::OpenConsole {
                    self.notifier
                        .notify(&format!("{}: {} finished", domain, action.label()));
                }
            }
            Err(e) => {
                error!("{}", e);
                self.notifier.error(&e.to_string());
            }
        }
    }

    pub fn trigger_all(&mut self, bulk: BulkAction) {
        info!("{}", bulk.label());
        self.notifier.notify(bulk.label());
        let errors = self.dispatcher.perform_all(&self.registry, bulk);
        for e in &errors {
            self.notifier.error(&e.to_string());
        }
        if errors.is_empty() {
            self.notifier
                .notify(&format!("{} finished", bulk.label()));
        }
    }
}
