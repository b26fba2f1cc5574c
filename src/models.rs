use std::fmt;

use serde::Deserialize;

/// One configured VM: the libvirt domain name and the icon shown next to it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VmEntry {
    pub icon: String,
    pub domain: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Start,
    ForceStop,
    Save,
    Restore,
    OpenConsole,
}

impl Action {
    pub const ALL: [Action; 5] = [
        Action::Start,
        Action::ForceStop,
        Action::Save,
        Action::Restore,
        Action::OpenConsole,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Action::Start => "Start",
            Action::ForceStop => "Force Shutdown",
            Action::Save => "Save",
            Action::Restore => "Restore",
            Action::OpenConsole => "Open Console",
        }
    }

    /// Progressive verb used in notifications ("starting web1").
    pub fn verb(self) -> &'static str {
        match self {
            Action::Start => "starting",
            Action::ForceStop => "force shutting down",
            Action::Save => "saving",
            Action::Restore => "restoring",
            Action::OpenConsole => "opening console of",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BulkAction {
    SaveAll,
    RestoreAll,
}

impl BulkAction {
    pub fn label(self) -> &'static str {
        match self {
            BulkAction::SaveAll => "Save All",
            BulkAction::RestoreAll => "Restore All",
        }
    }

    pub fn action(self) -> Action {
        match self {
            BulkAction::SaveAll => Action::Save,
            BulkAction::RestoreAll => Action::Restore,
        }
    }
}

/// Power state as reported by the hypervisor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerState {
    Running,
    Paused,
    ShutOff,
    Other,
}

impl PowerState {
    pub fn is_active(self) -> bool {
        matches!(self, PowerState::Running | PowerState::Paused)
    }
}

/// A live reading of one domain. Never kept past a single render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VmStatus {
    pub power: PowerState,
    pub saved_image: bool,
}

impl VmStatus {
    pub fn state(&self) -> VmState {
        match self.power {
            PowerState::Running => VmState::Running,
            PowerState::Paused => VmState::Paused,
            PowerState::ShutOff if self.saved_image => VmState::Saved,
            PowerState::ShutOff => VmState::ShutOff,
            PowerState::Other => VmState::Unknown,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VmState {
    Running,
    Paused,
    Saved,
    ShutOff,
    Unknown,
}

impl VmState {
    /// Whether the menu should offer `action` for a domain in this state.
    pub fn allows(self, action: Action) -> bool {
        match action {
            Action::Start => matches!(self, VmState::ShutOff | VmState::Saved),
            Action::ForceStop => matches!(self, VmState::Running | VmState::Paused),
            Action::Save => self == VmState::Running,
            Action::Restore => self == VmState::Saved,
            Action::OpenConsole => true,
        }
    }
}

impl fmt::Display for VmState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            VmState::Running => "running",
            VmState::Paused => "paused",
            VmState::Saved => "saved",
            VmState::ShutOff => "shut off",
            VmState::Unknown => "unknown",
        };
        f.write_str(s)
    }
}
