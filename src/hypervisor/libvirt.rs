use tracing::{debug, info, warn};
use virt::connect::Connect;
use virt::domain::Domain;
use virt::sys;

use super::Hypervisor;
use crate::errors::{VirtrayError, VirtrayResult};
use crate::models::PowerState;

/// Native libvirt connection, held for the lifetime of the tray.
pub struct LibvirtHypervisor {
    uri: String,
    connection: Connect,
}

impl LibvirtHypervisor {
    pub fn connect(uri: &str) -> VirtrayResult<Self> {
        info!(uri = %uri, "Connecting to libvirt");
        let connection =
            Connect::open(Some(uri)).map_err(|e| VirtrayError::DaemonUnavailable {
                uri: uri.to_string(),
                reason: e.to_string(),
            })?;
        info!("Connected to libvirt");
        Ok(Self {
            uri: uri.to_string(),
            connection,
        })
    }

    fn state_from_libvirt(state: sys::virDomainState) -> PowerState {
        match state {
            sys::VIR_DOMAIN_RUNNING => PowerState::Running,
            sys::VIR_DOMAIN_PAUSED => PowerState::Paused,
            sys::VIR_DOMAIN_SHUTOFF => PowerState::ShutOff,
            _ => PowerState::Other,
        }
    }
}

impl Hypervisor for LibvirtHypervisor {
    type Domain = Domain;

    fn uri(&self) -> &str {
        &self.uri
    }

    fn lookup(&self, name: &str) -> VirtrayResult<Domain> {
        Domain::lookup_by_name(&self.connection, name).map_err(|e| {
            VirtrayError::DomainNotFound {
                domain: name.to_string(),
                reason: e.to_string(),
            }
        })
    }

    fn power_state(&self, domain: &Domain) -> VirtrayResult<PowerState> {
        let (state, _reason) = domain
            .get_state()
            .map_err(|e| VirtrayError::Hypervisor(e.to_string()))?;
        Ok(Self::state_from_libvirt(state))
    }

    fn start(&self, domain: &Domain) -> VirtrayResult<()> {
        domain
            .create()
            .map(|_| ())
            .map_err(|e| VirtrayError::Hypervisor(e.to_string()))
    }

    fn destroy(&self, domain: &Domain) -> VirtrayResult<()> {
        domain
            .destroy()
            .map(|_| ())
            .map_err(|e| VirtrayError::Hypervisor(e.to_string()))
    }

    fn save(&self, domain: &Domain) -> VirtrayResult<()> {
        domain
            .managed_save(0)
            .map(|_| ())
            .map_err(|e| VirtrayError::Hypervisor(e.to_string()))
    }

    fn has_saved_image(&self, domain: &Domain) -> VirtrayResult<bool> {
        domain
            .has_managed_save(0)
            .map_err(|e| VirtrayError::Hypervisor(e.to_string()))
    }

    fn restore(&self, domain: &Domain) -> VirtrayResult<()> {
        self.start(domain)
    }
}

impl Drop for LibvirtHypervisor {
    fn drop(&mut self) {
        debug!(uri = %self.uri, "Disconnecting from libvirt");
        if let Err(e) = self.connection.close() {
            warn!("Failed to disconnect from libvirt: {}", e);
        }
    }
}
