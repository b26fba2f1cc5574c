//! Access to the virtualization daemon.
//!
//! The daemon's API is fixed: connect, lookup a domain by name, read its state,
//! start, destroy, managed save and restore. [`Hypervisor`] is that API; the registry and
//! dispatcher only talk to it through this trait.

use crate::errors::VirtrayResult;
use crate::models::PowerState;

#[cfg(feature = "libvirt")]
mod libvirt;
mod virsh;

#[cfg(test)]
pub mod fake;

#[cfg(feature = "libvirt")]
pub use libvirt::LibvirtHypervisor;
pub use virsh::VirshHypervisor;

pub trait Hypervisor: Send + 'static {
    /// Backend-specific handle to one domain.
    type Domain: Send;

    fn uri(&self) -> &str;

    /// Fails with `DomainNotFound` when the daemon does not know `name`.
    fn lookup(&self, name: &str) -> VirtrayResult<Self::Domain>;

    fn power_state(&self, domain: &Self::Domain) -> VirtrayResult<PowerState>;

    fn start(&self, domain: &Self::Domain) -> VirtrayResult<()>;

    /// Immediate, non-graceful power off.
    fn destroy(&self, domain: &Self::Domain) -> VirtrayResult<()>;

    /// Managed save: the daemon writes the domain's memory to its own save
    /// image and stops it.
    fn save(&self, domain: &Self::Domain) -> VirtrayResult<()>;

    fn has_saved_image(&self, domain: &Self::Domain) -> VirtrayResult<bool>;

    /// Resume from the managed save image. The daemon consumes the image, and
    /// a plain start of a domain with an image resumes it the same way.
    fn restore(&self, domain: &Self::Domain) -> VirtrayResult<()>;
}
