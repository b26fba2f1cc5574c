//! In-memory hypervisor for tests.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use super::Hypervisor;
use crate::errors::{VirtrayError, VirtrayResult};
use crate::models::PowerState;

#[derive(Default)]
pub struct FakeState {
    pub domains: HashMap<String, PowerState>,
    /// Domains holding a managed save image
    pub images: HashSet<String>,
    pub lookups: Vec<String>,
    pub starts: Vec<String>,
    pub fail_save: bool,
    pub fail_restore: bool,
}

/// Clones share state, so a test can keep one and hand the other to the registry.
#[derive(Clone, Default)]
pub struct FakeHypervisor {
    pub state: Arc<Mutex<FakeState>>,
}

impl FakeHypervisor {
    pub fn with_domains(domains: &[(&str, PowerState)]) -> Self {
        let fake = Self::default();
        {
            let mut state = fake.state.lock().unwrap();
            for (name, power) in domains {
                state.domains.insert(name.to_string(), *power);
            }
        }
        fake
    }

    pub fn power(&self, name: &str) -> Option<PowerState> {
        self.state.lock().unwrap().domains.get(name).copied()
    }

    pub fn set_power(&self, name: &str, power: PowerState) {
        self.state
            .lock()
            .unwrap()
            .domains
            .insert(name.to_string(), power);
    }

    pub fn remove(&self, name: &str) {
        self.state.lock().unwrap().domains.remove(name);
    }

    pub fn has_image(&self, name: &str) -> bool {
        self.state.lock().unwrap().images.contains(name)
    }

    pub fn add_image(&self, name: &str) {
        self.state.lock().unwrap().images.insert(name.to_string());
    }

    pub fn lookups(&self) -> Vec<String> {
        self.state.lock().unwrap().lookups.clone()
    }

    pub fn starts(&self) -> Vec<String> {
        self.state.lock().unwrap().starts.clone()
    }

    fn gone(name: &str) -> VirtrayError {
        VirtrayError::Hypervisor(format!("Domain not found: no domain with matching name '{}'", name))
    }
}

impl Hypervisor for FakeHypervisor {
    type Domain = String;

    fn uri(&self) -> &str {
        "test:///default"
    }

    fn lookup(&self, name: &str) -> VirtrayResult<String> {
        let mut state = self.state.lock().unwrap();
        state.lookups.push(name.to_string());
        if state.domains.contains_key(name) {
            Ok(name.to_string())
        } else {
            Err(VirtrayError::DomainNotFound {
                domain: name.to_string(),
                reason: "no domain with matching name".to_string(),
            })
        }
    }

    fn power_state(&self, domain: &String) -> VirtrayResult<PowerState> {
        self.power(domain).ok_or_else(|| Self::gone(domain))
    }

    fn start(&self, domain: &String) -> VirtrayResult<()> {
        let mut guard = self.state.lock().unwrap();
        let state = &mut *guard;
        state.starts.push(domain.clone());
        match state.domains.get_mut(domain) {
            Some(power) if power.is_active() => Err(VirtrayError::Hypervisor(
                "Requested operation is not valid: domain is already running".to_string(),
            )),
            Some(power) => {
                *power = PowerState::Running;
                // Like libvirt, starting a domain with a managed image resumes it.
                state.images.remove(domain);
                Ok(())
            }
            None => Err(Self::gone(domain)),
        }
    }

    fn destroy(&self, domain: &String) -> VirtrayResult<()> {
        let mut state = self.state.lock().unwrap();
        match state.domains.get_mut(domain) {
            Some(power) => {
                *power = PowerState::ShutOff;
                Ok(())
            }
            None => Err(Self::gone(domain)),
        }
    }

    fn save(&self, domain: &String) -> VirtrayResult<()> {
        let mut state = self.state.lock().unwrap();
        if state.fail_save {
            return Err(VirtrayError::Hypervisor("unable to write image".to_string()));
        }
        match state.domains.get_mut(domain) {
            Some(power) if *power == PowerState::Running => {
                *power = PowerState::ShutOff;
            }
            Some(_) => {
                return Err(VirtrayError::Hypervisor(
                    "Requested operation is not valid: domain is not running".to_string(),
                ))
            }
            None => return Err(Self::gone(domain)),
        }
        state.images.insert(domain.clone());
        Ok(())
    }

    fn has_saved_image(&self, domain: &String) -> VirtrayResult<bool> {
        let state = self.state.lock().unwrap();
        if !state.domains.contains_key(domain) {
            return Err(Self::gone(domain));
        }
        Ok(state.images.contains(domain))
    }

    fn restore(&self, domain: &String) -> VirtrayResult<()> {
        {
            let state = self.state.lock().unwrap();
            if state.fail_restore {
                return Err(VirtrayError::Hypervisor("image is corrupt".to_string()));
            }
        }
        self.start(domain)
    }
}
