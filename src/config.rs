use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::warn;

use crate::errors::{VirtrayError, VirtrayResult};
use crate::models::VmEntry;

pub const DEFAULT_CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    Libvirt,
    Virsh,
}

impl Default for Backend {
    fn default() -> Self {
        if cfg!(feature = "libvirt") {
            Backend::Libvirt
        } else {
            Backend::Virsh
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default = "default_uri")]
    pub uri: String,
    #[serde(default)]
    pub backend: Backend,
    #[serde(default = "default_tray_icon")]
    pub tray_icon: String,
    #[serde(default)]
    pub console: ConsoleConfig,
    pub items: Vec<VmEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConsoleConfig {
    #[serde(default = "default_console_command")]
    pub command: String,
    /// Title of an open console window; `{domain}` is replaced by the domain name
    #[serde(default = "default_window_title")]
    pub window_title: String,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            command: default_console_command(),
            window_title: default_window_title(),
        }
    }
}

fn default_uri() -> String {
    "qemu:///system".to_string()
}

fn default_tray_icon() -> String {
    "virt-manager".to_string()
}

fn default_console_command() -> String {
    "virt-manager".to_string()
}

fn default_window_title() -> String {
    "{domain} on QEMU/KVM".to_string()
}

impl Config {
    pub fn load(path: &Path) -> VirtrayResult<Self> {
        if !path.exists() {
            return Err(VirtrayError::ConfigNotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> VirtrayResult<Self> {
        let config: Config =
            toml::from_str(content).map_err(|e| VirtrayError::ConfigMalformed(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> VirtrayResult<()> {
        let mut seen = HashSet::new();
        for (index, item) in self.items.iter().enumerate() {
            if item.domain.trim().is_empty() {
                return Err(VirtrayError::ConfigMalformed(format!(
                    "items[{}]: domain must not be empty",
                    index
                )));
            }
            if !seen.insert(item.domain.as_str()) {
                return Err(VirtrayError::ConfigMalformed(format!(
                    "items[{}]: domain {} is listed more than once",
                    index, item.domain
                )));
            }
        }
        if self.items.is_empty() {
            warn!("Configuration lists no domains");
        }
        Ok(())
    }

    /// Resolve which file to load: the explicit path if given, otherwise
    /// `config.toml` in the working directory, falling back to the user config dir.
    pub fn resolve_path(explicit: Option<PathBuf>) -> PathBuf {
        if let Some(path) = explicit {
            return path;
        }
        let local = PathBuf::from(DEFAULT_CONFIG_FILE);
        if local.exists() {
            return local;
        }
        match dirs::config_dir() {
            Some(dir) => {
                let user = dir.join("virtray").join(DEFAULT_CONFIG_FILE);
                if user.exists() {
                    user
                } else {
                    local
                }
            }
            None => local,
        }
    }
}
