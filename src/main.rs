use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use ksni::TrayMethods;
use tokio::sync::Notify;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod config;
mod console;
mod dispatcher;
mod errors;
mod hypervisor;
mod models;
mod process;
mod registry;
mod tray;

use config::{Backend, Config};
use console::ConsoleLauncher;
use dispatcher::ActionDispatcher;
use hypervisor::{Hypervisor, VirshHypervisor};
use process::{CommandRunner, SystemRunner};
use registry::VmRegistry;
use tray::{DesktopNotifier, TrayPresenter, VirtTray};

/// Tray menu for libvirt domains
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// Configuration file [default: ./config.toml, then ~/.config/virtray/config.toml]
    config: Option<PathBuf>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    info!("Starting Virtray");

    let config_path = Config::resolve_path(cli.config);
    let config = Config::load(&config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;
    info!(path = %config_path.display(), domains = config.items.len(), "Configuration loaded");

    let runner: Arc<dyn CommandRunner> = Arc::new(SystemRunner);
    connect_and_run(config, runner).await?;

    info!("Virtray shutdown complete");
    Ok(())
}

async fn connect_and_run(config: Config, runner: Arc<dyn CommandRunner>) -> Result<()> {
    match config.backend {
        Backend::Libvirt => run_libvirt(config, runner).await,
        Backend::Virsh => {
            let hypervisor = VirshHypervisor::connect(&config.uri, runner.clone())?;
            run(hypervisor, config, runner).await
        }
    }
}

#[cfg(feature = "libvirt")]
async fn run_libvirt(config: Config, runner: Arc<dyn CommandRunner>) -> Result<()> {
    let hypervisor = hypervisor::LibvirtHypervisor::connect(&config.uri)?;
    run(hypervisor, config, runner).await
}

#[cfg(not(feature = "libvirt"))]
async fn run_libvirt(_config: Config, _runner: Arc<dyn CommandRunner>) -> Result<()> {
    anyhow::bail!("built without libvirt support; set backend = \"virsh\" in the configuration")
}

/// Builds the tray on top of a live connection and blocks until the user quits.
async fn run<H: Hypervisor>(
    hypervisor: H,
    config: Config,
    runner: Arc<dyn CommandRunner>,
) -> Result<()> {
    let registry = VmRegistry::new(hypervisor, config.items);
    let console = ConsoleLauncher::new(runner.clone(), &config.uri, config.console);
    let presenter = TrayPresenter::new(
        registry,
        ActionDispatcher::new(console),
        Box::new(DesktopNotifier::new(runner)),
    );

    let quit = Arc::new(Notify::new());
    let tray = VirtTray::new(presenter, config.tray_icon, quit.clone());
    let _handle = tray
        .spawn()
        .await
        .context("Failed to register the tray icon")?;
    info!("System tray initialized");

    quit.notified().await;
    info!("Quit requested");
    Ok(())
}
