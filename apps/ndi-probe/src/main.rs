use anyhow::{Context, Result};
use clap::Parser;
use ndi_runtime::{
    CandidatePaths, DiscoveryConfig, NdiBridge, PLATFORM_FALLBACK_DIRS, Resolver, SystemLoader,
};
use std::{fs, path::PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "ndi-probe",
    about = "Load the NDI runtime, start discovery and list the sources it finds"
)]
struct Args {
    /// Directory checked before the system lib dirs (overrides $NDI_RUNTIME_DIR_V5).
    #[arg(long)]
    runtime_dir: Option<PathBuf>,

    /// Discovery settings as JSON (defaults to <config dir>/ndi-bridge/discovery.json).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Extra addresses to query, passed to the runtime as-is.
    #[arg(long)]
    extra_ips: Option<String>,

    /// Group filter.
    #[arg(long)]
    groups: Option<String>,

    /// Do not list sources running on this machine.
    #[arg(long)]
    hide_local: bool,

    /// How long to wait for sources to show up.
    #[arg(long, default_value_t = 2000)]
    wait_ms: u32,
}

fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("ndi-bridge").join("discovery.json"))
}

/// Explicit `--config` must be readable; the default location is optional.
fn load_config(explicit: Option<&PathBuf>) -> Result<DiscoveryConfig> {
    let path = match explicit {
        Some(p) => p.clone(),
        None => match default_config_path().filter(|p| p.is_file()) {
            Some(p) => p,
            None => return Ok(DiscoveryConfig::default()),
        },
    };

    let bytes = fs::read(&path).with_context(|| format!("read {}", path.display()))?;
    serde_json::from_slice(&bytes).with_context(|| format!("parse {}", path.display()))
}

fn apply_overrides(mut config: DiscoveryConfig, args: &Args) -> DiscoveryConfig {
    if let Some(ips) = &args.extra_ips {
        config.extra_ips = ips.clone();
    }
    if args.groups.is_some() {
        config.groups = args.groups.clone();
    }
    if args.hide_local {
        config.show_local_sources = false;
    }
    config
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let config = apply_overrides(load_config(args.config.as_ref())?, &args);

    let candidates = match &args.runtime_dir {
        Some(dir) => CandidatePaths::from_parts(Some(dir.clone()), PLATFORM_FALLBACK_DIRS),
        None => CandidatePaths::from_env(),
    };
    let resolver = Resolver::new(candidates, SystemLoader);

    let mut bridge = match NdiBridge::start_with(&resolver, &config) {
        Ok(b) => b,
        Err(e) => {
            eprintln!("{}", e.remediation());
            return Err(e).context("NDI startup failed");
        }
    };

    println!(
        "runtime: {} ({})",
        bridge.library().path().display(),
        bridge.library().version().unwrap_or_else(|| "unknown version".into())
    );

    let sources = bridge
        .discovery()
        .map(|finder| finder.sources(args.wait_ms))
        .unwrap_or_default();
    info!(count = sources.len(), "discovery finished");

    if sources.is_empty() {
        println!("no NDI sources found");
    }
    for s in &sources {
        match &s.url_address {
            Some(addr) => println!("{}  [{}]", s.name, addr),
            None => println!("{}", s.name),
        }
    }

    bridge.teardown();
    Ok(())
}
