mod api;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use api::{Api, Handler};
use clap::Parser;
use tracing::info;
use uuid::Uuid;
use world_core::{MemoryDatabase, ModuleHost, World, WorldConfig};
use world_types::Address;

/// Default NATS server URL.
const DEFAULT_NATS_URL: &str = "nats://localhost:4222";

/// The environment variable used to override the NATS URL.
const NATS_URL_ENV: &str = "NATS_URL";

/// Address the in-process module host is attached at.
const HOST_EXECUTOR: Address = Address(1);

#[derive(Parser)]
#[command(name = "world-server", about = "ECS world registry and dispatch over NATS")]
struct Args {
    /// NATS server URL (falls back to $NATS_URL, then nats://localhost:4222)
    #[arg(short, long)]
    nats_url: Option<String>,

    /// NATS subject prefix
    #[arg(short, long, default_value = "world")]
    prefix: String,

    /// Path to a JSON world configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address granted the Admin role at genesis
    #[arg(short, long)]
    admin: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => WorldConfig::default(),
    };
    info!(
        name = %config.name,
        address = %config.address,
        policy = ?config.collision_policy,
        max_call_depth = config.max_call_depth,
        "world configuration"
    );

    // Create world
    let host = Arc::new(ModuleHost::new());
    let mut world = World::new(config, MemoryDatabase::new(), HOST_EXECUTOR, host.clone());
    let builtins = world_builtin::install(&mut world, &host)?;
    info!(route_auth = %builtins.route_auth, grant_role = %builtins.grant_role, "builtins ready");

    if let Some(admin) = args.admin {
        world_builtin::grant_role(&mut world, Address(admin), "Admin")
            .context("granting genesis admin")?;
        info!(admin = %Address(admin), "genesis admin granted");
    }

    // Connect to NATS
    let url = args
        .nats_url
        .or_else(|| std::env::var(NATS_URL_ENV).ok())
        .unwrap_or_else(|| DEFAULT_NATS_URL.to_string());
    info!(url = %url, "connecting to NATS");
    let client = async_nats::connect(&url)
        .await
        .with_context(|| format!("connecting to {url}"))?;
    info!("connected to NATS");

    let instance_id = Uuid::new_v4().to_string();
    info!(instance_id = %instance_id, "starting API");

    let mut api = Api::new(Handler::new(world, instance_id), client, args.prefix);
    api.run().await
}

fn load_config(path: &Path) -> Result<WorldConfig> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    let config = serde_json::from_str(&text)
        .with_context(|| format!("parsing config {}", path.display()))?;
    Ok(config)
}
