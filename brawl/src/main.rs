//! Brawl combat engine host.
//!
//! Reads JSON RPC requests from stdin, one per line, and writes one JSON
//! reply per request to stdout. Logs go to stderr.
//!
//! ```bash
//! echo '{"rpc": "load_game", "user_id": "u-1"}' | cargo run -p brawl
//! ```

mod host;

use anyhow::Context;
use brawl_core::{EngineConfig, GameService, JsonFileStore, RpcRouter};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();
    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_help();
        return Ok(());
    }

    let mut config = EngineConfig::from_env().context("reading configuration")?;
    if let Some(dir) = arg_value(&args, "--data-dir") {
        config = config.with_data_dir(dir);
    }
    if let Some(seed) = arg_value(&args, "--seed") {
        let seed = seed.parse::<u64>().with_context(|| format!("invalid --seed value {seed:?}"))?;
        config = config.with_dice_seed(seed);
    }

    tracing::info!(
        environment = %config.environment,
        data_dir = %config.data_dir.display(),
        "starting brawl"
    );

    let store = Arc::new(JsonFileStore::new(&config.data_dir));
    let service = GameService::bootstrap(config, store)
        .await
        .context("loading catalogs")?;
    let router = RpcRouter::new(Arc::new(service));

    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    host::serve(&router, stdin, tokio::io::stdout()).await
}

fn arg_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .map(String::as_str)
}

fn print_help() {
    println!("brawl - turn-based combat engine host");
    println!();
    println!("USAGE:");
    println!("  brawl [--data-dir <path>] [--seed <n>]");
    println!();
    println!("Reads one JSON request per line on stdin:");
    println!("  {{\"rpc\": \"attack\", \"user_id\": \"u-1\", \"payload\": {{\"target_id\": \"..\", \"attack\": \"jab\"}}}}");
    println!();
    println!("RPCs: load_game, attack, player_info, reload_catalogs");
    println!();
    println!("ENVIRONMENT:");
    println!("  BRAWL_ENV              local | development | qa | production");
    println!("  BRAWL_DATA_DIR         JSON store root (default ./data)");
    println!("  BRAWL_DICE_SEED        fixed dice seed");
    println!("  BRAWL_APPLY_POLICY     independent | refresh | stack");
    println!("  BRAWL_STARTING_HEALTH  health of new players (default 100)");
    println!("  RUST_LOG               log filter");
}
