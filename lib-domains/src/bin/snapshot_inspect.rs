use std::env;
use std::io::{self, Read};

use anyhow::{bail, Context, Result};
use tracing_subscriber::EnvFilter;

use lib_domains::snapshot::ChainSnapshot;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();

    let (hex, json) = read_args_or_stdin();
    if let Err(e) = inspect(&hex, json) {
        eprintln!("ERROR: {e:#}");
        std::process::exit(1);
    }
}

/// Snapshot hex from the first non-flag argument, else stdin
fn read_args_or_stdin() -> (String, bool) {
    let mut json = false;
    let mut hex = None;
    for arg in env::args().skip(1) {
        if arg == "--json" {
            json = true;
        } else if hex.is_none() {
            hex = Some(arg.trim().to_string());
        }
    }

    let hex = hex.unwrap_or_else(|| {
        let mut input = String::new();
        io::stdin().read_to_string(&mut input).unwrap_or(0);
        input.trim().to_string()
    });
    (hex, json)
}

fn inspect(hex_snapshot: &str, json: bool) -> Result<()> {
    if hex_snapshot.is_empty() {
        bail!("no hex provided (arg or stdin)");
    }

    let bytes = hex::decode(hex_snapshot).context("invalid hex")?;
    let snapshot = ChainSnapshot::from_bytes(&bytes).context("snapshot rejected")?;
    let summary = snapshot.summary();

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!("domain chain snapshot:");
    println!("  version: {}", summary.version);
    println!("  block: {}", summary.block_number);
    println!("  state_hash: {}", summary.state_hash);
    println!("  forbidden registries: {}", summary.forbidden_registries);
    println!("  factories: {}", summary.factories);
    println!("  tlds: {}", summary.tlds);
    println!("  domains: {}", summary.domains);
    println!("  resolvers: {}", summary.resolvers);
    println!("  metadata providers: {}", summary.metadata_providers);

    for (address, factory) in &snapshot.state.contracts.factories {
        println!();
        println!("factory {} (owner {}):", address, factory.owner());
        for name in factory.tlds() {
            let tld_address = factory.tld_names_addresses(name);
            let minted = snapshot
                .state
                .contracts
                .tlds
                .get(&tld_address)
                .map(|tld| tld.total_supply())
                .unwrap_or(0);
            println!("  {} -> {} ({} domains)", name, tld_address, minted);
        }
    }

    for (address, resolver) in &snapshot.state.resolvers {
        println!();
        println!("resolver {}:", address);
        println!("  factories: {}", resolver.get_factories().len());
        println!("  deprecated tlds: {}", resolver.deprecated_tlds().len());
    }

    Ok(())
}
