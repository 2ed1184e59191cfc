//! # stripe-bundle
//!
//! Validates the Stripe bundle configuration and prints the services it
//! registers.
//!
//! ## Usage
//!
//! ```bash
//! # Check config/stripe.toml (or STRIPE_* env vars when absent)
//! stripe-bundle
//!
//! # Check a specific file, machine-readable
//! stripe-bundle --config deploy/stripe.toml --json
//! ```

use anyhow::Context;
use clap::Parser;
use pay_bundle::{load_config, BundleConfig};
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Bundle configuration file (TOML)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print registrations as JSON
    #[arg(long)]
    json: bool,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(
            EnvFilter::builder()
                .with_default_directive(Level::INFO.into())
                .from_env_lossy(),
        )
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => BundleConfig::from_file(path)
            .with_context(|| format!("invalid bundle config {}", path.display()))?,
        None => load_config().context("no usable Stripe bundle configuration")?,
    };

    let registrations = config.registrations();
    info!("Configuration valid: {} instance(s)", registrations.len());

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&registrations)?);
        return Ok(());
    }

    for registration in &registrations {
        println!(
            "{:<12} {:<20} {:<16} {:<5} {}",
            registration.instance,
            registration.processes_type,
            registration.flow,
            registration.mode,
            registration.plugin_service
        );
    }
    if config.has_default_instance() {
        println!("aliases: payment_stripe.gateway, payment_stripe.plugin.checkout -> default");
    }
    println!("form types: {}", config.method_form_types().join(", "));

    Ok(())
}
