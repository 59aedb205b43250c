//! # ctxpool - Context Broker Host
//!
//! The host binary for inspecting a virtual computer's context broker.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                  apps/ctxpool (THE BINARY)               │
//! │                                                          │
//! │  ┌─────────────┐    ┌──────────────────────────────┐     │
//! │  │    CLI      │    │  Config (computer + catalog)  │     │
//! │  │   (clap)    │    │          (toml)               │     │
//! │  └──────┬──────┘    └──────────────┬───────────────┘     │
//! │         └──────────────┬───────────┘                     │
//! │                        ▼                                 │
//! │                ┌───────────────┐                         │
//! │                │ ctxpool-core  │                         │
//! │                │ (THE BROKER)  │                         │
//! │                └───────────────┘                         │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! ctxpool fingerprint -f interfaces.toml
//! ctxpool topology -c computer.toml
//! ctxpool audit -c computer.toml -f interfaces.toml --requester 1
//! ```

use clap::Parser;
use ctxpool::cli;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

fn main() {
    let cli = cli::Cli::parse();

    // CTXPOOL_LOG_FORMAT=json enables machine-parseable output.
    let log_format = std::env::var("CTXPOOL_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let default_filter = if cli.verbose {
        "ctxpool=debug,ctxpool_core=debug"
    } else {
        "ctxpool=info,ctxpool_core=warn"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }

    if !cli.quiet && !cli.json_mode {
        print_banner();
    }

    if let Err(e) = cli::execute(cli) {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Print the ctxpool startup banner.
fn print_banner() {
    println!(
        r#"
  ctxpool v{}
  Context broker host - publish, fingerprint, discover
"#,
        env!("CARGO_PKG_VERSION")
    );
}
