//! # Remedy - Guided Equipment Troubleshooting
//!
//! The main binary for the Remedy troubleshooting engine.
//!
//! This application provides:
//! - HTTP REST API server (axum-based, one active session)
//! - CLI interface for browsing faults and planned procedures
//! - An interactive checklist guide on stdin/stdout
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      apps/remedy (THE BINARY)                   │
//! │                                                                 │
//! │  ┌─────────────┐    ┌─────────────┐    ┌──────────────────┐    │
//! │  │   CLI       │    │   HTTP API  │    │ Deployment TOML  │    │
//! │  │  (clap)     │    │   (axum)    │    │   (config.rs)    │    │
//! │  └──────┬──────┘    └──────┬──────┘    └────────┬─────────┘    │
//! │         │                  │                    │              │
//! │         └──────────────────┼────────────────────┘              │
//! │                            ▼                                   │
//! │                    ┌───────────────┐                           │
//! │                    │  remedy-core  │                           │
//! │                    │ (THE ENGINE)  │                           │
//! │                    └───────────────┘                           │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! # Start the HTTP server
//! remedy server --host 0.0.0.0 --port 8080
//!
//! # CLI operations
//! remedy categories
//! remedy show "Blood Circuit Errors" "Air Detector Alarm"
//! remedy guide "Blood Circuit Errors" "Air Detector Alarm"
//! remedy --config site.toml check
//! ```

use clap::Parser;
use remedy::cli;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

#[tokio::main]
async fn main() {
    // REMEDY_LOG_FORMAT=json enables machine-parseable output.
    let log_format = std::env::var("REMEDY_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "remedy=info,tower_http=debug".into());

    // Logs go to stderr so JSON output on stdout stays parseable.
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

    let cli = cli::Cli::parse();

    if !cli.quiet && !cli.json_mode {
        print_banner();
    }

    if let Err(e) = cli::execute(cli).await {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Print the Remedy startup banner.
fn print_banner() {
    println!(
        r#"
  ██████╗ ███████╗███╗   ███╗███████╗██████╗ ██╗   ██╗
  ██╔══██╗██╔════╝████╗ ████║██╔════╝██╔══██╗╚██╗ ██╔╝
  ██████╔╝█████╗  ██╔████╔██║█████╗  ██║  ██║ ╚████╔╝
  ██╔══██╗██╔══╝  ██║╚██╔╝██║██╔══╝  ██║  ██║  ╚██╔╝
  ██║  ██║███████╗██║ ╚═╝ ██║███████╗██████╔╝   ██║
  ╚═╝  ╚═╝╚══════╝╚═╝     ╚═╝╚══════╝╚═════╝    ╚═╝

  Guided Troubleshooting v{}

  Select • Step • Resolve
"#,
        env!("CARGO_PKG_VERSION")
    );
}
