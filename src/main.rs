//! HTTP API Service Scaffold
//!
//! # Architecture Overview
//!
//! ```text
//!                        ┌──────────────────────────────────────────────────┐
//!                        │                  API SCAFFOLD                    │
//!                        │                                                  │
//!   Orchestrator probes  │  ┌──────────────┐      ┌──────────────────────┐  │
//!   ─────────────────────┼─▶│ probe server │─────▶│   ReadinessState     │  │
//!   /healthz /readyz     │  │   (:8081)    │ read │ startup/ready/stop   │  │
//!   /startupz /metrics   │  └──────────────┘      └──────────▲───────────┘  │
//!                        │                                   │ write        │
//!                        │                        ┌──────────┴───────────┐  │
//!   Signals (TERM/INT)  ─┼───────────────────────▶│ lifecycle coordinator│  │
//!                        │                        │ start ▸ serve ▸ stop │  │
//!                        │                        └──────────┬───────────┘  │
//!                        │                                   │              │
//!   Client Request       │  ┌──────────────┐      ┌──────────▼───────────┐  │
//!   ─────────────────────┼─▶│ http server  │─────▶│  /health, /api/...   │  │
//!                        │  │   (:8080)    │      │  controllers         │  │
//!                        │  └──────────────┘      └──────────────────────┘  │
//!                        └──────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use api_scaffold::config::resolve_config;
use api_scaffold::lifecycle::{spawn_signal_handler, Shutdown};
use api_scaffold::observability::{init_logging, metrics};
use api_scaffold::Application;

#[derive(Parser, Debug)]
#[command(name = "api-scaffold", version, about = "HTTP API service with lifecycle-managed probes")]
struct Cli {
    /// Path to a TOML config file. Environment variables override it.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Validate the configuration, print the resolved values and exit.
    #[arg(long)]
    check_config: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match resolve_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            return ExitCode::FAILURE;
        }
    };

    if cli.check_config {
        return match toml::to_string_pretty(&config) {
            Ok(rendered) => {
                println!("{rendered}");
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("Failed to render configuration: {e}");
                ExitCode::FAILURE
            }
        };
    }

    if let Err(e) = init_logging(&config.observability) {
        eprintln!("Failed to initialize logging: {e}");
        return ExitCode::FAILURE;
    }

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        env = %config.app.env,
        "api-scaffold starting"
    );
    tracing::info!(
        bind_address = %config.app.bind_address(),
        probe_address = %config.probe.bind_address(),
        probe_enabled = config.probe.enabled,
        rate_limit_enabled = config.rate_limit.enabled,
        "Configuration loaded"
    );

    let shutdown = Shutdown::new(config.lifecycle.stop_timeout());
    let metrics_enabled = config.observability.metrics_enabled;
    let mut builder = Application::builder(config);

    if metrics_enabled {
        match metrics::install_recorder() {
            Ok(handle) => builder = builder.metrics(handle),
            Err(e) => tracing::error!(error = %e, "Failed to install metrics recorder"),
        }
    }

    let app = builder.build();
    spawn_signal_handler(shutdown.clone());

    match app.run(shutdown.subscribe()).await {
        Ok(report) => {
            for error in report.errors() {
                tracing::warn!(error = %error, "Shutdown step failed");
            }
            tracing::info!("Shutdown complete");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "Fatal lifecycle error");
            ExitCode::FAILURE
        }
    }
}
