//! Canvas router
//!
//! Serves a site whose pages are chosen by a backtracking route dispatcher
//! and rendered through templates wrapped in canvases.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ http::server (axum, middleware, request ID)
//!                         │
//!                         ▼
//!                     site::Site ──▶ routing::Dispatcher ──▶ render::RenderPipeline
//!                         │                 │                      │
//!                         │                 └── rejected: retry ◀──┘
//!                         ▼
//!                     error_mapper (error pages, sign-in, module assets)
//!                         │
//!     ◀───────────────────┘ http::response
//!
//!     Cross-cutting: config (+ hot reload), observability, lifecycle
//! ```

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;

use canvas_router::lifecycle::startup::{self, StartupOptions};

#[derive(Parser)]
#[command(name = "canvas-router")]
#[command(about = "Serve a site through the canvas router", long_about = None)]
struct Cli {
    /// Site configuration file.
    #[arg(short, long, default_value = "site.toml")]
    config: PathBuf,

    /// Validate the configuration, build the site, and exit.
    #[arg(long)]
    check: bool,

    /// Override `listener.bind_address`.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let options = StartupOptions {
        config_path: cli.config,
        bind: cli.bind,
    };

    let config = match startup::load(&options) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };

    if cli.check {
        return match startup::check(&config) {
            Ok(summary) => {
                println!("{summary}");
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("Error: {e}");
                ExitCode::FAILURE
            }
        };
    }

    match startup::run(options, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Fatal error");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
