//! Package Doctor Server
//!
//! CLI and HTTP surface over the core resolution pipeline. `serve` exposes
//! the pipeline and the standalone tools as an axum API with per-run SSE
//! progress; `solve` and `simulate` run one-shot from the command line.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use axum::{routing::get, Json, Router};
use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tracing::info;

use pkgdoctor_core::llm::{GeminiClient, ReasoningBackend};
use pkgdoctor_core::models::{BackendConfig, ConflictRequest};
use pkgdoctor_core::pipeline::{AgentStep, Resolver};
use pkgdoctor_core::skills::SimulateSkill;

mod api;

/// Application state shared by all API handlers.
///
/// One backend client for the whole process; every run borrows it through
/// the trait object instead of constructing its own connection.
#[derive(Clone)]
pub struct AppState {
    pub backend: Arc<dyn ReasoningBackend>,
}

#[derive(Parser)]
#[command(name = "pkgdoctor", about = "Python dependency conflict resolver")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP API server
    Serve {
        /// Port to listen on
        #[arg(long, default_value_t = 8787)]
        port: u16,
    },
    /// Resolve a conflict from files and print the result as JSON
    Solve {
        /// Path to the requirements manifest
        requirements: PathBuf,
        /// Path to the captured error log
        error_log: PathBuf,
    },
    /// Predict the outcome of installing a single package
    Simulate {
        /// Package to simulate installing
        package: String,
        #[arg(long, default_value = "3.10")]
        python_version: String,
        #[arg(long, default_value = "linux")]
        platform: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("pkgdoctor=info,pkgdoctor_core=info")),
        )
        .init();

    let cli = Cli::parse();
    let config = BackendConfig::from_env().context("loading backend configuration")?;
    let backend: Arc<dyn ReasoningBackend> = Arc::new(GeminiClient::new(config));

    match cli.command {
        Command::Serve { port } => serve(backend, port).await,
        Command::Solve {
            requirements,
            error_log,
        } => solve(backend, &requirements, &error_log).await,
        Command::Simulate {
            package,
            python_version,
            platform,
        } => simulate(backend, &package, &python_version, &platform).await,
    }
}

async fn serve(backend: Arc<dyn ReasoningBackend>, port: u16) -> anyhow::Result<()> {
    let state = AppState { backend };

    let app = Router::new()
        .route("/api/health", get(health))
        .route("/api/openapi.json", get(api::resolve::openapi_json))
        .merge(api::resolve::routes())
        .with_state(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {}", addr))?;
    info!(%addr, "pkgdoctor server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn solve(
    backend: Arc<dyn ReasoningBackend>,
    requirements: &PathBuf,
    error_log: &PathBuf,
) -> anyhow::Result<()> {
    let requirements = std::fs::read_to_string(requirements)
        .with_context(|| format!("reading {}", requirements.display()))?;
    let error_log = std::fs::read_to_string(error_log)
        .with_context(|| format!("reading {}", error_log.display()))?;
    let request = ConflictRequest::new(requirements, error_log);

    let (tx, mut rx) = mpsc::channel::<AgentStep>(32);
    let printer = tokio::spawn(async move {
        while let Some(step) = rx.recv().await {
            eprintln!("[{}] {}: {}", step.id, step.agent, step.message);
        }
    });

    let mut resolver = Resolver::new(backend).with_step_channel(tx);
    let outcome = resolver.resolve(&request).await;
    drop(resolver);
    let _ = printer.await;

    let result = outcome?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

async fn simulate(
    backend: Arc<dyn ReasoningBackend>,
    package: &str,
    python_version: &str,
    platform: &str,
) -> anyhow::Result<()> {
    let report = SimulateSkill::run(backend.as_ref(), package, python_version, platform).await?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_serve_port() {
        let cli = Cli::parse_from(["pkgdoctor", "serve", "--port", "9000"]);
        match cli.command {
            Command::Serve { port } => assert_eq!(port, 9000),
            _ => panic!("expected serve"),
        }
    }

    #[test]
    fn test_cli_simulate_defaults() {
        let cli = Cli::parse_from(["pkgdoctor", "simulate", "tensorflow"]);
        match cli.command {
            Command::Simulate {
                package,
                python_version,
                platform,
            } => {
                assert_eq!(package, "tensorflow");
                assert_eq!(python_version, "3.10");
                assert_eq!(platform, "linux");
            }
            _ => panic!("expected simulate"),
        }
    }
}
