use clap::{Parser, Subcommand};
use opnanir::{ApiClient, AppState, Config, router, site};
use std::{net::SocketAddr, path::PathBuf};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt};

#[derive(Parser)]
#[command(name = "opnanir")]
#[command(about = "Staff dashboard for center openings and its static site build", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the staff dashboard (default)
    Serve,
    /// Render templates and copy static assets into the output directory
    Build {
        #[arg(short, long, default_value = "src")]
        input: PathBuf,

        #[arg(short, long, default_value = "public")]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    match Cli::parse().command.unwrap_or(Command::Serve) {
        Command::Serve => serve().await,
        Command::Build { input, output } => {
            let report = site::build(&site::SiteConfig::new(input, output)).await?;
            if !report.missing.is_empty() {
                info!(missing = report.missing.len(), "some passthrough sources were absent");
            }
            Ok(())
        }
    }
}

async fn serve() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_env()?;
    let api = ApiClient::new(config.api_base_url.clone(), config.api_timeout)?;
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let app = router(AppState::new(api, config));

    info!("listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutting down");
    }
}
