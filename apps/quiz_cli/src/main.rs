mod config;
mod terminal;

use std::{io, sync::Arc};

use anyhow::{Context, Result};
use clap::Parser;
use client_core::{HttpGameService, SessionController};
use shared::domain::GameMode;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::{
    config::{load_settings, validate_server_url},
    terminal::{spawn_input_reader, TerminalSurface},
};

#[derive(Parser, Debug)]
#[command(about = "Terminal client for the MRT trivia quiz")]
struct Args {
    /// Base URL of the quiz server.
    #[arg(long)]
    server_url: Option<String>,
    /// `normal` or `time_attack`.
    #[arg(long)]
    mode: Option<GameMode>,
    #[arg(long)]
    question_seconds: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();
    let args = Args::parse();

    let mut settings = load_settings();
    if let Some(server_url) = args.server_url {
        settings.server_url = server_url;
    }
    if let Some(mode) = args.mode {
        settings.mode = mode;
    }
    if let Some(seconds) = args.question_seconds {
        settings.question_seconds = seconds;
    }

    let server_url = validate_server_url(&settings.server_url)?;
    let service = HttpGameService::new(server_url.clone())
        .context("failed to build the quiz HTTP client")?;
    info!(%server_url, mode = %settings.mode, "starting quiz client");

    let mut controller = SessionController::new(
        Arc::new(service),
        TerminalSurface::new(io::stdout()),
        settings.mode,
        settings.timings(),
    );
    spawn_input_reader(controller.handle());

    controller.restart();
    controller.run().await;
    Ok(())
}
