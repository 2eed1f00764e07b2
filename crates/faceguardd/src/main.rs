//! faceguardd — multi-camera face recognition daemon.

use anyhow::Result;
use clap::Parser;
use faceguard_capture::{SourceOpener, StdOpener};
use faceguard_core::{EngineError, FaceEngine, StubEngine};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

mod config;
mod latest;
mod notify;
mod pipeline;
mod session;

use config::Config;
use pipeline::{Pipeline, StopFlag};

#[derive(Parser)]
#[command(name = "faceguardd", about = "Faceguard multi-camera recognition daemon")]
struct Cli {
    /// Path to the TOML config file (falls back to FACEGUARD_CONFIG).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Camera feed URI (e.g. stub:lobby, v4l2:/dev/video0); repeat for
    /// several cameras. Overrides the configured feed list.
    #[arg(long = "feed")]
    feeds: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let mut cfg = Config::load(cli.config.as_deref())?;
    if !cli.feeds.is_empty() {
        cfg.feeds = cli.feeds;
    }
    if cfg.feeds.is_empty() {
        anyhow::bail!("no camera feeds configured; set `feeds` in the config file or pass --feed");
    }

    tracing::info!(feeds = cfg.feeds.len(), engine = %cfg.engine, "faceguardd starting");

    let opener: Arc<dyn SourceOpener> = Arc::new(StdOpener {
        width: cfg.frame_width,
        height: cfg.frame_height,
    });
    let engine_name = cfg.engine.clone();
    let pipeline = Pipeline::start(&cfg, opener, |_feed| build_engine(&engine_name))?;

    let stop = pipeline.stop_flag();
    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            result?;
            tracing::info!("interrupt received; shutting down");
        }
        _ = halted(stop) => {
            tracing::warn!("pipeline halted by a fatal session error");
        }
    }

    pipeline.stop();
    tokio::task::spawn_blocking(move || pipeline.join()).await?;
    tracing::info!("faceguardd stopped");
    Ok(())
}

/// Resolves when any session raises the shared stop flag.
async fn halted(stop: StopFlag) {
    while !stop.is_set() {
        tokio::time::sleep(Duration::from_millis(200)).await;
    }
}

/// Select the detection backend by config name.
fn build_engine(name: &str) -> Result<Box<dyn FaceEngine>, EngineError> {
    match name {
        "stub" => {
            tracing::warn!("stub engine backend configured; no faces will be detected");
            Ok(Box::new(StubEngine::default()))
        }
        other => Err(EngineError::Fatal(format!(
            "unknown engine backend '{other}'"
        ))),
    }
}
