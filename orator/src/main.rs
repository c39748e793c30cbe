#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

mod args;

use std::path::PathBuf;

use args::{Args, Command};
use clap::Parser;
use orator_config::Config;
use orator_dispatch::{Dispatcher, SpeakStatus, SpeechRequest};
use orator_engine::{EngineChoice, EngineSet, ScratchEnv, text::strip_markdown};
use orator_mcp::OratorServer;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Load configuration
    let config = match args.config {
        Some(ref path) => Config::load(path)?,
        None => Config::default(),
    };

    // Initialize telemetry
    let _telemetry_guard = orator_telemetry::init(&config.telemetry, &args.log_filter)?;

    tracing::info!(
        config_path = ?args.config.as_ref().map(|path| path.display().to_string()),
        "starting orator"
    );

    // Engines resolve bundled scripts and scratch space relative to the install directory
    let install_dir = install_dir()?;
    let scratch_root = config.engines.scratch_dir.clone().unwrap_or_else(|| install_dir.clone());
    let scratch = ScratchEnv::prepare(&scratch_root).unwrap_or_else(|e| {
        tracing::warn!(error = %e, root = %scratch_root.display(), "scratch directory unavailable");
        ScratchEnv::default()
    });
    let engines = EngineSet::from_config(&config.engines, &install_dir, &scratch);

    if args.list_engines {
        for (kind, available) in engines.describe() {
            println!("{kind}\t{}", if available { "available" } else { "unavailable" });
        }
        return Ok(());
    }

    let available = engines.list_available();
    if available.is_empty() {
        tracing::warn!("no speech engine available, every request will be rejected");
    } else {
        tracing::info!(engines = ?available, "speech engines ready");
    }

    let dispatcher = Dispatcher::new(config.dispatch, engines);

    if let Some(Command::Speak { speed, engine, text }) = args.command {
        return speak_once(&dispatcher, &text.join(" "), engine, speed).await;
    }

    let server = OratorServer::new(dispatcher);

    // Set up graceful shutdown
    let shutdown = CancellationToken::new();
    let shutdown_clone = shutdown.clone();

    tokio::spawn(async move {
        shutdown_signal().await;
        shutdown_clone.cancel();
    });

    // Run server
    server.serve(shutdown).await?;

    tracing::info!("orator stopped");
    Ok(())
}

/// Speak one utterance in the foreground
async fn speak_once(dispatcher: &Dispatcher, text: &str, engine: EngineChoice, speed: f64) -> anyhow::Result<()> {
    let request = SpeechRequest::new(strip_markdown(text))
        .engine(engine)
        .speed(speed)
        .dedupe_seconds(0.0)
        .wait_for_completion(true);

    let outcome = dispatcher.speak(request).await?;
    if outcome.status != SpeakStatus::Completed {
        anyhow::bail!(outcome.summary());
    }

    println!("{}", outcome.summary());
    Ok(())
}

/// Directory holding the running executable
fn install_dir() -> anyhow::Result<PathBuf> {
    let exe = std::env::current_exe()?;
    exe.parent()
        .map(PathBuf::from)
        .ok_or_else(|| anyhow::anyhow!("executable path has no parent: {}", exe.display()))
}

/// Wait for a shutdown signal (`SIGINT` or `SIGTERM`)
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }

    tracing::info!("shutdown signal received");
}
