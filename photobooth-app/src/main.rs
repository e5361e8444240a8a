#[cfg(target_os = "linux")]
mod booth;
mod delegate;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;

use photobooth_core::BoothConfig;

const DEFAULT_CONFIG: &str = "photobooth.toml";

/// Touchscreen photobooth kiosk.
#[derive(Parser, Debug)]
#[command(name = "photobooth", version)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(long, env = "PHOTOBOOTH_CONFIG", default_value = DEFAULT_CONFIG)]
    config: PathBuf,

    /// Load and validate the configuration, print it as JSON and exit
    #[arg(long)]
    check: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = load_config(&cli.config)?;
    if cli.check {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }
    serve(config).await
}

/// A missing default config file means "use defaults"; a missing explicit one is an error.
fn load_config(path: &Path) -> Result<BoothConfig> {
    if path == Path::new(DEFAULT_CONFIG) && !path.exists() {
        log::info!("No {} found, using default configuration", DEFAULT_CONFIG);
        return Ok(BoothConfig::default());
    }
    let config = BoothConfig::load(path).with_context(|| format!("loading config {}", path.display()))?;
    log::debug!("Loaded config from {}", path.display());
    Ok(config)
}

#[cfg(target_os = "linux")]
async fn serve(config: BoothConfig) -> Result<()> {
    use std::panic::{self, AssertUnwindSafe};
    use std::sync::Arc;
    use std::thread;

    use anyhow::anyhow;
    use photobooth_core::{TouchEventBus, TouchSource};
    use tokio::sync::oneshot;

    use crate::delegate::LoggingDelegate;

    let bus = TouchEventBus::new();
    let booth::Booth {
        mut orchestrator,
        mut touchscreen,
    } = booth::build(&config, &bus)?;
    let delegate = Arc::new(LoggingDelegate::default());
    orchestrator.set_delegate(delegate.clone());
    log::info!("Photobooth ready, waiting for touches on {}", touchscreen.describe());

    let (done_tx, mut done_rx) = oneshot::channel();
    let session_thread = thread::Builder::new()
        .name("session-orchestrator".into())
        .spawn(move || {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| orchestrator.run()));
            orchestrator.teardown();
            let _ = done_tx.send(());
            outcome
        })
        .context("spawning session thread")?;

    let mut interrupted = false;
    tokio::select! {
        _ = &mut done_rx => {}
        signal = tokio::signal::ctrl_c() => {
            match signal {
                Ok(()) => {
                    log::info!("Interrupted, finishing the current session");
                    interrupted = true;
                    bus.close();
                }
                Err(e) => log::warn!("Couldn't listen for interrupts: {}", e),
            }
            let _ = done_rx.await;
        }
    }

    if let Err(e) = touchscreen.stop() {
        log::warn!("Error stopping touchscreen: {}", e);
    }
    let outcome = session_thread
        .join()
        .map_err(|_| anyhow!("session thread panicked outside the session loop"))?;

    let stats = delegate.stats();
    log::info!(
        "Served {} session(s): {} photo(s), {} failed capture(s), {} print(s), {} failed print(s)",
        stats.sessions,
        stats.photos,
        stats.failed_captures,
        stats.prints,
        stats.failed_prints
    );

    match outcome {
        Ok(Ok(())) => {
            if interrupted {
                log::info!("Shut down cleanly");
            }
            Ok(())
        }
        Ok(Err(e)) => Err(anyhow::Error::new(e).context("session loop failed")),
        Err(payload) => Err(anyhow!("session loop panicked: {}", panic_message(payload.as_ref()))),
    }
}

#[cfg(not(target_os = "linux"))]
async fn serve(_config: BoothConfig) -> Result<()> {
    anyhow::bail!("the photobooth hardware backends are only available on Linux")
}

#[cfg(target_os = "linux")]
fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}
