use arena_sim::adapters::outbound::{init_buffered_logger, init_experiment_logger, NoopRecorder};
use arena_sim::application::PipelineService;
use arena_sim::domains::arena::RunControl;
use arena_sim::Config;
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "arena-sim", about = "Runs a multi-agent arena experiment")]
struct Cli {
    /// Experiment configuration file.
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    info!(config = %cli.config.display(), "Starting arena-sim");

    let config = match Config::from_file(&cli.config).await {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {:#}", e);
            return ExitCode::FAILURE;
        }
    };

    let logger = init_buffered_logger(
        init_experiment_logger(config.logging.file.as_deref(), &config.logging.level),
        256,
    );
    let render = config.gui.render;

    let service = PipelineService::new(config, Arc::new(NoopRecorder), logger.clone());
    let (handle, running) = match service.start() {
        Ok(started) => started,
        Err(e) => {
            error!("Failed to start pipeline: {}", e);
            logger.drain().await;
            return ExitCode::FAILURE;
        }
    };

    let control = handle.control.clone();
    drop(handle);
    if render {
        warn!("no renderer is built in; starting the arena, stop with Ctrl-C");
        let _ = control.send(RunControl::Start).await;
    }
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Ctrl-C received, finishing current tick");
            let _ = control.send(RunControl::Quit).await;
        }
    });

    let code = match running.wait().await {
        Ok(report) => {
            info!(
                runs = report.runs_completed,
                ticks = report.arena.ticks.len(),
                "Experiment completed"
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Experiment failed: {}", e);
            ExitCode::FAILURE
        }
    };
    logger.drain().await;
    code
}
