//! Focus monitor: command-line front end for the concentration engine

mod cli;

use anyhow::{bail, Context, Result};
use clap::Parser;
use cli::{Cli, Command, RunArgs};
use focus_core::{FocusError, LineSource, SampleSource, SessionConfig, SessionSummary};
use focus_processing::{SessionController, TracingSink};
use focus_simulation::{EegConfig, SignalPattern, SyntheticSource};
use std::io::BufReader;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Run(args) => run(args),
        Command::Config(args) => {
            let config = SessionConfig::for_mode(args.mode.into());
            println!("{}", config.to_json()?);
            Ok(())
        }
        Command::Patterns => {
            for (name, pattern) in SignalPattern::presets() {
                println!("{:<12} {}", name, pattern.description());
            }
            Ok(())
        }
    }
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_level.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn open_source(args: &RunArgs, config: &SessionConfig) -> Result<Box<dyn SampleSource>> {
    if let Some(name) = &args.simulate {
        let Some(pattern) = SignalPattern::preset(name) else {
            bail!("unknown pattern '{}'; run `focus-monitor patterns` for the list", name);
        };
        info!("Simulating '{}': {}", name, pattern.description());

        let mut source = SyntheticSource::new(EegConfig {
            sampling_rate_hz: config.sampling.sampling_rate_hz,
            pattern,
            seed: args.seed,
            ..EegConfig::default()
        })?
        .with_malformed_probability(args.malformed)?
        .paced(!args.no_pace);
        if let Some(seconds) = args.duration {
            source = source.with_duration(seconds);
        }
        return Ok(Box::new(source));
    }

    match args.input.as_deref() {
        None | Some("-") => {
            info!("Reading samples from stdin");
            Ok(Box::new(LineSource::new(BufReader::new(std::io::stdin()))))
        }
        Some(path) => {
            info!("Reading samples from {}", path);
            let source = LineSource::open(path).with_context(|| format!("cannot open input {}", path))?;
            Ok(Box::new(source))
        }
    }
}

fn run(args: RunArgs) -> Result<()> {
    let config = args.session_config().context("invalid configuration")?;
    let source = open_source(&args, &config)?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;

    let result = runtime.block_on(run_session(config, source, &args));
    // A stdin read may still be blocked; do not wait on it forever
    runtime.shutdown_timeout(Duration::from_secs(1));
    result
}

async fn run_session(config: SessionConfig, source: Box<dyn SampleSource>, args: &RunArgs) -> Result<()> {
    info!(
        "Session: {:?} mode, {} Hz, {} samples per window, snapshots every {}s",
        config.acquisition_mode,
        config.sampling.sampling_rate_hz,
        config.window_samples(),
        config.snapshot_interval_seconds
    );

    let mut session = SessionController::new(config, TracingSink).context("failed to build session")?;
    let handle = session.handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupt received, stopping");
            handle.stop();
        }
    });

    let outcome = session.run(source).await;
    let summary = session.summary().clone();

    report(&summary, session.log().mean_concentration(), args.json)?;

    match outcome {
        Ok(_) => Ok(()),
        Err(FocusError::SourceDisconnected { reason }) => {
            warn!("Sample source disconnected: {}", reason);
            Ok(())
        }
        Err(e) => Err(e).context("session ended abnormally"),
    }
}

fn report(summary: &SessionSummary, mean_concentration: Option<f64>, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(summary)?);
        return Ok(());
    }

    println!("Session {}", summary.session_id);
    println!("  samples:    {}", summary.samples_ingested);
    println!("  discarded:  {}", summary.malformed_discarded);
    println!("  windows:    {}", summary.windows_processed);
    println!("  snapshots:  {}", summary.snapshots_emitted);
    println!("  elapsed:    {:.2}s", summary.elapsed_seconds);
    if let Some(mean) = mean_concentration {
        println!("  mean concentration: {:.2}", mean);
    }
    Ok(())
}
