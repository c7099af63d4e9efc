use clap::{Args, Parser, Subcommand, ValueEnum};
use focus_core::{AcquisitionMode, ClockKind, FocusResult, SessionConfig, SpectralMode};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "focus-monitor",
    version,
    about = "Streaming EEG band-power and concentration monitor",
    long_about = "Reads one EEG sample per line from a file, a serial device path or stdin \
                  (or simulates a signal), computes band powers over a sliding or segmented \
                  window and reports a beta/(alpha+beta) concentration score."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Increase verbosity (-v, -vv); RUST_LOG takes precedence
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run an acquisition session
    Run(RunArgs),
    /// Print a configuration preset as JSON
    Config(ConfigArgs),
    /// List simulation patterns
    Patterns,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum ModeArg {
    Sliding,
    Segment,
}

impl From<ModeArg> for AcquisitionMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Sliding => AcquisitionMode::Sliding,
            ModeArg::Segment => AcquisitionMode::Segment,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
pub enum SpectralArg {
    Fft,
    Welch,
}

impl From<SpectralArg> for SpectralMode {
    fn from(mode: SpectralArg) -> Self {
        match mode {
            SpectralArg::Fft => SpectralMode::Fft,
            SpectralArg::Welch => SpectralMode::Welch,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
pub enum ClockArg {
    Wall,
    Samples,
}

impl From<ClockArg> for ClockKind {
    fn from(clock: ClockArg) -> Self {
        match clock {
            ClockArg::Wall => ClockKind::Wall,
            ClockArg::Samples => ClockKind::Samples,
        }
    }
}

#[derive(Args)]
pub struct RunArgs {
    /// JSON configuration file; flags below override it
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Acquisition mode preset used when no file is given
    #[arg(long, value_enum)]
    pub mode: Option<ModeArg>,

    /// Sample input: file or device path, or "-" for stdin
    #[arg(long, conflicts_with = "simulate")]
    pub input: Option<String>,

    /// Simulate a signal instead of reading input (see `patterns`)
    #[arg(long)]
    pub simulate: Option<String>,

    /// Sampling rate in Hz
    #[arg(long)]
    pub rate: Option<f64>,

    /// Analysis window in seconds
    #[arg(long)]
    pub window: Option<f64>,

    /// Seconds between spectral snapshots
    #[arg(long)]
    pub snapshot_interval: Option<f64>,

    /// Pause after each snapshot, in seconds
    #[arg(long)]
    pub cooldown: Option<f64>,

    #[arg(long, value_enum)]
    pub spectral: Option<SpectralArg>,

    /// Sliding mode: process every N new samples
    #[arg(long)]
    pub hop: Option<usize>,

    #[arg(long, value_enum)]
    pub clock: Option<ClockArg>,

    /// Simulation seed
    #[arg(long)]
    pub seed: Option<u64>,

    /// Simulated seconds of signal (unbounded when omitted)
    #[arg(long)]
    pub duration: Option<f64>,

    /// Fraction of simulated lines replaced with garbage
    #[arg(long, default_value_t = 0.0)]
    pub malformed: f64,

    /// Generate simulated samples as fast as possible
    #[arg(long)]
    pub no_pace: bool,

    /// Print the session summary as JSON
    #[arg(long)]
    pub json: bool,
}

impl RunArgs {
    /// File or preset, then flag overrides, then validation
    pub fn session_config(&self) -> FocusResult<SessionConfig> {
        let mut config = match &self.config {
            Some(path) => SessionConfig::load(path)?,
            None => SessionConfig::for_mode(self.mode.map(Into::into).unwrap_or(AcquisitionMode::Sliding)),
        };

        if let (Some(_), Some(mode)) = (&self.config, self.mode) {
            config.acquisition_mode = mode.into();
        }
        if let Some(rate) = self.rate {
            config.sampling.sampling_rate_hz = rate;
        }
        if let Some(window) = self.window {
            config.sampling.window_seconds = window;
        }
        if let Some(interval) = self.snapshot_interval {
            config.snapshot_interval_seconds = interval;
        }
        if let Some(cooldown) = self.cooldown {
            config.cooldown_seconds = cooldown;
        }
        if let Some(spectral) = self.spectral {
            config.spectral_mode = spectral.into();
        }
        if let Some(hop) = self.hop {
            config.hop_samples = hop;
        }
        if let Some(clock) = self.clock {
            config.clock = clock.into();
        }

        config.validate()?;
        Ok(config)
    }
}

#[derive(Args)]
pub struct ConfigArgs {
    #[arg(long, value_enum, default_value = "sliding")]
    pub mode: ModeArg,
}

#[cfg(test)]
mod tests {
    use super::*;
    use focus_core::FocusError;

    fn parse(args: &[&str]) -> RunArgs {
        let mut argv = vec!["focus-monitor", "run"];
        argv.extend_from_slice(args);
        match Cli::parse_from(argv).command {
            Command::Run(args) => args,
            _ => panic!("expected run"),
        }
    }

    #[test]
    fn test_flags_override_preset() {
        let args = parse(&["--mode", "segment", "--window", "4", "--spectral", "welch", "--simulate", "relaxed"]);
        let config = args.session_config().unwrap();

        assert_eq!(config.acquisition_mode, AcquisitionMode::Segment);
        assert_eq!(config.window_samples(), 1000);
        assert_eq!(config.spectral_mode, SpectralMode::Welch);
    }

    #[test]
    fn test_tiny_window_rejected() {
        let args = parse(&["--rate", "250", "--window", "0.01"]);
        assert_eq!(
            args.session_config().err(),
            Some(FocusError::InsufficientSamples { required: 28, available: 3 })
        );
    }

    #[test]
    fn test_input_conflicts_with_simulate() {
        let result = Cli::try_parse_from(["focus-monitor", "run", "--input", "-", "--simulate", "relaxed"]);
        assert!(result.is_err());
    }
}
