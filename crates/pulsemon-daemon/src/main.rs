use anyhow::Result;
use clap::{Parser, Subcommand};
use pulsemon_core::store::live::LiveLeadFile;
use pulsemon_core::{DemoSignal, SampleSource, SerialEcgReader, VERSION};
use pulsemon_daemon::{AcquisitionSession, Config, TickOutcome};
use std::path::PathBuf;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// PulseMon - ECG acquisition daemon
///
/// Reads 8-channel frames from the acquisition board, derives the full
/// 12-lead set and publishes the live Lead II window for the dashboard
#[derive(Parser, Debug)]
#[command(name = "pulsemon-daemon")]
#[command(version = VERSION)]
#[command(about = "PulseMon Daemon - ECG acquisition", long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "/etc/pulsemon/config.toml")]
    config: PathBuf,

    /// Subcommand to execute
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the acquisition loop
    Acquire,

    /// Check the live file once and report its freshness
    Check,

    /// List serial ports present on this machine
    Ports,

    /// Generate default configuration file
    GenerateConfig {
        /// Output path for config file
        #[arg(short, long, default_value = "config.toml")]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging()?;

    info!("PulseMon Daemon v{} starting...", VERSION);

    let config = load_config(&cli.config)?;

    config
        .validate()
        .map_err(|e| anyhow::anyhow!("Configuration validation failed: {}", e))?;

    info!("Configuration loaded and validated successfully");

    match cli.command {
        Some(Commands::Acquire) | None => run_acquire_loop(config).await?,
        Some(Commands::Check) => run_check(config)?,
        Some(Commands::Ports) => run_ports()?,
        Some(Commands::GenerateConfig { output }) => generate_config(output)?,
    }

    Ok(())
}

/// Run the acquisition loop until the read-error budget is spent
async fn run_acquire_loop(config: Config) -> Result<()> {
    info!(
        "Starting acquisition: mode {:?}, live file {:?}, every {} frames",
        config.acquisition.mode, config.live.path, config.live.write_every_frames
    );

    let mut session = create_session(&config)?;
    session.start()?;

    let poll_interval = Duration::from_millis(config.acquisition.poll_interval_ms);
    // The demo source has no hardware clock, so the loop paces it
    let frame_interval = if config.acquisition.demo {
        Duration::from_secs_f64(1.0 / config.acquisition.demo_sample_rate_hz)
    } else {
        Duration::ZERO
    };

    loop {
        match session.tick() {
            Ok(TickOutcome::Frame) | Ok(TickOutcome::Dropped) => {
                if !frame_interval.is_zero() {
                    sleep(frame_interval).await;
                }
            }
            Ok(TickOutcome::Idle) => {
                sleep(poll_interval).await;
            }
            Err(e) => {
                warn!("Acquisition aborted: {}", e);
                session.shutdown();
                return Err(e.into());
            }
        }
    }
}

/// Read the live file once and report on it
fn run_check(config: Config) -> Result<()> {
    let live = LiveLeadFile::new(&config.live.path);

    match live.read()? {
        Some(snapshot) => {
            info!("=== Live File Status ===");
            info!("Lead: {}", snapshot.lead);
            info!("Samples: {}", snapshot.samples.len());
            info!("Age: {}s", snapshot.age_secs());
            if snapshot.is_stale(config.live.freshness_secs) {
                warn!(
                    "Live file is stale (older than {}s), acquisition may be down",
                    config.live.freshness_secs
                );
            } else {
                info!("Live file is fresh");
            }
        }
        None => {
            warn!("Live file {:?} does not exist yet", config.live.path);
        }
    }

    Ok(())
}

/// List serial ports
fn run_ports() -> Result<()> {
    let ports = pulsemon_core::serial::list_ports()?;

    if ports.is_empty() {
        warn!("No serial ports found");
    } else {
        info!("Serial ports:");
        for port in ports {
            info!("  {}", port);
        }
    }

    Ok(())
}

/// Generate default configuration file
fn generate_config(output: PathBuf) -> Result<()> {
    info!("Generating default configuration file: {:?}", output);

    let config = Config::default();
    config
        .save_to_file(output.to_str().ok_or_else(|| {
            anyhow::anyhow!("Output path is not valid UTF-8: {:?}", output)
        })?)
        .map_err(|e| anyhow::anyhow!("Failed to save configuration file: {}", e))?;

    info!("Configuration file generated successfully");
    Ok(())
}

/// Create an AcquisitionSession from configuration
fn create_session(config: &Config) -> Result<AcquisitionSession> {
    let source: Box<dyn SampleSource> = if config.acquisition.demo {
        info!(
            "Demo source enabled at {} Hz, serial port unused",
            config.acquisition.demo_sample_rate_hz
        );
        Box::new(DemoSignal::new(config.acquisition.demo_sample_rate_hz))
    } else {
        info!(
            "Opening serial port {} at {} baud",
            config.serial.port, config.serial.baud_rate
        );
        Box::new(SerialEcgReader::open(
            &config.serial.port,
            config.serial.baud_rate,
        )?)
    };

    let mut session = AcquisitionSession::new(
        source,
        config.acquisition.mode,
        config.acquisition.buffer_capacity,
        LiveLeadFile::new(&config.live.path),
        config.live.write_every_frames,
        config.acquisition.max_consecutive_errors,
    );

    if config.acquisition.demo {
        session.set_sample_rate_hz(config.acquisition.demo_sample_rate_hz);
    }

    Ok(session)
}

/// Load configuration from file or use defaults
fn load_config(path: &PathBuf) -> Result<Config> {
    if path.exists() {
        info!("Loading configuration from: {:?}", path);
        Config::load_from_file(path.to_str().ok_or_else(|| {
            anyhow::anyhow!("Config path is not valid UTF-8: {:?}", path)
        })?)
        .map_err(|e| anyhow::anyhow!("Failed to load configuration file: {}", e))
    } else {
        warn!("Configuration file not found: {:?}, using defaults", path);
        Ok(Config::default())
    }
}

/// Initialize logging with file and stdout output
fn init_logging() -> Result<()> {
    std::fs::create_dir_all("./logs")?;

    let file_appender = tracing_appender::rolling::daily("./logs", "pulsemon-daemon.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stdout)
                .with_ansi(true)
                .with_target(false),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_target(true),
        )
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    // Prevent _guard from being dropped
    std::mem::forget(_guard);

    info!("Logging initialized");

    Ok(())
}
