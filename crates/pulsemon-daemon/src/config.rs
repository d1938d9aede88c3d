use pulsemon_core::buffer::DEFAULT_BUFFER_SIZE;
use pulsemon_core::serial::SUPPORTED_BAUD_RATES;
use pulsemon_core::store::live::{DEFAULT_FRESHNESS_SECS, DEFAULT_LIVE_FILE};
use pulsemon_core::TestMode;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration for PulseMon daemon
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Serial link configuration
    pub serial: SerialConfig,

    /// Acquisition configuration
    pub acquisition: AcquisitionConfig,

    /// Live hand-off file configuration
    pub live: LiveConfig,

    /// Logging configuration
    pub logging: LogConfig,
}

/// Serial link configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SerialConfig {
    /// Serial device path (default: "/dev/ttyUSB0")
    pub port: String,

    /// Baud rate (default: 115200)
    pub baud_rate: u32,
}

/// Acquisition configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcquisitionConfig {
    /// Test mode driving the lead set (default: twelve-lead)
    pub mode: TestMode,

    /// Samples retained per lead (default: 80)
    pub buffer_capacity: usize,

    /// Use the synthetic demo source instead of the serial port
    pub demo: bool,

    /// Demo source sample rate in Hz (default: 100.0)
    pub demo_sample_rate_hz: f64,

    /// Pause between reads when the source is idle, in ms (default: 10)
    pub poll_interval_ms: u64,

    /// Consecutive read errors tolerated before the session stops
    /// (default: 10)
    pub max_consecutive_errors: u32,
}

/// Live hand-off file configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiveConfig {
    /// Path of the live Lead II JSON file
    pub path: PathBuf,

    /// Write the live file every N accepted frames (default: 10)
    pub write_every_frames: u64,

    /// Freshness horizon readers apply, in seconds (default: 5)
    pub freshness_secs: i64,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Log directory path (default: ./logs/)
    pub log_dir: PathBuf,

    /// Daemon log file name (default: pulsemon-daemon.log)
    pub daemon_log: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            serial: SerialConfig::default(),
            acquisition: AcquisitionConfig::default(),
            live: LiveConfig::default(),
            logging: LogConfig::default(),
        }
    }
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: "/dev/ttyUSB0".to_string(),
            baud_rate: 115200,
        }
    }
}

impl Default for AcquisitionConfig {
    fn default() -> Self {
        Self {
            mode: TestMode::TwelveLead,
            buffer_capacity: DEFAULT_BUFFER_SIZE,
            demo: false,
            demo_sample_rate_hz: 100.0,
            poll_interval_ms: 10,
            max_consecutive_errors: 10,
        }
    }
}

impl Default for LiveConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_LIVE_FILE),
            write_every_frames: 10,
            freshness_secs: DEFAULT_FRESHNESS_SECS,
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            log_dir: PathBuf::from("./logs"),
            daemon_log: "pulsemon-daemon.log".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from TOML file
    pub fn load_from_file(path: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn save_to_file(&self, path: &str) -> Result<(), Box<dyn std::error::Error>> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), String> {
        if self.serial.port.is_empty() {
            return Err("Serial port must not be empty".to_string());
        }

        if !SUPPORTED_BAUD_RATES.contains(&self.serial.baud_rate) {
            return Err(format!(
                "Baud rate must be one of {:?}, got: {}",
                SUPPORTED_BAUD_RATES, self.serial.baud_rate
            ));
        }

        if self.acquisition.buffer_capacity == 0 {
            return Err("Buffer capacity must be > 0".to_string());
        }

        if self.acquisition.demo && self.acquisition.demo_sample_rate_hz <= 0.0 {
            return Err(format!(
                "Demo sample rate must be > 0, got: {}",
                self.acquisition.demo_sample_rate_hz
            ));
        }

        if self.acquisition.poll_interval_ms == 0 {
            return Err("Poll interval must be > 0 ms".to_string());
        }

        if self.acquisition.max_consecutive_errors == 0 {
            return Err("Max consecutive errors must be > 0".to_string());
        }

        if self.live.write_every_frames == 0 {
            return Err("Live write interval must be > 0 frames".to_string());
        }

        if self.live.freshness_secs <= 0 {
            return Err("Live freshness must be > 0 seconds".to_string());
        }

        Ok(())
    }

    /// Get full path to the daemon log file
    pub fn daemon_log_path(&self) -> PathBuf {
        self.logging.log_dir.join(&self.logging.daemon_log)
    }
}
