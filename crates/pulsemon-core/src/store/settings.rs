//! Device settings over `ecg_settings.json`
//!
//! Settings keep the original string-valued representation on disk;
//! fields missing from an older file fall back to their defaults on
//! load. Every `set_*` persists immediately.

use crate::store::atomic_write;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

pub const DEFAULT_SETTINGS_FILE: &str = "ecg_settings.json";

/// Persistent device settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Paper speed in mm/s
    #[serde(default = "default_wave_speed")]
    pub wave_speed: String,

    /// Gain in mm/mV
    #[serde(default = "default_wave_gain")]
    pub wave_gain: String,

    #[serde(default = "default_lead_sequence")]
    pub lead_sequence: String,

    #[serde(default = "default_sampling_mode")]
    pub sampling_mode: String,

    #[serde(default = "default_demo_function")]
    pub demo_function: String,

    #[serde(default = "default_storage")]
    pub storage: String,

    #[serde(default = "default_serial_port")]
    pub serial_port: String,

    #[serde(default = "default_baud_rate")]
    pub baud_rate: String,
}

fn default_wave_speed() -> String {
    "50".to_string()
}
fn default_wave_gain() -> String {
    "10".to_string()
}
fn default_lead_sequence() -> String {
    "Standard".to_string()
}
fn default_sampling_mode() -> String {
    "Simultaneous".to_string()
}
fn default_demo_function() -> String {
    "Off".to_string()
}
fn default_storage() -> String {
    "SD".to_string()
}
fn default_serial_port() -> String {
    "Select Port".to_string()
}
fn default_baud_rate() -> String {
    "115200".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            wave_speed: default_wave_speed(),
            wave_gain: default_wave_gain(),
            lead_sequence: default_lead_sequence(),
            sampling_mode: default_sampling_mode(),
            demo_function: default_demo_function(),
            storage: default_storage(),
            serial_port: default_serial_port(),
            baud_rate: default_baud_rate(),
        }
    }
}

impl Settings {
    /// Paper speed in mm/s
    pub fn wave_speed(&self) -> f64 {
        self.wave_speed.parse().unwrap_or(50.0)
    }

    /// Gain in mm/mV
    pub fn wave_gain(&self) -> f64 {
        self.wave_gain.parse().unwrap_or(10.0)
    }

    /// Display scaling relative to the 10 mm/mV reference gain
    pub fn gain_factor(&self) -> f64 {
        self.wave_gain() / 10.0
    }

    pub fn baud_rate(&self) -> Result<u32> {
        self.baud_rate
            .parse()
            .map_err(|e| Error::Parse(format!("bad baud rate '{}': {}", self.baud_rate, e)))
    }

    /// True when a real port has been chosen
    pub fn has_serial_port(&self) -> bool {
        !self.serial_port.is_empty() && self.serial_port != default_serial_port()
    }

    pub fn demo_enabled(&self) -> bool {
        self.demo_function.eq_ignore_ascii_case("on")
    }
}

/// JSON-file backed settings manager
#[derive(Debug)]
pub struct SettingsManager {
    path: PathBuf,
    settings: Settings,
}

impl SettingsManager {
    /// Load settings, falling back to defaults on a missing or
    /// unreadable file
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let settings = match std::fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                debug!("Settings file {} unreadable ({}), using defaults", path.display(), e);
                Settings::default()
            }),
            Err(_) => Settings::default(),
        };
        Self { path, settings }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Get a setting by key name
    pub fn get(&self, key: &str) -> Option<String> {
        let s = &self.settings;
        match key {
            "wave_speed" => Some(s.wave_speed.clone()),
            "wave_gain" => Some(s.wave_gain.clone()),
            "lead_sequence" => Some(s.lead_sequence.clone()),
            "sampling_mode" => Some(s.sampling_mode.clone()),
            "demo_function" => Some(s.demo_function.clone()),
            "storage" => Some(s.storage.clone()),
            "serial_port" => Some(s.serial_port.clone()),
            "baud_rate" => Some(s.baud_rate.clone()),
            _ => None,
        }
    }

    /// Update a setting by key name and persist
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let s = &mut self.settings;
        match key {
            "wave_speed" => s.wave_speed = value.to_string(),
            "wave_gain" => s.wave_gain = value.to_string(),
            "lead_sequence" => s.lead_sequence = value.to_string(),
            "sampling_mode" => s.sampling_mode = value.to_string(),
            "demo_function" => s.demo_function = value.to_string(),
            "storage" => s.storage = value.to_string(),
            "serial_port" => s.serial_port = value.to_string(),
            "baud_rate" => s.baud_rate = value.to_string(),
            other => return Err(Error::Store(format!("unknown setting '{}'", other))),
        }
        self.save()?;
        debug!("Setting updated: {} = {}", key, value);
        Ok(())
    }

    /// Reset every setting to its factory default and persist
    pub fn load_factory_defaults(&mut self) -> Result<()> {
        self.settings = Settings::default();
        self.save()
    }

    fn save(&self) -> Result<()> {
        let json = serde_json::to_vec_pretty(&self.settings)
            .map_err(|e| Error::Store(format!("failed to serialize settings: {}", e)))?;
        atomic_write(&self.path, &json)
    }
}
