use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::device::{
    BUZZER_PULSE_MS, CLICK_MAX_MS, DEBOUNCE_MS, DOUBLE_CLICK_MS, FLASH_PERIOD_MS, LONG_PRESS_MS,
    SCAN_PERIOD_MS, SETTINGS_IDLE_MS, STEPS_PER_DETENT,
};
use crate::input::GestureTiming;
use crate::profiles::{CommandMapping, MappingOverride, Profile};

/// Firmware configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub timing: TimingConfig,
    pub backlight: BacklightConfig,
    pub feedback: FeedbackConfig,
    pub profile: ProfileSelectionConfig,
    pub mapping: MappingConfig,
}

impl Config {
    /// Load configuration from the given file, or the default location
    ///
    /// A missing default file is created with default values.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::config_path()?,
        };

        if config_path.exists() {
            let contents = std::fs::read_to_string(&config_path)
                .with_context(|| format!("reading {}", config_path.display()))?;
            let config: Config = toml::from_str(&contents)
                .with_context(|| format!("parsing {}", config_path.display()))?;
            config.validate()?;
            Ok(config)
        } else if path.is_some() {
            anyhow::bail!("config file {} not found", config_path.display())
        } else {
            let config = Config::default();
            config.save_to(&config_path)?;
            Ok(config)
        }
    }

    /// Save configuration to a file
    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(config_path, contents)?;
        Ok(())
    }

    /// Get config file path
    pub fn config_path() -> Result<PathBuf> {
        let home = std::env::var("HOME")?;
        Ok(PathBuf::from(home).join(".config/cdu-firmware/config.toml"))
    }

    /// Reject settings the firmware cannot run with
    pub fn validate(&self) -> Result<()> {
        let t = &self.timing;
        if t.click_max_ms >= t.long_press_ms {
            anyhow::bail!("timing.click_max_ms must be shorter than timing.long_press_ms");
        }
        if t.flash_period_ms == 0 {
            anyhow::bail!("timing.flash_period_ms must be non-zero");
        }
        if t.settings_idle_ms == 0 {
            anyhow::bail!("timing.settings_idle_ms must be non-zero");
        }
        if !(1..=4).contains(&t.steps_per_detent) {
            anyhow::bail!("timing.steps_per_detent must be 1-4");
        }
        if self.backlight.initial > self.backlight.max {
            anyhow::bail!("backlight.initial exceeds backlight.max");
        }
        CommandMapping::build(&self.mapping.overrides).context("invalid mapping override")?;
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Time a new switch level must hold before it is accepted
    pub debounce_ms: u64,
    /// Longest press that still counts as a click
    pub click_max_ms: u64,
    /// Window for the second click of a double-click
    pub double_click_ms: u64,
    /// Hold time for a long press (enters LCD settings mode)
    pub long_press_ms: u64,
    /// Idle time before LCD settings mode times out
    pub settings_idle_ms: u64,
    /// LED flash half-period
    pub flash_period_ms: u64,
    /// Control loop cadence
    pub scan_period_ms: u64,
    /// Quadrature transitions per encoder detent
    pub steps_per_detent: u8,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            debounce_ms: DEBOUNCE_MS,
            click_max_ms: CLICK_MAX_MS,
            double_click_ms: DOUBLE_CLICK_MS,
            long_press_ms: LONG_PRESS_MS,
            settings_idle_ms: SETTINGS_IDLE_MS,
            flash_period_ms: FLASH_PERIOD_MS,
            scan_period_ms: SCAN_PERIOD_MS,
            steps_per_detent: STEPS_PER_DETENT,
        }
    }
}

impl TimingConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn settings_idle(&self) -> Duration {
        Duration::from_millis(self.settings_idle_ms)
    }

    pub fn flash_period(&self) -> Duration {
        Duration::from_millis(self.flash_period_ms)
    }

    pub fn scan_period(&self) -> Duration {
        Duration::from_millis(self.scan_period_ms.max(1))
    }

    pub fn gestures(&self) -> GestureTiming {
        GestureTiming {
            debounce: self.debounce(),
            click_max: Duration::from_millis(self.click_max_ms),
            double_click: Duration::from_millis(self.double_click_ms),
            long_press: Duration::from_millis(self.long_press_ms),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BacklightConfig {
    /// Keycap backlight level at power-up
    pub initial: u8,
    /// Full-scale LED level
    pub max: u8,
    /// Level change per encoder detent
    pub step: u8,
}

impl Default for BacklightConfig {
    fn default() -> Self {
        Self {
            initial: 50,
            max: 100,
            step: 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedbackConfig {
    /// Buzzer click on every dispatched key
    pub audible_click: bool,
    /// Buzzer pulse width in milliseconds
    pub buzzer_pulse_ms: u64,
}

impl Default for FeedbackConfig {
    fn default() -> Self {
        Self {
            audible_click: true,
            buzzer_pulse_ms: BUZZER_PULSE_MS,
        }
    }
}

impl FeedbackConfig {
    pub fn buzzer_pulse(&self) -> Duration {
        Duration::from_millis(self.buzzer_pulse_ms)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileSelectionConfig {
    /// Re-read the DIP switches at this period; boot-only when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repoll_ms: Option<u64>,
    /// Fixed profile used instead of the DIP switches on the bench
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bench_profile: Option<Profile>,
}

impl ProfileSelectionConfig {
    pub fn repoll(&self) -> Option<Duration> {
        self.repoll_ms.filter(|ms| *ms > 0).map(Duration::from_millis)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MappingConfig {
    /// Per-profile chord overrides applied on top of the built-in tables
    pub overrides: Vec<MappingOverride>,
}
