//! Configuration management with file persistence

use anyhow::{anyhow, Context};
use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::PathBuf;

/// Trellis configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub business: BusinessConfig,
    pub booking: BookingConfig,
    pub sync: SyncConfig,
}

/// Operating parameters of the business itself
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusinessConfig {
    pub name: String,
    /// Opening time, "HH:MM" 24-hour format
    pub open: String,
    /// Closing time, "HH:MM" 24-hour format
    pub close: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingConfig {
    /// Step between candidate slot starts, in minutes
    pub slot_granularity_minutes: u32,
    /// Cancellations inside this window are flagged as late
    pub cancellation_notice_hours: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Maximum retry attempts for a queued graph write before it is
    /// marked dead
    pub outbox_max_attempts: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            business: BusinessConfig {
                name: "Trellis".to_string(),
                open: "09:00".to_string(),
                close: "17:00".to_string(),
            },
            booking: BookingConfig {
                slot_granularity_minutes: 30,
                cancellation_notice_hours: 24,
            },
            sync: SyncConfig {
                outbox_max_attempts: 5,
            },
        }
    }
}

impl BusinessConfig {
    /// Parsed opening time
    pub fn open_time(&self) -> anyhow::Result<NaiveTime> {
        NaiveTime::parse_from_str(&self.open, "%H:%M")
            .with_context(|| format!("Invalid opening time: {}", self.open))
    }

    /// Parsed closing time
    pub fn close_time(&self) -> anyhow::Result<NaiveTime> {
        NaiveTime::parse_from_str(&self.close, "%H:%M")
            .with_context(|| format!("Invalid closing time: {}", self.close))
    }
}

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> anyhow::Result<PathBuf> {
        let dir = if let Ok(custom_dir) = env::var("TRELLIS_CONFIG_DIR") {
            PathBuf::from(custom_dir)
        } else {
            dirs::config_dir()
                .ok_or_else(|| anyhow!("Could not determine config directory"))?
                .join("trellis")
        };
        Ok(dir)
    }

    /// Get the config file path
    pub fn config_path() -> anyhow::Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Load configuration from file, or create default if it doesn't exist
    pub fn load() -> anyhow::Result<Self> {
        let path = Self::config_path()?;

        if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            let config: Config = toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
            config.validate()?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    /// Save configuration to file
    pub fn save(&self) -> anyhow::Result<()> {
        self.validate()?;

        let dir = Self::config_dir()?;
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create config directory: {}", dir.display()))?;

        let path = Self::config_path()?;
        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(&path, contents)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        let open = self.business.open_time()?;
        let close = self.business.close_time()?;
        if close <= open {
            return Err(anyhow!(
                "Closing time {} must be after opening time {}",
                self.business.close,
                self.business.open
            ));
        }
        if self.booking.slot_granularity_minutes == 0 {
            return Err(anyhow!("Slot granularity must be positive"));
        }
        if self.sync.outbox_max_attempts == 0 {
            return Err(anyhow!("Outbox max attempts must be positive"));
        }
        Ok(())
    }

    /// Get a configuration value by key
    pub fn get(&self, key: &str) -> anyhow::Result<String> {
        match key {
            "business.name" => Ok(self.business.name.clone()),
            "business.open" => Ok(self.business.open.clone()),
            "business.close" => Ok(self.business.close.clone()),
            "booking.slot_granularity_minutes" => {
                Ok(self.booking.slot_granularity_minutes.to_string())
            }
            "booking.cancellation_notice_hours" => {
                Ok(self.booking.cancellation_notice_hours.to_string())
            }
            "sync.outbox_max_attempts" => Ok(self.sync.outbox_max_attempts.to_string()),
            _ => Err(anyhow!("Unknown config key: {}", key)),
        }
    }

    /// Set a configuration value by key
    pub fn set(&mut self, key: &str, value: &str) -> anyhow::Result<()> {
        match key {
            "business.name" => self.business.name = value.to_string(),
            "business.open" => self.business.open = value.to_string(),
            "business.close" => self.business.close = value.to_string(),
            "booking.slot_granularity_minutes" => {
                self.booking.slot_granularity_minutes =
                    value.parse().context("Expected a positive integer")?;
            }
            "booking.cancellation_notice_hours" => {
                self.booking.cancellation_notice_hours =
                    value.parse().context("Expected an integer")?;
            }
            "sync.outbox_max_attempts" => {
                self.sync.outbox_max_attempts =
                    value.parse().context("Expected a positive integer")?;
            }
            _ => return Err(anyhow!("Unknown config key: {}", key)),
        }
        self.validate()
    }
}
