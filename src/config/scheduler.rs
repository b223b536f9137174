//! Billing scheduler configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Billing scheduler configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SchedulerConfig {
    /// Seconds between billing ticks
    #[serde(default = "default_tick_interval")]
    pub tick_interval_secs: u64,

    /// Customer ids loaded per page during a tick
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

impl SchedulerConfig {
    /// Get the tick interval as Duration
    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs(self.tick_interval_secs)
    }

    /// Validate scheduler configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.tick_interval_secs == 0 {
            return Err(ValidationError::InvalidTickInterval);
        }
        if self.page_size == 0 {
            return Err(ValidationError::InvalidPageSize);
        }
        Ok(())
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            tick_interval_secs: default_tick_interval(),
            page_size: default_page_size(),
        }
    }
}

fn default_tick_interval() -> u64 {
    3600
}

fn default_page_size() -> u32 {
    100
}
