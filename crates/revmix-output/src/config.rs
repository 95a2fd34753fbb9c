//! Backend configuration.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Device buffers queued per voice (default: 3)
    pub device_queue_depth: usize,
    /// Service ticks per stream block when no poll interval is set (default: 3.0)
    pub service_factor: f64,
    /// Fixed service interval, overriding `service_factor`
    pub poll_interval: Option<Duration>,
    /// Output device index for hardware backends; `None` picks the host default
    pub output_device: Option<usize>,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            device_queue_depth: 3,
            service_factor: 3.0,
            poll_interval: None,
            output_device: None,
        }
    }
}

impl BackendConfig {
    pub fn validate(&self) -> Result<()> {
        if self.device_queue_depth == 0 {
            return Err(Error::InvalidConfig(
                "device_queue_depth must be at least 1".into(),
            ));
        }
        if self.service_factor.is_nan() || self.service_factor <= 0.0 {
            return Err(Error::InvalidConfig(format!(
                "service_factor {} must be positive",
                self.service_factor
            )));
        }
        if self.poll_interval == Some(Duration::ZERO) {
            return Err(Error::InvalidConfig("poll_interval must be non-zero".into()));
        }
        Ok(())
    }

    /// Service interval for streams whose shortest block lasts `block_duration` seconds.
    pub fn service_interval(&self, block_duration: f64) -> Duration {
        self.poll_interval
            .unwrap_or_else(|| Duration::from_secs_f64(block_duration / self.service_factor))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(BackendConfig::default().validate().is_ok());
    }

    #[test]
    fn test_service_interval() {
        let config = BackendConfig::default();
        assert_eq!(config.service_interval(0.375), Duration::from_millis(125));

        let fixed = BackendConfig {
            poll_interval: Some(Duration::from_millis(5)),
            ..Default::default()
        };
        assert_eq!(fixed.service_interval(0.375), Duration::from_millis(5));
    }

    #[test]
    fn test_rejects_bad_values() {
        let empty = BackendConfig {
            device_queue_depth: 0,
            ..Default::default()
        };
        assert!(empty.validate().is_err());

        let stalled = BackendConfig {
            service_factor: 0.0,
            ..Default::default()
        };
        assert!(stalled.validate().is_err());

        let undefined = BackendConfig {
            service_factor: f64::NAN,
            ..Default::default()
        };
        assert!(undefined.validate().is_err());
    }
}
