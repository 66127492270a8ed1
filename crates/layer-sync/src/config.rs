//! Configuration for layer synchronization.

use serde::{Deserialize, Serialize};

/// Configuration for a layer's sync behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Upper bound on grid precision, regardless of zoom or style refinement.
    /// The backend supports geohash precisions 1 through 12.
    pub max_precision: u8,

    /// Fractional padding applied per side to the visible extent before
    /// fetching, so small pans are served from cache. 0.5 doubles each
    /// dimension of the fetched extent.
    pub extent_buffer: f64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            max_precision: 12,
            extent_buffer: 0.5,
        }
    }
}

impl SyncConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("LAYER_SYNC_MAX_PRECISION") {
            if let Ok(precision) = val.parse() {
                config.max_precision = precision;
            }
        }

        if let Ok(val) = std::env::var("LAYER_SYNC_EXTENT_BUFFER") {
            if let Ok(buffer) = val.parse() {
                config.extent_buffer = buffer;
            }
        }

        config
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_precision == 0 || self.max_precision > 12 {
            return Err("max_precision must be 1-12".to_string());
        }

        if !self.extent_buffer.is_finite() || self.extent_buffer < 0.0 {
            return Err("extent_buffer must be a non-negative finite number".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SyncConfig::default();
        assert_eq!(config.max_precision, 12);
        assert_eq!(config.extent_buffer, 0.5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = SyncConfig::default();

        config.max_precision = 0;
        assert!(config.validate().is_err());

        config.max_precision = 13;
        assert!(config.validate().is_err());

        config = SyncConfig::default();
        config.extent_buffer = -0.1;
        assert!(config.validate().is_err());

        config.extent_buffer = f64::NAN;
        assert!(config.validate().is_err());
    }
}
