//! Configuration validation with range and ordering checks.

use crate::error::ConfigError;

use super::Config;

fn invalid(message: impl Into<String>) -> ConfigError {
    ConfigError::ValidationError(message.into())
}

fn check_quality(name: &str, quality: u8) -> Result<(), ConfigError> {
    if !(1..=100).contains(&quality) {
        return Err(invalid(format!("{name} must be between 1 and 100")));
    }
    Ok(())
}

impl Config {
    /// Validate configuration values are within acceptable ranges.
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        let limits = &self.limits;
        if limits.max_upload_mb == 0 {
            return Err(invalid("limits.max_upload_mb must be > 0"));
        }
        if limits.max_image_dimension == 0 {
            return Err(invalid("limits.max_image_dimension must be > 0"));
        }
        if limits.soft_threshold_mb > limits.progressive_trigger_mb
            || limits.progressive_trigger_mb > limits.max_upload_mb
        {
            return Err(invalid(
                "limits must satisfy soft_threshold_mb <= progressive_trigger_mb <= max_upload_mb",
            ));
        }

        let compression = &self.compression;
        if compression.max_width == 0 || compression.max_height == 0 {
            return Err(invalid("compression.max_width and max_height must be > 0"));
        }
        if compression.fallback_width == 0 || compression.fallback_height == 0 {
            return Err(invalid(
                "compression.fallback_width and fallback_height must be > 0",
            ));
        }
        if compression.target_size_mb == 0 {
            return Err(invalid("compression.target_size_mb must be > 0"));
        }
        check_quality("compression.default_quality", compression.default_quality)?;
        check_quality("compression.passthrough_quality", compression.passthrough_quality)?;
        check_quality("compression.scale_quality", compression.scale_quality)?;
        check_quality("compression.fallback_quality", compression.fallback_quality)?;

        if compression.quality_ladder.is_empty() {
            return Err(invalid("compression.quality_ladder must not be empty"));
        }
        for &quality in &compression.quality_ladder {
            check_quality("compression.quality_ladder entries", quality)?;
        }
        if compression.quality_ladder.windows(2).any(|w| w[0] <= w[1]) {
            return Err(invalid(
                "compression.quality_ladder must be strictly descending",
            ));
        }

        if compression.scale_ladder.is_empty() {
            return Err(invalid("compression.scale_ladder must not be empty"));
        }
        if compression
            .scale_ladder
            .iter()
            .any(|&s| !(s > 0.0 && s <= 1.0))
        {
            return Err(invalid(
                "compression.scale_ladder entries must be in (0.0, 1.0]",
            ));
        }
        if compression.scale_ladder.windows(2).any(|w| w[0] <= w[1]) {
            return Err(invalid("compression.scale_ladder must be strictly descending"));
        }

        if self.server.request_timeout_ms == 0 {
            return Err(invalid("server.request_timeout_ms must be > 0"));
        }
        if !matches!(self.logging.format.as_str(), "pretty" | "json") {
            return Err(invalid("logging.format must be \"pretty\" or \"json\""));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_passes_validation() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_upload_limit() {
        let mut config = Config::default();
        config.limits.max_upload_mb = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("max_upload_mb"));
    }

    #[test]
    fn test_validate_rejects_misordered_thresholds() {
        let mut config = Config::default();
        config.limits.soft_threshold_mb = 30;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("soft_threshold_mb"));
    }

    #[test]
    fn test_validate_rejects_ascending_quality_ladder() {
        let mut config = Config::default();
        config.compression.quality_ladder = vec![35, 55, 85];
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("strictly descending"));
    }

    #[test]
    fn test_validate_rejects_out_of_range_quality() {
        let mut config = Config::default();
        config.compression.fallback_quality = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("fallback_quality"));

        let mut config = Config::default();
        config.compression.quality_ladder = vec![120, 80];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_scale_factor() {
        let mut config = Config::default();
        config.compression.scale_ladder = vec![1.5, 0.5];
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("scale_ladder"));

        config.compression.scale_ladder = vec![0.3, 0.6];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_unknown_log_format() {
        let mut config = Config::default();
        config.logging.format = "xml".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("logging.format"));
    }
}
