//! Sub-configuration structs with defaults matching the production constants.

use serde::{Deserialize, Serialize};

/// Bytes per megabyte as used by every size limit in the config.
pub const MIB: u64 = 1024 * 1024;

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Interface to bind
    pub host: String,

    /// TCP port to listen on
    pub port: u16,

    /// Origins allowed to call the API from a browser
    pub allowed_origins: Vec<String>,

    /// Upper bound on processing time for one upload, in milliseconds
    pub request_timeout_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            allowed_origins: vec!["http://localhost:5173".to_string()],
            request_timeout_ms: 120_000,
        }
    }
}

impl ServerConfig {
    /// `host:port` string for binding.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Upload limits and routing thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Absolute upload ceiling in megabytes
    pub max_upload_mb: u64,

    /// Size above which compression is attempted
    pub soft_threshold_mb: u64,

    /// Size above which the ladder search is used instead of a single pass
    pub progressive_trigger_mb: u64,

    /// Maximum decodable width or height
    pub max_image_dimension: u32,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_upload_mb: 50,
            soft_threshold_mb: 15,
            progressive_trigger_mb: 25,
            max_image_dimension: 20_000,
        }
    }
}

impl LimitsConfig {
    pub fn max_upload_bytes(&self) -> usize {
        (self.max_upload_mb * MIB) as usize
    }

    pub fn soft_threshold_bytes(&self) -> usize {
        (self.soft_threshold_mb * MIB) as usize
    }

    pub fn progressive_trigger_bytes(&self) -> usize {
        (self.progressive_trigger_mb * MIB) as usize
    }
}

/// Compression parameters: output bounds, qualities and search ladders.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CompressionConfig {
    /// Output bounding box width
    pub max_width: u32,

    /// Output bounding box height
    pub max_height: u32,

    /// Quality for a single normalize pass
    pub default_quality: u8,

    /// Quality used when re-encoding uploads under the soft threshold
    pub passthrough_quality: u8,

    /// Byte budget for the ladder search, in megabytes
    pub target_size_mb: u64,

    /// Qualities tried at full bounds, highest first
    pub quality_ladder: Vec<u8>,

    /// Factors applied to the output bounds, largest first
    pub scale_ladder: Vec<f64>,

    /// Quality used on every scale ladder step
    pub scale_quality: u8,

    /// Quality of the best-effort pass
    pub fallback_quality: u8,

    /// Bounds of the best-effort pass
    pub fallback_width: u32,
    pub fallback_height: u32,
}

impl Default for CompressionConfig {
    fn default() -> Self {
        Self {
            max_width: 1920,
            max_height: 1080,
            default_quality: 85,
            passthrough_quality: 95,
            target_size_mb: 5,
            quality_ladder: vec![85, 75, 65, 55, 45, 35],
            scale_ladder: vec![0.8, 0.6, 0.4, 0.3],
            scale_quality: 35,
            fallback_quality: 20,
            fallback_width: 800,
            fallback_height: 600,
        }
    }
}

impl CompressionConfig {
    pub fn target_size_bytes(&self) -> usize {
        (self.target_size_mb * MIB) as usize
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    pub level: String,

    /// Log format (pretty, json)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}
