//! Core data types for the webfit pipeline.
//!
//! These types are what leaves the pipeline: metadata describing how an
//! upload was transformed and the JSON payloads the HTTP surface returns.

use serde::{Deserialize, Serialize};

/// Result of a successful content validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageInfo {
    /// Detected source format ("JPEG", "PNG", "HEIF", ...)
    pub format: String,

    /// Image width in pixels
    pub width: u32,

    /// Image height in pixels
    pub height: u32,

    /// Human-readable summary, e.g. "Valid PNG image (640x480)"
    pub description: String,
}

/// How the final bytes were produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Method {
    /// Decoded, normalized and re-encoded as JPEG
    ConvertedToJpeg,
    /// Original bytes returned untouched
    NoProcessing,
}

/// Which tier of the target-size search produced the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompressionLevel {
    /// Quality ladder at full bounds
    Progressive,
    /// Scale ladder at reduced bounds
    ProgressiveWithResize,
    /// Best-effort pass, target not guaranteed
    MaximumEffort,
}

/// Everything known about how one upload was transformed.
///
/// Optional fields are omitted from JSON when absent; a passthrough record
/// carries only sizes, ratio, method and reason.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompressionMetadata {
    /// Input size in bytes
    pub original_size: usize,

    /// Output size in bytes
    pub final_size: usize,

    /// Source (width, height)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_dimensions: Option<(u32, u32)>,

    /// Output (width, height)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_dimensions: Option<(u32, u32)>,

    /// Source format tag
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_format: Option<String>,

    /// Output format tag, always "JPEG" after conversion
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_format: Option<String>,

    /// Source color mode ("RGB", "RGBA", "P", ...)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_mode: Option<String>,

    /// final_size / original_size, three decimals
    pub compression_ratio: f64,

    /// (1 - ratio) * 100, one decimal; negative when the output grew
    pub savings_percent: f64,

    /// Encoder quality of the accepted pass
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality_used: Option<u8>,

    pub method: Method,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub web_compatible: Option<bool>,

    /// Search tier, only set by the target-size search
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compression_level: Option<CompressionLevel>,

    /// Scale factor of the accepted scale ladder step
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scale_factor: Option<f64>,

    /// Whether the byte budget was met, only set by the target-size search
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_achieved: Option<bool>,

    /// Why no processing happened
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Source-side facts carried into a conversion record.
#[derive(Debug, Clone)]
pub struct SourceSummary {
    pub size: usize,
    pub dimensions: (u32, u32),
    pub format: String,
    pub mode: String,
}

impl CompressionMetadata {
    /// Record for a completed JPEG conversion.
    pub fn converted(
        source: &SourceSummary,
        final_size: usize,
        final_dimensions: (u32, u32),
        quality: u8,
    ) -> Self {
        let (compression_ratio, savings_percent) = size_stats(source.size, final_size);
        Self {
            original_size: source.size,
            final_size,
            original_dimensions: Some(source.dimensions),
            final_dimensions: Some(final_dimensions),
            original_format: Some(source.format.clone()),
            final_format: Some("JPEG".to_string()),
            original_mode: Some(source.mode.clone()),
            compression_ratio,
            savings_percent,
            quality_used: Some(quality),
            method: Method::ConvertedToJpeg,
            web_compatible: Some(true),
            compression_level: None,
            scale_factor: None,
            target_achieved: None,
            reason: None,
        }
    }

    /// Record for bytes returned as uploaded.
    pub fn passthrough(size: usize, reason: impl Into<String>) -> Self {
        Self {
            original_size: size,
            final_size: size,
            original_dimensions: None,
            final_dimensions: None,
            original_format: None,
            final_format: None,
            original_mode: None,
            compression_ratio: 1.0,
            savings_percent: 0.0,
            quality_used: None,
            method: Method::NoProcessing,
            web_compatible: None,
            compression_level: None,
            scale_factor: None,
            target_achieved: None,
            reason: Some(reason.into()),
        }
    }

    /// Tag this record with the search tier that produced it.
    pub fn with_search_outcome(mut self, level: CompressionLevel, target_achieved: bool) -> Self {
        self.compression_level = Some(level);
        self.target_achieved = Some(target_achieved);
        self
    }
}

/// Ratio rounded to 3 decimals and savings percent rounded to 1 decimal.
fn size_stats(original: usize, final_size: usize) -> (f64, f64) {
    if original == 0 {
        return (1.0, 0.0);
    }
    let ratio = final_size as f64 / original as f64;
    let savings = ((1.0 - ratio) * 100.0 * 10.0).round() / 10.0;
    ((ratio * 1000.0).round() / 1000.0, savings)
}

/// File details echoed back to the uploader.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileInfo {
    pub filename: String,
    pub original_size: usize,
    pub final_size: usize,
    pub content_type: String,
    pub web_compatible: bool,
}

/// Response body of a successful upload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadResponse {
    /// Base64 of the final bytes
    pub image: String,
    pub compression_applied: bool,
    pub metadata: CompressionMetadata,
    pub file_info: FileInfo,
}

/// Static description of the compression setup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompressionStats {
    pub max_size_limit: String,
    pub compression_enabled: bool,
    pub supported_formats: Vec<String>,
    pub max_dimensions: String,
    pub default_quality: u8,
}

/// Size outcome of one compression strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyResult {
    pub size: usize,
    pub size_mb: f64,
    pub savings: f64,
}

impl StrategyResult {
    pub fn from_metadata(metadata: &CompressionMetadata) -> Self {
        Self {
            size: metadata.final_size,
            size_mb: bytes_to_mb(metadata.final_size),
            savings: metadata.savings_percent,
        }
    }
}

/// Side-by-side result of a single pass and the ladder search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompressionComparison {
    pub original_size: usize,
    pub original_size_mb: f64,
    pub compression_needed: bool,
    pub standard_compression: StrategyResult,
    pub progressive_compression: StrategyResult,
}

/// Megabytes rounded to two decimals.
pub fn bytes_to_mb(bytes: usize) -> f64 {
    ((bytes as f64 / (1024.0 * 1024.0)) * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(size: usize) -> SourceSummary {
        SourceSummary {
            size,
            dimensions: (4000, 3000),
            format: "PNG".to_string(),
            mode: "RGBA".to_string(),
        }
    }

    #[test]
    fn test_converted_metadata_stats() {
        let meta = CompressionMetadata::converted(&source(1000), 250, (1440, 1080), 85);
        assert_eq!(meta.compression_ratio, 0.25);
        assert_eq!(meta.savings_percent, 75.0);
        assert_eq!(meta.final_format.as_deref(), Some("JPEG"));
        assert_eq!(meta.method, Method::ConvertedToJpeg);
        assert_eq!(meta.web_compatible, Some(true));
        assert!(meta.compression_level.is_none());
    }

    #[test]
    fn test_savings_can_be_negative() {
        let meta = CompressionMetadata::converted(&source(1000), 1234, (10, 10), 95);
        assert_eq!(meta.compression_ratio, 1.234);
        assert_eq!(meta.savings_percent, -23.4);
    }

    #[test]
    fn test_ratio_rounding() {
        let meta = CompressionMetadata::converted(&source(3), 1, (1, 1), 85);
        assert_eq!(meta.compression_ratio, 0.333);
        assert_eq!(meta.savings_percent, 66.7);
    }

    #[test]
    fn test_passthrough_serialization_omits_conversion_fields() {
        let meta = CompressionMetadata::passthrough(2048, "under_15mb_limit");
        let json = serde_json::to_value(&meta).unwrap();
        assert_eq!(json["method"], "no_processing");
        assert_eq!(json["reason"], "under_15mb_limit");
        assert_eq!(json["compression_ratio"], 1.0);
        assert!(json.get("final_dimensions").is_none());
        assert!(json.get("quality_used").is_none());
    }

    #[test]
    fn test_search_outcome_serialization() {
        let meta = CompressionMetadata::converted(&source(1000), 100, (800, 600), 20)
            .with_search_outcome(CompressionLevel::MaximumEffort, false);
        let json = serde_json::to_value(&meta).unwrap();
        assert_eq!(json["compression_level"], "maximum_effort");
        assert_eq!(json["target_achieved"], false);
        assert_eq!(json["final_dimensions"], serde_json::json!([800, 600]));
        assert_eq!(json["method"], "converted_to_jpeg");
    }

    #[test]
    fn test_bytes_to_mb() {
        assert_eq!(bytes_to_mb(1024 * 1024), 1.0);
        assert_eq!(bytes_to_mb(1536 * 1024), 1.5);
        assert_eq!(bytes_to_mb(0), 0.0);
    }
}
