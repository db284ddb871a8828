//! Error types for the webfit upload pipeline.
//!
//! Errors are organized by who can act on them: rejected input is the
//! uploader's problem (HTTP 400), pipeline failures are ours (HTTP 500).

use thiserror::Error;

/// Top-level error type for webfit operations.
#[derive(Error, Debug)]
pub enum WebfitError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Pipeline processing errors
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// Upload handling errors
    #[error("Upload error: {0}")]
    Upload(#[from] UploadError),

    /// General I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the config file from disk
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse TOML configuration
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Configuration values are invalid
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Why an upload was refused before any processing happened.
///
/// The display text is sent back to the uploader verbatim.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    #[error("No filename provided")]
    MissingFilename,

    #[error("File is empty")]
    EmptyFile,

    #[error("File too large. Maximum size is {:.1}MB", as_float(.max_mb))]
    FileTooLarge { size: usize, max_mb: u64 },

    #[error("File type not supported. Please upload: JPG, PNG, GIF, BMP, WebP, TIFF, or HEIC")]
    UnsupportedExtension { filename: String },

    #[error("Invalid image dimensions")]
    InvalidDimensions { width: u32, height: u32 },

    #[error("Image dimensions too large (max {max}x{max})")]
    DimensionsTooLarge { width: u32, height: u32, max: u32 },

    #[error("Invalid image file: {0}")]
    InvalidImage(String),
}

fn as_float(megabytes: &u64) -> f64 {
    *megabytes as f64
}

/// Failures inside the decode → normalize → encode pipeline.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PipelineError {
    /// A single decode/convert/encode pass failed
    #[error("Image conversion failed: {0}")]
    Conversion(String),

    /// Every tier of the target-size search failed
    #[error("All compression methods failed: {}", .attempts.join("; "))]
    Exhausted { attempts: Vec<String> },

    /// Processing exceeded the per-request budget
    #[error("Timeout in {stage} stage after {timeout_ms}ms")]
    Timeout { stage: String, timeout_ms: u64 },

    /// The blocking worker running the pipeline died
    #[error("Processing task failed: {0}")]
    Task(String),
}

impl PipelineError {
    pub fn conversion(message: impl Into<String>) -> Self {
        PipelineError::Conversion(message.into())
    }
}

/// Errors returned by the upload orchestration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UploadError {
    #[error("{0}")]
    Rejected(#[from] RejectReason),

    #[error("Image processing failed: {0}")]
    Processing(PipelineError),

    #[error("Upload failed: {0}")]
    Internal(String),
}

impl UploadError {
    /// Maps upload errors to HTTP status codes.
    ///
    /// - Rejected → 400 (Bad Request)
    /// - Processing, Internal → 500 (Internal Server Error)
    pub fn status_code(&self) -> u16 {
        match self {
            UploadError::Rejected(_) => 400,
            UploadError::Processing(_) | UploadError::Internal(_) => 500,
        }
    }
}

/// Convenience type alias for webfit results.
pub type Result<T> = std::result::Result<T, WebfitError>;

/// Convenience type alias for pipeline-specific results.
pub type PipelineResult<T> = std::result::Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reject_reason_messages() {
        assert_eq!(RejectReason::MissingFilename.to_string(), "No filename provided");
        assert_eq!(RejectReason::EmptyFile.to_string(), "File is empty");
        let too_large = RejectReason::FileTooLarge {
            size: 60 * 1024 * 1024,
            max_mb: 50,
        };
        assert_eq!(too_large.to_string(), "File too large. Maximum size is 50.0MB");
        let dims = RejectReason::DimensionsTooLarge {
            width: 30000,
            height: 10,
            max: 20000,
        };
        assert_eq!(dims.to_string(), "Image dimensions too large (max 20000x20000)");
    }

    #[test]
    fn test_exhausted_lists_every_attempt() {
        let err = PipelineError::Exhausted {
            attempts: vec!["quality 85: boom".into(), "fallback: bust".into()],
        };
        assert_eq!(
            err.to_string(),
            "All compression methods failed: quality 85: boom; fallback: bust"
        );
    }

    #[test]
    fn test_upload_error_status_codes() {
        assert_eq!(UploadError::from(RejectReason::EmptyFile).status_code(), 400);
        let processing = UploadError::Processing(PipelineError::conversion("bad huffman table"));
        assert_eq!(processing.status_code(), 500);
        assert_eq!(
            processing.to_string(),
            "Image processing failed: Image conversion failed: bad huffman table"
        );
        assert_eq!(UploadError::Internal("x".into()).status_code(), 500);
    }

    #[test]
    fn test_rejection_passes_reason_through() {
        let err = UploadError::from(RejectReason::InvalidImage("truncated".into()));
        assert_eq!(err.to_string(), "Invalid image file: truncated");
    }

    #[test]
    fn test_errors_are_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<PipelineError>();
        assert_send_sync::<UploadError>();
    }
}
