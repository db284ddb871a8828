//! Upload orchestration: admission gates, routing and response assembly.
//!
//! Every accepted upload leaves as JPEG unless the consistency pass on a
//! small file fails, in which case the original bytes are returned as-is.

use std::sync::Arc;
use std::time::Duration;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use tokio::time::timeout;

use crate::config::{Config, LimitsConfig};
use crate::error::{PipelineError, RejectReason, UploadError};
use crate::pipeline::encode::WEB_CONTENT_TYPE;
use crate::pipeline::normalize::NormalizeOptions;
use crate::pipeline::sniff::{check_filename, is_heif_family, Sniffer, SUPPORTED_FORMAT_NAMES};
use crate::pipeline::Compressor;
use crate::types::{
    bytes_to_mb, CompressionComparison, CompressionMetadata, CompressionStats, FileInfo,
    ImageInfo, StrategyResult, UploadResponse,
};

/// Processing path chosen for an admitted upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Ladder search toward the byte budget
    ProgressiveSearch,
    /// One normalize pass at the default quality
    DirectConvert,
    /// Re-encode at high quality for format consistency, original on failure
    ConsistencyConvert,
}

/// Pick the processing path from filename and size.
///
/// HEIC/HEIF is always converted. Otherwise conversion is forced above the
/// soft threshold, and the ladder search takes over above the progressive
/// trigger.
pub fn plan_route(filename: &str, size: usize, limits: &LimitsConfig) -> Route {
    if is_heif_family(filename) || size > limits.soft_threshold_bytes() {
        if size > limits.progressive_trigger_bytes() {
            Route::ProgressiveSearch
        } else {
            Route::DirectConvert
        }
    } else {
        Route::ConsistencyConvert
    }
}

/// Result of handling one upload, before base64 encoding.
#[derive(Debug, Clone)]
pub struct UploadOutcome {
    pub bytes: Vec<u8>,
    pub route: Route,
    pub compression_applied: bool,
    pub metadata: CompressionMetadata,
    pub file_info: FileInfo,
}

impl UploadOutcome {
    pub fn into_response(self) -> UploadResponse {
        UploadResponse {
            image: BASE64.encode(&self.bytes),
            compression_applied: self.compression_applied,
            metadata: self.metadata,
            file_info: self.file_info,
        }
    }
}

/// Handles uploads end to end. Cheap to share behind an `Arc`.
pub struct UploadService {
    config: Config,
    sniffer: Sniffer,
    compressor: Compressor,
}

impl UploadService {
    pub fn new(config: Config) -> Self {
        let compressor = Compressor::new(&config);
        Self::with_compressor(config, compressor)
    }

    /// Use a pre-built compressor, e.g. one with a custom encoder.
    pub fn with_compressor(config: Config, compressor: Compressor) -> Self {
        Self {
            sniffer: Sniffer::new(&config.limits),
            compressor,
            config,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn compressor(&self) -> &Compressor {
        &self.compressor
    }

    /// Run every admission gate in order; the first failure wins.
    pub fn admit(&self, filename: &str, bytes: &[u8]) -> Result<ImageInfo, RejectReason> {
        if filename.is_empty() {
            return Err(RejectReason::MissingFilename);
        }
        if bytes.is_empty() {
            return Err(RejectReason::EmptyFile);
        }
        let limits = &self.config.limits;
        if bytes.len() > limits.max_upload_bytes() {
            return Err(RejectReason::FileTooLarge {
                size: bytes.len(),
                max_mb: limits.max_upload_mb,
            });
        }
        check_filename(filename)?;
        self.sniffer.validate(bytes)
    }

    /// Admit, route and convert one upload.
    pub fn process(&self, filename: &str, bytes: &[u8]) -> Result<UploadOutcome, UploadError> {
        let info = self.admit(filename, bytes).inspect_err(|reason| {
            tracing::info!(filename, %reason, "Upload rejected");
        })?;
        tracing::info!(filename, size = bytes.len(), "{}", info.description);

        let size = bytes.len();
        let route = plan_route(filename, size, &self.config.limits);
        let compression = &self.config.compression;
        tracing::debug!(filename, ?route, "Routing upload");

        let (final_bytes, metadata, compression_applied) = match route {
            Route::ProgressiveSearch => {
                let (artifact, metadata) = self
                    .compressor
                    .compress_to_target(bytes, compression.target_size_bytes())
                    .map_err(UploadError::Processing)?;
                (artifact.into_bytes(), metadata, true)
            }
            Route::DirectConvert => {
                let (artifact, metadata) = self
                    .compressor
                    .normalize(bytes, &NormalizeOptions::from_config(compression))
                    .map_err(UploadError::Processing)?;
                (artifact.into_bytes(), metadata, true)
            }
            Route::ConsistencyConvert => {
                let options = NormalizeOptions::from_config(compression)
                    .with_quality(compression.passthrough_quality);
                match self.compressor.normalize(bytes, &options) {
                    Ok((artifact, metadata)) => (artifact.into_bytes(), metadata, true),
                    Err(e) => {
                        tracing::warn!(
                            filename,
                            error = %e,
                            "Conversion failed, returning original"
                        );
                        let reason =
                            format!("under_{}mb_limit", self.config.limits.soft_threshold_mb);
                        (bytes.to_vec(), CompressionMetadata::passthrough(size, reason), false)
                    }
                }
            }
        };

        tracing::info!(
            filename,
            original = size,
            compressed = final_bytes.len(),
            applied = compression_applied,
            "Upload processed"
        );

        let file_info = FileInfo {
            filename: filename.to_string(),
            original_size: size,
            final_size: final_bytes.len(),
            content_type: WEB_CONTENT_TYPE.to_string(),
            web_compatible: true,
        };
        Ok(UploadOutcome {
            bytes: final_bytes,
            route,
            compression_applied,
            metadata,
            file_info,
        })
    }

    /// [`process`](Self::process) and base64-encode the result.
    pub fn handle(&self, filename: &str, bytes: &[u8]) -> Result<UploadResponse, UploadError> {
        self.process(filename, bytes).map(UploadOutcome::into_response)
    }

    /// Run [`process`](Self::process) on the blocking pool with the request timeout.
    pub async fn process_async(
        self: Arc<Self>,
        filename: String,
        bytes: Vec<u8>,
    ) -> Result<UploadOutcome, UploadError> {
        let timeout_ms = self.config.server.request_timeout_ms;
        offload("upload", timeout_ms, move || self.process(&filename, &bytes)).await
    }

    pub async fn handle_async(
        self: Arc<Self>,
        filename: String,
        bytes: Vec<u8>,
    ) -> Result<UploadResponse, UploadError> {
        self.process_async(filename, bytes)
            .await
            .map(UploadOutcome::into_response)
    }

    /// Static description of the compression setup.
    pub fn stats(&self) -> CompressionStats {
        let compression = &self.config.compression;
        CompressionStats {
            max_size_limit: format!("{:.1} MB", self.config.limits.soft_threshold_mb as f64),
            compression_enabled: true,
            supported_formats: SUPPORTED_FORMAT_NAMES.iter().map(|s| s.to_string()).collect(),
            max_dimensions: format!("{}x{}", compression.max_width, compression.max_height),
            default_quality: compression.default_quality,
        }
    }

    /// Run both a single default pass and the ladder search on the same input.
    pub fn compare(&self, bytes: &[u8]) -> Result<CompressionComparison, UploadError> {
        self.sniffer.validate(bytes)?;

        let (_, standard) = self
            .compressor
            .normalize_default(bytes)
            .map_err(UploadError::Processing)?;
        let (_, progressive) = self
            .compressor
            .compress_to_target(bytes, self.config.compression.target_size_bytes())
            .map_err(UploadError::Processing)?;

        Ok(CompressionComparison {
            original_size: bytes.len(),
            original_size_mb: bytes_to_mb(bytes.len()),
            compression_needed: bytes.len() > self.config.limits.soft_threshold_bytes(),
            standard_compression: StrategyResult::from_metadata(&standard),
            progressive_compression: StrategyResult::from_metadata(&progressive),
        })
    }

    pub async fn compare_async(
        self: Arc<Self>,
        bytes: Vec<u8>,
    ) -> Result<CompressionComparison, UploadError> {
        let timeout_ms = self.config.server.request_timeout_ms;
        offload("compare", timeout_ms, move || self.compare(&bytes)).await
    }
}

/// Run CPU-bound work on the blocking pool, bounded by a timeout.
///
/// On timeout the worker keeps running to completion; only the caller stops
/// waiting.
async fn offload<T, F>(stage: &str, timeout_ms: u64, work: F) -> Result<T, UploadError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, UploadError> + Send + 'static,
{
    let result = timeout(
        Duration::from_millis(timeout_ms),
        tokio::task::spawn_blocking(work),
    )
    .await;

    match result {
        Ok(Ok(outcome)) => outcome,
        Ok(Err(e)) => Err(UploadError::Internal(
            PipelineError::Task(e.to_string()).to_string(),
        )),
        Err(_) => {
            tracing::error!(stage, timeout_ms, "Processing timed out");
            Err(UploadError::Processing(PipelineError::Timeout {
                stage: stage.to_string(),
                timeout_ms,
            }))
        }
    }
}
