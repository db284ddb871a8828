//! Target-size search over quality and scale ladders.
//!
//! The source is decoded and canonicalized once. Tiers run in order:
//!
//! 1. quality ladder at full bounds; a failed pass moves on to the next quality
//! 2. scale ladder at reduced bounds and fixed quality; a failed pass abandons
//!    the tier
//! 3. one best-effort pass at fallback bounds, returned even if over budget

use crate::error::{PipelineError, PipelineResult};
use crate::types::CompressionLevel;

use super::normalize::fit_within;
use super::processor::{Compressed, Compressor};

/// Bounds for one scale ladder step, truncated like an integer cast.
pub fn scaled_bounds(max_width: u32, max_height: u32, scale: f64) -> (u32, u32) {
    let width = ((max_width as f64 * scale) as u32).max(1);
    let height = ((max_height as f64 * scale) as u32).max(1);
    (width, height)
}

impl Compressor {
    /// Compress until the output fits in `target_bytes`.
    ///
    /// Returns the first pass within budget. When no ladder step fits, the
    /// fallback pass is returned with `target_achieved = false`. Fails only
    /// when the fallback itself fails; the error lists every failed attempt.
    pub fn compress_to_target(
        &self,
        bytes: &[u8],
        target_bytes: usize,
    ) -> PipelineResult<Compressed> {
        let settings = self.settings();
        tracing::info!(
            "Progressive compression, target {:.1}MB",
            target_bytes as f64 / (1024.0 * 1024.0)
        );

        let prepared = self.prepare(bytes).map_err(|e| PipelineError::Exhausted {
            attempts: vec![format!("decode: {}", e)],
        })?;
        let mut failures = Vec::new();

        let full = fit_within(&prepared.canonical, settings.max_width, settings.max_height);
        for &quality in &settings.quality_ladder {
            match self.encode_fitted(&prepared, &full, quality) {
                Ok((artifact, metadata)) if artifact.len() <= target_bytes => {
                    tracing::info!(quality, size = artifact.len(), "Target reached");
                    let metadata =
                        metadata.with_search_outcome(CompressionLevel::Progressive, true);
                    return Ok((artifact, metadata));
                }
                Ok((artifact, _)) => {
                    tracing::debug!(quality, size = artifact.len(), "Over target");
                }
                Err(e) => {
                    tracing::warn!(quality, error = %e, "Quality pass failed");
                    failures.push(format!("quality {}: {}", quality, e));
                }
            }
        }
        drop(full);

        for &scale in &settings.scale_ladder {
            let (width, height) = scaled_bounds(settings.max_width, settings.max_height, scale);
            match self.pass(&prepared, width, height, settings.scale_quality) {
                Ok((artifact, metadata)) if artifact.len() <= target_bytes => {
                    tracing::info!(scale, size = artifact.len(), "Target reached with resize");
                    let mut metadata =
                        metadata.with_search_outcome(CompressionLevel::ProgressiveWithResize, true);
                    metadata.scale_factor = Some(scale);
                    return Ok((artifact, metadata));
                }
                Ok((artifact, _)) => {
                    tracing::debug!(scale, size = artifact.len(), "Over target");
                }
                Err(e) => {
                    tracing::warn!(scale, error = %e, "Progressive resize failed");
                    failures.push(format!("scale {}: {}", scale, e));
                    break;
                }
            }
        }

        match self.pass(
            &prepared,
            settings.fallback_width,
            settings.fallback_height,
            settings.fallback_quality,
        ) {
            Ok((artifact, metadata)) => {
                tracing::warn!(size = artifact.len(), "Target not reached, returning best effort");
                let metadata = metadata.with_search_outcome(CompressionLevel::MaximumEffort, false);
                Ok((artifact, metadata))
            }
            Err(e) => {
                tracing::error!(error = %e, "All compression methods failed");
                failures.push(format!("fallback: {}", e));
                Err(PipelineError::Exhausted { attempts: failures })
            }
        }
    }
}
