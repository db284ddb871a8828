//! Compressor orchestration: decode, canonicalize, fit and encode.

use image::RgbImage;

use crate::config::{CompressionConfig, Config};
use crate::error::PipelineResult;
use crate::types::{CompressionMetadata, SourceSummary};

use super::decode::ImageDecoder;
use super::encode::{EncodedArtifact, JpegWebEncoder, WebEncoder};
use super::normalize::{canonicalize, fit_within, NormalizeOptions};

/// A converted image together with its metadata record.
pub type Compressed = (EncodedArtifact, CompressionMetadata);

/// Canonical pixels ready for any number of encode passes.
pub(crate) struct Prepared {
    pub(crate) canonical: RgbImage,
    pub(crate) source: SourceSummary,
}

/// Converts arbitrary uploads into web-ready JPEG output.
pub struct Compressor {
    decoder: ImageDecoder,
    encoder: Box<dyn WebEncoder>,
    settings: CompressionConfig,
}

impl Compressor {
    /// Create a compressor with the JPEG encoder.
    pub fn new(config: &Config) -> Self {
        Self::with_encoder(config, Box::new(JpegWebEncoder))
    }

    /// Create a compressor with a custom encoder.
    pub fn with_encoder(config: &Config, encoder: Box<dyn WebEncoder>) -> Self {
        Self {
            decoder: ImageDecoder::new(&config.limits),
            encoder,
            settings: config.compression.clone(),
        }
    }

    pub fn settings(&self) -> &CompressionConfig {
        &self.settings
    }

    /// Single conversion pass: fit within bounds and encode once.
    pub fn normalize(
        &self,
        bytes: &[u8],
        options: &NormalizeOptions,
    ) -> PipelineResult<Compressed> {
        let start = std::time::Instant::now();
        let prepared = self.prepare(bytes)?;
        let result = self.pass(
            &prepared,
            options.max_width,
            options.max_height,
            options.quality,
        )?;
        tracing::debug!(
            elapsed = ?start.elapsed(),
            original = result.1.original_size,
            compressed = result.1.final_size,
            "Compressed"
        );
        Ok(result)
    }

    /// [`normalize`](Self::normalize) with the configured bounds and default quality.
    pub fn normalize_default(&self, bytes: &[u8]) -> PipelineResult<Compressed> {
        self.normalize(bytes, &NormalizeOptions::from_config(&self.settings))
    }

    /// Decode once and convert to canonical RGB.
    pub(crate) fn prepare(&self, bytes: &[u8]) -> PipelineResult<Prepared> {
        let decode_start = std::time::Instant::now();
        let decoded = self.decoder.decode(bytes)?;
        tracing::trace!("  Decode: {:?}", decode_start.elapsed());

        tracing::info!(
            "Converting {} to JPEG: {}x{}, mode: {}",
            decoded.format.as_str(),
            decoded.width,
            decoded.height,
            decoded.color_mode.as_str()
        );
        if decoded.color_mode.has_alpha() {
            tracing::debug!(
                "Flattening {} onto white background",
                decoded.color_mode.as_str()
            );
        }

        let source = SourceSummary {
            size: decoded.byte_size,
            dimensions: (decoded.width, decoded.height),
            format: decoded.format.as_str().to_string(),
            mode: decoded.color_mode.as_str().to_string(),
        };
        let canonical = canonicalize(&decoded.image);
        Ok(Prepared { canonical, source })
    }

    /// Fit prepared pixels within the bounds and encode at `quality`.
    pub(crate) fn pass(
        &self,
        prepared: &Prepared,
        max_width: u32,
        max_height: u32,
        quality: u8,
    ) -> PipelineResult<Compressed> {
        let fitted = fit_within(&prepared.canonical, max_width, max_height);
        self.encode_fitted(prepared, &fitted, quality)
    }

    /// Encode pixels that already fit their bounds.
    pub(crate) fn encode_fitted(
        &self,
        prepared: &Prepared,
        fitted: &RgbImage,
        quality: u8,
    ) -> PipelineResult<Compressed> {
        let encode_start = std::time::Instant::now();
        let bytes = self.encoder.encode(fitted, quality)?;
        tracing::trace!("  Encode q{}: {:?}", quality, encode_start.elapsed());

        let dimensions = fitted.dimensions();
        let metadata =
            CompressionMetadata::converted(&prepared.source, bytes.len(), dimensions, quality);
        Ok((EncodedArtifact::new(bytes, dimensions.0, dimensions.1), metadata))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PipelineError;
    use crate::types::Method;
    use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
    use std::io::Cursor;

    fn encode(image: &DynamicImage, format: ImageFormat) -> Vec<u8> {
        let mut buffer = Cursor::new(Vec::new());
        image.write_to(&mut buffer, format).unwrap();
        buffer.into_inner()
    }

    #[test]
    fn test_normalize_fits_bounds_and_keeps_aspect() {
        let compressor = Compressor::new(&Config::default());
        let bytes = encode(&DynamicImage::new_rgb8(4000, 3000), ImageFormat::Png);
        let (artifact, meta) = compressor.normalize_default(&bytes).unwrap();

        assert_eq!(artifact.dimensions(), (1440, 1080));
        assert_eq!(meta.final_dimensions, Some((1440, 1080)));
        assert_eq!(meta.original_dimensions, Some((4000, 3000)));
        assert_eq!(meta.original_format.as_deref(), Some("PNG"));
        assert_eq!(meta.quality_used, Some(85));
        assert_eq!(meta.method, Method::ConvertedToJpeg);
        assert_eq!(meta.final_size, artifact.len());
        assert_eq!(image::guess_format(artifact.bytes()).unwrap(), ImageFormat::Jpeg);
    }

    #[test]
    fn test_normalize_does_not_upscale() {
        let compressor = Compressor::new(&Config::default());
        let bytes = encode(&DynamicImage::new_rgb8(300, 200), ImageFormat::Bmp);
        let (artifact, meta) = compressor.normalize_default(&bytes).unwrap();
        assert_eq!(artifact.dimensions(), (300, 200));
        assert_eq!(meta.original_format.as_deref(), Some("BMP"));
    }

    #[test]
    fn test_normalize_round_trip_dimensions() {
        let compressor = Compressor::new(&Config::default());
        let bytes = encode(&DynamicImage::new_rgb8(2500, 900), ImageFormat::Png);
        let (artifact, meta) = compressor.normalize_default(&bytes).unwrap();

        let reopened = image::load_from_memory(artifact.bytes()).unwrap();
        assert_eq!(
            (reopened.width(), reopened.height()),
            meta.final_dimensions.unwrap()
        );
    }

    #[test]
    fn test_normalize_flattens_transparency() {
        let compressor = Compressor::new(&Config::default());
        let rgba = RgbaImage::from_pixel(64, 64, Rgba([0, 0, 0, 0]));
        let bytes = encode(&DynamicImage::ImageRgba8(rgba), ImageFormat::Png);
        let (artifact, meta) = compressor.normalize_default(&bytes).unwrap();
        assert_eq!(meta.original_mode.as_deref(), Some("RGBA"));

        let reopened = image::load_from_memory(artifact.bytes()).unwrap().to_rgb8();
        let pixel = reopened.get_pixel(32, 32);
        assert!(pixel.0.iter().all(|&c| c > 245), "pixel = {:?}", pixel);
    }

    #[test]
    fn test_normalize_flattens_palette_transparency() {
        let compressor = Compressor::new(&Config::default());
        let mut rgba = RgbaImage::from_pixel(32, 32, Rgba([0, 0, 0, 0]));
        for x in 0..4 {
            for y in 0..4 {
                rgba.put_pixel(x, y, Rgba([200, 20, 20, 255]));
            }
        }
        let bytes = encode(&DynamicImage::ImageRgba8(rgba), ImageFormat::Gif);
        let (artifact, meta) = compressor.normalize_default(&bytes).unwrap();
        assert_eq!(meta.original_format.as_deref(), Some("GIF"));
        assert_eq!(meta.original_mode.as_deref(), Some("P"));

        let reopened = image::load_from_memory(artifact.bytes()).unwrap().to_rgb8();
        assert_eq!(reopened.dimensions(), (32, 32));
        let pixel = reopened.get_pixel(24, 24);
        assert!(pixel.0.iter().all(|&c| c > 240), "pixel = {:?}", pixel);
    }

    #[test]
    fn test_custom_bounds_and_quality() {
        let compressor = Compressor::new(&Config::default());
        let bytes = encode(&DynamicImage::new_rgb8(1000, 1000), ImageFormat::Png);
        let options = NormalizeOptions::new(100, 50, 40);
        let (artifact, meta) = compressor.normalize(&bytes, &options).unwrap();
        assert_eq!(artifact.dimensions(), (50, 50));
        assert_eq!(meta.quality_used, Some(40));
    }

    #[test]
    fn test_normalize_rejects_non_image() {
        let compressor = Compressor::new(&Config::default());
        let err = compressor.normalize_default(b"not an image").unwrap_err();
        assert!(matches!(err, PipelineError::Conversion(_)));
    }
}
