//! Web codec encoding.

use std::panic::{self, AssertUnwindSafe};

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use image::RgbImage;
use mozjpeg::{ColorSpace, Compress};

use crate::error::{PipelineError, PipelineResult};

/// MIME type of every converted output.
pub const WEB_CONTENT_TYPE: &str = "image/jpeg";

/// Encodes canonical RGB pixels into web-deliverable bytes.
///
/// The search ladders only depend on this seam, so tests can substitute an
/// encoder with scripted output sizes.
pub trait WebEncoder: Send + Sync {
    /// Encode at the given quality (1-100).
    fn encode(&self, image: &RgbImage, quality: u8) -> PipelineResult<Vec<u8>>;
}

/// Baseline JPEG encoder backed by mozjpeg, with optimized Huffman tables.
#[derive(Debug, Clone, Copy, Default)]
pub struct JpegWebEncoder;

impl WebEncoder for JpegWebEncoder {
    fn encode(&self, image: &RgbImage, quality: u8) -> PipelineResult<Vec<u8>> {
        encode_jpeg(image, quality, true)
    }
}

/// mozjpeg reports codec errors by unwinding, so the call is isolated.
fn encode_jpeg(image: &RgbImage, quality: u8, optimize_coding: bool) -> PipelineResult<Vec<u8>> {
    let quality = quality.clamp(1, 100);
    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        compress_rgb(image, quality, optimize_coding)
    }));

    match result {
        Ok(Ok(bytes)) => Ok(bytes),
        Ok(Err(e)) => Err(PipelineError::conversion(format!("JPEG encoding failed: {}", e))),
        Err(_) => Err(PipelineError::conversion("JPEG encoding failed: codec error")),
    }
}

fn compress_rgb(image: &RgbImage, quality: u8, optimize_coding: bool) -> std::io::Result<Vec<u8>> {
    let (width, height) = image.dimensions();
    let mut comp = Compress::new(ColorSpace::JCS_RGB);
    comp.set_size(width as usize, height as usize);
    comp.set_color_space(ColorSpace::JCS_YCbCr);
    comp.set_quality(quality as f32);
    comp.set_chroma_sampling_pixel_sizes((2, 2), (2, 2));
    comp.set_optimize_coding(optimize_coding);

    let estimated = (width as usize * height as usize * 3 / 10).max(4096);
    let mut writer = comp.start_compress(Vec::with_capacity(estimated))?;
    let stride = width as usize * 3;
    for row in image.as_raw().chunks(stride) {
        writer.write_scanlines(row)?;
    }
    writer.finish()
}

/// Encoded output with its pixel dimensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedArtifact {
    bytes: Vec<u8>,
    width: u32,
    height: u32,
}

impl EncodedArtifact {
    pub fn new(bytes: Vec<u8>, width: u32, height: u32) -> Self {
        Self {
            bytes,
            width,
            height,
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn content_type(&self) -> &'static str {
        WEB_CONTENT_TYPE
    }

    pub fn to_base64(&self) -> String {
        BASE64.encode(&self.bytes)
    }
}
