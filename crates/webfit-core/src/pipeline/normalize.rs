//! Canonical pixel form: opaque 8-bit RGB within a bounding box.

use std::borrow::Cow;

use image::imageops::FilterType;
use image::{DynamicImage, Rgb, RgbImage, Rgba, RgbaImage};

use crate::config::CompressionConfig;

/// Bounds and quality for a single normalize pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NormalizeOptions {
    pub max_width: u32,
    pub max_height: u32,
    pub quality: u8,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self::from_config(&CompressionConfig::default())
    }
}

impl NormalizeOptions {
    pub fn new(max_width: u32, max_height: u32, quality: u8) -> Self {
        Self {
            max_width,
            max_height,
            quality,
        }
    }

    /// Configured bounds with the default quality.
    pub fn from_config(config: &CompressionConfig) -> Self {
        Self::new(config.max_width, config.max_height, config.default_quality)
    }

    pub fn with_quality(mut self, quality: u8) -> Self {
        self.quality = quality;
        self
    }
}

/// Convert any decoded image to opaque RGB.
///
/// Images with an alpha channel are composited over white using their own
/// alpha as the mask. Everything else (grayscale, 16-bit, float) is converted
/// directly.
pub fn canonicalize(image: &DynamicImage) -> RgbImage {
    if image.color().has_alpha() {
        flatten_onto_white(&image.to_rgba8())
    } else {
        image.to_rgb8()
    }
}

fn flatten_onto_white(rgba: &RgbaImage) -> RgbImage {
    let blend = |channel: u8, alpha: u16| -> u8 {
        ((channel as u16 * alpha + 255 * (255 - alpha)) / 255) as u8
    };
    RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        let Rgba([r, g, b, a]) = *rgba.get_pixel(x, y);
        let a = a as u16;
        Rgb([blend(r, a), blend(g, a), blend(b, a)])
    })
}

/// Largest size with the same aspect ratio that fits within the bounds.
///
/// Never upscales; each side is at least one pixel.
pub fn fit_dimensions(width: u32, height: u32, max_width: u32, max_height: u32) -> (u32, u32) {
    if width <= max_width && height <= max_height {
        return (width, height);
    }
    let scale = f64::min(
        max_width as f64 / width as f64,
        max_height as f64 / height as f64,
    );
    let fit_w = ((width as f64 * scale).round() as u32).clamp(1, max_width);
    let fit_h = ((height as f64 * scale).round() as u32).clamp(1, max_height);
    (fit_w, fit_h)
}

/// Downscale with Lanczos3 so both sides fit within the bounds.
///
/// Returns the input untouched when it already fits.
pub fn fit_within(image: &RgbImage, max_width: u32, max_height: u32) -> Cow<'_, RgbImage> {
    let (width, height) = image.dimensions();
    let (fit_w, fit_h) = fit_dimensions(width, height, max_width, max_height);
    if (fit_w, fit_h) == (width, height) {
        return Cow::Borrowed(image);
    }
    tracing::debug!(
        from = %format!("{}x{}", width, height),
        to = %format!("{}x{}", fit_w, fit_h),
        "Resizing"
    );
    Cow::Owned(image::imageops::resize(image, fit_w, fit_h, FilterType::Lanczos3))
}
