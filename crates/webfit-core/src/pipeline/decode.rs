//! Image decoding with content-based format detection and dimension limits.

use image::{ColorType, DynamicImage, ImageFormat, ImageReader, Limits};
use std::io::Cursor;

use crate::config::LimitsConfig;
use crate::error::PipelineError;

/// A decoder failure, carrying the underlying cause text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct DecodeError(pub String);

impl From<DecodeError> for PipelineError {
    fn from(err: DecodeError) -> Self {
        PipelineError::Conversion(err.0)
    }
}

/// Container format detected from the bytes themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Jpeg,
    Png,
    Gif,
    Bmp,
    WebP,
    Tiff,
    /// HEIC/HEIF (ISO-BMFF container with a HEIF brand)
    Heif,
    /// Anything else the `image` crate recognizes
    Other(ImageFormat),
}

impl SourceFormat {
    /// Detect the format from magic bytes. `None` if unrecognized.
    pub fn detect(bytes: &[u8]) -> Option<Self> {
        if is_heif_container(bytes) {
            return Some(Self::Heif);
        }
        image::guess_format(bytes).ok().map(Self::from)
    }

    /// Upper-case format tag used in metadata ("JPEG", "PNG", ...).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Jpeg => "JPEG",
            Self::Png => "PNG",
            Self::Gif => "GIF",
            Self::Bmp => "BMP",
            Self::WebP => "WEBP",
            Self::Tiff => "TIFF",
            Self::Heif => "HEIF",
            Self::Other(ImageFormat::Avif) => "AVIF",
            Self::Other(ImageFormat::Ico) => "ICO",
            Self::Other(ImageFormat::Pnm) => "PPM",
            Self::Other(ImageFormat::Tga) => "TGA",
            Self::Other(ImageFormat::Qoi) => "QOI",
            Self::Other(ImageFormat::Hdr) => "HDR",
            Self::Other(ImageFormat::OpenExr) => "EXR",
            Self::Other(_) => "Unknown",
        }
    }
}

impl From<ImageFormat> for SourceFormat {
    fn from(format: ImageFormat) -> Self {
        match format {
            ImageFormat::Jpeg => Self::Jpeg,
            ImageFormat::Png => Self::Png,
            ImageFormat::Gif => Self::Gif,
            ImageFormat::Bmp => Self::Bmp,
            ImageFormat::WebP => Self::WebP,
            ImageFormat::Tiff => Self::Tiff,
            other => Self::Other(other),
        }
    }
}

/// ISO-BMFF `ftyp` box at offset 4 with a HEIF-family major brand.
fn is_heif_container(bytes: &[u8]) -> bool {
    if bytes.len() < 12 || &bytes[4..8] != b"ftyp" {
        return false;
    }
    matches!(
        &bytes[8..12],
        b"heic" | b"heix" | b"heim" | b"heis" | b"hevc" | b"hevx" | b"mif1" | b"msf1" | b"heif"
    )
}

/// Color model of the decoded source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorMode {
    L,
    La,
    Rgb,
    Rgba,
    /// Indexed color; pixels are expanded to RGB(A) on decode
    P,
    L16,
    La16,
    Rgb16,
    Rgba16,
    Rgb32F,
    Rgba32F,
    Unknown,
}

impl ColorMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::L => "L",
            Self::La => "LA",
            Self::Rgb => "RGB",
            Self::Rgba => "RGBA",
            Self::P => "P",
            Self::L16 => "I;16",
            Self::La16 => "LA;16",
            Self::Rgb16 => "RGB;16",
            Self::Rgba16 => "RGBA;16",
            Self::Rgb32F => "RGBF",
            Self::Rgba32F => "RGBAF",
            Self::Unknown => "UNKNOWN",
        }
    }

    pub fn has_alpha(&self) -> bool {
        matches!(
            self,
            Self::La | Self::Rgba | Self::P | Self::La16 | Self::Rgba16 | Self::Rgba32F
        )
    }
}

impl From<ColorType> for ColorMode {
    fn from(color: ColorType) -> Self {
        match color {
            ColorType::L8 => Self::L,
            ColorType::La8 => Self::La,
            ColorType::Rgb8 => Self::Rgb,
            ColorType::Rgba8 => Self::Rgba,
            ColorType::L16 => Self::L16,
            ColorType::La16 => Self::La16,
            ColorType::Rgb16 => Self::Rgb16,
            ColorType::Rgba16 => Self::Rgba16,
            ColorType::Rgb32F => Self::Rgb32F,
            ColorType::Rgba32F => Self::Rgba32F,
            _ => Self::Unknown,
        }
    }
}

/// Result of decoding an image.
#[derive(Debug)]
pub struct DecodedImage {
    /// The decoded image data
    pub image: DynamicImage,
    /// Detected image format
    pub format: SourceFormat,
    /// Image width in pixels
    pub width: u32,
    /// Image height in pixels
    pub height: u32,
    /// Color model before any conversion
    pub color_mode: ColorMode,
    /// Size of the encoded input in bytes
    pub byte_size: usize,
}

/// Image decoder with a configurable dimension cap.
#[derive(Debug, Clone)]
pub struct ImageDecoder {
    max_dimension: u32,
}

impl ImageDecoder {
    /// Create a new decoder with the given limits.
    pub fn new(limits: &LimitsConfig) -> Self {
        Self {
            max_dimension: limits.max_image_dimension,
        }
    }

    pub fn max_dimension(&self) -> u32 {
        self.max_dimension
    }

    /// Read format and dimensions from the header without decoding pixels.
    pub fn probe(&self, bytes: &[u8]) -> Result<(SourceFormat, u32, u32), DecodeError> {
        match SourceFormat::detect(bytes) {
            Some(SourceFormat::Heif) => {
                let (width, height) = heif::probe(bytes)?;
                Ok((SourceFormat::Heif, width, height))
            }
            Some(format) => {
                let reader = Self::reader(bytes)?;
                let (width, height) = reader
                    .into_dimensions()
                    .map_err(|e| DecodeError(e.to_string()))?;
                Ok((format, width, height))
            }
            None => Err(DecodeError("cannot identify image file".to_string())),
        }
    }

    /// Fully decode the image.
    pub fn decode(&self, bytes: &[u8]) -> Result<DecodedImage, DecodeError> {
        let format = SourceFormat::detect(bytes)
            .ok_or_else(|| DecodeError("cannot identify image file".to_string()))?;

        let image = match format {
            SourceFormat::Heif => heif::decode(bytes)?,
            _ => {
                let mut reader = Self::reader(bytes)?;
                reader.limits(self.limits());
                reader.decode().map_err(|e| DecodeError(e.to_string()))?
            }
        };

        Ok(DecodedImage {
            width: image.width(),
            height: image.height(),
            color_mode: source_color_mode(format, bytes, image.color()),
            format,
            image,
            byte_size: bytes.len(),
        })
    }

    fn reader(bytes: &[u8]) -> Result<ImageReader<Cursor<&[u8]>>, DecodeError> {
        ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(|e| DecodeError(format!("Cannot detect image format: {}", e)))
    }

    /// Dimension caps come from config; the allocation cap is lifted because
    /// the dimension cap already bounds the bitmap.
    fn limits(&self) -> Limits {
        let mut limits = Limits::default();
        limits.max_image_width = Some(self.max_dimension);
        limits.max_image_height = Some(self.max_dimension);
        limits.max_alloc = None;
        limits
    }
}

/// Color model of the source as stored, before the decoder expands it.
///
/// Indexed PNG, GIF and low-depth BMP are decoded to RGB(A), so the palette
/// is detected from the header instead.
fn source_color_mode(format: SourceFormat, bytes: &[u8], decoded: ColorType) -> ColorMode {
    let indexed = match format {
        SourceFormat::Gif => true,
        // IHDR color type, after the 8-byte signature and 17 bytes of chunk
        SourceFormat::Png => bytes.get(25) == Some(&3),
        SourceFormat::Bmp => bytes
            .get(28..30)
            .is_some_and(|bpp| u16::from_le_bytes([bpp[0], bpp[1]]) <= 8),
        _ => false,
    };
    if indexed {
        ColorMode::P
    } else {
        ColorMode::from(decoded)
    }
}

#[cfg(feature = "heif")]
mod heif {
    use image::{DynamicImage, RgbImage, RgbaImage};
    use libheif_rs::{ColorSpace, HeifContext, LibHeif, RgbChroma};

    use super::DecodeError;

    fn cause(err: libheif_rs::HeifError) -> DecodeError {
        DecodeError(err.to_string())
    }

    pub(super) fn probe(bytes: &[u8]) -> Result<(u32, u32), DecodeError> {
        let ctx = HeifContext::read_from_bytes(bytes).map_err(cause)?;
        let handle = ctx.primary_image_handle().map_err(cause)?;
        Ok((handle.width(), handle.height()))
    }

    pub(super) fn decode(bytes: &[u8]) -> Result<DynamicImage, DecodeError> {
        let lib = LibHeif::new();
        let ctx = HeifContext::read_from_bytes(bytes).map_err(cause)?;
        let handle = ctx.primary_image_handle().map_err(cause)?;
        let has_alpha = handle.has_alpha_channel();
        let chroma = if has_alpha {
            RgbChroma::Rgba
        } else {
            RgbChroma::Rgb
        };
        let decoded = lib
            .decode(&handle, ColorSpace::Rgb(chroma), None)
            .map_err(cause)?;

        let planes = decoded.planes();
        let plane = planes
            .interleaved
            .ok_or_else(|| DecodeError("HEIF image has no interleaved plane".to_string()))?;
        let channels = if has_alpha { 4 } else { 3 };
        let row_len = plane.width as usize * channels;
        let mut pixels = Vec::with_capacity(row_len * plane.height as usize);
        for row in plane.data.chunks(plane.stride).take(plane.height as usize) {
            pixels.extend_from_slice(&row[..row_len]);
        }

        let image = if has_alpha {
            RgbaImage::from_raw(plane.width, plane.height, pixels).map(DynamicImage::ImageRgba8)
        } else {
            RgbImage::from_raw(plane.width, plane.height, pixels).map(DynamicImage::ImageRgb8)
        };
        image.ok_or_else(|| DecodeError("HEIF pixel buffer has unexpected size".to_string()))
    }
}

#[cfg(not(feature = "heif"))]
mod heif {
    use image::DynamicImage;

    use super::DecodeError;

    const UNAVAILABLE: &str = "HEIC/HEIF decoding is not available in this build";

    pub(super) fn probe(_bytes: &[u8]) -> Result<(u32, u32), DecodeError> {
        Err(DecodeError(UNAVAILABLE.to_string()))
    }

    pub(super) fn decode(_bytes: &[u8]) -> Result<DynamicImage, DecodeError> {
        Err(DecodeError(UNAVAILABLE.to_string()))
    }
}
