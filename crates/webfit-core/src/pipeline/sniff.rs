//! Upload admission: filename allow-list and content validation.
//!
//! The filename check is cheap and runs first. Content validation reads the
//! header for dimensions, rejects oversized images before any pixel buffer
//! is allocated, then decodes fully to catch corrupt data.

use std::path::Path;

use crate::config::LimitsConfig;
use crate::error::RejectReason;
use crate::types::ImageInfo;

use super::decode::ImageDecoder;

/// Lower-case extensions accepted for upload.
pub const ALLOWED_EXTENSIONS: [&str; 10] = [
    "jpg", "jpeg", "png", "gif", "bmp", "webp", "tiff", "tif", "heic", "heif",
];

/// Display names of the accepted formats.
pub const SUPPORTED_FORMAT_NAMES: [&str; 7] = ["JPEG", "PNG", "GIF", "BMP", "WebP", "TIFF", "HEIC"];

/// Last dot-separated segment, lower-cased. `None` without a dot.
fn extension_of(filename: &str) -> Option<String> {
    let (_, ext) = filename.rsplit_once('.')?;
    Some(ext.to_ascii_lowercase())
}

/// Check the uploaded filename against the allow-list.
///
/// Returns the lower-cased extension on success.
pub fn check_filename(filename: &str) -> Result<String, RejectReason> {
    if filename.is_empty() {
        return Err(RejectReason::MissingFilename);
    }
    match extension_of(filename) {
        Some(ext) if ALLOWED_EXTENSIONS.contains(&ext.as_str()) => Ok(ext),
        _ => Err(RejectReason::UnsupportedExtension {
            filename: filename.to_string(),
        }),
    }
}

/// Whether a filename carries an accepted extension.
pub fn looks_like_image(filename: &str) -> bool {
    check_filename(filename).is_ok()
}

/// Path variant of [`looks_like_image`], used by directory discovery.
pub fn path_looks_like_image(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(looks_like_image)
}

/// HEIC/HEIF uploads always go through conversion regardless of size.
pub fn is_heif_family(filename: &str) -> bool {
    let lower = filename.to_ascii_lowercase();
    lower.ends_with(".heic") || lower.ends_with(".heif")
}

/// Content validator for uploaded bytes.
#[derive(Debug, Clone)]
pub struct Sniffer {
    decoder: ImageDecoder,
}

impl Sniffer {
    pub fn new(limits: &LimitsConfig) -> Self {
        Self {
            decoder: ImageDecoder::new(limits),
        }
    }

    /// Validate that `bytes` is a decodable image within the dimension cap.
    pub fn validate(&self, bytes: &[u8]) -> Result<ImageInfo, RejectReason> {
        if bytes.is_empty() {
            return Err(RejectReason::EmptyFile);
        }

        let (format, width, height) = self
            .decoder
            .probe(bytes)
            .map_err(|e| RejectReason::InvalidImage(e.to_string()))?;

        if width == 0 || height == 0 {
            return Err(RejectReason::InvalidDimensions { width, height });
        }
        let max = self.decoder.max_dimension();
        if width > max || height > max {
            return Err(RejectReason::DimensionsTooLarge { width, height, max });
        }

        self.decoder
            .decode(bytes)
            .map_err(|e| RejectReason::InvalidImage(e.to_string()))?;

        let format = format.as_str().to_string();
        let description = format!("Valid {} image ({}x{})", format, width, height);
        tracing::debug!(%description, "Content validation passed");

        Ok(ImageInfo {
            format,
            width,
            height,
            description,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, ImageFormat};
    use std::io::Cursor;

    fn png(width: u32, height: u32) -> Vec<u8> {
        let mut buffer = Cursor::new(Vec::new());
        DynamicImage::new_rgb8(width, height)
            .write_to(&mut buffer, ImageFormat::Png)
            .unwrap();
        buffer.into_inner()
    }

    #[test]
    fn test_looks_like_image() {
        assert!(looks_like_image("photo.HEIC"));
        assert!(looks_like_image("scan.tif"));
        assert!(looks_like_image("a.b.jpeg"));
        assert!(!looks_like_image("doc.pdf"));
        assert!(!looks_like_image("archive.tar.gz"));
        assert!(!looks_like_image("noext"));
        assert!(!looks_like_image(""));
        assert!(!looks_like_image("image.jpg.exe"));
    }

    #[test]
    fn test_check_filename_reasons() {
        assert_eq!(check_filename(""), Err(RejectReason::MissingFilename));
        assert_eq!(check_filename("Holiday.PNG"), Ok("png".to_string()));
        assert!(matches!(
            check_filename("notes.txt"),
            Err(RejectReason::UnsupportedExtension { .. })
        ));
    }

    #[test]
    fn test_is_heif_family() {
        assert!(is_heif_family("IMG_0001.HEIC"));
        assert!(is_heif_family("burst.heif"));
        assert!(!is_heif_family("heic.jpg"));
    }

    #[test]
    fn test_path_looks_like_image() {
        assert!(path_looks_like_image(Path::new("/tmp/photos/cat.webp")));
        assert!(!path_looks_like_image(Path::new("/tmp/photos/readme.md")));
    }

    #[test]
    fn test_validate_accepts_png() {
        let sniffer = Sniffer::new(&LimitsConfig::default());
        let info = sniffer.validate(&png(640, 480)).unwrap();
        assert_eq!(info.format, "PNG");
        assert_eq!((info.width, info.height), (640, 480));
        assert_eq!(info.description, "Valid PNG image (640x480)");
    }

    #[test]
    fn test_validate_rejects_empty() {
        let sniffer = Sniffer::new(&LimitsConfig::default());
        assert_eq!(sniffer.validate(&[]), Err(RejectReason::EmptyFile));
    }

    #[test]
    fn test_validate_rejects_text_content() {
        let sniffer = Sniffer::new(&LimitsConfig::default());
        let err = sniffer.validate(b"just some text, not pixels").unwrap_err();
        assert!(matches!(err, RejectReason::InvalidImage(_)));
        assert!(err.to_string().starts_with("Invalid image file: "));
    }

    #[test]
    fn test_validate_rejects_oversized_dimensions() {
        let limits = LimitsConfig {
            max_image_dimension: 100,
            ..Default::default()
        };
        let err = Sniffer::new(&limits).validate(&png(101, 10)).unwrap_err();
        assert_eq!(
            err,
            RejectReason::DimensionsTooLarge {
                width: 101,
                height: 10,
                max: 100
            }
        );
        assert_eq!(err.to_string(), "Image dimensions too large (max 100x100)");
    }

    #[test]
    fn test_validate_rejects_truncated_body() {
        let bytes = png(256, 256);
        let sniffer = Sniffer::new(&LimitsConfig::default());
        let err = sniffer.validate(&bytes[..bytes.len() - 40]).unwrap_err();
        assert!(matches!(err, RejectReason::InvalidImage(_)));
    }
}
