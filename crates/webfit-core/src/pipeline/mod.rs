//! Image compression pipeline components.
//!
//! - **sniff**: Filename allow-list and content validation
//! - **decode**: Format detection and decoding, HEIF included
//! - **normalize**: Alpha flattening and bounded Lanczos resizing
//! - **encode**: JPEG output behind the `WebEncoder` seam
//! - **processor**: The `Compressor` single-pass entry point
//! - **search**: Target-size search over quality and scale ladders
//! - **discovery**: Find image files in directories

pub mod decode;
pub mod discovery;
pub mod encode;
pub mod normalize;
pub mod processor;
pub mod search;
pub mod sniff;

pub use decode::{ColorMode, DecodeError, DecodedImage, ImageDecoder, SourceFormat};
pub use discovery::{DiscoveredFile, FileDiscovery};
pub use encode::{EncodedArtifact, JpegWebEncoder, WebEncoder, WEB_CONTENT_TYPE};
pub use normalize::{canonicalize, fit_dimensions, fit_within, NormalizeOptions};
pub use processor::{Compressed, Compressor};
pub use search::scaled_bounds;
pub use sniff::{check_filename, is_heif_family, looks_like_image, Sniffer};
