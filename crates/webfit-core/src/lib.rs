//! Webfit Core - image upload admission and adaptive JPEG compression.
//!
//! Webfit turns arbitrary user uploads (JPEG, PNG, GIF, BMP, WebP, TIFF,
//! HEIC) into web-ready JPEG that fits a bounding box and, for very large
//! inputs, a byte budget.
//!
//! # Architecture
//!
//! ```text
//! Upload → Admit (name, size, content) → Route → Decode → Flatten → Fit → Encode → Response
//!                                           └→ Ladder search (quality, scale, fallback)
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use webfit_core::{Config, UploadService};
//!
//! #[tokio::main]
//! async fn main() -> webfit_core::Result<()> {
//!     let service = Arc::new(UploadService::new(Config::load()?));
//!     let bytes = std::fs::read("./photo.heic")?;
//!     let response = service.handle_async("photo.heic".into(), bytes).await?;
//!     println!("Saved {}%", response.metadata.savings_percent);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod pipeline;
pub mod types;
pub mod upload;

pub use config::Config;
pub use error::{
    ConfigError, PipelineError, PipelineResult, RejectReason, Result, UploadError, WebfitError,
};
pub use pipeline::{Compressor, EncodedArtifact, NormalizeOptions, Sniffer};
pub use types::{
    CompressionComparison, CompressionLevel, CompressionMetadata, CompressionStats, FileInfo,
    ImageInfo, Method, UploadResponse,
};
pub use upload::{plan_route, Route, UploadOutcome, UploadService};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
