//! Extracting the uploaded file from a `multipart/form-data` body.

use std::convert::Infallible;
use std::fmt;

use bytes::Bytes;
use http_body_util::{BodyExt, LengthLimitError, Limited};
use hyper::body::Body;
use hyper::header::CONTENT_TYPE;
use hyper::Request;
use multer::Multipart;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// A file part pulled out of a form.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    /// Client-supplied filename, empty when the part had none
    pub filename: String,
    pub bytes: Bytes,
}

/// Why a form body could not be read.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormError {
    /// Body exceeded the byte cap
    #[error("request body too large")]
    TooLarge,

    /// Not a readable multipart body
    #[error("Malformed multipart body: {0}")]
    Malformed(String),

    /// The expected part was absent
    #[error("Missing form field '{0}'")]
    MissingField(String),
}

fn malformed(err: impl fmt::Display) -> FormError {
    FormError::Malformed(err.to_string())
}

/// Read the part named `field` from a multipart request.
///
/// The body is buffered up to `body_limit` bytes before parsing.
pub async fn read_file_field<B>(
    req: Request<B>,
    field: &str,
    body_limit: usize,
) -> Result<UploadedFile, FormError>
where
    B: Body<Data = Bytes> + Send + 'static,
    B::Error: Into<BoxError>,
{
    let content_type = req
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| FormError::Malformed("missing Content-Type".to_string()))?;
    let boundary = multer::parse_boundary(content_type).map_err(malformed)?;

    let body = Limited::new(req.into_body(), body_limit)
        .collect()
        .await
        .map_err(|e| {
            if e.downcast_ref::<LengthLimitError>().is_some() {
                FormError::TooLarge
            } else {
                malformed(e)
            }
        })?
        .to_bytes();

    let stream = futures_util::stream::once(async move { Ok::<Bytes, Infallible>(body) });
    let mut multipart = Multipart::new(stream, boundary);

    while let Some(part) = multipart.next_field().await.map_err(malformed)? {
        if part.name() != Some(field) {
            continue;
        }
        let filename = part.file_name().unwrap_or_default().to_string();
        let bytes = part.bytes().await.map_err(malformed)?;
        return Ok(UploadedFile { filename, bytes });
    }
    Err(FormError::MissingField(field.to_string()))
}
