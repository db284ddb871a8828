//! Request routing for the upload API.

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;
use hyper::body::Body;
use hyper::header::ORIGIN;
use hyper::{Method, Request, StatusCode};
use webfit_core::config::MIB;
use webfit_core::{RejectReason, UploadError, UploadService};

use super::multipart::{read_file_field, FormError, UploadedFile};
use super::response::{self, Cors, HttpResponse};

/// Form field carrying the upload.
const FILE_FIELD: &str = "file";

/// Allowance for multipart framing on top of the upload cap.
const FORM_OVERHEAD: usize = MIB as usize;

/// Routes requests to the upload service. Cheap to clone per connection.
#[derive(Clone)]
pub struct Router {
    service: Arc<UploadService>,
    cors: Arc<Cors>,
}

impl Router {
    pub fn new(service: Arc<UploadService>) -> Self {
        let cors = Cors::new(service.config().server.allowed_origins.clone());
        Self {
            service,
            cors: Arc::new(cors),
        }
    }

    /// Handle one request; errors become JSON responses.
    pub async fn handle<B>(self, req: Request<B>) -> Result<HttpResponse, Infallible>
    where
        B: Body<Data = Bytes> + Send + 'static,
        B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        let start = Instant::now();
        let method = req.method().clone();
        let path = req.uri().path().to_string();
        let origin = req
            .headers()
            .get(ORIGIN)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);

        let mut response = self.dispatch(req).await;
        self.cors.apply(origin.as_deref(), &mut response);

        tracing::info!(
            method = %method,
            path = %path,
            status = response.status().as_u16(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Request completed"
        );
        Ok(response)
    }

    async fn dispatch<B>(&self, req: Request<B>) -> HttpResponse
    where
        B: Body<Data = Bytes> + Send + 'static,
        B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        match (req.method(), req.uri().path()) {
            (&Method::OPTIONS, _) => response::empty(StatusCode::NO_CONTENT),
            (&Method::GET, "/health") => {
                response::json(StatusCode::OK, &serde_json::json!({ "status": "healthy" }))
            }
            (&Method::GET, "/compression-stats") => {
                response::json(StatusCode::OK, &self.service.stats())
            }
            (&Method::POST, "/upload-image") => self.upload_image(req).await,
            (&Method::POST, "/test-compression") => self.test_compression(req).await,
            _ => response::error(StatusCode::NOT_FOUND, "Not Found"),
        }
    }

    async fn upload_image<B>(&self, req: Request<B>) -> HttpResponse
    where
        B: Body<Data = Bytes> + Send + 'static,
        B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        let file = match self.read_upload(req).await {
            Ok(file) => file,
            Err(response) => return response,
        };
        tracing::info!(filename = %file.filename, size = file.bytes.len(), "Upload received");

        match Arc::clone(&self.service)
            .handle_async(file.filename, file.bytes.to_vec())
            .await
        {
            Ok(body) => response::json(StatusCode::OK, &body),
            Err(e) => upload_error(e),
        }
    }

    async fn test_compression<B>(&self, req: Request<B>) -> HttpResponse
    where
        B: Body<Data = Bytes> + Send + 'static,
        B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        let file = match self.read_upload(req).await {
            Ok(file) => file,
            Err(response) => return response,
        };

        match Arc::clone(&self.service)
            .compare_async(file.bytes.to_vec())
            .await
        {
            Ok(body) => response::json(StatusCode::OK, &body),
            Err(e) => upload_error(e),
        }
    }

    async fn read_upload<B>(&self, req: Request<B>) -> Result<UploadedFile, HttpResponse>
    where
        B: Body<Data = Bytes> + Send + 'static,
        B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        let limits = &self.service.config().limits;
        let body_limit = limits.max_upload_bytes() + FORM_OVERHEAD;

        read_file_field(req, FILE_FIELD, body_limit)
            .await
            .map_err(|e| {
                tracing::debug!(error = %e, "Rejected form body");
                let detail = match e {
                    FormError::TooLarge => RejectReason::FileTooLarge {
                        size: body_limit,
                        max_mb: limits.max_upload_mb,
                    }
                    .to_string(),
                    other => other.to_string(),
                };
                response::error(StatusCode::BAD_REQUEST, detail)
            })
    }
}

fn upload_error(err: UploadError) -> HttpResponse {
    let status =
        StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    if status.is_server_error() {
        tracing::error!(error = %err, "Upload processing failed");
    }
    response::error(status, err.to_string())
}
