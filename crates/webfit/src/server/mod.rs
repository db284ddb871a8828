//! HTTP surface for the upload API, built on hyper.

mod multipart;
mod response;
mod routes;

use std::sync::Arc;

use anyhow::Context;
use hyper::body::Incoming;
use hyper::service::service_fn;
use hyper::Request;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder;
use tokio::net::TcpListener;
use webfit_core::config::ServerConfig;
use webfit_core::UploadService;

use routes::Router;

/// Accept connections until Ctrl-C.
pub async fn run(server: &ServerConfig, service: Arc<UploadService>) -> anyhow::Result<()> {
    let addr = server.bind_address();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!("Listening on http://{}", listener.local_addr()?);
    tracing::info!("Allowed origins: {:?}", server.allowed_origins);

    let router = Router::new(service);
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            accepted = listener.accept() => {
                let (stream, peer) = match accepted {
                    Ok(conn) => conn,
                    Err(e) => {
                        tracing::warn!(error = %e, "Failed to accept connection");
                        continue;
                    }
                };
                let router = router.clone();
                tokio::spawn(async move {
                    let svc = service_fn(move |req: Request<Incoming>| router.clone().handle(req));
                    if let Err(e) = Builder::new(TokioExecutor::new())
                        .serve_connection(TokioIo::new(stream), svc)
                        .await
                    {
                        tracing::debug!(%peer, error = %e, "Connection closed with error");
                    }
                });
            }
            _ = &mut shutdown => {
                tracing::info!("Shutdown signal received, no longer accepting connections");
                break;
            }
        }
    }

    Ok(())
}
