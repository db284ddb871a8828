//! The `webfit inspect` command: run the admission gates on one file.

use std::path::PathBuf;

use clap::Args;
use serde::Serialize;
use webfit_core::pipeline::is_heif_family;
use webfit_core::{plan_route, Config, ImageInfo, UploadService};

/// Arguments for the `inspect` command.
#[derive(Args, Debug)]
pub struct InspectArgs {
    /// File to inspect
    pub file: PathBuf,
}

#[derive(Debug, Serialize)]
struct Report {
    filename: String,
    size: usize,
    #[serde(flatten)]
    info: ImageInfo,
    heif: bool,
    route: String,
}

pub async fn execute(args: InspectArgs, config: Config) -> anyhow::Result<()> {
    let bytes = tokio::fs::read(&args.file).await?;
    let filename = args
        .file
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default()
        .to_string();

    let service = UploadService::new(config);
    let info = service
        .admit(&filename, &bytes)
        .map_err(|reason| anyhow::anyhow!("{}: {}", args.file.display(), reason))?;

    let report = Report {
        route: format!("{:?}", plan_route(&filename, bytes.len(), &service.config().limits)),
        heif: is_heif_family(&filename),
        size: bytes.len(),
        filename,
        info,
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
