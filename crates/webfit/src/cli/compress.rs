//! The `webfit compress` command: run files through the upload pipeline.

use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Args, ValueEnum};
use serde::Serialize;
use webfit_core::pipeline::{DiscoveredFile, FileDiscovery};
use webfit_core::{CompressionMetadata, Config, FileInfo, UploadOutcome, UploadService};

/// Supported output formats.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum OutputFormat {
    /// Single JSON array
    Json,
    /// One JSON object per line (newline-delimited)
    Jsonl,
}

/// Arguments for the `compress` command.
#[derive(Args, Debug)]
pub struct CompressArgs {
    /// Image file or directory to compress
    pub input: PathBuf,

    /// Write records to this file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Directory to write converted images into
    #[arg(long)]
    pub out_dir: Option<PathBuf>,

    /// Record format
    #[arg(short, long, value_enum, default_value = "json")]
    pub format: OutputFormat,

    /// Embed the base64 result in each record
    #[arg(long)]
    pub include_image: bool,
}

/// One line of `compress` output.
#[derive(Debug, Serialize)]
struct CompressRecord {
    path: PathBuf,
    ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    compression_applied: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    metadata: Option<CompressionMetadata>,
    #[serde(skip_serializing_if = "Option::is_none")]
    file_info: Option<FileInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    written_to: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl CompressRecord {
    fn failed(path: PathBuf, error: String) -> Self {
        Self {
            path,
            ok: false,
            compression_applied: None,
            metadata: None,
            file_info: None,
            written_to: None,
            image: None,
            error: Some(error),
        }
    }
}

pub async fn execute(args: CompressArgs, config: Config) -> anyhow::Result<()> {
    let files = FileDiscovery::discover(&args.input);
    if files.is_empty() {
        anyhow::bail!("No supported images found at {}", args.input.display());
    }
    tracing::info!(
        "Found {} images ({:.1} MB)",
        files.len(),
        FileDiscovery::total_size(&files) as f64 / (1024.0 * 1024.0)
    );

    if let Some(dir) = &args.out_dir {
        tokio::fs::create_dir_all(dir).await?;
    }

    let service = Arc::new(UploadService::new(config));
    let progress = if files.len() > 1 {
        Some(create_progress_bar(files.len() as u64)?)
    } else {
        None
    };

    let mut records = Vec::with_capacity(files.len());
    let mut failures = 0usize;
    for file in &files {
        let record = compress_one(&service, file, &args).await;
        if !record.ok {
            failures += 1;
        }
        if let Some(pb) = &progress {
            pb.set_message(file.file_name());
            pb.inc(1);
        }
        records.push(record);
    }
    if let Some(pb) = progress {
        pb.finish_with_message("done");
    }

    write_records(&records, args.format, args.output.as_deref())?;

    tracing::info!(
        succeeded = records.len() - failures,
        failed = failures,
        "Compression finished"
    );
    Ok(())
}

async fn compress_one(
    service: &Arc<UploadService>,
    file: &DiscoveredFile,
    args: &CompressArgs,
) -> CompressRecord {
    let bytes = match tokio::fs::read(&file.path).await {
        Ok(bytes) => bytes,
        Err(e) => return CompressRecord::failed(file.path.clone(), e.to_string()),
    };

    let outcome = match Arc::clone(service).process_async(file.file_name(), bytes).await {
        Ok(outcome) => outcome,
        Err(e) => {
            tracing::warn!(path = %file.path.display(), error = %e, "Compression failed");
            return CompressRecord::failed(file.path.clone(), e.to_string());
        }
    };

    let written_to = match &args.out_dir {
        Some(dir) => match write_artifact(dir, &file.path, &outcome).await {
            Ok(path) => Some(path),
            Err(e) => return CompressRecord::failed(file.path.clone(), e.to_string()),
        },
        None => None,
    };

    let compression_applied = outcome.compression_applied;
    let file_info = outcome.file_info.clone();
    let metadata = outcome.metadata.clone();
    let image = args
        .include_image
        .then(|| outcome.into_response().image);

    CompressRecord {
        path: file.path.clone(),
        ok: true,
        compression_applied: Some(compression_applied),
        metadata: Some(metadata),
        file_info: Some(file_info),
        written_to,
        image,
        error: None,
    }
}

/// Converted output gets a `.jpg` extension; passthrough keeps the original name.
fn artifact_path(dir: &Path, source: &Path, converted: bool) -> PathBuf {
    if converted {
        let stem = source
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("image");
        dir.join(format!("{stem}.jpg"))
    } else {
        dir.join(source.file_name().unwrap_or_default())
    }
}

async fn write_artifact(
    dir: &Path,
    source: &Path,
    outcome: &UploadOutcome,
) -> std::io::Result<PathBuf> {
    let path = artifact_path(dir, source, outcome.compression_applied);
    tokio::fs::write(&path, &outcome.bytes).await?;
    Ok(path)
}

fn write_records(
    records: &[CompressRecord],
    format: OutputFormat,
    output: Option<&Path>,
) -> anyhow::Result<()> {
    let mut writer: Box<dyn Write> = match output {
        Some(path) => Box::new(BufWriter::new(std::fs::File::create(path)?)),
        None => Box::new(std::io::stdout().lock()),
    };

    match format {
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut writer, records)?;
            writeln!(writer)?;
        }
        OutputFormat::Jsonl => {
            for record in records {
                serde_json::to_writer(&mut writer, record)?;
                writeln!(writer)?;
            }
        }
    }
    writer.flush()?;
    Ok(())
}

fn create_progress_bar(total: u64) -> anyhow::Result<indicatif::ProgressBar> {
    use indicatif::{ProgressBar, ProgressStyle};

    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}",
            )?
            .progress_chars("##-"),
    );
    Ok(pb)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, ImageFormat};

    fn write_png(path: &Path, width: u32, height: u32) {
        DynamicImage::new_rgb8(width, height)
            .save_with_format(path, ImageFormat::Png)
            .unwrap();
    }

    #[test]
    fn test_artifact_path() {
        let dir = Path::new("/out");
        assert_eq!(
            artifact_path(dir, Path::new("/in/IMG_1.HEIC"), true),
            PathBuf::from("/out/IMG_1.jpg")
        );
        assert_eq!(
            artifact_path(dir, Path::new("/in/logo.png"), false),
            PathBuf::from("/out/logo.png")
        );
    }

    #[tokio::test]
    async fn test_compress_directory_to_jsonl() {
        let input = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        write_png(&input.path().join("a.png"), 64, 32);
        write_png(&input.path().join("b.png"), 16, 16);
        std::fs::write(input.path().join("broken.jpg"), b"not a jpeg").unwrap();
        let records_path = out.path().join("records.jsonl");

        let args = CompressArgs {
            input: input.path().to_path_buf(),
            output: Some(records_path.clone()),
            out_dir: Some(out.path().join("web")),
            format: OutputFormat::Jsonl,
            include_image: false,
        };
        execute(args, Config::default()).await.unwrap();

        let text = std::fs::read_to_string(&records_path).unwrap();
        let records: Vec<serde_json::Value> = text
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(records.len(), 3);

        let ok: Vec<_> = records.iter().filter(|r| r["ok"] == true).collect();
        assert_eq!(ok.len(), 2);
        assert!(ok.iter().all(|r| r.get("image").is_none()));
        assert!(out.path().join("web").join("a.jpg").exists());

        let failed = records.iter().find(|r| r["ok"] == false).unwrap();
        assert!(failed["error"].as_str().unwrap().starts_with("Invalid image file"));
    }

    #[tokio::test]
    async fn test_empty_input_is_an_error() {
        let input = tempfile::tempdir().unwrap();
        let args = CompressArgs {
            input: input.path().to_path_buf(),
            output: None,
            out_dir: None,
            format: OutputFormat::Json,
            include_image: false,
        };
        assert!(execute(args, Config::default()).await.is_err());
    }
}
