//! Webfit CLI - image upload API and batch compressor for web-ready JPEG.
//!
//! Webfit accepts raster uploads (including HEIC from phones), validates
//! them, and returns JPEG that fits a 1920x1080 box. Large inputs go through
//! a ladder search until they fit a byte budget.
//!
//! # Usage
//!
//! ```bash
//! # Run the upload API
//! webfit serve --port 8000
//!
//! # Compress a directory the same way the API would
//! webfit compress ./photos/ --out-dir ./web --format jsonl
//!
//! # Check whether a file would be accepted
//! webfit inspect IMG_0042.HEIC
//!
//! # View configuration
//! webfit config show
//! ```

use clap::{Parser, Subcommand};

mod cli;
mod logging;
mod server;

/// Webfit - normalize any image upload to web-ready JPEG.
#[derive(Parser, Debug)]
#[command(name = "webfit")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long, global = true)]
    json_logs: bool,

    /// Config file to use instead of the platform default
    #[arg(long, global = true, env = "WEBFIT_CONFIG")]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP upload API
    Serve(cli::serve::ServeArgs),

    /// Compress image files the way the upload endpoint would
    Compress(cli::compress::CompressArgs),

    /// Validate a single file and print what was detected
    Inspect(cli::inspect::InspectArgs),

    /// View and manage configuration
    Config(cli::config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let source = cli::ConfigSource::new(cli.config.as_deref());

    // Logging isn't initialized yet, so config warnings go through eprintln.
    let config = match source.load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!(
                "Warning: Failed to load config: {e}\n  \
                 Using default configuration. Check your config file with `webfit config path`."
            );
            webfit_core::Config::default()
        }
    };
    logging::init_from_config(&config, cli.verbose, cli.json_logs);

    tracing::debug!("Webfit v{}", webfit_core::VERSION);

    match cli.command {
        Commands::Serve(args) => cli::serve::execute(args, config).await,
        Commands::Compress(args) => cli::compress::execute(args, config).await,
        Commands::Inspect(args) => cli::inspect::execute(args, config).await,
        Commands::Config(args) => cli::config::execute(args, &source).await,
    }
}
