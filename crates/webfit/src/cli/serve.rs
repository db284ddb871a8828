//! The `webfit serve` command.

use std::sync::Arc;

use clap::Args;
use webfit_core::{Config, UploadService};

/// Arguments for the `serve` command.
#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Interface to bind (overrides config)
    #[arg(long, env = "WEBFIT_HOST")]
    pub host: Option<String>,

    /// Port to listen on (overrides config)
    #[arg(short, long, env = "WEBFIT_PORT")]
    pub port: Option<u16>,

    /// Additional allowed CORS origin (repeatable)
    #[arg(long = "allow-origin")]
    pub allow_origins: Vec<String>,
}

impl ServeArgs {
    fn apply(self, mut config: Config) -> Config {
        if let Some(host) = self.host {
            config.server.host = host;
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        config.server.allowed_origins.extend(self.allow_origins);
        config
    }
}

pub async fn execute(args: ServeArgs, config: Config) -> anyhow::Result<()> {
    let config = args.apply(config);
    let service = Arc::new(UploadService::new(config.clone()));
    crate::server::run(&config.server, service).await
}
