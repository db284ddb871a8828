//! The `webfit config` command for configuration management.

use clap::{Args, Subcommand};
use webfit_core::Config;

use super::ConfigSource;

/// Arguments for the `config` command.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

/// Subcommands for configuration management.
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Display the effective configuration
    Show,

    /// Show config file path
    Path,

    /// Write a config file with defaults
    Init {
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },
}

pub async fn execute(args: ConfigArgs, source: &ConfigSource) -> anyhow::Result<()> {
    match args.command {
        ConfigCommand::Show => {
            println!("{}", source.load()?.to_toml()?);
        }

        ConfigCommand::Path => {
            println!("{}", source.path().display());
        }

        ConfigCommand::Init { force } => {
            let path = source.path();
            if path.exists() && !force {
                anyhow::bail!(
                    "Config file already exists at: {}\nUse --force to overwrite.",
                    path.display()
                );
            }
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, Config::default().to_toml()?)?;

            tracing::info!("Config file created at: {}", path.display());
            println!("Configuration initialized at: {}", path.display());
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_init_writes_loadable_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let source = ConfigSource::new(path.to_str());

        let args = ConfigArgs {
            command: ConfigCommand::Init { force: false },
        };
        execute(args, &source).await.unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.limits.max_upload_mb, 50);
    }

    #[tokio::test]
    async fn test_init_refuses_overwrite_without_force() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "").unwrap();
        let source = ConfigSource::new(path.to_str());

        let args = ConfigArgs {
            command: ConfigCommand::Init { force: false },
        };
        assert!(execute(args, &source).await.is_err());

        let args = ConfigArgs {
            command: ConfigCommand::Init { force: true },
        };
        assert!(execute(args, &source).await.is_ok());
    }
}
