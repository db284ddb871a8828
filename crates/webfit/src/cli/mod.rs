//! CLI command implementations.

pub mod compress;
pub mod config;
pub mod inspect;
pub mod serve;

use std::path::PathBuf;

use webfit_core::{Config, ConfigError};

/// Where configuration comes from: `--config` / `WEBFIT_CONFIG`, or the
/// platform default path.
#[derive(Debug, Clone)]
pub struct ConfigSource {
    path: PathBuf,
    explicit: bool,
}

impl ConfigSource {
    pub fn new(raw: Option<&str>) -> Self {
        match raw {
            Some(raw) => Self {
                path: PathBuf::from(shellexpand::tilde(raw).into_owned()),
                explicit: true,
            },
            None => Self {
                path: Config::default_path(),
                explicit: false,
            },
        }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// An explicit path must exist; the default path may be absent.
    pub fn load(&self) -> Result<Config, ConfigError> {
        if self.explicit || self.path.exists() {
            Config::load_from(&self.path)
        } else {
            Ok(Config::default())
        }
    }
}
