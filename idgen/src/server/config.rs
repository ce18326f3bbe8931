//! Server configuration and command-line arguments.

use std::path::PathBuf;

use clap::Parser;

use crate::Config;

/// CLI arguments for the idgen server.
#[derive(Parser, Debug)]
#[command(name = "idgen", about = "Globally unique ID allocation server")]
pub struct CliArgs {
    /// Path to config file (TOML).
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Port to listen on.
    #[arg(short, long, default_value_t = 8080)]
    pub port: u16,
}

impl CliArgs {
    /// Loads the generator configuration from the config file, or the
    /// defaults when no file was given.
    pub fn load_config(&self) -> anyhow::Result<Config> {
        match &self.config {
            Some(path) => {
                let contents = std::fs::read_to_string(path)?;
                let config: Config = toml::from_str(&contents)?;
                Ok(config)
            }
            None => Ok(Config::default()),
        }
    }

    /// Builds the full server configuration.
    pub fn server_config(&self) -> anyhow::Result<IdServerConfig> {
        Ok(IdServerConfig {
            port: self.port,
            generator: self.load_config()?,
        })
    }
}

/// Configuration for [`IdServer`](super::IdServer).
#[derive(Debug, Clone)]
pub struct IdServerConfig {
    /// Port to listen on.
    pub port: u16,
    /// Generator configuration.
    pub generator: Config,
}

impl Default for IdServerConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            generator: Config::default(),
        }
    }
}
