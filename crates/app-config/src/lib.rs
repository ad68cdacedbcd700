// only enables the `doc_cfg` feature when
// the `docsrs` configuration attribute is defined
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod session;

use clap::ArgMatches;
use config::builder::DefaultState;
use config::{ConfigBuilder, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use tracing::{error, info};

pub use session::{
    ConnectionEntry, ConnectionSource, ConnectionSpec, Connections, HandlerOptions, ScalarValue,
    SessionOptions,
};

/// The application configuration.
#[derive(Default, Debug, Serialize, Deserialize)]
pub struct AppConfig {
    /// The version of the configuration.
    #[serde(default)]
    version: u8,
    /// The session storage configuration.
    #[serde(default)]
    pub session: SessionConfig,
}

/// Provides session storage configuration.
#[derive(Default, Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// The client binding used to talk to the servers.
    #[serde(default)]
    pub handler: HandlerKind,
    /// The server and handler options.
    #[serde(default)]
    pub options: SessionOptions,
}

/// Selects the client binding of the session handler.
#[derive(Default, Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HandlerKind {
    /// Reads `save_path` as a list of URIs and honors persistence and timeouts.
    #[default]
    Memcache,
    /// Reads `save_path` as a list of `host:port` pairs.
    Memcached,
}

impl Display for HandlerKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            HandlerKind::Memcache => write!(f, "memcache"),
            HandlerKind::Memcached => write!(f, "memcached"),
        }
    }
}

impl AppConfig {
    pub fn load(config_dir: &Path, matches: &ArgMatches) -> Result<Self, anyhow::Error> {
        let mut config_builder = ConfigBuilder::<DefaultState>::default();

        // Add default configuration.
        config_builder = config_builder
            .add_source(
                File::from(config_dir.join("default.yml"))
                    .format(FileFormat::Yaml)
                    .required(false),
            )
            .add_source(
                // The YAML FAQ requests `.yaml` to be used as the default.
                File::from(config_dir.join("default.yaml"))
                    .format(FileFormat::Yaml)
                    .required(false),
            );

        if let Some(path) = matches.get_one::<PathBuf>("config_file").cloned() {
            info!(
                "Loading configuration file from {config_path:?}",
                config_path = path
            );
            config_builder =
                config_builder.add_source(File::from(path).format(FileFormat::Yaml).required(true))
        }

        Self::build(config_builder)
    }

    fn build(config_builder: ConfigBuilder<DefaultState>) -> Result<Self, anyhow::Error> {
        let config = match config_builder.build() {
            Ok(config) => config,
            Err(e) => {
                error!("Unable to load configuration: {error}", error = e);
                return Err(e.into());
            }
        };

        match config.try_deserialize() {
            Ok(config) => Ok(config),
            Err(e) => {
                error!("Unable to deserialize configuration: {error}", error = e);
                Err(e.into())
            }
        }
    }

    /// Gets the version of the configuration.
    pub fn version(&self) -> u8 {
        self.version
    }
}
