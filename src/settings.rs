use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

pub const CONFIG_PATH_VAR: &str = "ACTIVITIES_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "config.toml";
const ENV_PREFIX: &str = "ACTIVITIES";

impl Settings {
    /// Layers `path` (if it exists) and `ACTIVITIES_*` environment variables
    /// over the built-in defaults.
    pub fn new(path: &str) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::with_name(path).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        let path = std::env::var(CONFIG_PATH_VAR).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.into());
        Self::new(&path)
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            host: IpAddr::from([0, 0, 0, 0]),
            port: 8000,
            teachers_path: PathBuf::from("teachers.json"),
            activities_path: None,
            static_dir: PathBuf::from("static"),
            enforce_capacity: true,
            cors: false,
            log_level: "info".to_owned(),
            tls: None,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct Tls {
    pub cert_path: PathBuf,
    pub key_path: PathBuf,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct Settings {
    pub host: IpAddr,
    pub port: u16,
    pub teachers_path: PathBuf,
    pub activities_path: Option<PathBuf>,
    pub static_dir: PathBuf,
    pub enforce_capacity: bool,
    pub cors: bool,
    pub log_level: String,
    pub tls: Option<Tls>,
}
