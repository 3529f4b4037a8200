use crate::error::{ConfigError, Result};
use serde::Deserialize;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use zagent_collector::config::SourcesConfig;

pub const ENV_SERVER_ADDRESS: &str = "ZABBIX_SERVER_IP";
pub const ENV_SERVER_PORT: &str = "ZABBIX_SERVER_PORT";
pub const ENV_AGENT_DIR: &str = "OPENSHIFT_ZABBIX_AGENT_DIR";
pub const ENV_HOST: &str = "OPENSHIFT_GEAR_DNS";

/// Raw agent configuration as read from an optional TOML file and the
/// environment. Call [`AgentConfig::resolve`] to validate it.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Host identifier: the sender's source tag (`-s`).
    pub host: Option<String>,
    /// Agent home; `run/` and `log/` beneath it are used unless overridden.
    pub agent_dir: Option<PathBuf>,
    /// Directory for spool files handed to the sender.
    pub run_dir: Option<PathBuf>,
    pub log_dir: Option<PathBuf>,
    pub log_file_name: String,
    /// Sender executable.
    pub sender: String,
    pub server: ServerConfig,
    pub sources: SourcesConfig,
}

/// Remote collector address. Both fields must be set for metrics to be sent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub address: Option<String>,
    pub port: Option<u16>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            host: None,
            agent_dir: None,
            run_dir: None,
            log_dir: None,
            log_file_name: "zagent.log".to_string(),
            sender: "zabbix_sender".to_string(),
            server: ServerConfig::default(),
            sources: SourcesConfig::default(),
        }
    }
}

impl AgentConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Overlays the gear environment variables on top of file settings.
    /// Empty values are treated as unset.
    pub fn apply_env<I, K, V>(&mut self, vars: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        for (key, value) in vars {
            let value: String = value.into();
            if value.is_empty() {
                continue;
            }
            match key.as_ref() {
                ENV_SERVER_ADDRESS => self.server.address = Some(value),
                ENV_SERVER_PORT => {
                    let port = value
                        .trim()
                        .parse::<u16>()
                        .map_err(|_| ConfigError::InvalidPort(value.clone()))?;
                    self.server.port = Some(port);
                }
                ENV_AGENT_DIR => self.agent_dir = Some(PathBuf::from(value)),
                ENV_HOST => self.host = Some(value),
                _ => {}
            }
        }
        Ok(())
    }

    /// Overlays the process environment as returned by
    /// [`std::env::vars_os`].
    ///
    /// Unrelated variables are ignored whatever their encoding. The agent
    /// directory may be any path; the other gear variables must be UTF-8 and
    /// are skipped with a warning otherwise.
    pub fn apply_os_env<I>(&mut self, vars: I) -> Result<()>
    where
        I: IntoIterator<Item = (OsString, OsString)>,
    {
        let mut utf8 = Vec::new();
        for (key, value) in vars {
            let Some(key) = key.to_str() else {
                continue;
            };
            if !matches!(
                key,
                ENV_SERVER_ADDRESS | ENV_SERVER_PORT | ENV_AGENT_DIR | ENV_HOST
            ) {
                continue;
            }
            if key == ENV_AGENT_DIR {
                if !value.is_empty() {
                    self.agent_dir = Some(PathBuf::from(value));
                }
                continue;
            }
            match value.into_string() {
                Ok(value) => utf8.push((key.to_string(), value)),
                Err(_) => tracing::warn!(key, "Ignoring non UTF-8 environment value"),
            }
        }
        self.apply_env(utf8)
    }

    /// Validates the configuration and derives the effective settings.
    pub fn resolve(self) -> Result<AgentSettings> {
        let host = self
            .host
            .filter(|h| !h.trim().is_empty())
            .ok_or(ConfigError::Missing("host"))?;
        let run_dir = self
            .run_dir
            .or_else(|| self.agent_dir.as_ref().map(|d| d.join("run")))
            .ok_or(ConfigError::Missing("run_dir"))?;
        let log_dir = self
            .log_dir
            .or_else(|| self.agent_dir.as_ref().map(|d| d.join("log")))
            .ok_or(ConfigError::Missing("log_dir"))?;

        let server = match (self.server.address, self.server.port) {
            (Some(address), Some(port)) if !address.trim().is_empty() => {
                Some(ServerEndpoint { address, port })
            }
            (None, None) => None,
            (address, port) => {
                tracing::info!(
                    address = ?address,
                    port = ?port,
                    "Incomplete server configuration, transmission disabled"
                );
                None
            }
        };

        Ok(AgentSettings {
            host,
            run_dir,
            log_path: log_dir.join(self.log_file_name),
            sender: self.sender,
            server,
            sources: self.sources,
        })
    }
}

/// A configured remote collector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerEndpoint {
    pub address: String,
    pub port: u16,
}

/// Validated settings the pipeline runs with.
#[derive(Debug, Clone)]
pub struct AgentSettings {
    pub host: String,
    pub run_dir: PathBuf,
    pub log_path: PathBuf,
    pub sender: String,
    /// `None` disables transmission.
    pub server: Option<ServerEndpoint>,
    pub sources: SourcesConfig,
}
