use std::path::PathBuf;

/// Configuration problems detected once at startup. These abort the run.
///
/// # Examples
///
/// ```rust
/// use zagent_agent::error::ConfigError;
///
/// let err = ConfigError::Missing("host");
/// assert!(err.to_string().contains("host"));
/// ```
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("Config: failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The config file is not valid TOML for [`crate::config::AgentConfig`].
    #[error("Config: failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    /// A required setting has no value from either the file or the environment.
    #[error("Config: missing required setting '{0}'")]
    Missing(&'static str),

    /// `ZABBIX_SERVER_PORT` is set but is not a TCP port.
    #[error("Config: invalid server port '{0}'")]
    InvalidPort(String),
}

/// Failure to append a snapshot to the local log. Never fatal to a run.
#[derive(Debug, thiserror::Error)]
#[error("Recorder: failed to append to {path}: {source}")]
pub struct RecordError {
    pub path: PathBuf,
    #[source]
    pub source: std::io::Error,
}

/// Failure to prepare the sender's input file.
///
/// A sender that runs and fails is not an error here; its exit status is the
/// transmission result.
#[derive(Debug, thiserror::Error)]
pub enum TransmitError {
    #[error("Transmit: failed to write spool file in {dir}: {source}")]
    Spool {
        dir: PathBuf,
        source: std::io::Error,
    },
}

pub type Result<T, E = ConfigError> = std::result::Result<T, E>;
