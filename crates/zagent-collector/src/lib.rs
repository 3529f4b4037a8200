//! Metric collection for the zagent pipeline.
//!
//! Each [`Source`] implementation reads one system data source (cgroup
//! report, disk quota, process count, uptime/load, memory) and returns its
//! metrics under a fixed name prefix. The [`aggregate::Aggregator`] runs the
//! sources in order and merges their output into one
//! [`Snapshot`](zagent_common::types::Snapshot).

pub mod aggregate;
pub mod cgroup;
pub mod config;
pub mod load;
pub mod memory;
pub mod quota;
pub mod ulimit;

#[cfg(test)]
mod tests;

use zagent_common::error::Result;
use zagent_common::types::MetricMap;

/// A data source read once per collection cycle.
///
/// Implementations must not panic on missing or malformed input: a command
/// that cannot run or a file that cannot be read is reported as
/// [`SourceError::Unavailable`](zagent_common::error::SourceError::Unavailable),
/// output that does not match the expected layout as
/// [`SourceError::Format`](zagent_common::error::SourceError::Format).
pub trait Source: Send + Sync {
    /// Returns the source name (e.g., `"quota"`), used for logging.
    fn name(&self) -> &'static str;

    /// Reads the source and returns its metrics in source order.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying command or file is unavailable or
    /// its content cannot be parsed.
    fn collect(&self) -> Result<MetricMap>;
}

/// Reads a whole system file, mapping failures to an unavailable source.
pub(crate) fn read_source_file(
    source_name: &'static str,
    path: &std::path::Path,
) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| {
        zagent_common::error::SourceError::unavailable(
            source_name,
            format!("{}: {e}", path.display()),
        )
    })
}
