use serde::Deserialize;
use std::path::PathBuf;
use zagent_common::command::CommandSpec;

/// Where each source reader gets its data.
///
/// Every field has a default matching a stock gear, so a config file only
/// needs to name what differs.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SourcesConfig {
    /// Command printing the cgroup accounting report as JSON.
    pub cgroup_report: CommandSpec,
    pub quota: CommandSpec,
    /// Command listing one line per process/thread.
    pub processes: CommandSpec,
    pub uptime_path: PathBuf,
    pub loadavg_path: PathBuf,
    pub meminfo_path: PathBuf,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            cgroup_report: CommandSpec::new("oo-cgroup-read", ["report"]),
            quota: CommandSpec::new("quota", ["-vw"]),
            processes: CommandSpec::new("ps", ["-eL"]),
            uptime_path: PathBuf::from("/proc/uptime"),
            loadavg_path: PathBuf::from("/proc/loadavg"),
            meminfo_path: PathBuf::from("/proc/meminfo"),
        }
    }
}
