use crate::{read_source_file, Source};
use std::path::PathBuf;
use zagent_common::error::{Result, SourceError};
use zagent_common::types::{MetricMap, MetricValue};

const NAME: &str = "load";

/// Reads host uptime and load averages from procfs.
pub struct LoadSource {
    uptime_path: PathBuf,
    loadavg_path: PathBuf,
}

impl LoadSource {
    pub fn new(uptime_path: impl Into<PathBuf>, loadavg_path: impl Into<PathBuf>) -> Self {
        Self {
            uptime_path: uptime_path.into(),
            loadavg_path: loadavg_path.into(),
        }
    }
}

impl Source for LoadSource {
    fn name(&self) -> &'static str {
        NAME
    }

    fn collect(&self) -> Result<MetricMap> {
        let uptime = read_source_file(NAME, &self.uptime_path)?;
        let loadavg = read_source_file(NAME, &self.loadavg_path)?;

        let mut metrics = parse_uptime(&uptime)?;
        metrics.extend(parse_loadavg(&loadavg)?);
        Ok(metrics)
    }
}

/// Parses `/proc/uptime`: `<uptime> <idle>`. Idle time is discarded.
pub fn parse_uptime(content: &str) -> Result<MetricMap> {
    let [uptime, _idle] = fields::<2>(content, "uptime")?;
    Ok(vec![("system.uptime".to_string(), MetricValue::from(uptime))])
}

/// Parses `/proc/loadavg`: `<avg1> <avg5> <avg15> <running/total> <last pid>`.
/// Only the three load averages are kept.
pub fn parse_loadavg(content: &str) -> Result<MetricMap> {
    let [avg1, avg5, avg15, _procs, _last_pid] = fields::<5>(content, "loadavg")?;
    Ok(vec![
        ("system.cpu.load[percpu,avg1]".to_string(), avg1.into()),
        ("system.cpu.load[percpu,avg5]".to_string(), avg5.into()),
        ("system.cpu.load[percpu,avg15]".to_string(), avg15.into()),
    ])
}

fn fields<'a, const N: usize>(content: &'a str, file: &str) -> Result<[&'a str; N]> {
    let found: Vec<&str> = content.split_whitespace().collect();
    found.as_slice().try_into().map_err(|_| {
        SourceError::format(
            NAME,
            format!("{file}: expected {N} fields, found {}", found.len()),
        )
    })
}
