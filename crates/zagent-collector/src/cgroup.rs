use crate::Source;
use serde_json::Value;
use std::sync::Arc;
use zagent_common::command::{CommandRunner, CommandSpec};
use zagent_common::error::{Result, SourceError};
use zagent_common::types::{MetricMap, MetricValue};

const NAME: &str = "cgroup";

/// Groups whose name ends with this suffix hold nested key/value statistics.
const STAT_SUFFIX: &str = ".stat";

/// Reads the cgroup accounting report produced by an external command.
pub struct CgroupSource {
    runner: Arc<dyn CommandRunner>,
    command: CommandSpec,
}

impl CgroupSource {
    pub fn new(runner: Arc<dyn CommandRunner>, command: CommandSpec) -> Self {
        Self { runner, command }
    }
}

impl Source for CgroupSource {
    fn name(&self) -> &'static str {
        NAME
    }

    fn collect(&self) -> Result<MetricMap> {
        let output = self
            .runner
            .output(&self.command.program, &self.command.args)
            .map_err(|e| SourceError::unavailable(NAME, format!("{}: {e}", self.command)))?;
        parse_report(&output.stdout)
    }
}

/// Flattens a cgroup JSON report into `cgroup.*` metrics.
///
/// Scalar top-level entries map to `cgroup.<key>`. Entries whose key ends in
/// `.stat` are objects; each inner entry maps to `cgroup.<key>.<subkey>`.
/// Within `memory.stat`, `total_*` entries are dropped since they repeat the
/// hierarchical totals of the unprefixed counters.
pub fn parse_report(json: &str) -> Result<MetricMap> {
    let report: Value = serde_json::from_str(json).map_err(|error| SourceError::Json {
        source_name: NAME,
        error,
    })?;
    let Value::Object(groups) = report else {
        return Err(SourceError::format(NAME, "report is not a JSON object"));
    };

    let mut metrics = MetricMap::new();
    for (key, value) in &groups {
        if !key.ends_with(STAT_SUFFIX) {
            match MetricValue::from_json(value) {
                Some(v) => push(&mut metrics, format!("cgroup.{key}"), v),
                None => tracing::debug!(key = %key, "Skipping non-scalar cgroup entry"),
            }
            continue;
        }

        let Value::Object(stats) = value else {
            tracing::debug!(key = %key, "Skipping cgroup stat group that is not an object");
            continue;
        };
        for (sub, sub_value) in stats {
            if key == "memory.stat" && sub.starts_with("total_") {
                continue;
            }
            match MetricValue::from_json(sub_value) {
                Some(v) => push(&mut metrics, format!("cgroup.{key}.{sub}"), v),
                None => tracing::debug!(key = %key, sub = %sub, "Skipping non-scalar cgroup stat"),
            }
        }
    }
    Ok(metrics)
}

fn push(metrics: &mut MetricMap, name: String, value: MetricValue) {
    tracing::debug!("{name} = {value}");
    metrics.push((name, value));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn get<'a>(metrics: &'a MetricMap, name: &str) -> Option<&'a str> {
        metrics
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    #[test]
    fn flattens_scalars_and_stat_groups() {
        let json = r#"{
            "cpu.shares": 128,
            "memory.limit_in_bytes": "536870912",
            "cpu.stat": {"nr_periods": 10, "nr_throttled": 2},
            "memory.stat": {"cache": 4096, "rss": 8192, "total_cache": 4096, "total_rss": 8192}
        }"#;
        let metrics = parse_report(json).unwrap();

        assert_eq!(get(&metrics, "cgroup.cpu.shares"), Some("128"));
        assert_eq!(get(&metrics, "cgroup.memory.limit_in_bytes"), Some("536870912"));
        assert_eq!(get(&metrics, "cgroup.cpu.stat.nr_throttled"), Some("2"));
        assert_eq!(get(&metrics, "cgroup.memory.stat.cache"), Some("4096"));
        assert_eq!(get(&metrics, "cgroup.memory.stat.rss"), Some("8192"));
        assert!(metrics.iter().all(|(k, _)| !k.starts_with("cgroup.memory.stat.total_")));
        assert_eq!(metrics.len(), 6);
    }

    #[test]
    fn total_prefix_kept_outside_memory_stat() {
        let metrics = parse_report(r#"{"cpuacct.stat": {"total_user": 5}}"#).unwrap();
        assert_eq!(get(&metrics, "cgroup.cpuacct.stat.total_user"), Some("5"));
    }

    #[test]
    fn null_and_nested_values_are_skipped() {
        let report = r#"{"a": null, "b": [1, 2], "c.stat": 3, "d": 1}"#;
        let metrics = parse_report(report).unwrap();
        assert_eq!(metrics, vec![("cgroup.d".to_string(), MetricValue::new("1"))]);
    }

    #[test]
    fn rejects_non_object_and_invalid_json() {
        assert!(matches!(parse_report("[1]"), Err(SourceError::Format { .. })));
        assert!(matches!(parse_report(""), Err(SourceError::Json { .. })));
    }
}
