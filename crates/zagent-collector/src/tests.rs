use crate::aggregate::{Aggregator, SourceOutcome};
use crate::config::SourcesConfig;
use crate::Source;
use std::fs;
use std::sync::Arc;
use tempfile::TempDir;
use zagent_common::command::StaticCommandRunner;
use zagent_common::error::{Result, SourceError};
use zagent_common::types::{MetricMap, MetricValue};

struct Fixed {
    name: &'static str,
    metrics: Vec<(&'static str, &'static str)>,
}

impl Source for Fixed {
    fn name(&self) -> &'static str {
        self.name
    }

    fn collect(&self) -> Result<MetricMap> {
        Ok(self
            .metrics
            .iter()
            .map(|(k, v)| (k.to_string(), MetricValue::from(*v)))
            .collect())
    }
}

struct Broken;

impl Source for Broken {
    fn name(&self) -> &'static str {
        "broken"
    }

    fn collect(&self) -> Result<MetricMap> {
        Err(SourceError::unavailable("broken", "not mounted"))
    }
}

fn proc_dir(meminfo: &str) -> (TempDir, SourcesConfig) {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("uptime"), "350735.47 234388.90\n").unwrap();
    fs::write(dir.path().join("loadavg"), "0.75 0.35 0.25 1/25 1747\n").unwrap();
    fs::write(dir.path().join("meminfo"), meminfo).unwrap();
    let config = SourcesConfig {
        uptime_path: dir.path().join("uptime"),
        loadavg_path: dir.path().join("loadavg"),
        meminfo_path: dir.path().join("meminfo"),
        ..SourcesConfig::default()
    };
    (dir, config)
}

#[test]
fn later_source_wins_on_collision() {
    let aggregator = Aggregator::new(vec![
        Box::new(Fixed {
            name: "first",
            metrics: vec![("shared", "1"), ("only.first", "a")],
        }),
        Box::new(Fixed {
            name: "second",
            metrics: vec![("shared", "2")],
        }),
    ]);

    let result = aggregator.collect();
    assert_eq!(result.snapshot.get("shared"), Some(&MetricValue::new("2")));
    assert_eq!(result.snapshot.get("only.first"), Some(&MetricValue::new("a")));
    assert_eq!(result.snapshot.len(), 2);
}

#[test]
fn failed_source_is_reported_not_fatal() {
    let aggregator = Aggregator::new(vec![
        Box::new(Broken),
        Box::new(Fixed {
            name: "ok",
            metrics: vec![],
        }),
    ]);

    let result = aggregator.collect();
    assert!(result.snapshot.is_empty());
    assert!(matches!(result.reports[0].outcome, SourceOutcome::Failed(_)));
    // legitimately empty, not errored
    assert!(matches!(result.reports[1].outcome, SourceOutcome::Collected(0)));
    assert_eq!(result.failures().count(), 1);
}

#[test]
fn standard_chain_with_captured_output() {
    let (_dir, config) = proc_dir("MemTotal: 1000 kB\nMemFree: 200 kB\n");
    let runner = StaticCommandRunner::new()
        .with_output(
            "oo-cgroup-read",
            r#"{"cpu.shares": 128, "memory.stat": {"cache": 1, "total_cache": 1}}"#,
        )
        .with_output("quota", "/dev/sda1  12  34  56  78  90  12\n")
        .with_output("ps", "PID LWP\n1 1\n2 2\n");

    let aggregator = Aggregator::standard(&config, Arc::new(runner));
    assert_eq!(
        aggregator.source_names(),
        vec!["cgroup", "quota", "ulimit", "load", "memory"]
    );

    let result = aggregator.collect();
    let snapshot = &result.snapshot;
    assert_eq!(result.failures().count(), 0);
    assert_eq!(snapshot.get("cgroup.cpu.shares").unwrap().as_str(), "128");
    assert_eq!(snapshot.get("cgroup.memory.stat.cache").unwrap().as_str(), "1");
    assert!(snapshot.get("cgroup.memory.stat.total_cache").is_none());
    assert_eq!(snapshot.get("quota.home.blocks_used").unwrap().as_str(), "12");
    assert_eq!(snapshot.get("ulimit.nproc").unwrap().as_str(), "3");
    assert_eq!(snapshot.get("system.cpu.load[percpu,avg15]").unwrap().as_str(), "0.25");
    assert_eq!(snapshot.get("vm.memory.size[total]").unwrap().as_str(), "1000");
    assert_eq!(snapshot.get("vm.memory.size[free]").unwrap().as_str(), "200");
    assert_eq!(snapshot.len(), 13);
}

#[test]
fn missing_subsystems_degrade_to_partial_snapshot() {
    let (_dir, config) = proc_dir("MemTotal: 1000 kB\n");
    let aggregator = Aggregator::standard(&config, Arc::new(StaticCommandRunner::new()));

    let result = aggregator.collect();
    let failed: Vec<_> = result.failures().map(|(name, _)| name).collect();
    assert_eq!(failed, vec!["cgroup", "quota", "ulimit"]);
    assert_eq!(result.snapshot.len(), 5);
}
