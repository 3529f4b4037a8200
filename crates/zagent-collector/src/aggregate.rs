use crate::cgroup::CgroupSource;
use crate::config::SourcesConfig;
use crate::load::LoadSource;
use crate::memory::MemorySource;
use crate::quota::QuotaSource;
use crate::ulimit::UlimitSource;
use crate::Source;
use std::sync::Arc;
use zagent_common::command::CommandRunner;
use zagent_common::error::SourceError;
use zagent_common::types::Snapshot;

/// What a single source contributed to a snapshot.
#[derive(Debug)]
pub enum SourceOutcome {
    /// The source was read; it produced this many metrics (possibly zero).
    Collected(usize),
    /// The source failed and contributed nothing.
    Failed(SourceError),
}

#[derive(Debug)]
pub struct SourceReport {
    pub source: &'static str,
    pub outcome: SourceOutcome,
}

/// The merged snapshot of one cycle plus a report per source.
#[derive(Debug)]
pub struct Aggregation {
    pub snapshot: Snapshot,
    pub reports: Vec<SourceReport>,
}

impl Aggregation {
    pub fn failures(&self) -> impl Iterator<Item = (&'static str, &SourceError)> {
        self.reports.iter().filter_map(|r| match &r.outcome {
            SourceOutcome::Failed(e) => Some((r.source, e)),
            SourceOutcome::Collected(_) => None,
        })
    }
}

/// Runs sources in registration order and merges their metrics.
///
/// Merging is last-write-wins on metric name; no cross-source consistency is
/// checked. A failing source is logged and contributes an empty mapping.
pub struct Aggregator {
    sources: Vec<Box<dyn Source>>,
}

impl Aggregator {
    pub fn new(sources: Vec<Box<dyn Source>>) -> Self {
        Self { sources }
    }

    /// Builds the standard source chain: cgroup, quota, ulimit, load, memory.
    pub fn standard(config: &SourcesConfig, runner: Arc<dyn CommandRunner>) -> Self {
        Self::new(vec![
            Box::new(CgroupSource::new(runner.clone(), config.cgroup_report.clone())),
            Box::new(QuotaSource::new(runner.clone(), config.quota.clone())),
            Box::new(UlimitSource::new(runner, config.processes.clone())),
            Box::new(LoadSource::new(&config.uptime_path, &config.loadavg_path)),
            Box::new(MemorySource::new(&config.meminfo_path)),
        ])
    }

    pub fn source_names(&self) -> Vec<&'static str> {
        self.sources.iter().map(|s| s.name()).collect()
    }

    pub fn collect(&self) -> Aggregation {
        let mut snapshot = Snapshot::new();
        let mut reports = Vec::with_capacity(self.sources.len());

        for source in &self.sources {
            let outcome = match source.collect() {
                Ok(metrics) => {
                    tracing::debug!(
                        source = source.name(),
                        count = metrics.len(),
                        "Source collected"
                    );
                    let count = metrics.len();
                    snapshot.merge(metrics);
                    SourceOutcome::Collected(count)
                }
                Err(e) => {
                    tracing::warn!(
                        source = source.name(),
                        error = %e,
                        "Source unavailable, skipping"
                    );
                    SourceOutcome::Failed(e)
                }
            };
            reports.push(SourceReport {
                source: source.name(),
                outcome,
            });
        }

        tracing::debug!(count = snapshot.len(), "Snapshot aggregated");
        Aggregation { snapshot, reports }
    }
}
