use crate::Source;
use std::sync::Arc;
use zagent_common::command::{CommandRunner, CommandSpec};
use zagent_common::error::{Result, SourceError};
use zagent_common::types::{MetricMap, MetricValue};

const NAME: &str = "quota";

/// Column layout of a `quota -vw` data row:
/// `filesystem blocks quota limit grace files quota limit grace`.
///
/// `grace` columns are only printed when a limit is exceeded, which is why the
/// inode columns are read at the positions they occupy in the common case.
const BLOCKS_USED: usize = 1;
const BLOCKS_LIMIT: usize = 3;
const INODES_USED: usize = 4;
const INODES_LIMIT: usize = 6;
const MIN_FIELDS: usize = INODES_LIMIT + 1;

/// Reads the home filesystem quota from the `quota` utility.
pub struct QuotaSource {
    runner: Arc<dyn CommandRunner>,
    command: CommandSpec,
}

impl QuotaSource {
    pub fn new(runner: Arc<dyn CommandRunner>, command: CommandSpec) -> Self {
        Self { runner, command }
    }
}

impl Source for QuotaSource {
    fn name(&self) -> &'static str {
        NAME
    }

    fn collect(&self) -> Result<MetricMap> {
        // quota exits non-zero when a limit is exceeded; its output is still valid
        let output = self
            .runner
            .output(&self.command.program, &self.command.args)
            .map_err(|e| SourceError::unavailable(NAME, format!("{}: {e}", self.command)))?;
        parse_quota(&output.stdout)
    }
}

/// Extracts `quota.home.*` metrics from `quota -vw` output.
///
/// Only rows starting with a `/` path are data rows. Every data row replaces
/// the result of the previous one, so with several quota-managed filesystems
/// the last listed row wins.
pub fn parse_quota(output: &str) -> Result<MetricMap> {
    let mut metrics = MetricMap::new();
    for line in output.lines().filter(|l| l.starts_with('/')) {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < MIN_FIELDS {
            return Err(SourceError::format(
                NAME,
                format!(
                    "expected at least {MIN_FIELDS} fields in row for {}, found {}",
                    fields[0],
                    fields.len()
                ),
            ));
        }
        metrics = vec![
            metric("quota.home.blocks_used", fields[BLOCKS_USED]),
            metric("quota.home.blocks_limit", fields[BLOCKS_LIMIT]),
            metric("quota.home.inodes_used", fields[INODES_USED]),
            metric("quota.home.inodes_limit", fields[INODES_LIMIT]),
        ];
    }
    Ok(metrics)
}

fn metric(name: &str, value: &str) -> (String, MetricValue) {
    (name.to_string(), MetricValue::from(value))
}
