use crate::Source;
use std::sync::Arc;
use zagent_common::command::{CommandRunner, CommandSpec};
use zagent_common::error::{Result, SourceError};
use zagent_common::types::{MetricMap, MetricValue};

const NAME: &str = "ulimit";

/// Counts processes and threads from a process listing (`ps -eL`), reported
/// as `ulimit.nproc`.
///
/// Open file counts are not reported: the nofile limit is per-process and
/// only meaningful compared against each process's own limit.
pub struct UlimitSource {
    runner: Arc<dyn CommandRunner>,
    command: CommandSpec,
}

impl UlimitSource {
    pub fn new(runner: Arc<dyn CommandRunner>, command: CommandSpec) -> Self {
        Self { runner, command }
    }
}

impl Source for UlimitSource {
    fn name(&self) -> &'static str {
        NAME
    }

    fn collect(&self) -> Result<MetricMap> {
        let output = self
            .runner
            .output(&self.command.program, &self.command.args)
            .map_err(|e| SourceError::unavailable(NAME, format!("{}: {e}", self.command)))?;
        Ok(vec![(
            "ulimit.nproc".to_string(),
            MetricValue::new(count_lines(&output.stdout).to_string()),
        )])
    }
}

/// Number of lines in the listing, header included.
pub fn count_lines(output: &str) -> usize {
    output.lines().count()
}
