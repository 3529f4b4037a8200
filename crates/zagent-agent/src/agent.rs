use crate::config::AgentSettings;
use crate::recorder::Recorder;
use crate::transmitter::Transmitter;
use chrono::Local;
use std::sync::Arc;
use zagent_collector::aggregate::Aggregator;
use zagent_common::command::CommandRunner;

/// Exit status for a run whose spool file could not be written.
pub const STATUS_SPOOL_FAILED: i32 = 1;

#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    /// Echo the spooled data and let the sender print its own diagnostics.
    pub verbose: bool,
    /// Collect and record only.
    pub skip_send: bool,
}

/// Outcome of one collection cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub metrics: usize,
    pub failed_sources: Vec<&'static str>,
    pub recorded: bool,
    /// Transmission status, used as the process exit code.
    pub status: i32,
}

/// One pass of the pipeline: collect, record, transmit.
pub struct Agent {
    aggregator: Aggregator,
    recorder: Recorder,
    transmitter: Transmitter,
}

impl Agent {
    pub fn new(settings: &AgentSettings, runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            aggregator: Aggregator::standard(&settings.sources, runner.clone()),
            recorder: Recorder::new(&settings.log_path),
            transmitter: Transmitter::new(settings, runner),
        }
    }

    pub fn run(&self, options: RunOptions) -> RunSummary {
        let aggregation = self.aggregator.collect();
        let failed_sources = aggregation.failures().map(|(name, _)| name).collect();
        let snapshot = aggregation.snapshot;

        let recorded = match self.recorder.record(&snapshot, Local::now()) {
            Ok(lines) => {
                tracing::debug!(lines, path = %self.recorder.path().display(), "Snapshot recorded");
                true
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to record snapshot, continuing");
                false
            }
        };

        let status = if options.skip_send {
            tracing::info!(count = snapshot.len(), "Transmission skipped");
            0
        } else {
            match self.transmitter.send(&snapshot, options.verbose) {
                Ok(status) => status,
                Err(e) => {
                    tracing::error!(error = %e, "Transmission aborted");
                    STATUS_SPOOL_FAILED
                }
            }
        };

        RunSummary {
            metrics: snapshot.len(),
            failed_sources,
            recorded,
            status,
        }
    }
}
