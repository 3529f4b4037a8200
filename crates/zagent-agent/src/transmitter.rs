use crate::config::{AgentSettings, ServerEndpoint};
use crate::error::TransmitError;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::NamedTempFile;
use zagent_common::command::{CommandRunner, STATUS_NOT_FOUND};
use zagent_common::types::Snapshot;

const SPOOL_PREFIX: &str = "zabbix-sender-tmp-";

/// Delivers snapshots to the remote collector through the sender utility.
///
/// Each send spools the snapshot to a fresh file in the run directory and
/// hands its path to the sender. Spool files are left in place after the
/// sender exits so a delivery can be inspected or replayed later.
pub struct Transmitter {
    server: Option<ServerEndpoint>,
    run_dir: PathBuf,
    host: String,
    sender: String,
    runner: Arc<dyn CommandRunner>,
}

impl Transmitter {
    pub fn new(settings: &AgentSettings, runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            server: settings.server.clone(),
            run_dir: settings.run_dir.clone(),
            host: settings.host.clone(),
            sender: settings.sender.clone(),
            runner,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.server.is_some()
    }

    /// Sends `snapshot` and returns the sender's exit status unchanged.
    ///
    /// Without a configured server this is a no-op returning `0`. A sender
    /// that cannot be started reports status `127`.
    ///
    /// # Errors
    ///
    /// Returns an error if the spool file cannot be created or written.
    pub fn send(&self, snapshot: &Snapshot, verbose: bool) -> Result<i32, TransmitError> {
        let Some(server) = &self.server else {
            tracing::debug!("No collector configured, skipping transmission");
            return Ok(0);
        };

        if verbose {
            tracing::info!("Sending this data:");
        }
        let spool = self.spool(snapshot, verbose)?;

        let mut args = vec![
            "-z".to_string(),
            server.address.clone(),
            "-p".to_string(),
            server.port.to_string(),
            "-i".to_string(),
            spool.display().to_string(),
            "-s".to_string(),
            self.host.clone(),
        ];
        if verbose {
            args.push("-vv".to_string());
        }
        tracing::info!(command = %format!("{} {}", self.sender, args.join(" ")), "Invoking sender");

        let status = match self.runner.status(&self.sender, &args, !verbose) {
            Ok(status) => status,
            Err(e) => {
                tracing::warn!(sender = %self.sender, error = %e, "Failed to start sender");
                STATUS_NOT_FOUND
            }
        };

        if status == 0 {
            tracing::info!(count = snapshot.len(), spool = %spool.display(), "Metrics sent");
        } else {
            tracing::warn!(status, spool = %spool.display(), "Sender reported failure");
        }
        Ok(status)
    }

    /// Writes every metric as a spool record to a new uniquely named file and
    /// closes it, returning its path.
    fn spool(&self, snapshot: &Snapshot, verbose: bool) -> Result<PathBuf, TransmitError> {
        let spooled = tempfile::Builder::new()
            .prefix(SPOOL_PREFIX)
            .tempfile_in(&self.run_dir)
            .and_then(|tmp| {
                persist_spool(tmp, |out| {
                    for record in snapshot.spool_records(&self.host) {
                        if verbose {
                            tracing::info!("{}", record.to_string().trim_end());
                        }
                        write!(out, "{record}")?;
                    }
                    Ok(())
                })
            });
        spooled.map_err(|source| TransmitError::Spool {
            dir: self.run_dir.clone(),
            source,
        })
    }
}

/// Fills `tmp` through `write` and keeps it on disk once fully synced.
///
/// Until then the file is owned by `tmp`, so any failure removes the partial
/// spool instead of leaving it next to retained deliveries.
fn persist_spool<F>(mut tmp: NamedTempFile, write: F) -> io::Result<PathBuf>
where
    F: FnOnce(&mut BufWriter<&mut File>) -> io::Result<()>,
{
    let mut out = BufWriter::new(tmp.as_file_mut());
    write(&mut out)?;
    out.flush()?;
    drop(out);
    tmp.as_file().sync_all()?;

    let (file, path) = tmp.keep().map_err(|e| e.error)?;
    drop(file);
    Ok(path)
}
