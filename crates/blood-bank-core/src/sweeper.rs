//! Expiration sweeper.
//!
//! Moves `open` requests whose `expires_at` has passed to `expired`. Each row
//! goes through the same conditional update as a user transition, so a request
//! fulfilled or cancelled after the sweep read it is left alone.

use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::db::{Database, DbResult};
use crate::models::RequestStatus;
use crate::service::BloodBank;

/// Requests moved to `expired` by one sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub expired_ids: Vec<String>,
    /// Candidates that changed status between the scan and the update
    pub skipped: usize,
}

impl SweepReport {
    pub fn expired(&self) -> usize {
        self.expired_ids.len()
    }
}

/// One-shot sweep over a database.
pub struct ExpirationSweeper<'a> {
    db: &'a Database,
}

impl<'a> ExpirationSweeper<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Expire every open request whose expiry is before `as_of`.
    pub fn sweep(&self, as_of: DateTime<Utc>) -> DbResult<SweepReport> {
        let candidates = self.db.list_expired_open_request_ids(as_of)?;
        let mut report = SweepReport::default();

        for id in candidates {
            if self
                .db
                .update_request_status(&id, RequestStatus::Open, RequestStatus::Expired, as_of)?
            {
                debug!(request_id = %id, "request expired");
                report.expired_ids.push(id);
            } else {
                report.skipped += 1;
            }
        }

        Ok(report)
    }
}

/// Runs [`BloodBank::sweep_expired`] on a background thread at a fixed interval.
pub struct PeriodicSweeper {
    stop_tx: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl PeriodicSweeper {
    /// Start sweeping every `interval`. The first sweep runs after one interval.
    pub fn spawn(bank: Arc<BloodBank>, interval: Duration) -> Self {
        let (stop_tx, stop_rx) = mpsc::channel::<()>();

        let handle = thread::spawn(move || {
            info!(interval_ms = interval.as_millis() as u64, "periodic sweeper started");
            loop {
                match stop_rx.recv_timeout(interval) {
                    Err(RecvTimeoutError::Timeout) => {
                        if let Err(e) = bank.sweep_expired(Utc::now()) {
                            warn!(error = %e, "expiration sweep failed");
                        }
                    }
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }
            }
            info!("periodic sweeper stopped");
        });

        Self {
            stop_tx: Some(stop_tx),
            handle: Some(handle),
        }
    }

    /// Signal the thread and wait for it to finish its current sweep.
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("periodic sweeper thread panicked");
            }
        }
    }
}

impl Drop for PeriodicSweeper {
    fn drop(&mut self) {
        self.shutdown();
    }
}
