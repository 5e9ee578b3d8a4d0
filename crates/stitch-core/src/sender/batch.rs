//! Several transfers at once, each with its own orchestrator.
//!
//! Keeps up to `max_files` transfers running on tokio's blocking pool; when one
//! finishes, the next queued file starts. Every file is registered in one
//! `TransferControl` before the first starts, so `cancel_all` also reaches files
//! still waiting in the queue.

use std::collections::{HashSet, VecDeque};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use tokio::sync::mpsc;
use tokio::task::JoinSet;

use super::error::TransferError;
use super::orchestrator::{run_transfer, TransferRequest};
use super::progress::{ProgressEvent, ProgressSender};
use super::report::TransferReport;
use crate::control::{CancelToken, TransferControl};
use crate::identity::FileIdentity;
use crate::transport::ChunkTransport;

const FORWARD_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchOptions {
    /// Files transferred concurrently (at least 1).
    pub max_files: usize,
    /// Cancel the rest of the batch on the first failure.
    pub stop_on_error: bool,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            max_files: 5,
            stop_on_error: true,
        }
    }
}

/// A progress event of one file in the batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchProgress {
    /// Position of the file in the request list.
    pub slot: usize,
    pub identity: FileIdentity,
    pub event: ProgressEvent,
}

pub type BatchProgressSender = mpsc::Sender<BatchProgress>;

/// Outcome of one file.
#[derive(Debug)]
pub struct BatchEntry {
    pub source: PathBuf,
    pub identity: FileIdentity,
    pub result: Result<TransferReport, TransferError>,
}

/// Run `requests` with at most `options.max_files` in flight. Results are returned
/// in request order.
pub async fn run_batch(
    transport: Arc<dyn ChunkTransport>,
    requests: Vec<TransferRequest>,
    control: Arc<TransferControl>,
    options: BatchOptions,
    progress: Option<BatchProgressSender>,
) -> Result<Vec<BatchEntry>> {
    let mut seen = HashSet::new();
    for request in &requests {
        if !seen.insert(&request.identity) {
            bail!("{} is the destination of more than one file", request.identity);
        }
    }

    let max_files = options.max_files.max(1);
    let mut queue: VecDeque<(usize, TransferRequest, CancelToken)> = requests
        .into_iter()
        .enumerate()
        .map(|(slot, request)| {
            let cancel = control.register(&request.identity);
            (slot, request, cancel)
        })
        .collect();
    let mut results: Vec<Option<BatchEntry>> = (0..queue.len()).map(|_| None).collect();
    tracing::info!(files = results.len(), max_files, "batch started");

    let mut join_set = JoinSet::new();
    let mut stopping = false;
    loop {
        while join_set.len() < max_files {
            let Some((slot, request, cancel)) = queue.pop_front() else {
                break;
            };
            let transport = Arc::clone(&transport);
            let tx = forward_progress(progress.as_ref(), slot, &request.identity);
            join_set.spawn_blocking(move || {
                let result = run_transfer(transport, &request, &cancel, tx.as_ref());
                (slot, request, result)
            });
        }

        let Some(joined) = join_set.join_next().await else {
            break;
        };
        let (slot, request, result) = match joined.context("transfer task join") {
            Ok(done) => done,
            Err(e) => {
                control.cancel_all();
                return Err(e);
            }
        };
        control.unregister(&request.identity);

        if let Err(e) = &result {
            if options.stop_on_error && !stopping && !matches!(e, TransferError::Cancelled) {
                stopping = true;
                tracing::warn!(
                    identity = %request.identity,
                    error = %e,
                    "transfer failed, cancelling the rest of the batch"
                );
                control.cancel_all();
            }
        }
        results[slot] = Some(BatchEntry {
            source: request.source,
            identity: request.identity,
            result,
        });
    }

    let entries: Vec<BatchEntry> = results.into_iter().flatten().collect();
    let failed = entries.iter().filter(|e| e.result.is_err()).count();
    tracing::info!(files = entries.len(), failed, "batch finished");
    Ok(entries)
}

/// Per-file progress channel whose events are tagged and passed on to `out`.
fn forward_progress(
    out: Option<&BatchProgressSender>,
    slot: usize,
    identity: &FileIdentity,
) -> Option<ProgressSender> {
    let out = out?.clone();
    let identity = identity.clone();
    let (tx, mut rx) = mpsc::channel(FORWARD_CAPACITY);
    tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            let _ = out
                .send(BatchProgress {
                    slot,
                    identity: identity.clone(),
                    event,
                })
                .await;
        }
    });
    Some(tx)
}
