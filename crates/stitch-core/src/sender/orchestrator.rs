//! Transfer Orchestrator: plans chunks, dispatches them sequentially or through a
//! bounded worker pool, then merges and verifies.

use std::collections::VecDeque;
use std::fs::File;
use std::path::PathBuf;
use std::sync::{mpsc, Arc, Mutex, PoisonError};

use super::error::TransferError;
use super::options::{TransferMode, TransferOptions};
use super::progress::{emit, ChunkOutcome, ProgressEvent, ProgressSender};
use super::report::{TransferOutcome, TransferReport};
use super::source::SourceFile;
use super::state::{Stage, TransferState};
use super::worker::ChunkWorker;
use crate::checksum;
use crate::chunking::{plan_chunks, total_chunks, ChunkDescriptor, ChunkRange};
use crate::control::CancelToken;
use crate::identity::FileIdentity;
use crate::retry::run_with_retry;
use crate::transport::ChunkTransport;

/// What to send and where.
#[derive(Debug, Clone)]
pub struct TransferRequest {
    pub source: PathBuf,
    pub identity: FileIdentity,
    pub options: TransferOptions,
}

/// Run one transfer to completion on the calling thread (plus pool threads in
/// parallel mode).
pub fn run_transfer(
    transport: Arc<dyn ChunkTransport>,
    request: &TransferRequest,
    cancel: &CancelToken,
    progress: Option<&ProgressSender>,
) -> Result<TransferReport, TransferError> {
    let source = Arc::new(SourceFile::open(&request.source)?);
    if source.is_empty() {
        return Err(TransferError::EmptySource(request.source.clone()));
    }
    let options = &request.options;
    let identity = &request.identity;
    let chunk_bytes = options.chunk_size.bytes();
    let total = total_chunks(source.len(), chunk_bytes);
    let mut state = TransferState::new(source.len(), chunk_bytes, total);

    tracing::info!(
        identity = %identity,
        source = %request.source.display(),
        bytes = source.len(),
        chunk_size = %options.chunk_size,
        chunks = total,
        mode = %options.effective_mode(),
        resume = %options.resume,
        "transfer started"
    );

    let result = drive(&transport, request, &source, &mut state, cancel, progress);
    match &result {
        Ok(report) => tracing::info!(
            identity = %identity,
            uploaded = report.uploaded_chunks,
            skipped = report.skipped_chunks,
            elapsed_ms = report.elapsed.as_millis() as u64,
            "transfer finished"
        ),
        Err(e) => {
            set_stage(&mut state, Stage::Failed, progress);
            tracing::warn!(identity = %identity, error = %e, "transfer failed");
        }
    }
    result
}

fn drive(
    transport: &Arc<dyn ChunkTransport>,
    request: &TransferRequest,
    source: &Arc<SourceFile>,
    state: &mut TransferState,
    cancel: &CancelToken,
    progress: Option<&ProgressSender>,
) -> Result<TransferReport, TransferError> {
    let options = &request.options;
    let identity = &request.identity;

    if options.resuming() {
        let assembled = run_with_retry(&options.retry, cancel, |_| {
            transport.assembled_exists(identity)
        })
        .map_err(|f| TransferError::from_retry("probe assembled file", f))?;
        if assembled {
            tracing::info!(identity = %identity, "receiver already has the assembled file");
            set_stage(state, Stage::AlreadyComplete, progress);
            return Ok(report(identity, state, TransferOutcome::AlreadyComplete));
        }
    }

    set_stage(state, Stage::Uploading, progress);
    let worker = ChunkWorker::new(
        Arc::clone(transport),
        Arc::clone(source),
        options.retry,
        cancel.clone(),
        options.resuming(),
    );
    match options.effective_mode() {
        TransferMode::Sequential => run_sequential(&worker, identity, state, cancel, progress)?,
        TransferMode::Parallel => {
            run_parallel(&worker, identity, options.max_parallel, state, cancel, progress)?
        }
    }

    set_stage(state, Stage::Merging, progress);
    let total = state.total_chunks;
    let merge_attempts = run_with_retry(&options.retry, cancel, |attempt| {
        transport.merge(identity, total).map(|()| attempt)
    })
    .map_err(|f| TransferError::from_retry("merge", f))?;
    tracing::debug!(identity = %identity, attempts = merge_attempts, "merge accepted");

    set_stage(state, Stage::Verifying, progress);
    let (local_digest, remote_digest) = digests(transport, identity, source, options, cancel)?;
    if local_digest != remote_digest {
        tracing::warn!(identity = %identity, %local_digest, %remote_digest, "digest mismatch");
    }

    set_stage(state, Stage::Done, progress);
    Ok(report(
        identity,
        state,
        TransferOutcome::Completed {
            local_digest,
            remote_digest,
        },
    ))
}

fn run_sequential(
    worker: &ChunkWorker,
    identity: &FileIdentity,
    state: &mut TransferState,
    cancel: &CancelToken,
    progress: Option<&ProgressSender>,
) -> Result<(), TransferError> {
    state.seek(1);
    while !state.upload_done() {
        if cancel.is_cancelled() {
            return Err(TransferError::Cancelled);
        }
        let chunk = ChunkDescriptor {
            identity: identity.clone(),
            index: state.current_chunk,
            range: ChunkRange {
                start: state.start_byte,
                end: state.end_byte,
            },
            total_chunks: state.total_chunks,
        };
        let outcome = worker.deliver(&chunk)?;
        record(state, chunk.index, outcome, progress);
        state.advance();
    }
    Ok(())
}

/// Fixed pool of `min(max_parallel, total)` threads pulling from a shared queue.
/// Results are handled one at a time here; the first fatal error cancels the
/// transfer and drains the queue.
fn run_parallel(
    worker: &ChunkWorker,
    identity: &FileIdentity,
    max_parallel: usize,
    state: &mut TransferState,
    cancel: &CancelToken,
    progress: Option<&ProgressSender>,
) -> Result<(), TransferError> {
    let plan: VecDeque<ChunkDescriptor> = plan_chunks(state.file_size, state.chunk_bytes)
        .into_iter()
        .enumerate()
        .map(|(i, range)| ChunkDescriptor {
            identity: identity.clone(),
            index: i as u64 + 1,
            range,
            total_chunks: state.total_chunks,
        })
        .collect();
    let count = plan.len();
    let work = Arc::new(Mutex::new(plan));
    let (tx, rx) = mpsc::channel();
    let num_workers = max_parallel.max(1).min(count);
    let mut handles = Vec::with_capacity(num_workers);
    for _ in 0..num_workers {
        let work = Arc::clone(&work);
        let tx = tx.clone();
        let worker = worker.clone();
        handles.push(std::thread::spawn(move || loop {
            let chunk = match work.lock().unwrap_or_else(PoisonError::into_inner).pop_front() {
                Some(c) => c,
                None => break,
            };
            let res = worker.deliver(&chunk);
            if tx.send((chunk.index, res)).is_err() {
                break;
            }
        }));
    }
    drop(tx);

    let mut first_error: Option<TransferError> = None;
    let mut to_receive = count;
    while to_receive > 0 {
        let (index, res) = match rx.recv() {
            Ok(pair) => pair,
            Err(_) => {
                first_error.get_or_insert(TransferError::ServerFatal {
                    context: "worker pool".into(),
                    message: "result channel closed (worker may have panicked)".into(),
                });
                break;
            }
        };
        to_receive -= 1;
        match res {
            Ok(outcome) => record(state, index, outcome, progress),
            Err(e) => {
                if first_error.is_none() {
                    if !matches!(e, TransferError::Cancelled) {
                        tracing::warn!(identity = %identity, index, error = %e, "chunk failed, stopping transfer");
                    }
                    cancel.cancel();
                    first_error = Some(e);
                }
                let drained = {
                    let mut q = work.lock().unwrap_or_else(PoisonError::into_inner);
                    let n = q.len();
                    q.clear();
                    n
                };
                to_receive = to_receive.saturating_sub(drained);
            }
        }
    }
    for h in handles {
        if h.join().is_err() {
            first_error.get_or_insert(TransferError::ServerFatal {
                context: "worker pool".into(),
                message: "worker thread panicked".into(),
            });
        }
    }
    match first_error {
        Some(e) => Err(e),
        None if cancel.is_cancelled() => Err(TransferError::Cancelled),
        None => Ok(()),
    }
}

/// Local digest on a scoped thread while the remote digest is fetched.
fn digests(
    transport: &Arc<dyn ChunkTransport>,
    identity: &FileIdentity,
    source: &SourceFile,
    options: &TransferOptions,
    cancel: &CancelToken,
) -> Result<(String, String), TransferError> {
    std::thread::scope(|scope| {
        let local = scope.spawn(|| {
            let path = source.path();
            File::open(path)
                .and_then(checksum::sha256_reader)
                .map_err(|e| TransferError::io(path, e))
        });
        let remote = run_with_retry(&options.retry, cancel, |_| transport.digest(identity))
            .map_err(|f| TransferError::from_retry("remote digest", f));
        let local = local.join().unwrap_or_else(|_| {
            Err(TransferError::ServerFatal {
                context: "local digest".into(),
                message: "digest thread panicked".into(),
            })
        });
        Ok((local?, remote?))
    })
}

fn record(
    state: &mut TransferState,
    index: u64,
    outcome: ChunkOutcome,
    progress: Option<&ProgressSender>,
) {
    match outcome {
        ChunkOutcome::Uploaded { bytes } => state.record_uploaded(bytes),
        ChunkOutcome::Skipped => state.record_skipped(),
    }
    emit(
        progress,
        ProgressEvent::Chunk {
            index,
            outcome,
            completed_chunks: state.completed_chunks(),
            total_chunks: state.total_chunks,
            bytes_sent: state.bytes_sent,
            file_size: state.file_size,
        },
    );
}

fn set_stage(state: &mut TransferState, stage: Stage, progress: Option<&ProgressSender>) {
    if state.stage != stage {
        tracing::debug!(from = %state.stage, to = %stage, "transfer stage");
    }
    state.stage = stage;
    emit(progress, ProgressEvent::Stage(stage));
}

fn report(identity: &FileIdentity, state: &TransferState, outcome: TransferOutcome) -> TransferReport {
    TransferReport {
        identity: identity.clone(),
        total_chunks: state.total_chunks,
        uploaded_chunks: state.uploaded_chunks,
        skipped_chunks: state.skipped_chunks,
        bytes_sent: state.bytes_sent,
        elapsed: state.elapsed(),
        outcome,
    }
}
