//! `stitch send` / `stitch resume`: chunked upload, merge and digest check of one
//! or more files.

use anyhow::{bail, Context, Result};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use stitch_core::config::StitchConfig;
use stitch_core::control::TransferControl;
use stitch_core::sender::{
    run_batch, BatchEntry, BatchOptions, BatchProgress, ChunkOutcome, ProgressEvent, ResumeMode,
    TransferMode, TransferOptions, TransferOutcome, TransferRequest,
};

use super::target::{build_transport, identity};
use crate::cli::SendArgs;

const PROGRESS_INTERVAL_MS: u128 = 500;

pub async fn run_send(cfg: &StitchConfig, args: &SendArgs) -> Result<()> {
    transfer(cfg, args, cfg.sender.resume).await
}

pub async fn run_resume(cfg: &StitchConfig, args: &SendArgs, resume: ResumeMode) -> Result<()> {
    if resume == ResumeMode::Off {
        bail!("--resume-type must be normal or parallel");
    }
    transfer(cfg, args, resume).await
}

/// Options from config, overridden by command-line flags.
pub(crate) fn transfer_options(
    cfg: &StitchConfig,
    args: &SendArgs,
    resume: ResumeMode,
) -> Result<TransferOptions> {
    let mut options = cfg.transfer_options();
    options.resume = resume;
    if let Some(size) = args.chunk_size {
        options.chunk_size = size;
    }
    if let Some(p) = args.parallel {
        if p == 0 {
            bail!("--parallel must be at least 1");
        }
        options.max_parallel = p;
        options.mode = TransferMode::Parallel;
    }
    if let Some(mode) = args.mode {
        options.mode = mode;
    }
    Ok(options)
}

pub(crate) fn batch_options(cfg: &StitchConfig, args: &SendArgs) -> Result<BatchOptions> {
    let max_files = args.max_files.unwrap_or(cfg.sender.max_files);
    if max_files == 0 {
        bail!("--max-files must be at least 1");
    }
    Ok(BatchOptions {
        max_files,
        stop_on_error: !args.keep_going,
    })
}

/// `name`, or the source's own file name.
pub(crate) fn destination_name(file: &Path, name: Option<&str>) -> Result<String> {
    if let Some(name) = name {
        return Ok(name.to_string());
    }
    file.file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string)
        .with_context(|| format!("cannot derive a file name from {}", file.display()))
}

pub(crate) fn transfer_requests(
    args: &SendArgs,
    options: TransferOptions,
) -> Result<Vec<TransferRequest>> {
    if args.name.is_some() && args.files.len() > 1 {
        bail!("--name can only be used with a single file");
    }
    args.files
        .iter()
        .map(|file| {
            let name = destination_name(file, args.name.as_deref())?;
            Ok(TransferRequest {
                source: file.clone(),
                identity: identity(&args.target, &name)?,
                options,
            })
        })
        .collect()
}

async fn transfer(cfg: &StitchConfig, args: &SendArgs, resume: ResumeMode) -> Result<()> {
    let options = transfer_options(cfg, args, resume)?;
    let batch = batch_options(cfg, args)?;
    let requests = transfer_requests(args, options)?;
    let encoding = args.encoding.unwrap_or(cfg.sender.encoding);
    let transport = build_transport(cfg, &args.target, encoding)?;

    let control = Arc::new(TransferControl::new());
    let interrupt = {
        let control = Arc::clone(&control);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                eprintln!("\ninterrupted, cancelling transfers");
                control.cancel_all();
            }
        })
    };

    let (progress_tx, mut progress_rx) = tokio::sync::mpsc::channel::<BatchProgress>(64);
    let progress_handle = tokio::spawn(async move {
        let mut last_print = Instant::now();
        while let Some(progress) = progress_rx.recv().await {
            print_progress(&progress, &mut last_print);
        }
    });

    let result = run_batch(transport, requests, control, batch, Some(progress_tx)).await;
    interrupt.abort();
    let _ = progress_handle.await;

    let entries = result?;
    let failed = entries.iter().filter(|e| !print_entry(e)).count();
    if failed > 0 {
        bail!("{} of {} transfer(s) failed", failed, entries.len());
    }
    Ok(())
}

fn print_progress(progress: &BatchProgress, last_print: &mut Instant) {
    let id = &progress.identity;
    match &progress.event {
        ProgressEvent::Stage(stage) => println!("  [{id}] {stage}"),
        ProgressEvent::Chunk {
            index,
            outcome,
            completed_chunks,
            total_chunks,
            bytes_sent,
            ..
        } => {
            let now = Instant::now();
            if now.duration_since(*last_print).as_millis() < PROGRESS_INTERVAL_MS
                && completed_chunks < total_chunks
            {
                return;
            }
            let verb = match outcome {
                ChunkOutcome::Uploaded { .. } => "sent",
                ChunkOutcome::Skipped => "skipped",
            };
            println!(
                "  [{}] chunk {} {}  {}/{} ({:.1}%)  {:.1} MiB sent",
                id,
                index,
                verb,
                completed_chunks,
                total_chunks,
                progress.event.percent().unwrap_or(0.0),
                *bytes_sent as f64 / 1_048_576.0
            );
            *last_print = now;
        }
    }
}

/// Print one file's report; `false` if it failed or its digests differ.
fn print_entry(entry: &BatchEntry) -> bool {
    let report = match &entry.result {
        Ok(report) => report,
        Err(e) => {
            println!("{} -> {}: FAILED: {}", entry.source.display(), entry.identity, e);
            return false;
        }
    };
    match &report.outcome {
        TransferOutcome::AlreadyComplete => {
            println!("{}: already complete on receiver", report.identity);
            true
        }
        TransferOutcome::Completed {
            local_digest,
            remote_digest,
        } => {
            println!(
                "{}: {} chunk(s) sent, {} skipped, {:.1} MiB in {:.1}s",
                report.identity,
                report.uploaded_chunks,
                report.skipped_chunks,
                report.bytes_sent as f64 / 1_048_576.0,
                report.elapsed.as_secs_f64()
            );
            println!("  local  {local_digest}");
            println!("  remote {remote_digest}");
            if report.digests_match() == Some(false) {
                println!("  DIGEST MISMATCH");
                false
            } else {
                println!("  digests match");
                true
            }
        }
    }
}
