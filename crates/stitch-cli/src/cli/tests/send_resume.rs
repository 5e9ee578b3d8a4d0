//! Tests for send and resume subcommands.

use super::parse;
use crate::cli::commands::{batch_options, destination_name, transfer_options, transfer_requests};
use crate::cli::{Cli, CliCommand, SendArgs};
use clap::Parser;
use std::path::Path;
use stitch_core::chunking::ChunkSize;
use stitch_core::config::StitchConfig;
use stitch_core::sender::{ResumeMode, TransferMode};
use stitch_core::transport::PayloadEncoding;

fn send_args(args: &[&str]) -> SendArgs {
    match parse(args) {
        CliCommand::Send { args } => args,
        other => panic!("expected Send, got {other:?}"),
    }
}

#[test]
fn cli_parse_send_defaults() {
    let args = send_args(&["stitch", "send", "video.mp4"]);
    assert_eq!(args.files, [Path::new("video.mp4")]);
    assert!(args.max_files.is_none());
    assert!(!args.keep_going);
    assert!(args.name.is_none());
    assert!(args.chunk_size.is_none());
    assert!(args.parallel.is_none());
    assert!(args.mode.is_none());
    assert!(args.encoding.is_none());
    assert_eq!(args.target.directory, "");
    assert!(args.target.server.is_none());
    assert!(args.target.local_root.is_none());
}

#[test]
fn cli_parse_send_all_flags() {
    let args = send_args(&[
        "stitch",
        "send",
        "/data/video.mp4",
        "--name",
        "clip.mp4",
        "-d",
        "media/2024",
        "--chunk-size",
        "5mb",
        "--parallel",
        "8",
        "--encoding",
        "base64",
        "--server",
        "http://10.0.0.2:8750",
    ]);
    assert_eq!(args.name.as_deref(), Some("clip.mp4"));
    assert_eq!(args.target.directory, "media/2024");
    assert_eq!(args.chunk_size, Some(ChunkSize::M5));
    assert_eq!(args.parallel, Some(8));
    assert_eq!(args.encoding, Some(PayloadEncoding::Base64));
    assert_eq!(args.target.server.as_deref(), Some("http://10.0.0.2:8750"));
}

#[test]
fn cli_rejects_unknown_chunk_size() {
    assert!(Cli::try_parse_from(["stitch", "send", "f", "--chunk-size", "3MB"]).is_err());
}

#[test]
fn cli_server_conflicts_with_local_root() {
    assert!(Cli::try_parse_from([
        "stitch",
        "send",
        "f",
        "--server",
        "http://h",
        "--local-root",
        "/tmp/up",
    ])
    .is_err());
}

#[test]
fn cli_parse_resume_type() {
    match parse(&["stitch", "resume", "f.bin"]) {
        CliCommand::Resume { args, resume_type } => {
            assert_eq!(args.files, [Path::new("f.bin")]);
            assert_eq!(resume_type, ResumeMode::Normal);
        }
        _ => panic!("expected Resume"),
    }
    match parse(&["stitch", "resume", "f.bin", "--resume-type", "parallel"]) {
        CliCommand::Resume { resume_type, .. } => assert_eq!(resume_type, ResumeMode::Parallel),
        _ => panic!("expected Resume"),
    }
}

#[test]
fn flags_override_config() {
    let cfg = StitchConfig::default();
    let args = send_args(&["stitch", "send", "f", "--chunk-size", "64K", "--parallel", "3"]);
    let opts = transfer_options(&cfg, &args, ResumeMode::Off).unwrap();
    assert_eq!(opts.chunk_size, ChunkSize::K64);
    assert_eq!(opts.max_parallel, 3);
    assert_eq!(opts.mode, TransferMode::Parallel);

    let args = send_args(&["stitch", "send", "f", "--parallel", "3", "--mode", "sequential"]);
    let opts = transfer_options(&cfg, &args, ResumeMode::Off).unwrap();
    assert_eq!(opts.mode, TransferMode::Sequential);
    assert_eq!(opts.max_parallel, 3);

    let args = send_args(&["stitch", "send", "f"]);
    let opts = transfer_options(&cfg, &args, ResumeMode::Parallel).unwrap();
    assert_eq!(opts.chunk_size, cfg.sender.chunk_size);
    assert_eq!(opts.effective_mode(), TransferMode::Parallel);
}

#[test]
fn zero_parallel_is_rejected() {
    let args = send_args(&["stitch", "send", "f", "--parallel", "0"]);
    assert!(transfer_options(&StitchConfig::default(), &args, ResumeMode::Off).is_err());
}

#[test]
fn destination_defaults_to_source_name() {
    let file = Path::new("/data/archive.tar.gz");
    assert_eq!(destination_name(file, None).unwrap(), "archive.tar.gz");
    assert_eq!(destination_name(file, Some("a.tgz")).unwrap(), "a.tgz");
    assert!(destination_name(Path::new("/"), None).is_err());
}

#[test]
fn cli_parse_several_files() {
    let args = send_args(&[
        "stitch",
        "send",
        "a.bin",
        "b.bin",
        "-d",
        "in",
        "--max-files",
        "2",
        "--keep-going",
    ]);
    assert_eq!(args.files, [Path::new("a.bin"), Path::new("b.bin")]);
    assert_eq!(args.max_files, Some(2));
    assert!(args.keep_going);

    let batch = batch_options(&StitchConfig::default(), &args).unwrap();
    assert_eq!(batch.max_files, 2);
    assert!(!batch.stop_on_error);

    let opts = transfer_options(&StitchConfig::default(), &args, ResumeMode::Off).unwrap();
    let requests = transfer_requests(&args, opts).unwrap();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].identity.filename(), "a.bin");
    assert_eq!(requests[1].identity.directory(), "in");
}

#[test]
fn send_needs_at_least_one_file() {
    assert!(Cli::try_parse_from(["stitch", "send"]).is_err());
}

#[test]
fn batch_defaults_come_from_config() {
    let mut cfg = StitchConfig::default();
    cfg.sender.max_files = 3;
    let args = send_args(&["stitch", "send", "f"]);
    let batch = batch_options(&cfg, &args).unwrap();
    assert_eq!(batch.max_files, 3);
    assert!(batch.stop_on_error);

    let args = send_args(&["stitch", "send", "f", "--max-files", "0"]);
    assert!(batch_options(&cfg, &args).is_err());
}

#[test]
fn name_is_only_for_a_single_file() {
    let cfg = StitchConfig::default();
    let args = send_args(&["stitch", "send", "a", "b", "--name", "x"]);
    let opts = transfer_options(&cfg, &args, ResumeMode::Off).unwrap();
    assert!(transfer_requests(&args, opts).is_err());

    let args = send_args(&["stitch", "send", "a", "--name", "x"]);
    let requests = transfer_requests(&args, opts).unwrap();
    assert_eq!(requests[0].identity.filename(), "x");
    assert_eq!(requests[0].source, Path::new("a"));
}
