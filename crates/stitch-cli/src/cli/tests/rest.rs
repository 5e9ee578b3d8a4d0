//! Tests for serve, probe, merge, checksum and global flags.

use super::parse;
use crate::cli::{Cli, CliCommand};
use clap::Parser;
use std::net::SocketAddr;
use std::path::Path;

#[test]
fn cli_parse_serve() {
    match parse(&["stitch", "serve"]) {
        CliCommand::Serve {
            listen,
            root,
            max_chunk_bytes,
        } => {
            assert!(listen.is_none());
            assert!(root.is_none());
            assert!(max_chunk_bytes.is_none());
        }
        _ => panic!("expected Serve"),
    }
    match parse(&[
        "stitch",
        "serve",
        "--listen",
        "0.0.0.0:9000",
        "--root",
        "/srv/up",
        "--max-chunk-bytes",
        "1048576",
    ]) {
        CliCommand::Serve {
            listen,
            root,
            max_chunk_bytes,
        } => {
            assert_eq!(listen, Some("0.0.0.0:9000".parse::<SocketAddr>().unwrap()));
            assert_eq!(root.as_deref(), Some(Path::new("/srv/up")));
            assert_eq!(max_chunk_bytes, Some(1_048_576));
        }
        _ => panic!("expected Serve with flags"),
    }
}

#[test]
fn cli_parse_probe() {
    match parse(&["stitch", "probe", "a.bin", "--chunk", "3", "-d", "x/y"]) {
        CliCommand::Probe {
            name,
            chunk,
            target,
        } => {
            assert_eq!(name, "a.bin");
            assert_eq!(chunk, Some(3));
            assert_eq!(target.directory, "x/y");
        }
        _ => panic!("expected Probe"),
    }
    match parse(&["stitch", "probe", "a.bin"]) {
        CliCommand::Probe { chunk, .. } => assert!(chunk.is_none()),
        _ => panic!("expected Probe"),
    }
}

#[test]
fn cli_parse_merge_requires_total() {
    assert!(Cli::try_parse_from(["stitch", "merge", "a.bin"]).is_err());
    match parse(&["stitch", "merge", "a.bin", "--total", "12", "--local-root", "/tmp/up"]) {
        CliCommand::Merge {
            name,
            total,
            target,
        } => {
            assert_eq!(name, "a.bin");
            assert_eq!(total, 12);
            assert_eq!(target.local_root.as_deref(), Some(Path::new("/tmp/up")));
        }
        _ => panic!("expected Merge"),
    }
}

#[test]
fn cli_parse_checksum() {
    match parse(&["stitch", "checksum", "/tmp/file"]) {
        CliCommand::Checksum { path } => assert_eq!(path, Path::new("/tmp/file")),
        _ => panic!("expected Checksum"),
    }
}

#[test]
fn cli_global_config_flag() {
    let cli = Cli::try_parse_from(["stitch", "checksum", "f", "--config", "/etc/stitch.toml"])
        .unwrap();
    assert_eq!(cli.config.as_deref(), Some(Path::new("/etc/stitch.toml")));
}
