use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::chunking::ChunkSize;
use crate::retry::RetryPolicy;
use crate::sender::{BatchOptions, ResumeMode, TransferMode, TransferOptions};
use crate::store::DEFAULT_MAX_CHUNK_BYTES;
use crate::transport::PayloadEncoding;

/// Retry policy parameters (optional section in config.toml).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of attempts per request (including the first).
    pub max_attempts: u32,
    /// Base delay in seconds for exponential backoff (e.g. 0.5 = 500ms).
    pub base_delay_secs: f64,
    /// Maximum backoff delay in seconds.
    pub max_delay_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        let p = RetryPolicy::default();
        Self {
            max_attempts: p.max_attempts,
            base_delay_secs: p.base_delay.as_secs_f64(),
            max_delay_secs: p.max_delay.as_secs(),
        }
    }
}

impl RetryConfig {
    pub fn to_policy(&self) -> RetryPolicy {
        let default = RetryPolicy::default();
        RetryPolicy {
            max_attempts: self.max_attempts.max(1),
            base_delay: Duration::try_from_secs_f64(self.base_delay_secs)
                .unwrap_or(default.base_delay),
            max_delay: Duration::from_secs(self.max_delay_secs),
        }
    }
}

/// `[sender]`: defaults for `stitch send` / `stitch resume`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SenderConfig {
    /// Base URL of the receiver.
    pub server_url: String,
    pub chunk_size: ChunkSize,
    pub mode: TransferMode,
    pub resume: ResumeMode,
    /// Concurrent chunk uploads in parallel mode.
    pub max_parallel: usize,
    pub encoding: PayloadEncoding,
    /// Files sent concurrently by one `send`/`resume`.
    pub max_files: usize,
}

impl Default for SenderConfig {
    fn default() -> Self {
        Self {
            server_url: "http://127.0.0.1:8750".to_string(),
            chunk_size: ChunkSize::default(),
            mode: TransferMode::default(),
            resume: ResumeMode::default(),
            max_parallel: 4,
            encoding: PayloadEncoding::default(),
            max_files: BatchOptions::default().max_files,
        }
    }
}

/// `[receiver]`: settings for `stitch serve`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReceiverConfig {
    pub listen: SocketAddr,
    /// Upload root; defaults to `~/.local/share/stitch/uploads`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upload_root: Option<PathBuf>,
    /// Largest accepted chunk payload in bytes.
    pub max_chunk_bytes: u64,
}

impl Default for ReceiverConfig {
    fn default() -> Self {
        Self {
            listen: SocketAddr::from(([127, 0, 0, 1], 8750)),
            upload_root: None,
            max_chunk_bytes: DEFAULT_MAX_CHUNK_BYTES,
        }
    }
}

impl ReceiverConfig {
    /// Configured upload root, or the XDG data-dir default.
    pub fn upload_root(&self) -> Result<PathBuf> {
        match &self.upload_root {
            Some(root) => Ok(root.clone()),
            None => {
                let xdg_dirs = xdg::BaseDirectories::with_prefix("stitch")?;
                Ok(xdg_dirs.get_data_home().join("uploads"))
            }
        }
    }
}

/// Global configuration loaded from `~/.config/stitch/config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StitchConfig {
    #[serde(default)]
    pub sender: SenderConfig,
    #[serde(default)]
    pub receiver: ReceiverConfig,
    /// Optional retry policy; if missing, built-in defaults are used.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry: Option<RetryConfig>,
}

impl StitchConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
            .as_ref()
            .map(RetryConfig::to_policy)
            .unwrap_or_default()
    }

    /// Transfer options from the `[sender]` and `[retry]` sections.
    pub fn transfer_options(&self) -> TransferOptions {
        TransferOptions {
            chunk_size: self.sender.chunk_size,
            mode: self.sender.mode,
            resume: self.sender.resume,
            max_parallel: self.sender.max_parallel,
            retry: self.retry_policy(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.sender.max_parallel == 0 {
            bail!("sender.max_parallel must be at least 1");
        }
        if self.sender.max_files == 0 {
            bail!("sender.max_files must be at least 1");
        }
        if self.receiver.max_chunk_bytes == 0 {
            bail!("receiver.max_chunk_bytes must be positive");
        }
        if let Some(retry) = &self.retry {
            if retry.max_attempts == 0 {
                bail!("retry.max_attempts must be at least 1");
            }
            if !retry.base_delay_secs.is_finite() || retry.base_delay_secs < 0.0 {
                bail!("retry.base_delay_secs must be a non-negative number");
            }
        }
        Ok(())
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("stitch")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<StitchConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = StitchConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }
    load_from_path(&path)
}

/// Load and validate an explicit config file.
pub fn load_from_path(path: &Path) -> Result<StitchConfig> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    let cfg: StitchConfig =
        toml::from_str(&data).with_context(|| format!("invalid config {}", path.display()))?;
    cfg.validate()
        .with_context(|| format!("invalid config {}", path.display()))?;
    Ok(cfg)
}
