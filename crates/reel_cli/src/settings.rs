use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use log::LevelFilter;
use reel_engine::{BackendSettings, CacheSettings, PollSettings};
use reel_logging::LogDestination;
use serde::Deserialize;

pub const DEFAULT_CONFIG_FILE: &str = "reel.ron";
pub const DEFAULT_DATA_DIR: &str = ".reel";

const SECONDS_PER_DAY: u64 = 24 * 60 * 60;

/// User settings, read from a RON file. Missing fields keep their defaults.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: String,
    pub data_dir: PathBuf,
    /// `terminal`, `file`, `both` or `off`.
    pub log: String,
    pub log_level: String,
    pub request_timeout_secs: u64,
    pub max_response_bytes: u64,
    pub poll_interval_ms: u64,
    pub poll_timeout_ms: u64,
    pub freshness_days: u64,
    pub page_size: usize,
}

impl Default for Settings {
    fn default() -> Self {
        let backend = BackendSettings::default();
        let poll = PollSettings::default();
        let cache = CacheSettings::default();
        Self {
            server: backend.base_url,
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            log: "terminal".to_string(),
            log_level: "info".to_string(),
            request_timeout_secs: backend.request_timeout.as_secs(),
            max_response_bytes: backend.max_bytes,
            poll_interval_ms: poll.interval.as_millis() as u64,
            poll_timeout_ms: poll.timeout.as_millis() as u64,
            freshness_days: cache.freshness_window.as_secs() / (24 * 60 * 60),
            page_size: cache.page_size,
        }
    }
}

/// Command-line values that win over the settings file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub server: Option<String>,
    pub data_dir: Option<PathBuf>,
    pub log: Option<String>,
}

impl Settings {
    /// Reads `path`, or `reel.ron` in the working directory when no path is
    /// given. Only an explicitly named file has to exist.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (path, explicit) = match path {
            Some(path) => (path.to_path_buf(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
        };
        match fs::read_to_string(&path) {
            Ok(text) => {
                Self::parse(&text).with_context(|| format!("invalid settings in {}", path.display()))
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound && !explicit => Ok(Self::default()),
            Err(err) => Err(err).with_context(|| format!("cannot read {}", path.display())),
        }
    }

    pub fn parse(text: &str) -> Result<Self> {
        Ok(ron::from_str(text)?)
    }

    pub fn with_overrides(mut self, overrides: Overrides) -> Self {
        if let Some(server) = overrides.server {
            self.server = server;
        }
        if let Some(data_dir) = overrides.data_dir {
            self.data_dir = data_dir;
        }
        if let Some(log) = overrides.log {
            self.log = log;
        }
        self
    }

    pub fn log_destination(&self) -> Result<LogDestination> {
        self.log.parse().map_err(|err: String| anyhow!(err))
    }

    pub fn log_level(&self) -> Result<LevelFilter> {
        self.log_level
            .parse()
            .with_context(|| format!("unknown log level '{}'", self.log_level))
    }

    pub fn log_file(&self) -> PathBuf {
        self.data_dir.join(reel_logging::DEFAULT_LOG_FILE)
    }

    pub fn backend(&self) -> BackendSettings {
        BackendSettings {
            base_url: self.server.clone(),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            max_bytes: self.max_response_bytes,
            ..BackendSettings::default()
        }
    }

    pub fn poll(&self) -> PollSettings {
        PollSettings {
            interval: Duration::from_millis(self.poll_interval_ms),
            timeout: Duration::from_millis(self.poll_timeout_ms),
        }
    }

    pub fn cache(&self) -> Result<CacheSettings> {
        let freshness_secs = self
            .freshness_days
            .checked_mul(SECONDS_PER_DAY)
            .ok_or_else(|| anyhow!("freshness_days {} is too large", self.freshness_days))?;
        Ok(CacheSettings {
            freshness_window: Duration::from_secs(freshness_secs),
            page_size: self.page_size,
        })
    }
}
