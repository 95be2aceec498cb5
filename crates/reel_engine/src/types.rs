use std::fmt;
use std::io;
use std::time::Duration;

use reel_core::{CachedCollection, JobHandle, JobId, SourceKey};
use thiserror::Error;

use crate::poller::WatchOutcome;
use crate::store::StoreError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    VideosLoaded {
        source: SourceKey,
        collection: CachedCollection,
    },
    VideosFailed {
        source: SourceKey,
        message: String,
        retained: Option<CachedCollection>,
    },
    GenerationSubmitted(JobHandle),
    GenerationRejected {
        message: String,
    },
    GenerationFinished(WatchOutcome),
}

/// Transport-level failure talking to the backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct BackendError {
    pub kind: FailureKind,
    pub message: String,
}

impl BackendError {
    pub(crate) fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    InvalidRequest,
    HttpStatus(u16),
    Timeout,
    TooLarge { max_bytes: u64, actual: Option<u64> },
    Decode,
    Network,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::InvalidRequest => write!(f, "invalid request"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::TooLarge { max_bytes, actual } => {
                write!(f, "response too large (max {max_bytes}, actual {actual:?})")
            }
            FailureKind::Decode => write!(f, "unexpected response body"),
            FailureKind::Network => write!(f, "network error"),
        }
    }
}

/// The generation request was refused locally or by the backend. Never retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("job submission failed: {0}")]
pub struct SubmissionError(pub BackendError);

/// A status check failed; ends the watch loop.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("job status check failed: {0}")]
pub struct PollTransportError(pub BackendError);

/// No terminal status arrived within the watch timeout.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("job {job_id} did not finish within {elapsed:?}")]
pub struct TimeoutError {
    pub job_id: JobId,
    pub elapsed: Duration,
}

#[derive(Debug, Error)]
pub enum CacheError {
    /// Fetching a page failed. `retained` is the persisted collection, untouched.
    #[error("failed to fetch videos: {error}")]
    Fetch {
        error: BackendError,
        retained: Option<CachedCollection>,
    },
    #[error("video cache storage failed: {0}")]
    Store(#[from] StoreError),
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("failed to start engine runtime: {0}")]
    Runtime(#[from] io::Error),
    #[error(transparent)]
    Backend(#[from] BackendError),
}
