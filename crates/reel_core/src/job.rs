use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Opaque identifier the backend assigns to a generation job.
pub type JobId = String;

/// Wire values are exactly `pending`, `completed` and `failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(JobStatus::Pending),
            "completed" => Ok(JobStatus::Completed),
            "failed" => Ok(JobStatus::Failed),
            other => Err(format!("unknown job status `{other}`")),
        }
    }
}

/// Client-side view of a remote generation job.
///
/// `result` is only ever set for completed jobs and `error_message` only for
/// failed ones; [`JobHandle::from_parts`] enforces that.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JobHandle {
    pub id: JobId,
    pub status: JobStatus,
    pub result: Option<String>,
    pub error_message: Option<String>,
}

impl JobHandle {
    pub fn pending(id: impl Into<JobId>) -> Self {
        Self {
            id: id.into(),
            status: JobStatus::Pending,
            result: None,
            error_message: None,
        }
    }

    pub fn from_parts(
        id: impl Into<JobId>,
        status: JobStatus,
        result: Option<String>,
        error_message: Option<String>,
    ) -> Self {
        Self {
            id: id.into(),
            status,
            result: result.filter(|_| status == JobStatus::Completed),
            error_message: error_message.filter(|_| status == JobStatus::Failed),
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

/// Everything the backend needs to render an avatar video.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub text: String,
    pub avatar_id: String,
    pub voice_id: String,
}

impl GenerationRequest {
    pub fn new(
        text: impl Into<String>,
        avatar_id: impl Into<String>,
        voice_id: impl Into<String>,
    ) -> Self {
        Self {
            text: text.into(),
            avatar_id: avatar_id.into(),
            voice_id: voice_id.into(),
        }
    }

    /// Name of the first blank field, if any.
    pub fn missing_field(&self) -> Option<&'static str> {
        if self.text.trim().is_empty() {
            Some("text")
        } else if self.avatar_id.trim().is_empty() {
            Some("avatar_id")
        } else if self.voice_id.trim().is_empty() {
            Some("voice_id")
        } else {
            None
        }
    }
}

/// How a watched generation job ended, as seen by the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationOutcome {
    Ready { job_id: JobId, video_url: String },
    Failed { job_id: JobId, message: String },
    TransportError { job_id: JobId, message: String },
    TimedOut { job_id: JobId },
}

impl GenerationOutcome {
    pub fn job_id(&self) -> &str {
        match self {
            GenerationOutcome::Ready { job_id, .. }
            | GenerationOutcome::Failed { job_id, .. }
            | GenerationOutcome::TransportError { job_id, .. }
            | GenerationOutcome::TimedOut { job_id } => job_id,
        }
    }
}
