use std::sync::Arc;
use std::time::Duration;

use reel_core::{GenerationOutcome, GenerationRequest, JobHandle, JobId, JobStatus};
use reel_logging::{reel_debug, reel_info, reel_warn};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::client::JobBackend;
use crate::types::TimeoutError;
use crate::{BackendError, FailureKind, PollTransportError, SubmissionError};

#[derive(Debug, Clone)]
pub struct PollSettings {
    /// Pause before every status check.
    pub interval: Duration,
    /// Overall budget for one watch, counted from its start.
    pub timeout: Duration,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(5_000),
            timeout: Duration::from_millis(600_000),
        }
    }
}

/// How a watch loop ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchOutcome {
    /// The job reached `completed` or `failed`.
    Finished(JobHandle),
    /// A status check failed. Not retried.
    TransportFailed {
        job_id: JobId,
        error: PollTransportError,
    },
    TimedOut(TimeoutError),
    Cancelled,
}

impl WatchOutcome {
    /// Presentation-level outcome; `None` for cancelled watches.
    pub fn into_generation_outcome(self) -> Option<GenerationOutcome> {
        match self {
            WatchOutcome::Finished(handle) => match handle.status {
                JobStatus::Completed => Some(GenerationOutcome::Ready {
                    job_id: handle.id,
                    video_url: handle.result.unwrap_or_default(),
                }),
                JobStatus::Failed => Some(GenerationOutcome::Failed {
                    job_id: handle.id,
                    message: handle
                        .error_message
                        .unwrap_or_else(|| "unknown error".to_string()),
                }),
                JobStatus::Pending => None,
            },
            WatchOutcome::TransportFailed { job_id, error } => {
                Some(GenerationOutcome::TransportError {
                    job_id,
                    message: error.to_string(),
                })
            }
            WatchOutcome::TimedOut(timeout) => Some(GenerationOutcome::TimedOut {
                job_id: timeout.job_id,
            }),
            WatchOutcome::Cancelled => None,
        }
    }
}

/// Receives the single outcome of a spawned watch.
pub trait WatchSink: Send + Sync {
    fn emit(&self, outcome: WatchOutcome);
}

/// Cancels a spawned watch. Dropping the handle leaves the watch running.
#[derive(Debug)]
pub struct WatchHandle {
    job_id: JobId,
    token: CancellationToken,
    task: JoinHandle<()>,
}

impl WatchHandle {
    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    /// Stops the poll loop and the timeout timer; no outcome is emitted afterwards.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

/// Submits avatar-video generation jobs and watches them until they end.
pub struct JobPoller {
    backend: Arc<dyn JobBackend>,
    settings: PollSettings,
}

impl JobPoller {
    pub fn new(backend: Arc<dyn JobBackend>, settings: PollSettings) -> Self {
        Self { backend, settings }
    }

    pub fn settings(&self) -> &PollSettings {
        &self.settings
    }

    /// Calls the generation endpoint once. Malformed requests never reach it.
    pub async fn submit(&self, request: &GenerationRequest) -> Result<JobHandle, SubmissionError> {
        if let Some(field) = request.missing_field() {
            return Err(SubmissionError(BackendError::new(
                FailureKind::InvalidRequest,
                format!("{field} must not be empty"),
            )));
        }
        let job_id = self.backend.submit(request).await.map_err(|err| {
            reel_warn!("Generation request was not accepted: {}", err);
            SubmissionError(err)
        })?;
        reel_info!("Generation job {} submitted", job_id);
        Ok(JobHandle::pending(job_id))
    }

    pub async fn poll(&self, handle: &JobHandle) -> Result<JobHandle, PollTransportError> {
        self.backend
            .status(&handle.id)
            .await
            .map_err(PollTransportError)
    }

    /// Polls `handle` every interval until it is terminal, a poll fails, the
    /// timeout elapses, or `cancel` fires.
    ///
    /// Polls never overlap: the next wait starts after the previous response.
    /// The timeout races both the waits and the in-flight poll.
    pub async fn watch(&self, handle: JobHandle, cancel: &CancellationToken) -> WatchOutcome {
        let started = Instant::now();
        let deadline = tokio::time::sleep(self.settings.timeout);
        tokio::pin!(deadline);

        let mut current = handle;
        let mut polls = 0u32;
        loop {
            if current.is_terminal() {
                reel_info!(
                    "Job {} ended as {} after {} polls",
                    current.id,
                    current.status,
                    polls
                );
                return WatchOutcome::Finished(current);
            }

            tokio::select! {
                biased;
                _ = cancel.cancelled() => return WatchOutcome::Cancelled,
                _ = &mut deadline => return timed_out(&current, started),
                _ = tokio::time::sleep(self.settings.interval) => {}
            }

            let polled = tokio::select! {
                biased;
                _ = cancel.cancelled() => return WatchOutcome::Cancelled,
                _ = &mut deadline => return timed_out(&current, started),
                polled = self.poll(&current) => polled,
            };
            polls += 1;

            match polled {
                Ok(next) => {
                    reel_debug!("Job {} poll #{}: {}", next.id, polls, next.status);
                    current = next;
                }
                Err(error) => {
                    reel_warn!("Job {} poll #{} failed: {}", current.id, polls, error);
                    return WatchOutcome::TransportFailed {
                        job_id: current.id,
                        error,
                    };
                }
            }
        }
    }

    /// Runs [`JobPoller::watch`] on the current tokio runtime and hands the
    /// outcome to `sink` exactly once, unless the watch is cancelled first.
    pub fn spawn_watch(self: &Arc<Self>, handle: JobHandle, sink: Arc<dyn WatchSink>) -> WatchHandle {
        let token = CancellationToken::new();
        let job_id = handle.id.clone();
        let poller = Arc::clone(self);
        let task_token = token.clone();
        let task = tokio::spawn(async move {
            let outcome = poller.watch(handle, &task_token).await;
            if task_token.is_cancelled() || outcome == WatchOutcome::Cancelled {
                reel_debug!("Watch cancelled; dropping outcome");
                return;
            }
            sink.emit(outcome);
        });
        WatchHandle {
            job_id,
            token,
            task,
        }
    }
}

fn timed_out(handle: &JobHandle, started: Instant) -> WatchOutcome {
    let elapsed = started.elapsed();
    reel_warn!("Job {} timed out after {:?}", handle.id, elapsed);
    WatchOutcome::TimedOut(TimeoutError {
        job_id: handle.id.clone(),
        elapsed,
    })
}
