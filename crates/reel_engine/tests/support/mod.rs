#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use reel_core::{
    GenerationRequest, JobHandle, JobId, JobStatus, PageRequest, ProfileLink, SourceKey,
    VideoMode, VideoRecord,
};
use reel_engine::{BackendError, FailureKind, JobBackend, VideoPage, VideoSource, WatchOutcome, WatchSink};

pub fn init_logging() {
    reel_logging::initialize_for_tests();
}

pub fn video(id: &str, views: u64, likes: u64) -> VideoRecord {
    VideoRecord::new(id, views, likes)
}

pub fn channel(mode: VideoMode) -> SourceKey {
    SourceKey::new(
        ProfileLink::parse("https://www.youtube.com/@creator").unwrap(),
        mode,
    )
}

pub fn network_error() -> BackendError {
    BackendError {
        kind: FailureKind::Network,
        message: "connection reset".to_string(),
    }
}

/// Job backend answering status checks from a script; an exhausted script
/// keeps answering `pending`.
#[derive(Default)]
pub struct ScriptedJobs {
    submit_result: Mutex<Option<Result<JobId, BackendError>>>,
    statuses: Mutex<VecDeque<Result<(JobStatus, Option<String>, Option<String>), BackendError>>>,
    status_delay: Option<Duration>,
    submits: AtomicUsize,
    polls: AtomicUsize,
}

impl ScriptedJobs {
    pub fn new(
        statuses: Vec<Result<(JobStatus, Option<String>, Option<String>), BackendError>>,
    ) -> Self {
        Self {
            statuses: Mutex::new(statuses.into()),
            ..Self::default()
        }
    }

    pub fn with_submit(self, result: Result<JobId, BackendError>) -> Self {
        *self.submit_result.lock().unwrap() = Some(result);
        self
    }

    pub fn with_status_delay(mut self, delay: Duration) -> Self {
        self.status_delay = Some(delay);
        self
    }

    pub fn submits(&self) -> usize {
        self.submits.load(Ordering::SeqCst)
    }

    pub fn polls(&self) -> usize {
        self.polls.load(Ordering::SeqCst)
    }
}

pub fn pending() -> Result<(JobStatus, Option<String>, Option<String>), BackendError> {
    Ok((JobStatus::Pending, None, None))
}

pub fn completed(url: &str) -> Result<(JobStatus, Option<String>, Option<String>), BackendError> {
    Ok((JobStatus::Completed, Some(url.to_string()), None))
}

pub fn failed(message: &str) -> Result<(JobStatus, Option<String>, Option<String>), BackendError> {
    Ok((JobStatus::Failed, None, Some(message.to_string())))
}

#[async_trait::async_trait]
impl JobBackend for ScriptedJobs {
    async fn submit(&self, _request: &GenerationRequest) -> Result<JobId, BackendError> {
        self.submits.fetch_add(1, Ordering::SeqCst);
        self.submit_result
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(|| Ok("job-1".to_string()))
    }

    async fn status(&self, job_id: &str) -> Result<JobHandle, BackendError> {
        self.polls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.status_delay {
            tokio::time::sleep(delay).await;
        }
        let next = self.statuses.lock().unwrap().pop_front().unwrap_or_else(pending);
        let (status, result, error) = next?;
        Ok(JobHandle::from_parts(job_id, status, result, error))
    }
}

/// Video source answering from a queue of pages; an exhausted queue yields empty pages.
#[derive(Default)]
pub struct FakeSource {
    pages: Mutex<VecDeque<Result<VideoPage, BackendError>>>,
    requests: Mutex<Vec<PageRequest>>,
    delay: Option<Duration>,
}

impl FakeSource {
    pub fn new(pages: Vec<Result<VideoPage, BackendError>>) -> Self {
        Self {
            pages: Mutex::new(pages.into()),
            ..Self::default()
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<PageRequest> {
        self.requests.lock().unwrap().clone()
    }
}

pub fn page(items: Vec<VideoRecord>) -> Result<VideoPage, BackendError> {
    Ok(VideoPage {
        items,
        next_page: None,
    })
}

#[async_trait::async_trait]
impl VideoSource for FakeSource {
    async fn fetch_page(
        &self,
        _source: &SourceKey,
        page: &PageRequest,
    ) -> Result<VideoPage, BackendError> {
        self.requests.lock().unwrap().push(page.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.pages.lock().unwrap().pop_front().unwrap_or_else(|| {
            Ok(VideoPage {
                items: Vec::new(),
                next_page: None,
            })
        })
    }
}

#[derive(Default)]
pub struct RecordingSink {
    outcomes: Mutex<Vec<WatchOutcome>>,
}

impl RecordingSink {
    pub fn outcomes(&self) -> Vec<WatchOutcome> {
        self.outcomes.lock().unwrap().clone()
    }
}

impl WatchSink for RecordingSink {
    fn emit(&self, outcome: WatchOutcome) {
        self.outcomes.lock().unwrap().push(outcome);
    }
}

pub fn shared<T>(value: T) -> Arc<T> {
    Arc::new(value)
}
