use std::time::Duration;

use futures_util::StreamExt;
use reel_core::{
    usable_avatars, usable_voices, Avatar, GenerationRequest, JobHandle, JobId, JobStatus,
    PageRequest, Platform, SourceKey, VideoRecord, VideoRef, Voice,
};
use reel_logging::reel_debug;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

use crate::{BackendError, FailureKind};

const JSON: &str = "application/json";

#[derive(Debug, Clone)]
pub struct BackendSettings {
    pub base_url: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub max_bytes: u64,
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            connect_timeout: Duration::from_secs(10),
            // Transcription and text generation can take minutes server-side.
            request_timeout: Duration::from_secs(600),
            max_bytes: 16 * 1024 * 1024,
        }
    }
}

/// One page of a remote video listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoPage {
    pub items: Vec<VideoRecord>,
    pub next_page: Option<PageRequest>,
}

#[async_trait::async_trait]
pub trait VideoSource: Send + Sync {
    async fn fetch_page(
        &self,
        source: &SourceKey,
        page: &PageRequest,
    ) -> Result<VideoPage, BackendError>;
}

#[async_trait::async_trait]
pub trait JobBackend: Send + Sync {
    /// Starts a generation job and returns its id.
    async fn submit(&self, request: &GenerationRequest) -> Result<JobId, BackendError>;
    /// Current state of job `job_id`.
    async fn status(&self, job_id: &str) -> Result<JobHandle, BackendError>;
}

#[derive(Debug, Deserialize)]
struct VideoPageBody {
    #[serde(default)]
    videos: Vec<VideoRecord>,
    #[serde(default)]
    next_offset: Option<usize>,
    #[serde(default)]
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SubmitBody {
    task_id: Value,
}

#[derive(Debug, Deserialize)]
struct TaskStatusBody {
    status: JobStatus,
    #[serde(default)]
    video_url: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Serialize)]
struct GenerateTextBody<'a> {
    transcription: &'a str,
}

/// HTTP client for the wizard backend.
#[derive(Debug, Clone)]
pub struct ReqwestBackend {
    settings: BackendSettings,
    client: reqwest::Client,
}

impl ReqwestBackend {
    pub fn new(settings: BackendSettings) -> Result<Self, BackendError> {
        Url::parse(&settings.base_url)
            .map_err(|err| BackendError::new(FailureKind::InvalidUrl, err.to_string()))?;
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| BackendError::new(FailureKind::Network, err.to_string()))?;
        Ok(Self { settings, client })
    }

    pub fn settings(&self) -> &BackendSettings {
        &self.settings
    }

    /// Transcript of a single video.
    pub async fn transcript(&self, video: &VideoRef) -> Result<String, BackendError> {
        let url = match video {
            VideoRef::YouTube { video_id } => {
                self.endpoint("/transcript_video", &[("video_id", video_id.as_str())])?
            }
            VideoRef::Instagram { url } => self.endpoint("/insta_transcript", &[("url", url.as_str())])?,
        };
        let body = self.get_bytes(url).await?;
        // The backend answers with a JSON string, older deployments with plain text.
        match serde_json::from_slice::<String>(&body) {
            Ok(text) => Ok(text),
            Err(_) => Ok(String::from_utf8_lossy(&body).into_owned()),
        }
    }

    /// Alternative scripts written from a transcript.
    pub async fn generate_scenarios(&self, transcription: &str) -> Result<Vec<String>, BackendError> {
        let url = self.endpoint("/generate_text", &[])?;
        self.post_json(url, &GenerateTextBody { transcription }).await
    }

    /// Avatars the backend can render, without entries of unknown gender.
    pub async fn avatars(&self) -> Result<Vec<Avatar>, BackendError> {
        let url = self.endpoint("/avatar_list", &[])?;
        let avatars: Vec<Avatar> = self.get_json(url).await?;
        Ok(usable_avatars(avatars))
    }

    /// Voices with a known language and gender.
    pub async fn voices(&self) -> Result<Vec<Voice>, BackendError> {
        let url = self.endpoint("/voice_list", &[])?;
        let voices: Vec<Voice> = self.get_json(url).await?;
        Ok(usable_voices(voices))
    }

    fn endpoint(&self, path: &str, query: &[(&str, &str)]) -> Result<Url, BackendError> {
        let raw = format!("{}{}", self.settings.base_url.trim_end_matches('/'), path);
        let mut url = Url::parse(&raw)
            .map_err(|err| BackendError::new(FailureKind::InvalidUrl, err.to_string()))?;
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (name, value) in query {
                pairs.append_pair(name, value);
            }
        }
        Ok(url)
    }

    fn listing_endpoint(&self, source: &SourceKey, page: &PageRequest) -> Result<Url, BackendError> {
        let shorts = source.mode.is_shorts();
        let mut url = match source.profile.platform() {
            Platform::YouTube => {
                let path = if shorts { "/short_videos" } else { "/videos" };
                self.endpoint(path, &[("profile_url", source.profile.url())])?
            }
            Platform::Instagram => {
                let username = source.profile.instagram_username().ok_or_else(|| {
                    BackendError::new(
                        FailureKind::InvalidUrl,
                        format!("no instagram username in {}", source.profile.url()),
                    )
                })?;
                let path = if shorts {
                    "/insta_short_videos"
                } else {
                    "/insta_videos"
                };
                self.endpoint(path, &[("username", username.as_str())])?
            }
        };
        {
            let mut pairs = url.query_pairs_mut();
            match page {
                PageRequest::Offset { offset, limit } => {
                    pairs.append_pair("offset", &offset.to_string());
                    pairs.append_pair("limit", &limit.to_string());
                }
                PageRequest::Cursor { token, limit } => {
                    pairs.append_pair("cursor", token);
                    pairs.append_pair("limit", &limit.to_string());
                }
            }
        }
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, BackendError> {
        let body = self.get_bytes(url).await?;
        decode(&body)
    }

    async fn get_bytes(&self, url: Url) -> Result<Vec<u8>, BackendError> {
        reel_debug!("GET {}", url);
        let response = self
            .client
            .get(url)
            .header(ACCEPT, JSON)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        self.read_body(response).await
    }

    async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        url: Url,
        body: &B,
    ) -> Result<T, BackendError> {
        let payload = serde_json::to_vec(body)
            .map_err(|err| BackendError::new(FailureKind::InvalidRequest, err.to_string()))?;
        reel_debug!("POST {} ({} bytes)", url, payload.len());
        let response = self
            .client
            .post(url)
            .header(CONTENT_TYPE, JSON)
            .header(ACCEPT, JSON)
            .body(payload)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let body = self.read_body(response).await?;
        decode(&body)
    }

    async fn read_body(&self, response: reqwest::Response) -> Result<Vec<u8>, BackendError> {
        let status = response.status();
        if !status.is_success() {
            return Err(BackendError::new(
                FailureKind::HttpStatus(status.as_u16()),
                status.to_string(),
            ));
        }

        let max_bytes = self.settings.max_bytes;
        if let Some(content_len) = response.content_length() {
            if content_len > max_bytes {
                return Err(BackendError::new(
                    FailureKind::TooLarge {
                        max_bytes,
                        actual: Some(content_len),
                    },
                    "response too large",
                ));
            }
        }

        let mut bytes = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_reqwest_error)?;
            let next_len = bytes.len() as u64 + chunk.len() as u64;
            if next_len > max_bytes {
                return Err(BackendError::new(
                    FailureKind::TooLarge {
                        max_bytes,
                        actual: Some(next_len),
                    },
                    "response too large",
                ));
            }
            bytes.extend_from_slice(&chunk);
        }
        Ok(bytes)
    }
}

#[async_trait::async_trait]
impl VideoSource for ReqwestBackend {
    async fn fetch_page(
        &self,
        source: &SourceKey,
        page: &PageRequest,
    ) -> Result<VideoPage, BackendError> {
        let url = self.listing_endpoint(source, page)?;
        let body: VideoPageBody = self.get_json(url).await?;
        let next_page = match (body.next_page_token, body.next_offset) {
            (Some(token), _) => Some(PageRequest::Cursor {
                token,
                limit: page.limit(),
            }),
            (None, Some(offset)) => Some(PageRequest::Offset {
                offset,
                limit: page.limit(),
            }),
            (None, None) => None,
        };
        Ok(VideoPage {
            items: body.videos,
            next_page,
        })
    }
}

#[async_trait::async_trait]
impl JobBackend for ReqwestBackend {
    async fn submit(&self, request: &GenerationRequest) -> Result<JobId, BackendError> {
        let url = self.endpoint("/generate_video", &[])?;
        let body: SubmitBody = self.post_json(url, request).await?;
        match body.task_id {
            Value::String(id) if !id.is_empty() => Ok(id),
            Value::Number(id) => Ok(id.to_string()),
            other => Err(BackendError::new(
                FailureKind::Decode,
                format!("unusable task id {other}"),
            )),
        }
    }

    async fn status(&self, job_id: &str) -> Result<JobHandle, BackendError> {
        let mut url = self.endpoint("/task_status", &[])?;
        url.path_segments_mut()
            .map_err(|_| BackendError::new(FailureKind::InvalidUrl, "base url cannot have paths"))?
            .push(job_id);
        let body: TaskStatusBody = self.get_json(url).await?;
        Ok(JobHandle::from_parts(
            job_id,
            body.status,
            body.video_url,
            body.error,
        ))
    }
}

fn decode<T: DeserializeOwned>(body: &[u8]) -> Result<T, BackendError> {
    serde_json::from_slice(body).map_err(|err| BackendError::new(FailureKind::Decode, err.to_string()))
}

fn map_reqwest_error(err: reqwest::Error) -> BackendError {
    if err.is_timeout() {
        return BackendError::new(FailureKind::Timeout, err.to_string());
    }
    BackendError::new(FailureKind::Network, err.to_string())
}
