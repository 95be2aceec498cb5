use crate::{GenerationRequest, JobHandle, JobId, PageRequest, SourceKey};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    LoadVideos { source: SourceKey },
    LoadMoreVideos { source: SourceKey, page: PageRequest },
    InvalidateVideos { source: SourceKey },
    SubmitGeneration(GenerationRequest),
    WatchJob(JobHandle),
    CancelWatch { job_id: JobId },
}
