use crate::{GenerationOutcome, GenerationRequest, JobHandle, PageRequest, SourceKey, VideoMode, VideoRecord};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// User opened a profile link on the video step.
    ProfileOpened { link: String, mode: VideoMode },
    /// User toggled the "short videos" checkbox.
    ShortsToggled(bool),
    /// The list cache produced a collection for `source`.
    VideosLoaded {
        source: SourceKey,
        items: Vec<VideoRecord>,
        next_page: Option<PageRequest>,
    },
    /// Fetching a page failed; `retained` is the still-valid cached list, if any.
    VideosFailed {
        source: SourceKey,
        message: String,
        retained: Option<Vec<VideoRecord>>,
    },
    /// User clicked "Load more".
    ShowMoreClicked,
    /// User picked a row of the visible list.
    VideoSelected(usize),
    /// User asked for an avatar video.
    GenerateClicked(GenerationRequest),
    /// The backend accepted the generation request.
    GenerationSubmitted(JobHandle),
    /// The backend (or local validation) refused the generation request.
    GenerationRejected(String),
    /// The watched job reached an end state.
    GenerationFinished(GenerationOutcome),
    /// User abandoned the running generation.
    CancelGenerationClicked,
}
