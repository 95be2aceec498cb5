use crate::{GenerationStatus, VideoMode, VideoRef};

/// Rows revealed per "Load more" click.
pub const ITEMS_PER_LOAD: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppViewModel {
    pub profile: Option<String>,
    pub mode: VideoMode,
    pub rows: Vec<VideoRowView>,
    pub total_loaded: usize,
    pub can_show_more: bool,
    pub loading: bool,
    pub last_error: Option<String>,
    pub selected: Option<VideoRef>,
    pub generation: GenerationStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoRowView {
    pub index: usize,
    pub title: String,
    pub views: String,
    pub likes: String,
    pub duration: String,
    pub thumbnail: Option<String>,
    pub watch_url: Option<String>,
}
