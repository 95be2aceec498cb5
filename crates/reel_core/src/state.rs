use crate::view_model::{AppViewModel, VideoRowView, ITEMS_PER_LOAD};
use crate::{
    format_count, visible_slice, JobId, PageRequest, ProfileLink, SourceKey, VideoMode,
    VideoRecord, VideoRef,
};

/// Where the avatar-video generation currently stands.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum GenerationStatus {
    #[default]
    Idle,
    Submitting,
    Waiting { job_id: JobId },
    Ready { video_url: String },
    Failed { message: String },
    Rejected { message: String },
    TransportError { message: String },
    TimedOut,
}

impl GenerationStatus {
    pub fn is_in_flight(&self) -> bool {
        matches!(
            self,
            GenerationStatus::Submitting | GenerationStatus::Waiting { .. }
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
struct VideoListState {
    profile: Option<ProfileLink>,
    mode: VideoMode,
    items: Vec<VideoRecord>,
    /// Requested reveal count; only grows until the list is reset.
    revealed: usize,
    next_page: Option<PageRequest>,
    loading: bool,
    last_error: Option<String>,
    selected: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppState {
    videos: VideoListState,
    generation: GenerationStatus,
    dirty: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn view(&self) -> AppViewModel {
        let list = &self.videos;
        let visible = visible_slice(&list.items, list.revealed);
        let platform = list.profile.as_ref().map(ProfileLink::platform);
        let rows = visible
            .iter()
            .enumerate()
            .map(|(index, record)| VideoRowView {
                index,
                title: record.title.clone(),
                views: format_count(record.views),
                likes: format_count(record.likes),
                duration: record.duration_label(),
                thumbnail: record.thumbnail.clone(),
                watch_url: platform
                    .and_then(|platform| VideoRef::for_record(platform, record))
                    .map(|video| video.watch_url()),
            })
            .collect();

        AppViewModel {
            profile: list.profile.as_ref().map(|link| link.url().to_string()),
            mode: list.mode,
            rows,
            total_loaded: list.items.len(),
            can_show_more: !list.loading
                && (visible.len() < list.items.len() || list.next_page.is_some()),
            loading: list.loading,
            last_error: list.last_error.clone(),
            selected: self.selected_video(),
            generation: self.generation.clone(),
        }
    }

    /// Returns whether anything changed since the last call, and resets the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub fn current_source(&self) -> Option<SourceKey> {
        self.videos
            .profile
            .clone()
            .map(|profile| SourceKey::new(profile, self.videos.mode))
    }

    pub fn selected_video(&self) -> Option<VideoRef> {
        let list = &self.videos;
        let index = list.selected?;
        let platform = list.profile.as_ref()?.platform();
        VideoRef::for_record(platform, list.items.get(index)?)
    }

    pub fn generation(&self) -> &GenerationStatus {
        &self.generation
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn mode(&self) -> VideoMode {
        self.videos.mode
    }

    pub(crate) fn set_invalid_profile(&mut self, raw: &str) {
        self.videos.last_error = Some(format!("invalid profile link: {raw}"));
        self.mark_dirty();
    }

    /// Resets the list for a new source and marks it loading.
    pub(crate) fn open_source(&mut self, profile: ProfileLink, mode: VideoMode) -> SourceKey {
        self.videos = VideoListState {
            profile: Some(profile.clone()),
            mode,
            loading: true,
            ..VideoListState::default()
        };
        self.mark_dirty();
        SourceKey::new(profile, mode)
    }

    pub(crate) fn set_mode_without_source(&mut self, mode: VideoMode) {
        self.videos.mode = mode;
        self.mark_dirty();
    }

    pub(crate) fn apply_loaded(&mut self, items: Vec<VideoRecord>, next_page: Option<PageRequest>) {
        let list = &mut self.videos;
        list.items = items;
        list.next_page = next_page;
        list.loading = false;
        list.last_error = None;
        list.revealed = list.revealed.max(ITEMS_PER_LOAD);
        self.mark_dirty();
    }

    pub(crate) fn apply_failed(&mut self, message: String, retained: Option<Vec<VideoRecord>>) {
        let list = &mut self.videos;
        list.loading = false;
        list.last_error = Some(message);
        if let Some(items) = retained {
            if list.items.is_empty() {
                list.items = items;
                list.revealed = list.revealed.max(ITEMS_PER_LOAD);
            }
        }
        self.mark_dirty();
    }

    /// Grows the reveal. Returns the page to fetch when the loaded items are
    /// exhausted and the source has more.
    pub(crate) fn show_more(&mut self) -> Option<(SourceKey, PageRequest)> {
        if self.videos.loading {
            return None;
        }
        let source = self.current_source()?;
        let list = &mut self.videos;
        let visible = list.revealed.min(list.items.len());
        if visible < list.items.len() {
            list.revealed = (visible + ITEMS_PER_LOAD).min(list.items.len());
            self.mark_dirty();
            return None;
        }
        let page = list.next_page.clone()?;
        list.loading = true;
        list.revealed = visible + ITEMS_PER_LOAD;
        self.mark_dirty();
        Some((source, page))
    }

    pub(crate) fn select(&mut self, index: usize) {
        let list = &mut self.videos;
        if index < list.revealed.min(list.items.len()) {
            list.selected = Some(index);
            self.mark_dirty();
        }
    }

    pub(crate) fn set_generation(&mut self, status: GenerationStatus) {
        self.generation = status;
        self.mark_dirty();
    }
}
