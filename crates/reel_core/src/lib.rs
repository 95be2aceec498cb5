//! Reel core: pure wizard state machine, list merging and view-model helpers.
mod catalog;
mod collection;
mod effect;
mod job;
mod link;
mod merge;
mod msg;
mod state;
mod update;
mod video;
mod view_model;

pub use catalog::{usable_avatars, usable_voices, Avatar, Voice, VoiceFilter};
pub use collection::{visible_slice, CachedCollection, PageRequest};
pub use effect::Effect;
pub use job::{GenerationOutcome, GenerationRequest, JobHandle, JobId, JobStatus};
pub use link::{normalize_profile_link, Platform, ProfileLink, SourceKey, VideoMode, VideoRef};
pub use merge::{merge_ranked, sort_by_rank, Ranked};
pub use msg::Msg;
pub use state::{AppState, GenerationStatus};
pub use update::update;
pub use video::{format_count, VideoRecord};
pub use view_model::{AppViewModel, VideoRowView, ITEMS_PER_LOAD};
