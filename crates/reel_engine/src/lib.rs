//! Reel engine: backend client, job polling, list caching and effect execution.
mod client;
mod engine;
mod filename;
mod list_cache;
mod persist;
mod poller;
mod profiles;
mod store;
mod types;

pub use client::{BackendSettings, JobBackend, ReqwestBackend, VideoPage, VideoSource};
pub use engine::{EngineConfig, EngineEvents, EngineHandle};
pub use filename::storage_filename;
pub use list_cache::{CacheSettings, Clock, ListCache};
pub use persist::{ensure_dir, AtomicFileWriter, PersistError};
pub use poller::{JobPoller, PollSettings, WatchHandle, WatchOutcome, WatchSink};
pub use profiles::{LinkError, ProfileLinks, PROFILE_LINKS_KEY};
pub use store::{FileStore, KeyValueStore, MemoryStore, StoreError};
pub use types::{
    BackendError, CacheError, EngineError, EngineEvent, FailureKind, PollTransportError,
    SubmissionError, TimeoutError,
};
