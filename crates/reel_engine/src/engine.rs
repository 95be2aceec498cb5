use std::collections::HashMap;
use std::sync::mpsc::{self, RecvTimeoutError, TryRecvError};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::Duration;

use reel_core::{GenerationRequest, JobHandle, JobId, PageRequest, SourceKey};
use reel_logging::{reel_debug, reel_info};

use crate::client::{BackendSettings, JobBackend, ReqwestBackend, VideoSource};
use crate::list_cache::{CacheSettings, Clock, ListCache};
use crate::poller::{JobPoller, PollSettings, WatchHandle, WatchOutcome, WatchSink};
use crate::store::KeyValueStore;
use crate::{CacheError, EngineError, EngineEvent};

pub struct EngineConfig {
    pub backend: BackendSettings,
    pub poll: PollSettings,
    pub cache: CacheSettings,
    pub store: Arc<dyn KeyValueStore>,
    pub clock: Option<Clock>,
}

impl EngineConfig {
    pub fn with_store(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            backend: BackendSettings::default(),
            poll: PollSettings::default(),
            cache: CacheSettings::default(),
            store,
            clock: None,
        }
    }
}

enum EngineCommand {
    LoadVideos { source: SourceKey },
    LoadMoreVideos { source: SourceKey, page: PageRequest },
    InvalidateVideos { source: SourceKey },
    SubmitGeneration(GenerationRequest),
    WatchJob(JobHandle),
    CancelWatch { job_id: JobId },
}

/// Non-blocking bridge between a synchronous presentation loop and the async
/// engine. Commands go in through the methods below; results come back as
/// [`EngineEvent`]s via [`EngineHandle::try_recv`] or an [`EngineEvents`].
///
/// The engine runs until the last handle is dropped. It then cancels every
/// running watch and closes the event channel.
#[derive(Clone)]
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    events: EngineEvents,
}

/// Receiving end of the engine's events. Holding one does not keep the
/// engine alive; once the engine stops, receives report `Disconnected`.
#[derive(Clone)]
pub struct EngineEvents {
    event_rx: Arc<Mutex<mpsc::Receiver<EngineEvent>>>,
}

impl EngineEvents {
    pub fn try_recv(&self) -> Result<EngineEvent, TryRecvError> {
        let rx = self.event_rx.lock().unwrap_or_else(PoisonError::into_inner);
        rx.try_recv()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Result<EngineEvent, RecvTimeoutError> {
        let rx = self.event_rx.lock().unwrap_or_else(PoisonError::into_inner);
        rx.recv_timeout(timeout)
    }
}

struct Services {
    cache: ListCache,
    poller: Arc<JobPoller>,
}

struct ChannelWatchSink {
    tx: mpsc::Sender<EngineEvent>,
}

impl WatchSink for ChannelWatchSink {
    fn emit(&self, outcome: WatchOutcome) {
        let _ = self.tx.send(EngineEvent::GenerationFinished(outcome));
    }
}

impl EngineHandle {
    /// Starts an engine that talks to the HTTP backend described by `config`.
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        let backend = Arc::new(ReqwestBackend::new(config.backend.clone())?);
        Self::with_backends(config, backend.clone(), backend)
    }

    /// Starts an engine over arbitrary backends.
    pub fn with_backends(
        config: EngineConfig,
        videos: Arc<dyn VideoSource>,
        jobs: Arc<dyn JobBackend>,
    ) -> Result<Self, EngineError> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()?;

        let mut cache = ListCache::new(videos, config.store, config.cache);
        if let Some(clock) = config.clock {
            cache = cache.with_clock(clock);
        }
        let services = Arc::new(Services {
            cache,
            poller: Arc::new(JobPoller::new(jobs, config.poll)),
        });

        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();

        thread::spawn(move || {
            {
                let _enter = runtime.enter();
                let mut watches: HashMap<JobId, WatchHandle> = HashMap::new();
                while let Ok(command) = cmd_rx.recv() {
                    dispatch(&services, &mut watches, command, &event_tx);
                }
                reel_debug!("Engine command channel closed; cancelling {} watches", watches.len());
                for watch in watches.values() {
                    watch.cancel();
                }
            }
            // Dropping the tasks releases their event senders.
            runtime.shutdown_timeout(Duration::from_secs(1));
        });

        Ok(Self {
            cmd_tx,
            events: EngineEvents {
                event_rx: Arc::new(Mutex::new(event_rx)),
            },
        })
    }

    pub fn load_videos(&self, source: SourceKey) {
        self.send(EngineCommand::LoadVideos { source });
    }

    pub fn load_more_videos(&self, source: SourceKey, page: PageRequest) {
        self.send(EngineCommand::LoadMoreVideos { source, page });
    }

    pub fn invalidate_videos(&self, source: SourceKey) {
        self.send(EngineCommand::InvalidateVideos { source });
    }

    pub fn submit_generation(&self, request: GenerationRequest) {
        self.send(EngineCommand::SubmitGeneration(request));
    }

    pub fn watch_job(&self, handle: JobHandle) {
        self.send(EngineCommand::WatchJob(handle));
    }

    pub fn cancel_watch(&self, job_id: JobId) {
        self.send(EngineCommand::CancelWatch { job_id });
    }

    pub fn events(&self) -> EngineEvents {
        self.events.clone()
    }

    pub fn try_recv(&self) -> Option<EngineEvent> {
        self.events.try_recv().ok()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<EngineEvent> {
        self.events.recv_timeout(timeout).ok()
    }

    fn send(&self, command: EngineCommand) {
        let _ = self.cmd_tx.send(command);
    }
}

fn dispatch(
    services: &Arc<Services>,
    watches: &mut HashMap<JobId, WatchHandle>,
    command: EngineCommand,
    event_tx: &mpsc::Sender<EngineEvent>,
) {
    match command {
        EngineCommand::LoadVideos { source } => {
            let services = services.clone();
            let event_tx = event_tx.clone();
            tokio::spawn(async move {
                let page = services.cache.first_page();
                let result = services.cache.load(&source, page).await;
                let _ = event_tx.send(videos_event(source, result));
            });
        }
        EngineCommand::LoadMoreVideos { source, page } => {
            let services = services.clone();
            let event_tx = event_tx.clone();
            tokio::spawn(async move {
                let result = services.cache.load_more(&source, page).await;
                let _ = event_tx.send(videos_event(source, result));
            });
        }
        EngineCommand::InvalidateVideos { source } => {
            services.cache.invalidate(&source);
        }
        EngineCommand::SubmitGeneration(request) => {
            let services = services.clone();
            let event_tx = event_tx.clone();
            tokio::spawn(async move {
                let event = match services.poller.submit(&request).await {
                    Ok(handle) => EngineEvent::GenerationSubmitted(handle),
                    Err(err) => EngineEvent::GenerationRejected {
                        message: err.to_string(),
                    },
                };
                let _ = event_tx.send(event);
            });
        }
        EngineCommand::WatchJob(handle) => {
            watches.retain(|_, watch| !watch.is_finished());
            let job_id = handle.id.clone();
            if let Some(previous) = watches.remove(&job_id) {
                previous.cancel();
            }
            reel_info!("Watching generation job {}", job_id);
            let sink = Arc::new(ChannelWatchSink {
                tx: event_tx.clone(),
            });
            let watch = services.poller.spawn_watch(handle, sink);
            watches.insert(job_id, watch);
        }
        EngineCommand::CancelWatch { job_id } => {
            if let Some(watch) = watches.remove(&job_id) {
                reel_info!("Cancelling watch of job {}", watch.job_id());
                watch.cancel();
            }
        }
    }
}

fn videos_event(source: SourceKey, result: Result<reel_core::CachedCollection, CacheError>) -> EngineEvent {
    match result {
        Ok(collection) => EngineEvent::VideosLoaded { source, collection },
        Err(CacheError::Fetch { error, retained }) => EngineEvent::VideosFailed {
            source,
            message: error.to_string(),
            retained,
        },
        Err(err) => EngineEvent::VideosFailed {
            source,
            message: err.to_string(),
            retained: None,
        },
    }
}
