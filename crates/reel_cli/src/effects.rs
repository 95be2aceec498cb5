use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use reel_core::{Effect, Msg};
use reel_engine::{EngineEvent, EngineHandle};
use reel_logging::{reel_debug, reel_info, reel_warn};

const EVENT_WAIT: Duration = Duration::from_millis(100);

/// Turns effects into engine commands and engine events back into messages.
pub struct EffectRunner {
    engine: EngineHandle,
}

impl EffectRunner {
    pub fn new(engine: EngineHandle, msg_tx: mpsc::Sender<Msg>) -> Self {
        let runner = Self { engine };
        runner.spawn_event_loop(msg_tx);
        runner
    }

    pub fn enqueue(&self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::LoadVideos { source } => {
                    reel_info!("LoadVideos {}", source.storage_key());
                    self.engine.load_videos(source);
                }
                Effect::LoadMoreVideos { source, page } => {
                    reel_info!("LoadMoreVideos {} page={:?}", source.storage_key(), page);
                    self.engine.load_more_videos(source, page);
                }
                Effect::InvalidateVideos { source } => {
                    self.engine.invalidate_videos(source);
                }
                Effect::SubmitGeneration(request) => {
                    reel_info!(
                        "SubmitGeneration avatar={} voice={} text_len={}",
                        request.avatar_id,
                        request.voice_id,
                        request.text.len()
                    );
                    self.engine.submit_generation(request);
                }
                Effect::WatchJob(handle) => {
                    self.engine.watch_job(handle);
                }
                Effect::CancelWatch { job_id } => {
                    self.engine.cancel_watch(job_id);
                }
            }
        }
    }

    /// Forwards engine events as messages until either side goes away.
    /// Only the event receiver is held, so dropping the runner stops the engine.
    fn spawn_event_loop(&self, msg_tx: mpsc::Sender<Msg>) {
        let events = self.engine.events();
        thread::spawn(move || loop {
            match events.recv_timeout(EVENT_WAIT) {
                Ok(event) => {
                    let Some(msg) = event_to_msg(event) else {
                        continue;
                    };
                    if msg_tx.send(msg).is_err() {
                        reel_debug!("Message channel closed; stopping event loop");
                        break;
                    }
                }
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => {
                    reel_debug!("Engine stopped; stopping event loop");
                    break;
                }
            }
        });
    }
}

/// Maps an engine event to the message the state machine understands.
/// Cancelled watches produce nothing.
pub fn event_to_msg(event: EngineEvent) -> Option<Msg> {
    match event {
        EngineEvent::VideosLoaded { source, collection } => Some(Msg::VideosLoaded {
            source,
            items: collection.items,
            next_page: collection.next_page,
        }),
        EngineEvent::VideosFailed {
            source,
            message,
            retained,
        } => {
            reel_warn!("Loading videos for {} failed: {}", source.storage_key(), message);
            Some(Msg::VideosFailed {
                source,
                message,
                retained: retained.map(|collection| collection.items),
            })
        }
        EngineEvent::GenerationSubmitted(handle) => Some(Msg::GenerationSubmitted(handle)),
        EngineEvent::GenerationRejected { message } => {
            reel_warn!("Generation rejected: {}", message);
            Some(Msg::GenerationRejected(message))
        }
        EngineEvent::GenerationFinished(outcome) => outcome
            .into_generation_outcome()
            .map(Msg::GenerationFinished),
    }
}
