use std::sync::mpsc::{self, RecvTimeoutError};
use std::time::{Duration, Instant};

use anyhow::{bail, Result};
use reel_core::{update, AppState, AppViewModel, Msg};
use reel_engine::EngineHandle;

use crate::effects::EffectRunner;

/// One interactive run of the wizard state machine on top of the engine.
pub struct Session {
    state: AppState,
    runner: EffectRunner,
    msg_rx: mpsc::Receiver<Msg>,
}

impl Session {
    pub fn new(engine: EngineHandle) -> Self {
        let (msg_tx, msg_rx) = mpsc::channel();
        Self {
            state: AppState::new(),
            runner: EffectRunner::new(engine, msg_tx),
            msg_rx,
        }
    }

    pub fn dispatch(&mut self, msg: Msg) {
        let state = std::mem::take(&mut self.state);
        let (state, effects) = update(state, msg);
        self.state = state;
        self.runner.enqueue(effects);
    }

    pub fn view(&self) -> AppViewModel {
        self.state.view()
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Feeds engine results into the state machine until `done` accepts the
    /// view. Fails once `limit` has passed without that happening.
    ///
    /// The view is rebuilt and `done` consulted again only after a message
    /// actually changed the state.
    pub fn run_until(
        &mut self,
        limit: Duration,
        mut done: impl FnMut(&AppViewModel) -> bool,
    ) -> Result<AppViewModel> {
        let deadline = Instant::now() + limit;
        self.state.consume_dirty();
        let mut view = self.state.view();
        let mut fresh = true;
        loop {
            if fresh && done(&view) {
                return Ok(view);
            }
            fresh = false;
            let now = Instant::now();
            if now >= deadline {
                bail!("no answer within {:?}", limit);
            }
            match self.msg_rx.recv_timeout(deadline - now) {
                Ok(msg) => {
                    self.dispatch(msg);
                    if self.state.consume_dirty() {
                        view = self.state.view();
                        fresh = true;
                    }
                }
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => bail!("engine stopped unexpectedly"),
            }
        }
    }
}
