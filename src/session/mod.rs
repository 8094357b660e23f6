// Session module - Frame loop state machine and shutdown synchronization
//
// The loop is driven entirely by the host: `start` draws the first frame
// and asks for another refresh, each `on_frame` callback draws one frame and
// asks again, until a stop is requested. Stop requests may come from any
// thread through a `StopHandle`; the frame callback that observes the
// request moves the loop to `Stopping` and stops rescheduling, and
// `finish` presents a blank frame and moves it to `Stopped`.
//
//   Running ──request_stop + frame──▶ Stopping ──finish──▶ Stopped

pub mod headless;
mod rendezvous;

pub use headless::{
    run_headless, spawn_headless, HeadlessError, HeadlessHost, HeadlessOptions, HeadlessSummary,
};
pub use rendezvous::Rendezvous;

use crate::host::Host;
use crate::presenter::Presenter;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use thiserror::Error;

/// FPS text shown once the loop has stopped
pub const DEFAULT_FPS_PLACEHOLDER: &str = "---";

/// Lifecycle of a presentation loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoopState {
    /// Frames are being drawn and rescheduled
    Running,
    /// A frame has observed the stop request; nothing is scheduled
    Stopping,
    /// Final blank frame presented (terminal)
    Stopped,
}

impl fmt::Display for LoopState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LoopState::Running => "running",
            LoopState::Stopping => "stopping",
            LoopState::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

/// Errors from driving the loop out of order
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoopError {
    /// `finish` was called while no stop had been requested
    #[error("loop is still running and no stop was requested")]
    NotStopping,

    /// `finish` was called on a loop that already stopped
    #[error("loop already stopped")]
    AlreadyFinished,
}

/// State visible to every thread holding a handle
#[derive(Debug)]
struct Shared {
    stop_requested: AtomicBool,
    state: Mutex<LoopState>,
    stopped: Rendezvous,
}

impl Shared {
    fn new() -> Self {
        Self {
            stop_requested: AtomicBool::new(false),
            state: Mutex::new(LoopState::Running),
            stopped: Rendezvous::new(),
        }
    }

    fn state(&self) -> LoopState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Move from `from` to `to`; returns whether this call made the move
    fn transition(&self, from: LoopState, to: LoopState) -> bool {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if *state != from {
            return false;
        }
        *state = to;
        true
    }
}

/// Cloneable, thread-safe control over a running loop
#[derive(Debug, Clone)]
pub struct StopHandle {
    shared: Arc<Shared>,
}

impl StopHandle {
    /// Ask the loop to stop after its next frame
    ///
    /// Idempotent: returns `true` only for the first request.
    pub fn request_stop(&self) -> bool {
        let first = !self.shared.stop_requested.swap(true, Ordering::AcqRel);
        if first {
            tracing::info!("stop requested");
        } else {
            tracing::debug!("stop already requested");
        }
        first
    }

    pub fn is_stop_requested(&self) -> bool {
        self.shared.stop_requested.load(Ordering::Acquire)
    }

    pub fn state(&self) -> LoopState {
        self.shared.state()
    }

    /// Block until the loop has presented its final blank frame
    pub fn wait_stopped(&self) {
        self.shared.stopped.wait();
    }

    /// Like `wait_stopped`, giving up after `timeout`; returns whether the
    /// loop stopped
    pub fn wait_stopped_timeout(&self, timeout: Duration) -> bool {
        self.shared.stopped.wait_timeout(timeout)
    }
}

/// Owns one presentation session: drawing state, host and loop state
pub struct LoopController<H: Host> {
    presenter: Presenter,
    host: H,
    shared: Arc<Shared>,
    fps_placeholder: String,
    frames_run: u64,
}

impl<H: Host> LoopController<H> {
    pub fn new(presenter: Presenter, host: H) -> Self {
        Self {
            presenter,
            host,
            shared: Arc::new(Shared::new()),
            fps_placeholder: DEFAULT_FPS_PLACEHOLDER.to_string(),
            frames_run: 0,
        }
    }

    /// Text shown on the FPS surface after shutdown
    pub fn with_fps_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.fps_placeholder = placeholder.into();
        self
    }

    pub fn stop_handle(&self) -> StopHandle {
        StopHandle {
            shared: Arc::clone(&self.shared),
        }
    }

    pub fn state(&self) -> LoopState {
        self.shared.state()
    }

    /// Draw the first frame right away and enter the scheduled loop
    pub fn start(&mut self) -> LoopState {
        let buffer = self.presenter.buffer();
        tracing::info!(
            width = buffer.width(),
            height = buffer.height(),
            "presentation loop starting"
        );
        self.on_frame(0.0)
    }

    /// Host refresh callback
    ///
    /// Draws one frame, then either asks for the next refresh or, if a stop
    /// was requested, moves to `Stopping` without rescheduling. Callbacks
    /// arriving after that are ignored.
    pub fn on_frame(&mut self, timestamp_ms: f64) -> LoopState {
        let state = self.state();
        if state != LoopState::Running {
            tracing::trace!(%state, "frame callback ignored");
            return state;
        }

        self.presenter.render_frame(timestamp_ms, &mut self.host);
        self.frames_run += 1;

        if self.shared.stop_requested.load(Ordering::Acquire) {
            self.acknowledge_stop();
            LoopState::Stopping
        } else {
            self.host.schedule_next_frame();
            LoopState::Running
        }
    }

    /// Present the blank frame, reset the FPS text and enter `Stopped`
    ///
    /// If a stop was requested but no frame has observed it yet, the stop is
    /// acknowledged here; any frame callback still queued by the host will
    /// then be ignored.
    pub fn finish(&mut self) -> Result<(), LoopError> {
        match self.state() {
            LoopState::Stopped => return Err(LoopError::AlreadyFinished),
            LoopState::Running if !self.shared.stop_requested.load(Ordering::Acquire) => {
                return Err(LoopError::NotStopping)
            }
            LoopState::Running => self.acknowledge_stop(),
            LoopState::Stopping => {}
        }

        self.presenter.present_blank(&mut self.host);
        self.host.set_fps_text(&self.fps_placeholder);

        self.shared.transition(LoopState::Stopping, LoopState::Stopped);
        self.shared.stopped.signal();
        tracing::info!(frames = self.frames_run, "presentation loop stopped");
        Ok(())
    }

    /// Finish the loop if a frame has acknowledged a stop
    ///
    /// Hosts call this with every state `start` or `on_frame` returns, so a
    /// stop observed by the very first frame is completed just like a later
    /// one. Returns the state after the call.
    pub fn finish_if_stopping(&mut self) -> Result<LoopState, LoopError> {
        if self.state() == LoopState::Stopping {
            self.finish()?;
        }
        Ok(self.state())
    }

    fn acknowledge_stop(&mut self) {
        if self.shared.transition(LoopState::Running, LoopState::Stopping) {
            tracing::info!(frames = self.frames_run, "stop acknowledged");
        }
    }

    /// Frames drawn by the loop, not counting the final blank frame
    pub fn frames_run(&self) -> u64 {
        self.frames_run
    }

    pub fn presenter(&self) -> &Presenter {
        &self.presenter
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn into_host(self) -> H {
        self.host
    }
}
