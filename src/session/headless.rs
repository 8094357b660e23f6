// Headless host - Drives the loop on a plain thread without a display
//
// Refreshes are simulated by sleeping for a fixed tick. Frames are kept in
// memory so a run can be inspected or snapshotted afterwards.

use super::{LoopController, LoopError, LoopState, StopHandle};
use crate::display::screenshot::{save_png, ScreenshotError};
use crate::host::{Compositor, FrameScheduler, StatusSurface};
use std::io;
use std::path::PathBuf;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use thiserror::Error;

/// Errors from a headless run
#[derive(Debug, Error)]
pub enum HeadlessError {
    #[error(transparent)]
    Loop(#[from] LoopError),

    #[error("failed to write snapshot: {0}")]
    Snapshot(#[from] ScreenshotError),

    #[error("failed to spawn frame loop thread: {0}")]
    Spawn(#[source] io::Error),
}

/// Host that records instead of displaying
#[derive(Debug, Default, Clone)]
pub struct HeadlessHost {
    last_frame: Vec<u8>,
    last_width: usize,
    presents: u64,
    fps_text: String,
    status_text: String,
    scheduled: bool,
}

impl HeadlessHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consume a pending refresh request
    pub fn take_scheduled(&mut self) -> bool {
        std::mem::take(&mut self.scheduled)
    }

    /// Most recently presented image
    pub fn last_frame(&self) -> &[u8] {
        &self.last_frame
    }

    pub fn last_width(&self) -> usize {
        self.last_width
    }

    pub fn presents(&self) -> u64 {
        self.presents
    }

    pub fn fps_text(&self) -> &str {
        &self.fps_text
    }

    pub fn status_text(&self) -> &str {
        &self.status_text
    }
}

impl Compositor for HeadlessHost {
    fn present_image(&mut self, rgba: &[u8], width: usize) {
        self.last_frame.clear();
        self.last_frame.extend_from_slice(rgba);
        self.last_width = width;
        self.presents += 1;
    }
}

impl StatusSurface for HeadlessHost {
    fn set_fps_text(&mut self, text: &str) {
        self.fps_text.clear();
        self.fps_text.push_str(text);
    }

    fn set_status_text(&mut self, text: &str) {
        tracing::info!(status = text, "status");
        self.status_text.clear();
        self.status_text.push_str(text);
    }
}

impl FrameScheduler for HeadlessHost {
    fn schedule_next_frame(&mut self) {
        self.scheduled = true;
    }
}

/// How a headless run is paced and when it ends
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadlessOptions {
    /// Simulated refresh interval
    pub tick: Duration,

    /// Request a stop once this many frames have been drawn
    ///
    /// The first frame always draws, so zero behaves like one.
    pub max_frames: Option<u64>,

    /// Write the last drawn frame here before the final clear
    pub snapshot: Option<PathBuf>,
}

impl HeadlessOptions {
    /// Tick at the given refresh rate (at least 1 Hz)
    pub fn with_fps(fps: u32) -> Self {
        Self {
            tick: Duration::from_micros(1_000_000 / fps.max(1) as u64),
            ..Self::default()
        }
    }

    /// Limit the run to `frames` drawn frames (at least 1)
    pub fn with_max_frames(mut self, frames: u64) -> Self {
        self.max_frames = Some(frames.max(1));
        self
    }

    pub fn with_snapshot(mut self, path: impl Into<PathBuf>) -> Self {
        self.snapshot = Some(path.into());
        self
    }
}

impl Default for HeadlessOptions {
    fn default() -> Self {
        Self {
            tick: Duration::from_micros(16_666),
            max_frames: None,
            snapshot: None,
        }
    }
}

/// Result of a completed headless run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadlessSummary {
    /// Frames drawn, not counting the final blank frame
    pub frames: u64,
    /// Where the snapshot was written, if one was requested
    pub snapshot: Option<PathBuf>,
}

/// Run the loop on the current thread until it stops
pub fn run_headless(
    controller: &mut LoopController<HeadlessHost>,
    options: &HeadlessOptions,
) -> Result<HeadlessSummary, HeadlessError> {
    let stop = controller.stop_handle();
    let epoch = Instant::now();

    limit_frames(controller, &stop, options.max_frames);
    let mut state = controller.start();

    while state == LoopState::Running && controller.host_mut().take_scheduled() {
        thread::sleep(options.tick);
        limit_frames(controller, &stop, options.max_frames);
        let timestamp_ms = epoch.elapsed().as_secs_f64() * 1000.0;
        state = controller.on_frame(timestamp_ms);
    }

    let snapshot = match &options.snapshot {
        Some(path) => {
            let buffer = controller.presenter().buffer();
            save_png(path, controller.host().last_frame(), buffer.width(), buffer.height())
                .map(|()| {
                    tracing::info!(path = %path.display(), "snapshot written");
                    Some(path.clone())
                })
        }
        None => Ok(None),
    };

    // Always reach Stopped so waiters are released, even if the snapshot failed
    controller.finish()?;

    Ok(HeadlessSummary {
        frames: controller.frames_run(),
        snapshot: snapshot?,
    })
}

/// Move the loop to a worker thread
///
/// Returns a handle for stopping it from the calling thread, and the
/// worker's join handle.
pub fn spawn_headless(
    mut controller: LoopController<HeadlessHost>,
    options: HeadlessOptions,
) -> Result<(StopHandle, JoinHandle<Result<HeadlessSummary, HeadlessError>>), HeadlessError> {
    let stop = controller.stop_handle();
    let worker = thread::Builder::new()
        .name("frame-loop".to_string())
        .spawn(move || run_headless(&mut controller, &options))
        .map_err(HeadlessError::Spawn)?;
    Ok((stop, worker))
}

/// Request a stop when the frame about to run is the last one allowed
fn limit_frames(
    controller: &LoopController<HeadlessHost>,
    stop: &StopHandle,
    max_frames: Option<u64>,
) {
    if let Some(max) = max_frames {
        if controller.frames_run() + 1 >= max && !stop.is_stop_requested() {
            stop.request_stop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presenter::Presenter;

    fn fast(max_frames: u64) -> HeadlessOptions {
        HeadlessOptions {
            tick: Duration::from_millis(1),
            ..HeadlessOptions::default()
        }
        .with_max_frames(max_frames)
    }

    #[test]
    fn test_options_with_fps() {
        assert_eq!(HeadlessOptions::with_fps(60).tick, Duration::from_micros(16_666));
        assert_eq!(HeadlessOptions::with_fps(0).tick, Duration::from_secs(1));
    }

    #[test]
    fn test_runs_exact_frame_count() {
        let mut ctl = LoopController::new(Presenter::game_boy(), HeadlessHost::new());
        let summary = run_headless(&mut ctl, &fast(5)).expect("run");

        assert_eq!(summary.frames, 5);
        assert_eq!(ctl.host().presents(), 6);
        assert_eq!(ctl.state(), LoopState::Stopped);
        assert_eq!(ctl.host().fps_text(), "---");
    }

    #[test]
    fn test_single_frame_run() {
        let mut ctl = LoopController::new(Presenter::game_boy(), HeadlessHost::new());
        let summary = run_headless(&mut ctl, &fast(1)).expect("run");
        assert_eq!(summary.frames, 1);
        assert_eq!(ctl.host().presents(), 2);
    }

    #[test]
    fn test_zero_frame_limit_draws_one_frame() {
        let options = fast(0);
        assert_eq!(options.max_frames, Some(1));

        let mut ctl = LoopController::new(Presenter::game_boy(), HeadlessHost::new());
        let summary = run_headless(&mut ctl, &options).expect("run");
        assert_eq!(summary.frames, 1);
        assert_eq!(ctl.host().presents(), 2);

        // A zero set directly on the field is treated the same way
        let options = HeadlessOptions {
            max_frames: Some(0),
            ..fast(1)
        };
        let mut ctl = LoopController::new(Presenter::game_boy(), HeadlessHost::new());
        assert_eq!(run_headless(&mut ctl, &options).expect("run").frames, 1);
    }

    #[test]
    fn test_spawned_loop_stops_from_another_thread() {
        let ctl = LoopController::new(Presenter::game_boy(), HeadlessHost::new());
        let options = HeadlessOptions {
            tick: Duration::from_millis(2),
            ..HeadlessOptions::default()
        };
        let (stop, worker) = spawn_headless(ctl, options).expect("spawn");

        thread::sleep(Duration::from_millis(20));
        assert_eq!(stop.state(), LoopState::Running);
        stop.request_stop();
        assert!(stop.wait_stopped_timeout(Duration::from_secs(5)));

        let summary = worker.join().expect("worker panicked").expect("run");
        assert!(summary.frames >= 1);
        assert_eq!(stop.state(), LoopState::Stopped);
    }
}
