// gb-canvas - Main Entry Point
//
// Opens a window (or runs headless) and drives the presentation loop:
// black border, white background and a color-cycling inset, with the
// instantaneous FPS in the window title. An optional ROM is handed to the
// emulator bridge before the first frame.

#[cfg(not(target_arch = "wasm32"))]
use clap::Parser;
#[cfg(not(target_arch = "wasm32"))]
use gb_canvas::display::{run_window, snapshot_path, WindowConfig, WindowHost};
#[cfg(not(target_arch = "wasm32"))]
use gb_canvas::session::{spawn_headless, HeadlessHost, HeadlessOptions};
#[cfg(not(target_arch = "wasm32"))]
use gb_canvas::{
    AppConfig, HostBuffer, IdleEmulator, LoopController, RomBridge, StatusSurface, StopHandle,
    CONFIG_FILE,
};
#[cfg(not(target_arch = "wasm32"))]
use std::path::PathBuf;
#[cfg(not(target_arch = "wasm32"))]
use std::thread;
#[cfg(not(target_arch = "wasm32"))]
use std::time::Duration;
#[cfg(not(target_arch = "wasm32"))]
use tracing_subscriber::EnvFilter;

/// Frames drawn by a headless run when no other limit is given
#[cfg(not(target_arch = "wasm32"))]
const DEFAULT_HEADLESS_FRAMES: u64 = 120;

#[cfg(not(target_arch = "wasm32"))]
#[derive(Parser, Debug)]
#[command(name = "gb-canvas", version, about = "Emulator video presentation loop")]
struct Args {
    /// ROM image to hand to the emulator
    rom: Option<PathBuf>,

    /// Configuration file
    #[arg(long, default_value = CONFIG_FILE)]
    config: PathBuf,

    /// Window scale (1-8), overrides the configuration
    #[arg(long)]
    scale: Option<u32>,

    /// Run without a window
    #[arg(long)]
    headless: bool,

    /// Stop after this many frames, at least 1 (headless only)
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    frames: Option<u64>,

    /// Stop after this many seconds
    #[arg(long, value_name = "SECS")]
    run_for: Option<f64>,

    /// Write the last drawn frame as PNG (headless only); a directory gets a
    /// timestamped file name
    #[arg(long, value_name = "PATH")]
    snapshot: Option<PathBuf>,
}

#[cfg(not(target_arch = "wasm32"))]
fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let mut config = AppConfig::load_or_default(&args.config);
    if let Some(scale) = args.scale {
        config = config.with_scale(scale);
    }
    tracing::info!(config = %args.config.display(), "configuration loaded");

    let bridge = RomBridge::new(IdleEmulator::new());
    if let Some(path) = &args.rom {
        let bytes = std::fs::read(path)?;
        tracing::info!(path = %path.display(), "submitting ROM");
        bridge.submit_rom(&[HostBuffer::uint8(bytes)]);
    }

    if args.headless {
        run_headless_mode(&args, &config, &bridge)
    } else {
        run_window_mode(&args, &config, bridge)
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn run_window_mode(
    args: &Args,
    config: &AppConfig,
    bridge: RomBridge<IdleEmulator>,
) -> Result<(), Box<dyn std::error::Error>> {
    let controller = LoopController::new(config.presenter(), WindowHost::new())
        .with_fps_placeholder(config.status.fps_placeholder.clone());

    if let Some(seconds) = args.run_for {
        stop_after(controller.stop_handle(), seconds)?;
    }

    let frames = run_window(controller, bridge, WindowConfig::from_video(&config.video))?;
    tracing::info!(frames, "window closed");
    Ok(())
}

#[cfg(not(target_arch = "wasm32"))]
fn run_headless_mode(
    args: &Args,
    config: &AppConfig,
    bridge: &RomBridge<IdleEmulator>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut controller = LoopController::new(config.presenter(), HeadlessHost::new())
        .with_fps_placeholder(config.status.fps_placeholder.clone());
    if let Some(status) = bridge.last_status() {
        controller.host_mut().set_status_text(&status);
    }

    let mut options = HeadlessOptions::with_fps(config.video.target_fps);
    let max_frames = match (args.frames, args.run_for) {
        (Some(frames), _) => Some(frames),
        (None, None) => Some(DEFAULT_HEADLESS_FRAMES),
        (None, Some(_)) => None,
    };
    if let Some(frames) = max_frames {
        options = options.with_max_frames(frames);
    }
    if let Some(path) = &args.snapshot {
        let path = if path.is_dir() {
            snapshot_path(path)
        } else {
            path.clone()
        };
        options = options.with_snapshot(path);
    }

    let (stop, worker) = spawn_headless(controller, options)?;
    if let Some(seconds) = args.run_for {
        stop_after(stop.clone(), seconds)?;
    }

    // The worker may exit without stopping if it panics
    while !stop.wait_stopped_timeout(Duration::from_millis(100)) && !worker.is_finished() {}
    let summary = worker
        .join()
        .map_err(|_| "frame loop thread panicked")??;

    tracing::info!(frames = summary.frames, "headless run finished");
    if let Some(path) = summary.snapshot {
        println!("Snapshot saved to {}", path.display());
    }
    Ok(())
}

/// Request a stop from a control thread after `seconds`
#[cfg(not(target_arch = "wasm32"))]
fn stop_after(stop: StopHandle, seconds: f64) -> std::io::Result<()> {
    let delay = Duration::try_from_secs_f64(seconds.max(0.0)).unwrap_or(Duration::MAX);
    thread::Builder::new()
        .name("stop-timer".to_string())
        .spawn(move || {
            thread::sleep(delay);
            stop.request_stop();
        })?;
    Ok(())
}

#[cfg(target_arch = "wasm32")]
fn main() {}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use super::*;

    #[test]
    fn test_frames_must_be_positive() {
        assert!(Args::try_parse_from(["gb-canvas", "--headless", "--frames", "0"]).is_err());

        let args = Args::try_parse_from(["gb-canvas", "--headless", "--frames", "1"])
            .expect("one frame is accepted");
        assert_eq!(args.frames, Some(1));
    }
}
