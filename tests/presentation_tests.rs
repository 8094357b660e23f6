// Presentation loop integration tests
// These tests drive the public API the way a host would

mod common;

use common::{EmulatorCall, RecordingEmulator, RecordingHost};
use gb_canvas::session::{run_headless, HeadlessHost, HeadlessOptions};
use gb_canvas::*;
use std::time::Duration;

fn controller() -> LoopController<RecordingHost> {
    LoopController::new(Presenter::game_boy(), RecordingHost::new())
}

#[test]
fn test_border_and_interior_fill() {
    let mut buffer = PixelBuffer::new(160, 144);
    buffer.fill_rect(Rect::new(0, 0, 160, 144), Rgb::BLACK);
    buffer.fill_rect(Rect::new(1, 1, 159, 143), Rgb::WHITE);

    let bytes = buffer.to_interleaved_bytes();
    assert_eq!(bytes.len(), 160 * 144 * 4);
    assert_eq!(&bytes[0..4], &[0, 0, 0, 255]);

    let interior = (5 * 160 + 5) * 4;
    assert_eq!(&bytes[interior..interior + 4], &[255, 255, 255, 255]);
}

#[test]
fn test_clock_deltas_and_progress() {
    let mut clock = FrameClock::new(3.0);

    let deltas: Vec<f64> = [0.0, 16.0, 32.0]
        .iter()
        .map(|&ts| clock.advance(ts))
        .collect();

    assert!(deltas[0].abs() < 1e-9);
    assert!((deltas[1] - 0.016).abs() < 1e-9);
    assert!((deltas[2] - 0.016).abs() < 1e-9);
    assert!((clock.progress() - 0.032 / 3.0).abs() < 1e-9);
}

#[test]
fn test_cycle_length_scales_progress() {
    let mut fast = FrameClock::new(1.0);
    fast.advance(0.0);
    fast.advance(250.0);
    assert!((fast.progress() - 0.25).abs() < 1e-9);
}

#[test]
fn test_non_byte_rom_never_reaches_emulator() {
    let bridge = RomBridge::new(RecordingEmulator::new());

    let floats = HostBuffer::new(ElementType::Float32, vec![0u8; 16]);
    assert!(!bridge.submit_rom(&[floats]));

    let clamped = HostBuffer::new(ElementType::Uint8Clamped, vec![1u8, 2, 3]);
    assert!(!bridge.submit_rom(&[clamped]));

    let emulator = bridge.emulator();
    assert!(emulator.lock().expect("lock").calls.is_empty());
    assert_eq!(
        bridge.last_status().as_deref(),
        Some("ROM rejected: invalid argument, expected: Uint8Array, actual: Uint8ClampedArray")
    );
}

#[test]
fn test_byte_rom_loads_and_runs_one_frame() {
    let bridge = RomBridge::new(RecordingEmulator::new());
    let rom = vec![0x00, 0xC3, 0x50, 0x01];

    assert!(bridge.submit_rom(&[HostBuffer::uint8(rom.clone())]));

    let emulator = bridge.emulator();
    assert_eq!(
        emulator.lock().expect("lock").calls,
        vec![EmulatorCall::LoadRom(rom), EmulatorCall::RunFrame]
    );
}

#[test]
fn test_rejected_rom_reports_reason() {
    let bridge = RomBridge::new(RecordingEmulator::rejecting("bad checksum"));

    assert!(!bridge.submit_rom(&[HostBuffer::uint8(vec![0xFF; 4])]));
    assert_eq!(
        bridge.load(&[HostBuffer::uint8(vec![0xFF; 4])]),
        Err(RomError::Emulator(EmulatorError::new("bad checksum")))
    );

    // Load was attempted, but no frame ran after the failure
    let emulator = bridge.emulator();
    let calls = emulator.lock().expect("lock").calls.clone();
    assert!(!calls.contains(&EmulatorCall::RunFrame));
}

#[test]
fn test_stop_before_first_frame() {
    let mut ctl = controller();
    let stop = ctl.stop_handle();
    assert!(stop.request_stop());

    ctl.finish().expect("finish");

    let host = ctl.host();
    assert_eq!(host.presents(), 1);
    assert!(host.last_frame().iter().all(|&b| b == 0xFF));
    assert_eq!(host.last_fps(), Some("---"));
    assert_eq!(host.scheduled, 0);
    assert_eq!(stop.state(), LoopState::Stopped);
    assert!(stop.wait_stopped_timeout(Duration::from_millis(1)));
}

#[test]
fn test_stop_requested_before_start() {
    let mut ctl = controller();
    ctl.stop_handle().request_stop();

    // The first frame still draws, then the loop winds down without rescheduling
    assert_eq!(ctl.start(), LoopState::Stopping);
    ctl.finish().expect("finish");

    let host = ctl.host();
    assert_eq!(host.presents(), 2);
    assert_eq!(host.scheduled, 0);
    assert_eq!(host.last_fps(), Some("---"));
    assert_eq!(ctl.on_frame(16.0), LoopState::Stopped);
    assert_eq!(ctl.host().presents(), 2);
}

#[test]
fn test_stop_pending_at_start_completes_without_another_frame() {
    let mut ctl = controller();
    let stop = ctl.stop_handle();
    stop.request_stop();

    // What a host does with the state the first frame returns
    let state = ctl.start();
    assert_eq!(state, LoopState::Stopping);
    assert_eq!(ctl.finish_if_stopping(), Ok(LoopState::Stopped));

    let host = ctl.host();
    assert_eq!(host.presents(), 2);
    assert_eq!(host.scheduled, 0);
    assert_eq!(host.last_fps(), Some("---"));
    assert!(host.last_frame().iter().all(|&b| b == 0xFF));
    assert!(stop.wait_stopped_timeout(Duration::from_millis(1)));
}

#[test]
fn test_full_session() {
    let mut ctl = controller();
    let stop = ctl.stop_handle();

    ctl.start();
    assert_eq!(ctl.host().pixel(0, 0), [0, 0, 0, 255]);
    assert_eq!(ctl.host().pixel(5, 5), [255, 255, 255, 255]);
    assert_eq!(ctl.host().pixel(80, 72), [255, 0, 0, 255]);
    assert_eq!(ctl.host().last_fps(), Some("fps: n/a"));

    for frame in 1..=10 {
        assert_eq!(ctl.on_frame(frame as f64 * 20.0), LoopState::Running);
    }
    assert_eq!(ctl.host().last_fps(), Some("fps: 50"));
    assert_eq!(ctl.host().scheduled, 11);
    assert!(ctl.host().widths.iter().all(|&w| w == 160));

    stop.request_stop();
    assert_eq!(ctl.on_frame(220.0), LoopState::Stopping);
    ctl.finish().expect("finish");

    assert_eq!(ctl.frames_run(), 12);
    assert_eq!(ctl.host().presents(), 13);
    assert_eq!(ctl.host().scheduled, 11);
    assert!(ctl.host().last_frame().iter().all(|&b| b == 0xFF));
    assert_eq!(ctl.finish(), Err(LoopError::AlreadyFinished));
}

#[test]
fn test_borrowed_host() {
    let mut host = RecordingHost::new();
    {
        let mut ctl = LoopController::new(Presenter::game_boy(), &mut host);
        ctl.start();
        ctl.on_frame(16.0);
    }
    assert_eq!(host.presents(), 2);
    assert_eq!(host.scheduled, 2);
}

#[test]
fn test_inset_is_perceptual_blend() {
    let gradient = GradientTable::hue_cycle();
    let mid = gradient.color_at(0.165);

    // A straight RGB lerp would sit at (128, 128, 0)
    assert_eq!(mid.b, 0);
    assert!(mid.r > 128);
    assert!(mid.g > 128);
}

#[test]
fn test_configured_session() {
    let config = AppConfig::from_toml(
        r##"
        [video]
        width = 32
        height = 24

        [frame]
        border_color = "#0000FF"
        inset_margin = 4

        [gradient]
        keypoints = [{ color = "#00FF00", position = 0.0 }]

        [status]
        fps_placeholder = "stopped"
        "##,
    )
    .expect("config");

    let mut ctl = LoopController::new(config.presenter(), RecordingHost::new())
        .with_fps_placeholder(config.status.fps_placeholder.clone());
    ctl.start();

    let host = ctl.host();
    assert_eq!(host.last_frame().len(), 32 * 24 * 4);
    assert_eq!(host.pixel(0, 0), [0, 0, 255, 255]);
    assert_eq!(host.pixel(16, 12), [0, 255, 0, 255]);

    ctl.stop_handle().request_stop();
    ctl.finish().expect("finish");
    assert_eq!(ctl.host().last_fps(), Some("stopped"));
}

#[test]
fn test_headless_run_with_snapshot() {
    let dir = std::env::temp_dir().join(format!("gb_canvas_headless_{}", std::process::id()));
    let path = dir.join("last.png");

    let mut ctl = LoopController::new(Presenter::game_boy(), HeadlessHost::new());
    let options = HeadlessOptions {
        tick: Duration::from_millis(1),
        ..HeadlessOptions::default()
    }
    .with_max_frames(3)
    .with_snapshot(&path);

    let summary = run_headless(&mut ctl, &options).expect("headless run");
    assert_eq!(summary.frames, 3);
    assert_eq!(summary.snapshot.as_deref(), Some(path.as_path()));

    let png = std::fs::read(&path).expect("snapshot file");
    assert_eq!(&png[..8], &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]);

    let _ = std::fs::remove_dir_all(&dir);
}
