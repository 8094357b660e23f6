// Common test utilities for presentation integration tests
//
// This module provides a host that records every call the loop makes and
// an emulator that records every call the ROM bridge makes.

#![allow(dead_code)]

use gb_canvas::{Compositor, Emulator, EmulatorError, FrameScheduler, StatusSurface};

/// Host that keeps a log of everything it was asked to do
#[derive(Debug, Default)]
pub struct RecordingHost {
    /// Every presented image, in order
    pub frames: Vec<Vec<u8>>,
    /// Width passed with each presented image
    pub widths: Vec<usize>,
    /// Every FPS string, in order
    pub fps_texts: Vec<String>,
    /// Every status string, in order
    pub status_texts: Vec<String>,
    /// Number of refreshes requested
    pub scheduled: usize,
}

impl RecordingHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn presents(&self) -> usize {
        self.frames.len()
    }

    pub fn last_frame(&self) -> &[u8] {
        self.frames.last().map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn last_fps(&self) -> Option<&str> {
        self.fps_texts.last().map(String::as_str)
    }

    /// RGBA of pixel (x, y) in the last presented frame
    pub fn pixel(&self, x: usize, y: usize) -> [u8; 4] {
        let width = *self.widths.last().expect("no frame presented");
        let offset = (y * width + x) * 4;
        let frame = self.last_frame();
        [frame[offset], frame[offset + 1], frame[offset + 2], frame[offset + 3]]
    }
}

impl Compositor for RecordingHost {
    fn present_image(&mut self, rgba: &[u8], width: usize) {
        self.frames.push(rgba.to_vec());
        self.widths.push(width);
    }
}

impl StatusSurface for RecordingHost {
    fn set_fps_text(&mut self, text: &str) {
        self.fps_texts.push(text.to_string());
    }

    fn set_status_text(&mut self, text: &str) {
        self.status_texts.push(text.to_string());
    }
}

impl FrameScheduler for RecordingHost {
    fn schedule_next_frame(&mut self) {
        self.scheduled += 1;
    }
}

/// Calls the ROM bridge made on the emulator
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmulatorCall {
    LoadRom(Vec<u8>),
    RunFrame,
}

/// Emulator that records calls and optionally refuses ROMs
#[derive(Debug, Default)]
pub struct RecordingEmulator {
    pub calls: Vec<EmulatorCall>,
    pub reject_with: Option<String>,
    video: Vec<u8>,
}

impl RecordingEmulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rejecting(reason: &str) -> Self {
        Self {
            reject_with: Some(reason.to_string()),
            ..Self::default()
        }
    }
}

impl Emulator for RecordingEmulator {
    fn load_rom(&mut self, rom: Vec<u8>) -> Result<(), EmulatorError> {
        self.calls.push(EmulatorCall::LoadRom(rom));
        match &self.reject_with {
            Some(reason) => Err(EmulatorError::new(reason.clone())),
            None => Ok(()),
        }
    }

    fn run_frame(&mut self) {
        self.calls.push(EmulatorCall::RunFrame);
    }

    fn video_output(&self) -> &[u8] {
        &self.video
    }
}
