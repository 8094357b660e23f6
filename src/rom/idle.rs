// Idle emulator - Stand-in core used when no real emulator is linked
//
// Keeps the ROM image and counts frames; its video output stays blank.

use super::{Emulator, EmulatorError};
use crate::display::{SCREEN_HEIGHT, SCREEN_WIDTH};

#[derive(Debug, Clone)]
pub struct IdleEmulator {
    rom: Option<Vec<u8>>,
    frames: u64,
    video: Vec<u8>,
}

impl IdleEmulator {
    pub fn new() -> Self {
        Self {
            rom: None,
            frames: 0,
            video: vec![0; SCREEN_WIDTH * SCREEN_HEIGHT * 4],
        }
    }

    pub fn rom(&self) -> Option<&[u8]> {
        self.rom.as_deref()
    }

    /// Frames run since the last ROM load
    pub fn frames(&self) -> u64 {
        self.frames
    }
}

impl Default for IdleEmulator {
    fn default() -> Self {
        Self::new()
    }
}

impl Emulator for IdleEmulator {
    fn load_rom(&mut self, rom: Vec<u8>) -> Result<(), EmulatorError> {
        if rom.is_empty() {
            return Err(EmulatorError::new("empty ROM image"));
        }
        self.rom = Some(rom);
        self.frames = 0;
        Ok(())
    }

    fn run_frame(&mut self) {
        self.frames += 1;
    }

    fn video_output(&self) -> &[u8] {
        &self.video
    }
}
