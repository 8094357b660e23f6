// gb-canvas Library
// Presentation loop for a small emulator's video output

// Public modules
pub mod clock;
pub mod config;
pub mod display;
pub mod host;
pub mod presenter;
pub mod rom;
pub mod session;

// Re-export main types for convenience
pub use clock::{format_fps, instantaneous_fps, FrameClock, DEFAULT_CYCLE_SECONDS};
pub use config::{AppConfig, ConfigError, CONFIG_FILE, MAX_DIMENSION};
pub use display::{ColorKeypoint, GradientTable, PixelBuffer, Rect, Rgb};
pub use host::{Compositor, FrameScheduler, Host, StatusSurface};
pub use presenter::{FrameReport, FrameStyle, Presenter};
pub use rom::{ElementType, Emulator, EmulatorError, HostBuffer, IdleEmulator, RomBridge, RomError};
pub use session::{LoopController, LoopError, LoopState, StopHandle};
