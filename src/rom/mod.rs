// ROM module - Hands ROM images from the host to the emulator core
//
// The host passes a list of typed buffers; exactly one Uint8 buffer is
// accepted. On success the bytes are copied into an owned image, given to
// the emulator, and one frame is run so the next presentation pass has
// fresh video output. Failures are reported once and never retried.

mod idle;

pub use idle::IdleEmulator;

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use thiserror::Error;

/// Element type tag of a host typed array
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ElementType {
    Int8,
    Uint8,
    Uint8Clamped,
    Int16,
    Uint16,
    Int32,
    Uint32,
    Float32,
    Float64,
    BigInt64,
    BigUint64,
    /// Anything that is not a typed array, by constructor name
    Other(String),
}

impl ElementType {
    const NAMED: [(ElementType, &'static str); 11] = [
        (ElementType::Int8, "Int8Array"),
        (ElementType::Uint8, "Uint8Array"),
        (ElementType::Uint8Clamped, "Uint8ClampedArray"),
        (ElementType::Int16, "Int16Array"),
        (ElementType::Uint16, "Uint16Array"),
        (ElementType::Int32, "Int32Array"),
        (ElementType::Uint32, "Uint32Array"),
        (ElementType::Float32, "Float32Array"),
        (ElementType::Float64, "Float64Array"),
        (ElementType::BigInt64, "BigInt64Array"),
        (ElementType::BigUint64, "BigUint64Array"),
    ];

    /// Parse a JavaScript constructor name, ignoring case
    pub fn from_constructor_name(name: &str) -> Self {
        Self::NAMED
            .iter()
            .find(|(_, known)| known.eq_ignore_ascii_case(name))
            .map(|(ty, _)| ty.clone())
            .unwrap_or_else(|| ElementType::Other(name.to_string()))
    }

    pub fn constructor_name(&self) -> &str {
        match self {
            ElementType::Other(name) => name,
            known => Self::NAMED
                .iter()
                .find(|(ty, _)| ty == known)
                .map(|(_, name)| *name)
                .unwrap_or("unknown"),
        }
    }

    /// Only plain `Uint8Array`s carry ROM bytes
    pub fn is_byte_array(&self) -> bool {
        *self == ElementType::Uint8
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.constructor_name())
    }
}

/// A buffer as received from the host: a type tag plus its raw bytes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostBuffer {
    element_type: ElementType,
    bytes: Vec<u8>,
}

impl HostBuffer {
    pub fn new(element_type: ElementType, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            element_type,
            bytes: bytes.into(),
        }
    }

    /// A `Uint8Array` holding `bytes`
    pub fn uint8(bytes: impl Into<Vec<u8>>) -> Self {
        Self::new(ElementType::Uint8, bytes)
    }

    pub fn element_type(&self) -> &ElementType {
        &self.element_type
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn byte_len(&self) -> usize {
        self.bytes.len()
    }
}

/// Failure reported by the emulator core itself
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct EmulatorError {
    message: String,
}

impl EmulatorError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// The emulator core, seen from the presentation side
pub trait Emulator {
    /// Take ownership of a ROM image
    fn load_rom(&mut self, rom: Vec<u8>) -> Result<(), EmulatorError>;

    /// Emulate one video frame
    fn run_frame(&mut self);

    /// Video output of the last emulated frame
    fn video_output(&self) -> &[u8];
}

/// Why a ROM submission was refused
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RomError {
    #[error("invalid number of args, expected 1, got {0}")]
    ArgumentCount(usize),

    #[error("invalid argument, expected: Uint8Array, actual: {0}")]
    ElementType(ElementType),

    #[error("emulator rejected ROM: {0}")]
    Emulator(#[from] EmulatorError),
}

/// Entry point for ROM submissions
///
/// The emulator is shared behind a mutex so the bridge can be cloned onto
/// whichever thread receives load requests.
pub struct RomBridge<E> {
    emulator: Arc<Mutex<E>>,
    last_status: Arc<Mutex<Option<String>>>,
}

impl<E: Emulator> RomBridge<E> {
    pub fn new(emulator: E) -> Self {
        Self::from_shared(Arc::new(Mutex::new(emulator)))
    }

    pub fn from_shared(emulator: Arc<Mutex<E>>) -> Self {
        Self {
            emulator,
            last_status: Arc::new(Mutex::new(None)),
        }
    }

    /// Shared handle to the emulator
    pub fn emulator(&self) -> Arc<Mutex<E>> {
        Arc::clone(&self.emulator)
    }

    /// Validate the arguments and forward the ROM
    ///
    /// Returns the number of bytes handed to the emulator.
    pub fn load(&self, args: &[HostBuffer]) -> Result<usize, RomError> {
        let [buffer] = args else {
            return Err(RomError::ArgumentCount(args.len()));
        };
        if !buffer.element_type().is_byte_array() {
            return Err(RomError::ElementType(buffer.element_type().clone()));
        }

        let rom = buffer.as_bytes().to_vec();
        let size = rom.len();

        let mut emulator = self.emulator.lock().unwrap_or_else(PoisonError::into_inner);
        emulator.load_rom(rom)?;
        emulator.run_frame();

        Ok(size)
    }

    /// Host-facing submission: `true` on success, `false` plus a logged
    /// diagnostic otherwise
    pub fn submit_rom(&self, args: &[HostBuffer]) -> bool {
        tracing::info!(args = args.len(), "loading ROM");

        let (accepted, status) = match self.load(args) {
            Ok(size) => {
                tracing::info!(bytes = size, "ROM loaded");
                (true, format!("ROM loaded ({} bytes)", size))
            }
            Err(err) => {
                tracing::warn!(error = %err, "ROM rejected");
                (false, format!("ROM rejected: {}", err))
            }
        };

        *self.last_status.lock().unwrap_or_else(PoisonError::into_inner) = Some(status);
        accepted
    }

    /// Status line describing the most recent submission
    pub fn last_status(&self) -> Option<String> {
        self.last_status
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl<E> Clone for RomBridge<E> {
    fn clone(&self) -> Self {
        Self {
            emulator: Arc::clone(&self.emulator),
            last_status: Arc::clone(&self.last_status),
        }
    }
}
