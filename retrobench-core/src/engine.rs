//! Engine Interface
//!
//! The uniform step/capture surface every core library is driven through.
//! Engines are built by an [`EngineFactory`] and are only ever touched from
//! inside an [`EngineSession`](crate::EngineSession).

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Boxed error returned by engine implementations.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Auxiliary descriptor handed to [`Engine::configure`] before the first step.
///
/// An empty descriptor is valid: engines must be steppable without any
/// game-specific data.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuxDescriptor {
    /// Engine-specific key/value options (e.g. libretro core variables)
    pub variables: BTreeMap<String, String>,
}

impl AuxDescriptor {
    /// Descriptor with no options set
    pub fn empty() -> Self {
        Self::default()
    }

    /// Add or replace one option
    pub fn with_variable(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.variables.insert(key.into(), value.into());
        self
    }
}

/// A captured frame. Empty when the engine renders on the GPU only.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Frame {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Bytes per row
    pub pitch: usize,
    /// Raw pixel bytes, `pitch * height` long
    pub data: Vec<u8>,
}

impl Frame {
    /// Whether the frame carries any pixel data
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// One live emulation engine bound to a single piece of content.
///
/// Implementations are not assumed to be reentrant; the harness guarantees at
/// most one instance is alive at a time.
pub trait Engine {
    /// Apply the auxiliary descriptor. Called once, before any step.
    fn configure(&mut self, aux: &AuxDescriptor) -> Result<(), BoxError>;

    /// Advance simulated time by one step (roughly one frame).
    fn step(&mut self) -> Result<(), BoxError>;

    /// Copy the current frame out of the engine.
    fn capture_frame(&mut self) -> Result<Frame, BoxError>;

    /// Free engine resources. Called exactly once, right before the engine is dropped.
    fn release(&mut self) {}
}

/// Builds engines for a core library.
pub trait EngineFactory {
    /// Construct an engine for `core_lib` bound to the content at `content_path`.
    fn construct(&self, core_lib: &str, content_path: &Path) -> Result<Box<dyn Engine>, BoxError>;
}

impl<F> EngineFactory for F
where
    F: Fn(&str, &Path) -> Result<Box<dyn Engine>, BoxError>,
{
    fn construct(&self, core_lib: &str, content_path: &Path) -> Result<Box<dyn Engine>, BoxError> {
        self(core_lib, content_path)
    }
}

/// Errors surfaced by an engine session.
///
/// Every variant that wraps an engine failure keeps the original cause as its
/// `source`.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("benchmark duration must be a positive number of seconds, got {0}")]
    InvalidDuration(f64),

    #[error("another engine instance is still live")]
    AlreadyLive,

    #[error("failed to construct {core_lib} for {}: {source}", path.display())]
    Construct {
        core_lib: String,
        path: PathBuf,
        #[source]
        source: BoxError,
    },

    #[error("failed to configure engine: {0}")]
    Configure(#[source] BoxError),

    #[error("step failed: {0}")]
    Step(#[source] BoxError),

    #[error("frame capture failed: {0}")]
    Capture(#[source] BoxError),

    #[error("engine panicked: {message}")]
    Panicked { message: String },
}
