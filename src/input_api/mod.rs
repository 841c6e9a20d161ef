//! Contains logic for receiving raw input events from the operating system.
//! [GenericInputSource] is the main artifact of this module that abstracts
//! over the hook backends.

#[cfg(feature = "hooks")]
pub mod hooks;

use anyhow::Result;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Kind of a raw input event. The kind is all the accounting needs, the
/// actual key or button is never inspected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEventKind {
    Key,
    MouseButton,
    MouseMove,
}

/// Intended to serve as a contract OS input hook backends must implement.
///
/// An implementation delivers event kinds into `sender` until `shutdown` is
/// cancelled. Delivery is best-effort: when the receiving side lags behind,
/// events are dropped rather than blocking the hook callback.
pub trait InputSource: Send + 'static {
    fn run(self: Box<Self>, sender: mpsc::Sender<InputEventKind>, shutdown: CancellationToken) -> Result<()>;
}

/// Serves as a cross-compatible InputSource implementation.
pub struct GenericInputSource {
    inner: Box<dyn InputSource>,
}

impl GenericInputSource {
    pub fn new() -> Result<Self> {
        cfg_if::cfg_if! {
            if #[cfg(feature = "hooks")] {
                use hooks::RdevInputSource;
                Ok(Self {
                    inner: Box::new(RdevInputSource),
                })
            }
            else {
                // This runtime error is needed to allow the project to be compiled for during testing.
                unimplemented!("No input hook backend was specified")
            }
        }
    }
}

impl InputSource for GenericInputSource {
    fn run(self: Box<Self>, sender: mpsc::Sender<InputEventKind>, shutdown: CancellationToken) -> Result<()> {
        self.inner.run(sender, shutdown)
    }
}
