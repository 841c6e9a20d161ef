use anyhow::{anyhow, Result};
use rdev::EventType;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::{InputEventKind, InputSource};

/// Input hook backend built on a global rdev listener. `rdev::listen` blocks
/// its thread for the lifetime of the process and cannot be unhooked, so the
/// callback stops forwarding once the token is cancelled and the thread is
/// left to die with the process.
pub struct RdevInputSource;

impl InputSource for RdevInputSource {
    fn run(self: Box<Self>, sender: mpsc::Sender<InputEventKind>, shutdown: CancellationToken) -> Result<()> {
        rdev::listen(move |event| {
            if shutdown.is_cancelled() {
                return;
            }
            let kind = match event.event_type {
                EventType::KeyPress(_) => InputEventKind::Key,
                EventType::ButtonPress(_) => InputEventKind::MouseButton,
                // Wheel ticks arrive in bursts the same way pointer motion
                // does, so they go through the same debounce path.
                EventType::MouseMove { .. } | EventType::Wheel { .. } => InputEventKind::MouseMove,
                EventType::KeyRelease(_) | EventType::ButtonRelease(_) => return,
            };
            if sender.try_send(kind).is_err() {
                debug!("Dropped {kind:?} event, pipeline is behind");
            }
        })
        .map_err(|e| anyhow!("Input hook failed {e:?}"))
    }
}
