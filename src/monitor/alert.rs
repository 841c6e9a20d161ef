use std::{
    io::Write,
    process::{Command, Stdio},
};

use tracing::warn;

/// Decides what happens once the active-time counter reaches the limit.
/// Both variants go through the same evaluation path, the policy is plain
/// configuration rather than a forked code path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertPolicy {
    /// Play an alert on every breaching update until `max_alerts` have
    /// sounded, then end the session.
    Escalating { max_alerts: u32 },
    /// End the session on the first breaching update, with a single alert.
    Immediate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertDecision {
    Alert,
    AlertAndStop,
}

impl AlertPolicy {
    pub const DEFAULT_MAX_ALERTS: u32 = 5;

    /// Upper bound for the alert counter, used for `n/max` reporting.
    pub fn max_alerts(&self) -> u32 {
        match self {
            AlertPolicy::Escalating { max_alerts } => *max_alerts,
            AlertPolicy::Immediate => 1,
        }
    }

    /// Decides what a breaching update does, given how many alerts have
    /// already sounded. The caller increments the counter either way.
    pub fn evaluate(&self, alert_count: u32) -> AlertDecision {
        match self {
            AlertPolicy::Escalating { max_alerts } if alert_count + 1 < *max_alerts => {
                AlertDecision::Alert
            }
            _ => AlertDecision::AlertAndStop,
        }
    }
}

/// Contract for the alert side channel.
#[cfg_attr(test, mockall::automock)]
pub trait AlertSink: Send {
    fn alert(&mut self);
}

const ALERT_SOUND: &str = "/usr/share/sounds/freedesktop/stereo/complete.oga";

/// Plays the desktop completion sound, falling back to the terminal bell. A
/// missed alert must never end the session, so every failure is swallowed.
pub struct SystemAlertSink;

impl AlertSink for SystemAlertSink {
    #[allow(clippy::zombie_processes)]
    fn alert(&mut self) {
        let spawned = Command::new("paplay")
            .arg(ALERT_SOUND)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn();

        if let Err(e) = spawned {
            warn!("Failed to play alert sound, falling back to bell {e:?}");
            print!("\x07");
            let _ = std::io::stdout().flush();
        }
    }
}
