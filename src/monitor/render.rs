use std::{io::Write, sync::Arc, time::Duration as StdDuration};

use ansi_term::Colour;
use anyhow::Result;
use chrono::Duration;

use crate::utils::{clock::Clock, time::format_hms};

use super::session::{ActivitySession, SessionSnapshot};

pub const BAR_WIDTH: usize = 40;
const RENDER_INTERVAL: StdDuration = StdDuration::from_millis(100);

/// Redraws a single in-place progress line on a fixed cadence until the
/// session ends or the budget runs out. The renderer is the only consumer of
/// the activity edge flag, one tick of input between two polls is guaranteed
/// to show up as one active marker.
pub struct ProgressRenderer {
    session: Arc<ActivitySession>,
    clock: Box<dyn Clock>,
}

impl ProgressRenderer {
    pub fn new(session: Arc<ActivitySession>, clock: Box<dyn Clock>) -> Self {
        Self { session, clock }
    }

    pub async fn run(self) -> Result<()> {
        let mut stdout = std::io::stdout();
        loop {
            let snapshot = self.session.observe();
            if !snapshot.running || snapshot.remaining() <= Duration::zero() {
                break;
            }

            write!(stdout, "\r{}", progress_line(&snapshot, BAR_WIDTH))?;
            stdout.flush()?;

            self.clock.sleep(RENDER_INTERVAL).await;
        }
        Ok(())
    }
}

/// Builds the progress line for one snapshot. The filled part of the bar
/// turns red once the budget is spent.
pub fn progress_line(snapshot: &SessionSnapshot, width: usize) -> String {
    let filled = (width as f64 * snapshot.progress()) as usize;
    let colour = if snapshot.remaining() <= Duration::zero() {
        Colour::Red
    } else {
        Colour::Green
    };
    let bar = format!(
        "{}{}",
        colour.paint("=".repeat(filled)),
        "-".repeat(width - filled)
    );

    let marker = if snapshot.is_active { "*" } else { " " };
    let alert_info = if snapshot.alert_count > 0 {
        format!(" (Alerts: {}/{})", snapshot.alert_count, snapshot.max_alerts)
    } else {
        String::new()
    };

    format!(
        "[{bar}] {marker} {}/{} (Remaining: {}){alert_info}",
        format_hms(snapshot.total_active_time),
        format_hms(snapshot.time_limit),
        format_hms(snapshot.remaining()),
    )
}
