use std::{fmt::Display, future::Future, path::PathBuf};

use anyhow::Result;
use chrono::{DateTime, Utc};
use fs4::tokio::AsyncFileExt;
use tokio::io::AsyncWriteExt;

use crate::utils::time::format_hms;

use super::session::SessionSnapshot;

/// Label attached to every durable activity record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogEvent {
    SessionStarted,
    RegularUpdate,
    TimeLimitAlert,
    SessionEnded,
}

impl Display for LogEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogEvent::SessionStarted => write!(f, "Session Started"),
            LogEvent::RegularUpdate => write!(f, "Regular Update"),
            LogEvent::TimeLimitAlert => write!(f, "Time Limit Alert"),
            LogEvent::SessionEnded => write!(f, "Session Ended - Time Limit Reached"),
        }
    }
}

/// Represents a sink for durable activity records. Abstracts over the local
/// file so tests can capture records in memory.
pub trait ActivityLogger: Send {
    fn record(
        &mut self,
        snapshot: &SessionSnapshot,
        event: LogEvent,
        now: DateTime<Utc>,
    ) -> impl Future<Output = Result<()>> + Send;
}

/// Renders one append-only text record.
pub fn format_record(snapshot: &SessionSnapshot, event: LogEvent, now: DateTime<Utc>) -> String {
    format!(
        "[{}] - {}\n\
        \x20 Session Duration: {}\n\
        \x20 Total Active Time: {}\n\
        \x20 Time Limit: {}\n\
        \x20 Remaining Time: {}\n\
        \x20 Activity Rate: {}\n\
        \x20 Alerts Played: {}/{}\n\
        \x20 Status: {}\n\
        {}\n",
        now.format("%Y-%m-%d %H:%M:%S%.3f"),
        event,
        format_hms(snapshot.session_duration(now)),
        format_hms(snapshot.total_active_time),
        format_hms(snapshot.time_limit),
        format_hms(snapshot.remaining()),
        snapshot.activity_rate(now),
        snapshot.alert_count,
        snapshot.max_alerts,
        snapshot.status(),
        "=".repeat(50),
    )
}

/// Appends records to a local log file. The file is opened per record and
/// held under an exclusive lock for the duration of the append, so records
/// from overlapping runs never interleave.
pub struct FileActivityLogger {
    path: PathBuf,
}

impl FileActivityLogger {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    async fn append(&self, record: String) -> Result<()> {
        let mut file = tokio::fs::OpenOptions::new()
            .append(true)
            .create(true)
            .open(&self.path)
            .await?;

        // Semi-safe acquire-release for a file
        file.lock_exclusive()?;
        let result = async {
            file.write_all(record.as_bytes()).await?;
            file.flush().await?;
            Ok(())
        }
        .await;
        file.unlock_async().await?;
        result
    }
}

impl ActivityLogger for FileActivityLogger {
    async fn record(
        &mut self,
        snapshot: &SessionSnapshot,
        event: LogEvent,
        now: DateTime<Utc>,
    ) -> Result<()> {
        self.append(format_record(snapshot, event, now)).await
    }
}
