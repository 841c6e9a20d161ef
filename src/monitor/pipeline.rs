use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Utc};
use tokio::sync::mpsc::Receiver;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

use crate::{
    input_api::InputEventKind,
    utils::{clock::Clock, time::format_hms},
};

use super::{
    alert::AlertSink,
    debounce::EventDebouncer,
    logger::{ActivityLogger, LogEvent},
    session::{ActivitySession, UpdateOutcome},
};

/// Drives the event side of the monitor. Receives raw events, stamps and
/// debounces them, applies them to the session and dispatches whatever side
/// effects the update decided on. Side-effect failures are logged and
/// swallowed, only the alert policy or a shutdown ends the run.
pub struct EventPipeline<L, A> {
    receiver: Receiver<InputEventKind>,
    session: Arc<ActivitySession>,
    debouncer: EventDebouncer,
    logger: L,
    alerts: A,
    shutdown: CancellationToken,
    clock: Box<dyn Clock>,
}

impl<L: ActivityLogger, A: AlertSink> EventPipeline<L, A> {
    pub fn new(
        receiver: Receiver<InputEventKind>,
        session: Arc<ActivitySession>,
        debouncer: EventDebouncer,
        logger: L,
        alerts: A,
        shutdown: CancellationToken,
        clock: Box<dyn Clock>,
    ) -> Self {
        Self {
            receiver,
            session,
            debouncer,
            logger,
            alerts,
            shutdown,
            clock,
        }
    }

    /// Executes the pipeline event loop.
    pub async fn run(mut self) -> Result<()> {
        loop {
            let kind = tokio::select! {
                _ = self.shutdown.cancelled() => break,
                event = self.receiver.recv() => match event {
                    Some(kind) => kind,
                    None => break,
                },
            };

            let now = self.clock.time();
            if !self.debouncer.accepts(kind, now, self.session.last_activity()) {
                debug!("Dropped {kind:?} event inside the debounce window");
                continue;
            }

            let outcome = self.session.update(now);
            self.dispatch(outcome, now).await;
        }

        self.receiver.close();
        Ok(())
    }

    async fn dispatch(&mut self, outcome: UpdateOutcome, now: DateTime<Utc>) {
        if outcome.alert {
            self.alerts.alert();
            self.log(LogEvent::TimeLimitAlert, now).await;
        }

        if outcome.ended {
            self.log(LogEvent::SessionEnded, now).await;
            let suffix = if self.session.snapshot().max_alerts > 1 {
                " (Alert limit reached)"
            } else {
                ""
            };
            println!(
                "\nTime limit of {} reached!{suffix}",
                format_hms(self.session.time_limit())
            );
            self.shutdown.cancel();
        }

        if outcome.periodic_log {
            self.log(LogEvent::RegularUpdate, now).await;
        }
    }

    async fn log(&mut self, event: LogEvent, now: DateTime<Utc>) {
        let snapshot = self.session.snapshot();
        if let Err(e) = self.logger.record(&snapshot, event, now).await {
            error!("Failed to append '{event}' activity record {e:?}");
        }
    }
}
