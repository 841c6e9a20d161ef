use std::{path::PathBuf, sync::Arc, thread};

use anyhow::Result;
use chrono::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::error;

use crate::{
    input_api::{GenericInputSource, InputEventKind, InputSource},
    utils::{
        clock::{Clock, DefaultClock},
        time::format_hms,
    },
};

use alert::{AlertPolicy, SystemAlertSink};
use debounce::EventDebouncer;
use logger::{ActivityLogger, FileActivityLogger, LogEvent};
use pipeline::EventPipeline;
use render::ProgressRenderer;
use session::ActivitySession;

pub mod alert;
pub mod debounce;
pub mod logger;
pub mod pipeline;
pub mod render;
pub mod session;
pub mod shutdown;

const EVENT_CHANNEL_CAPACITY: usize = 64;
const MOUSE_MOVE_DEBOUNCE_MS: i64 = 100;

pub struct MonitorConfig {
    pub time_limit: Duration,
    pub policy: AlertPolicy,
    pub log_interval: Duration,
    pub activity_log: PathBuf,
}

/// Represents the starting point for the monitor.
pub async fn start_monitor(config: MonitorConfig) -> Result<()> {
    let clock = DefaultClock;
    let session = Arc::new(ActivitySession::new(
        config.time_limit,
        config.policy,
        config.log_interval,
        clock.time(),
    ));

    let (sender, receiver) = mpsc::channel::<InputEventKind>(EVENT_CHANNEL_CAPACITY);
    let shutdown_token = CancellationToken::new();

    let source = GenericInputSource::new()?;
    spawn_input_source(Box::new(source), sender, &shutdown_token);

    print_banner(&config);

    let mut logger = FileActivityLogger::new(config.activity_log.clone());
    if let Err(e) = logger
        .record(&session.snapshot(), LogEvent::SessionStarted, clock.time())
        .await
    {
        error!("Failed to append the session start record {e:?}");
    }

    let pipeline = EventPipeline::new(
        receiver,
        session.clone(),
        EventDebouncer::from_millis(MOUSE_MOVE_DEBOUNCE_MS),
        logger,
        SystemAlertSink,
        shutdown_token.clone(),
        Box::new(DefaultClock),
    );
    let renderer = ProgressRenderer::new(session.clone(), Box::new(DefaultClock));

    let (_, pipeline_result, renderer_result) = tokio::join!(
        shutdown::detect_shutdown(shutdown_token, session.clone()),
        pipeline.run(),
        renderer.run(),
    );

    if let Err(pipeline_result) = pipeline_result {
        error!("Event pipeline got an error {:?}", pipeline_result);
    }

    if let Err(renderer_result) = renderer_result {
        error!("Renderer got an error {:?}", renderer_result);
    }

    Ok(())
}

/// The hook listener owns a blocking OS thread for the lifetime of the
/// process. The hook cannot be unregistered, so the thread is detached and
/// merely stops forwarding once the token flips. A tokio blocking task here
/// would keep runtime shutdown waiting on it forever.
fn spawn_input_source(
    source: Box<dyn InputSource>,
    sender: mpsc::Sender<InputEventKind>,
    shutdown: &CancellationToken,
) {
    let shutdown = shutdown.clone();
    thread::spawn(move || {
        if let Err(e) = source.run(sender, shutdown) {
            error!("Input source got an error {:?}", e);
        }
    });
}

fn print_banner(config: &MonitorConfig) {
    println!(
        "Starting input monitoring. Time limit: {}",
        format_hms(config.time_limit)
    );
    println!("Logging activity to: {}", config.activity_log.display());
    println!("* indicates active input");
    println!(
        "Alert will sound {} times when the time limit is reached",
        config.policy.max_alerts()
    );
    println!(
        "Activity log updated every {} seconds",
        config.log_interval.num_seconds()
    );
}

#[cfg(test)]
mod monitor_tests {
    use std::{
        sync::{Arc, Mutex},
        time::Duration as StdDuration,
    };

    use anyhow::Result;
    use async_trait::async_trait;
    use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
    use tempfile::tempdir;
    use tokio::sync::mpsc;
    use tokio_util::sync::CancellationToken;

    use crate::{
        input_api::InputEventKind,
        monitor::{
            alert::{AlertPolicy, MockAlertSink},
            debounce::EventDebouncer,
            logger::{ActivityLogger, FileActivityLogger, LogEvent},
            pipeline::EventPipeline,
            render::ProgressRenderer,
            session::ActivitySession,
        },
        utils::{clock::Clock, logging::TEST_LOGGING},
    };

    const TEST_START_DATE: NaiveDateTime =
        NaiveDateTime::new(NaiveDate::from_ymd_opt(2018, 7, 4).unwrap(), NaiveTime::MIN);

    /// Clock stepped manually by the test driver, so event timestamps stay
    /// deterministic regardless of scheduling.
    #[derive(Clone)]
    struct StepClock {
        now: Arc<Mutex<DateTime<Utc>>>,
    }

    impl StepClock {
        fn new(start: DateTime<Utc>) -> Self {
            Self {
                now: Arc::new(Mutex::new(start)),
            }
        }

        fn set(&self, moment: DateTime<Utc>) {
            *self.now.lock().unwrap() = moment;
        }
    }

    #[async_trait]
    impl Clock for StepClock {
        fn time(&self) -> DateTime<Utc> {
            *self.now.lock().unwrap()
        }

        async fn sleep(&self, duration: StdDuration) {
            tokio::time::sleep(duration).await;
        }
    }

    /// End-to-end run of the pipeline and renderer against a stepped clock.
    /// Keyboard events 100ms apart exhaust a 300ms budget, the escalating
    /// policy plays its five alerts and the whole monitor winds down.
    #[tokio::test]
    async fn smoke_test_monitor() -> Result<()> {
        *TEST_LOGGING;
        let start = Utc.from_utc_datetime(&TEST_START_DATE);
        let clock = StepClock::new(start);

        let session = Arc::new(ActivitySession::new(
            Duration::milliseconds(300),
            AlertPolicy::Escalating { max_alerts: 5 },
            Duration::seconds(2),
            start,
        ));

        let (sender, receiver) = mpsc::channel::<InputEventKind>(10);
        let shutdown_token = CancellationToken::new();

        let dir = tempdir()?;
        let log_path = dir.path().join("activity.log");
        let mut logger = FileActivityLogger::new(log_path.clone());
        logger
            .record(&session.snapshot(), LogEvent::SessionStarted, start)
            .await?;

        let mut alert_sink = MockAlertSink::new();
        alert_sink.expect_alert().times(5).return_const(());

        let pipeline = EventPipeline::new(
            receiver,
            session.clone(),
            EventDebouncer::from_millis(100),
            logger,
            alert_sink,
            shutdown_token.clone(),
            Box::new(clock.clone()),
        );
        let renderer = ProgressRenderer::new(session.clone(), Box::new(clock.clone()));

        let driver = async {
            for step in 1..=20i64 {
                let moment = start + Duration::milliseconds(100 * step);
                clock.set(moment);
                if sender.send(InputEventKind::Key).await.is_err() {
                    break;
                }
                // Wait for the pipeline to drain the event, otherwise the next
                // step would move the clock under an unprocessed one.
                while session.snapshot().running && session.last_activity() != Some(moment) {
                    tokio::time::sleep(StdDuration::from_millis(1)).await;
                }
                if !session.snapshot().running {
                    break;
                }
            }
        };

        let (_, pipeline_result, renderer_result) =
            tokio::join!(driver, pipeline.run(), renderer.run());
        pipeline_result?;
        renderer_result?;

        let snapshot = session.snapshot();
        assert!(!snapshot.running);
        assert_eq!(snapshot.alert_count, 5);
        // Budget breached at the fourth event, alerts ran through the eighth.
        assert_eq!(snapshot.total_active_time, Duration::milliseconds(700));

        let contents = tokio::fs::read_to_string(&log_path).await?;
        assert!(contents.contains("Session Started"));
        assert!(contents.contains("Time Limit Alert"));
        assert!(contents.contains("Session Ended - Time Limit Reached"));
        Ok(())
    }

    /// Pointer jitter between two polls must not reach the session, while a
    /// spaced-out movement must.
    #[tokio::test]
    async fn test_pipeline_debounces_mouse_movement() -> Result<()> {
        *TEST_LOGGING;
        let start = Utc.from_utc_datetime(&TEST_START_DATE);
        let clock = StepClock::new(start);

        let session = Arc::new(ActivitySession::new(
            Duration::minutes(5),
            AlertPolicy::Escalating { max_alerts: 5 },
            Duration::seconds(2),
            start,
        ));

        let (sender, receiver) = mpsc::channel::<InputEventKind>(10);
        let shutdown_token = CancellationToken::new();

        let dir = tempdir()?;
        let logger = FileActivityLogger::new(dir.path().join("activity.log"));

        let mut alert_sink = MockAlertSink::new();
        alert_sink.expect_alert().never();

        let pipeline = EventPipeline::new(
            receiver,
            session.clone(),
            EventDebouncer::from_millis(100),
            logger,
            alert_sink,
            shutdown_token.clone(),
            Box::new(clock.clone()),
        );

        let driver = async {
            let steps = [
                (0, InputEventKind::MouseMove, true),
                // 50ms later, inside the debounce window.
                (50, InputEventKind::MouseMove, false),
                // 150ms after the first accepted movement.
                (150, InputEventKind::MouseMove, true),
            ];
            for (offset, kind, accepted) in steps {
                let moment = start + Duration::milliseconds(offset);
                clock.set(moment);
                sender.send(kind).await.unwrap();
                if accepted {
                    while session.last_activity() != Some(moment) {
                        tokio::time::sleep(StdDuration::from_millis(1)).await;
                    }
                }
            }
            // Let the dropped event drain before shutting down.
            tokio::time::sleep(StdDuration::from_millis(20)).await;
            shutdown_token.cancel();
        };

        let (_, pipeline_result) = tokio::join!(driver, pipeline.run());
        pipeline_result?;

        let snapshot = session.snapshot();
        // Only the gap between the two accepted movements is credited.
        assert_eq!(snapshot.total_active_time, Duration::milliseconds(150));
        assert_eq!(
            snapshot.last_activity,
            Some(start + Duration::milliseconds(150))
        );
        Ok(())
    }
}
