use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};

use crate::utils::percentage::{duration_percentage, Percentage};

use super::alert::{AlertDecision, AlertPolicy};

/// Maximum gap between two accepted events that still counts as continuous
/// activity. Anything longer is an idle stretch and contributes nothing.
const ACTIVITY_MERGE_GAP: Duration = Duration::seconds(1);

/// The authoritative record of a monitoring run. All mutable fields live
/// behind a single lock, the event pipeline and the renderer only ever see
/// consistent copies.
pub struct ActivitySession {
    start_time: DateTime<Utc>,
    time_limit: Duration,
    policy: AlertPolicy,
    log_interval: Duration,
    state: Mutex<SessionState>,
}

struct SessionState {
    last_activity: Option<DateTime<Utc>>,
    total_active_time: Duration,
    is_active: bool,
    running: bool,
    alert_count: u32,
    last_log_time: DateTime<Utc>,
}

/// What a single update decided. Side effects are dispatched by the caller
/// after the session lock is released.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateOutcome {
    pub alert: bool,
    pub ended: bool,
    pub periodic_log: bool,
}

/// Consistent copy of the session fields, safe to hold across I/O.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub start_time: DateTime<Utc>,
    pub last_activity: Option<DateTime<Utc>>,
    pub total_active_time: Duration,
    pub time_limit: Duration,
    pub is_active: bool,
    pub running: bool,
    pub alert_count: u32,
    pub max_alerts: u32,
}

impl ActivitySession {
    pub fn new(
        time_limit: Duration,
        policy: AlertPolicy,
        log_interval: Duration,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            start_time: now,
            time_limit,
            policy,
            log_interval,
            state: Mutex::new(SessionState {
                last_activity: None,
                total_active_time: Duration::zero(),
                is_active: false,
                running: true,
                alert_count: 0,
                last_log_time: now,
            }),
        }
    }

    /// Registers an accepted event at `now`. The first event only anchors
    /// `last_activity`, later events credit the gap since the previous one
    /// when it is short enough to count as continuous activity. Evaluates
    /// the alert policy and the periodic-log schedule in the same critical
    /// section. No-op once the session has ended.
    pub fn update(&self, now: DateTime<Utc>) -> UpdateOutcome {
        let mut state = self.state.lock().unwrap();
        let mut outcome = UpdateOutcome::default();

        if !state.running {
            return outcome;
        }

        if let Some(last) = state.last_activity {
            let gap = now - last;
            // A regressing clock credits nothing.
            if gap >= Duration::zero() && gap <= ACTIVITY_MERGE_GAP {
                state.total_active_time += gap;
            }
        }
        state.last_activity = Some(now);
        state.is_active = true;

        if state.total_active_time >= self.time_limit {
            match self.policy.evaluate(state.alert_count) {
                AlertDecision::Alert => {
                    state.alert_count += 1;
                    outcome.alert = true;
                }
                AlertDecision::AlertAndStop => {
                    state.alert_count += 1;
                    state.running = false;
                    outcome.alert = true;
                    outcome.ended = true;
                }
            }
        }

        if now - state.last_log_time >= self.log_interval {
            state.last_log_time = now;
            outcome.periodic_log = true;
        }

        outcome
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let state = self.state.lock().unwrap();
        self.copy_fields(&state)
    }

    /// Snapshot for the renderer. Clears the activity flag in the same
    /// critical section, so the flag is an edge consumed exactly once per
    /// poll and a burst between two polls still shows as one active tick.
    pub fn observe(&self) -> SessionSnapshot {
        let mut state = self.state.lock().unwrap();
        let snapshot = self.copy_fields(&state);
        state.is_active = false;
        snapshot
    }

    pub fn last_activity(&self) -> Option<DateTime<Utc>> {
        self.state.lock().unwrap().last_activity
    }

    /// Ends the session. Idempotent.
    pub fn stop(&self) {
        self.state.lock().unwrap().running = false;
    }

    pub fn time_limit(&self) -> Duration {
        self.time_limit
    }

    fn copy_fields(&self, state: &SessionState) -> SessionSnapshot {
        SessionSnapshot {
            start_time: self.start_time,
            last_activity: state.last_activity,
            total_active_time: state.total_active_time,
            time_limit: self.time_limit,
            is_active: state.is_active,
            running: state.running,
            alert_count: state.alert_count,
            max_alerts: self.policy.max_alerts(),
        }
    }
}

impl SessionSnapshot {
    /// Time left in the budget, clamped to zero.
    pub fn remaining(&self) -> Duration {
        (self.time_limit - self.total_active_time).max(Duration::zero())
    }

    /// Share of the budget spent, clamped to [0, 1]. A zero limit counts as
    /// fully spent.
    pub fn progress(&self) -> f64 {
        if self.time_limit <= Duration::zero() {
            return 1.;
        }
        let ratio = self.total_active_time.num_milliseconds() as f64
            / self.time_limit.num_milliseconds() as f64;
        ratio.clamp(0., 1.)
    }

    pub fn session_duration(&self, now: DateTime<Utc>) -> Duration {
        (now - self.start_time).max(Duration::zero())
    }

    pub fn activity_rate(&self, now: DateTime<Utc>) -> Percentage {
        duration_percentage(self.total_active_time, self.session_duration(now))
    }

    pub fn status(&self) -> &'static str {
        if self.remaining() <= Duration::zero() {
            "Time Limit Reached"
        } else {
            "Active"
        }
    }
}
