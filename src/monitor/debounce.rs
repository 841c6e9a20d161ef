use chrono::{DateTime, Duration, Utc};

use crate::input_api::InputEventKind;

/// Filters raw events before they reach the session. Key presses and button
/// clicks always count, pointer motion only counts when enough time has
/// passed since the last accepted event, so jitter can't dominate the
/// counter.
pub struct EventDebouncer {
    mouse_move_threshold: Duration,
}

impl EventDebouncer {
    pub fn from_millis(threshold_ms: i64) -> Self {
        Self {
            mouse_move_threshold: Duration::milliseconds(threshold_ms),
        }
    }

    pub fn accepts(
        &self,
        kind: InputEventKind,
        now: DateTime<Utc>,
        last_activity: Option<DateTime<Utc>>,
    ) -> bool {
        match kind {
            InputEventKind::Key | InputEventKind::MouseButton => true,
            InputEventKind::MouseMove => {
                last_activity.map_or(true, |last| now - last > self.mouse_move_threshold)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};

    use crate::input_api::InputEventKind;

    use super::EventDebouncer;

    const TEST_START_DATE: NaiveDateTime =
        NaiveDateTime::new(NaiveDate::from_ymd_opt(2018, 7, 4).unwrap(), NaiveTime::MIN);

    fn start() -> DateTime<Utc> {
        Utc.from_utc_datetime(&TEST_START_DATE)
    }

    #[test]
    fn test_keys_and_buttons_always_accepted() {
        let debouncer = EventDebouncer::from_millis(100);
        let last = Some(start());
        let right_after = start() + Duration::milliseconds(1);

        assert!(debouncer.accepts(InputEventKind::Key, right_after, last));
        assert!(debouncer.accepts(InputEventKind::MouseButton, right_after, last));
        assert!(debouncer.accepts(InputEventKind::Key, start(), None));
    }

    #[test]
    fn test_mouse_move_without_prior_activity_accepted() {
        let debouncer = EventDebouncer::from_millis(100);
        assert!(debouncer.accepts(InputEventKind::MouseMove, start(), None));
    }

    #[test]
    fn test_mouse_move_within_threshold_dropped() {
        let debouncer = EventDebouncer::from_millis(100);
        let last = Some(start());

        assert!(!debouncer.accepts(
            InputEventKind::MouseMove,
            start() + Duration::milliseconds(50),
            last
        ));
        // The boundary itself is still too soon.
        assert!(!debouncer.accepts(
            InputEventKind::MouseMove,
            start() + Duration::milliseconds(100),
            last
        ));
    }

    #[test]
    fn test_mouse_move_past_threshold_accepted() {
        let debouncer = EventDebouncer::from_millis(100);
        let last = Some(start());

        assert!(debouncer.accepts(
            InputEventKind::MouseMove,
            start() + Duration::milliseconds(150),
            last
        ));
    }
}
