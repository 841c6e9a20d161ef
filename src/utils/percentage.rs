use std::{fmt::Display, ops::Deref};

use chrono::Duration;

#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Percentage(f64);

impl Display for Percentage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.1}%", self.0)
    }
}

impl Percentage {
    pub fn new_opt(value: f64) -> Option<Percentage> {
        if value < 0. {
            None
        } else {
            Some(Percentage(value))
        }
    }
}

impl Deref for Percentage {
    type Target = f64;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Share of `value` in `whole`. The denominator is floored at 1 second so a
/// rate computed right after session start doesn't divide by zero.
pub fn duration_percentage(value: Duration, whole: Duration) -> Percentage {
    let whole_seconds = whole.num_seconds().max(1);
    Percentage::new_opt(value.num_seconds().max(0) as f64 / whole_seconds as f64 * 100.)
        .expect("Percentage should always be at least 0")
}
