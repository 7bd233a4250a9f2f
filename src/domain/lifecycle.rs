//! Temporal state of an event relative to a point in time.
//!
//! Every place that reports whether an event is upcoming, running or over
//! goes through [`classify`], so "happening now" has exactly one definition.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Derived lifecycle tag. Never persisted; recomputed on every read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Lifecycle {
    Upcoming,
    Happening,
    Past,
}

impl Lifecycle {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Upcoming => "upcoming",
            Self::Happening => "happening",
            Self::Past => "past",
        }
    }
}

impl fmt::Display for Lifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Classifies an event given the current instant.
///
/// * `Past` when an end instant exists and lies strictly before `now`.
/// * `Happening` when the event has started and has not yet ended
///   (an event without an end instant stays happening once started).
/// * `Upcoming` otherwise.
#[must_use]
pub fn classify(
    now: DateTime<Utc>,
    starts_at: DateTime<Utc>,
    ends_at: Option<DateTime<Utc>>,
) -> Lifecycle {
    if let Some(end) = ends_at
        && end < now
    {
        return Lifecycle::Past;
    }

    if starts_at <= now {
        Lifecycle::Happening
    } else {
        Lifecycle::Upcoming
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 14, 18, 0, 0).unwrap()
    }

    #[test]
    fn test_open_ended_event_boundaries() {
        let start = t0();
        let second = Duration::seconds(1);

        assert_eq!(classify(start - second, start, None), Lifecycle::Upcoming);
        assert_eq!(classify(start, start, None), Lifecycle::Happening);
        assert_eq!(classify(start + second, start, None), Lifecycle::Happening);
        assert_eq!(
            classify(start + Duration::days(365), start, None),
            Lifecycle::Happening
        );
    }

    #[test]
    fn test_bounded_event_boundaries() {
        let start = t0();
        let end = start + Duration::hours(2);
        let second = Duration::seconds(1);

        assert_eq!(classify(start - second, start, Some(end)), Lifecycle::Upcoming);
        assert_eq!(classify(start, start, Some(end)), Lifecycle::Happening);
        assert_eq!(classify(end, start, Some(end)), Lifecycle::Happening);
        assert_eq!(classify(end + second, start, Some(end)), Lifecycle::Past);
    }

    #[test]
    fn test_end_before_start_is_past_once_end_has_elapsed() {
        let start = t0();
        let end = start - Duration::hours(1);

        assert_eq!(classify(start, start, Some(end)), Lifecycle::Past);
    }

    #[test]
    fn test_serializes_lowercase() {
        let json = serde_json::to_string(&Lifecycle::Happening).unwrap();
        assert_eq!(json, "\"happening\"");
        assert_eq!(Lifecycle::Past.to_string(), "past");
    }
}
