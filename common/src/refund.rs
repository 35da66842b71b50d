use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Refund window used when no configuration has ever been recorded.
pub const DEFAULT_REFUND_WINDOW_DAYS: i64 = 14;

/// One version of the refund policy. Passed by value to whatever needs it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefundConfiguration {
    #[serde(rename = "refund_window_secs", with = "duration_secs")]
    pub refund_window: Duration,
    #[serde(default)]
    pub changed_at: Option<DateTime<Utc>>,
}

impl Default for RefundConfiguration {
    fn default() -> Self {
        Self {
            refund_window: Duration::days(DEFAULT_REFUND_WINDOW_DAYS),
            changed_at: None,
        }
    }
}

impl RefundConfiguration {
    pub fn with_window(refund_window: Duration) -> Self {
        Self {
            refund_window,
            changed_at: None,
        }
    }
}

/// Every recorded refund policy change. The newest entry is the current one.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RefundConfigurationHistory {
    entries: Vec<RefundConfiguration>,
}

impl RefundConfigurationHistory {
    pub fn record(&mut self, config: RefundConfiguration) {
        self.entries.push(config);
    }

    /// Snapshot of the effective policy: latest `changed_at`, ties going to the
    /// later record. Falls back to the default window.
    pub fn current(&self) -> RefundConfiguration {
        self.entries
            .iter()
            .enumerate()
            .max_by_key(|(idx, c)| (c.changed_at, *idx))
            .map(|(_, c)| c.clone())
            .unwrap_or_default()
    }
}

/// Last instant a refund is allowed: the window opens at the later of the
/// purchase and the course start.
pub fn refund_window_end(
    date_placed: DateTime<Utc>,
    course_start: Option<DateTime<Utc>>,
    refund_window: Duration,
) -> DateTime<Utc> {
    let base = match course_start {
        Some(start) if start > date_placed => start,
        _ => date_placed,
    };
    base.checked_add_signed(refund_window)
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

mod duration_secs {
    use chrono::Duration;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(value.num_seconds())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = i64::deserialize(deserializer)?;
        Duration::try_seconds(secs)
            .ok_or_else(|| serde::de::Error::custom(format!("refund window of {secs}s is out of range")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_later_course_start_opens_the_window() {
        let now = Utc::now();
        let end = refund_window_end(
            now + Duration::days(1),
            Some(now + Duration::days(2)),
            Duration::days(14),
        );
        assert_eq!(end, now + Duration::days(2) + Duration::days(14));
    }

    #[test]
    fn test_later_purchase_opens_the_window() {
        let now = Utc::now();
        let end = refund_window_end(
            now + Duration::days(2),
            Some(now + Duration::days(1)),
            Duration::days(1),
        );
        assert_eq!(end, now + Duration::days(3));
    }

    #[test]
    fn test_missing_course_start_uses_purchase_date() {
        let now = Utc::now();
        assert_eq!(
            refund_window_end(now, None, Duration::days(14)),
            now + Duration::days(14)
        );
    }

    #[test]
    fn test_overflow_saturates() {
        let end = refund_window_end(DateTime::<Utc>::MAX_UTC, None, Duration::days(1));
        assert_eq!(end, DateTime::<Utc>::MAX_UTC);
    }

    #[test]
    fn test_history_current_is_latest_change() {
        let now = Utc::now();
        let mut history = RefundConfigurationHistory::default();
        assert_eq!(history.current(), RefundConfiguration::default());

        history.record(RefundConfiguration {
            refund_window: Duration::days(30),
            changed_at: Some(now),
        });
        history.record(RefundConfiguration {
            refund_window: Duration::days(7),
            changed_at: Some(now - Duration::days(3)),
        });
        assert_eq!(history.current().refund_window, Duration::days(30));

        history.record(RefundConfiguration {
            refund_window: Duration::days(10),
            changed_at: Some(now),
        });
        assert_eq!(history.current().refund_window, Duration::days(10));
    }

    #[test]
    fn test_configuration_wire_format() {
        let config = RefundConfiguration::with_window(Duration::days(1));
        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["refund_window_secs"], 86_400);
        let back: RefundConfiguration = serde_json::from_value(json).unwrap();
        assert_eq!(back, config);
    }

    proptest! {
        #[test]
        fn window_end_is_later_base_plus_window(
            order_offset in -10_000_000i64..10_000_000,
            start_offset in -10_000_000i64..10_000_000,
            window_secs in 0i64..100_000_000,
        ) {
            let anchor = DateTime::<Utc>::from_timestamp(1_600_000_000, 0).unwrap();
            let placed = anchor + Duration::seconds(order_offset);
            let start = anchor + Duration::seconds(start_offset);
            let window = Duration::seconds(window_secs);

            let end = refund_window_end(placed, Some(start), window);
            prop_assert_eq!(end, placed.max(start) + window);
            prop_assert!(end >= placed && end >= start);
        }
    }
}
