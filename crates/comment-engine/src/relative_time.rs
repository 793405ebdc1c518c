use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

/// Days after which a timestamp is shown as a plain date.
const DATE_AFTER_DAYS: i64 = 7;

/// Coarse age of a comment or reply as shown next to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "unit", content = "value", rename_all = "snake_case")]
pub enum RelativeAge {
    JustNow,
    Hours(i64),
    Days(i64),
    Date(NaiveDate),
}

pub fn relative_age(created_at: DateTime<Utc>, now: DateTime<Utc>) -> RelativeAge {
    let elapsed = now.signed_duration_since(created_at);
    let days = elapsed.num_days();
    let hours = elapsed.num_hours();
    if days > DATE_AFTER_DAYS {
        RelativeAge::Date(created_at.date_naive())
    } else if days > 0 {
        RelativeAge::Days(days)
    } else if hours > 0 {
        RelativeAge::Hours(hours)
    } else {
        RelativeAge::JustNow
    }
}

impl std::fmt::Display for RelativeAge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RelativeAge::JustNow => f.write_str("just now"),
            RelativeAge::Hours(hours) => write!(f, "{}h ago", hours),
            RelativeAge::Days(days) => write!(f, "{}d ago", days),
            RelativeAge::Date(date) => write!(f, "{}", date.format("%Y-%m-%d")),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 20, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_buckets() {
        let now = now();
        assert_eq!(relative_age(now - Duration::minutes(59), now), RelativeAge::JustNow);
        assert_eq!(relative_age(now - Duration::hours(3), now), RelativeAge::Hours(3));
        assert_eq!(relative_age(now - Duration::hours(23), now), RelativeAge::Hours(23));
        assert_eq!(relative_age(now - Duration::days(2), now), RelativeAge::Days(2));
        assert_eq!(relative_age(now - Duration::days(7), now), RelativeAge::Days(7));
        assert_eq!(
            relative_age(now - Duration::days(8), now),
            RelativeAge::Date(NaiveDate::from_ymd_opt(2026, 1, 12).unwrap())
        );
    }

    #[test]
    fn test_future_timestamp_is_just_now() {
        let now = now();
        assert_eq!(relative_age(now + Duration::hours(5), now), RelativeAge::JustNow);
    }

    #[test]
    fn test_labels() {
        let now = now();
        assert_eq!(relative_age(now, now).to_string(), "just now");
        assert_eq!(relative_age(now - Duration::hours(3), now).to_string(), "3h ago");
        assert_eq!(relative_age(now - Duration::days(2), now).to_string(), "2d ago");
        assert_eq!(
            relative_age(now - Duration::days(30), now).to_string(),
            "2025-12-21"
        );
    }
}
