//! Resolution of the timestamp shapes a document store may hand back.
//!
//! Records written by older clients carry native `{seconds, nanoseconds}`
//! timestamps, ISO strings or epoch milliseconds. Everything resolves to a
//! `DateTime<Utc>` so posts can be ordered; unresolvable values sort as the
//! oldest instant.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StoreTimestamp {
    Native {
        #[serde(alias = "_seconds")]
        seconds: i64,
        #[serde(alias = "_nanoseconds", default)]
        nanoseconds: u32,
    },
    Text(String),
    Millis(i64),
    Missing,
    /// Any other JSON value. Fractional numbers are read as epoch millis.
    Other(serde_json::Value),
}

impl Default for StoreTimestamp {
    fn default() -> Self {
        Self::Missing
    }
}

impl From<DateTime<Utc>> for StoreTimestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        Self::Text(dt.to_rfc3339_opts(SecondsFormat::Millis, true))
    }
}

impl StoreTimestamp {
    pub fn now() -> Self {
        Utc::now().into()
    }

    /// Resolve to a comparable instant, if the value can be understood.
    pub fn resolve(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Native {
                seconds,
                nanoseconds,
            } => Utc.timestamp_opt(*seconds, *nanoseconds).single(),
            Self::Text(s) => parse_text(s),
            Self::Millis(ms) => Utc.timestamp_millis_opt(*ms).single(),
            Self::Missing => None,
            Self::Other(value) => value
                .as_f64()
                .filter(|ms| ms.is_finite())
                .and_then(|ms| Utc.timestamp_millis_opt(ms as i64).single()),
        }
    }

    /// Instant used for ordering.
    pub fn instant(&self) -> DateTime<Utc> {
        self.resolve().unwrap_or(DateTime::<Utc>::MIN_UTC)
    }
}

fn parse_text(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Human distance between `then` and `now`, e.g. "5 minutes ago".
pub fn format_relative(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let delta = now.signed_duration_since(then);
    let future = delta.num_seconds() < 0;
    let secs = delta.num_seconds().unsigned_abs();
    let minutes = (secs as f64 / 60.0).round() as u64;

    let distance = if secs < 30 {
        "less than a minute".to_string()
    } else if secs < 90 {
        "1 minute".to_string()
    } else if minutes < 45 {
        format!("{minutes} minutes")
    } else if minutes < 90 {
        "about 1 hour".to_string()
    } else if minutes < 24 * 60 {
        format!("about {} hours", (minutes as f64 / 60.0).round() as u64)
    } else if minutes < 42 * 60 {
        "1 day".to_string()
    } else if minutes < 30 * 24 * 60 {
        format!("{} days", (minutes as f64 / (24.0 * 60.0)).round() as u64)
    } else if minutes < 45 * 24 * 60 {
        "about 1 month".to_string()
    } else if minutes < 60 * 24 * 60 {
        "about 2 months".to_string()
    } else if minutes < 365 * 24 * 60 {
        format!("{} months", minutes / (30 * 24 * 60))
    } else {
        match minutes / (365 * 24 * 60) {
            1 => "about 1 year".to_string(),
            years => format!("about {years} years"),
        }
    };

    if future {
        format!("in {distance}")
    } else {
        format!("{distance} ago")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn resolves_every_shape_to_the_same_instant() {
        let expected = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();

        let native: StoreTimestamp =
            serde_json::from_str(r#"{"seconds": 1709294400, "nanoseconds": 0}"#).unwrap();
        let underscored: StoreTimestamp =
            serde_json::from_str(r#"{"_seconds": 1709294400, "_nanoseconds": 0}"#).unwrap();
        let text: StoreTimestamp = serde_json::from_str(r#""2024-03-01T12:00:00.000Z""#).unwrap();
        let naive: StoreTimestamp = serde_json::from_str(r#""2024-03-01T12:00:00""#).unwrap();
        let millis: StoreTimestamp = serde_json::from_str("1709294400000").unwrap();

        for ts in [native, underscored, text, naive, millis] {
            assert_eq!(ts.resolve(), Some(expected), "{ts:?}");
        }
    }

    #[test]
    fn null_and_garbage_sort_oldest() {
        let null: StoreTimestamp = serde_json::from_str("null").unwrap();
        assert_eq!(null, StoreTimestamp::Missing);
        assert_eq!(null.instant(), DateTime::<Utc>::MIN_UTC);

        let garbage = StoreTimestamp::Text("yesterday-ish".into());
        assert!(garbage.resolve().is_none());
        assert_eq!(garbage.instant(), DateTime::<Utc>::MIN_UTC);
    }

    #[test]
    fn unexpected_shapes_still_decode() {
        let float: StoreTimestamp = serde_json::from_str("1.7e12").unwrap();
        assert_eq!(float.resolve(), Utc.timestamp_millis_opt(1_700_000_000_000).single());

        for raw in ["{}", "true", "[1, 2]", r#"{"seconds": "soon"}"#] {
            let ts: StoreTimestamp = serde_json::from_str(raw).unwrap();
            assert!(matches!(ts, StoreTimestamp::Other(_)), "{raw}");
            assert_eq!(ts.instant(), DateTime::<Utc>::MIN_UTC, "{raw}");
        }
    }

    #[test]
    fn written_timestamps_round_trip() {
        let now = Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap();
        let ts = StoreTimestamp::from(now);
        assert_eq!(ts, StoreTimestamp::Text("2025-01-02T03:04:05.000Z".into()));
        assert_eq!(ts.resolve(), Some(now));
    }

    #[test]
    fn relative_formatting() {
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        assert_eq!(
            format_relative(now - Duration::seconds(10), now),
            "less than a minute ago"
        );
        assert_eq!(format_relative(now - Duration::minutes(5), now), "5 minutes ago");
        assert_eq!(format_relative(now - Duration::minutes(60), now), "about 1 hour ago");
        assert_eq!(format_relative(now - Duration::hours(5), now), "about 5 hours ago");
        assert_eq!(format_relative(now - Duration::hours(30), now), "1 day ago");
        assert_eq!(format_relative(now - Duration::days(3), now), "3 days ago");
        assert_eq!(format_relative(now - Duration::days(400), now), "about 1 year ago");
        assert_eq!(format_relative(now + Duration::minutes(5), now), "in 5 minutes");
    }
}
