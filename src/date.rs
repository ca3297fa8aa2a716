//! Date-like value parsing and the min/max accumulator used while linearizing.

use chrono::{DateTime, NaiveDate, NaiveDateTime};

use crate::error::DateParseError;
use crate::task::RawValue;

/// Milliseconds since the Unix epoch.
pub type Timestamp = i64;

/// Milliseconds in 12 hours.
pub const HALF_DAY_MS: Timestamp = 43_200_000;
/// Milliseconds in one day.
pub const DAY_MS: Timestamp = 86_400_000;

const DATE_TIME_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// Parses a date-like value into a UTC millisecond timestamp.
///
/// Numbers are taken as timestamps. Strings may hold an integer timestamp, an RFC 3339
/// date-time, a naive `YYYY-MM-DD[ HH:MM[:SS]]` date-time (read as UTC) or a bare date.
pub fn parse_timestamp(value: &RawValue) -> Result<Timestamp, DateParseError> {
    match value {
        RawValue::Number(number) => {
            if number.is_finite() {
                #[allow(clippy::cast_possible_truncation)]
                Ok(number.round() as Timestamp)
            } else {
                Err(DateParseError::NonFinite)
            }
        }
        RawValue::Text(text) => parse_date_str(text),
        RawValue::Bool(_) => Err(DateParseError::Unrecognized(value.to_string())),
    }
}

fn parse_date_str(text: &str) -> Result<Timestamp, DateParseError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(DateParseError::Empty);
    }
    if let Ok(ts) = text.parse::<Timestamp>() {
        return Ok(ts);
    }
    if let Ok(date_time) = DateTime::parse_from_rfc3339(text) {
        return Ok(date_time.timestamp_millis());
    }
    for format in DATE_TIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Ok(naive.and_utc().timestamp_millis());
        }
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc().timestamp_millis())
        .ok_or_else(|| DateParseError::Unrecognized(text.to_owned()))
}

/// Parses an optional field, treating failures as "missing".
pub(crate) fn parse_field(value: Option<&RawValue>) -> Option<Timestamp> {
    let value = value?;
    match parse_timestamp(value) {
        Ok(ts) => Some(ts),
        Err(err) => {
            tracing::trace!(%err, "date field ignored");
            None
        }
    }
}

/// Running min/max over every timestamp seen during a pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DateRange {
    bounds: Option<(Timestamp, Timestamp)>,
}

impl DateRange {
    pub const fn empty() -> Self {
        Self { bounds: None }
    }

    pub const fn new(min: Timestamp, max: Timestamp) -> Self {
        Self {
            bounds: Some((min, max)),
        }
    }

    /// Extends the range with `ts`; `None` is ignored.
    pub fn extend(&mut self, ts: Option<Timestamp>) {
        let Some(ts) = ts else {
            return;
        };
        self.bounds = Some(match self.bounds {
            Some((min, max)) => (min.min(ts), max.max(ts)),
            None => (ts, ts),
        });
    }

    pub const fn min(&self) -> Option<Timestamp> {
        match self.bounds {
            Some((min, _)) => Some(min),
            None => None,
        }
    }

    pub const fn max(&self) -> Option<Timestamp> {
        match self.bounds {
            Some((_, max)) => Some(max),
            None => None,
        }
    }

    pub const fn is_empty(&self) -> bool {
        self.bounds.is_none()
    }

    /// Returns `true` if the range collapsed to a single instant.
    pub const fn is_degenerate(&self) -> bool {
        matches!(self.bounds, Some((min, max)) if min == max)
    }

    /// Widens a single-instant range by `interval` on each side, saturating at the
    /// bounds of [`Timestamp`].
    ///
    /// Returns `true` if the range was widened.
    pub fn widen_degenerate(&mut self, interval: Timestamp) -> bool {
        if let Some((min, max)) = self.bounds
            && min == max
        {
            self.bounds = Some((min.saturating_sub(interval), max.saturating_add(interval)));
            return true;
        }
        false
    }
}
