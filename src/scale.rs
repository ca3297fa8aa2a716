//! Mapping between timestamps and timeline columns.

use chrono::DateTime;

use crate::date::{DAY_MS, Timestamp};

/// Linear time axis spanning `width` terminal columns.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimeScale {
    min: Timestamp,
    max: Timestamp,
    width: u16,
}

impl TimeScale {
    /// Returns `None` for an empty axis (`max <= min` or zero width).
    pub const fn new(min: Timestamp, max: Timestamp, width: u16) -> Option<Self> {
        if max <= min || width == 0 {
            return None;
        }
        Some(Self { min, max, width })
    }

    /// Builds a scale from optional bounds, as reported by the controller.
    pub fn from_bounds(min: Option<Timestamp>, max: Option<Timestamp>, width: u16) -> Option<Self> {
        Self::new(min?, max?, width)
    }

    pub const fn min(&self) -> Timestamp {
        self.min
    }

    pub const fn max(&self) -> Timestamp {
        self.max
    }

    pub const fn width(&self) -> u16 {
        self.width
    }

    /// Column of `ts`, or `None` when it lies outside the axis.
    pub fn column(&self, ts: Timestamp) -> Option<u16> {
        (self.min..=self.max)
            .contains(&ts)
            .then(|| self.clamped_column(ts))
    }

    /// Column of `ts`, clamped to the axis.
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    pub fn clamped_column(&self, ts: Timestamp) -> u16 {
        let ts = ts.clamp(self.min, self.max);
        let fraction = (ts as f64 - self.min as f64) / self.span_ms();
        (fraction * f64::from(self.width - 1)).round() as u16
    }

    /// Columns covered by `start..=end` (in either order), or `None` if the interval
    /// does not intersect the axis.
    pub fn span(&self, start: Timestamp, end: Timestamp) -> Option<(u16, u16)> {
        let (start, end) = if start > end { (end, start) } else { (start, end) };
        if end < self.min || start > self.max {
            return None;
        }
        Some((self.clamped_column(start), self.clamped_column(end)))
    }

    /// Timestamp at the left edge of `column`.
    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    pub fn timestamp_at(&self, column: u16) -> Timestamp {
        let column = column.min(self.width - 1);
        let steps = f64::from(self.width - 1).max(1.0);
        let fraction = f64::from(column) / steps;
        let ts = (self.min as f64 + self.span_ms() * fraction).round() as Timestamp;
        ts.clamp(self.min, self.max)
    }

    // Axis length in f64; `max - min` may not fit an i64.
    #[allow(clippy::cast_precision_loss)]
    fn span_ms(&self) -> f64 {
        self.max as f64 - self.min as f64
    }

    /// Tick positions every `spacing` columns, starting at column `0`.
    pub fn ticks(&self, spacing: u16) -> impl Iterator<Item = (u16, Timestamp)> + '_ {
        (0..self.width)
            .step_by(usize::from(spacing.max(1)))
            .map(|column| (column, self.timestamp_at(column)))
    }

    /// Tick label format suited to the span of the axis.
    pub const fn tick_format(&self) -> &'static str {
        let span = self.max.saturating_sub(self.min);
        if span <= 2 * DAY_MS {
            "%H:%M"
        } else if span <= 180 * DAY_MS {
            "%m-%d"
        } else {
            "%Y-%m"
        }
    }

    /// Formats `ts` with [`tick_format`](Self::tick_format).
    pub fn format(&self, ts: Timestamp) -> String {
        format_timestamp(ts, self.tick_format())
    }
}

/// Formats a UTC millisecond timestamp; out-of-range values render as `"?"`.
pub fn format_timestamp(ts: Timestamp, format: &str) -> String {
    DateTime::from_timestamp_millis(ts)
        .map_or_else(|| "?".to_owned(), |date| date.format(format).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_axis_is_rejected() {
        assert_eq!(TimeScale::new(10, 10, 80), None);
        assert_eq!(TimeScale::new(0, 10, 0), None);
        assert_eq!(TimeScale::from_bounds(None, Some(10), 80), None);
    }

    #[test]
    fn maps_timestamps_to_columns() {
        let scale = TimeScale::new(0, 100, 11).unwrap();
        assert_eq!(scale.column(0), Some(0));
        assert_eq!(scale.column(50), Some(5));
        assert_eq!(scale.column(100), Some(10));
        assert_eq!(scale.column(101), None);
        assert_eq!(scale.clamped_column(-5), 0);
        assert_eq!(scale.timestamp_at(5), 50);
    }

    #[test]
    fn spans_are_clamped_and_ordered() {
        let scale = TimeScale::new(0, 100, 11).unwrap();
        assert_eq!(scale.span(30, 10), Some((1, 3)));
        assert_eq!(scale.span(-50, 500), Some((0, 10)));
        assert_eq!(scale.span(200, 300), None);
    }

    #[test]
    fn full_timestamp_range_maps_without_overflow() {
        let scale = TimeScale::new(Timestamp::MIN, Timestamp::MAX, 11).unwrap();
        assert_eq!(scale.column(Timestamp::MIN), Some(0));
        assert_eq!(scale.column(0), Some(5));
        assert_eq!(scale.column(Timestamp::MAX), Some(10));
        assert_eq!(scale.timestamp_at(10), Timestamp::MAX);
        assert_eq!(scale.tick_format(), "%Y-%m");
        assert_eq!(scale.format(Timestamp::MAX), "?");
    }

    #[test]
    fn tick_format_follows_span() {
        let hours = TimeScale::new(0, DAY_MS, 40).unwrap();
        assert_eq!(hours.format(DAY_MS / 2), "12:00");
        let days = TimeScale::new(0, 30 * DAY_MS, 40).unwrap();
        assert_eq!(days.format(DAY_MS), "01-02");
        let months = TimeScale::new(0, 400 * DAY_MS, 40).unwrap();
        assert_eq!(months.format(0), "1970-01");
        let ticks: Vec<_> = days.ticks(20).map(|(column, _)| column).collect();
        assert_eq!(ticks, vec![0, 20]);
    }
}
