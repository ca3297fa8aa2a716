use crate::date::Timestamp;

/// Parsed bounds of one period of a resource row.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PeriodMeta {
    pub start: Option<Timestamp>,
    pub end: Option<Timestamp>,
}

/// Values computed for a node by the controller.
///
/// The task fields stay the source of truth; everything here is derived from them
/// during linearization, except `collapsed`, which can also be toggled at runtime.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ItemMeta {
    /// Nesting level, `0` for top-level rows.
    pub depth: usize,
    /// Position in the full (collapse-independent) pre-order walk.
    pub index: usize,
    pub collapsed: bool,
    pub actual_start: Option<Timestamp>,
    pub actual_end: Option<Timestamp>,
    pub baseline_start: Option<Timestamp>,
    pub baseline_end: Option<Timestamp>,
    /// Rolled up from children (project mode, parents only).
    pub auto_start: Option<Timestamp>,
    pub auto_end: Option<Timestamp>,
    /// Duration-weighted child progress in `0.0..=1.0` (project mode, parents only).
    pub auto_progress: Option<f64>,
    /// One entry per period, parallel to [`Task::periods`](crate::Task::periods).
    pub periods: Vec<PeriodMeta>,
    pub min_period_date: Option<Timestamp>,
    pub max_period_date: Option<Timestamp>,
    /// One entry per marker, parallel to [`Task::markers`](crate::Task::markers).
    pub markers: Vec<Option<Timestamp>>,
}

impl ItemMeta {
    /// Start used for drawing and rollups: the actual start, else the rolled-up one.
    pub fn effective_start(&self) -> Option<Timestamp> {
        self.actual_start.or(self.auto_start)
    }

    /// End used for drawing and rollups: the actual end, else the rolled-up one,
    /// else the effective start (a milestone).
    pub fn effective_end(&self) -> Option<Timestamp> {
        self.actual_end
            .or(self.auto_end)
            .or_else(|| self.effective_start())
    }

    /// Returns `true` if the row renders as a single point in time.
    pub fn is_milestone(&self) -> bool {
        matches!(
            (self.effective_start(), self.effective_end()),
            (Some(start), Some(end)) if start == end
        )
    }
}
