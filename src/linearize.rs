//! Linearization: depth-first indexing, date parsing and parent rollups.

use rustc_hash::{FxBuildHasher, FxHashMap};

use crate::config::ChartMode;
use crate::date::{DateRange, HALF_DAY_MS, Timestamp, parse_field};
use crate::meta::{ItemMeta, PeriodMeta};
use crate::model::GanttModel;

/// Output of a linearization pass.
#[derive(Clone, Debug)]
pub struct Linearized<Id> {
    pub metas: FxHashMap<Id, ItemMeta>,
    pub dates: DateRange,
}

impl<Id> Default for Linearized<Id> {
    fn default() -> Self {
        Self {
            metas: FxHashMap::default(),
            dates: DateRange::empty(),
        }
    }
}

// What a parent needs to know about a child to roll it up.
#[derive(Clone, Copy)]
struct Summary {
    start: Option<Timestamp>,
    end: Option<Timestamp>,
    progress: f64,
}

struct Linearizer<'a, T: GanttModel> {
    model: &'a T,
    mode: ChartMode,
    previous: &'a FxHashMap<T::Id, ItemMeta>,
    metas: FxHashMap<T::Id, ItemMeta>,
    dates: DateRange,
    next_index: usize,
}

/// Walks the whole model and computes an [`ItemMeta`] for every node.
///
/// `previous` holds the metadata of the prior pass; the collapse state of nodes whose
/// `collapsed` field is unset is carried over from it. A pass never fails: malformed
/// dates become `None` and are left out of the range and the rollups. If every parsed
/// timestamp is the same instant, the range is widened by 12 hours on both sides.
pub fn linearize<T: GanttModel>(
    model: &T,
    mode: ChartMode,
    previous: &FxHashMap<T::Id, ItemMeta>,
) -> Linearized<T::Id> {
    let _span = tracing::debug_span!("linearize", ?mode).entered();

    let capacity = model.size_hint().max(previous.len());
    let mut pass = Linearizer {
        model,
        mode,
        previous,
        metas: FxHashMap::with_capacity_and_hasher(capacity, FxBuildHasher),
        dates: DateRange::empty(),
        next_index: 0,
    };
    for &root in model.roots() {
        pass.visit(root, 0);
    }

    let mut dates = pass.dates;
    if dates.widen_degenerate(HALF_DAY_MS) {
        tracing::trace!("single-instant date range widened");
    }
    tracing::debug!(
        nodes = pass.metas.len(),
        min_date = ?dates.min(),
        max_date = ?dates.max(),
        "tree linearized"
    );
    Linearized {
        metas: pass.metas,
        dates,
    }
}

impl<T: GanttModel> Linearizer<'_, T> {
    fn visit(&mut self, id: T::Id, depth: usize) -> Summary {
        let task = self.model.task(id);
        let collapsed = task.collapsed.unwrap_or_else(|| {
            self.previous
                .get(&id)
                .is_some_and(|previous| previous.collapsed)
        });
        let mut meta = ItemMeta {
            depth,
            index: self.next_index,
            collapsed,
            ..ItemMeta::default()
        };
        self.next_index += 1;

        self.parse_dates(id, &mut meta);
        if self.mode.is_resources() {
            self.parse_periods(id, &mut meta);
        }
        self.parse_markers(id, &mut meta);

        let children = self.model.children(id);
        if !children.is_empty() {
            let mut result_start = meta.actual_start;
            let mut result_end = meta.actual_end;
            let mut progress_length = 0.0;
            let mut total_length = 0.0;

            for &child in children {
                let summary = self.visit(child, depth + 1);
                if self.mode.is_resources() {
                    continue;
                }

                let (Some(child_start), Some(child_end)) = (summary.start, summary.end) else {
                    result_start = result_start.or(summary.start);
                    result_end = result_end.or(summary.end);
                    continue;
                };
                result_start = Some(result_start.map_or(child_start, |current| {
                    current.min(child_start).min(child_end)
                }));
                result_end = Some(result_end.map_or(child_end, |current| {
                    current.max(child_start).max(child_end)
                }));

                // In f64: the difference of two extreme timestamps does not fit an i64.
                #[allow(clippy::cast_precision_loss)]
                let delta = child_end as f64 - child_start as f64;
                progress_length += summary.progress * delta;
                total_length += delta;
            }

            if !self.mode.is_resources() {
                if total_length != 0.0 {
                    meta.auto_progress = Some(progress_length / total_length);
                }
                meta.auto_start = result_start;
                meta.auto_end = result_end;
            }
        }

        let summary = Summary {
            start: meta.effective_start(),
            end: meta.effective_end(),
            progress: task
                .progress()
                .or(meta.auto_progress)
                .unwrap_or_default(),
        };
        self.metas.insert(id, meta);
        summary
    }

    fn parse_dates(&mut self, id: T::Id, meta: &mut ItemMeta) {
        let task = self.model.task(id);
        meta.actual_start = parse_field(task.actual_start.as_ref());
        meta.actual_end = parse_field(task.actual_end.as_ref());
        meta.baseline_start = parse_field(task.baseline_start.as_ref());
        meta.baseline_end = parse_field(task.baseline_end.as_ref());
        for ts in [
            meta.actual_start,
            meta.actual_end,
            meta.baseline_start,
            meta.baseline_end,
        ] {
            self.dates.extend(ts);
        }
    }

    fn parse_periods(&mut self, id: T::Id, meta: &mut ItemMeta) {
        let periods = &self.model.task(id).periods;
        meta.periods.reserve(periods.len());
        let mut period_range = DateRange::empty();
        for period in periods {
            let parsed = PeriodMeta {
                start: parse_field(period.start.as_ref()),
                end: parse_field(period.end.as_ref()),
            };
            // Half-open periods are kept in the table but do not extend any range.
            if parsed.start.is_some() && parsed.end.is_some() {
                for ts in [parsed.start, parsed.end] {
                    period_range.extend(ts);
                    self.dates.extend(ts);
                }
            }
            meta.periods.push(parsed);
        }
        meta.min_period_date = period_range.min();
        meta.max_period_date = period_range.max();
    }

    fn parse_markers(&mut self, id: T::Id, meta: &mut ItemMeta) {
        let markers = &self.model.task(id).markers;
        meta.markers.reserve(markers.len());
        for marker in markers {
            let value = parse_field(marker.value.as_ref());
            self.dates.extend(value);
            meta.markers.push(value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::date::DAY_MS;
    use crate::model::tests::TestForest;
    use crate::task::{Marker, Period, Task};

    fn run(forest: &TestForest, mode: ChartMode) -> Linearized<usize> {
        linearize(forest, mode, &FxHashMap::default())
    }

    #[test]
    fn assigns_pre_order_index_and_depth() {
        let forest = TestForest::from_parents(vec![
            (None, Task::new("a")),
            (Some(0), Task::new("a.1")),
            (Some(1), Task::new("a.1.1")),
            (Some(0), Task::new("a.2")),
            (None, Task::new("b")),
        ]);
        let result = run(&forest, ChartMode::Project);
        let indexed: Vec<_> = (0..5)
            .map(|id| (result.metas[&id].index, result.metas[&id].depth))
            .collect();
        assert_eq!(indexed, vec![(0, 0), (1, 1), (2, 2), (3, 1), (4, 0)]);
    }

    #[test]
    fn rolls_up_dates_and_weighted_progress() {
        let forest = TestForest::from_parents(vec![
            (None, Task::new("parent")),
            (Some(0), Task::new("a").with_actual(0, 100).with_progress("50%")),
            (Some(0), Task::new("b").with_actual(100, 300).with_progress(0.0)),
        ]);
        let result = run(&forest, ChartMode::Project);
        let parent = &result.metas[&0];
        assert_eq!(parent.auto_start, Some(0));
        assert_eq!(parent.auto_end, Some(300));
        let progress = parent.auto_progress.unwrap();
        assert!((progress - 50.0 / 300.0).abs() < 1e-9);
        assert_eq!((result.dates.min(), result.dates.max()), (Some(0), Some(300)));
    }

    #[test]
    fn nested_rollups_propagate_through_levels() {
        let forest = TestForest::from_parents(vec![
            (None, Task::new("top")),
            (Some(0), Task::new("mid")),
            (Some(1), Task::new("leaf").with_actual(DAY_MS, 3 * DAY_MS)),
            (Some(0), Task::new("sibling").with_actual(0, DAY_MS).with_progress(1.0)),
        ]);
        let result = run(&forest, ChartMode::Project);
        assert_eq!(result.metas[&1].auto_start, Some(DAY_MS));
        assert_eq!(result.metas[&1].auto_progress, Some(0.0));
        let top = &result.metas[&0];
        assert_eq!((top.auto_start, top.auto_end), (Some(0), Some(3 * DAY_MS)));
        let progress = top.auto_progress.unwrap();
        assert!((progress - 1.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn malformed_dates_are_skipped_without_aborting() {
        let forest = TestForest::from_parents(vec![
            (None, Task::new("parent")),
            (Some(0), Task::new("bad").with_actual("soon", "later")),
            (Some(0), Task::new("good").with_actual("1970-01-02", "1970-01-03")),
        ]);
        let result = run(&forest, ChartMode::Project);
        assert_eq!(result.metas[&1].actual_start, None);
        assert_eq!(result.metas[&0].auto_start, Some(DAY_MS));
        assert_eq!(result.metas[&0].auto_end, Some(2 * DAY_MS));
        assert_eq!(result.metas.len(), 3);
    }

    #[test]
    fn single_instant_range_is_widened_by_half_day() {
        let t = 10 * DAY_MS;
        let forest = TestForest::from_parents(vec![
            (None, Task::new("a").with_actual(t, t)),
            (None, Task::new("b").with_actual(t, t)),
        ]);
        let result = run(&forest, ChartMode::Project);
        assert_eq!(result.dates.min(), Some(t - HALF_DAY_MS));
        assert_eq!(result.dates.max(), Some(t + HALF_DAY_MS));
    }

    #[test]
    fn extreme_timestamps_roll_up_without_overflow() {
        let forest = TestForest::from_parents(vec![
            (None, Task::new("parent")),
            (Some(0), Task::new("wide").with_actual(-9.0e18, 9.0e18).with_progress(0.5)),
        ]);
        let result = run(&forest, ChartMode::Project);
        let parent = &result.metas[&0];
        assert_eq!(parent.auto_start, Some(-9_000_000_000_000_000_000));
        assert_eq!(parent.auto_end, Some(9_000_000_000_000_000_000));
        assert_eq!(parent.auto_progress, Some(0.5));

        let forest = TestForest::from_parents(vec![(None, Task::new("far").with_actual(1.0e300, 1.0e300))]);
        let result = run(&forest, ChartMode::Project);
        assert_eq!(result.dates.max(), Some(Timestamp::MAX));
        assert_eq!(result.dates.min(), Some(Timestamp::MAX - HALF_DAY_MS));
    }

    #[test]
    fn resource_mode_indexes_periods_without_rollups() {
        let forest = TestForest::from_parents(vec![
            (None, Task::new("team")),
            (
                Some(0),
                Task::new("alice")
                    .with_period(Period::new(200, 300))
                    .with_period(Period::new(50, "garbage"))
                    .with_period(Period::new(400, 100)),
            ),
        ]);
        let result = run(&forest, ChartMode::Resource);
        let alice = &result.metas[&1];
        assert_eq!(alice.periods.len(), 3);
        assert_eq!(alice.periods[1], PeriodMeta { start: Some(50), end: None });
        assert_eq!((alice.min_period_date, alice.max_period_date), (Some(100), Some(400)));
        assert_eq!(result.metas[&0].auto_start, None);
        assert_eq!((result.dates.min(), result.dates.max()), (Some(100), Some(400)));
    }

    #[test]
    fn markers_extend_the_range() {
        let forest = TestForest::from_parents(vec![(
            None,
            Task::new("a")
                .with_actual(100, 200)
                .with_marker(Marker::at(500))
                .with_marker(Marker::at("nope")),
        )]);
        let result = run(&forest, ChartMode::Project);
        assert_eq!(result.metas[&0].markers, vec![Some(500), None]);
        assert_eq!(result.dates.max(), Some(500));
    }

    #[test]
    fn collapse_state_follows_field_then_previous_pass() {
        let forest = TestForest::from_parents(vec![
            (None, Task::new("forced").collapsed(false)),
            (Some(0), Task::new("child")),
            (None, Task::new("free")),
            (Some(2), Task::new("child")),
        ]);
        let mut previous = FxHashMap::default();
        for id in [0, 2] {
            previous.insert(
                id,
                ItemMeta {
                    collapsed: true,
                    ..ItemMeta::default()
                },
            );
        }
        let result = linearize(&forest, ChartMode::Project, &previous);
        assert!(!result.metas[&0].collapsed);
        assert!(result.metas[&2].collapsed);
    }
}
