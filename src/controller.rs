use std::hash::Hash;

use rustc_hash::FxHashMap;

use crate::action::{GanttAction, GanttEvent};
use crate::config::{ChartMode, ControllerConfig, DEFAULT_ROW_HEIGHT};
use crate::date::{DAY_MS, DateRange, Timestamp};
use crate::height::HeightCache;
use crate::linearize::linearize;
use crate::meta::ItemMeta;
use crate::model::{GanttModel, Traversal, TreeChange};
use crate::signal::SignalDispatcher;
use crate::tree::{GanttTree, NodeId};
use crate::viewport::{Viewport, ViewportAnchor, reconcile};
use crate::visibility::{Connector, ItemRef, PeriodRef, VisibleRows, build_visibility};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[cfg(feature = "keymap")]
use crate::keymap::GanttKeyBindings;
#[cfg(feature = "keymap")]
use crossterm::event::KeyEvent;

/// Pipeline stages, in execution order.
///
/// Invalidating a stage implies every later stage must run as well.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Stage {
    /// Index the tree, parse dates, compute rollups.
    Linearize,
    /// Rebuild the visible rows, height cache, id maps and connectors.
    BuildVisibility,
    /// Fit the viewport anchor to the visible rows.
    Position,
}

/// Position of the viewport relative to the whole content, both ends in `0.0..=1.0`.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScrollRatio {
    pub start: f64,
    pub end: f64,
}

impl ScrollRatio {
    /// The whole content is in view.
    pub const FULL: Self = Self {
        start: 0.0,
        end: 1.0,
    };

    /// Creates a ratio with both ends clamped into `0.0..=1.0`.
    pub fn new(start: f64, end: f64) -> Self {
        Self {
            start: start.clamp(0.0, 1.0),
            end: end.clamp(0.0, 1.0),
        }
    }
}

impl Default for ScrollRatio {
    fn default() -> Self {
        Self::FULL
    }
}

/// Consumer of the visible rows (data grid, timeline).
pub trait RowRenderer<Id> {
    /// Called at the end of every [`GanttController::run`]. `repositioned` is `true`
    /// when the viewport was recomputed during that run.
    fn draw_internal(&mut self, controller: &GanttController<Id>, repositioned: bool);
}

/// Consumer of the scroll position.
pub trait ScrollbarSink {
    fn set_ratio(&mut self, ratio: ScrollRatio);
}

/// Persistable controller state.
///
/// Exactly one of `start_index` and `end_index` is set.
/// With the `serde` feature enabled, this type derives `Serialize`/`Deserialize`.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
#[derive(Clone, Debug, PartialEq)]
pub struct ControllerSnapshot<D> {
    pub is_resource_chart: bool,
    pub tree_data: D,
    pub vertical_offset: f64,
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub start_index: Option<usize>,
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub end_index: Option<usize>,
}

/// Turns a task tree into height-indexed visible rows and a viewport window over them.
///
/// Changes only mark a stage dirty; the work happens in [`run`](Self::run), which
/// executes every stage from the earliest dirty one onwards and then notifies the
/// attached renderers and scrollbar.
pub struct GanttController<Id> {
    config: ControllerConfig,
    available_height: f64,
    anchor: ViewportAnchor,
    viewport: Viewport,
    // Earliest stage that has to run on the next `run`.
    dirty: Option<Stage>,
    position_recalculated: bool,
    metas: FxHashMap<Id, ItemMeta>,
    dates: DateRange,
    rows: VisibleRows<Id>,
    scroll_ratio: ScrollRatio,
    signals: SignalDispatcher,
    data_grid: Option<Box<dyn RowRenderer<Id>>>,
    timeline: Option<Box<dyn RowRenderer<Id>>>,
    scrollbar: Option<Box<dyn ScrollbarSink>>,
    #[cfg(feature = "keymap")]
    keymap: GanttKeyBindings,
}

impl<Id: Copy + Eq + Hash> Default for GanttController<Id> {
    fn default() -> Self {
        Self::new(ControllerConfig::default())
    }
}

impl<Id: Copy + Eq + Hash> GanttController<Id> {
    pub fn new(config: ControllerConfig) -> Self {
        let mut config = config;
        config.default_row_height = sanitize_row_height(config.default_row_height);
        config.row_stroke_thickness = config.row_stroke_thickness.max(0.0);
        Self {
            config,
            available_height: 0.0,
            anchor: ViewportAnchor::default(),
            viewport: Viewport::default(),
            dirty: Some(Stage::Linearize),
            position_recalculated: false,
            metas: FxHashMap::default(),
            dates: DateRange::empty(),
            rows: VisibleRows::default(),
            scroll_ratio: ScrollRatio::FULL,
            signals: SignalDispatcher::new(),
            data_grid: None,
            timeline: None,
            scrollbar: None,
            #[cfg(feature = "keymap")]
            keymap: GanttKeyBindings::new(),
        }
    }

    #[cfg(feature = "keymap")]
    /// Returns a mutable reference to the key binding set.
    pub const fn keymap_mut(&mut self) -> &mut GanttKeyBindings {
        &mut self.keymap
    }

    pub const fn config(&self) -> &ControllerConfig {
        &self.config
    }

    /// Invalidation notifications; install a listener to schedule redraws.
    pub const fn signals_mut(&mut self) -> &mut SignalDispatcher {
        &mut self.signals
    }

    pub const fn signals(&self) -> &SignalDispatcher {
        &self.signals
    }

    /// Marks `stage` (and everything after it) for recomputation.
    pub fn invalidate(&mut self, stage: Stage) {
        self.dirty = Some(self.dirty.map_or(stage, |dirty| dirty.min(stage)));
        self.signals.dispatch(stage);
    }

    /// Earliest stage the next [`run`](Self::run) will execute, if any.
    pub const fn pending_stage(&self) -> Option<Stage> {
        self.dirty
    }

    /// Forwards a change reported by the data layer.
    pub fn notify(&mut self, change: TreeChange) {
        match change {
            TreeChange::Structure => self.invalidate(Stage::Linearize),
            TreeChange::Meta => self.invalidate(Stage::BuildVisibility),
        }
    }

    /// Forgets all computed state; call after replacing the model.
    pub fn reset_data(&mut self) {
        self.metas.clear();
        self.invalidate(Stage::Linearize);
    }

    /// Runs `edit` with notifications suspended so it produces at most one.
    pub fn batch<R>(&mut self, edit: impl FnOnce(&mut Self) -> R) -> R {
        self.signals.suspend();
        let result = edit(self);
        self.signals.resume();
        result
    }

    // ---- viewport contract ----

    /// Pins `index` to the top of the viewport and resets the vertical offset.
    pub fn set_start_index(&mut self, index: usize) -> &mut Self {
        self.anchor = ViewportAnchor::FromStart { index, offset: 0.0 };
        self.invalidate(Stage::Position);
        self
    }

    /// Pins `index` fully visible at the bottom of the viewport.
    pub fn set_end_index(&mut self, index: usize) -> &mut Self {
        self.anchor = ViewportAnchor::FromEnd { index };
        self.invalidate(Stage::Position);
        self
    }

    /// Scrolls the start row up by `offset` pixels. Ignored while pinned to the end.
    pub fn set_vertical_offset(&mut self, offset: f64) -> &mut Self {
        if let ViewportAnchor::FromStart {
            offset: current, ..
        } = &mut self.anchor
            && *current != offset
        {
            *current = offset;
            self.invalidate(Stage::Position);
        }
        self
    }

    pub fn set_available_height(&mut self, height: f64) -> &mut Self {
        let height = height.max(0.0);
        if self.available_height != height {
            self.available_height = height;
            self.invalidate(Stage::Position);
        }
        self
    }

    /// Sets the height of rows without their own; non-positive values restore the default.
    pub fn set_default_row_height(&mut self, height: f64) -> &mut Self {
        let height = sanitize_row_height(height);
        if self.config.default_row_height != height {
            self.config.default_row_height = height;
            self.invalidate(Stage::BuildVisibility);
        }
        self
    }

    pub fn set_row_stroke_thickness(&mut self, thickness: f64) -> &mut Self {
        let thickness = thickness.max(0.0);
        if self.config.row_stroke_thickness != thickness {
            self.config.row_stroke_thickness = thickness;
            self.invalidate(Stage::BuildVisibility);
        }
        self
    }

    pub fn set_mode(&mut self, mode: ChartMode) -> &mut Self {
        if self.config.mode != mode {
            self.config.mode = mode;
            self.invalidate(Stage::Linearize);
        }
        self
    }

    pub fn set_data_grid<R>(&mut self, renderer: R) -> &mut Self
    where
        R: RowRenderer<Id> + 'static,
    {
        self.data_grid = Some(Box::new(renderer));
        self.invalidate(Stage::Position);
        self
    }

    pub fn set_timeline<R>(&mut self, renderer: R) -> &mut Self
    where
        R: RowRenderer<Id> + 'static,
    {
        self.timeline = Some(Box::new(renderer));
        self.invalidate(Stage::Position);
        self
    }

    pub fn set_scrollbar<S>(&mut self, scrollbar: S) -> &mut Self
    where
        S: ScrollbarSink + 'static,
    {
        self.scrollbar = Some(Box::new(scrollbar));
        self.invalidate(Stage::Position);
        self
    }

    // ---- scrolling ----

    /// Scrolls so that the content pixel `px` is at the top of the viewport.
    ///
    /// Offsets beyond the last full page pin the last row to the bottom instead.
    /// Does nothing before the first visibility build or when no row is visible.
    pub fn scroll_to(&mut self, px: f64) {
        if self.rows.is_empty() {
            return;
        }
        let px = px.max(0.0);
        let heights = &self.rows.heights;
        if px > heights.total() - self.available_height {
            let last = heights.len() - 1;
            self.batch(|this| {
                this.set_end_index(last);
            });
            return;
        }
        let index = heights.row_at(px);
        let offset = px - heights.height_before(index);
        self.batch(|this| {
            this.set_start_index(index).set_vertical_offset(offset);
        });
    }

    /// Shows `row` at the top of the viewport.
    pub fn scroll_to_row(&mut self, row: usize) {
        self.set_start_index(row);
    }

    /// Shows `row` (by default the last one) at the bottom of the viewport.
    pub fn scroll_to_end(&mut self, row: Option<usize>) {
        let row = row.unwrap_or_else(|| self.rows.len().saturating_sub(1));
        self.set_end_index(row);
    }

    /// Applies a position reported by the scrollbar.
    pub fn scroll_changed(&mut self, ratio: ScrollRatio) {
        let ratio = ScrollRatio::new(ratio.start, ratio.end);
        if ratio.start == 0.0 {
            self.set_start_index(0);
        } else if ratio.end == 1.0 {
            let past_last = self.rows.len();
            self.set_end_index(past_last);
        } else {
            let heights = &self.rows.heights;
            let start_height = (ratio.start * heights.total()).round();
            let index = heights.row_at(start_height);
            let offset = start_height - heights.height_before(index);
            self.batch(|this| {
                this.set_start_index(index).set_vertical_offset(offset);
            });
        }
    }

    // ---- collapse state ----

    /// Collapses every node with children. Returns how many nodes changed.
    pub fn collapse_all<T: GanttModel<Id = Id>>(&mut self, model: &T) -> usize {
        self.set_all_collapsed(model, true)
    }

    /// Expands every node with children. Returns how many nodes changed.
    pub fn expand_all<T: GanttModel<Id = Id>>(&mut self, model: &T) -> usize {
        self.set_all_collapsed(model, false)
    }

    /// Sets the collapse state of one node with children; returns `true` on change.
    pub fn set_collapsed<T: GanttModel<Id = Id>>(
        &mut self,
        model: &T,
        id: Id,
        collapsed: bool,
    ) -> bool {
        if !model.has_children(id) {
            return false;
        }
        self.ensure_linearized(model);
        let Some(meta) = self.metas.get_mut(&id) else {
            return false;
        };
        if meta.collapsed == collapsed {
            return false;
        }
        meta.collapsed = collapsed;
        self.invalidate(Stage::BuildVisibility);
        true
    }

    /// Flips the collapse state of one node with children; returns `true` on change.
    pub fn toggle_collapsed<T: GanttModel<Id = Id>>(&mut self, model: &T, id: Id) -> bool {
        self.ensure_linearized(model);
        let collapsed = self.metas.get(&id).is_some_and(|meta| meta.collapsed);
        self.set_collapsed(model, id, !collapsed)
    }

    fn set_all_collapsed<T: GanttModel<Id = Id>>(&mut self, model: &T, collapsed: bool) -> usize {
        self.ensure_linearized(model);
        let mut changed = 0;
        let parents = Traversal::new(model).yield_if(|model: &T, id| model.has_children(id));
        for (id, _) in parents {
            if let Some(meta) = self.metas.get_mut(&id)
                && meta.collapsed != collapsed
            {
                meta.collapsed = collapsed;
                changed += 1;
            }
        }
        if changed > 0 {
            self.invalidate(Stage::BuildVisibility);
        }
        tracing::debug!(collapsed, changed, "collapse state applied to all parents");
        changed
    }

    fn ensure_linearized<T: GanttModel<Id = Id>>(&mut self, model: &T) {
        if self.dirty == Some(Stage::Linearize) {
            self.run_linearize(model);
        }
    }

    // ---- pipeline ----

    /// Brings every dirty stage up to date, then notifies renderers and the scrollbar.
    ///
    /// Returns `true` if the viewport was recomputed.
    pub fn run<T: GanttModel<Id = Id>>(&mut self, model: &T) -> bool {
        let _span = tracing::debug_span!("gantt_run", pending = ?self.dirty).entered();

        if self.dirty == Some(Stage::Linearize) {
            self.run_linearize(model);
        }
        if self.dirty == Some(Stage::BuildVisibility) {
            self.rows = build_visibility(model, &self.metas, &self.config);
            self.dirty = Some(Stage::Position);
        }
        if self.dirty == Some(Stage::Position) {
            self.recalculate();
            self.dirty = None;
        }
        if self.dates.widen_degenerate(DAY_MS) {
            tracing::trace!("single-instant date range widened by a day");
        }

        let repositioned = self.position_recalculated;
        self.draw_renderers(repositioned);
        self.push_scroll_ratio();
        self.position_recalculated = false;
        repositioned
    }

    fn run_linearize<T: GanttModel<Id = Id>>(&mut self, model: &T) {
        let linearized = linearize(model, self.config.mode, &self.metas);
        self.metas = linearized.metas;
        self.dates = linearized.dates;
        self.dirty = Some(Stage::BuildVisibility);
    }

    fn recalculate(&mut self) {
        let _span = tracing::debug_span!("reconcile", anchor = ?self.anchor).entered();
        let viewport = reconcile(&self.rows.heights, self.available_height, self.anchor);
        self.viewport = viewport;
        self.anchor = viewport.anchor();
        self.position_recalculated = true;
        tracing::debug!(
            start = viewport.start_index,
            end = viewport.end_index,
            offset = viewport.vertical_offset,
            "viewport reconciled"
        );
    }

    fn draw_renderers(&mut self, repositioned: bool) {
        if let Some(mut grid) = self.data_grid.take() {
            grid.draw_internal(self, repositioned);
            self.data_grid = Some(grid);
        }
        if let Some(mut timeline) = self.timeline.take() {
            timeline.draw_internal(self, repositioned);
            self.timeline = Some(timeline);
        }
    }

    fn push_scroll_ratio(&mut self) {
        let total = self.rows.heights.total();
        self.scroll_ratio = if self.rows.is_empty() || total <= 0.0 {
            ScrollRatio::FULL
        } else {
            let start = self.rows.heights.height_before(self.viewport.start_index)
                + self.viewport.vertical_offset;
            let end = start + self.available_height;
            ScrollRatio::new(round_ratio(start / total), round_ratio(end / total))
        };
        if let Some(scrollbar) = self.scrollbar.as_mut() {
            scrollbar.set_ratio(self.scroll_ratio);
        }
    }

    // ---- outputs ----

    /// First visible row; `None` while an end anchor is waiting to be reconciled.
    pub const fn start_index(&self) -> Option<usize> {
        match self.dirty {
            Some(_) => self.anchor.start_index(),
            None => Some(self.viewport.start_index),
        }
    }

    /// Last visible row; `None` while a start anchor is waiting to be reconciled.
    pub const fn end_index(&self) -> Option<usize> {
        match self.dirty {
            Some(_) => self.anchor.end_index(),
            None => Some(self.viewport.end_index),
        }
    }

    pub const fn vertical_offset(&self) -> f64 {
        match (self.dirty, self.anchor) {
            (Some(_), ViewportAnchor::FromStart { offset, .. }) => offset,
            _ => self.viewport.vertical_offset,
        }
    }

    pub const fn available_height(&self) -> f64 {
        self.available_height
    }

    /// Window computed by the last [`run`](Self::run).
    pub const fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub const fn anchor(&self) -> ViewportAnchor {
        self.anchor
    }

    /// Scroll position pushed to the scrollbar by the last [`run`](Self::run).
    pub const fn scroll_ratio(&self) -> ScrollRatio {
        self.scroll_ratio
    }

    pub const fn is_resources(&self) -> bool {
        self.config.mode.is_resources()
    }

    pub fn visible_items(&self) -> &[Id] {
        &self.rows.items
    }

    pub const fn height_cache(&self) -> &HeightCache {
        &self.rows.heights
    }

    pub fn connectors(&self) -> &[Connector<Id>] {
        &self.rows.connectors
    }

    pub const fn visible_items_map(&self) -> &FxHashMap<String, ItemRef<Id>> {
        &self.rows.items_map
    }

    pub const fn periods_map(&self) -> &FxHashMap<String, PeriodRef<Id>> {
        &self.rows.periods_map
    }

    pub const fn min_date(&self) -> Option<Timestamp> {
        self.dates.min()
    }

    pub const fn max_date(&self) -> Option<Timestamp> {
        self.dates.max()
    }

    /// Computed fields of a node (available after the first linearization).
    pub fn meta(&self, id: Id) -> Option<&ItemMeta> {
        self.metas.get(&id)
    }

    pub fn is_collapsed(&self, id: Id) -> bool {
        self.metas.get(&id).is_some_and(|meta| meta.collapsed)
    }

    /// Height of visible rows `from..=to` (order-independent, clamped).
    pub fn height_between(&self, from: usize, to: usize) -> f64 {
        self.rows.heights.height_between(from, to)
    }

    /// Smallest visible row whose bottom edge is at or below `px`.
    pub fn index_by_height(&self, px: f64) -> usize {
        self.rows.heights.index_by_height(px)
    }

    // ---- persistence ----

    /// Captures mode, anchor and offset together with the caller's tree data.
    pub fn snapshot<D>(&self, tree_data: D) -> ControllerSnapshot<D> {
        let (start_index, end_index) = match self.anchor {
            ViewportAnchor::FromStart { index, .. } => (Some(index), None),
            ViewportAnchor::FromEnd { index } => (None, Some(index)),
        };
        ControllerSnapshot {
            is_resource_chart: self.is_resources(),
            tree_data,
            vertical_offset: self.vertical_offset(),
            start_index,
            end_index,
        }
    }

    /// Re-applies a snapshot and hands its tree data back to the caller.
    ///
    /// All computed state is discarded; the model built from the returned data is
    /// linearized on the next [`run`](Self::run).
    pub fn restore<D>(&mut self, snapshot: ControllerSnapshot<D>) -> D {
        let mode = if snapshot.is_resource_chart {
            ChartMode::Resource
        } else {
            ChartMode::Project
        };
        self.batch(|this| {
            this.set_mode(mode);
            match (snapshot.start_index, snapshot.end_index) {
                (None, Some(end)) => {
                    this.set_end_index(end);
                }
                (start, _) => {
                    this.set_start_index(start.unwrap_or(0))
                        .set_vertical_offset(snapshot.vertical_offset);
                }
            }
            this.reset_data();
        });
        snapshot.tree_data
    }

    // ---- actions ----

    /// Handles a chart action and returns the resulting event.
    pub fn handle_action<T: GanttModel<Id = Id>, C>(
        &mut self,
        model: &T,
        action: GanttAction<C>,
    ) -> GanttEvent<C> {
        match action {
            GanttAction::Custom(_) => GanttEvent::Action(action),
            GanttAction::CollapseAll => handled(self.collapse_all(model) > 0),
            GanttAction::ExpandAll => handled(self.expand_all(model) > 0),
            _ if self.rows.is_empty() => GanttEvent::Unhandled,
            GanttAction::ScrollUp => {
                let Viewport {
                    start_index,
                    vertical_offset,
                    ..
                } = self.viewport;
                if vertical_offset > 0.0 {
                    self.scroll_to_row(start_index);
                } else if start_index > 0 {
                    self.scroll_to_row(start_index - 1);
                } else {
                    return GanttEvent::Unhandled;
                }
                GanttEvent::Handled
            }
            GanttAction::ScrollDown => {
                if self.bottom_edge() >= self.rows.heights.total() {
                    return GanttEvent::Unhandled;
                }
                self.scroll_to_row(self.viewport.start_index + 1);
                GanttEvent::Handled
            }
            GanttAction::PageUp => {
                let top = self.top_edge();
                if top <= 0.0 {
                    return GanttEvent::Unhandled;
                }
                self.scroll_to((top - self.available_height).max(0.0));
                GanttEvent::Handled
            }
            GanttAction::PageDown => {
                self.scroll_to(self.top_edge() + self.available_height);
                GanttEvent::Handled
            }
            GanttAction::ScrollToStart => {
                self.scroll_to_row(0);
                GanttEvent::Handled
            }
            GanttAction::ScrollToEnd => {
                self.scroll_to_end(None);
                GanttEvent::Handled
            }
        }
    }

    #[cfg(feature = "keymap")]
    /// Resolves a key event into an action and handles it.
    pub fn handle_key<T: GanttModel<Id = Id>>(&mut self, model: &T, key: KeyEvent) -> GanttEvent<()> {
        let Some(action) = self.keymap.resolve(key) else {
            return GanttEvent::Unhandled;
        };
        self.handle_action(model, action)
    }

    #[cfg(feature = "keymap")]
    /// Resolves a key event with a custom mapping and handles it.
    pub fn handle_key_with<T, C, F>(&mut self, model: &T, key: KeyEvent, custom: F) -> GanttEvent<C>
    where
        T: GanttModel<Id = Id>,
        F: Fn(KeyEvent) -> Option<C>,
    {
        let Some(action) = self.keymap.resolve_with(key, custom) else {
            return GanttEvent::Unhandled;
        };
        self.handle_action(model, action)
    }

    fn top_edge(&self) -> f64 {
        self.rows.heights.height_before(self.viewport.start_index) + self.viewport.vertical_offset
    }

    fn bottom_edge(&self) -> f64 {
        self.top_edge() + self.available_height
    }
}

impl GanttController<NodeId> {
    /// Forwards the changes accumulated by `tree` since the previous call.
    pub fn sync(&mut self, tree: &mut GanttTree) {
        if let Some(change) = tree.take_changes() {
            self.notify(change);
        }
    }
}

const fn handled<C>(changed: bool) -> GanttEvent<C> {
    if changed {
        GanttEvent::Handled
    } else {
        GanttEvent::Unhandled
    }
}

fn sanitize_row_height(height: f64) -> f64 {
    if height > 0.0 && height.is_finite() {
        height
    } else {
        DEFAULT_ROW_HEIGHT
    }
}

fn round_ratio(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}
