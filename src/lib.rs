//! Gantt chart data controller and timeline widget for ratatui.
//!
//! The [`GanttController`] turns a task forest ([`GanttModel`]) into per-row metadata,
//! a flat list of visible rows with cumulative heights, and a viewport window over it.
//! [`GanttView`] renders that state as a data grid next to a time scale.
//!
//! Feature flags:
//! - `keymap`: crossterm-based key bindings and `GanttController::handle_key*` helpers.
//! - `serde`: serde support for task data, [`ControllerConfig`] and [`ControllerSnapshot`].

mod action;
mod columns;
mod config;
mod context;
mod controller;
mod date;
mod error;
mod glyphs;
mod height;
#[cfg(feature = "keymap")]
mod keymap;
mod linearize;
mod meta;
mod model;
pub mod prelude;
mod scale;
mod signal;
mod style;
mod task;
mod tree;
mod viewport;
mod visibility;
mod widget;

pub use action::{GanttAction, GanttEvent};
pub use columns::{
    ColumnDef, ColumnFn, ColumnWidth, GanttColumns, GridColumns, distribute_widths, end_cell,
    progress_cell, start_cell,
};
pub use config::{ChartMode, ControllerConfig, DEFAULT_ROW_HEIGHT, DEFAULT_ROW_STROKE_THICKNESS};
pub use context::RowContext;
pub use controller::{
    ControllerSnapshot, GanttController, RowRenderer, ScrollRatio, ScrollbarSink, Stage,
};
pub use date::{DAY_MS, DateRange, HALF_DAY_MS, Timestamp, parse_timestamp};
pub use error::{DateParseError, TreeError};
pub use glyphs::{GanttGlyphs, GanttLabelRenderer, TaskNameLabel, gantt_label_line};
pub use height::HeightCache;
#[cfg(feature = "keymap")]
pub use keymap::{GanttKeyBindings, KeymapProfile};
pub use linearize::{Linearized, linearize};
pub use meta::{ItemMeta, PeriodMeta};
pub use model::{GanttModel, Traversal, TreeChange};
pub use scale::{TimeScale, format_timestamp};
pub use signal::SignalDispatcher;
pub use style::GanttViewStyle;
pub use task::{
    ConnectorFields, ConnectorKind, ConnectorLink, ConnectorSpec, ConnectorStyle, Marker, Period,
    RawValue, Task,
};
pub use tree::{GanttTree, NodeId, TaskNode};
pub use viewport::{Viewport, ViewportAnchor, reconcile};
pub use visibility::{
    Connector, ConnectorEnd, ConnectorTarget, ItemRef, PeriodRef, VisibleRows, build_visibility,
};
pub use widget::GanttView;
