pub use crate::{
    ChartMode, ColumnDef, ColumnWidth, ControllerConfig, ControllerSnapshot, GanttAction,
    GanttColumns, GanttController, GanttEvent, GanttGlyphs, GanttLabelRenderer, GanttModel,
    GanttTree, GanttView, GanttViewStyle, GridColumns, ItemMeta, Marker, NodeId, Period,
    RawValue, RowContext, ScrollRatio, Task, TaskNameLabel, TaskNode, TimeScale, TreeChange,
    ViewportAnchor,
};

#[cfg(feature = "keymap")]
pub use crate::{GanttKeyBindings, KeymapProfile};
