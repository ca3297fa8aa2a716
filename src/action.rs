/// Actions that a user or application can initiate on the chart.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GanttAction<Custom = ()> {
    /// Scroll one row up (or reveal the partly hidden top row).
    ScrollUp,
    /// Scroll one row down.
    ScrollDown,
    /// Scroll up by one viewport height.
    PageUp,
    /// Scroll down by one viewport height.
    PageDown,
    /// Show the first row at the top.
    ScrollToStart,
    /// Show the last row at the bottom.
    ScrollToEnd,
    /// Collapse every row that has children.
    CollapseAll,
    /// Expand every row that has children.
    ExpandAll,
    /// Custom action forwarded to the caller without internal handling.
    Custom(Custom),
}

/// Result of handling an action or key event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GanttEvent<Custom = ()> {
    /// The action was handled internally and state was updated.
    Handled,
    /// The action was ignored (e.g. no rows to scroll).
    Unhandled,
    /// The action is forwarded to the caller for handling.
    Action(GanttAction<Custom>),
}
