use ratatui::style::Style;

/// Per-row facts handed to label renderers.
#[derive(Clone, Copy)]
pub struct RowContext {
    pub depth: usize,
    pub has_children: bool,
    pub is_collapsed: bool,
    pub is_milestone: bool,
    pub line_style: Style,
}
