use ratatui::text::{Line, Span};

use crate::context::RowContext;
use crate::model::GanttModel;

#[derive(Clone, Copy)]
pub struct GanttGlyphs<'a> {
    pub indent: &'a str,
    pub leaf: &'a str,
    pub expanded: &'a str,
    pub collapsed: &'a str,
    pub bar: &'a str,
    pub bar_done: &'a str,
    pub baseline: &'a str,
    pub milestone: &'a str,
    pub period: &'a str,
    pub marker: &'a str,
    pub connector: &'a str,
    pub tick: &'a str,
}

impl GanttGlyphs<'static> {
    pub const fn unicode() -> Self {
        Self {
            indent: "  ",
            leaf: "•",
            expanded: "▼",
            collapsed: "▶",
            bar: "░",
            bar_done: "█",
            baseline: "─",
            milestone: "◆",
            period: "▒",
            marker: "│",
            connector: "→",
            tick: "┬",
        }
    }

    pub const fn ascii() -> Self {
        Self {
            indent: "  ",
            leaf: "*",
            expanded: "v",
            collapsed: ">",
            bar: "-",
            bar_done: "=",
            baseline: "_",
            milestone: "#",
            period: "~",
            marker: "|",
            connector: ">",
            tick: "+",
        }
    }
}

pub trait GanttLabelRenderer<T: GanttModel> {
    fn line<'a>(
        &'a self,
        model: &'a T,
        id: T::Id,
        ctx: &RowContext,
        glyphs: &GanttGlyphs<'a>,
    ) -> Line<'a>;
}

/// Renders the task name indented by depth, prefixed with an expander glyph.
#[derive(Clone, Copy, Debug, Default)]
pub struct TaskNameLabel;

impl<T: GanttModel> GanttLabelRenderer<T> for TaskNameLabel {
    fn line<'a>(
        &'a self,
        model: &'a T,
        id: T::Id,
        ctx: &RowContext,
        glyphs: &GanttGlyphs<'a>,
    ) -> Line<'a> {
        gantt_label_line(ctx, model.task(id).name.as_str(), glyphs)
    }
}

pub fn gantt_label_line<'a>(ctx: &RowContext, name: &'a str, glyphs: &GanttGlyphs<'a>) -> Line<'a> {
    let expander = if ctx.has_children {
        if ctx.is_collapsed {
            glyphs.collapsed
        } else {
            glyphs.expanded
        }
    } else if ctx.is_milestone {
        glyphs.milestone
    } else {
        glyphs.leaf
    };

    let mut spans = Vec::with_capacity(ctx.depth + 3);
    for _ in 0..ctx.depth {
        spans.push(Span::styled(glyphs.indent, ctx.line_style));
    }
    spans.push(Span::raw(expander));
    spans.push(Span::raw(" "));
    spans.push(Span::raw(name));
    Line::from(spans)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::style::Style;

    fn ctx(depth: usize, has_children: bool, is_collapsed: bool) -> RowContext {
        RowContext {
            depth,
            has_children,
            is_collapsed,
            is_milestone: false,
            line_style: Style::default(),
        }
    }

    #[test]
    fn label_shows_depth_and_expander() {
        let glyphs = GanttGlyphs::ascii();
        assert_eq!(gantt_label_line(&ctx(0, true, false), "root", &glyphs).to_string(), "v root");
        assert_eq!(gantt_label_line(&ctx(0, true, true), "root", &glyphs).to_string(), "> root");
        assert_eq!(gantt_label_line(&ctx(2, false, false), "leaf", &glyphs).to_string(), "    * leaf");
    }
}
