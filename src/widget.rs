use ratatui::layout::Rect;
use ratatui::prelude::Buffer;
use ratatui::style::Style;
use ratatui::widgets::{
    Block, Scrollbar, ScrollbarOrientation, ScrollbarState, StatefulWidget, Widget,
};

use crate::columns::{GanttColumns, GridColumns};
use crate::context::RowContext;
use crate::controller::GanttController;
use crate::glyphs::{GanttGlyphs, GanttLabelRenderer, TaskNameLabel};
use crate::meta::ItemMeta;
use crate::model::GanttModel;
use crate::scale::TimeScale;
use crate::style::GanttViewStyle;
use crate::visibility::{ConnectorEnd, ConnectorTarget};

/// Диаграмма Ганта: таблица слева, шкала времени справа, скроллбар (stateful).
///
/// The state is the [`GanttController`]: rendering sets its available height to the
/// body area, runs it, then draws the rows of the resulting viewport.
pub struct GanttView<'a, T, L = TaskNameLabel, C = GridColumns<3, T>>
where
    T: GanttModel,
    L: GanttLabelRenderer<T>,
    C: GanttColumns<T>,
{
    model: &'a T,
    label: &'a L,
    columns: &'a C,
    style: GanttViewStyle<'a>,
    glyphs: GanttGlyphs<'a>,
}

impl<'a, T, L, C> GanttView<'a, T, L, C>
where
    T: GanttModel,
    L: GanttLabelRenderer<T>,
    C: GanttColumns<T>,
{
    pub const fn new(
        model: &'a T,
        label: &'a L,
        columns: &'a C,
        style: GanttViewStyle<'a>,
    ) -> Self {
        Self {
            model,
            label,
            columns,
            style,
            glyphs: GanttGlyphs::unicode(),
        }
    }

    #[must_use]
    pub const fn glyphs(mut self, glyphs: GanttGlyphs<'a>) -> Self {
        self.glyphs = glyphs;
        self
    }
}

// Horizontal split of the inner area.
#[derive(Clone, Copy)]
struct Panes {
    grid: Rect,
    separator: Option<Rect>,
    timeline: Rect,
    scrollbar: Option<Rect>,
}

impl Panes {
    fn split(inner: Rect, grid_width: u16, separator: bool, scrollbar: bool) -> Self {
        let scrollbar_width = u16::from(scrollbar && inner.width > 0);
        let content_width = inner.width - scrollbar_width;
        let grid_width = grid_width.min(content_width);
        let separator_width = u16::from(separator && content_width > grid_width);
        let timeline_x = inner.x + grid_width + separator_width;
        Self {
            grid: Rect {
                width: grid_width,
                ..inner
            },
            separator: (separator_width > 0).then_some(Rect {
                x: inner.x + grid_width,
                width: 1,
                ..inner
            }),
            timeline: Rect {
                x: timeline_x,
                width: content_width - grid_width - separator_width,
                ..inner
            },
            scrollbar: (scrollbar_width > 0).then_some(Rect {
                x: inner.x + content_width,
                width: 1,
                ..inner
            }),
        }
    }
}

/// First terminal line of a row spanning `top..bottom` in body coordinates.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn row_line(top: f64, bottom: f64, body_height: u16) -> Option<u16> {
    let first = top.max(0.0).floor();
    (first < bottom && first < f64::from(body_height)).then_some(first as u16)
}

fn fill(buf: &mut Buffer, from: u16, to: u16, y: u16, symbol: &str, style: Style) {
    for x in from..=to {
        if let Some(cell) = buf.cell_mut((x, y)) {
            cell.set_symbol(symbol).set_style(style);
        }
    }
}

fn put(buf: &mut Buffer, x: u16, y: u16, symbol: &str, style: Style) {
    fill(buf, x, x, y, symbol, style);
}

impl<T, L, C> GanttView<'_, T, L, C>
where
    T: GanttModel,
    L: GanttLabelRenderer<T>,
    C: GanttColumns<T>,
{
    fn render_grid_header(&self, area: Rect, buf: &mut Buffer) {
        let style = self.style.header_style.patch(self.columns.header_style());
        let widths = self.columns.widths_for(area.width);
        let headers = std::iter::once(self.columns.label_header())
            .chain(self.columns.columns().iter().map(|column| column.header));
        let mut x = area.x;
        for (header, width) in headers.zip(widths) {
            let width = width.min(area.right().saturating_sub(x));
            if width > 1 {
                buf.set_stringn(x, area.y, header, usize::from(width - 1), style);
            }
            x += width;
        }
    }

    fn render_scale_header(&self, area: Rect, scale: &TimeScale, buf: &mut Buffer) {
        for (column, ts) in scale.ticks(self.style.tick_spacing) {
            let x = area.x + column;
            let text = format!("{}{}", self.glyphs.tick, scale.format(ts));
            buf.set_stringn(
                x,
                area.y,
                text,
                usize::from(area.width - column),
                self.style.header_style,
            );
        }
    }

    fn render_grid_row(&self, area: Rect, y: u16, id: T::Id, meta: &ItemMeta, buf: &mut Buffer) {
        let ctx = RowContext {
            depth: meta.depth,
            has_children: self.model.has_children(id),
            is_collapsed: meta.collapsed,
            is_milestone: meta.is_milestone(),
            line_style: self.style.line_style,
        };
        let widths = self.columns.widths_for(area.width);
        let label = self.label.line(self.model, id, &ctx, &self.glyphs);
        let cells = std::iter::once(label).chain(
            self.columns
                .columns()
                .iter()
                .map(|column| (column.cell)(self.model, id, meta)),
        );
        let mut x = area.x;
        for (line, width) in cells.zip(widths) {
            let width = width.min(area.right().saturating_sub(x));
            if width > 1 {
                line.render(Rect::new(x, y, width - 1, 1), buf);
            }
            x += width;
        }
    }

    fn render_timeline_row(
        &self,
        area: Rect,
        scale: &TimeScale,
        lines: (u16, Option<u16>),
        id: T::Id,
        meta: &ItemMeta,
        resources: bool,
        buf: &mut Buffer,
    ) {
        let (y, second_line) = lines;
        let x0 = area.x;
        if resources {
            for period in &meta.periods {
                if let (Some(start), Some(end)) = (period.start, period.end)
                    && let Some((from, to)) = scale.span(start, end)
                {
                    fill(buf, x0 + from, x0 + to, y, self.glyphs.period, self.style.period_style);
                }
            }
        } else {
            match (meta.effective_start(), meta.effective_end()) {
                (Some(start), Some(end)) if start == end => {
                    if let Some(column) = scale.column(start) {
                        put(buf, x0 + column, y, self.glyphs.milestone, self.style.milestone_style);
                    }
                }
                (Some(start), Some(end)) => {
                    if let Some((from, to)) = scale.span(start, end) {
                        fill(buf, x0 + from, x0 + to, y, self.glyphs.bar, self.style.bar_style);
                        let progress = self
                            .model
                            .task(id)
                            .progress()
                            .or(meta.auto_progress)
                            .unwrap_or_default()
                            .clamp(0.0, 1.0);
                        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                        let done = (f64::from(to - from + 1) * progress).round() as u16;
                        if done > 0 {
                            fill(
                                buf,
                                x0 + from,
                                x0 + from + done - 1,
                                y,
                                self.glyphs.bar_done,
                                self.style.progress_style,
                            );
                        }
                    }
                }
                _ => {}
            }
            if let Some(y) = second_line
                && let (Some(start), Some(end)) = (meta.baseline_start, meta.baseline_end)
                && let Some((from, to)) = scale.span(start, end)
            {
                fill(buf, x0 + from, x0 + to, y, self.glyphs.baseline, self.style.baseline_style);
            }
        }
        for ts in meta.markers.iter().flatten() {
            if let Some(column) = scale.column(*ts) {
                put(buf, x0 + column, y, self.glyphs.marker, self.style.marker_style);
            }
        }
    }

    fn render_connectors(
        &self,
        area: Rect,
        scale: &TimeScale,
        state: &GanttController<T::Id>,
        row_lines: &[Option<u16>],
        buf: &mut Buffer,
    ) {
        let first_row = state.viewport().start_index;
        for connector in state.connectors() {
            let ConnectorTarget::Resolved(target) = &connector.to else {
                continue;
            };
            let Some(Some(y)) = target
                .row()
                .checked_sub(first_row)
                .and_then(|offset| row_lines.get(offset))
            else {
                continue;
            };
            let start = match target {
                ConnectorEnd::Item(item) => state.meta(item.id).and_then(ItemMeta::effective_start),
                ConnectorEnd::Period(period) => state
                    .meta(period.item)
                    .and_then(|meta| meta.periods.get(period.period))
                    .and_then(|period| period.start),
            };
            if let Some(column) = start.and_then(|start| scale.column(start))
                && column > 0
            {
                put(
                    buf,
                    area.x + column - 1,
                    area.y + *y,
                    self.glyphs.connector,
                    self.style.connector_style,
                );
            }
        }
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn render_scrollbar(
        area: Rect,
        buf: &mut Buffer,
        state: &GanttController<T::Id>,
        body_height: u16,
    ) {
        let total = state.height_cache().total();
        let scroll_rows = (total - f64::from(body_height)).ceil().max(0.0) as usize;
        let scroll_len = scroll_rows.saturating_add(1);
        let position = ((state.scroll_ratio().start * total).round() as usize).min(scroll_rows);
        let mut scrollbar_state = ScrollbarState::new(scroll_len)
            .position(position)
            .viewport_content_length(usize::from(body_height));
        Scrollbar::default()
            .orientation(ScrollbarOrientation::VerticalRight)
            .render(area, buf, &mut scrollbar_state);
    }
}

impl<T, L, C> StatefulWidget for GanttView<'_, T, L, C>
where
    T: GanttModel,
    L: GanttLabelRenderer<T>,
    C: GanttColumns<T>,
{
    type State = GanttController<T::Id>;

    fn render(self, area: Rect, buf: &mut Buffer, state: &mut Self::State) {
        let _span =
            tracing::debug_span!("gantt_view_render", width = area.width, height = area.height)
                .entered();

        let mut block = Block::default().borders(self.style.borders);
        if let Some(title) = self.style.title.clone() {
            block = block.title(title);
        }
        block = block
            .style(self.style.block_style)
            .border_style(self.style.border_style);
        let inner = block.inner(area);
        block.render(area, buf);
        if inner.width == 0 || inner.height == 0 {
            return;
        }

        let header_height = u16::from(self.style.show_header);
        let body_height = inner.height.saturating_sub(header_height);
        state.set_available_height(f64::from(body_height));
        state.run(self.model);

        let overflow = state.height_cache().total() > f64::from(body_height);
        let grid_width = self
            .style
            .grid_width
            .unwrap_or_else(|| self.columns.ideal_width());
        let panes = Panes::split(
            inner,
            grid_width,
            self.style.separator,
            self.style.show_scrollbar && overflow,
        );
        let body = |pane: Rect| Rect {
            y: pane.y + header_height,
            height: body_height,
            ..pane
        };

        if let Some(separator) = panes.separator {
            for y in separator.top()..separator.bottom() {
                put(buf, separator.x, y, "│", self.style.border_style);
            }
        }

        let scale = TimeScale::from_bounds(state.min_date(), state.max_date(), panes.timeline.width);
        if header_height > 0 {
            self.render_grid_header(panes.grid, buf);
            if let Some(scale) = &scale {
                self.render_scale_header(panes.timeline, scale, buf);
            }
        }

        let grid = body(panes.grid);
        let timeline = body(panes.timeline);
        let heights = state.height_cache();
        let viewport = state.viewport();
        let items = state.visible_items();
        let origin = heights.height_before(viewport.start_index) + viewport.vertical_offset;
        let rows = if items.is_empty() {
            0..0
        } else {
            viewport.start_index..viewport.end_index.min(items.len() - 1) + 1
        };
        let mut row_lines = Vec::with_capacity(rows.len());
        for row in rows {
            let top = heights.height_before(row) - origin;
            let bottom = heights.height_through(row) - origin;
            let line = row_line(top, bottom, body_height);
            row_lines.push(line);
            let (Some(line), Some(meta)) = (line, state.meta(items[row])) else {
                continue;
            };
            let second_line = (f64::from(line + 1) < bottom && line + 1 < body_height)
                .then_some(timeline.y + line + 1);
            self.render_grid_row(grid, grid.y + line, items[row], meta, buf);
            if let Some(scale) = &scale {
                self.render_timeline_row(
                    timeline,
                    scale,
                    (timeline.y + line, second_line),
                    items[row],
                    meta,
                    state.is_resources(),
                    buf,
                );
            }
        }
        if let Some(scale) = &scale {
            self.render_connectors(timeline, scale, state, &row_lines, buf);
        }

        if let Some(scrollbar) = panes.scrollbar {
            Self::render_scrollbar(body(scrollbar), buf, state, body_height);
        }
    }
}
