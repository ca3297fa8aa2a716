use ratatui::style::{Modifier, Style};
use ratatui::text::Line;
use ratatui::widgets::Borders;

/// Визуальные настройки диаграммы.
#[derive(Clone)]
pub struct GanttViewStyle<'a> {
    pub title: Option<Line<'a>>,
    pub block_style: Style,
    pub border_style: Style,
    pub header_style: Style,
    pub line_style: Style,
    pub bar_style: Style,
    pub progress_style: Style,
    pub baseline_style: Style,
    pub milestone_style: Style,
    pub period_style: Style,
    pub marker_style: Style,
    pub connector_style: Style,
    pub borders: Borders,
    /// Ширина таблицы слева; `None` — по идеальной ширине колонок.
    pub grid_width: Option<u16>,
    /// Вертикальный разделитель между таблицей и шкалой времени.
    pub separator: bool,
    pub show_header: bool,
    pub show_scrollbar: bool,
    /// Шаг делений шкалы времени в колонках.
    pub tick_spacing: u16,
}

impl Default for GanttViewStyle<'_> {
    fn default() -> Self {
        Self {
            title: None,
            block_style: Style::default(),
            border_style: Style::default(),
            header_style: Style::default().add_modifier(Modifier::BOLD),
            line_style: Style::default(),
            bar_style: Style::default(),
            progress_style: Style::default(),
            baseline_style: Style::default().add_modifier(Modifier::DIM),
            milestone_style: Style::default(),
            period_style: Style::default(),
            marker_style: Style::default(),
            connector_style: Style::default(),
            borders: Borders::ALL,
            grid_width: None,
            separator: true,
            show_header: true,
            show_scrollbar: true,
            tick_spacing: 12,
        }
    }
}
