use ratatui::style::Style;
use ratatui::text::Line;
use smallvec::SmallVec;

use crate::meta::ItemMeta;
use crate::model::GanttModel;
use crate::scale::format_timestamp;

/// Data-grid layout: the tree label column followed by value columns.
pub trait GanttColumns<T: GanttModel> {
    /// Returns the header text of the label (tree) column.
    fn label_header(&self) -> &str {
        "Task"
    }
    /// Returns the width bounds of the label column.
    fn label_width(&self) -> ColumnWidth;
    /// Returns the value columns.
    fn columns(&self) -> &[ColumnDef<T>];
    /// Returns the header row style.
    fn header_style(&self) -> Style {
        Style::default()
    }
    /// Returns column widths (label first) fitted into `total` columns.
    fn widths_for(&self, total: u16) -> SmallVec<[u16; 8]> {
        let mut widths = SmallVec::<[ColumnWidth; 8]>::new();
        widths.push(self.label_width());
        widths.extend(self.columns().iter().map(|column| column.width));
        distribute_widths(total, &widths)
    }
    /// Returns the width the grid needs to show every column at its ideal width.
    fn ideal_width(&self) -> u16 {
        self.columns()
            .iter()
            .fold(self.label_width().ideal, |sum, column| {
                sum.saturating_add(column.width.ideal)
            })
    }
}

/// Function pointer type for rendering a single column cell.
pub type ColumnFn<T> = for<'a> fn(&'a T, <T as GanttModel>::Id, &ItemMeta) -> Line<'a>;

/// Column definition: header label, width bounds, and cell renderer.
#[derive(Clone, Copy)]
pub struct ColumnDef<T: GanttModel> {
    /// Header label for the column.
    pub header: &'static str,
    /// Width bounds for the column.
    pub width: ColumnWidth,
    /// Renderer for the column cell.
    pub cell: ColumnFn<T>,
}

impl<T: GanttModel> ColumnDef<T> {
    /// Creates a new column definition.
    pub const fn new(header: &'static str, width: ColumnWidth, cell: ColumnFn<T>) -> Self {
        Self {
            header,
            width,
            cell,
        }
    }
}

/// Width constraints for a column in adaptive layout.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ColumnWidth {
    /// Minimum width.
    pub min: u16,
    /// Ideal width (used before expanding toward max).
    pub ideal: u16,
    /// Maximum width.
    pub max: u16,
}

impl ColumnWidth {
    /// Creates a fixed width (min = ideal = max).
    pub const fn fixed(width: u16) -> Self {
        Self {
            min: width,
            ideal: width,
            max: width,
        }
    }

    pub const fn new(min: u16, ideal: u16, max: u16) -> Self {
        Self { min, ideal, max }
    }
}

/// Distributes `total` width across columns respecting `min`/`ideal`/`max`.
///
/// If `total` is outside the feasible range (`sum(min)`..=`sum(max)`), the returned widths are
/// clamped to `min` or `max` respectively (so the sum may differ from `total`).
pub fn distribute_widths(total: u16, columns: &[ColumnWidth]) -> SmallVec<[u16; 8]> {
    let mut widths: SmallVec<[u16; 8]> = columns.iter().map(|col| col.min).collect();
    let min_sum = widths
        .iter()
        .fold(0u16, |sum, width| sum.saturating_add(*width));

    let mut remaining = total.saturating_sub(min_sum);
    if remaining == 0 {
        return widths;
    }

    // Ideal widths first, then toward max.
    let passes: [fn(&ColumnWidth) -> u16; 2] = [|col| col.ideal.max(col.min), |col| col.max];
    for target_of in passes {
        for (width, col) in widths.iter_mut().zip(columns) {
            if remaining == 0 {
                return widths;
            }
            let add = target_of(col).saturating_sub(*width).min(remaining);
            *width += add;
            remaining -= add;
        }
    }

    widths
}

/// Adaptive grid layout with `N` value columns.
pub struct GridColumns<const N: usize, T: GanttModel> {
    label_header: &'static str,
    label_width: ColumnWidth,
    columns: [ColumnDef<T>; N],
    header_style: Style,
}

impl<const N: usize, T: GanttModel> GridColumns<N, T> {
    /// Creates a new adaptive column layout.
    pub const fn new(
        label_width: ColumnWidth,
        label_header: &'static str,
        columns: [ColumnDef<T>; N],
    ) -> Self {
        Self {
            label_header,
            label_width,
            columns,
            header_style: Style::new(),
        }
    }

    /// Sets the header row style.
    #[must_use]
    pub const fn header_style(mut self, style: Style) -> Self {
        self.header_style = style;
        self
    }
}

impl<T: GanttModel> GridColumns<3, T> {
    /// Label column plus start, end and progress columns.
    pub const fn standard() -> Self {
        Self::new(
            ColumnWidth::new(12, 24, 40),
            "Task",
            [
                ColumnDef::new("Start", ColumnWidth::new(0, 10, 16), start_cell::<T>),
                ColumnDef::new("End", ColumnWidth::new(0, 10, 16), end_cell::<T>),
                ColumnDef::new("Done", ColumnWidth::new(0, 5, 6), progress_cell::<T>),
            ],
        )
    }
}

impl<const N: usize, T: GanttModel> GanttColumns<T> for GridColumns<N, T> {
    fn label_header(&self) -> &str {
        self.label_header
    }

    fn label_width(&self) -> ColumnWidth {
        self.label_width
    }

    fn columns(&self) -> &[ColumnDef<T>] {
        &self.columns
    }

    fn header_style(&self) -> Style {
        self.header_style
    }
}

const DATE_FORMAT: &str = "%Y-%m-%d";

fn date_line<'a>(ts: Option<i64>) -> Line<'a> {
    ts.map_or_else(Line::default, |ts| Line::from(format_timestamp(ts, DATE_FORMAT)))
}

/// Effective start date of the row.
pub fn start_cell<'a, T: GanttModel>(_model: &'a T, _id: T::Id, meta: &ItemMeta) -> Line<'a> {
    date_line(meta.effective_start())
}

/// Effective end date of the row.
pub fn end_cell<'a, T: GanttModel>(_model: &'a T, _id: T::Id, meta: &ItemMeta) -> Line<'a> {
    date_line(meta.effective_end())
}

/// Explicit progress of the row, else the rolled-up one, as a percentage.
pub fn progress_cell<'a, T: GanttModel>(model: &'a T, id: T::Id, meta: &ItemMeta) -> Line<'a> {
    model
        .task(id)
        .progress()
        .or(meta.auto_progress)
        .map_or_else(Line::default, |progress| {
            Line::from(format!("{:.0}%", progress * 100.0)).right_aligned()
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::tests::TestForest;
    use crate::task::Task;

    #[test]
    fn distribute_widths_respects_min_ideal_max() {
        let columns = [ColumnWidth::new(4, 6, 8), ColumnWidth::new(4, 4, 6)];
        let widths = distribute_widths(12, &columns);
        assert_eq!(widths.as_slice(), &[8, 4]);
        assert_eq!(distribute_widths(5, &columns).as_slice(), &[4, 4]);
        assert_eq!(distribute_widths(40, &columns).as_slice(), &[8, 6]);
    }

    #[test]
    fn standard_columns_fit_the_grid() {
        let layout = GridColumns::<3, TestForest>::standard();
        assert_eq!(layout.ideal_width(), 49);
        let widths = layout.widths_for(30);
        assert_eq!(widths.as_slice(), &[24, 6, 0, 0]);
        assert_eq!(widths.iter().sum::<u16>(), 30);
    }

    #[test]
    fn cells_render_dates_and_progress() {
        let forest = TestForest::from_parents(vec![(None, Task::new("a").with_progress(0.25))]);
        let meta = ItemMeta {
            actual_start: Some(0),
            auto_end: Some(86_400_000),
            ..ItemMeta::default()
        };
        assert_eq!(start_cell(&forest, 0, &meta).to_string(), "1970-01-01");
        assert_eq!(end_cell(&forest, 0, &meta).to_string(), "1970-01-02");
        assert_eq!(progress_cell(&forest, 0, &meta).to_string(), "25%");
        assert_eq!(start_cell(&forest, 0, &ItemMeta::default()).to_string(), "");
    }
}
