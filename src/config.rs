#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Default row height in pixels.
pub const DEFAULT_ROW_HEIGHT: f64 = 20.0;
/// Default thickness of the separator drawn below each row.
pub const DEFAULT_ROW_STROKE_THICKNESS: f64 = 1.0;

/// What the rows of the chart represent.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ChartMode {
    /// Rows are tasks; parents roll up dates and progress from their children.
    #[default]
    Project,
    /// Rows are resources holding periods; periods are indexed for connectors.
    Resource,
}

impl ChartMode {
    pub const fn is_resources(self) -> bool {
        matches!(self, Self::Resource)
    }
}

/// Controller configuration.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ControllerConfig {
    pub mode: ChartMode,
    /// Height of rows without their own `row_height`.
    pub default_row_height: f64,
    /// Separator thickness added to every row height.
    pub row_stroke_thickness: f64,
}

impl ControllerConfig {
    /// Project chart with default row metrics.
    pub const fn project() -> Self {
        Self {
            mode: ChartMode::Project,
            default_row_height: DEFAULT_ROW_HEIGHT,
            row_stroke_thickness: DEFAULT_ROW_STROKE_THICKNESS,
        }
    }

    /// Resource chart with default row metrics.
    pub const fn resources() -> Self {
        Self {
            mode: ChartMode::Resource,
            ..Self::project()
        }
    }

    /// Metrics suited for terminal rendering: one line per row, no separators.
    #[must_use]
    pub const fn terminal(mut self) -> Self {
        self.default_row_height = 1.0;
        self.row_stroke_thickness = 0.0;
        self
    }
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self::project()
    }
}
