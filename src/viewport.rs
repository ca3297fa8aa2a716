//! Viewport window over the visible rows: start row, end row and pixel offset.

use crate::height::HeightCache;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The row the viewport is pinned to.
///
/// `FromStart` keeps `index` at the top, scrolled up by `offset` pixels.
/// `FromEnd` keeps `index` fully visible at the bottom.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ViewportAnchor {
    FromStart { index: usize, offset: f64 },
    FromEnd { index: usize },
}

impl Default for ViewportAnchor {
    fn default() -> Self {
        Self::FromStart {
            index: 0,
            offset: 0.0,
        }
    }
}

impl ViewportAnchor {
    pub const fn start_index(&self) -> Option<usize> {
        match self {
            Self::FromStart { index, .. } => Some(*index),
            Self::FromEnd { .. } => None,
        }
    }

    pub const fn end_index(&self) -> Option<usize> {
        match self {
            Self::FromStart { .. } => None,
            Self::FromEnd { index } => Some(*index),
        }
    }
}

/// Resolved window: rows `start_index..=end_index` are at least partly visible and
/// the first `vertical_offset` pixels of the start row are hidden above the top edge.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Viewport {
    pub start_index: usize,
    pub end_index: usize,
    pub vertical_offset: f64,
}

impl Viewport {
    /// The start anchor equivalent to this window.
    pub const fn anchor(&self) -> ViewportAnchor {
        ViewportAnchor::FromStart {
            index: self.start_index,
            offset: self.vertical_offset,
        }
    }
}

/// Fits the anchor to the rows so that the window covers `available` pixels.
///
/// Anchor indices past the last row are clamped. When everything fits the window is
/// the whole set; a start anchor that would scroll past the end snaps to the last full
/// page; an end anchor too close to the top snaps to the first page. An empty set
/// yields the all-zero window.
pub fn reconcile(heights: &HeightCache, available: f64, anchor: ViewportAnchor) -> Viewport {
    let Some(last) = heights.len().checked_sub(1) else {
        return Viewport::default();
    };
    let total = heights.total();
    if available >= total {
        return Viewport {
            start_index: 0,
            end_index: last,
            vertical_offset: 0.0,
        };
    }

    match anchor {
        ViewportAnchor::FromStart { index, offset } => {
            let start = index.min(last);
            let remaining = heights.height_between(start, last) - offset;
            if remaining < available {
                let start = heights.row_at(total - available);
                Viewport {
                    start_index: start,
                    end_index: last,
                    vertical_offset: heights.height_between(start, last) - available,
                }
            } else {
                let bottom = heights.height_before(start) + available + offset;
                Viewport {
                    start_index: start,
                    end_index: heights.row_at(bottom),
                    vertical_offset: offset,
                }
            }
        }
        ViewportAnchor::FromEnd { index } => {
            let end = index.min(last);
            if heights.height_between(0, end) < available {
                Viewport {
                    start_index: 0,
                    end_index: heights.row_at(available),
                    vertical_offset: 0.0,
                }
            } else {
                let start = heights.row_at(heights.height_through(end) - available);
                Viewport {
                    start_index: start,
                    end_index: end,
                    vertical_offset: heights.height_between(start, end) - available,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn cache(heights: &[f64]) -> HeightCache {
        let mut cache = HeightCache::new();
        for &height in heights {
            cache.push(height);
        }
        cache
    }

    fn start(index: usize, offset: f64) -> ViewportAnchor {
        ViewportAnchor::FromStart { index, offset }
    }

    #[test]
    fn everything_fits() {
        let heights = cache(&[21.0, 31.0, 26.0]);
        let view = reconcile(&heights, 200.0, start(2, 5.0));
        assert_eq!(
            view,
            Viewport {
                start_index: 0,
                end_index: 2,
                vertical_offset: 0.0
            }
        );
    }

    #[test]
    fn empty_set_is_all_zero() {
        let view = reconcile(&HeightCache::new(), 50.0, ViewportAnchor::FromEnd { index: 4 });
        assert_eq!(view, Viewport::default());
    }

    #[test]
    fn start_anchor_keeps_offset_and_finds_end() {
        let heights = cache(&[10.0; 10]);
        let view = reconcile(&heights, 25.0, start(2, 4.0));
        assert_eq!((view.start_index, view.end_index), (2, 4));
        assert_eq!(view.vertical_offset, 4.0);
    }

    #[test]
    fn start_anchor_past_end_snaps_to_last_page() {
        let heights = cache(&[21.0, 31.0, 26.0]);
        let view = reconcile(&heights, 50.0, start(2, 0.0));
        assert_eq!((view.start_index, view.end_index), (1, 2));
        assert_eq!(view.vertical_offset, 7.0);

        let clamped = reconcile(&heights, 50.0, start(99, 0.0));
        assert_eq!(clamped, view);
    }

    #[test]
    fn end_anchor_bottom_aligns_row() {
        let heights = cache(&[21.0, 31.0, 26.0]);
        let view = reconcile(&heights, 50.0, ViewportAnchor::FromEnd { index: 2 });
        assert_eq!((view.start_index, view.end_index), (1, 2));
        assert_eq!(view.vertical_offset, 7.0);
    }

    #[test]
    fn end_anchor_near_top_snaps_to_first_page() {
        let heights = cache(&[10.0; 10]);
        let view = reconcile(&heights, 35.0, ViewportAnchor::FromEnd { index: 1 });
        assert_eq!(
            view,
            Viewport {
                start_index: 0,
                end_index: 3,
                vertical_offset: 0.0
            }
        );
    }

    fn rows_and_anchor() -> impl Strategy<Value = (Vec<u16>, u16, usize, bool, u16)> {
        prop::collection::vec(1u16..40, 2..40).prop_flat_map(|rows| {
            let total: u16 = rows.iter().sum();
            let len = rows.len();
            (Just(rows), 1..total, 0..len, any::<bool>(), 0u16..40)
        })
    }

    proptest! {
        #[test]
        fn window_fills_available_height((rows, available, index, from_start, offset) in rows_and_anchor()) {
            let heights = cache(&rows.iter().copied().map(f64::from).collect::<Vec<_>>());
            let available = f64::from(available);
            let anchor = if from_start {
                let offset = f64::from(offset).min(heights.row_height(index) - 1.0);
                start(index, offset)
            } else {
                ViewportAnchor::FromEnd { index }
            };
            let view = reconcile(&heights, available, anchor);
            prop_assert!(view.start_index <= view.end_index);
            prop_assert!(view.vertical_offset >= 0.0);
            let shown = heights.height_between(view.start_index, view.end_index) - view.vertical_offset;
            prop_assert!(shown >= available);
            prop_assert!(shown < available + heights.row_height(view.end_index));
        }
    }
}
