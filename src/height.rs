/// Cumulative row heights of the visible set.
///
/// Entry `i` is the total height of rows `0..=i`, so `self[i] - self[i - 1]` is the
/// height of row `i` (with an implicit `0` before the first row). Entries never
/// decrease as long as every pushed row height is non-negative.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct HeightCache {
    cumulative: Vec<f64>,
}

impl HeightCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            cumulative: Vec::with_capacity(capacity),
        }
    }

    /// Appends a row and returns its index.
    pub fn push(&mut self, row_height: f64) -> usize {
        let total = self.total() + row_height;
        self.cumulative.push(total);
        self.cumulative.len() - 1
    }

    pub fn clear(&mut self) {
        self.cumulative.clear();
    }

    pub fn len(&self) -> usize {
        self.cumulative.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cumulative.is_empty()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.cumulative
    }

    /// Height of the whole set.
    pub fn total(&self) -> f64 {
        self.cumulative.last().copied().unwrap_or(0.0)
    }

    /// Height of rows `0..=index` (`index` clamped to the last row).
    pub fn height_through(&self, index: usize) -> f64 {
        match self.last_index() {
            Some(last) => self.cumulative[index.min(last)],
            None => 0.0,
        }
    }

    /// Height of rows `0..index`, i.e. the top edge of row `index`.
    pub fn height_before(&self, index: usize) -> f64 {
        match index {
            0 => 0.0,
            _ => self.height_through(index - 1),
        }
    }

    /// Height of a single row.
    pub fn row_height(&self, index: usize) -> f64 {
        self.height_between(index, index)
    }

    /// Height of rows `from..=to`.
    ///
    /// Both bounds are clamped to the last row and swapped when `from > to`.
    pub fn height_between(&self, from: usize, to: usize) -> f64 {
        let Some(last) = self.last_index() else {
            return 0.0;
        };
        let (from, to) = if from > to { (to, from) } else { (from, to) };
        let (from, to) = (from.min(last), to.min(last));
        self.cumulative[to] - self.height_before(from)
    }

    /// Smallest index whose cumulative height is `>= height`.
    ///
    /// Returns `len()` when `height` exceeds the total; callers clamp as needed.
    pub fn index_by_height(&self, height: f64) -> usize {
        self.cumulative.partition_point(|&total| total < height)
    }

    /// Like [`index_by_height`](Self::index_by_height) but clamped to the last row.
    pub fn row_at(&self, height: f64) -> usize {
        self.index_by_height(height)
            .min(self.cumulative.len().saturating_sub(1))
    }

    fn last_index(&self) -> Option<usize> {
        self.cumulative.len().checked_sub(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn sample() -> HeightCache {
        let mut cache = HeightCache::new();
        for height in [20.0, 30.0, 25.0] {
            cache.push(height + 1.0);
        }
        cache
    }

    #[test]
    fn range_queries_over_three_rows() {
        let cache = sample();
        assert_eq!(cache.as_slice(), &[21.0, 52.0, 78.0]);
        assert_eq!(cache.height_between(0, 2), 78.0);
        assert_eq!(cache.height_between(1, 2), 57.0);
        assert_eq!(cache.height_between(2, 1), 57.0);
        assert_eq!(cache.height_between(1, 99), 57.0);
        assert_eq!(cache.row_height(1), 31.0);
        assert_eq!(cache.height_before(0), 0.0);
        assert_eq!(cache.height_before(2), 52.0);
    }

    #[test]
    fn lower_bound_search() {
        let cache = sample();
        assert_eq!(cache.index_by_height(0.0), 0);
        assert_eq!(cache.index_by_height(21.0), 0);
        assert_eq!(cache.index_by_height(52.0), 1);
        assert_eq!(cache.index_by_height(53.0), 2);
        assert_eq!(cache.index_by_height(100.0), 3);
        assert_eq!(cache.row_at(100.0), 2);
    }

    #[test]
    fn empty_cache_is_all_zero() {
        let cache = HeightCache::new();
        assert_eq!(cache.total(), 0.0);
        assert_eq!(cache.height_between(0, 5), 0.0);
        assert_eq!(cache.index_by_height(10.0), 0);
        assert_eq!(cache.row_at(10.0), 0);
    }

    proptest! {
        #[test]
        fn prefix_sums_are_monotonic_and_exact(heights in prop::collection::vec(0u16..200, 1..64)) {
            let mut cache = HeightCache::with_capacity(heights.len());
            for &height in &heights {
                cache.push(f64::from(height));
            }
            let sums = cache.as_slice();
            for i in 1..sums.len() {
                prop_assert!(sums[i] >= sums[i - 1]);
                prop_assert_eq!(sums[i] - sums[i - 1], f64::from(heights[i]));
            }
            prop_assert_eq!(cache.height_between(0, heights.len() - 1), cache.total());
        }

        #[test]
        fn search_returns_smallest_covering_index(
            heights in prop::collection::vec(1u16..100, 1..64),
            fraction in 0.0f64..=1.0,
        ) {
            let mut cache = HeightCache::new();
            for &height in &heights {
                cache.push(f64::from(height));
            }
            let target = (cache.total() * fraction).round();
            let index = cache.index_by_height(target);
            let sums = cache.as_slice();
            prop_assert!(index < sums.len());
            prop_assert!(sums[index] >= target);
            if index > 0 {
                prop_assert!(sums[index - 1] < target);
            }
        }
    }
}
