//! Native page geometry and row heights.

/// Native page geometry at reference scale, as published by a completed
/// document load.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSize {
    pub width: f32,
    pub height: f32,
}

/// Row height handed to the virtual list before the cache has an entry for
/// the index (or before any document is loaded).
pub const FALLBACK_ROW_HEIGHT: f32 = 768.0;

/// Complete index→size mapping for one document.
///
/// Instances are immutable; a new document replaces the whole cache in one
/// assignment, so readers never observe a partially populated mapping.
#[derive(Debug, Clone, Default)]
pub struct DimensionCache {
    sizes: Vec<PageSize>,
}

impl DimensionCache {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_sizes(sizes: Vec<PageSize>) -> Self {
        Self { sizes }
    }

    pub fn page_count(&self) -> u32 {
        self.sizes.len() as u32
    }

    pub fn is_empty(&self) -> bool {
        self.sizes.is_empty()
    }

    pub fn get(&self, index: u32) -> Option<PageSize> {
        self.sizes.get(index as usize).copied()
    }
}

/// Height to allocate for a row: native height corrected by the responsive
/// scale, or the fixed fallback when the cache has no entry. Always finite
/// and positive, whatever the inputs, so the virtual list never sees a
/// degenerate size.
pub fn row_height(cache: &DimensionCache, scale: f32, index: u32) -> f32 {
    let native = match cache.get(index) {
        Some(size) => size.height,
        None => return FALLBACK_ROW_HEIGHT,
    };

    let scaled = native / scale;
    if scaled.is_finite() && scaled > 0.0 {
        scaled
    } else {
        FALLBACK_ROW_HEIGHT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_applies_before_population() {
        let cache = DimensionCache::empty();

        for index in [0, 1, 500] {
            let height = row_height(&cache, 1.0, index);
            assert_eq!(height, FALLBACK_ROW_HEIGHT);
            assert!(height.is_finite() && height > 0.0);
        }
    }

    #[test]
    fn heights_are_native_over_scale() {
        let cache = DimensionCache::from_sizes(vec![
            PageSize { width: 612.0, height: 800.0 },
            PageSize { width: 612.0, height: 1000.0 },
        ]);

        assert_eq!(row_height(&cache, 1.0, 0), 800.0);
        assert_eq!(row_height(&cache, 2.0, 1), 500.0);
    }

    #[test]
    fn heights_stay_finite_and_positive_for_any_index() {
        let cache = DimensionCache::from_sizes(vec![PageSize { width: 100.0, height: 0.0 }]);

        // Degenerate native height and an out-of-range index both fall back.
        let degenerate = row_height(&cache, 1.0, 0);
        let missing = row_height(&cache, 1.0, 9);

        for height in [degenerate, missing] {
            assert!(height.is_finite() && height > 0.0);
        }
    }

    #[test]
    fn empty_document_publishes_an_empty_mapping() {
        let cache = DimensionCache::from_sizes(Vec::new());
        assert_eq!(cache.page_count(), 0);
        assert!(cache.is_empty());
        assert_eq!(cache.get(0), None);
    }
}
