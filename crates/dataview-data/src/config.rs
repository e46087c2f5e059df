//! Paging configuration.

/// Page sizing for paged sources and prefetching for list bindings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PagingConfig {
    /// Items requested per page. A page shorter than this ends the data.
    /// `usize::MAX` disables paging: the page counter never advances.
    /// Default: 20
    pub page_size: usize,

    /// How close to the end (in items) a displayed row must be for a list
    /// binding to request the next page.
    /// Default: 5
    pub prefetch_distance: usize,
}

impl Default for PagingConfig {
    fn default() -> Self {
        Self {
            page_size: 20,
            prefetch_distance: 5,
        }
    }
}

impl PagingConfig {
    /// Config for a given page size with the default prefetch distance.
    #[must_use]
    pub fn with_page_size(page_size: usize) -> Self {
        Self {
            page_size,
            ..Self::default()
        }
        .sanitized()
    }

    /// Config for sources that load everything at once.
    #[must_use]
    pub fn unpaged() -> Self {
        Self {
            page_size: usize::MAX,
            prefetch_distance: 0,
        }
    }

    /// Whether the page counter advances between loads.
    #[must_use]
    pub fn is_paginated(&self) -> bool {
        self.page_size < usize::MAX
    }

    /// Copy with out-of-range values replaced by their defaults.
    #[must_use]
    pub fn sanitized(&self) -> Self {
        let mut config = *self;
        config.page_size = normalize_page_size(config.page_size, 20);
        config.prefetch_distance = config.prefetch_distance.min(config.page_size);
        config
    }
}

fn normalize_page_size(value: usize, fallback: usize) -> usize {
    if value > 0 { value } else { fallback }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_page_size_falls_back() {
        let config = PagingConfig {
            page_size: 0,
            prefetch_distance: 3,
        }
        .sanitized();
        assert_eq!(config.page_size, 20);
        assert_eq!(config.prefetch_distance, 3);
    }

    #[test]
    fn prefetch_is_capped_by_page_size() {
        let config = PagingConfig {
            page_size: 2,
            prefetch_distance: 10,
        }
        .sanitized();
        assert_eq!(config.prefetch_distance, 2);
    }

    #[test]
    fn unpaged_is_not_paginated() {
        assert!(!PagingConfig::unpaged().is_paginated());
        assert!(PagingConfig::with_page_size(10).is_paginated());
        assert_eq!(PagingConfig::unpaged().sanitized(), PagingConfig::unpaged());
    }
}
