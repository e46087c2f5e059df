//! Two-dimensional positions.

use core::fmt;

/// A `(section, item)` position in a grouped, ordered collection.
///
/// Ordering is section-major, so a `BTreeMap<IndexPath, _>` iterates in
/// display order and a single section occupies a contiguous key range.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct IndexPath {
    /// Section index.
    pub section: usize,
    /// Item index within the section.
    pub item: usize,
}

impl IndexPath {
    /// Create a position.
    #[inline]
    #[must_use]
    pub const fn new(section: usize, item: usize) -> Self {
        Self { section, item }
    }

    /// Position of `item` in section 0, the only section of flat sources.
    #[inline]
    #[must_use]
    pub const fn flat(item: usize) -> Self {
        Self { section: 0, item }
    }

    /// The same item index, `offset` sections further down.
    #[inline]
    #[must_use]
    pub const fn with_section_offset(self, offset: usize) -> Self {
        Self {
            section: self.section + offset,
            item: self.item,
        }
    }

    /// Last representable position of `section`.
    #[inline]
    #[must_use]
    pub(crate) const fn section_end(section: usize) -> Self {
        Self {
            section,
            item: usize::MAX,
        }
    }
}

impl fmt::Display for IndexPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.section, self.item)
    }
}

impl From<(usize, usize)> for IndexPath {
    fn from((section, item): (usize, usize)) -> Self {
        Self::new(section, item)
    }
}
