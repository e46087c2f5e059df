//! Lifecycle state of a result source.

use crate::error::DataError;

/// State of the operation feeding a result source.
///
/// Exactly one state holds at a time, and only the owning source drives the
/// transitions:
///
/// ```text
/// None ──reload/load_more──▶ Loading ──ok──▶ Idle
///                               │
///                               └──err──▶ Error(e)
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub enum DataState {
    /// Never loaded.
    #[default]
    None,
    /// The last operation succeeded.
    Idle,
    /// An operation is in flight.
    Loading,
    /// The last operation failed.
    Error(DataError),
}

impl DataState {
    /// Whether an operation is in flight.
    #[inline]
    #[must_use]
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    /// Whether the last operation failed.
    #[inline]
    #[must_use]
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }

    /// The captured error, if any.
    #[must_use]
    pub fn error(&self) -> Option<&DataError> {
        match self {
            Self::Error(err) => Some(err),
            _ => None,
        }
    }

    /// Fold several states into one.
    ///
    /// The first error wins; otherwise any `Loading` makes the aggregate
    /// loading; otherwise any `None` makes it unstarted; otherwise `Idle`.
    /// An empty set aggregates to `Idle`.
    #[must_use]
    pub fn aggregate<'a>(states: impl IntoIterator<Item = &'a DataState>) -> DataState {
        let mut loading = false;
        let mut unstarted = false;
        for state in states {
            match state {
                Self::Error(_) => return state.clone(),
                Self::Loading => loading = true,
                Self::None => unstarted = true,
                Self::Idle => {}
            }
        }
        if loading {
            Self::Loading
        } else if unstarted {
            Self::None
        } else {
            Self::Idle
        }
    }
}
