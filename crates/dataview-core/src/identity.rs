//! Identity contract for diffable items.

use core::hash::Hash;

/// An item with a stable identity across snapshots.
///
/// Identity decides which items of two snapshots are "the same logical
/// item"; `PartialEq` on the item itself decides whether its content
/// changed. Two items with equal identity but unequal content diff as an
/// update, not as a delete + insert.
pub trait Uniq {
    /// The identity key.
    type Id: Eq + Hash + Clone;

    /// Stable identity of this item.
    fn identity(&self) -> Self::Id;
}

impl Uniq for String {
    type Id = String;

    fn identity(&self) -> String {
        self.clone()
    }
}

impl Uniq for &'static str {
    type Id = &'static str;

    fn identity(&self) -> &'static str {
        self
    }
}

macro_rules! impl_uniq_for_int {
    ($($t:ty),*) => {
        $(
            impl Uniq for $t {
                type Id = $t;

                fn identity(&self) -> $t {
                    *self
                }
            }
        )*
    };
}

impl_uniq_for_int!(u8, u16, u32, u64, usize, i8, i16, i32, i64, isize);

impl<T: Uniq + ?Sized> Uniq for std::rc::Rc<T> {
    type Id = T::Id;

    fn identity(&self) -> T::Id {
        (**self).identity()
    }
}

impl<T: Uniq + ?Sized> Uniq for std::sync::Arc<T> {
    type Id = T::Id;

    fn identity(&self) -> T::Id {
        (**self).identity()
    }
}
