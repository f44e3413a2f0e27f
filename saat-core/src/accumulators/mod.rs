//! Per-document score accumulators.
//!
//! One accumulator per document, indexed by document id. Three
//! interchangeable stores trade per-query reset cost against first-touch
//! cost:
//!
//! - [`PagedAccumulators`] - lazy zeroing via per-page dirty flags; reset
//!   touches one byte per page, the first write to a page zeroes it
//! - [`FlatAccumulators`] - one flat array, reset zeroes everything
//! - [`BlockMaxAccumulators`] - flat array plus per-block maxima so the
//!   top-k pass can skip blocks that cannot beat the heap bottom
//!
//! Scores are unsigned integers of a build-time width (8, 16 or 32 bits,
//! see [`RsvWidth`]); callers guarantee that accumulated sums fit.

use std::fmt::{Debug, Display};
use std::ops::{Add, AddAssign, Sub};

mod block_max;
mod flat;
mod paged;

pub use block_max::BlockMaxAccumulators;
pub use flat::FlatAccumulators;
pub use paged::PagedAccumulators;

use crate::MAX_DOCUMENTS;
use crate::error::{Error, Result};

/// Integer width scores are accumulated in.
///
/// Implemented for `u8`, `u16` and `u32`. The choice is made where the
/// processor is instantiated; per-segment impacts and their cumulative sum
/// must fit the chosen width (overflow is a caller contract, not checked
/// here).
pub trait RsvWidth:
    Copy
    + Ord
    + Eq
    + Default
    + Debug
    + Display
    + Send
    + Sync
    + Add<Output = Self>
    + Sub<Output = Self>
    + AddAssign
    + 'static
{
    /// Largest representable score at this width.
    const MAX_RSV: Self;
    const ZERO: Self;
    const ONE: Self;

    /// Truncating conversion; callers guarantee the value fits.
    fn from_u32(raw: u32) -> Self;
    fn to_u32(self) -> u32;
}

macro_rules! impl_rsv_width {
    ($($ty:ty),*) => {$(
        impl RsvWidth for $ty {
            const MAX_RSV: Self = <$ty>::MAX;
            const ZERO: Self = 0;
            const ONE: Self = 1;

            #[inline]
            fn from_u32(raw: u32) -> Self {
                raw as $ty
            }

            #[inline]
            fn to_u32(self) -> u32 {
                self as u32
            }
        }
    )*};
}

impl_rsv_width!(u8, u16, u32);

/// Index of one accumulator slot.
///
/// Slot indices coincide with document ids and are monotone in them, so
/// `Ord` on `AccRef` is the address order used by every tie-break in the
/// top-k machinery.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub struct AccRef(pub u32);

/// Access contract shared by the accumulator stores.
///
/// `get` never materializes state and returns zero for any slot that has
/// not been written since the last `rewind`; `read_write` hands out a
/// mutable reference whose pointee reads as zero before the first write.
pub trait Accumulators<V: RsvWidth> {
    /// Logically zero every entry.
    fn rewind(&mut self);

    /// Number of accumulators managed (may be fewer than allocated).
    fn len(&self) -> u32;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Read a slot without creating state.
    fn get(&self, slot: u32) -> V;

    /// Mutable access to a slot, zero-initialized on first touch.
    fn read_write(&mut self, slot: u32) -> &mut V;

    /// `add(i, v)` is `*read_write(i) += v`; block-max stores override it
    /// to maintain their maxima.
    #[inline]
    fn add(&mut self, slot: u32, value: V) {
        *self.read_write(slot) += value;
    }
}

/// Page/block shift: the preferred override when >= 1, else
/// `floor(log2(isqrt(n)))`, which balances the number of pages against
/// their width.
pub(crate) fn derive_shift(documents: u32, preferred: u32) -> u32 {
    if preferred >= 1 {
        preferred
    } else {
        (documents as u64).isqrt().max(1).ilog2()
    }
}

pub(crate) fn check_documents(documents: u32) -> Result<()> {
    if documents == 0 || documents as usize > MAX_DOCUMENTS {
        return Err(Error::Sizing(format!(
            "document count {documents} outside [1, {MAX_DOCUMENTS}]"
        )));
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod testing {
    use rand::rngs::StdRng;
    use rand::seq::SliceRandom;
    use rand::SeedableRng;

    use super::{Accumulators, RsvWidth};

    /// Write a shuffled identity permutation and read everything back; any
    /// cross-slot interference (page zeroing included) shows up as a
    /// mismatch.
    pub(crate) fn exercise_permutation<V, A>(store: &mut A, seed: u64)
    where
        V: RsvWidth,
        A: Accumulators<V>,
    {
        let n = store.len();
        let mut order: Vec<u32> = (0..n).collect();
        order.shuffle(&mut StdRng::seed_from_u64(seed));

        for &slot in &order {
            assert_eq!(store.get(slot), V::ZERO);
            *store.read_write(slot) = V::from_u32(slot);
            assert_eq!(store.get(slot), V::from_u32(slot));
        }
        for slot in 0..n {
            assert_eq!(store.get(slot), V::from_u32(slot), "slot {slot} clobbered");
        }
    }
}
