//! Paged lazy-zero accumulators.
//!
//! The slot array is a rectangle of `pages` rows, each `2^shift` slots
//! wide, with one dirty byte per row. `rewind` marks every row dirty in a
//! single pass over the flag array; a row is zeroed the first time one of
//! its slots is written. Reset cost is one byte per page, first-touch cost
//! is one row memset. The row count is rounded up so the last row is
//! always full.

use super::{Accumulators, RsvWidth, check_documents, derive_shift};
use crate::error::Result;

pub struct PagedAccumulators<V> {
    /// `width * pages` slots.
    slots: Vec<V>,
    /// Nonzero = the row has not been zeroed since the last rewind.
    dirty: Vec<u8>,
    shift: u32,
    width: usize,
    documents: u32,
}

impl<V: RsvWidth> PagedAccumulators<V> {
    /// `preferred_shift` of zero derives the page width from the document
    /// count; any other value forces `width = 2^preferred_shift`.
    pub fn new(documents: u32, preferred_shift: u32) -> Result<Self> {
        check_documents(documents)?;
        let shift = derive_shift(documents, preferred_shift);
        let width = 1usize << shift;
        let pages = (documents as usize).div_ceil(width);

        let mut this = Self {
            slots: vec![V::ZERO; width * pages],
            dirty: vec![0; pages],
            shift,
            width,
            documents,
        };
        this.rewind();
        Ok(this)
    }

    #[inline]
    fn page_of(&self, slot: u32) -> usize {
        (slot >> self.shift) as usize
    }

    pub fn page_width(&self) -> usize {
        self.width
    }

    pub fn page_count(&self) -> usize {
        self.dirty.len()
    }

    pub fn page_shift(&self) -> u32 {
        self.shift
    }
}

impl<V: RsvWidth> Accumulators<V> for PagedAccumulators<V> {
    fn rewind(&mut self) {
        self.dirty.fill(0xff);
    }

    fn len(&self) -> u32 {
        self.documents
    }

    #[inline]
    fn get(&self, slot: u32) -> V {
        if self.dirty[self.page_of(slot)] != 0 {
            V::ZERO
        } else {
            self.slots[slot as usize]
        }
    }

    #[inline]
    fn read_write(&mut self, slot: u32) -> &mut V {
        let page = self.page_of(slot);
        if self.dirty[page] != 0 {
            let base = page << self.shift;
            self.slots[base..base + self.width].fill(V::ZERO);
            self.dirty[page] = 0;
        }
        &mut self.slots[slot as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::exercise_permutation;
    use super::*;

    #[test]
    fn test_page_geometry_square() {
        let acc = PagedAccumulators::<u16>::new(64, 0).unwrap();
        assert_eq!(acc.page_width(), 8);
        assert_eq!(acc.page_shift(), 3);
        assert_eq!(acc.page_count(), 8);
    }

    #[test]
    fn test_page_geometry_hangover() {
        // one extra slot spills into a ninth (full) row
        let acc = PagedAccumulators::<u16>::new(65, 0).unwrap();
        assert_eq!(acc.page_width(), 8);
        assert_eq!(acc.page_count(), 9);
        assert_eq!(acc.slots.len(), 72);
    }

    #[test]
    fn test_page_geometry_hangunder() {
        let acc = PagedAccumulators::<u16>::new(63, 0).unwrap();
        assert_eq!(acc.page_width(), 4);
        assert_eq!(acc.page_count(), 16);
    }

    #[test]
    fn test_page_geometry_single() {
        let acc = PagedAccumulators::<u16>::new(1, 0).unwrap();
        assert_eq!(acc.page_width(), 1);
        assert_eq!(acc.page_count(), 1);
    }

    #[test]
    fn test_permutation_u8() {
        let mut acc = PagedAccumulators::<u8>::new(200, 0).unwrap();
        exercise_permutation(&mut acc, 1);
    }

    #[test]
    fn test_permutation_u16() {
        for n in [1, 63, 64, 65, 1024] {
            let mut acc = PagedAccumulators::<u16>::new(n, 0).unwrap();
            exercise_permutation(&mut acc, u64::from(n));
        }
    }

    #[test]
    fn test_permutation_u32() {
        let mut acc = PagedAccumulators::<u32>::new(777, 0).unwrap();
        exercise_permutation(&mut acc, 3);
    }

    #[test]
    fn test_rewind_reads_zero() {
        let mut acc = PagedAccumulators::<u16>::new(100, 0).unwrap();
        for slot in 0..100 {
            *acc.read_write(slot) = 7;
        }
        acc.rewind();
        for slot in 0..100 {
            assert_eq!(acc.get(slot), 0);
            assert_eq!(*acc.read_write(slot), 0);
        }
    }

    #[test]
    fn test_rewind_touches_only_flags() {
        let mut acc = PagedAccumulators::<u16>::new(64, 0).unwrap();
        *acc.read_write(9) = 42;
        acc.rewind();
        // stale value survives in the slot array but is invisible
        assert_eq!(acc.slots[9], 42);
        assert_eq!(acc.get(9), 0);
    }
}
