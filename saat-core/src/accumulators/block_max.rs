//! Block-max accumulators.
//!
//! A flat slot array rounded up to whole blocks of `2^shift` slots, plus
//! one running maximum per block. `add` keeps the enclosing block maximum
//! current, so a later top-k pass can skip any block whose maximum cannot
//! beat the heap bottom. The padding slots past the document count are
//! zeroed once at construction and never written, which lets the block
//! scan stay branch-free over full blocks.

use super::{Accumulators, RsvWidth, check_documents, derive_shift};
use crate::error::Result;

pub struct BlockMaxAccumulators<V> {
    /// `width * blocks` slots; `[documents..]` is permanently zero.
    slots: Vec<V>,
    maxima: Vec<V>,
    shift: u32,
    width: usize,
    documents: u32,
}

impl<V: RsvWidth> BlockMaxAccumulators<V> {
    /// `preferred_shift` of zero derives the block width from the document
    /// count; any other value forces `width = 2^preferred_shift`.
    pub fn new(documents: u32, preferred_shift: u32) -> Result<Self> {
        check_documents(documents)?;
        let shift = derive_shift(documents, preferred_shift);
        let width = 1usize << shift;
        let blocks = (documents as usize).div_ceil(width);

        Ok(Self {
            slots: vec![V::ZERO; width * blocks],
            maxima: vec![V::ZERO; blocks],
            shift,
            width,
            documents,
        })
    }

    #[inline]
    fn block_of(&self, slot: u32) -> usize {
        (slot >> self.shift) as usize
    }

    pub fn blocks(&self) -> usize {
        self.maxima.len()
    }

    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn block_max(&self, block: usize) -> V {
        self.maxima[block]
    }

    /// Raw slot read over the rounded-up range; padding slots read zero.
    #[inline]
    pub fn raw(&self, slot: usize) -> V {
        self.slots[slot]
    }
}

impl<V: RsvWidth> Accumulators<V> for BlockMaxAccumulators<V> {
    fn rewind(&mut self) {
        // only the used prefix; padding stays zero from construction
        let used = self.documents as usize;
        self.slots[..used].fill(V::ZERO);
        self.maxima.fill(V::ZERO);
    }

    fn len(&self) -> u32 {
        self.documents
    }

    #[inline]
    fn get(&self, slot: u32) -> V {
        self.slots[slot as usize]
    }

    /// Direct slot access does not maintain the block maxima; scoring goes
    /// through [`Accumulators::add`].
    #[inline]
    fn read_write(&mut self, slot: u32) -> &mut V {
        &mut self.slots[slot as usize]
    }

    #[inline]
    fn add(&mut self, slot: u32, value: V) {
        let at = slot as usize;
        self.slots[at] += value;
        let block = self.block_of(slot);
        if self.slots[at] > self.maxima[block] {
            self.maxima[block] = self.slots[at];
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::exercise_permutation;
    use super::*;

    #[test]
    fn test_block_geometry() {
        let acc = BlockMaxAccumulators::<u16>::new(65, 0).unwrap();
        assert_eq!(acc.width(), 8);
        assert_eq!(acc.blocks(), 9);
        assert_eq!(acc.slots.len(), 72);

        let acc = BlockMaxAccumulators::<u16>::new(63, 0).unwrap();
        assert_eq!(acc.width(), 4);
        assert_eq!(acc.blocks(), 16);

        let acc = BlockMaxAccumulators::<u16>::new(1, 0).unwrap();
        assert_eq!(acc.width(), 1);
        assert_eq!(acc.blocks(), 1);
    }

    #[test]
    fn test_permutation_all_widths() {
        let mut acc8 = BlockMaxAccumulators::<u8>::new(200, 0).unwrap();
        exercise_permutation(&mut acc8, 21);
        let mut acc16 = BlockMaxAccumulators::<u16>::new(1024, 0).unwrap();
        exercise_permutation(&mut acc16, 22);
        let mut acc32 = BlockMaxAccumulators::<u32>::new(63, 0).unwrap();
        exercise_permutation(&mut acc32, 23);
    }

    #[test]
    fn test_add_tracks_block_maxima() {
        let mut acc = BlockMaxAccumulators::<u16>::new(64, 0).unwrap();
        acc.add(0, 3);
        acc.add(1, 10);
        acc.add(9, 4);
        assert_eq!(acc.block_max(0), 10);
        assert_eq!(acc.block_max(1), 4);
        acc.add(0, 20);
        assert_eq!(acc.block_max(0), 23);
    }

    #[test]
    fn test_rewind_clears_maxima_and_padding_stays_zero() {
        let mut acc = BlockMaxAccumulators::<u16>::new(65, 0).unwrap();
        acc.add(64, 9);
        assert_eq!(acc.block_max(8), 9);
        acc.rewind();
        assert_eq!(acc.block_max(8), 0);
        assert_eq!(acc.get(64), 0);
        for slot in 65..acc.slots.len() {
            assert_eq!(acc.raw(slot), 0);
        }
    }
}
