//! Flat accumulators: one slot per document, zeroed in full on rewind.

use super::{Accumulators, RsvWidth, check_documents};
use crate::error::Result;

pub struct FlatAccumulators<V> {
    slots: Vec<V>,
}

impl<V: RsvWidth> FlatAccumulators<V> {
    pub fn new(documents: u32) -> Result<Self> {
        check_documents(documents)?;
        Ok(Self {
            slots: vec![V::ZERO; documents as usize],
        })
    }
}

impl<V: RsvWidth> Accumulators<V> for FlatAccumulators<V> {
    fn rewind(&mut self) {
        self.slots.fill(V::ZERO);
    }

    fn len(&self) -> u32 {
        self.slots.len() as u32
    }

    #[inline]
    fn get(&self, slot: u32) -> V {
        self.slots[slot as usize]
    }

    #[inline]
    fn read_write(&mut self, slot: u32) -> &mut V {
        &mut self.slots[slot as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::exercise_permutation;
    use super::*;

    #[test]
    fn test_permutation_all_widths() {
        let mut acc8 = FlatAccumulators::<u8>::new(255).unwrap();
        exercise_permutation(&mut acc8, 11);
        let mut acc16 = FlatAccumulators::<u16>::new(1024).unwrap();
        exercise_permutation(&mut acc16, 12);
        let mut acc32 = FlatAccumulators::<u32>::new(1024).unwrap();
        exercise_permutation(&mut acc32, 13);
    }

    #[test]
    fn test_rewind_reads_zero() {
        let mut acc = FlatAccumulators::<u16>::new(32).unwrap();
        for slot in 0..32 {
            acc.add(slot, 5);
        }
        acc.rewind();
        for slot in 0..32 {
            assert_eq!(acc.get(slot), 0);
        }
    }
}
