//! Block-max scoring: accumulate blindly, skip blocks at collect time.
//!
//! Scoring is an accumulator add that also maintains per-block maxima.
//! The top-k pass walks the maxima and descends into a block only when
//! its maximum beats the current heap bottom, so densely-scored regions
//! pay for one scan while empty regions cost one compare per block.

use crate::accumulators::{AccRef, Accumulators, BlockMaxAccumulators, RsvWidth};
use crate::topk;

pub(crate) struct BlockMaxEngine<V> {
    store: BlockMaxAccumulators<V>,
    pointers: Vec<AccRef>,
    need: usize,
    k: usize,
}

impl<V: RsvWidth> BlockMaxEngine<V> {
    pub fn new(store: BlockMaxAccumulators<V>, k: usize) -> Self {
        Self {
            store,
            pointers: vec![AccRef(0); k],
            need: k,
            k,
        }
    }

    pub fn rewind(&mut self) {
        self.store.rewind();
        self.pointers.fill(AccRef(0));
        self.need = self.k;
    }

    #[inline]
    pub fn process(&mut self, doc_ids: &[u32], impact: V) {
        for &doc in doc_ids {
            self.store.add(doc, impact);
        }
    }

    /// Collect the top-k, skipping blocks whose maximum cannot beat the
    /// heap bottom, then rank it. Padding slots past the document count
    /// are permanently zero and fall out of the `value > bottom` test.
    pub fn sort(&mut self) {
        let store = &self.store;
        let less = |a: AccRef, b: AccRef| (store.get(a.0), a) < (store.get(b.0), b);

        let width = store.width();
        let mut bottom = V::ZERO;
        for block in 0..store.blocks() {
            if store.block_max(block) <= bottom {
                continue;
            }
            let base = block * width;
            for slot in base..base + width {
                let value = store.raw(slot);
                if value <= bottom {
                    continue;
                }
                if self.need > 0 {
                    self.need -= 1;
                    self.pointers[self.need] = AccRef(slot as u32);
                    if self.need == 0 {
                        topk::make_heap(&mut self.pointers, less);
                        bottom = store.get(self.pointers[0].0);
                    }
                } else {
                    topk::replace_min(&mut self.pointers, AccRef(slot as u32), less);
                    bottom = store.get(self.pointers[0].0);
                }
            }
        }

        topk::sort_descending(&mut self.pointers[self.need..], less);
    }

    pub fn ranked(&self) -> &[AccRef] {
        &self.pointers[self.need..]
    }

    pub fn value_of(&self, entry: AccRef) -> V {
        self.store.get(entry.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine(documents: u32, k: usize) -> BlockMaxEngine<u16> {
        BlockMaxEngine::new(BlockMaxAccumulators::new(documents, 0).unwrap(), k)
    }

    #[test]
    fn test_collects_top_k_across_blocks() {
        let mut e = engine(1024, 2);
        e.process(&[2, 3], 10);
        e.process(&[3, 900], 10);
        e.process(&[500], 15);
        e.sort();
        let ranked: Vec<(u32, u16)> = e.ranked().iter().map(|&r| (r.0, e.value_of(r))).collect();
        assert_eq!(ranked, vec![(3, 20), (500, 15)]);
    }

    #[test]
    fn test_rewind_resets_results() {
        let mut e = engine(128, 4);
        e.process(&[1, 2, 3], 5);
        e.sort();
        assert_eq!(e.ranked().len(), 3);

        e.rewind();
        e.process(&[9], 2);
        e.sort();
        let ranked: Vec<u32> = e.ranked().iter().map(|r| r.0).collect();
        assert_eq!(ranked, vec![9]);
    }
}
