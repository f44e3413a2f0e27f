//! Scan scoring: accumulate blindly, derive the top-k afterwards.
//!
//! Scoring is a bare accumulator add with no per-posting bookkeeping; the
//! top-k is built by one pass over the whole accumulator array at sort
//! time. Wins when queries touch a large fraction of the collection and
//! per-posting heap checks would dominate.

use crate::accumulators::{AccRef, Accumulators, FlatAccumulators, RsvWidth};
use crate::topk;

pub(crate) struct ScanEngine<V> {
    store: FlatAccumulators<V>,
    pointers: Vec<AccRef>,
    need: usize,
    k: usize,
}

impl<V: RsvWidth> ScanEngine<V> {
    pub fn new(store: FlatAccumulators<V>, k: usize) -> Self {
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

    /// Collect the top-k with a full scan, then rank it.
    pub fn sort(&mut self) {
        let store = &self.store;
        let less = |a: AccRef, b: AccRef| (store.get(a.0), a) < (store.get(b.0), b);

        let mut bottom = V::ZERO;
        for slot in 0..store.len() {
            let value = store.get(slot);
            if value <= bottom {
                continue;
            }
            if self.need > 0 {
                self.need -= 1;
                self.pointers[self.need] = AccRef(slot);
                if self.need == 0 {
                    topk::make_heap(&mut self.pointers, less);
                    bottom = store.get(self.pointers[0].0);
                }
            } else {
                topk::replace_min(&mut self.pointers, AccRef(slot), less);
                bottom = store.get(self.pointers[0].0);
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

    fn engine(documents: u32, k: usize) -> ScanEngine<u16> {
        ScanEngine::new(FlatAccumulators::new(documents).unwrap(), k)
    }

    #[test]
    fn test_collects_top_k() {
        let mut e = engine(100, 2);
        e.process(&[2, 3, 7], 10);
        e.process(&[3], 5);
        e.sort();
        let ranked: Vec<(u32, u16)> = e.ranked().iter().map(|&r| (r.0, e.value_of(r))).collect();
        assert_eq!(ranked, vec![(3, 15), (2, 10)]);
    }

    #[test]
    fn test_fewer_hits_than_k() {
        let mut e = engine(50, 10);
        e.process(&[5, 9], 3);
        e.sort();
        assert_eq!(e.ranked().len(), 2);
    }

    #[test]
    fn test_untouched_documents_excluded() {
        let mut e = engine(8, 8);
        e.process(&[1], 1);
        e.sort();
        assert_eq!(e.ranked().len(), 1);
        assert_eq!(e.ranked()[0].0, 1);
    }
}
