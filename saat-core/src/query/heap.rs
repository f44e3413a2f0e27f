//! Heap-driven scoring: the top-k is maintained while postings stream.
//!
//! Every scored posting lands in `add_rsv`, which keeps a bounded min-heap
//! of accumulator references current. The heap slot array is filled from
//! the back while it is short of `k` entries and heapified the moment it
//! fills; from then on the running `lower_bound` (the heap minimum) gates
//! admission, so most postings cost one compare.

use crate::accumulators::{AccRef, Accumulators, RsvWidth};
use crate::topk;

pub(crate) struct HeapEngine<A, V> {
    store: A,
    /// Top-k slot refs; `[need..k]` is the filled suffix, heap-ordered
    /// over the whole array once `need` reaches zero.
    pointers: Vec<AccRef>,
    /// Entries still missing before the heap is full.
    need: usize,
    /// Smallest score that can currently enter the top-k. Starts at the
    /// rewind bound: one for the natural bound (any touched document may
    /// qualify), larger when the caller supplies an oracle.
    lower_bound: V,
    k: usize,
}

impl<V: RsvWidth, A: Accumulators<V>> HeapEngine<A, V> {
    pub fn new(store: A, k: usize) -> Self {
        Self {
            store,
            pointers: vec![AccRef(0); k],
            need: k,
            lower_bound: V::ONE,
            k,
        }
    }

    pub fn rewind(&mut self, top_k_lower_bound: V) {
        self.store.rewind();
        self.pointers.fill(AccRef(0));
        self.need = self.k;
        self.lower_bound = top_k_lower_bound;
    }

    /// Add `impact` to the accumulator for `doc` and update the top-k.
    ///
    /// Returns `false` exactly when an oracle lower bound just filled the
    /// heap: the top-k is complete and the rest of the query is moot.
    #[inline]
    pub fn add_rsv(&mut self, doc: u32, impact: V) -> bool {
        let slot = self.store.read_write(doc);
        *slot += impact;
        let new = *slot;
        let entry = AccRef(doc);

        // below the bar: the common case
        if new < self.lower_bound {
            return true;
        }

        if self.need > 0 {
            // filling: only documents newly past the bound take a slot
            if new - impact < self.lower_bound {
                self.need -= 1;
                self.pointers[self.need] = entry;
                if self.need == 0 {
                    let store = &self.store;
                    let less =
                        |a: AccRef, b: AccRef| (store.get(a.0), a) < (store.get(b.0), b);
                    topk::make_heap(&mut self.pointers, less);
                    if self.lower_bound != V::ONE {
                        // oracle bound: the k qualifying documents are in
                        // hand, stop the whole query
                        return false;
                    }
                    self.lower_bound = store.get(self.pointers[0].0);
                }
            }
            return true;
        }

        let store = &self.store;
        let less = |a: AccRef, b: AccRef| (store.get(a.0), a) < (store.get(b.0), b);

        if new == self.lower_bound {
            // value tie with the heap minimum: only a larger slot displaces it
            if entry < self.pointers[0] {
                return true;
            }
            topk::replace_min(&mut self.pointers, entry, less);
        } else {
            // above the bar; decide from the pre-increment value whether
            // this accumulator is already in the heap
            let old = new - impact;
            let was_out = old < self.lower_bound
                || (old == self.lower_bound && entry < self.pointers[0]);
            if was_out {
                topk::replace_min(&mut self.pointers, entry, less);
            } else if let Some(at) = topk::position_of(&self.pointers, entry) {
                topk::sift_down(&mut self.pointers, at, less);
            } else {
                debug_assert!(false, "in-heap accumulator missing from slot array");
            }
        }
        self.lower_bound = store.get(self.pointers[0].0);
        true
    }

    /// Score one d1-decoded run. Returns `false` when the oracle bound
    /// filled the heap mid-run; the remainder of the run is discarded.
    #[inline]
    pub fn process(&mut self, doc_ids: &[u32], impact: V) -> bool {
        for &doc in doc_ids {
            if !self.add_rsv(doc, impact) {
                return false;
            }
        }
        true
    }

    pub fn sort(&mut self) {
        let store = &self.store;
        let less = |a: AccRef, b: AccRef| (store.get(a.0), a) < (store.get(b.0), b);
        topk::sort_descending(&mut self.pointers[self.need..], less);
    }

    /// The filled suffix in rank order; valid only after [`Self::sort`].
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
    use crate::accumulators::PagedAccumulators;

    fn engine(documents: u32, k: usize) -> HeapEngine<PagedAccumulators<u16>, u16> {
        HeapEngine::new(PagedAccumulators::new(documents, 0).unwrap(), k)
    }

    #[test]
    fn test_promotion_and_eviction() {
        let mut e = engine(1024, 2);
        assert!(e.add_rsv(2, 10));
        assert!(e.add_rsv(3, 20));
        assert!(e.add_rsv(2, 2));
        assert!(e.add_rsv(1, 1));
        assert!(e.add_rsv(1, 14));

        e.sort();
        let ranked: Vec<(u32, u16)> = e.ranked().iter().map(|&r| (r.0, e.value_of(r))).collect();
        assert_eq!(ranked, vec![(3, 20), (1, 15)]);
    }

    #[test]
    fn test_below_bound_never_enters() {
        let mut e = engine(64, 3);
        e.rewind(5); // oracle bar of five
        assert!(e.add_rsv(1, 4));
        e.sort();
        assert!(e.ranked().is_empty());
    }

    #[test]
    fn test_oracle_fill_signals_stop() {
        let mut e = engine(64, 2);
        e.rewind(10);
        assert!(e.add_rsv(1, 10));
        assert!(!e.add_rsv(2, 12), "second qualifying doc fills the heap");
    }

    #[test]
    fn test_value_tie_prefers_larger_slot() {
        let mut e = engine(64, 2);
        assert!(e.add_rsv(4, 7));
        assert!(e.add_rsv(9, 7));
        // doc 2 ties the minimum from a smaller slot: rejected
        assert!(e.add_rsv(2, 7));
        // doc 30 ties the minimum from a larger slot: evicts it
        assert!(e.add_rsv(30, 7));

        e.sort();
        let ranked: Vec<u32> = e.ranked().iter().map(|r| r.0).collect();
        assert_eq!(ranked, vec![30, 9]);
    }
}
