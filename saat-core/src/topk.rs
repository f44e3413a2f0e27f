//! Bounded min-heap of accumulator references and the final ranking sort.
//!
//! The heap lives in a caller-owned slice of [`AccRef`]s and is ordered by
//! a caller-supplied strict `(value, slot)` comparator: the root is the
//! entry with the smallest score, smallest slot on a score tie. Keeping
//! the slot in the order makes the ordering total (slots are unique), so
//! "is this accumulator already in the heap" is decidable from the pair
//! (old value, slot) alone, and the final ranking is deterministic on
//! score ties.
//!
//! The functions take the comparator rather than the accumulator store so
//! the store can stay mutably borrowed elsewhere in the caller.

use std::cmp::Ordering;

use crate::accumulators::AccRef;

/// Establish the heap property over the whole slice.
#[inline]
pub fn make_heap(slots: &mut [AccRef], less: impl Fn(AccRef, AccRef) -> bool + Copy) {
    for start in (0..slots.len() / 2).rev() {
        sift_down(slots, start, less);
    }
}

/// Restore the heap property downward from `at`, after the entry there
/// grew in place or was replaced.
#[inline]
pub fn sift_down(slots: &mut [AccRef], mut at: usize, less: impl Fn(AccRef, AccRef) -> bool + Copy) {
    loop {
        let left = 2 * at + 1;
        if left >= slots.len() {
            break;
        }
        let right = left + 1;
        let child = if right < slots.len() && less(slots[right], slots[left]) {
            right
        } else {
            left
        };
        if less(slots[child], slots[at]) {
            slots.swap(child, at);
            at = child;
        } else {
            break;
        }
    }
}

/// Replace the minimum with `candidate` when the candidate orders above
/// it, evicting the old minimum.
#[inline]
pub fn replace_min(
    slots: &mut [AccRef],
    candidate: AccRef,
    less: impl Fn(AccRef, AccRef) -> bool + Copy,
) {
    if !slots.is_empty() && less(slots[0], candidate) {
        slots[0] = candidate;
        sift_down(slots, 0, less);
    }
}

/// Linear scan for an entry known to be in the heap; used when an in-heap
/// accumulator grows and has to be re-sifted.
#[inline]
pub fn position_of(slots: &[AccRef], entry: AccRef) -> Option<usize> {
    slots.iter().position(|&slot| slot == entry)
}

/// Sort into final rank order: score descending, slot descending on ties
/// (the inverse of the heap order).
#[inline]
pub fn sort_descending(slots: &mut [AccRef], less: impl Fn(AccRef, AccRef) -> bool + Copy) {
    slots.sort_unstable_by(|&a, &b| {
        if less(a, b) {
            Ordering::Greater
        } else if less(b, a) {
            Ordering::Less
        } else {
            Ordering::Equal
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cmp_on(values: &[u32]) -> impl Fn(AccRef, AccRef) -> bool + Copy + '_ {
        move |a, b| (values[a.0 as usize], a) < (values[b.0 as usize], b)
    }

    #[test]
    fn test_make_heap_roots_minimum() {
        let values = vec![20u32, 15, 12, 7, 30];
        let mut slots: Vec<AccRef> = (0..5).map(AccRef).collect();
        make_heap(&mut slots, cmp_on(&values));
        assert_eq!(slots[0], AccRef(3));
    }

    #[test]
    fn test_replace_min_evicts() {
        let values = vec![5u32, 9, 7, 11];
        let mut slots = vec![AccRef(0), AccRef(1), AccRef(2)];
        make_heap(&mut slots, cmp_on(&values));
        assert_eq!(slots[0], AccRef(0));

        replace_min(&mut slots, AccRef(3), cmp_on(&values));
        assert_eq!(slots[0], AccRef(2));
        assert!(position_of(&slots, AccRef(0)).is_none());
        assert!(position_of(&slots, AccRef(3)).is_some());
    }

    #[test]
    fn test_replace_min_rejects_smaller() {
        // candidate below the current minimum leaves the heap untouched
        let values = vec![5u32, 9, 7, 2];
        let mut slots = vec![AccRef(0), AccRef(1), AccRef(2)];
        make_heap(&mut slots, cmp_on(&values));
        replace_min(&mut slots, AccRef(3), cmp_on(&values));
        assert!(position_of(&slots, AccRef(3)).is_none());
    }

    #[test]
    fn test_tie_breaks_by_slot() {
        // equal values: the smaller slot is the smaller entry
        let values = vec![5u32, 5, 5];
        let mut slots = vec![AccRef(2), AccRef(1), AccRef(0)];
        make_heap(&mut slots, cmp_on(&values));
        assert_eq!(slots[0], AccRef(0));

        sort_descending(&mut slots, cmp_on(&values));
        assert_eq!(slots, vec![AccRef(2), AccRef(1), AccRef(0)]);
    }

    #[test]
    fn test_sift_down_after_in_place_growth() {
        let mut values = vec![5u32, 9, 7];
        let mut slots = vec![AccRef(0), AccRef(1), AccRef(2)];
        make_heap(&mut slots, cmp_on(&values));

        values[0] = 8; // grow the current minimum in place
        let at = position_of(&slots, AccRef(0)).unwrap();
        sift_down(&mut slots, at, cmp_on(&values));
        assert_eq!(slots[0], AccRef(2));
    }

    #[test]
    fn test_sort_descending_orders_by_value_then_slot() {
        let values = vec![3u32, 9, 3, 1];
        let mut slots: Vec<AccRef> = (0..4).map(AccRef).collect();
        sort_descending(&mut slots, cmp_on(&values));
        assert_eq!(slots, vec![AccRef(1), AccRef(2), AccRef(0), AccRef(3)]);
    }
}
