//! Query lifecycle driver and processing variants.
//!
//! One [`QueryProcessor`] handles one query at a time: rewind, parse,
//! feed impact segments in descending impact order, sort, enumerate.
//! Data flows *driver -> decode -> accumulator -> top-k* per segment, then
//! *driver -> sort -> results*.
//!
//! Four strategies pick the accumulator store and the top-k discipline:
//!
//! | name        | accumulators     | top-k                          |
//! |-------------|------------------|--------------------------------|
//! | `2d_heap`   | paged lazy-zero  | heap maintained while scoring  |
//! | `1d_heap`   | flat             | heap maintained while scoring  |
//! | `simple`    | flat             | full scan at sort time         |
//! | `blockmax`  | flat + block max | block-skipping scan at sort    |
//!
//! The strategies form a closed set, so dispatch is a tagged enum and the
//! per-posting loops monomorphize; the match happens once per segment,
//! not once per posting.

mod block_max_driven;
mod heap;
mod parser;
mod scan;

pub use parser::{ParseMode, parse_into};

use std::str::FromStr;

use block_max_driven::BlockMaxEngine;
use heap::HeapEngine;
use scan::ScanEngine;

use crate::accumulators::{
    AccRef, BlockMaxAccumulators, FlatAccumulators, PagedAccumulators, RsvWidth,
};
use crate::codecs::{DECODER_SLACK, PostingCodec};
use crate::error::{Error, Result};
use crate::index::PrimaryKeys;
use crate::{DocId, MAX_TOP_K, Rsv, simd};

/// Accumulator management strategy, normally chosen on the command line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Strategy {
    PagedHeap,
    FlatHeap,
    Scan,
    BlockMax,
}

impl Strategy {
    pub fn name(self) -> &'static str {
        match self {
            Strategy::PagedHeap => "2d_heap",
            Strategy::FlatHeap => "1d_heap",
            Strategy::Scan => "simple",
            Strategy::BlockMax => "blockmax",
        }
    }
}

impl FromStr for Strategy {
    type Err = Error;

    fn from_str(name: &str) -> Result<Self> {
        match name {
            "2d_heap" => Ok(Strategy::PagedHeap),
            "1d_heap" => Ok(Strategy::FlatHeap),
            "simple" => Ok(Strategy::Scan),
            "blockmax" => Ok(Strategy::BlockMax),
            other => Err(Error::InvalidOption(format!(
                "unknown accumulator strategy `{other}`"
            ))),
        }
    }
}

enum Engine<V: RsvWidth> {
    PagedHeap(HeapEngine<PagedAccumulators<V>, V>),
    FlatHeap(HeapEngine<FlatAccumulators<V>, V>),
    Scan(ScanEngine<V>),
    BlockMax(BlockMaxEngine<V>),
}

/// One search result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchHit<'k, V> {
    pub doc_id: DocId,
    pub primary_key: &'k str,
    pub rsv: V,
}

/// Everything needed to process one query at a time.
///
/// Owns the accumulators, the top-k state and the decode scratch; borrows
/// the primary-key table and the codec, which are shared read-only across
/// processors. References into the accumulators stay valid until the next
/// [`rewind`](Self::rewind).
pub struct QueryProcessor<'a, V: RsvWidth = Rsv> {
    engine: Engine<V>,
    codec: &'a dyn PostingCodec,
    primary_keys: &'a PrimaryKeys,
    /// Decode buffer: `documents + DECODER_SLACK` integers, reused for
    /// every segment.
    scratch: Vec<u32>,
    terms: Vec<String>,
    k: usize,
    sorted: bool,
    done: bool,
}

impl<'a, V: RsvWidth> QueryProcessor<'a, V> {
    /// One-time sizing. `page_shift` of zero derives the page/block width
    /// from the document count (ignored by the flat strategies).
    pub fn new(
        strategy: Strategy,
        codec: &'a dyn PostingCodec,
        primary_keys: &'a PrimaryKeys,
        documents: u32,
        top_k: usize,
        page_shift: u32,
    ) -> Result<Self> {
        if top_k == 0 || top_k > MAX_TOP_K {
            return Err(Error::InvalidOption(format!(
                "top_k {top_k} outside [1, {MAX_TOP_K}]"
            )));
        }

        let engine = match strategy {
            Strategy::PagedHeap => Engine::PagedHeap(HeapEngine::new(
                PagedAccumulators::new(documents, page_shift)?,
                top_k,
            )),
            Strategy::FlatHeap => {
                Engine::FlatHeap(HeapEngine::new(FlatAccumulators::new(documents)?, top_k))
            }
            Strategy::Scan => Engine::Scan(ScanEngine::new(FlatAccumulators::new(documents)?, top_k)),
            Strategy::BlockMax => Engine::BlockMax(BlockMaxEngine::new(
                BlockMaxAccumulators::new(documents, page_shift)?,
                top_k,
            )),
        };
        log::debug!(
            "query processor: strategy={}, documents={}, top_k={}",
            strategy.name(),
            documents,
            top_k
        );

        let mut this = Self {
            engine,
            codec,
            primary_keys,
            scratch: vec![0; documents as usize + DECODER_SLACK],
            terms: Vec::new(),
            k: top_k,
            sorted: false,
            done: false,
        };
        this.rewind(V::ONE, V::ONE, V::MAX_RSV);
        Ok(this)
    }

    /// Per-query reset.
    ///
    /// `top_k_lower_bound` of one is the natural bound (untouched
    /// documents never rank); anything larger is an oracle bound below
    /// which no document can enter the top-k, and arms early termination
    /// the moment the heap fills. The outer bounds describe the score
    /// range of the collection and are currently informational.
    pub fn rewind(
        &mut self,
        _smallest_possible_rsv: V,
        top_k_lower_bound: V,
        _largest_possible_rsv: V,
    ) {
        self.sorted = false;
        self.done = false;
        self.terms.clear();
        match &mut self.engine {
            Engine::PagedHeap(e) => e.rewind(top_k_lower_bound),
            Engine::FlatHeap(e) => e.rewind(top_k_lower_bound),
            Engine::Scan(e) => e.rewind(),
            Engine::BlockMax(e) => e.rewind(),
        }
    }

    /// Tokenize `text` into the internal term list.
    pub fn parse(&mut self, text: &str) {
        parse_into(&mut self.terms, text, ParseMode::Query);
    }

    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    pub fn top_k(&self) -> usize {
        self.k
    }

    /// Add `impact` to the accumulator for `doc` and update the top-k
    /// state of the active strategy. Returns `false` once the top-k is
    /// final and the rest of the query can be skipped.
    #[inline]
    pub fn add_rsv(&mut self, doc: DocId, impact: V) -> bool {
        match &mut self.engine {
            Engine::PagedHeap(e) => e.add_rsv(doc, impact),
            Engine::FlatHeap(e) => e.add_rsv(doc, impact),
            Engine::Scan(e) => {
                e.process(&[doc], impact);
                true
            }
            Engine::BlockMax(e) => {
                e.process(&[doc], impact);
                true
            }
        }
    }

    /// Decode one impact segment (`count` first-difference integers in
    /// `bytes`) and score every document in it.
    ///
    /// Returns `false` once the top-k is final; the remainder of the
    /// segment and all later calls are discarded, so callers may simply
    /// stop iterating.
    pub fn decode_and_process(&mut self, impact: u32, count: usize, bytes: &[u8]) -> bool {
        if self.done {
            return false;
        }
        if count == 0 {
            return true;
        }

        let buffer = &mut self.scratch[..count + DECODER_SLACK];
        self.codec.decode(buffer, count, bytes);
        let doc_ids = &mut buffer[..count];
        simd::prefix_sum_in_place(doc_ids);

        let impact = V::from_u32(impact);
        let keep_going = match &mut self.engine {
            Engine::PagedHeap(e) => e.process(doc_ids, impact),
            Engine::FlatHeap(e) => e.process(doc_ids, impact),
            Engine::Scan(e) => {
                e.process(doc_ids, impact);
                true
            }
            Engine::BlockMax(e) => {
                e.process(doc_ids, impact);
                true
            }
        };
        if !keep_going {
            log::debug!("top-{} complete under oracle bound, skipping remainder", self.k);
            self.done = true;
        }
        keep_going
    }

    /// Rank the results. Idempotent; runs the deferred collect pass for
    /// the scan/block-max strategies on first call.
    pub fn sort(&mut self) {
        if self.sorted {
            return;
        }
        match &mut self.engine {
            Engine::PagedHeap(e) => e.sort(),
            Engine::FlatHeap(e) => e.sort(),
            Engine::Scan(e) => e.sort(),
            Engine::BlockMax(e) => e.sort(),
        }
        self.sorted = true;
    }

    /// Rank-ordered results, at most `top_k` of them; sorts on first use.
    pub fn results(&mut self) -> Results<'_, 'a, V> {
        self.sort();
        Results {
            processor: self,
            at: 0,
        }
    }

    fn ranked(&self) -> &[AccRef] {
        match &self.engine {
            Engine::PagedHeap(e) => e.ranked(),
            Engine::FlatHeap(e) => e.ranked(),
            Engine::Scan(e) => e.ranked(),
            Engine::BlockMax(e) => e.ranked(),
        }
    }

    fn value_of(&self, entry: AccRef) -> V {
        match &self.engine {
            Engine::PagedHeap(e) => e.value_of(entry),
            Engine::FlatHeap(e) => e.value_of(entry),
            Engine::Scan(e) => e.value_of(entry),
            Engine::BlockMax(e) => e.value_of(entry),
        }
    }
}

/// Iterator over ranked results; produced by [`QueryProcessor::results`].
pub struct Results<'p, 'k, V: RsvWidth> {
    processor: &'p QueryProcessor<'k, V>,
    at: usize,
}

impl<'p, 'k, V: RsvWidth> Iterator for Results<'p, 'k, V> {
    type Item = SearchHit<'k, V>;

    fn next(&mut self) -> Option<Self::Item> {
        let ranked = self.processor.ranked();
        if self.at >= ranked.len() {
            return None;
        }
        let entry = ranked[self.at];
        self.at += 1;

        let keys: &'k PrimaryKeys = self.processor.primary_keys;
        Some(SearchHit {
            doc_id: entry.0,
            primary_key: keys.get(entry.0),
            rsv: self.processor.value_of(entry),
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.processor.ranked().len() - self.at;
        (left, Some(left))
    }
}
