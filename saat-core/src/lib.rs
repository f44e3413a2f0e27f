//! Saat - an anytime, score-at-a-time top-k query processor
//!
//! The core of an impact-ordered retrieval engine: given a query and a
//! document-identifier index whose posting lists are grouped into
//! impact-descending segments, produce the k documents with the highest
//! cumulative impact score. The library provides:
//!
//! - Per-document score accumulators in three flavours (paged lazy-zero,
//!   flat, and block-max) so that per-query reset cost can be traded
//!   against first-touch cost
//! - A bounded min-heap of accumulator references with a deterministic
//!   slot-order tie-break
//! - A SIMD-accelerated posting decode loop (delta decode via prefix sum)
//!   with cooperative early termination under an oracle score bound
//! - Bit-exact readers (and a writer) for the on-disk index regions:
//!   primary keys, vocabulary triples, term strings, postings blob
//! - Posting-list integer codecs (raw, variable-byte, bit-packed blocks)
//! - A streaming TREC run exporter
//!
//! One `QueryProcessor` handles one query at a time; run several
//! processors for inter-query parallelism. All mutable state is owned by
//! the processor, only the primary-key table is shared (by const borrow).

pub mod accumulators;
pub mod codecs;
pub mod error;
pub mod index;
pub mod query;
pub mod run_export;
pub mod simd;
pub mod topk;

pub use accumulators::{
    AccRef, Accumulators, BlockMaxAccumulators, FlatAccumulators, PagedAccumulators, RsvWidth,
};
pub use codecs::{BlockPacked, DECODER_SLACK, Identity, PostingCodec, VariableByte, codec_by_name};
pub use error::{Error, Result};
pub use index::{IndexBuilder, InvertedIndex, PrimaryKeys, TermEntry, Vocabulary};
pub use query::{ParseMode, QueryProcessor, SearchHit, Strategy, parse_into};
pub use run_export::export_trec;

/// Internal document identifier; dense in `[0, documents)` and used
/// directly as the accumulator index.
pub type DocId = u32;

/// Accumulator width used by the shipped binaries.
///
/// The width is a build-time choice: any of `u8`, `u16`, `u32` works
/// wherever the crate is generic over [`RsvWidth`]. Callers guarantee that
/// per-segment impacts and their cumulative sums fit the chosen width; the
/// core does not check for overflow.
pub type Rsv = u16;

/// Largest collection size an index may address.
pub const MAX_DOCUMENTS: usize = 200_000_000;

/// Largest supported `k`.
pub const MAX_TOP_K: usize = 1_000;
