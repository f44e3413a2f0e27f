//! TREC run formatting.
//!
//! One row per result, six whitespace-separated columns:
//! `topic_id Q0 primary_key rank rsv run_name`, rank starting at 1, in
//! rank order. With `include_internal_ids` each row gains an
//! `(ID:doc_id->rsv)` suffix for debugging against the internal ids.

use std::io::{self, Write};

use crate::accumulators::RsvWidth;
use crate::query::QueryProcessor;

pub fn export_trec<W: Write, V: RsvWidth>(
    out: &mut W,
    topic_id: &str,
    processor: &mut QueryProcessor<'_, V>,
    run_name: &str,
    include_internal_ids: bool,
) -> io::Result<()> {
    for (at, hit) in processor.results().enumerate() {
        write!(
            out,
            "{} Q0 {} {} {} {}",
            topic_id,
            hit.primary_key,
            at + 1,
            hit.rsv.to_u32(),
            run_name
        )?;
        if include_internal_ids {
            write!(out, "(ID:{}->{})", hit.doc_id, hit.rsv.to_u32())?;
        }
        writeln!(out)?;
    }
    Ok(())
}
