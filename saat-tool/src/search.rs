//! Query execution: load an index, run each topic, emit a TREC run.

use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use tracing::info;

use saat_core::{InvertedIndex, QueryProcessor, Rsv, RsvWidth, Strategy, export_trec};

pub struct SearchArgs {
    pub index: PathBuf,
    pub queries: Option<PathBuf>,
    pub strategy: String,
    pub top_k: usize,
    pub width: u32,
    pub lower_bound: u32,
    pub run_name: String,
    pub include_internal_ids: bool,
    pub output: Option<PathBuf>,
}

pub fn run_queries(args: &SearchArgs) -> Result<()> {
    let strategy: Strategy = args.strategy.parse()?;

    let start = Instant::now();
    let index = InvertedIndex::open(&args.index)
        .with_context(|| format!("opening index {}", args.index.display()))?;
    let codec = index.codec()?;
    info!(
        "loaded {} documents, {} terms in {:.1?} (strategy {}, codec {})",
        index.documents(),
        index.vocabulary().len(),
        start.elapsed(),
        strategy.name(),
        codec.name()
    );

    let mut processor: QueryProcessor<'_, Rsv> = QueryProcessor::new(
        strategy,
        codec,
        index.primary_keys(),
        index.documents(),
        args.top_k,
        args.width,
    )?;

    let reader: Box<dyn BufRead> = match &args.queries {
        Some(path) => Box::new(BufReader::new(
            File::open(path).with_context(|| format!("opening queries {}", path.display()))?,
        )),
        None => Box::new(BufReader::new(io::stdin())),
    };
    let mut out: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("creating run file {}", path.display()))?,
        )),
        None => Box::new(BufWriter::new(io::stdout())),
    };

    let mut topics = 0usize;
    for line in reader.lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let (topic_id, text) = line.split_once(char::is_whitespace).unwrap_or((line, ""));

        execute(&index, &mut processor, text, args.lower_bound)?;
        export_trec(
            &mut out,
            topic_id,
            &mut processor,
            &args.run_name,
            args.include_internal_ids,
        )?;
        topics += 1;
    }
    out.flush()?;
    info!("ran {} topics in {:.1?}", topics, start.elapsed());
    Ok(())
}

/// One query: rewind, parse, stream every matching impact segment in
/// descending impact order, stopping early if the processor says so.
fn execute(
    index: &InvertedIndex,
    processor: &mut QueryProcessor<'_, Rsv>,
    text: &str,
    lower_bound: u32,
) -> Result<()> {
    processor.rewind(Rsv::ONE, Rsv::from_u32(lower_bound), Rsv::MAX_RSV);
    processor.parse(text);

    let terms = processor.terms().to_vec();
    'query: for term in &terms {
        if let Some(entry) = index.vocabulary().get(term) {
            for segment in index.term_segments(entry)? {
                if !processor.decode_and_process(segment.impact, segment.count, segment.bytes) {
                    break 'query;
                }
            }
        }
    }
    Ok(())
}
