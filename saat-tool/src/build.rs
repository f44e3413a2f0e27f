//! Index building from a JSONL corpus.
//!
//! One JSON object per line with an `id` string and a `content` string;
//! within-document term frequency (capped) is the impact.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use tracing::{info, warn};

use saat_core::{IndexBuilder, ParseMode, codec_by_name, parse_into};

#[derive(Deserialize)]
struct CorpusDocument {
    id: String,
    content: String,
}

pub fn build_index(
    index_dir: &Path,
    documents: Option<&Path>,
    use_stdin: bool,
    codec_name: &str,
    max_impact: u32,
    progress: usize,
) -> Result<()> {
    let codec = codec_by_name(codec_name)
        .with_context(|| format!("unknown codec `{codec_name}`"))?;
    if max_impact == 0 {
        bail!("--max-impact must be at least 1");
    }

    let reader: Box<dyn BufRead> = if use_stdin {
        Box::new(BufReader::new(io::stdin()))
    } else {
        let path = documents.expect("clap enforces --documents unless --stdin");
        Box::new(BufReader::new(
            File::open(path).with_context(|| format!("opening corpus {}", path.display()))?,
        ))
    };

    let mut builder = IndexBuilder::new();
    let mut errors = 0usize;
    let mut tokens = Vec::new();

    for (line_number, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let document: CorpusDocument = match serde_json::from_str(&line) {
            Ok(document) => document,
            Err(error) => {
                warn!("failed to parse JSON at line {}: {}", line_number + 1, error);
                errors += 1;
                continue;
            }
        };

        let doc = builder.add_document(&document.id);

        tokens.clear();
        parse_into(&mut tokens, &document.content, ParseMode::Query);
        let mut frequencies: BTreeMap<&str, u32> = BTreeMap::new();
        for token in &tokens {
            *frequencies.entry(token.as_str()).or_insert(0) += 1;
        }
        for (term, tf) in frequencies {
            builder.add_posting(term, doc, tf.min(max_impact));
        }

        if progress > 0 && builder.documents() % progress == 0 {
            info!("indexed {} documents", builder.documents());
        }
    }

    if errors > 0 {
        warn!("skipped {} corpus lines due to parse errors", errors);
    }
    if builder.documents() == 0 {
        bail!("corpus contained no documents");
    }

    builder
        .write(index_dir, codec)
        .with_context(|| format!("writing index to {}", index_dir.display()))?;
    info!(
        "built index: {} documents, {} terms, codec {}",
        builder.documents(),
        builder.terms(),
        codec.name()
    );
    Ok(())
}
