//! Index construction: the mirror image of the region readers.
//!
//! Accumulates `(term, impact, document)` postings in memory, then writes
//! the four region files. Terms are emitted in lexicographic order and
//! each term's segments in descending impact order with ascending,
//! delta-encoded document ids - the layout the query path depends on.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use byteorder::{LittleEndian, WriteBytesExt};
use log::{info, warn};
use rustc_hash::FxHashMap;

use super::{CODEC_NAME_BYTES, DOCLIST_FILE, POSTINGS_FILE, POSTINGS_MAGIC, TERMS_FILE, VOCAB_FILE};
use crate::DocId;
use crate::codecs::PostingCodec;
use crate::error::{Error, Result};

#[derive(Default)]
pub struct IndexBuilder {
    keys: Vec<String>,
    /// term -> impact -> documents carrying that impact
    postings: FxHashMap<String, BTreeMap<u32, Vec<DocId>>>,
}

impl IndexBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a document; returns its id. Ids are dense and assigned in
    /// insertion order.
    pub fn add_document(&mut self, primary_key: &str) -> DocId {
        self.keys.push(primary_key.to_string());
        (self.keys.len() - 1) as DocId
    }

    /// Record that `doc` carries `term` with the given impact. Impacts
    /// must be positive; a zero impact posting is dropped.
    pub fn add_posting(&mut self, term: &str, doc: DocId, impact: u32) {
        if impact == 0 {
            warn!("dropping zero-impact posting for term `{term}`");
            return;
        }
        self.postings
            .entry(term.to_string())
            .or_default()
            .entry(impact)
            .or_default()
            .push(doc);
    }

    pub fn documents(&self) -> usize {
        self.keys.len()
    }

    pub fn terms(&self) -> usize {
        self.postings.len()
    }

    /// Write the four region files into `dir`, encoding posting segments
    /// with `codec`. A segment the codec cannot fit is dropped with a
    /// warning; everything else fails the whole write.
    pub fn write(&self, dir: &Path, codec: &dyn PostingCodec) -> Result<()> {
        if codec.name().len() > CODEC_NAME_BYTES {
            return Err(Error::InvalidOption(format!(
                "codec name `{}` too long for the postings header",
                codec.name()
            )));
        }
        fs::create_dir_all(dir)?;

        // doclist: packed keys, offset table, trailing count
        let mut doclist = Vec::new();
        let mut offsets = Vec::with_capacity(self.keys.len());
        for key in &self.keys {
            offsets.push(doclist.len() as u64);
            doclist.extend_from_slice(key.as_bytes());
            doclist.push(0);
        }
        for offset in offsets {
            doclist.write_u64::<LittleEndian>(offset)?;
        }
        doclist.write_u64::<LittleEndian>(self.keys.len() as u64)?;

        // postings + vocabulary + term strings, terms in sorted order
        let mut postings = Vec::new();
        postings.write_u32::<LittleEndian>(POSTINGS_MAGIC)?;
        let mut name = [0u8; CODEC_NAME_BYTES];
        name[..codec.name().len()].copy_from_slice(codec.name().as_bytes());
        postings.extend_from_slice(&name);

        let mut vocab = Vec::new();
        let mut terms_blob = Vec::new();

        let mut term_list: Vec<&String> = self.postings.keys().collect();
        term_list.sort();

        for term in term_list {
            let buckets = &self.postings[term];
            let term_offset = terms_blob.len() as u64;
            terms_blob.extend_from_slice(term.as_bytes());
            terms_blob.push(0);

            let postings_offset = postings.len() as u64;
            // segment bodies are buffered so the count can exclude any
            // segment the codec rejects
            let mut segments: Vec<(u32, usize, Vec<u8>)> = Vec::with_capacity(buckets.len());
            let mut document_frequency = 0u64;

            for (&impact, docs) in buckets.iter().rev() {
                let mut docs = docs.clone();
                docs.sort_unstable();
                docs.dedup();

                let mut deltas = Vec::with_capacity(docs.len());
                let mut previous = 0;
                for &doc in &docs {
                    deltas.push(doc - previous);
                    previous = doc;
                }

                let mut encoded = vec![0u8; deltas.len() * 5 + deltas.len() / 128 + 16];
                let written = codec.encode(&mut encoded, &deltas);
                if written == 0 {
                    warn!(
                        "codec {} overflowed on `{term}` impact {impact} ({} postings), segment dropped",
                        codec.name(),
                        docs.len()
                    );
                    continue;
                }
                encoded.truncate(written);
                document_frequency += docs.len() as u64;
                segments.push((impact, docs.len(), encoded));
            }

            postings.write_u32::<LittleEndian>(segments.len() as u32)?;
            for (impact, count, encoded) in segments {
                postings.write_u32::<LittleEndian>(impact)?;
                postings.write_u32::<LittleEndian>(count as u32)?;
                postings.write_u32::<LittleEndian>(encoded.len() as u32)?;
                postings.extend_from_slice(&encoded);
            }

            vocab.write_u64::<LittleEndian>(term_offset)?;
            vocab.write_u64::<LittleEndian>(postings_offset)?;
            vocab.write_u64::<LittleEndian>(document_frequency)?;
        }

        fs::write(dir.join(DOCLIST_FILE), &doclist)?;
        fs::write(dir.join(VOCAB_FILE), &vocab)?;
        fs::write(dir.join(TERMS_FILE), &terms_blob)?;
        fs::write(dir.join(POSTINGS_FILE), &postings)?;

        info!(
            "[index] wrote {} documents, {} terms ({} posting bytes, codec {})",
            self.keys.len(),
            self.postings.len(),
            postings.len(),
            codec.name()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::InvertedIndex;
    use super::*;
    use crate::codecs::VariableByte;

    fn scratch_dir(tag: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("saat-writer-{tag}-{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn test_write_then_open() {
        let dir = scratch_dir("roundtrip");
        let mut builder = IndexBuilder::new();
        for key in ["zero", "one", "two", "three"] {
            builder.add_document(key);
        }
        builder.add_posting("apple", 1, 3);
        builder.add_posting("apple", 3, 3);
        builder.add_posting("apple", 2, 7);
        builder.add_posting("pear", 0, 1);
        builder.write(&dir, &VariableByte).unwrap();

        let index = InvertedIndex::open(&dir).unwrap();
        assert_eq!(index.documents(), 4);
        assert_eq!(index.primary_keys().get(3), "three");
        assert_eq!(index.codec().unwrap().name(), "vbyte");

        let entry = index.vocabulary().get("apple").unwrap();
        assert_eq!(entry.document_frequency, 3);
        let segments = index.term_segments(entry).unwrap();
        assert_eq!(segments.len(), 2);
        // descending impact order
        assert_eq!(segments[0].impact, 7);
        assert_eq!(segments[0].count, 1);
        assert_eq!(segments[1].impact, 3);
        assert_eq!(segments[1].count, 2);

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_open_rejects_bad_magic() {
        let dir = scratch_dir("magic");
        let mut builder = IndexBuilder::new();
        builder.add_document("only");
        builder.add_posting("t", 0, 1);
        builder.write(&dir, &VariableByte).unwrap();

        let path = dir.join(POSTINGS_FILE);
        let mut bytes = fs::read(&path).unwrap();
        bytes[0] ^= 0xff;
        fs::write(&path, &bytes).unwrap();

        assert!(matches!(
            InvertedIndex::open(&dir),
            Err(Error::Corruption(_))
        ));
        fs::remove_dir_all(&dir).unwrap();
    }
}
