//! On-disk index: bit-exact readers for the four regions, plus a writer.
//!
//! All integers are little-endian. The regions are:
//!
//! - **doclist** (`doclist.bin`): packed NUL-terminated primary-key
//!   strings, then `D` u64 offsets into that blob, then a trailing u64
//!   holding `D`
//! - **vocabulary** (`vocab.bin`): `T` records of three u64 fields
//!   `(term_string_offset, postings_offset, document_frequency)`
//! - **terms** (`terms.bin`): packed NUL-terminated term strings indexed
//!   by `term_string_offset`
//! - **postings** (`postings.bin`): `[magic: u32]["codec name": 12 bytes,
//!   NUL-padded]`, then per-term regions addressed by `postings_offset`:
//!   `[n_segments: u32]` followed by `n_segments` of
//!   `[impact: u32][count: u32][byte_len: u32][byte_len bytes]`, impacts
//!   strictly descending
//!
//! The loaders bounds-check everything and surface malformed regions as
//! [`Error::Corruption`]; past loading, the query path trusts the index.

mod writer;

pub use writer::IndexBuilder;

use std::fs;
use std::path::Path;

use byteorder::{ByteOrder, LittleEndian};
use log::info;
use rustc_hash::FxHashMap;

use crate::DocId;
use crate::codecs::{PostingCodec, codec_by_name};
use crate::error::{Error, Result};

pub const DOCLIST_FILE: &str = "doclist.bin";
pub const VOCAB_FILE: &str = "vocab.bin";
pub const TERMS_FILE: &str = "terms.bin";
pub const POSTINGS_FILE: &str = "postings.bin";

/// Magic bytes at the head of the postings file ("SAAT" in LE).
pub(crate) const POSTINGS_MAGIC: u32 = 0x5441_4153;

/// Bytes reserved for the codec name after the magic.
pub(crate) const CODEC_NAME_BYTES: usize = 12;

/// Bytes of postings-file header before the first term region.
pub(crate) const POSTINGS_HEADER_BYTES: usize = 4 + CODEC_NAME_BYTES;

/// The external identifiers of the collection, indexed by document id.
///
/// Shared read-only across query processors; the blob is UTF-8 validated
/// once at load so lookups are plain slicing.
pub struct PrimaryKeys {
    text: String,
    /// `(start, len)` per document, into `text`.
    spans: Vec<(u32, u32)>,
}

impl PrimaryKeys {
    /// Parse the doclist region.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() < 8 {
            return Err(Error::Corruption("doclist shorter than its footer".into()));
        }
        let documents = LittleEndian::read_u64(&data[data.len() - 8..]);
        let table = documents
            .checked_mul(8)
            .and_then(|t| t.checked_add(8))
            .filter(|&t| t <= data.len() as u64)
            .ok_or_else(|| {
                Error::Corruption(format!("doclist claims {documents} documents"))
            })? as usize;
        let blob_len = data.len() - table;

        let text = std::str::from_utf8(&data[..blob_len])
            .map_err(|_| Error::Corruption("doclist keys are not UTF-8".into()))?
            .to_string();

        let mut spans = Vec::with_capacity(documents as usize);
        for doc in 0..documents as usize {
            let offset = LittleEndian::read_u64(&data[blob_len + doc * 8..]) as usize;
            if offset >= blob_len {
                return Err(Error::Corruption(format!(
                    "doclist offset {offset} for document {doc} outside key blob"
                )));
            }
            let len = text.as_bytes()[offset..blob_len]
                .iter()
                .position(|&b| b == 0)
                .ok_or_else(|| {
                    Error::Corruption(format!("unterminated primary key for document {doc}"))
                })?;
            spans.push((offset as u32, len as u32));
        }

        info!(
            "[index] loaded {} primary keys ({} key bytes)",
            spans.len(),
            blob_len
        );
        Ok(Self { text, spans })
    }

    /// Build the table directly from strings; used by tests and the
    /// writer.
    pub fn from_strings<S: AsRef<str>>(keys: &[S]) -> Self {
        let mut text = String::new();
        let mut spans = Vec::with_capacity(keys.len());
        for key in keys {
            let key = key.as_ref();
            spans.push((text.len() as u32, key.len() as u32));
            text.push_str(key);
            text.push('\0');
        }
        Self { text, spans }
    }

    pub fn len(&self) -> usize {
        self.spans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    /// The primary key of `doc`.
    #[inline]
    pub fn get(&self, doc: DocId) -> &str {
        let (start, len) = self.spans[doc as usize];
        &self.text[start as usize..(start + len) as usize]
    }
}

/// Vocabulary record: where a term's postings live and how many documents
/// carry it.
#[derive(Clone, Copy, Debug)]
pub struct TermEntry {
    pub postings_offset: u64,
    pub document_frequency: u64,
}

/// Term dictionary: the triple region joined with the packed term
/// strings.
pub struct Vocabulary {
    entries: FxHashMap<Box<str>, TermEntry>,
}

impl Vocabulary {
    pub fn from_bytes(vocab: &[u8], terms: &[u8]) -> Result<Self> {
        if vocab.len() % 24 != 0 {
            return Err(Error::Corruption(format!(
                "vocabulary region of {} bytes is not a whole number of records",
                vocab.len()
            )));
        }
        let count = vocab.len() / 24;
        let mut entries = FxHashMap::with_capacity_and_hasher(count, Default::default());

        for record in 0..count {
            let base = record * 24;
            let term_offset = LittleEndian::read_u64(&vocab[base..]) as usize;
            let postings_offset = LittleEndian::read_u64(&vocab[base + 8..]);
            let document_frequency = LittleEndian::read_u64(&vocab[base + 16..]);

            if term_offset >= terms.len() {
                return Err(Error::Corruption(format!(
                    "term offset {term_offset} in record {record} outside term blob"
                )));
            }
            let tail = &terms[term_offset..];
            let len = tail.iter().position(|&b| b == 0).ok_or_else(|| {
                Error::Corruption(format!("unterminated term string in record {record}"))
            })?;
            let term = std::str::from_utf8(&tail[..len])
                .map_err(|_| Error::Corruption(format!("term in record {record} is not UTF-8")))?;

            entries.insert(
                term.into(),
                TermEntry {
                    postings_offset,
                    document_frequency,
                },
            );
        }

        info!("[index] loaded {} vocabulary terms", entries.len());
        Ok(Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, term: &str) -> Option<TermEntry> {
        self.entries.get(term).copied()
    }
}

/// One impact segment of a posting list: every document in `bytes`
/// (delta-encoded, `count` integers) receives `impact`.
#[derive(Debug, Clone, Copy)]
pub struct PostingSegment<'a> {
    pub impact: u32,
    pub count: usize,
    pub bytes: &'a [u8],
}

/// A loaded index: the three dictionary regions plus the opaque postings
/// blob.
pub struct InvertedIndex {
    primary_keys: PrimaryKeys,
    vocabulary: Vocabulary,
    postings: Vec<u8>,
    codec_name: String,
}

impl InvertedIndex {
    /// Load the four region files from `dir`.
    pub fn open(dir: &Path) -> Result<Self> {
        let doclist = fs::read(dir.join(DOCLIST_FILE))?;
        let primary_keys = PrimaryKeys::from_bytes(&doclist)?;

        let vocab = fs::read(dir.join(VOCAB_FILE))?;
        let terms = fs::read(dir.join(TERMS_FILE))?;
        let vocabulary = Vocabulary::from_bytes(&vocab, &terms)?;

        let postings = fs::read(dir.join(POSTINGS_FILE))?;
        if postings.len() < POSTINGS_HEADER_BYTES {
            return Err(Error::Corruption("postings file shorter than its header".into()));
        }
        if LittleEndian::read_u32(&postings) != POSTINGS_MAGIC {
            return Err(Error::Corruption("postings file has wrong magic".into()));
        }
        let name_raw = &postings[4..POSTINGS_HEADER_BYTES];
        let name_end = name_raw.iter().position(|&b| b == 0).unwrap_or(CODEC_NAME_BYTES);
        let codec_name = std::str::from_utf8(&name_raw[..name_end])
            .map_err(|_| Error::Corruption("postings codec name is not UTF-8".into()))?
            .to_string();

        info!(
            "[index] loaded {} documents, {} terms, {} posting bytes (codec {})",
            primary_keys.len(),
            vocabulary.len(),
            postings.len(),
            codec_name
        );
        Ok(Self {
            primary_keys,
            vocabulary,
            postings,
            codec_name,
        })
    }

    pub fn documents(&self) -> u32 {
        self.primary_keys.len() as u32
    }

    pub fn primary_keys(&self) -> &PrimaryKeys {
        &self.primary_keys
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    /// The codec the postings were written with.
    pub fn codec(&self) -> Result<&'static dyn PostingCodec> {
        codec_by_name(&self.codec_name)
            .ok_or_else(|| Error::UnknownCodec(self.codec_name.clone()))
    }

    /// The impact segments behind a vocabulary entry, highest impact
    /// first (the order the writer laid them out in; enforced here).
    pub fn term_segments(&self, entry: TermEntry) -> Result<Vec<PostingSegment<'_>>> {
        let data = &self.postings;
        let mut at = entry.postings_offset as usize;
        if at < POSTINGS_HEADER_BYTES || at + 4 > data.len() {
            return Err(Error::Corruption(format!(
                "postings offset {at} outside postings blob"
            )));
        }

        let n_segments = LittleEndian::read_u32(&data[at..]) as usize;
        at += 4;

        let mut segments = Vec::with_capacity(n_segments);
        let mut previous_impact: Option<u32> = None;
        for _ in 0..n_segments {
            if at + 12 > data.len() {
                return Err(Error::Corruption("truncated posting segment header".into()));
            }
            let impact = LittleEndian::read_u32(&data[at..]);
            let count = LittleEndian::read_u32(&data[at + 4..]) as usize;
            let byte_len = LittleEndian::read_u32(&data[at + 8..]) as usize;
            at += 12;

            if impact == 0 || previous_impact.is_some_and(|previous| impact >= previous) {
                return Err(Error::Corruption(
                    "posting segments out of descending impact order".into(),
                ));
            }
            previous_impact = Some(impact);

            if at + byte_len > data.len() {
                return Err(Error::Corruption("truncated posting segment body".into()));
            }
            segments.push(PostingSegment {
                impact,
                count,
                bytes: &data[at..at + byte_len],
            });
            at += byte_len;
        }
        Ok(segments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primary_keys_from_strings() {
        let keys = PrimaryKeys::from_strings(&["zero", "one", "two"]);
        assert_eq!(keys.len(), 3);
        assert_eq!(keys.get(0), "zero");
        assert_eq!(keys.get(2), "two");
    }

    #[test]
    fn test_primary_keys_roundtrip_through_bytes() {
        let mut blob = Vec::new();
        let mut offsets = Vec::new();
        for key in ["alpha", "beta"] {
            offsets.push(blob.len() as u64);
            blob.extend_from_slice(key.as_bytes());
            blob.push(0);
        }
        for offset in &offsets {
            blob.extend_from_slice(&offset.to_le_bytes());
        }
        blob.extend_from_slice(&2u64.to_le_bytes());

        let keys = PrimaryKeys::from_bytes(&blob).unwrap();
        assert_eq!(keys.len(), 2);
        assert_eq!(keys.get(0), "alpha");
        assert_eq!(keys.get(1), "beta");
    }

    #[test]
    fn test_primary_keys_rejects_garbage() {
        assert!(PrimaryKeys::from_bytes(&[]).is_err());
        // claims more documents than the file can hold
        let mut blob = vec![0u8; 8];
        blob.extend_from_slice(&u64::MAX.to_le_bytes());
        assert!(PrimaryKeys::from_bytes(&blob).is_err());
    }

    #[test]
    fn test_vocabulary_rejects_ragged_region() {
        assert!(Vocabulary::from_bytes(&[0u8; 23], &[]).is_err());
    }

    #[test]
    fn test_vocabulary_lookup() {
        let mut terms = Vec::new();
        let mut vocab = Vec::new();
        for (i, term) in ["apple", "pear"].iter().enumerate() {
            vocab.extend_from_slice(&(terms.len() as u64).to_le_bytes());
            vocab.extend_from_slice(&(100 * i as u64).to_le_bytes());
            vocab.extend_from_slice(&(7u64).to_le_bytes());
            terms.extend_from_slice(term.as_bytes());
            terms.push(0);
        }

        let vocabulary = Vocabulary::from_bytes(&vocab, &terms).unwrap();
        assert_eq!(vocabulary.len(), 2);
        let entry = vocabulary.get("pear").unwrap();
        assert_eq!(entry.postings_offset, 100);
        assert_eq!(entry.document_frequency, 7);
        assert!(vocabulary.get("plum").is_none());
    }
}
