//! Posting-list integer codecs.
//!
//! A codec moves `u32` sequences to and from bytes. For posting segments
//! the integers are first differences of ascending document ids; codecs
//! store them verbatim and the query processor owns the prefix-sum
//! transform, so every codec here is interchangeable per segment.
//!
//! Contract:
//! - `encode` returns the bytes written, or 0 when the destination is too
//!   small (the caller discards the segment)
//! - `decode` writes exactly `count` integers and may scribble up to
//!   [`DECODER_SLACK`] trailing slots; callers size buffers accordingly

mod block_packed;
mod vbyte;

pub use block_packed::BlockPacked;
pub use vbyte::VariableByte;

/// Trailing scratch slots a decoder may overwrite past the requested
/// count. Decode buffers are sized `count + DECODER_SLACK`.
pub const DECODER_SLACK: usize = 64;

pub trait PostingCodec: Send + Sync {
    /// The registry name, also recorded in the postings file header.
    fn name(&self) -> &'static str;

    /// Encode `src` into `dst`; returns bytes written, 0 on overflow.
    fn encode(&self, dst: &mut [u8], src: &[u32]) -> usize;

    /// Decode exactly `count` integers from `src` into `dst`.
    fn decode(&self, dst: &mut [u32], count: usize, src: &[u8]);
}

/// Raw little-endian u32s; the do-nothing baseline codec.
pub struct Identity;

impl PostingCodec for Identity {
    fn name(&self) -> &'static str {
        "none"
    }

    fn encode(&self, dst: &mut [u8], src: &[u32]) -> usize {
        let bytes = src.len() * 4;
        if dst.len() < bytes {
            return 0;
        }
        for (chunk, &value) in dst.chunks_exact_mut(4).zip(src) {
            chunk.copy_from_slice(&value.to_le_bytes());
        }
        bytes
    }

    fn decode(&self, dst: &mut [u32], count: usize, src: &[u8]) {
        for (out, chunk) in dst[..count].iter_mut().zip(src.chunks_exact(4)) {
            *out = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        }
    }
}

/// Look a codec up by its registry name.
pub fn codec_by_name(name: &str) -> Option<&'static dyn PostingCodec> {
    match name {
        "none" => Some(&Identity),
        "vbyte" => Some(&VariableByte),
        "block_packed" => Some(&BlockPacked),
        _ => None,
    }
}
