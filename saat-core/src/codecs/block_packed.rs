//! Bit-packed 128-integer blocks with a variable-byte tail.
//!
//! Full blocks are packed with `bitpacking::BitPacker4x` and framed as
//! `[num_bits: u8][num_bits * 16 bytes]`; the final partial block (if any)
//! is stop-bit vbyte. Values are stored verbatim - the caller owns any
//! delta transform, so ordering is not assumed here.

use bitpacking::{BitPacker, BitPacker4x};

use super::{PostingCodec, VariableByte};

/// Integers per packed block (128 for the 4x packer).
pub(crate) const BLOCK_LEN: usize = BitPacker4x::BLOCK_LEN;

pub struct BlockPacked;

impl PostingCodec for BlockPacked {
    fn name(&self) -> &'static str {
        "block_packed"
    }

    fn encode(&self, dst: &mut [u8], src: &[u32]) -> usize {
        let packer = BitPacker4x::new();
        let mut at = 0;

        let mut chunks = src.chunks_exact(BLOCK_LEN);
        for chunk in &mut chunks {
            let num_bits = packer.num_bits(chunk);
            let packed = num_bits as usize * BLOCK_LEN / 8;
            if at + 1 + packed > dst.len() {
                return 0;
            }
            dst[at] = num_bits;
            packer.compress(chunk, &mut dst[at + 1..], num_bits);
            at += 1 + packed;
        }

        for &value in chunks.remainder() {
            match VariableByte::write(dst, at, value) {
                Some(next) => at = next,
                None => return 0,
            }
        }
        at
    }

    fn decode(&self, dst: &mut [u32], count: usize, src: &[u8]) {
        let packer = BitPacker4x::new();
        let mut at = 0;

        let full_blocks = count / BLOCK_LEN;
        for block in 0..full_blocks {
            let num_bits = src[at];
            let packed = num_bits as usize * BLOCK_LEN / 8;
            packer.decompress(
                &src[at + 1..at + 1 + packed],
                &mut dst[block * BLOCK_LEN..][..BLOCK_LEN],
                num_bits,
            );
            at += 1 + packed;
        }

        for out in &mut dst[full_blocks * BLOCK_LEN..count] {
            *out = VariableByte::read(src, &mut at);
        }
    }
}
