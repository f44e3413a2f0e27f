//! SIMD prefix sum for d1 decoding.
//!
//! Posting segments decode to first differences; the in-place cumulative
//! sum below turns them back into ascending document ids. Platform paths:
//!
//! - **NEON** on aarch64
//! - **SSE2** on x86_64 (baseline, always present)
//! - **Scalar fallback** for other architectures
//!
//! The scalar path defines the semantics; the vector paths must produce
//! bit-identical output.

// ============================================================================
// NEON intrinsics for aarch64
// ============================================================================

#[cfg(target_arch = "aarch64")]
#[allow(unsafe_op_in_unsafe_fn)]
mod neon {
    use std::arch::aarch64::*;

    /// In-place cumulative sum, four lanes per step with a broadcast carry.
    ///
    /// Within a group of four: [a, b, c, d] -> [a, a+b, a+b+c, a+b+c+d] via
    /// two shift-and-add steps, then the running total of the previous
    /// group is added to every lane.
    #[target_feature(enable = "neon")]
    pub unsafe fn prefix_sum_in_place(values: &mut [u32]) {
        let mut carry = vdupq_n_u32(0);
        let zero = vdupq_n_u32(0);
        let chunks = values.len() / 4;
        let ptr = values.as_mut_ptr();

        for chunk in 0..chunks {
            let p = ptr.add(chunk * 4);
            let mut v = vld1q_u32(p);
            v = vaddq_u32(v, vextq_u32(zero, v, 3));
            v = vaddq_u32(v, vextq_u32(zero, v, 2));
            v = vaddq_u32(v, carry);
            vst1q_u32(p, v);
            carry = vdupq_n_u32(vgetq_lane_u32(v, 3));
        }

        // Handle remainder
        let base = chunks * 4;
        let mut sum = if base > 0 { values[base - 1] } else { 0 };
        for value in &mut values[base..] {
            sum = sum.wrapping_add(*value);
            *value = sum;
        }
    }

    /// Always true on aarch64.
    #[inline]
    pub fn is_available() -> bool {
        true
    }
}

// ============================================================================
// SSE2 intrinsics for x86_64
// ============================================================================

#[cfg(target_arch = "x86_64")]
#[allow(unsafe_op_in_unsafe_fn)]
mod sse {
    use std::arch::x86_64::*;

    /// In-place cumulative sum, four lanes per step with a broadcast carry.
    #[target_feature(enable = "sse2")]
    pub unsafe fn prefix_sum_in_place(values: &mut [u32]) {
        let mut carry = _mm_setzero_si128();
        let chunks = values.len() / 4;
        let ptr = values.as_mut_ptr();

        for chunk in 0..chunks {
            let p = ptr.add(chunk * 4) as *mut __m128i;
            let mut v = _mm_loadu_si128(p);
            v = _mm_add_epi32(v, _mm_slli_si128(v, 4));
            v = _mm_add_epi32(v, _mm_slli_si128(v, 8));
            v = _mm_add_epi32(v, carry);
            _mm_storeu_si128(p, v);
            carry = _mm_shuffle_epi32(v, 0b1111_1111);
        }

        // Handle remainder
        let base = chunks * 4;
        let mut sum = if base > 0 { values[base - 1] } else { 0 };
        for value in &mut values[base..] {
            sum = sum.wrapping_add(*value);
            *value = sum;
        }
    }

    /// SSE2 is part of the x86_64 baseline.
    #[inline]
    pub fn is_available() -> bool {
        true
    }
}

mod scalar {
    /// Scalar cumulative sum
    #[inline]
    pub fn prefix_sum_in_place(values: &mut [u32]) {
        let mut sum = 0u32;
        for value in values {
            sum = sum.wrapping_add(*value);
            *value = sum;
        }
    }
}

// ============================================================================
// Public dispatch
// ============================================================================

/// In-place cumulative sum (d1 decode) with SIMD acceleration.
///
/// `values[i]` becomes `values[0] + ... + values[i]`; with first-difference
/// input this recovers the strictly ascending document-id sequence.
#[inline]
pub fn prefix_sum_in_place(values: &mut [u32]) {
    #[cfg(target_arch = "aarch64")]
    {
        if neon::is_available() {
            unsafe {
                neon::prefix_sum_in_place(values);
            }
            return;
        }
    }

    #[cfg(target_arch = "x86_64")]
    {
        if sse::is_available() {
            unsafe {
                sse::prefix_sum_in_place(values);
            }
            return;
        }
    }

    scalar::prefix_sum_in_place(values);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_sum_small() {
        let mut values = vec![1u32, 1, 1, 1, 1, 1];
        prefix_sum_in_place(&mut values);
        assert_eq!(values, vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_prefix_sum_gaps() {
        let mut values = vec![3u32, 4, 1, 100, 2];
        prefix_sum_in_place(&mut values);
        assert_eq!(values, vec![3, 7, 8, 108, 110]);
    }

    #[test]
    fn test_prefix_sum_matches_scalar() {
        // cover the 4-lane boundary and the remainder path
        for len in 0..67usize {
            let deltas: Vec<u32> = (0..len as u32).map(|i| (i * 7 + 3) % 13 + 1).collect();
            let mut simd_out = deltas.clone();
            let mut scalar_out = deltas;
            prefix_sum_in_place(&mut simd_out);
            scalar::prefix_sum_in_place(&mut scalar_out);
            assert_eq!(simd_out, scalar_out, "len {len}");
        }
    }

    #[test]
    fn test_prefix_sum_empty() {
        let mut values: Vec<u32> = vec![];
        prefix_sum_in_place(&mut values);
        assert!(values.is_empty());
    }
}
