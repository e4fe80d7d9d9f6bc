// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 itsakeyfut
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Fixed-point texture walk
//!
//! Column drawers step through a texture with a 16.16 fixed-point position.
//! The integer part is the texel index and the low 16 bits are the sub-texel
//! fraction. The i-th texel visited by a walk starting at `frac` with
//! increment `step` is:
//!
//! ```text
//! index(i) = (frac + i * step) >> 16
//! ```
//!
//! The walk is done incrementally (`frac += step`) with 32-bit wrapping
//! arithmetic and an arithmetic right shift, exactly like the hot loops do.
//! [`check_walk`] is used at command construction so the loops themselves
//! never need to range check.

use crate::core::error::{DrawerError, Result};
use crate::core::texture::Texel;

/// Number of fractional bits in a fixed-point value
pub const FRACBITS: u32 = 16;

/// Fixed-point 1.0
pub const FRACUNIT: i32 = 1 << FRACBITS;

/// 16.16 fixed-point value
pub type Fixed = i32;

/// Texel index visited at step `i` of a walk
///
/// # Examples
///
/// ```
/// use rtdraw::core::fixed::{sample_index, FRACUNIT};
///
/// // Half a texel per step: 0, 0, 1, 1, 2, ...
/// assert_eq!(sample_index(0, FRACUNIT / 2, 3), 1);
/// assert_eq!(sample_index(FRACUNIT * 5, FRACUNIT, 2), 7);
/// ```
#[inline(always)]
pub fn sample_index(frac: Fixed, step: Fixed, i: i32) -> i32 {
    frac.wrapping_add(step.wrapping_mul(i)) >> FRACBITS
}

/// Incremental fixed-point walk yielding texel indices
///
/// # Example
///
/// ```
/// use rtdraw::core::fixed::{FixedSampler, FRACUNIT};
///
/// let indices: Vec<i32> = FixedSampler::new(FRACUNIT / 4, FRACUNIT / 2, 4).collect();
/// assert_eq!(indices, vec![0, 0, 1, 1]);
/// ```
#[derive(Debug, Clone)]
pub struct FixedSampler {
    frac: Fixed,
    step: Fixed,
    remaining: usize,
}

impl FixedSampler {
    /// Create a walk of `count` steps (negative counts yield nothing)
    pub fn new(frac: Fixed, step: Fixed, count: i32) -> Self {
        Self {
            frac,
            step,
            remaining: count.max(0) as usize,
        }
    }
}

impl Iterator for FixedSampler {
    type Item = i32;

    #[inline(always)]
    fn next(&mut self) -> Option<i32> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        let index = self.frac >> FRACBITS;
        self.frac = self.frac.wrapping_add(self.step);
        Some(index)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for FixedSampler {}

/// First and last texel index of a walk, computed without wrapping
///
/// The walk is linear, so its extreme indices are its endpoints.
pub fn walk_bounds(frac: Fixed, step: Fixed, count: i32) -> (i64, i64) {
    let first = frac as i64 >> FRACBITS;
    let end = frac as i64 + step as i64 * (count.max(1) as i64 - 1);
    (first, end >> FRACBITS)
}

/// Verify that every index of a walk lands inside a texture of `len` texels
///
/// Rejects walks whose 32-bit incremental position would wrap, since the
/// hot loops would then visit indices the endpoint check never saw.
pub fn check_walk(frac: Fixed, step: Fixed, count: i32, len: usize) -> Result<()> {
    if count <= 0 {
        return Ok(());
    }

    let end = frac as i64 + step as i64 * (count as i64 - 1);
    let (first, last) = walk_bounds(frac, step, count);
    let wraps = end < i32::MIN as i64 || end > i32::MAX as i64;
    let (lo, hi) = (first.min(last), first.max(last));
    let len_i = i64::try_from(len).unwrap_or(i64::MAX);

    if wraps || lo < 0 || hi >= len_i {
        return Err(DrawerError::SourceOutOfRange {
            first,
            last,
            len,
        });
    }
    Ok(())
}

/// Sample `count` texels into every 4th slot of `dest`
///
/// `dest[0]` receives texel `index(0)`, `dest[4]` texel `index(1)` and so on.
/// The loop is unrolled in the same groups the drawers have always used:
/// a 1/2/4 remainder followed by blocks of eight.
///
/// The caller guarantees `dest.len() > 4 * (count - 1)` and that the walk
/// stays inside `source` (see [`check_walk`]).
#[inline]
pub fn sample_strided<T: Texel>(
    source: &[T],
    frac: Fixed,
    step: Fixed,
    count: i32,
    dest: &mut [u32],
) {
    if count <= 0 {
        return;
    }

    let mut frac = frac;
    let mut d = 0usize;
    let mut count = count as u32;

    macro_rules! put {
        ($offset:expr) => {
            dest[d + $offset] = source[(frac >> FRACBITS) as usize].to_packed();
            frac = frac.wrapping_add(step);
        };
    }

    if count & 1 != 0 {
        put!(0);
        d += 4;
    }
    if count & 2 != 0 {
        put!(0);
        put!(4);
        d += 8;
    }
    if count & 4 != 0 {
        put!(0);
        put!(4);
        put!(8);
        put!(12);
        d += 16;
    }

    count >>= 3;
    while count > 0 {
        put!(0);
        put!(4);
        put!(8);
        put!(12);
        put!(16);
        put!(20);
        put!(24);
        put!(28);
        d += 32;
        count -= 1;
    }
}

/// Straight-line version of [`sample_strided`]
///
/// Same output, one texel per iteration. Kept for tests and benchmarks.
pub fn sample_strided_reference<T: Texel>(
    source: &[T],
    frac: Fixed,
    step: Fixed,
    count: i32,
    dest: &mut [u32],
) {
    for (slot, index) in dest
        .iter_mut()
        .step_by(4)
        .zip(FixedSampler::new(frac, step, count))
    {
        *slot = source[index as usize].to_packed();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_sample_index_truncates() {
        // 1.75 texels per step
        let step = FRACUNIT + FRACUNIT * 3 / 4;
        let indices: Vec<i32> = (0..5).map(|i| sample_index(0, step, i)).collect();
        assert_eq!(indices, vec![0, 1, 3, 5, 7]);
    }

    #[test]
    fn test_sampler_matches_sample_index() {
        let frac = 0x0003_8000;
        let step = 0x0000_C000;
        for (i, index) in FixedSampler::new(frac, step, 32).enumerate() {
            assert_eq!(index, sample_index(frac, step, i as i32));
        }
    }

    #[test]
    fn test_sampler_negative_count_is_empty() {
        assert_eq!(FixedSampler::new(0, FRACUNIT, -3).count(), 0);
        assert_eq!(FixedSampler::new(0, FRACUNIT, 0).len(), 0);
    }

    #[test]
    fn test_check_walk_accepts_exact_fit() {
        // Last index is 15 for 16 steps of one texel
        assert!(check_walk(0, FRACUNIT, 16, 16).is_ok());
        assert!(check_walk(0, FRACUNIT, 17, 16).is_err());
    }

    #[test]
    fn test_check_walk_rejects_negative_start() {
        let err = check_walk(-FRACUNIT, FRACUNIT, 4, 16).unwrap_err();
        assert!(matches!(
            err,
            DrawerError::SourceOutOfRange {
                first: -1,
                last: 2,
                len: 16
            }
        ));
    }

    #[test]
    fn test_check_walk_rejects_wrapping() {
        assert!(check_walk(i32::MAX - 10, FRACUNIT, 2, usize::MAX).is_err());
    }

    #[test]
    fn test_check_walk_degenerate_count() {
        assert!(check_walk(-FRACUNIT * 100, FRACUNIT, 0, 0).is_ok());
    }

    #[test]
    fn test_sample_strided_writes_every_fourth_slot() {
        let source: Vec<u8> = (0..16).collect();
        let mut dest = vec![0xDEAD_BEEFu32; 4 * 5];
        sample_strided(&source, 2 * FRACUNIT, FRACUNIT, 5, &mut dest);

        for i in 0..5 {
            assert_eq!(dest[4 * i], 2 + i as u32);
            assert_eq!(dest[4 * i + 1], 0xDEAD_BEEF);
            assert_eq!(dest[4 * i + 2], 0xDEAD_BEEF);
            assert_eq!(dest[4 * i + 3], 0xDEAD_BEEF);
        }
    }

    #[test]
    fn test_sample_strided_zero_count_is_noop() {
        let source = [7u32; 4];
        let mut dest = vec![0u32; 8];
        sample_strided(&source, 0, FRACUNIT, 0, &mut dest);
        assert!(dest.iter().all(|&v| v == 0));
    }

    proptest! {
        #[test]
        fn prop_unrolled_matches_reference(
            count in 1i32..200,
            frac in 0i32..(4 * FRACUNIT),
            step in 0i32..(2 * FRACUNIT),
        ) {
            let source: Vec<u32> = (0..1024u32).map(|v| v.wrapping_mul(2_654_435_761)).collect();
            prop_assume!(check_walk(frac, step, count, source.len()).is_ok());

            let len = 4 * count as usize;
            let mut unrolled = vec![0u32; len];
            let mut reference = vec![0u32; len];
            sample_strided(&source, frac, step, count, &mut unrolled);
            sample_strided_reference(&source, frac, step, count, &mut reference);
            prop_assert_eq!(unrolled, reference);
        }

        #[test]
        fn prop_check_walk_covers_every_index(
            count in 1i32..300,
            frac in -FRACUNIT..(64 * FRACUNIT),
            step in -FRACUNIT..(2 * FRACUNIT),
            len in 1usize..256,
        ) {
            if check_walk(frac, step, count, len).is_ok() {
                for index in FixedSampler::new(frac, step, count) {
                    prop_assert!(index >= 0 && (index as usize) < len);
                }
            }
        }
    }
}
