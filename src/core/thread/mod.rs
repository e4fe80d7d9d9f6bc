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

//! Worker partition context
//!
//! Each worker thread owns a [`DrawerThread`]: its identity (`core`,
//! `num_cores`), the rows of the current pass, and a private staging buffer.
//!
//! # Row Ownership
//!
//! Rows are interleaved between cores, not split into blocks. Within the
//! pass `[pass_start_y, pass_end_y)`, row `y` belongs to core
//! `y % num_cores`:
//!
//! ```text
//! 4 cores, column rows 0..10
//!
//!   row:   0 1 2 3 4 5 6 7 8 9
//!   core:  0 1 2 3 0 1 2 3 0 1
//! ```
//!
//! Every destination row is written by exactly one thread, so the drawers
//! need no locks in their loops.
//!
//! # Staging Buffer
//!
//! The staging buffer is logically `[row][lane]` with four lanes
//! (`lane = x & 3`): slot `lane + 4 * row`. It lives as long as the thread
//! and is selected once per pass by the RtInitCols command.

mod staging;

pub use staging::StagingPool;

use std::sync::Arc;

use crate::core::error::{DrawerError, Result};

/// Lanes interleaved in the staging buffer
pub const STAGING_LANES: usize = 4;

/// Externally supplied staging buffer currently adopted by a thread
#[derive(Debug)]
struct AdoptedStaging {
    pool: Arc<StagingPool>,
    buffer: Vec<u32>,
}

/// Per-thread drawing context
///
/// # Example
///
/// ```
/// use rtdraw::core::thread::DrawerThread;
///
/// let thread = DrawerThread::new(1, 4, 64).unwrap();
///
/// // Core 1 of 4 owns rows 1, 5, 9 of a 10 row column starting at row 0
/// assert_eq!(thread.skipped_by_thread(0), 1);
/// assert_eq!(thread.count_for_thread(0, 10), 3);
/// assert!(thread.line_skipped_by_thread(4));
/// assert!(!thread.line_skipped_by_thread(5));
/// ```
#[derive(Debug)]
pub struct DrawerThread {
    core: usize,
    num_cores: usize,

    /// First row of the current pass (inclusive)
    pass_start_y: i32,

    /// End of the current pass (exclusive)
    pass_end_y: i32,

    /// Rows the staging buffer must hold
    staging_height: usize,

    /// Buffer owned by this thread for its whole lifetime
    default_staging: Vec<u32>,

    /// Buffer adopted from a pool for the current pass
    adopted: Option<AdoptedStaging>,
}

impl DrawerThread {
    /// Create the context for worker `core` of `num_cores`
    ///
    /// The pass initially covers every row.
    pub fn new(core: usize, num_cores: usize, staging_height: usize) -> Result<Self> {
        if num_cores == 0 {
            return Err(DrawerError::InvalidCoreCount(num_cores));
        }
        if core >= num_cores {
            return Err(DrawerError::InvalidCoreIndex { core, num_cores });
        }

        Ok(Self {
            core,
            num_cores,
            pass_start_y: 0,
            pass_end_y: i32::MAX,
            staging_height,
            default_staging: vec![0; staging_height * STAGING_LANES],
            adopted: None,
        })
    }

    #[inline(always)]
    pub fn core(&self) -> usize {
        self.core
    }

    #[inline(always)]
    pub fn num_cores(&self) -> usize {
        self.num_cores
    }

    pub fn pass_start_y(&self) -> i32 {
        self.pass_start_y
    }

    pub fn pass_end_y(&self) -> i32 {
        self.pass_end_y
    }

    pub fn staging_height(&self) -> usize {
        self.staging_height
    }

    /// Restrict the rows of the next pass to `[start, end)`
    pub fn set_pass(&mut self, start: i32, end: i32) {
        self.pass_start_y = start;
        self.pass_end_y = end.max(start);
    }

    /// Rows of `[first_line, ..)` this thread skips before its first owned row
    pub fn skipped_by_thread(&self, first_line: i32) -> i32 {
        let n = self.num_cores as i32;
        let pass_skip = (self.pass_start_y - first_line).max(0);
        let core_skip = (n - (first_line + pass_skip - self.core as i32).rem_euclid(n)) % n;
        pass_skip + core_skip
    }

    /// Rows of `[first_line, first_line + count)` owned by this thread
    pub fn count_for_thread(&self, first_line: i32, count: i32) -> i32 {
        let n = self.num_cores as i32;
        let lines_until_pass_end = self.pass_end_y.saturating_sub(first_line).max(0);
        let count = count.min(lines_until_pass_end);
        let c = (count - self.skipped_by_thread(first_line) + n - 1).div_euclid(n);
        c.max(0)
    }

    /// Offset of this thread's first owned row, relative to `dest`
    pub fn dest_for_thread(&self, first_line: i32, pitch: usize, dest: usize) -> usize {
        dest + self.skipped_by_thread(first_line) as usize * pitch
    }

    /// Whether `line` belongs to another thread or lies outside the pass
    pub fn line_skipped_by_thread(&self, line: i32) -> bool {
        line < self.pass_start_y
            || line >= self.pass_end_y
            || line.rem_euclid(self.num_cores as i32) != self.core as i32
    }

    /// Select the staging buffer for the coming pass
    ///
    /// `None` selects the thread's own buffer. `Some(pool)` adopts the buffer
    /// the pool holds for this core; if that slot is empty or too small the
    /// thread keeps its own buffer. A previously adopted buffer is handed
    /// back to its pool first.
    pub fn init_staging(&mut self, pool: Option<&Arc<StagingPool>>) {
        self.release_staging();

        let Some(pool) = pool else {
            return;
        };

        match pool.checkout(self.core) {
            Some(buffer) if buffer.len() >= self.staging_height * STAGING_LANES => {
                log::debug!(
                    "Core {} adopted external staging buffer ({} slots)",
                    self.core,
                    buffer.len()
                );
                self.adopted = Some(AdoptedStaging {
                    pool: Arc::clone(pool),
                    buffer,
                });
            }
            Some(buffer) => {
                log::warn!(
                    "Core {}: external staging buffer too small ({} < {}), using default",
                    self.core,
                    buffer.len(),
                    self.staging_height * STAGING_LANES
                );
                pool.checkin(self.core, buffer);
            }
            None => {
                log::warn!(
                    "Core {}: no external staging buffer available, using default",
                    self.core
                );
            }
        }
    }

    /// Hand an adopted staging buffer back to its pool
    pub fn release_staging(&mut self) {
        if let Some(adopted) = self.adopted.take() {
            adopted.pool.checkin(self.core, adopted.buffer);
        }
    }

    /// Whether the thread is using an externally supplied buffer
    pub fn uses_external_staging(&self) -> bool {
        self.adopted.is_some()
    }

    /// Active staging buffer
    #[inline(always)]
    pub fn staging(&self) -> &[u32] {
        match &self.adopted {
            Some(adopted) => &adopted.buffer,
            None => &self.default_staging,
        }
    }

    /// Active staging buffer, writable
    #[inline(always)]
    pub fn staging_mut(&mut self) -> &mut [u32] {
        match &mut self.adopted {
            Some(adopted) => &mut adopted.buffer,
            None => &mut self.default_staging,
        }
    }
}

impl Drop for DrawerThread {
    fn drop(&mut self) {
        self.release_staging();
    }
}
