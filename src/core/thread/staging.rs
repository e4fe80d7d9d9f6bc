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

//! Externally supplied staging buffers
//!
//! A [`StagingPool`] holds one buffer per core. A thread checks its buffer
//! out when a pass starts (RtInitCols with a pool) and checks it back in
//! when it re-initializes or is dropped. The slot lock is only taken at
//! those two points, never while drawing.

use std::sync::{Mutex, MutexGuard};

use super::STAGING_LANES;

/// One externally owned staging buffer per core
#[derive(Debug)]
pub struct StagingPool {
    slots: Vec<Mutex<Option<Vec<u32>>>>,
}

impl StagingPool {
    /// Allocate zeroed buffers for `num_cores` threads, `staging_height` rows each
    pub fn new(num_cores: usize, staging_height: usize) -> Self {
        Self::from_buffers(
            (0..num_cores)
                .map(|_| vec![0; staging_height * STAGING_LANES])
                .collect(),
        )
    }

    /// Wrap caller-provided buffers, indexed by core
    pub fn from_buffers(buffers: Vec<Vec<u32>>) -> Self {
        Self {
            slots: buffers.into_iter().map(|b| Mutex::new(Some(b))).collect(),
        }
    }

    /// Number of core slots
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    fn slot(&self, core: usize) -> Option<MutexGuard<'_, Option<Vec<u32>>>> {
        self.slots
            .get(core)
            .map(|slot| slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner()))
    }

    /// Take the buffer for `core` out of the pool
    ///
    /// Returns `None` if the core has no slot or its buffer is checked out.
    pub fn checkout(&self, core: usize) -> Option<Vec<u32>> {
        self.slot(core)?.take()
    }

    /// Put the buffer for `core` back
    pub fn checkin(&self, core: usize, buffer: Vec<u32>) {
        match self.slot(core) {
            Some(mut slot) => *slot = Some(buffer),
            None => log::warn!("Staging pool has no slot for core {}, buffer dropped", core),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checkout_checkin() {
        let pool = StagingPool::new(2, 3);
        assert_eq!(pool.len(), 2);

        let buffer = pool.checkout(0).unwrap();
        assert_eq!(buffer.len(), 12);
        assert!(pool.checkout(0).is_none());

        pool.checkin(0, buffer);
        assert!(pool.checkout(0).is_some());
    }

    #[test]
    fn test_missing_slot() {
        let pool = StagingPool::from_buffers(vec![vec![1, 2, 3, 4]]);
        assert!(pool.checkout(1).is_none());
        pool.checkin(5, vec![0; 4]);
        assert_eq!(pool.checkout(0), Some(vec![1, 2, 3, 4]));
    }
}
