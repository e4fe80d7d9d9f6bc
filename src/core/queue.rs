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

//! Command executor
//!
//! Runs a recorded command list on a fixed set of worker threads. Every
//! worker executes every command in order; the row helpers on
//! [`DrawerThread`] make each worker touch only its own rows, so workers
//! never write the same pixel.
//!
//! A frame can be split into passes of `pass_height` rows. All workers
//! finish a pass before the next one starts.

use std::sync::Arc;
use std::time::Instant;

use crate::core::config::DrawerConfig;
use crate::core::drawers::DrawerCommand;
use crate::core::error::{DrawerError, Result};
use crate::core::thread::DrawerThread;

/// Shared, immutable command
pub type CommandRef = Arc<dyn DrawerCommand>;

/// Statistics of one [`DrawerQueue::run`]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RunStats {
    pub commands: usize,
    pub passes: usize,
    pub elapsed_ms: f64,
}

/// Worker pool executing drawer commands
pub struct DrawerQueue {
    threads: Vec<DrawerThread>,
    pass_height: Option<usize>,
}

impl DrawerQueue {
    /// Create one [`DrawerThread`] per configured core
    pub fn new(config: &DrawerConfig) -> Result<Self> {
        config.validate()?;

        let threads = (0..config.num_cores)
            .map(|core| DrawerThread::new(core, config.num_cores, config.staging_height))
            .collect::<Result<Vec<_>>>()?;

        log::info!(
            "Drawer queue: {} cores, staging {} rows, pass height {:?}",
            config.num_cores,
            config.staging_height,
            config.pass_height
        );

        Ok(Self {
            threads,
            pass_height: config.pass_height,
        })
    }

    pub fn num_cores(&self) -> usize {
        self.threads.len()
    }

    pub fn threads(&self) -> &[DrawerThread] {
        &self.threads
    }

    /// Execute `commands` over a surface of `height` rows
    ///
    /// # Errors
    ///
    /// [`DrawerError::StagingCapacity`] if a command touches staging rows
    /// past the worker buffers. Nothing is executed in that case.
    pub fn run(&mut self, commands: &[CommandRef], height: usize) -> Result<RunStats> {
        self.check_staging(commands)?;

        let start = Instant::now();
        let pass_height = self.pass_height.unwrap_or(height).max(1);
        let mut passes = 0;

        let mut pass_start: usize = 0;
        loop {
            let pass_end = pass_start.saturating_add(pass_height).min(height);
            self.run_pass(commands, pass_start as i32, pass_end as i32);
            passes += 1;

            pass_start = pass_end;
            if pass_start >= height {
                break;
            }
        }

        let stats = RunStats {
            commands: commands.len(),
            passes,
            elapsed_ms: start.elapsed().as_secs_f64() * 1000.0,
        };
        log::debug!(
            "Executed {} commands in {} passes ({:.3} ms)",
            stats.commands,
            stats.passes,
            stats.elapsed_ms
        );
        Ok(stats)
    }

    fn check_staging(&self, commands: &[CommandRef]) -> Result<()> {
        let capacity = self
            .threads
            .iter()
            .map(DrawerThread::staging_height)
            .min()
            .unwrap_or(0);

        let required = commands.iter().map(|c| c.staging_rows()).max().unwrap_or(0);
        if required > capacity {
            log::error!(
                "Command list needs {} staging rows, workers hold {}",
                required,
                capacity
            );
            return Err(DrawerError::StagingCapacity { required, capacity });
        }
        Ok(())
    }

    fn run_pass(&mut self, commands: &[CommandRef], start: i32, end: i32) {
        for thread in &mut self.threads {
            thread.set_pass(start, end);
        }

        if let [thread] = self.threads.as_mut_slice() {
            execute_all(thread, commands);
            return;
        }

        std::thread::scope(|scope| {
            for thread in &mut self.threads {
                scope.spawn(move || execute_all(thread, commands));
            }
        });
    }
}

fn execute_all(thread: &mut DrawerThread, commands: &[CommandRef]) {
    for command in commands {
        if log::log_enabled!(log::Level::Trace) {
            log::trace!("core {}: {}", thread.core(), command.debug_info());
        }
        command.execute(thread);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::drawers::{ColumnDrawState, DrawColumnHorizBgraCommand, DrawColumnRtCommand};
    use crate::core::surface::Surface;
    use crate::core::texture::TexelSource;
    use std::sync::Mutex;

    /// Records the pass each core saw
    struct PassProbe {
        seen: Mutex<Vec<(usize, i32, i32)>>,
    }

    impl DrawerCommand for PassProbe {
        fn execute(&self, thread: &mut DrawerThread) {
            self.seen
                .lock()
                .unwrap()
                .push((thread.core(), thread.pass_start_y(), thread.pass_end_y()));
        }

        fn debug_info(&self) -> String {
            "PassProbe".to_string()
        }
    }

    fn config(num_cores: usize, pass_height: Option<usize>) -> DrawerConfig {
        DrawerConfig {
            num_cores,
            staging_height: 16,
            pass_height,
        }
    }

    #[test]
    fn test_one_thread_per_core() {
        let queue = DrawerQueue::new(&config(3, None)).unwrap();
        assert_eq!(queue.num_cores(), 3);
        let cores: Vec<usize> = queue.threads().iter().map(|t| t.core()).collect();
        assert_eq!(cores, vec![0, 1, 2]);
    }

    #[test]
    fn test_rejects_zero_cores() {
        assert!(matches!(
            DrawerQueue::new(&config(0, None)),
            Err(DrawerError::InvalidCoreCount(0))
        ));
    }

    #[test]
    fn test_single_pass() {
        let probe = Arc::new(PassProbe {
            seen: Mutex::new(Vec::new()),
        });
        let mut queue = DrawerQueue::new(&config(2, None)).unwrap();
        let stats = queue.run(&[probe.clone() as CommandRef], 10).unwrap();

        assert_eq!(stats.passes, 1);
        assert_eq!(stats.commands, 1);
        let mut seen = probe.seen.lock().unwrap().clone();
        seen.sort();
        assert_eq!(seen, vec![(0, 0, 10), (1, 0, 10)]);
    }

    #[test]
    fn test_passes_cover_height() {
        let probe = Arc::new(PassProbe {
            seen: Mutex::new(Vec::new()),
        });
        let mut queue = DrawerQueue::new(&config(1, Some(4))).unwrap();
        let stats = queue.run(&[probe.clone() as CommandRef], 10).unwrap();

        assert_eq!(stats.passes, 3);
        let seen = probe.seen.lock().unwrap().clone();
        assert_eq!(seen, vec![(0, 0, 4), (0, 4, 8), (0, 8, 10)]);
    }

    #[test]
    fn test_empty_surface_runs_one_pass() {
        let mut queue = DrawerQueue::new(&config(2, Some(8))).unwrap();
        let stats = queue.run(&[], 0).unwrap();
        assert_eq!(stats.passes, 1);
        assert_eq!(stats.commands, 0);
    }

    #[test]
    fn test_undersized_staging_rejected_before_any_write() {
        // Producer believes in 64 staging rows, workers only hold 8
        let surface = Arc::new(Surface::new(4, 64));
        let mut state = ColumnDrawState::new(Arc::clone(&surface), 64);
        state.set_span(1, 20, 40);
        state.source = Some(TexelSource::from(vec![0xFF12_3456u32; 32]));

        let commands: Vec<CommandRef> = vec![
            Arc::new(DrawColumnRtCommand::fill(&state, 0, 0, 63).unwrap()),
            Arc::new(DrawColumnHorizBgraCommand::new(&state).unwrap()),
            Arc::new(DrawColumnRtCommand::new(&state, 1, 1, 20, 40).unwrap()),
        ];

        let mut queue = DrawerQueue::new(&DrawerConfig {
            num_cores: 2,
            staging_height: 8,
            pass_height: None,
        })
        .unwrap();
        assert!(matches!(
            queue.run(&commands, 64),
            Err(DrawerError::StagingCapacity {
                required: 41,
                capacity: 8
            })
        ));
        assert!(surface.to_vec().iter().all(|&p| p == 0));
    }

    #[test]
    fn test_staging_within_capacity_runs() {
        let surface = Arc::new(Surface::new(4, 16));
        let mut state = ColumnDrawState::new(Arc::clone(&surface), 16);
        state.set_span(2, 0, 15);
        state.source = Some(TexelSource::from(vec![0xFF00_FF00u32; 16]));

        let commands: Vec<CommandRef> = vec![
            Arc::new(DrawColumnHorizBgraCommand::new(&state).unwrap()),
            Arc::new(DrawColumnRtCommand::new(&state, 2, 2, 0, 15).unwrap()),
        ];
        let mut queue = DrawerQueue::new(&config(3, None)).unwrap();
        queue.run(&commands, 16).unwrap();
        assert!((0..16).all(|y| surface.pixel(2, y) == 0xFF00_FF00));
    }
}
