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

//! rtdraw: multi-threaded column and particle rasterizer
//!
//! Textured wall/sprite columns and particles are recorded as drawer
//! commands and executed by several worker threads at once. Rows are
//! interleaved between workers (`row % num_cores == core`), so each worker
//! writes a disjoint set of pixels and the merged output matches a
//! single-threaded run exactly.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use rtdraw::core::config::DrawerConfig;
//! use rtdraw::core::drawers::DrawParticleColumnCommand;
//! use rtdraw::core::queue::{CommandRef, DrawerQueue};
//! use rtdraw::core::surface::Surface;
//!
//! let surface = Arc::new(Surface::new(64, 64));
//! let particle = DrawParticleColumnCommand::new(&surface, 10, 4, 16, 0xFF_FF8000, 256, 7 << 16)?;
//!
//! let config = DrawerConfig { num_cores: 4, ..Default::default() };
//! let mut queue = DrawerQueue::new(&config)?;
//! queue.run(&[Arc::new(particle) as CommandRef], surface.height())?;
//! assert_ne!(surface.pixel(10, 11), 0);
//! # Ok::<(), rtdraw::DrawerError>(())
//! ```
//!
//! # Modules
//!
//! - [`core::drawers`]: the drawer commands
//! - [`core::thread`]: row ownership helpers and staging buffers
//! - [`core::queue`]: the worker pool
//!
//! # Error Handling
//!
//! Command constructors return [`core::error::Result<T>`], an alias for
//! `Result<T, DrawerError>`. Executing a command never fails.

pub mod core;

// Re-export commonly used types
pub use crate::core::error::{DrawerError, Result};
