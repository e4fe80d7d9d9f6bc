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

//! Column and particle rasterization core
//!
//! - [`fixed`]: 16.16 fixed-point texture walks
//! - [`color`]: palette, shading and blending math
//! - [`texture`]: texel sources
//! - [`surface`]: shared 32-bit destination surface
//! - [`thread`]: per-worker row ownership and staging buffers
//! - [`drawers`]: drawer commands
//! - [`queue`]: worker pool executing command lists
//! - [`config`]: worker pool configuration
//! - [`error`]: error types

pub mod color;
pub mod config;
pub mod drawers;
pub mod error;
pub mod fixed;
pub mod queue;
pub mod surface;
pub mod texture;
pub mod thread;
