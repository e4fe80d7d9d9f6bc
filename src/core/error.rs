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

//! Error types for the drawer core
//!
//! Every error here is raised while a command is being *constructed* or while
//! the worker pool is being configured. Executing a command never fails: a
//! command value that exists has already been checked against the surface,
//! the staging capacity and its texture.

use thiserror::Error;

/// Drawer error type
#[derive(Error, Debug)]
pub enum DrawerError {
    /// Destination rows fall outside the surface
    #[error("destination rows {dest_y}..{} outside surface of height {height}", .dest_y + .count)]
    RangeViolation {
        dest_y: i32,
        count: i32,
        height: usize,
    },

    /// Destination column falls outside the surface
    #[error("destination column {x} outside surface of width {width}")]
    ColumnOutOfRange { x: i32, width: usize },

    /// Staged column span does not fit the per-thread staging buffer
    #[error("staging lane {lane} rows {first_row}+{count} exceed capacity of {capacity} rows")]
    StagingOverflow {
        lane: i32,
        first_row: i32,
        count: i32,
        capacity: usize,
    },

    /// Fixed-point walk reads texels outside the texture
    #[error("texel indices {first}..={last} outside texture of {len} texels")]
    SourceOutOfRange { first: i64, last: i64, len: usize },

    /// Captured texture does not have the element width the command expects
    #[error("texture source has the wrong element format (expected {expected})")]
    SourceFormat { expected: &'static str },

    /// A texture source is required but none was captured
    #[error("no texture source captured for a sampling command")]
    MissingSource,

    /// Particle mask column outside the 16-wide mask
    #[error("particle mask column {column} outside 0..16")]
    MaskColumn { column: u32 },

    /// Lookup table index outside the table
    #[error("{table} lookup table has {len} entries, needs 256")]
    LookupTable { table: &'static str, len: usize },

    /// Command needs more staging rows than the worker buffers hold
    #[error("command needs {required} staging rows, workers hold {capacity}")]
    StagingCapacity { required: usize, capacity: usize },

    /// Shading constant outside 0..=256
    #[error("shade constant {name} = {value} outside 0..=256")]
    ShadeConstant { name: &'static str, value: u32 },

    #[error("invalid core count: {0}")]
    InvalidCoreCount(usize),

    #[error("core index {core} out of range for {num_cores} cores")]
    InvalidCoreIndex { core: usize, num_cores: usize },

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for drawer operations
pub type Result<T> = std::result::Result<T, DrawerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_violation_message() {
        let err = DrawerError::RangeViolation {
            dest_y: 90,
            count: 20,
            height: 100,
        };
        assert_eq!(
            err.to_string(),
            "destination rows 90..110 outside surface of height 100"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: DrawerError = io.into();
        assert!(matches!(err, DrawerError::Io(_)));
    }
}
