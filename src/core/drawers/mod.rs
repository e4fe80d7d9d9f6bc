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

//! Drawer commands
//!
//! A drawer command is one unit of column drawing work. The producer builds
//! it from a [`ColumnDrawState`] snapshot, then every worker thread executes
//! the same command against its own [`DrawerThread`].
//!
//! # Commands
//!
//! - [`RtInitColsCommand`]: select the staging buffer for the pass
//! - [`DrawColumnHorizCommand`]: sample a texture column into the staging buffer
//! - [`FillColumnHorizCommand`]: fill a staging column with a solid color
//! - [`DrawColumnRtCommand`]: shade/blend a staged (or sampled) column into the surface
//! - [`DrawParticleColumnCommand`]: blend one column of a soft particle sprite
//!
//! # Pipeline
//!
//! ```text
//! texture ──► DrawColumnHoriz ──► staging[lane + 4*y] ──► DrawColumnRt ──► surface
//!                FillColumnHoriz ─┘
//! particle mask ─────────────────────────────► DrawParticleColumn ──► surface
//! ```
//!
//! The producer must issue RtInitCols before the staging writers of a pass,
//! and the staging writers of a column before its compositor.

mod args;
mod horiz;
mod particle;
mod rt;

pub use args::{ColumnFlags, ColumnSource, DrawColumnArgs};
pub use horiz::{
    DrawColumnHorizBgraCommand, DrawColumnHorizCommand, DrawColumnHorizPalCommand,
    FillColumnHorizCommand, RtInitColsCommand,
};
pub use particle::{DrawParticleColumnCommand, PARTICLE_TEXTURE};
pub use rt::DrawColumnRtCommand;

use std::sync::Arc;

use crate::core::color::{Palette, ShadeConstants};
use crate::core::fixed::{Fixed, FRACUNIT};
use crate::core::surface::Surface;
use crate::core::texture::TexelSource;
use crate::core::thread::{DrawerThread, STAGING_LANES};

/// Unit of drawing work executed by every worker thread
pub trait DrawerCommand: Send + Sync {
    /// Run the command for the calling thread's rows
    fn execute(&self, thread: &mut DrawerThread);

    /// One-line label, followed by captured parameters where useful
    fn debug_info(&self) -> String;

    /// Staging rows `0..n` the command reads or writes (0 = none)
    fn staging_rows(&self) -> usize {
        0
    }
}

/// Whether the thread's active staging buffer holds `rows` rows
pub(crate) fn staging_fits(thread: &DrawerThread, rows: usize) -> bool {
    rows <= thread.staging().len() / STAGING_LANES
}

/// Producer-side drawing state captured by command constructors
///
/// The producer owns exactly one of these and mutates it between draw calls;
/// constructors copy what they need, so a command never observes later
/// changes.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use rtdraw::core::drawers::ColumnDrawState;
/// use rtdraw::core::surface::Surface;
///
/// let surface = Arc::new(Surface::new(320, 200));
/// let mut state = ColumnDrawState::new(surface, 200);
/// state.set_span(17, 20, 59);
/// assert_eq!(state.count, 40);
/// ```
#[derive(Debug, Clone)]
pub struct ColumnDrawState {
    /// Destination surface
    pub surface: Arc<Surface>,

    /// Rows each worker's staging buffer holds
    pub staging_height: usize,

    /// Screen column
    pub x: i32,

    /// First row (inclusive)
    pub yl: i32,

    /// Last row (inclusive)
    pub yh: i32,

    /// Rows to produce
    pub count: i32,

    /// Texture step per row
    pub iscale: Fixed,

    /// Texture position of the first row
    pub texturefrac: Fixed,

    pub source: Option<TexelSource>,

    /// Secondary texture for linear filtering (not implemented, sampled nearest)
    pub source2: Option<TexelSource>,

    /// Staged values are palette indices rather than packed colors
    pub indexed: bool,

    pub colormap: Option<Arc<[u8]>>,
    pub translation: Option<Arc<[u8]>>,
    pub palette: Arc<Palette>,

    /// 16.16 light level, 0 = full bright
    pub light: Fixed,

    /// Palette index for solid fills
    pub color: u8,

    /// 16.16 source weight for translucent blending
    pub srcalpha: Fixed,

    /// 16.16 destination weight for translucent blending
    pub destalpha: Fixed,

    pub shade: ShadeConstants,
}

impl ColumnDrawState {
    /// Default state: opaque, full bright, grayscale palette, no texture
    pub fn new(surface: Arc<Surface>, staging_height: usize) -> Self {
        Self {
            surface,
            staging_height,
            x: 0,
            yl: 0,
            yh: -1,
            count: 0,
            iscale: FRACUNIT,
            texturefrac: 0,
            source: None,
            source2: None,
            indexed: false,
            colormap: None,
            translation: None,
            palette: Arc::new(Palette::default()),
            light: 0,
            color: 0,
            srcalpha: FRACUNIT,
            destalpha: 0,
            shade: ShadeConstants::default(),
        }
    }

    /// Set the column and its inclusive row range
    pub fn set_span(&mut self, x: i32, yl: i32, yh: i32) {
        self.x = x;
        self.yl = yl;
        self.yh = yh;
        self.count = yh - yl + 1;
    }
}
