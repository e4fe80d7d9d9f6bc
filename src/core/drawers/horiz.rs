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

//! Staging buffer writers
//!
//! These commands fill the calling thread's staging buffer. A column at
//! screen x goes to lane `x & 3`, one slot per row:
//!
//! ```text
//! slot(row) = (x & 3) + 4 * row
//! ```
//!
//! Every thread stages the whole column; row ownership only applies when
//! the compositor writes the surface.

use std::sync::Arc;

use crate::core::error::{DrawerError, Result};
use crate::core::fixed::{self, Fixed};
use crate::core::texture::Texel;
use crate::core::thread::{DrawerThread, StagingPool, STAGING_LANES};

use super::{staging_fits, ColumnDrawState, DrawerCommand};

/// Check a staged column `[yl, yl + count)` against the staging capacity
fn check_staging_span(x: i32, yl: i32, count: i32, staging_height: usize) -> Result<()> {
    if count <= 0 {
        return Ok(());
    }
    let end = yl as i64 + count as i64;
    if yl < 0 || end > staging_height as i64 {
        log::error!(
            "Staging span out of range: x={} rows {}..{} capacity {}",
            x,
            yl,
            end,
            staging_height
        );
        return Err(DrawerError::StagingOverflow {
            lane: x & 3,
            first_row: yl,
            count,
            capacity: staging_height,
        });
    }
    Ok(())
}

#[inline(always)]
fn staging_slot(x: i32, yl: i32) -> usize {
    (x & 3) as usize + STAGING_LANES * yl as usize
}

/// End row (exclusive) of a staged span, 0 when empty
fn staging_end(yl: i32, count: i32) -> usize {
    if count > 0 {
        (yl + count) as usize
    } else {
        0
    }
}

/// Select the staging buffer every later command of the pass uses
///
/// With no pool each thread uses its own default buffer; with a pool each
/// thread adopts the buffer the pool holds for its core.
#[derive(Debug, Clone, Default)]
pub struct RtInitColsCommand {
    pool: Option<Arc<StagingPool>>,
}

impl RtInitColsCommand {
    pub fn new(pool: Option<Arc<StagingPool>>) -> Self {
        Self { pool }
    }
}

impl DrawerCommand for RtInitColsCommand {
    fn execute(&self, thread: &mut DrawerThread) {
        thread.init_staging(self.pool.as_ref());
    }

    fn debug_info(&self) -> String {
        "RtInitCols".to_string()
    }
}

/// Sample a texture column into the staging buffer
///
/// Generic over the texel width; see [`DrawColumnHorizPalCommand`] and
/// [`DrawColumnHorizBgraCommand`].
#[derive(Debug, Clone)]
pub struct DrawColumnHorizCommand<T: Texel> {
    count: i32,
    iscale: Fixed,
    texturefrac: Fixed,
    source: Arc<[T]>,
    x: i32,
    yl: i32,
    yh: i32,
}

/// Column sampler for 8-bit palette index textures
pub type DrawColumnHorizPalCommand = DrawColumnHorizCommand<u8>;

/// Column sampler for 32-bit packed color textures
pub type DrawColumnHorizBgraCommand = DrawColumnHorizCommand<u32>;

impl<T: Texel> DrawColumnHorizCommand<T> {
    /// Capture the column span, texture walk and source of `state`
    ///
    /// # Errors
    ///
    /// - [`DrawerError::MissingSource`] / [`DrawerError::SourceFormat`] if the
    ///   state has no texture of element type `T`
    /// - [`DrawerError::SourceOutOfRange`] if the walk leaves the texture
    /// - [`DrawerError::StagingOverflow`] if the rows do not fit the staging buffer
    pub fn new(state: &ColumnDrawState) -> Result<Self> {
        let source = state.source.as_ref().ok_or(DrawerError::MissingSource)?;
        let texels = T::texels(source).ok_or(DrawerError::SourceFormat { expected: T::NAME })?;

        fixed::check_walk(state.texturefrac, state.iscale, state.count, texels.len())?;
        check_staging_span(state.x, state.yl, state.count, state.staging_height)?;

        Ok(Self {
            count: state.count,
            iscale: state.iscale,
            texturefrac: state.texturefrac,
            source: Arc::clone(texels),
            x: state.x,
            yl: state.yl,
            yh: state.yh,
        })
    }

    /// Last row of the column (inclusive)
    pub fn yh(&self) -> i32 {
        self.yh
    }
}

impl<T: Texel> DrawerCommand for DrawColumnHorizCommand<T> {
    fn execute(&self, thread: &mut DrawerThread) {
        if self.count <= 0 {
            return;
        }
        if !staging_fits(thread, self.staging_rows()) {
            log::error!(
                "Core {}: staging buffer too small for rows {}..={}",
                thread.core(),
                self.yl,
                self.yh
            );
            return;
        }

        let start = staging_slot(self.x, self.yl);
        let dest = &mut thread.staging_mut()[start..];
        fixed::sample_strided(&self.source, self.texturefrac, self.iscale, self.count, dest);
    }

    fn debug_info(&self) -> String {
        "DrawColumnHoriz".to_string()
    }

    fn staging_rows(&self) -> usize {
        staging_end(self.yl, self.count)
    }
}

/// Fill a staging column with one palette color
#[derive(Debug, Clone)]
pub struct FillColumnHorizCommand {
    x: i32,
    count: i32,
    color: u32,
    yl: i32,
    yh: i32,
}

impl FillColumnHorizCommand {
    /// Capture the column span and resolve `state.color` through the palette
    pub fn new(state: &ColumnDrawState) -> Result<Self> {
        check_staging_span(state.x, state.yl, state.count, state.staging_height)?;

        Ok(Self {
            x: state.x,
            count: state.count,
            color: state.palette.color(state.color),
            yl: state.yl,
            yh: state.yh,
        })
    }

    /// Packed fill color (alpha opaque)
    pub fn color(&self) -> u32 {
        self.color
    }

    pub fn yh(&self) -> i32 {
        self.yh
    }
}

impl DrawerCommand for FillColumnHorizCommand {
    fn execute(&self, thread: &mut DrawerThread) {
        if self.count <= 0 {
            return;
        }
        if !staging_fits(thread, self.staging_rows()) {
            log::error!(
                "Core {}: staging buffer too small for rows {}..={}",
                thread.core(),
                self.yl,
                self.yh
            );
            return;
        }

        let color = self.color;
        let start = staging_slot(self.x, self.yl);
        let dest = &mut thread.staging_mut()[start..];
        let mut d = 0usize;
        let mut count = self.count as u32;

        if count & 1 != 0 {
            dest[d] = color;
            d += 4;
        }
        count >>= 1;
        while count > 0 {
            dest[d] = color;
            dest[d + 4] = color;
            d += 8;
            count -= 1;
        }
    }

    fn debug_info(&self) -> String {
        "FillColumnHoriz".to_string()
    }

    fn staging_rows(&self) -> usize {
        staging_end(self.yl, self.count)
    }
}
