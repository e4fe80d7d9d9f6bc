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

//! Column compositor
//!
//! Writes the final pixels of one screen column. The texels come from one
//! of three places:
//!
//! - the calling thread's staging buffer, lane `hx` (the usual RT path)
//! - a direct fixed-point walk over a texture
//! - a single pre-shaded color
//!
//! Each texel is resolved through the palette lookup chain (indexed sources
//! only), shaded, optionally blended with the destination, and stored with
//! opaque alpha. Each thread visits only the rows it owns, so the
//! destination and the staged slot both advance `num_cores` rows per pixel.

use std::sync::Arc;

use crate::core::color;
use crate::core::error::{DrawerError, Result};
use crate::core::fixed::{self, FRACBITS};
use crate::core::surface::Surface;
use crate::core::texture::{Texel, TexelSource};
use crate::core::thread::{DrawerThread, STAGING_LANES};

use super::args::{alpha_weight, ColorLookup};
use super::{
    staging_fits, ColumnDrawState, ColumnFlags, ColumnSource, DrawColumnArgs, DrawerCommand,
};

/// Shade and composite one column into the surface
#[derive(Debug, Clone)]
pub struct DrawColumnRtCommand {
    surface: Arc<Surface>,
    args: DrawColumnArgs,
}

impl DrawColumnRtCommand {
    /// Composite rows `yl..=yh` of screen column `sx` from staging lane `hx`
    ///
    /// # Errors
    ///
    /// - [`DrawerError::RangeViolation`] if the rows leave the surface
    /// - [`DrawerError::ColumnOutOfRange`] if `sx` is outside the surface
    /// - [`DrawerError::StagingOverflow`] if the rows exceed the staging capacity
    pub fn new(state: &ColumnDrawState, hx: usize, sx: i32, yl: i32, yh: i32) -> Result<Self> {
        let lane = hx % STAGING_LANES;
        let lookup = if state.indexed {
            Some(Self::lookup(state)?)
        } else {
            None
        };

        let cmd = Self::build(state, ColumnSource::Staged { lane }, lookup, sx, yl, yh)?;
        let count = cmd.args.count;
        if count > 0 && yl as i64 + count as i64 > state.staging_height as i64 {
            log::error!(
                "Staged column rows {}..{} exceed staging capacity {}",
                yl,
                yl + count,
                state.staging_height
            );
            return Err(DrawerError::StagingOverflow {
                lane: lane as i32,
                first_row: yl,
                count,
                capacity: state.staging_height,
            });
        }
        Ok(cmd)
    }

    /// Composite rows `yl..=yh` of column `sx` by walking `state.source` directly
    ///
    /// Palette textures always go through the lookup chain.
    pub fn direct(state: &ColumnDrawState, sx: i32, yl: i32, yh: i32) -> Result<Self> {
        let source = state.source.clone().ok_or(DrawerError::MissingSource)?;
        let lookup = match &source {
            TexelSource::Palette(_) => Some(Self::lookup(state)?),
            TexelSource::Bgra(_) if state.indexed => Some(Self::lookup(state)?),
            TexelSource::Bgra(_) => None,
        };

        fixed::check_walk(state.texturefrac, state.iscale, yh - yl + 1, source.len())?;
        Self::build(state, ColumnSource::Texture(source), lookup, sx, yl, yh)
    }

    /// Composite rows `yl..=yh` of column `sx` with the shaded `state.color`
    pub fn fill(state: &ColumnDrawState, sx: i32, yl: i32, yh: i32) -> Result<Self> {
        Self::build(state, ColumnSource::Solid, None, sx, yl, yh)
    }

    fn lookup(state: &ColumnDrawState) -> Result<ColorLookup> {
        ColorLookup::new(
            state.translation.clone(),
            state.colormap.clone(),
            Arc::clone(&state.palette),
        )
    }

    fn build(
        state: &ColumnDrawState,
        source: ColumnSource,
        lookup: Option<ColorLookup>,
        sx: i32,
        yl: i32,
        yh: i32,
    ) -> Result<Self> {
        let surface = &state.surface;
        let count = yh - yl + 1;

        if let Err(err) = state.shade.validate() {
            log::error!("Column x={}: {}", sx, err);
            return Err(err);
        }

        if count > 0 {
            if sx < 0 || sx as usize >= surface.width() {
                log::error!("Column x={} outside surface width {}", sx, surface.width());
                return Err(DrawerError::ColumnOutOfRange {
                    x: sx,
                    width: surface.width(),
                });
            }
            if yl < 0 || yl as i64 + count as i64 > surface.height() as i64 {
                log::error!(
                    "Column rows {}..={} outside surface height {}",
                    yl,
                    yh,
                    surface.height()
                );
                return Err(DrawerError::RangeViolation {
                    dest_y: yl,
                    count,
                    height: surface.height(),
                });
            }
        }

        let light = color::calc_light_multiplier(state.light);
        let srcalpha = alpha_weight(state.srcalpha);
        let destalpha = alpha_weight(state.destalpha);

        let mut flags = ColumnFlags::empty();
        if state.shade.simple_shade {
            flags |= ColumnFlags::SIMPLE_SHADE;
        }
        if state.source2.is_none() {
            flags |= ColumnFlags::NEAREST_FILTER;
        } else {
            log::debug!("Linear filtering requested for column {}, sampling nearest", sx);
        }
        if srcalpha != 256 || destalpha != 0 {
            flags |= ColumnFlags::TRANSLUCENT;
        }

        let dest = if count > 0 {
            surface.offset(sx as usize, yl as usize)
        } else {
            0
        };

        Ok(Self {
            surface: Arc::clone(surface),
            args: DrawColumnArgs {
                dest,
                pitch: surface.pitch(),
                count,
                dest_y: yl,
                iscale: state.iscale,
                texturefrac: state.texturefrac,
                source,
                source2: state.source2.clone(),
                lookup,
                light,
                color: color::shade_pal_index_simple(&state.palette, state.color, light),
                srcalpha,
                destalpha,
                shade: state.shade,
                flags,
            },
        })
    }

    pub fn args(&self) -> &DrawColumnArgs {
        &self.args
    }
}

impl DrawerCommand for DrawColumnRtCommand {
    fn execute(&self, thread: &mut DrawerThread) {
        let args = &self.args;
        let count = thread.count_for_thread(args.dest_y, args.count);
        if count <= 0 {
            return;
        }

        let num_cores = thread.num_cores();
        let skipped = thread.skipped_by_thread(args.dest_y);
        let mut dest = thread.dest_for_thread(args.dest_y, args.pitch, args.dest);
        let pitch = args.pitch * num_cores;
        let surface = &*self.surface;

        match &args.source {
            ColumnSource::Staged { lane } => {
                if !staging_fits(thread, self.staging_rows()) {
                    log::error!(
                        "Core {}: staging buffer too small for rows {}..{}",
                        thread.core(),
                        args.dest_y,
                        args.dest_y + args.count
                    );
                    return;
                }
                let staging = thread.staging();
                let mut slot = lane + STAGING_LANES * (args.dest_y + skipped) as usize;
                let slot_step = STAGING_LANES * num_cores;
                for _ in 0..count {
                    let value = staging[slot];
                    surface.store(dest, args.composite(value, surface.load(dest)));
                    dest += pitch;
                    slot += slot_step;
                }
            }
            ColumnSource::Texture(source) => {
                let frac = args
                    .texturefrac
                    .wrapping_add(args.iscale.wrapping_mul(skipped));
                let walk = TextureWalk {
                    frac,
                    fracstep: args.iscale.wrapping_mul(num_cores as i32),
                    count,
                    dest,
                    pitch,
                };
                match source {
                    TexelSource::Palette(texels) => walk.composite(surface, args, texels),
                    TexelSource::Bgra(texels) => walk.composite(surface, args, texels),
                }
            }
            ColumnSource::Solid => {
                for _ in 0..count {
                    surface.store(dest, args.blend(args.color, surface.load(dest)));
                    dest += pitch;
                }
            }
        }
    }

    fn debug_info(&self) -> String {
        format!("DrawColumnRt\n{}", self.args)
    }

    fn staging_rows(&self) -> usize {
        match self.args.source {
            ColumnSource::Staged { .. } if self.args.count > 0 => {
                (self.args.dest_y + self.args.count) as usize
            }
            _ => 0,
        }
    }
}

/// One thread's share of a direct texture walk
struct TextureWalk {
    frac: i32,
    fracstep: i32,
    count: i32,
    dest: usize,
    pitch: usize,
}

impl TextureWalk {
    #[inline(always)]
    fn composite<T: Texel>(self, surface: &Surface, args: &DrawColumnArgs, texels: &[T]) {
        let mut frac = self.frac;
        let mut dest = self.dest;
        for _ in 0..self.count {
            let value = texels[(frac >> FRACBITS) as usize].to_packed();
            surface.store(dest, args.composite(value, surface.load(dest)));
            dest += self.pitch;
            frac = frac.wrapping_add(self.fracstep);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::color::{pack_rgb, ShadeConstants};
    use crate::core::fixed::FRACUNIT;

    fn setup(height: usize) -> (Arc<Surface>, ColumnDrawState) {
        let surface = Arc::new(Surface::new(8, height));
        let state = ColumnDrawState::new(Arc::clone(&surface), height);
        (surface, state)
    }

    fn stage(
        thread: &mut DrawerThread,
        lane: usize,
        rows: std::ops::Range<usize>,
        value: impl Fn(usize) -> u32,
    ) {
        let staging = thread.staging_mut();
        for row in rows {
            staging[lane + 4 * row] = value(row);
        }
    }

    #[test]
    fn test_flags() {
        let (_, mut state) = setup(16);
        let cmd = DrawColumnRtCommand::new(&state, 0, 0, 0, 3).unwrap();
        assert_eq!(
            cmd.args().flags,
            ColumnFlags::SIMPLE_SHADE | ColumnFlags::NEAREST_FILTER
        );

        state.shade.simple_shade = false;
        state.source2 = Some(TexelSource::from(vec![0u32; 4]));
        state.srcalpha = FRACUNIT / 2;
        state.destalpha = FRACUNIT / 2;
        let cmd = DrawColumnRtCommand::new(&state, 0, 0, 0, 3).unwrap();
        assert_eq!(cmd.args().flags, ColumnFlags::TRANSLUCENT);
        assert_eq!(cmd.args().srcalpha, 128);
        assert_eq!(cmd.args().destalpha, 128);
    }

    #[test]
    fn test_range_violation_rejected() {
        let (surface, state) = setup(16);
        assert!(matches!(
            DrawColumnRtCommand::new(&state, 0, 2, 10, 16),
            Err(DrawerError::RangeViolation {
                dest_y: 10,
                count: 7,
                height: 16
            })
        ));
        assert!(matches!(
            DrawColumnRtCommand::new(&state, 0, 2, -1, 3),
            Err(DrawerError::RangeViolation { .. })
        ));
        assert!(matches!(
            DrawColumnRtCommand::new(&state, 0, 8, 0, 3),
            Err(DrawerError::ColumnOutOfRange { x: 8, width: 8 })
        ));
        // Nothing was written
        assert!(surface.to_vec().iter().all(|&p| p == 0));
    }

    #[test]
    fn test_degenerate_column_is_not_an_error() {
        let (surface, state) = setup(16);
        let cmd = DrawColumnRtCommand::new(&state, 0, 2, 20, 19).unwrap();
        let mut thread = DrawerThread::new(0, 1, 16).unwrap();
        cmd.execute(&mut thread);
        assert!(surface.to_vec().iter().all(|&p| p == 0));
    }

    #[test]
    fn test_staged_copy_single_core() {
        let (surface, state) = setup(16);
        let mut thread = DrawerThread::new(0, 1, 16).unwrap();
        stage(&mut thread, 3, 0..16, |row| pack_rgb(row as u32 * 10, 0, 0));

        let cmd = DrawColumnRtCommand::new(&state, 3, 5, 2, 9).unwrap();
        cmd.execute(&mut thread);

        for y in 0..16 {
            let expected = if (2..=9).contains(&y) {
                pack_rgb(y as u32 * 10, 0, 0)
            } else {
                0
            };
            assert_eq!(surface.pixel(5, y), expected, "row {}", y);
        }
    }

    #[test]
    fn test_staged_rows_split_between_cores() {
        let (surface, state) = setup(16);
        let cmd = DrawColumnRtCommand::new(&state, 1, 4, 3, 12).unwrap();

        for core in 0..3 {
            let mut thread = DrawerThread::new(core, 3, 16).unwrap();
            stage(&mut thread, 1, 0..16, |row| pack_rgb(0, row as u32, core as u32));
            cmd.execute(&mut thread);
        }

        for y in 3..=12usize {
            // Row y came from the core that owns it
            assert_eq!(surface.pixel(4, y), pack_rgb(0, y as u32, (y % 3) as u32));
        }
        assert_eq!(surface.pixel(4, 2), 0);
        assert_eq!(surface.pixel(4, 13), 0);
    }

    #[test]
    fn test_indexed_staging_with_light() {
        let (surface, mut state) = setup(8);
        state.indexed = true;
        state.light = FRACUNIT / 2;

        let mut thread = DrawerThread::new(0, 1, 8).unwrap();
        stage(&mut thread, 0, 0..8, |_| 200);

        DrawColumnRtCommand::new(&state, 0, 0, 0, 7)
            .unwrap()
            .execute(&mut thread);
        assert_eq!(surface.pixel(0, 4), pack_rgb(100, 100, 100));
    }

    #[test]
    fn test_full_shade_path() {
        let (surface, mut state) = setup(4);
        state.shade = ShadeConstants {
            light_red: 256,
            light_green: 128,
            light_blue: 0,
            simple_shade: false,
            ..Default::default()
        };

        let mut thread = DrawerThread::new(0, 1, 4).unwrap();
        stage(&mut thread, 0, 0..4, |_| 0xFFC8_C8C8);
        DrawColumnRtCommand::new(&state, 0, 1, 0, 3)
            .unwrap()
            .execute(&mut thread);
        assert_eq!(surface.pixel(1, 0), pack_rgb(200, 100, 0));
    }

    #[test]
    fn test_translucent_blend() {
        let (surface, mut state) = setup(4);
        surface.fill(pack_rgb(0, 0, 200));
        state.srcalpha = FRACUNIT / 2;
        state.destalpha = FRACUNIT / 2;

        let mut thread = DrawerThread::new(0, 1, 4).unwrap();
        stage(&mut thread, 0, 0..4, |_| pack_rgb(200, 0, 0));
        DrawColumnRtCommand::new(&state, 0, 0, 0, 3)
            .unwrap()
            .execute(&mut thread);
        assert_eq!(surface.pixel(0, 2), pack_rgb(100, 0, 100));
        assert_eq!(surface.pixel(1, 2), pack_rgb(0, 0, 200));
    }

    #[test]
    fn test_direct_texture_walk_matches_all_cores() {
        let texels: Vec<u32> = (0..32).map(|i| pack_rgb(i, i * 2, 255 - i)).collect();
        let (surface, mut state) = setup(32);
        state.source = Some(TexelSource::from(texels.clone()));
        state.texturefrac = FRACUNIT / 3;
        state.iscale = FRACUNIT * 3 / 4;

        let cmd = DrawColumnRtCommand::direct(&state, 6, 4, 27).unwrap();
        for core in 0..4 {
            let mut thread = DrawerThread::new(core, 4, 32).unwrap();
            cmd.execute(&mut thread);
        }

        for i in 0..24 {
            let index = ((state.texturefrac + i * state.iscale) >> 16) as usize;
            assert_eq!(surface.pixel(6, 4 + i as usize), texels[index]);
        }
    }

    #[test]
    fn test_direct_walk_out_of_texture() {
        let (_, mut state) = setup(32);
        state.source = Some(TexelSource::from(vec![0u8; 4]));
        assert!(matches!(
            DrawColumnRtCommand::direct(&state, 0, 0, 7),
            Err(DrawerError::SourceOutOfRange { .. })
        ));
    }

    #[test]
    fn test_direct_palette_texture_resolves_indices() {
        let (surface, mut state) = setup(8);
        state.source = Some(TexelSource::from((0..8u8).map(|i| i * 30).collect::<Vec<_>>()));

        let cmd = DrawColumnRtCommand::direct(&state, 3, 0, 7).unwrap();
        for core in 0..2 {
            cmd.execute(&mut DrawerThread::new(core, 2, 8).unwrap());
        }
        for y in 0..8 {
            let v = y as u32 * 30;
            assert_eq!(surface.pixel(3, y), pack_rgb(v, v, v));
        }
    }

    #[test]
    fn test_shade_constant_out_of_range_rejected() {
        let (_, mut state) = setup(8);
        state.shade = ShadeConstants {
            desaturate: 300,
            simple_shade: false,
            ..Default::default()
        };
        assert!(matches!(
            DrawColumnRtCommand::new(&state, 0, 0, 0, 7),
            Err(DrawerError::ShadeConstant {
                name: "desaturate",
                value: 300
            })
        ));

        state.shade = ShadeConstants {
            fade_green: 257,
            ..Default::default()
        };
        assert!(matches!(
            DrawColumnRtCommand::fill(&state, 0, 0, 7),
            Err(DrawerError::ShadeConstant {
                name: "fade_green",
                ..
            })
        ));
    }

    #[test]
    fn test_staged_column_skips_undersized_buffer() {
        let (surface, state) = setup(64);
        let cmd = DrawColumnRtCommand::new(&state, 0, 0, 20, 40).unwrap();
        assert_eq!(cmd.staging_rows(), 41);

        cmd.execute(&mut DrawerThread::new(0, 1, 8).unwrap());
        assert!(surface.to_vec().iter().all(|&p| p == 0));

        let solid = DrawColumnRtCommand::fill(&state, 0, 20, 40).unwrap();
        assert_eq!(solid.staging_rows(), 0);
    }

    #[test]
    fn test_solid_fill_is_shaded() {
        let (surface, mut state) = setup(4);
        state.color = 100;
        state.light = FRACUNIT / 4;
        let mut thread = DrawerThread::new(0, 1, 4).unwrap();
        DrawColumnRtCommand::fill(&state, 2, 1, 2)
            .unwrap()
            .execute(&mut thread);
        // 100 * 192 / 256 = 75
        assert_eq!(surface.pixel(2, 1), pack_rgb(75, 75, 75));
        assert_eq!(surface.pixel(2, 3), 0);
    }

    #[test]
    fn test_pass_restricts_rows() {
        let (surface, state) = setup(16);
        let mut thread = DrawerThread::new(0, 1, 16).unwrap();
        stage(&mut thread, 0, 0..16, |_| 0xFF11_1111);
        thread.set_pass(4, 8);

        DrawColumnRtCommand::new(&state, 0, 0, 0, 15)
            .unwrap()
            .execute(&mut thread);
        let written: Vec<usize> = (0..16).filter(|&y| surface.pixel(0, y) != 0).collect();
        assert_eq!(written, vec![4, 5, 6, 7]);
    }

    #[test]
    fn test_debug_info_dumps_args() {
        let (_, state) = setup(16);
        let cmd = DrawColumnRtCommand::new(&state, 2, 0, 1, 4).unwrap();
        let info = cmd.debug_info();
        assert!(info.starts_with("DrawColumnRt\n"));
        assert!(info.contains("dest_y=1, count=4"));
        assert!(info.contains("staged lane 2"));
    }
}
