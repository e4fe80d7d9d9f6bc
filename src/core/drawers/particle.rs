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

//! Particle column drawer
//!
//! Particles are soft discs drawn one screen column at a time. Intensity
//! comes from a fixed 16×16 mask whose value at `(row, col)` is
//! `w[row] * w[col]` with `w = 1..8, 8..1`, so the center is 64 and the
//! corners are 1.
//!
//! The mask column is picked by the integer part of `fracposx`; the 16 mask
//! rows are stretched over the column's `count` destination rows, sampling
//! at row centers.

use std::sync::Arc;

use crate::core::color;
use crate::core::error::{DrawerError, Result};
use crate::core::fixed::{FRACBITS, FRACUNIT};
use crate::core::surface::Surface;
use crate::core::thread::DrawerThread;

use super::DrawerCommand;

const PARTICLE_WEIGHTS: [u32; 16] = [1, 2, 3, 4, 5, 6, 7, 8, 8, 7, 6, 5, 4, 3, 2, 1];

const fn build_particle_texture() -> [u32; 256] {
    let mut texture = [0u32; 256];
    let mut row = 0;
    while row < 16 {
        let mut col = 0;
        while col < 16 {
            texture[row * 16 + col] = PARTICLE_WEIGHTS[col] * PARTICLE_WEIGHTS[row];
            col += 1;
        }
        row += 1;
    }
    texture
}

/// 16×16 soft disc intensity mask, values 1..=64
pub static PARTICLE_TEXTURE: [u32; 256] = build_particle_texture();

/// Blend one column of a particle into the surface
#[derive(Debug, Clone)]
pub struct DrawParticleColumnCommand {
    surface: Arc<Surface>,
    dest: usize,
    dest_y: i32,
    pitch: usize,
    count: i32,
    fg: u32,
    alpha: u32,
    fracposx: u32,
}

impl DrawParticleColumnCommand {
    /// Particle column at screen `(x, dest_y)` spanning `count` rows
    ///
    /// # Arguments
    ///
    /// * `fg` - Particle color (0xAARRGGBB, alpha ignored)
    /// * `alpha` - Particle opacity, 0..=256 (larger values are clamped)
    /// * `fracposx` - 16.16 horizontal position inside the mask (`0..16`)
    ///
    /// # Errors
    ///
    /// - [`DrawerError::RangeViolation`] / [`DrawerError::ColumnOutOfRange`] if
    ///   the column leaves the surface
    /// - [`DrawerError::MaskColumn`] if `fracposx` selects no mask column
    pub fn new(
        surface: &Arc<Surface>,
        x: i32,
        dest_y: i32,
        count: i32,
        fg: u32,
        alpha: u32,
        fracposx: u32,
    ) -> Result<Self> {
        let column = fracposx >> FRACBITS;
        if column >= 16 {
            log::error!("Particle mask column {} outside 0..16", column);
            return Err(DrawerError::MaskColumn { column });
        }

        let mut dest = 0;
        if count > 0 {
            if x < 0 || x as usize >= surface.width() {
                log::error!("Particle x={} outside surface width {}", x, surface.width());
                return Err(DrawerError::ColumnOutOfRange {
                    x,
                    width: surface.width(),
                });
            }
            if dest_y < 0 || dest_y as i64 + count as i64 > surface.height() as i64 {
                log::error!(
                    "Particle rows {}..{} outside surface height {}",
                    dest_y,
                    dest_y as i64 + count as i64,
                    surface.height()
                );
                return Err(DrawerError::RangeViolation {
                    dest_y,
                    count,
                    height: surface.height(),
                });
            }
            dest = surface.offset(x as usize, dest_y as usize);
        }

        Ok(Self {
            surface: Arc::clone(surface),
            dest,
            dest_y,
            pitch: surface.pitch(),
            count,
            fg,
            alpha: alpha.min(256),
            fracposx,
        })
    }

    /// Mask intensities this thread samples, in visiting order
    fn mask_walk(&self, thread: &DrawerThread, count: i32) -> impl Iterator<Item = u32> + '_ {
        let source = &PARTICLE_TEXTURE[(self.fracposx >> FRACBITS) as usize * 16..][..16];

        // count > 0 here, so the column count is too
        let mut fracstep = 16 * FRACUNIT as u32 / self.count as u32;
        let mut fracpos = fracstep
            .wrapping_mul(thread.skipped_by_thread(self.dest_y) as u32)
            .wrapping_add(fracstep / 2);
        fracstep = fracstep.wrapping_mul(thread.num_cores() as u32);

        (0..count).map(move |_| {
            let value = source[(fracpos >> FRACBITS) as usize];
            fracpos = fracpos.wrapping_add(fracstep);
            value
        })
    }
}

impl DrawerCommand for DrawParticleColumnCommand {
    fn execute(&self, thread: &mut DrawerThread) {
        let count = thread.count_for_thread(self.dest_y, self.count);
        if count <= 0 {
            return;
        }

        let mut dest = thread.dest_for_thread(self.dest_y, self.pitch, self.dest);
        let pitch = self.pitch * thread.num_cores();
        let surface = &*self.surface;
        let particle_alpha = self.alpha;

        for intensity in self.mask_walk(thread, count) {
            let alpha = (intensity * particle_alpha) >> 6;
            surface.store(dest, color::blend_alpha(self.fg, surface.load(dest), alpha));
            dest += pitch;
        }
    }

    fn debug_info(&self) -> String {
        "DrawParticle".to_string()
    }
}
