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

//! Column compositor arguments

use std::fmt;
use std::sync::Arc;

use bitflags::bitflags;

use crate::core::color::{self, Palette, ShadeConstants};
use crate::core::error::{DrawerError, Result};
use crate::core::fixed::{Fixed, FRACUNIT};
use crate::core::texture::TexelSource;

bitflags! {
    /// Mode toggles captured with a column
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ColumnFlags: u32 {
        /// Uniform light multiply instead of fade/desaturate/tint
        const SIMPLE_SHADE = 1 << 0;
        /// No secondary source: sample nearest texel
        const NEAREST_FILTER = 1 << 1;
        /// Blend with the destination using srcalpha/destalpha
        const TRANSLUCENT = 1 << 2;
    }
}

/// Where a compositor reads its texels
#[derive(Debug, Clone)]
pub enum ColumnSource {
    /// Values staged earlier in the calling thread's staging buffer
    Staged { lane: usize },
    /// Direct fixed-point walk over a texture
    Texture(TexelSource),
    /// The pre-shaded solid color
    Solid,
}

/// Palette lookup chain for indexed texels
#[derive(Debug, Clone)]
pub(crate) struct ColorLookup {
    pub translation: Option<Arc<[u8]>>,
    pub colormap: Option<Arc<[u8]>>,
    pub palette: Arc<Palette>,
}

impl ColorLookup {
    pub fn new(
        translation: Option<Arc<[u8]>>,
        colormap: Option<Arc<[u8]>>,
        palette: Arc<Palette>,
    ) -> Result<Self> {
        for (table, name) in [(&translation, "translation"), (&colormap, "colormap")] {
            if let Some(table) = table {
                if table.len() < 256 {
                    return Err(DrawerError::LookupTable {
                        table: name,
                        len: table.len(),
                    });
                }
            }
        }

        Ok(Self {
            translation,
            colormap,
            palette,
        })
    }

    /// Translate, remap, then fetch the base color of an index
    #[inline(always)]
    pub fn resolve(&self, value: u32) -> u32 {
        let mut index = value as u8;
        if let Some(translation) = &self.translation {
            index = translation[index as usize];
        }
        if let Some(colormap) = &self.colormap {
            index = colormap[index as usize];
        }
        self.palette.color(index)
    }
}

/// Snapshot of everything a column compositor needs
///
/// Built once on the producer side and read-only afterwards.
#[derive(Debug, Clone)]
pub struct DrawColumnArgs {
    /// Surface offset of the first row
    pub dest: usize,
    pub pitch: usize,
    pub count: i32,
    pub dest_y: i32,
    pub iscale: Fixed,
    pub texturefrac: Fixed,
    pub source: ColumnSource,
    pub source2: Option<TexelSource>,
    pub(crate) lookup: Option<ColorLookup>,

    /// Light multiplier, 0..=256
    pub light: u32,

    /// Solid color, pre-shaded
    pub color: u32,

    /// Source weight, 0..=256
    pub srcalpha: u32,

    /// Destination weight, 0..=256
    pub destalpha: u32,

    pub shade: ShadeConstants,
    pub flags: ColumnFlags,
}

impl DrawColumnArgs {
    /// Shade a resolved color with the captured constants
    #[inline(always)]
    pub fn shade_color(&self, base: u32) -> u32 {
        if self.flags.contains(ColumnFlags::SIMPLE_SHADE) {
            color::shade_bgra_simple(base, self.light)
        } else {
            color::shade_bgra_full(base, self.light, &self.shade)
        }
    }

    /// Final pixel for a staged or sampled value over `background`
    #[inline(always)]
    pub fn composite(&self, value: u32, background: u32) -> u32 {
        let base = match &self.lookup {
            Some(lookup) => lookup.resolve(value),
            None => value,
        };
        self.blend(self.shade_color(base), background)
    }

    /// Apply the captured translucency to an already shaded color
    #[inline(always)]
    pub fn blend(&self, shaded: u32, background: u32) -> u32 {
        if self.flags.contains(ColumnFlags::TRANSLUCENT) {
            color::blend_translucent(shaded, background, self.srcalpha, self.destalpha)
        } else {
            shaded | color::OPAQUE
        }
    }
}

/// Convert a 16.16 blend weight to the 0..=256 scale
pub(crate) fn alpha_weight(alpha: Fixed) -> u32 {
    (alpha >> 8).clamp(0, 256) as u32
}

impl fmt::Display for DrawColumnArgs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let source = match &self.source {
            ColumnSource::Staged { lane } => format!("staged lane {}", lane),
            ColumnSource::Texture(texels) => format!("texture {} texels", texels.len()),
            ColumnSource::Solid => "solid".to_string(),
        };
        write!(
            f,
            "dest_y={}, count={}, flags={:#x}, iscale={:.4}, texturefrac={:.4}, source={}, \
             light={}, color={:#010x}, srcalpha={}, destalpha={}, \
             light_red={}, light_green={}, light_blue={}, light_alpha={}, \
             fade_red={}, fade_green={}, fade_blue={}, fade_alpha={}, desaturate={}",
            self.dest_y,
            self.count,
            self.flags.bits(),
            self.iscale as f64 / FRACUNIT as f64,
            self.texturefrac as f64 / FRACUNIT as f64,
            source,
            self.light,
            self.color,
            self.srcalpha,
            self.destalpha,
            self.shade.light_red,
            self.shade.light_green,
            self.shade.light_blue,
            self.shade.light_alpha,
            self.shade.fade_red,
            self.shade.fade_green,
            self.shade.fade_blue,
            self.shade.fade_alpha,
            self.shade.desaturate,
        )
    }
}
