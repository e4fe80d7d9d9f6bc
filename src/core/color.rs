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

//! Packed color math
//!
//! All pixels are packed 32-bit values in 0xAARRGGBB layout. Every path in
//! the drawers writes alpha as fully opaque (0xFF).
//!
//! # Light
//!
//! Light levels arrive as 16.16 fixed-point values where `0` is full bright
//! and `FRACUNIT` is black. [`calc_light_multiplier`] turns that into a
//! 0..=256 channel multiplier.
//!
//! # Shading
//!
//! - Simple shade: every channel is multiplied by the light multiplier.
//! - Full shade: desaturate, fade towards the fade color as light drops,
//!   then tint by the per-channel light color.

use serde::{Deserialize, Serialize};

use crate::core::error::{DrawerError, Result};
use crate::core::fixed::{Fixed, FRACBITS};

/// Alpha bits forced on every written pixel
pub const OPAQUE: u32 = 0xFF00_0000;

#[inline(always)]
pub fn red(color: u32) -> u32 {
    (color >> 16) & 0xFF
}

#[inline(always)]
pub fn green(color: u32) -> u32 {
    (color >> 8) & 0xFF
}

#[inline(always)]
pub fn blue(color: u32) -> u32 {
    color & 0xFF
}

/// Pack 8-bit channels into an opaque pixel
#[inline(always)]
pub fn pack_rgb(r: u32, g: u32, b: u32) -> u32 {
    OPAQUE | (r << 16) | (g << 8) | b
}

/// 256-entry table of base colors
///
/// # Example
///
/// ```
/// use rtdraw::core::color::Palette;
///
/// let palette = Palette::grayscale();
/// assert_eq!(palette.color(255), 0xFFFF_FFFF);
/// assert_eq!(palette.color(0), 0xFF00_0000);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    colors: Box<[u32; 256]>,
}

impl Palette {
    pub fn new(colors: [u32; 256]) -> Self {
        Self {
            colors: Box::new(colors),
        }
    }

    /// Gray ramp palette (index `i` maps to `(i, i, i)`)
    pub fn grayscale() -> Self {
        let mut colors = [0u32; 256];
        for (i, color) in colors.iter_mut().enumerate() {
            let v = i as u32;
            *color = pack_rgb(v, v, v);
        }
        Self::new(colors)
    }

    /// Base color of a palette index, alpha forced opaque
    #[inline(always)]
    pub fn color(&self, index: u8) -> u32 {
        self.colors[index as usize] | OPAQUE
    }

    pub fn colors(&self) -> &[u32; 256] {
        &self.colors
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self::grayscale()
    }
}

/// Per-channel shading constants for the full shade path
///
/// Channel values are on a 0..=256 scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShadeConstants {
    pub light_red: u32,
    pub light_green: u32,
    pub light_blue: u32,
    pub light_alpha: u32,
    pub fade_red: u32,
    pub fade_green: u32,
    pub fade_blue: u32,
    pub fade_alpha: u32,
    pub desaturate: u32,
    /// Skip fade/desaturate/tint and only scale by the light multiplier
    pub simple_shade: bool,
}

impl Default for ShadeConstants {
    fn default() -> Self {
        Self {
            light_red: 256,
            light_green: 256,
            light_blue: 256,
            light_alpha: 256,
            fade_red: 0,
            fade_green: 0,
            fade_blue: 0,
            fade_alpha: 0,
            desaturate: 0,
            simple_shade: true,
        }
    }
}

impl ShadeConstants {
    /// Reject channel values outside 0..=256
    pub fn validate(&self) -> Result<()> {
        let channels = [
            ("light_red", self.light_red),
            ("light_green", self.light_green),
            ("light_blue", self.light_blue),
            ("light_alpha", self.light_alpha),
            ("fade_red", self.fade_red),
            ("fade_green", self.fade_green),
            ("fade_blue", self.fade_blue),
            ("fade_alpha", self.fade_alpha),
            ("desaturate", self.desaturate),
        ];
        match channels.into_iter().find(|&(_, value)| value > 256) {
            Some((name, value)) => Err(DrawerError::ShadeConstant { name, value }),
            None => Ok(()),
        }
    }
}

/// Convert a fixed-point light level into a 0..=256 channel multiplier
///
/// # Example
///
/// ```
/// use rtdraw::core::color::calc_light_multiplier;
/// use rtdraw::core::fixed::FRACUNIT;
///
/// assert_eq!(calc_light_multiplier(0), 256);
/// assert_eq!(calc_light_multiplier(FRACUNIT), 0);
/// assert_eq!(calc_light_multiplier(FRACUNIT / 2), 128);
/// ```
#[inline(always)]
pub fn calc_light_multiplier(light: Fixed) -> u32 {
    (256 - (light >> (FRACBITS - 8))).clamp(0, 256) as u32
}

/// Uniform light scale of a packed color
#[inline(always)]
pub fn shade_bgra_simple(color: u32, light: u32) -> u32 {
    pack_rgb(
        red(color) * light / 256,
        green(color) * light / 256,
        blue(color) * light / 256,
    )
}

/// Palette lookup followed by a uniform light scale
#[inline(always)]
pub fn shade_pal_index_simple(palette: &Palette, index: u8, light: u32) -> u32 {
    shade_bgra_simple(palette.color(index), light)
}

/// Full shade: desaturate, fade, then tint
#[inline(always)]
pub fn shade_bgra_full(color: u32, light: u32, constants: &ShadeConstants) -> u32 {
    let (mut r, mut g, mut b) = (red(color), green(color), blue(color));

    let inv_light = 256 - light;
    let inv_desaturate = 256 - constants.desaturate;

    let intensity = ((r * 77 + g * 143 + b * 37) >> 8) * constants.desaturate;
    r = (r * inv_desaturate + intensity) / 256;
    g = (g * inv_desaturate + intensity) / 256;
    b = (b * inv_desaturate + intensity) / 256;

    r = (constants.fade_red * inv_light + r * light) / 256;
    g = (constants.fade_green * inv_light + g * light) / 256;
    b = (constants.fade_blue * inv_light + b * light) / 256;

    r = r * constants.light_red / 256;
    g = g * constants.light_green / 256;
    b = b * constants.light_blue / 256;

    pack_rgb(r.min(255), g.min(255), b.min(255))
}

/// Shade a color with the mode selected by `constants.simple_shade`
#[inline(always)]
pub fn shade_bgra(color: u32, light: u32, constants: &ShadeConstants) -> u32 {
    if constants.simple_shade {
        shade_bgra_simple(color, light)
    } else {
        shade_bgra_full(color, light, constants)
    }
}

/// Linear translucent blend `(fg * srcalpha + bg * destalpha) / 256`
///
/// Weights are on a 0..=256 scale. Channels saturate at 255 so additive
/// weight pairs (summing above 256) stay in range.
///
/// # Example
///
/// ```
/// use rtdraw::core::color::blend_translucent;
///
/// // Full source weight, no destination weight: plain copy
/// assert_eq!(blend_translucent(0xFF10_2030, 0xFFFF_FFFF, 256, 0), 0xFF10_2030);
/// ```
#[inline(always)]
pub fn blend_translucent(fg: u32, bg: u32, srcalpha: u32, destalpha: u32) -> u32 {
    let r = (red(fg) * srcalpha + red(bg) * destalpha) / 256;
    let g = (green(fg) * srcalpha + green(bg) * destalpha) / 256;
    let b = (blue(fg) * srcalpha + blue(bg) * destalpha) / 256;
    pack_rgb(r.min(255), g.min(255), b.min(255))
}

/// Coverage blend `(fg * alpha + bg * (256 - alpha)) / 256`
///
/// `alpha` is on a 0..=256 scale (256 replaces the background).
#[inline(always)]
pub fn blend_alpha(fg: u32, bg: u32, alpha: u32) -> u32 {
    let inv_alpha = 256 - alpha;
    let r = (red(fg) * alpha + red(bg) * inv_alpha) / 256;
    let g = (green(fg) * alpha + green(bg) * inv_alpha) / 256;
    let b = (blue(fg) * alpha + blue(bg) * inv_alpha) / 256;
    pack_rgb(r, g, b)
}
