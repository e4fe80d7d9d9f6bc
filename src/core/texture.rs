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

//! Texture column sources
//!
//! Column textures come in two element widths:
//! - 8-bit palette indices (masked or translated textures)
//! - 32-bit packed 0xAARRGGBB colors (true-color textures)
//!
//! The column sampler is generic over [`Texel`], so each width gets its own
//! monomorphized loop instead of a branch per texel.

use std::sync::Arc;

use bytemuck::Pod;

/// A texture column shared between the producer and every worker thread
#[derive(Debug, Clone)]
pub enum TexelSource {
    /// One palette index per texel
    Palette(Arc<[u8]>),
    /// One packed 0xAARRGGBB color per texel
    Bgra(Arc<[u32]>),
}

impl TexelSource {
    /// Number of texels in the column
    pub fn len(&self) -> usize {
        match self {
            TexelSource::Palette(texels) => texels.len(),
            TexelSource::Bgra(texels) => texels.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Packed value of texel `index`, widened to 32 bits
    #[inline(always)]
    pub fn packed(&self, index: usize) -> u32 {
        match self {
            TexelSource::Palette(texels) => texels[index] as u32,
            TexelSource::Bgra(texels) => texels[index],
        }
    }
}

impl From<Vec<u8>> for TexelSource {
    fn from(texels: Vec<u8>) -> Self {
        TexelSource::Palette(texels.into())
    }
}

impl From<Vec<u32>> for TexelSource {
    fn from(texels: Vec<u32>) -> Self {
        TexelSource::Bgra(texels.into())
    }
}

/// Texel element type a column sampler can be instantiated for
pub trait Texel: Pod + Send + Sync + 'static {
    /// Human readable element name (used in error messages)
    const NAME: &'static str;

    /// Widen the texel to the 32-bit staging representation
    fn to_packed(self) -> u32;

    /// Borrow the typed texels out of a source of matching width
    fn texels(source: &TexelSource) -> Option<&Arc<[Self]>>;
}

impl Texel for u8 {
    const NAME: &'static str = "8-bit palette index";

    #[inline(always)]
    fn to_packed(self) -> u32 {
        self as u32
    }

    fn texels(source: &TexelSource) -> Option<&Arc<[u8]>> {
        match source {
            TexelSource::Palette(texels) => Some(texels),
            TexelSource::Bgra(_) => None,
        }
    }
}

impl Texel for u32 {
    const NAME: &'static str = "32-bit packed color";

    #[inline(always)]
    fn to_packed(self) -> u32 {
        self
    }

    fn texels(source: &TexelSource) -> Option<&Arc<[u32]>> {
        match source {
            TexelSource::Bgra(texels) => Some(texels),
            TexelSource::Palette(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_texel_source_len() {
        let pal = TexelSource::from(vec![1u8, 2, 3]);
        let bgra = TexelSource::from(vec![0xFF00_0000u32; 5]);
        assert_eq!(pal.len(), 3);
        assert_eq!(bgra.len(), 5);
        assert!(!pal.is_empty());
    }

    #[test]
    fn test_texel_widening() {
        assert_eq!(0xABu8.to_packed(), 0xAB);
        assert_eq!(0x80FF_0011u32.to_packed(), 0x80FF_0011);
    }

    #[test]
    fn test_texels_by_width() {
        let pal = TexelSource::from(vec![9u8; 4]);
        assert!(u8::texels(&pal).is_some());
        assert!(u32::texels(&pal).is_none());
        assert_eq!(pal.packed(2), 9);
    }
}
