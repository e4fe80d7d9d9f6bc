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

//! Destination surface
//!
//! The surface is the framebuffer every drawer writes into. It is shared by
//! all worker threads of a pass through an `Arc<Surface>`; the interleaved
//! row partitioning guarantees each row is written by exactly one thread.
//!
//! Pixels are stored as `AtomicU32` and accessed with `Relaxed` ordering.
//! That keeps shared writes free of `unsafe` while compiling to plain loads
//! and stores; the barrier between passes (joining the workers) is what
//! publishes the results.
//!
//! # Memory Layout
//!
//! Row-major, `pitch` pixels per row (`pitch >= width`):
//!
//! ```text
//! offset(x, y) = y * pitch + x
//! ```

use std::sync::atomic::{AtomicU32, Ordering};

/// Framebuffer of packed 0xAARRGGBB pixels
///
/// # Example
///
/// ```
/// use rtdraw::core::surface::Surface;
///
/// let surface = Surface::new(320, 200);
/// surface.fill(0xFF20_4060);
/// assert_eq!(surface.pixel(10, 10), 0xFF20_4060);
/// ```
#[derive(Debug)]
pub struct Surface {
    pixels: Box<[AtomicU32]>,
    width: usize,
    height: usize,
    pitch: usize,
}

impl Surface {
    /// Create a black surface with `pitch == width`
    pub fn new(width: usize, height: usize) -> Self {
        Self::with_pitch(width, height, width)
    }

    /// Create a black surface with an explicit row pitch
    ///
    /// # Panics
    ///
    /// Panics if `pitch < width`
    pub fn with_pitch(width: usize, height: usize, pitch: usize) -> Self {
        assert!(pitch >= width, "pitch must be at least the surface width");
        let pixels = (0..pitch * height)
            .map(|_| AtomicU32::new(0))
            .collect::<Vec<_>>()
            .into_boxed_slice();

        Self {
            pixels,
            width,
            height,
            pitch,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Pixels per row in memory
    pub fn pitch(&self) -> usize {
        self.pitch
    }

    /// Linear offset of pixel `(x, y)`
    #[inline(always)]
    pub fn offset(&self, x: usize, y: usize) -> usize {
        y * self.pitch + x
    }

    #[inline(always)]
    pub(crate) fn load(&self, offset: usize) -> u32 {
        self.pixels[offset].load(Ordering::Relaxed)
    }

    #[inline(always)]
    pub(crate) fn store(&self, offset: usize, color: u32) {
        self.pixels[offset].store(color, Ordering::Relaxed);
    }

    /// Read pixel `(x, y)`
    ///
    /// Only meaningful between passes, when no worker is writing.
    pub fn pixel(&self, x: usize, y: usize) -> u32 {
        self.load(self.offset(x, y))
    }

    /// Write pixel `(x, y)` from the producer side
    pub fn set_pixel(&self, x: usize, y: usize, color: u32) {
        self.store(self.offset(x, y), color);
    }

    /// Fill every pixel (including pitch padding) with `color`
    pub fn fill(&self, color: u32) {
        for pixel in self.pixels.iter() {
            pixel.store(color, Ordering::Relaxed);
        }
    }

    /// Copy out the visible `width * height` pixels in row-major order
    pub fn to_vec(&self) -> Vec<u32> {
        let mut out = Vec::with_capacity(self.width * self.height);
        for y in 0..self.height {
            let row = &self.pixels[y * self.pitch..y * self.pitch + self.width];
            out.extend(row.iter().map(|p| p.load(Ordering::Relaxed)));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_surface_is_black() {
        let surface = Surface::new(4, 3);
        assert_eq!(surface.to_vec(), vec![0; 12]);
        assert_eq!(surface.pitch(), 4);
    }

    #[test]
    fn test_pitch_padding_not_exported() {
        let surface = Surface::with_pitch(2, 2, 5);
        surface.fill(7);
        surface.set_pixel(1, 1, 9);
        assert_eq!(surface.offset(1, 1), 6);
        assert_eq!(surface.to_vec(), vec![7, 7, 7, 9]);
    }

    #[test]
    #[should_panic(expected = "pitch must be at least")]
    fn test_pitch_smaller_than_width_panics() {
        let _ = Surface::with_pitch(8, 2, 4);
    }
}
