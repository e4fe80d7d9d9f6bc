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

//! rtdraw entry point
//!
//! Renders a test scene (textured wall columns under a solid sky and floor,
//! with particles on top) on the worker pool, optionally writing the last
//! frame as a PPM image and a JSON run summary.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use clap::Parser;
use serde::Serialize;

use rtdraw::core::color::{self, Palette};
use rtdraw::core::config::DrawerConfig;
use rtdraw::core::drawers::{
    ColumnDrawState, DrawColumnHorizPalCommand, DrawColumnRtCommand, DrawParticleColumnCommand,
    RtInitColsCommand,
};
use rtdraw::core::fixed::FRACUNIT;
use rtdraw::core::queue::{CommandRef, DrawerQueue};
use rtdraw::core::surface::Surface;
use rtdraw::core::texture::TexelSource;

const TEXTURE_SIZE: usize = 64;

/// Multi-threaded column and particle rasterizer demo
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Surface width in pixels
    #[arg(long, default_value = "320")]
    width: usize,

    /// Surface height in pixels
    #[arg(long, default_value = "200")]
    height: usize,

    /// Worker threads (overrides config and RTDRAW_CORES)
    #[arg(short, long)]
    cores: Option<usize>,

    /// Rows per pass (overrides config and RTDRAW_PASS_HEIGHT)
    #[arg(long)]
    pass_height: Option<usize>,

    /// TOML drawer configuration
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of particles
    #[arg(short, long, default_value = "64")]
    particles: usize,

    /// Frames to render
    #[arg(short, long, default_value = "1")]
    frames: usize,

    /// Write the last frame as a binary PPM
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Write a JSON run summary
    #[arg(long)]
    summary: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct RunSummary {
    timestamp: DateTime<Utc>,
    width: usize,
    height: usize,
    num_cores: usize,
    pass_height: Option<usize>,
    frames: usize,
    particles: usize,
    commands_per_frame: usize,
    total_ms: f64,
    avg_frame_ms: f64,
    output: Option<PathBuf>,
}

/// Brick-like palette texture split into columns
fn wall_texture() -> Vec<TexelSource> {
    (0..TEXTURE_SIZE)
        .map(|u| {
            let column: Vec<u8> = (0..TEXTURE_SIZE)
                .map(|v| {
                    let offset = if v / 16 % 2 == 0 { 0 } else { 16 };
                    let mortar = v % 16 == 0 || (u + offset) % 32 == 0;
                    if mortar {
                        40
                    } else {
                        (128 + (u * 7 + v * 13) % 64) as u8
                    }
                })
                .collect();
            TexelSource::from(column)
        })
        .collect()
}

/// Warm gradient palette
fn scene_palette() -> Palette {
    let mut colors = [0u32; 256];
    for (i, entry) in colors.iter_mut().enumerate() {
        let i = i as u32;
        *entry = color::pack_rgb(i, i * 3 / 4, i / 2);
    }
    Palette::new(colors)
}

/// Small deterministic generator for particle placement
struct XorShift(u64);

impl XorShift {
    fn next(&mut self) -> u64 {
        self.0 ^= self.0 << 13;
        self.0 ^= self.0 >> 7;
        self.0 ^= self.0 << 17;
        self.0
    }

    fn below(&mut self, bound: usize) -> usize {
        (self.next() % bound.max(1) as u64) as usize
    }
}

fn build_frame(
    surface: &Arc<Surface>,
    staging_height: usize,
    texture: &[TexelSource],
    palette: &Arc<Palette>,
    particles: usize,
    frame: usize,
) -> rtdraw::Result<Vec<CommandRef>> {
    let width = surface.width() as i32;
    let height = surface.height() as i32;
    let mut state = ColumnDrawState::new(Arc::clone(surface), staging_height);
    state.palette = Arc::clone(palette);

    let mut commands: Vec<CommandRef> = vec![Arc::new(RtInitColsCommand::new(None))];

    for x in 0..width {
        let phase = (x as f64 + frame as f64 * 4.0) / width as f64 * std::f64::consts::TAU;
        let wall = ((0.45 + 0.25 * phase.sin()) * height as f64) as i32;
        let wall = wall.clamp(1, height);
        let yl = (height - wall) / 2;
        let yh = yl + wall - 1;

        // Sky
        state.indexed = false;
        state.light = 0;
        state.color = 96;
        commands.push(Arc::new(DrawColumnRtCommand::fill(&state, x, 0, yl - 1)?));

        // Wall
        state.set_span(x, yl, yh);
        state.source = Some(texture[x as usize % TEXTURE_SIZE].clone());
        state.iscale = (TEXTURE_SIZE as i32 * FRACUNIT) / wall;
        state.texturefrac = 0;
        state.indexed = true;
        state.light = ((height - wall) * 256).clamp(0, 200 * 256);
        commands.push(Arc::new(DrawColumnHorizPalCommand::new(&state)?));
        commands.push(Arc::new(DrawColumnRtCommand::new(&state, x as usize, x, yl, yh)?));

        // Floor
        state.indexed = false;
        state.light = 96 * 256;
        state.color = 48;
        commands.push(Arc::new(DrawColumnRtCommand::fill(&state, x, yh + 1, height - 1)?));
    }

    let mut rng = XorShift(0x9E37_79B9_7F4A_7C15 ^ frame as u64);
    for _ in 0..particles {
        let size = 4 + rng.below(13) as i32;
        if size > width || size > height {
            continue;
        }
        let px = rng.below((width - size + 1) as usize) as i32;
        let py = rng.below((height - size + 1) as usize) as i32;
        let fg = color::pack_rgb(
            128 + rng.below(128) as u32,
            64 + rng.below(192) as u32,
            rng.below(256) as u32,
        );
        let alpha = 128 + rng.below(129) as u32;

        for i in 0..size {
            let fracposx = (i * 16 * FRACUNIT / size) as u32;
            commands.push(Arc::new(DrawParticleColumnCommand::new(
                surface, px + i, py, size, fg, alpha, fracposx,
            )?));
        }
    }

    Ok(commands)
}

fn write_ppm(surface: &Surface, path: &Path) -> std::io::Result<()> {
    let mut out = BufWriter::new(File::create(path)?);
    write!(out, "P6\n{} {}\n255\n", surface.width(), surface.height())?;
    for y in 0..surface.height() {
        for x in 0..surface.width() {
            let pixel = surface.pixel(x, y);
            out.write_all(&[
                color::red(pixel) as u8,
                color::green(pixel) as u8,
                color::blue(pixel) as u8,
            ])?;
        }
    }
    out.flush()
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => DrawerConfig::load(path)?,
        None => DrawerConfig::default(),
    };
    config.apply_env()?;
    if let Some(cores) = args.cores {
        config.num_cores = cores;
    }
    if args.pass_height.is_some() {
        config.pass_height = args.pass_height;
    }
    config.staging_height = config.staging_height.max(args.height);
    config.validate()?;

    log::info!(
        "Rendering {} frame(s) at {}x{} with {} particles",
        args.frames,
        args.width,
        args.height,
        args.particles
    );

    let surface = Arc::new(Surface::new(args.width, args.height));
    let texture = wall_texture();
    let palette = Arc::new(scene_palette());
    let mut queue = DrawerQueue::new(&config)?;

    let mut total_ms = 0.0;
    let mut commands_per_frame = 0;
    for frame in 0..args.frames {
        surface.fill(color::OPAQUE);
        let commands = build_frame(
            &surface,
            config.staging_height,
            &texture,
            &palette,
            args.particles,
            frame,
        )?;
        commands_per_frame = commands.len();

        let stats = queue.run(&commands, surface.height())?;
        total_ms += stats.elapsed_ms;
        log::debug!("Frame {}: {:.3} ms", frame, stats.elapsed_ms);
    }

    let avg_frame_ms = if args.frames > 0 {
        total_ms / args.frames as f64
    } else {
        0.0
    };
    log::info!("Average frame time: {:.3} ms", avg_frame_ms);

    if let Some(path) = &args.output {
        write_ppm(&surface, path)?;
        log::info!("Wrote {}", path.display());
    }

    if let Some(path) = &args.summary {
        let summary = RunSummary {
            timestamp: Utc::now(),
            width: args.width,
            height: args.height,
            num_cores: config.num_cores,
            pass_height: config.pass_height,
            frames: args.frames,
            particles: args.particles,
            commands_per_frame,
            total_ms,
            avg_frame_ms,
            output: args.output.clone(),
        };
        let file = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(file, &summary)?;
        log::info!("Wrote summary {}", path.display());
    }

    Ok(())
}
