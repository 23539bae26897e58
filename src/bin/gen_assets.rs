//! Fallback sprite generator.
//! Run with: cargo run --bin gen-assets -- --output sprites/fallback.png
use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::Parser;
use image::{Rgba, RgbaImage};

#[derive(Debug, Parser)]
#[command(name = "gen-assets")]
struct Args {
    #[arg(short, long, default_value = "sprites/fallback.png")]
    output: PathBuf,

    #[arg(long, default_value_t = 32)]
    size: u32,

    /// Replace an existing file.
    #[arg(long)]
    force: bool,
}

// 5x7 question mark, one row per byte, high bits unused.
const GLYPH: [u8; 7] = [
    0b01110, 0b10001, 0b00001, 0b00110, 0b00100, 0b00000, 0b00100,
];

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    if args.output.exists() && !args.force {
        bail!("{} already exists (use --force to replace it)", args.output.display());
    }
    if args.size < 8 {
        bail!("size must be at least 8");
    }

    let img = generate_placeholder(
        args.size,
        Rgba([236, 228, 214, 255]),
        Rgba([92, 84, 112, 255]),
    );

    if let Some(parent) = args.output.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    img.save(&args.output)
        .with_context(|| format!("saving {}", args.output.display()))?;
    println!("Created {}", args.output.display());
    Ok(())
}

/// Framed tile with a question mark centred in it.
fn generate_placeholder(size: u32, fill: Rgba<u8>, ink: Rgba<u8>) -> RgbaImage {
    let mut img = RgbaImage::new(size, size);

    // Rounded frame: the four corner pixels stay transparent.
    for y in 0..size {
        for x in 0..size {
            let corner = (x == 0 || x == size - 1) && (y == 0 || y == size - 1);
            if corner {
                continue;
            }
            let is_border = x == 0 || x == size - 1 || y == 0 || y == size - 1;
            img.put_pixel(x, y, if is_border { ink } else { fill });
        }
    }

    let scale = (size / 10).max(1);
    let glyph_w = 5 * scale;
    let glyph_h = 7 * scale;
    let ox = (size - glyph_w) / 2;
    let oy = (size - glyph_h) / 2;
    for (row, &bits) in GLYPH.iter().enumerate() {
        for col in 0..5u32 {
            if bits & (1u8 << (4 - col)) == 0 {
                continue;
            }
            for dy in 0..scale {
                for dx in 0..scale {
                    img.put_pixel(ox + col * scale + dx, oy + row as u32 * scale + dy, ink);
                }
            }
        }
    }

    img
}
