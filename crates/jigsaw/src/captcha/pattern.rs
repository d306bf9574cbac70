//! Procedural background patterns.
//!
//! Used in place of a source image. A pattern is a deterministic function of
//! its seed, base color and size hint. Renderers may ignore the hint, so
//! callers must be ready to re-render when the output is too small.

use image::{Rgb, Rgba, RgbaImage};
use imageproc::drawing::{
    Blend, draw_filled_circle_mut, draw_filled_rect_mut, draw_hollow_circle_mut, draw_line_segment_mut,
};
use imageproc::rect::Rect as PixelRect;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Renders a background for a seed and base color, ideally at least
/// `min_side` pixels on each side
pub trait PatternRenderer: Send + Sync {
    fn render(&self, seed: u64, color: Rgb<u8>, min_side: u32) -> RgbaImage;
}

/// Built-in square tiled pattern with shapes shaded around the base color
#[derive(Debug, Clone, Copy, Default)]
pub struct TilePattern;

const MIN_TILE: u32 = 6;
const MAX_TILE: u32 = 48;
const MIN_TILES: u32 = 2;
const MAX_TILES: u32 = 12;

/// Largest side `TilePattern` can produce
pub const MAX_PATTERN_SIDE: u32 = MAX_TILE * MAX_TILES;

impl PatternRenderer for TilePattern {
    fn render(&self, seed: u64, color: Rgb<u8>, min_side: u32) -> RgbaImage {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut tile = rng.random_range(MIN_TILE..=MAX_TILE);
        let mut tiles = rng.random_range(MIN_TILES..=MAX_TILES);

        // Grow the grid first, then the tiles, up to MAX_PATTERN_SIDE
        if tile * tiles < min_side {
            tiles = min_side.div_ceil(tile).min(MAX_TILES);
        }
        if tile * tiles < min_side {
            tile = min_side.div_ceil(tiles).min(MAX_TILE);
        }
        let side = tile * tiles;

        let mut canvas = Blend(RgbaImage::from_pixel(side, side, opaque(color)));

        for row in 0..tiles {
            for col in 0..tiles {
                let x = (col * tile) as i32;
                let y = (row * tile) as i32;
                let half = (tile / 2) as i32;
                let mut fill = shade(color, rng.random_range(-70..=70));
                fill[3] = rng.random_range(60..=220);

                match rng.random_range(0..4u8) {
                    0 => draw_filled_rect_mut(&mut canvas, PixelRect::at(x, y).of_size(tile, tile), fill),
                    1 => draw_filled_circle_mut(&mut canvas, (x + half, y + half), half, fill),
                    2 => draw_hollow_circle_mut(&mut canvas, (x + half, y + half), half, fill),
                    _ => {
                        let (x0, y0, x1) = (x as f32, y as f32, (x + tile as i32) as f32);
                        let y1 = (y + tile as i32) as f32;
                        draw_line_segment_mut(&mut canvas, (x0, y0), (x1, y1), fill);
                        draw_line_segment_mut(&mut canvas, (x0, y1), (x1, y0), fill);
                    }
                }
            }
        }

        canvas.0
    }
}

fn opaque(color: Rgb<u8>) -> Rgba<u8> {
    Rgba([color[0], color[1], color[2], 255])
}

/// Lighten (positive) or darken (negative) every channel
fn shade(color: Rgb<u8>, delta: i16) -> Rgba<u8> {
    let adjust = |c: u8| (c as i16 + delta).clamp(0, 255) as u8;
    Rgba([adjust(color[0]), adjust(color[1]), adjust(color[2]), 255])
}

#[cfg(test)]
mod tests {
    use super::*;

    const BLUE: Rgb<u8> = Rgb([59, 130, 246]);

    #[test]
    fn test_same_seed_same_pattern() {
        let a = TilePattern.render(42, BLUE, 0);
        let b = TilePattern.render(42, BLUE, 0);
        assert_eq!(a, b);
    }

    #[test]
    fn test_output_is_square_and_bounded() {
        for seed in 0..200 {
            let img = TilePattern.render(seed, BLUE, 0);
            let (w, h) = img.dimensions();
            assert_eq!(w, h);
            assert!(w >= MIN_TILE * MIN_TILES && w <= MAX_PATTERN_SIDE, "seed {seed}: {w}");
        }
    }

    #[test]
    fn test_sizes_vary_with_seed() {
        let sizes: std::collections::HashSet<u32> =
            (0..50).map(|seed| TilePattern.render(seed, BLUE, 0).width()).collect();
        assert!(sizes.len() > 1);
    }

    #[test]
    fn test_honours_min_side_up_to_max() {
        for min_side in [50, 300, 401, 500, 575, MAX_PATTERN_SIDE] {
            for seed in 0..20 {
                let side = TilePattern.render(seed, BLUE, min_side).width();
                assert!(side >= min_side, "min {min_side} seed {seed}: {side}");
                assert!(side <= MAX_PATTERN_SIDE);
            }
        }
    }

    #[test]
    fn test_hint_beyond_max_caps_at_max() {
        assert_eq!(TilePattern.render(7, BLUE, 10_000).width(), MAX_PATTERN_SIDE);
    }

    #[test]
    fn test_shade_clamps() {
        assert_eq!(shade(Rgb([250, 10, 128]), 20), Rgba([255, 30, 148, 255]));
        assert_eq!(shade(Rgb([250, 10, 128]), -20), Rgba([230, 0, 108, 255]));
    }
}
