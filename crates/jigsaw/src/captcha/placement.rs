//! Random placement of the piece inside the canvas.

use jigsaw_common::Placement;
use rand::Rng;

/// Pick an in-bounds placement for a `piece_width` x `piece_height` piece.
///
/// Each coordinate is `floor(random() * (canvas - piece))` with `random()`
/// in `[0, 1)`, so `x` lies in `[0, canvas_width - piece_width)`. A piece
/// spanning a whole axis is placed at 0 on that axis.
///
/// # Panics
/// If the piece is larger than the canvas. Configuration validation rejects
/// such sizes at startup.
pub fn pick<R: Rng + ?Sized>(
    rng: &mut R,
    canvas_width: u32,
    canvas_height: u32,
    piece_width: u32,
    piece_height: u32,
) -> Placement {
    assert!(
        piece_width <= canvas_width && piece_height <= canvas_height,
        "piece {piece_width}x{piece_height} does not fit canvas {canvas_width}x{canvas_height}"
    );

    Placement::new(
        floor_sample(rng, canvas_width - piece_width),
        floor_sample(rng, canvas_height - piece_height),
        piece_width,
        piece_height,
    )
}

/// `floor(random() * range)`, kept below `range` when rounding would reach it
fn floor_sample<R: Rng + ?Sized>(rng: &mut R, range: u32) -> u32 {
    let unit: f64 = rng.random();
    let value = (unit * range as f64).floor() as u32;
    value.min(range.saturating_sub(1))
}
