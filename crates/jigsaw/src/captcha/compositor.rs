//! Puzzle / piece image compositing.
//!
//! The source is stretched onto the canvas, the piece is cut out at the
//! placement, and the placement is masked on the puzzle so the hole is
//! visible but its edge is soft.

use std::io::Cursor;

use image::imageops::{self, FilterType};
use image::{ImageFormat, RgbaImage};
use imageproc::drawing::{Blend, draw_filled_rect_mut, draw_hollow_rect_mut};
use imageproc::rect::Rect as PixelRect;
use jigsaw_common::constants::DEFAULT_OVERLAY_ALPHA;
use jigsaw_common::{ChallengeError, Placement};
use serde::Deserialize;

/// How the true region is masked on the puzzle image
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(tag = "style", rename_all = "snake_case")]
pub enum OverlayStyle {
    /// Translucent fill over the region
    Fill {
        #[serde(default)]
        color: [u8; 3],
        #[serde(default = "default_alpha")]
        alpha: f32,
    },
    /// Two nested strokes in contrasting colors, `width` pixels each
    Border {
        #[serde(default)]
        outer: [u8; 3],
        #[serde(default = "default_inner")]
        inner: [u8; 3],
        #[serde(default = "default_border_width")]
        width: u32,
    },
}

fn default_alpha() -> f32 {
    DEFAULT_OVERLAY_ALPHA
}

fn default_inner() -> [u8; 3] {
    [255, 255, 255]
}

fn default_border_width() -> u32 {
    2
}

impl Default for OverlayStyle {
    fn default() -> Self {
        Self::Fill {
            color: [0, 0, 0],
            alpha: DEFAULT_OVERLAY_ALPHA,
        }
    }
}

impl OverlayStyle {
    pub fn validate(&self) -> Result<(), ChallengeError> {
        match *self {
            Self::Fill { alpha, .. } if !(0.0..=1.0).contains(&alpha) => Err(
                ChallengeError::Config(format!("overlay alpha {alpha} not in [0, 1]")),
            ),
            Self::Border { width: 0, .. } => {
                Err(ChallengeError::Config("overlay border width must be positive".into()))
            }
            _ => Ok(()),
        }
    }

    /// Paint the mask for `placement` onto `canvas`
    fn paint(&self, canvas: RgbaImage, placement: Placement) -> RgbaImage {
        match *self {
            Self::Fill { color, alpha } => {
                let a = (alpha * 255.0).round() as u8;
                let mut blend = Blend(canvas);
                draw_filled_rect_mut(
                    &mut blend,
                    pixel_rect(placement.x, placement.y, placement.w, placement.h),
                    image::Rgba([color[0], color[1], color[2], a]),
                );
                blend.0
            }
            Self::Border { outer, inner, width } => {
                let mut canvas = canvas;
                for ring in 0..width.saturating_mul(2) {
                    let inset = ring.saturating_mul(2);
                    if inset >= placement.w || inset >= placement.h {
                        break;
                    }
                    let [r, g, b] = if ring < width { outer } else { inner };
                    draw_hollow_rect_mut(
                        &mut canvas,
                        pixel_rect(
                            placement.x + ring,
                            placement.y + ring,
                            placement.w - inset,
                            placement.h - inset,
                        ),
                        image::Rgba([r, g, b, 255]),
                    );
                }
                canvas
            }
        }
    }
}

fn pixel_rect(x: u32, y: u32, w: u32, h: u32) -> PixelRect {
    PixelRect::at(x as i32, y as i32).of_size(w, h)
}

/// Encoded puzzle and piece plus the placement they were cut at
#[derive(Debug, Clone)]
pub struct Composite {
    pub puzzle_png: Vec<u8>,
    pub piece_png: Vec<u8>,
    pub solution: Placement,
}

/// Builds puzzle / piece pairs for a fixed canvas
#[derive(Debug, Clone)]
pub struct Compositor {
    canvas_width: u32,
    canvas_height: u32,
    require_square: bool,
    overlay: OverlayStyle,
}

impl Compositor {
    pub fn new(canvas_width: u32, canvas_height: u32, require_square: bool, overlay: OverlayStyle) -> Self {
        Self {
            canvas_width,
            canvas_height,
            require_square,
            overlay,
        }
    }

    pub fn canvas_size(&self) -> (u32, u32) {
        (self.canvas_width, self.canvas_height)
    }

    /// Reject sources that cannot be drawn onto the canvas
    pub fn check_source(&self, source: &RgbaImage) -> Result<(), ChallengeError> {
        let (width, height) = source.dimensions();
        if width == 0 || height == 0 {
            return Err(ChallengeError::InvalidSourceImage(format!(
                "source is {width}x{height}"
            )));
        }
        if self.require_square && width != height {
            return Err(ChallengeError::InvalidSourceImage(format!(
                "a square image is required, got {width}x{height}"
            )));
        }
        Ok(())
    }

    /// Composite the puzzle and piece for `placement`
    pub fn compose(&self, source: &RgbaImage, placement: Placement) -> Result<Composite, ChallengeError> {
        self.check_source(source)?;
        if !placement.fits_within(self.canvas_width, self.canvas_height) {
            return Err(ChallengeError::Internal(format!(
                "placement {placement:?} outside {}x{} canvas",
                self.canvas_width, self.canvas_height
            )));
        }

        let canvas = self.fit_canvas(source);
        let piece =
            imageops::crop_imm(&canvas, placement.x, placement.y, placement.w, placement.h).to_image();
        let puzzle = self.overlay.paint(canvas, placement);

        Ok(Composite {
            puzzle_png: encode_png(&puzzle)?,
            piece_png: encode_png(&piece)?,
            solution: placement,
        })
    }

    /// Stretch the source to exactly the canvas size (per-axis scaling)
    pub(crate) fn fit_canvas(&self, source: &RgbaImage) -> RgbaImage {
        imageops::resize(source, self.canvas_width, self.canvas_height, FilterType::Triangle)
    }
}

/// Decode an encoded image (any format the codec knows) into RGBA pixels
pub fn decode_source(bytes: &[u8]) -> Result<RgbaImage, ChallengeError> {
    image::load_from_memory(bytes)
        .map(|img| img.to_rgba8())
        .map_err(|e| ChallengeError::InvalidSourceImage(e.to_string()))
}

fn encode_png(image: &RgbaImage) -> Result<Vec<u8>, ChallengeError> {
    let mut out = Cursor::new(Vec::new());
    image
        .write_to(&mut out, ImageFormat::Png)
        .map_err(|e| ChallengeError::Codec(e.to_string()))?;
    Ok(out.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn gradient(width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_fn(width, height, |x, y| {
            Rgba([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8, 255])
        })
    }

    fn decode(bytes: &[u8]) -> RgbaImage {
        image::load_from_memory(bytes).unwrap().to_rgba8()
    }

    #[test]
    fn test_piece_is_cut_from_scaled_canvas() {
        let compositor = Compositor::new(300, 300, true, OverlayStyle::default());
        let source = gradient(120, 120);
        let placement = Placement::new(100, 120, 50, 50);

        let composite = compositor.compose(&source, placement).unwrap();
        assert_eq!(composite.solution, placement);

        let piece = decode(&composite.piece_png);
        let expected = imageops::crop_imm(&compositor.fit_canvas(&source), 100, 120, 50, 50).to_image();
        assert_eq!(piece.dimensions(), (50, 50));
        assert_eq!(piece, expected);
    }

    #[test]
    fn test_fill_overlay_darkens_only_the_placement() {
        let compositor = Compositor::new(300, 300, true, OverlayStyle::default());
        let source = RgbaImage::from_pixel(10, 10, Rgba([200, 180, 160, 255]));
        let placement = Placement::new(40, 60, 50, 50);

        let composite = compositor.compose(&source, placement).unwrap();
        let puzzle = decode(&composite.puzzle_png);
        let canvas = compositor.fit_canvas(&source);
        assert_eq!(puzzle.dimensions(), (300, 300));

        let inside = puzzle.get_pixel(60, 80);
        let original = canvas.get_pixel(60, 80);
        for c in 0..3 {
            assert!(inside[c] < original[c], "channel {c}: {inside:?} vs {original:?}");
        }

        assert_eq!(puzzle.get_pixel(10, 10), canvas.get_pixel(10, 10));
        assert_eq!(puzzle.get_pixel(95, 60), canvas.get_pixel(95, 60));
    }

    #[test]
    fn test_border_overlay_strokes_edges_and_keeps_center() {
        let overlay = OverlayStyle::Border {
            outer: [0, 0, 0],
            inner: [255, 255, 255],
            width: 2,
        };
        let compositor = Compositor::new(200, 200, true, overlay);
        let source = RgbaImage::from_pixel(4, 4, Rgba([90, 120, 30, 255]));
        let placement = Placement::new(20, 30, 40, 40);

        let puzzle = decode(&compositor.compose(&source, placement).unwrap().puzzle_png);
        let canvas = compositor.fit_canvas(&source);

        assert_eq!(*puzzle.get_pixel(20, 30), Rgba([0, 0, 0, 255]));
        assert_eq!(*puzzle.get_pixel(21, 45), Rgba([0, 0, 0, 255]));
        assert_eq!(*puzzle.get_pixel(22, 45), Rgba([255, 255, 255, 255]));
        assert_eq!(*puzzle.get_pixel(59, 69), Rgba([0, 0, 0, 255]));
        assert_eq!(puzzle.get_pixel(40, 50), canvas.get_pixel(40, 50));
    }

    #[test]
    fn test_non_square_canvas_scales_per_axis() {
        let compositor = Compositor::new(320, 160, false, OverlayStyle::default());
        let composite = compositor.compose(&gradient(64, 200), Placement::new(270, 110, 50, 50)).unwrap();
        assert_eq!(decode(&composite.puzzle_png).dimensions(), (320, 160));
        assert_eq!(decode(&composite.piece_png).dimensions(), (50, 50));
    }

    #[test]
    fn test_rejects_empty_source() {
        let compositor = Compositor::new(300, 300, false, OverlayStyle::default());
        let err = compositor
            .compose(&RgbaImage::new(0, 10), Placement::new(0, 0, 50, 50))
            .unwrap_err();
        assert!(matches!(err, ChallengeError::InvalidSourceImage(_)));
    }

    #[test]
    fn test_rejects_non_square_source_when_required() {
        let compositor = Compositor::new(300, 300, true, OverlayStyle::default());
        let err = compositor
            .compose(&gradient(64, 32), Placement::new(0, 0, 50, 50))
            .unwrap_err();
        assert_eq!(err.kind(), "invalid-source-image");

        let lenient = Compositor::new(300, 300, false, OverlayStyle::default());
        assert!(lenient.compose(&gradient(64, 32), Placement::new(0, 0, 50, 50)).is_ok());
    }

    #[test]
    fn test_rejects_out_of_canvas_placement() {
        let compositor = Compositor::new(300, 300, true, OverlayStyle::default());
        let err = compositor
            .compose(&gradient(8, 8), Placement::new(260, 0, 50, 50))
            .unwrap_err();
        assert!(matches!(err, ChallengeError::Internal(_)));
    }

    #[test]
    fn test_decode_source_round_trips_png() {
        let source = gradient(16, 16);
        let bytes = encode_png(&source).unwrap();
        assert_eq!(decode_source(&bytes).unwrap(), source);

        let err = decode_source(b"definitely not an image").unwrap_err();
        assert!(matches!(err, ChallengeError::InvalidSourceImage(_)));
    }

    #[test]
    fn test_overlay_validation() {
        assert!(OverlayStyle::default().validate().is_ok());
        assert!(OverlayStyle::Fill { color: [0; 3], alpha: 1.5 }.validate().is_err());
        assert!(
            OverlayStyle::Border { outer: [0; 3], inner: [255; 3], width: 0 }
                .validate()
                .is_err()
        );
    }
}
