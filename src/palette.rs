//! Representative colors for the sidebar swatches.

use crate::raster::RasterBuffer;

/// Side of the square the source is downsampled to before sampling.
pub const PALETTE_SAMPLE_SIZE: u32 = 50;
/// Maximum number of colors returned.
pub const MAX_PALETTE_COLORS: usize = 8;
/// Pixel stride between samples.
const SAMPLE_STRIDE: usize = 10;

/// Format an RGB triple as `#rrggbb`.
#[must_use]
pub fn to_hex([r, g, b]: [u8; 3]) -> String {
    format!("#{r:02x}{g:02x}{b:02x}")
}

/// Sample up to eight distinct colors, in first-found order.
///
/// The image is downsampled to a 50x50 square and every tenth pixel is
/// visited. An empty image yields an empty palette.
#[must_use]
pub fn sample_palette(image: &RasterBuffer) -> Vec<String> {
    if image.is_empty() {
        return Vec::new();
    }

    let sample = image.resized(PALETTE_SAMPLE_SIZE, PALETTE_SAMPLE_SIZE);
    let mut palette: Vec<String> = Vec::with_capacity(MAX_PALETTE_COLORS);
    for px in sample.pixels().step_by(SAMPLE_STRIDE) {
        let hex = to_hex([px[0], px[1], px[2]]);
        if !palette.contains(&hex) {
            palette.push(hex);
            if palette.len() >= MAX_PALETTE_COLORS {
                break;
            }
        }
    }
    palette
}
