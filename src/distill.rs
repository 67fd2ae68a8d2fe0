//! Background distillation for images that are already line art.
//!
//! Model output and scanned sketches have a non-uniform, often tinted paper
//! background. [`distill_lines`] estimates that background empirically,
//! measures each pixel's perceptual distance from it and maps the distance
//! through a soft threshold to ink alpha. A final connectivity pass drops
//! faint speckles that have no strong neighbor.

use crate::raster::{clamp_u8, luminance, RasterBuffer, LUMA_B, LUMA_G, LUMA_R};

/// Distances below this are pure background.
const DEAD_ZONE: f32 = 6.0;
/// Distances above this are solid ink.
const SATURATION: f32 = 22.0;
/// Slope of the logistic curve between the dead zone and saturation.
const STEEPNESS: f32 = 0.5;
/// Neighborhood radius averaged at each background sample point.
const SAMPLE_RADIUS: i64 = 2;
/// Alpha below which an isolated pixel counts as speckle.
const SPECKLE_MAX_ALPHA: u8 = 50;
/// A neighbor above this alpha anchors a faint pixel to a real line.
const ANCHOR_MIN_ALPHA: u8 = 100;
/// Sample points that must see opaque pixels before the paper is estimated.
const MIN_OPAQUE_SAMPLES: usize = 4;
/// Color written for foreground pixels.
pub const DISTILLED_INK: [u8; 3] = [0, 0, 0];

/// Estimate the paper color from eight border and edge-midpoint samples.
///
/// Each sample averages the opaque pixels of a small neighborhood; the
/// per-channel median of the samples rejects the odd sample that lands on a
/// stroke. Transparent pixels are not paper. Returns `None` for an empty
/// buffer, or when fewer than four sample points see any opaque pixel.
#[must_use]
#[allow(clippy::cast_possible_wrap, clippy::cast_sign_loss, clippy::cast_possible_truncation)]
pub fn estimate_background(buffer: &RasterBuffer) -> Option<[u8; 3]> {
    if buffer.is_empty() {
        return None;
    }

    let w = i64::from(buffer.width());
    let h = i64::from(buffer.height());
    let inset = (w.min(h) / 20).max(SAMPLE_RADIUS).min((w.min(h) - 1) / 2);
    let (left, right) = (inset, w - 1 - inset);
    let (top, bottom) = (inset, h - 1 - inset);
    let (mid_x, mid_y) = (w / 2, h / 2);

    let points = [
        (left, top),
        (right, top),
        (left, bottom),
        (right, bottom),
        (mid_x, top),
        (mid_x, bottom),
        (left, mid_y),
        (right, mid_y),
    ];

    let samples: Vec<[u8; 3]> = points
        .iter()
        .filter_map(|&(cx, cy)| {
            let mut sum = [0u32; 3];
            let mut count = 0u32;
            for y in (cy - SAMPLE_RADIUS).max(0)..=(cy + SAMPLE_RADIUS).min(h - 1) {
                for x in (cx - SAMPLE_RADIUS).max(0)..=(cx + SAMPLE_RADIUS).min(w - 1) {
                    let Some(px) = buffer.pixel(x as u32, y as u32) else {
                        continue;
                    };
                    if px[3] == 0 {
                        continue;
                    }
                    for (acc, &v) in sum.iter_mut().zip(&px[..3]) {
                        *acc += u32::from(v);
                    }
                    count += 1;
                }
            }
            (count > 0).then(|| sum.map(|s| ((s + count / 2) / count) as u8))
        })
        .collect();

    if samples.len() < MIN_OPAQUE_SAMPLES {
        log::debug!(
            "only {} of {} background samples are opaque, no paper to estimate",
            samples.len(),
            points.len()
        );
        return None;
    }

    let mut background = [0u8; 3];
    for (ch, out) in background.iter_mut().enumerate() {
        let mut values: Vec<u8> = samples.iter().map(|s| s[ch]).collect();
        values.sort_unstable();
        let upper = values.len() / 2;
        *out = if values.len() % 2 == 1 {
            values[upper]
        } else {
            ((u16::from(values[upper - 1]) + u16::from(values[upper]) + 1) / 2) as u8
        };
    }

    Some(background)
}

/// Luma-weighted Euclidean distance between two colors.
#[must_use]
pub fn perceptual_distance(a: [u8; 3], b: [u8; 3]) -> f32 {
    let dr = LUMA_R * (f32::from(a[0]) - f32::from(b[0]));
    let dg = LUMA_G * (f32::from(a[1]) - f32::from(b[1]));
    let db = LUMA_B * (f32::from(a[2]) - f32::from(b[2]));
    (dr * dr + dg * dg + db * db).sqrt()
}

/// Map a background distance to foreground strength in `[0, 1]`.
#[must_use]
pub fn foreground_strength(distance: f32) -> f32 {
    if distance < DEAD_ZONE {
        0.0
    } else if distance > SATURATION {
        1.0
    } else {
        let midpoint = (DEAD_ZONE + SATURATION) / 2.0;
        1.0 / (1.0 + (-STEEPNESS * (distance - midpoint)).exp())
    }
}

/// Strip the background from a line-art image in place.
///
/// Every pixel becomes [`DISTILLED_INK`] with alpha equal to its foreground
/// strength times 255. Pixels that were already transparent stay
/// transparent. Faint pixels (alpha below 50) whose 8 neighbors are all at
/// most 100 are then cleared.
///
/// A buffer whose border is mostly transparent has no paper left to strip;
/// its visible pixels are recolored to ink and keep their alpha.
pub fn distill_lines(buffer: &mut RasterBuffer) {
    if buffer.is_empty() {
        return;
    }
    let Some(background) = estimate_background(buffer) else {
        let [ir, ig, ib] = DISTILLED_INK;
        for px in buffer.pixels_mut() {
            px[..3].copy_from_slice(&[ir, ig, ib]);
        }
        log::debug!(
            "{}x{} already has a transparent background, recolored to ink",
            buffer.width(),
            buffer.height()
        );
        return;
    };
    log::debug!(
        "distilling {}x{} against background {background:?}",
        buffer.width(),
        buffer.height()
    );

    let [ir, ig, ib] = DISTILLED_INK;
    for px in buffer.pixels_mut() {
        let alpha = if px[3] == 0 {
            0
        } else {
            let distance = perceptual_distance([px[0], px[1], px[2]], background);
            clamp_u8(foreground_strength(distance) * 255.0)
        };
        px.copy_from_slice(&[ir, ig, ib, alpha]);
    }

    let cleared = remove_speckles(buffer);
    log::debug!("distill speckle pass cleared {cleared} pixels");
}

/// Clear faint pixels that have no strong 8-neighbor. Returns how many were
/// cleared.
fn remove_speckles(buffer: &mut RasterBuffer) -> usize {
    let width = buffer.width() as usize;
    let height = buffer.height() as usize;
    let alpha = buffer.alpha_plane();
    let data = buffer.as_raw_mut();
    let mut cleared = 0;

    for y in 0..height {
        for x in 0..width {
            let a = alpha[y * width + x];
            if a == 0 || a >= SPECKLE_MAX_ALPHA {
                continue;
            }
            let anchored = (y.saturating_sub(1)..=(y + 1).min(height - 1)).any(|ny| {
                (x.saturating_sub(1)..=(x + 1).min(width - 1)).any(|nx| {
                    (nx, ny) != (x, y) && alpha[ny * width + nx] > ANCHOR_MIN_ALPHA
                })
            });
            if !anchored {
                data[(y * width + x) * 4 + 3] = 0;
                cleared += 1;
            }
        }
    }

    cleared
}

/// Clean up raw grayscale output of a line-art model in place.
///
/// Pushes light grays to white and dark grays to black with a steep
/// logistic curve for midtones, then whitens interior dark pixels that are
/// surrounded by light ones on at least three sides. Output is opaque gray.
pub fn condition_model_output(buffer: &mut RasterBuffer) {
    for px in buffer.pixels_mut() {
        let v = luminance(px[0], px[1], px[2]) / 255.0;
        let curved = if v > 0.85 {
            1.0
        } else if v < 0.3 {
            0.0
        } else {
            1.0 / (1.0 + (-12.0 * (v - 0.5)).exp())
        };
        let gray = clamp_u8(curved * 255.0);
        px.copy_from_slice(&[gray, gray, gray, 255]);
    }

    let width = buffer.width() as usize;
    let height = buffer.height() as usize;
    if width < 3 || height < 3 {
        return;
    }

    // In place: a pixel whitened here counts as light for the ones after it.
    let data = buffer.as_raw_mut();
    for y in 1..height - 1 {
        for x in 1..width - 1 {
            let idx = y * width + x;
            if data[idx * 4] >= 128 {
                continue;
            }
            let light = [idx - 1, idx + 1, idx - width, idx + width]
                .iter()
                .filter(|&&n| data[n * 4] > 200)
                .count();
            if light >= 3 {
                data[idx * 4..idx * 4 + 3].fill(255);
            }
        }
    }
}
