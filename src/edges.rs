//! Line-art extraction from photographs and sketches.
//!
//! Two paths share one entry point, [`extract_line_art`]:
//!
//! - **Standard**: grayscale, a 4-neighbor finite-difference gradient taken
//!   toward the ink side, a hard threshold and a single isolated-pixel
//!   denoise. Trace-mode output has binary alpha.
//! - **Perfect sketch bypass**: the grayscale value itself becomes the alpha,
//!   keeping the antialiasing of sources that are already clean line art.
//!
//! The source is never mutated; the output is a new buffer, fitted to the
//! parameter's size cap.

use crate::eraser::erase_region;
use crate::error::{Error, Result};
use crate::params::{ProcessingParameters, SpecialAction};
use crate::raster::{clamp_u8, luminance, RasterBuffer};

/// Divisor applied to `edge_strength` to obtain the gradient gain.
const EDGE_GAIN_DIVISOR: f32 = 20.0;

/// Produce a line-art raster from `source` according to `params`.
///
/// The call is deterministic: identical inputs give byte-identical output.
/// When `params.special_action` requests an erase, it is applied to the
/// output (coordinates in output pixel space) before returning.
///
/// # Errors
///
/// Returns [`Error::EmptyImage`] if `source` has no pixels.
pub fn extract_line_art(
    source: &RasterBuffer,
    params: &ProcessingParameters,
) -> Result<RasterBuffer> {
    if source.is_empty() {
        return Err(Error::EmptyImage {
            width: source.width(),
            height: source.height(),
        });
    }

    let mut work = source.fitted(params.max_dimension);
    adjust_brightness_contrast(&mut work, params.brightness, params.contrast);

    if params.is_perfect_sketch {
        render_sketch_bypass(&mut work, params);
    } else {
        render_edges(&mut work, params);
    }

    if let Some(SpecialAction::EraseRegion {
        start_x,
        start_y,
        tolerance,
    }) = params.special_action
    {
        let erased = erase_region(&mut work, start_x, start_y, tolerance);
        log::debug!("erase at ({start_x}, {start_y}) tol={tolerance}: {erased} pixels cleared");
    }

    Ok(work)
}

/// Apply brightness then contrast, both in percent, to the RGB channels.
///
/// Matches the CSS filter functions: brightness scales each channel by
/// `brightness / 100`; contrast scales the distance from mid-gray by
/// `contrast / 100`. Alpha is untouched.
#[allow(clippy::float_cmp)]
pub fn adjust_brightness_contrast(buffer: &mut RasterBuffer, brightness: f32, contrast: f32) {
    if brightness == 100.0 && contrast == 100.0 {
        return;
    }
    let b = brightness / 100.0;
    let c = contrast / 100.0;
    for px in buffer.pixels_mut() {
        for ch in &mut px[..3] {
            let bright = (f32::from(*ch) * b).clamp(0.0, 255.0);
            *ch = clamp_u8((bright - 127.5) * c + 127.5);
        }
    }
}

/// Per-pixel BT.601 luminance, rounded to 8 bits.
#[must_use]
pub fn grayscale_plane(buffer: &RasterBuffer) -> Vec<u8> {
    buffer
        .pixels()
        .map(|px| clamp_u8(luminance(px[0], px[1], px[2])))
        .collect()
}

/// Gradient magnitude attributed to the ink side of each edge.
///
/// For each axis the difference is taken between the pixel and the more
/// paper-like of its two neighbors, counted only when the pixel is the
/// inkier one. Borders replicate the edge pixel. The result is scaled by
/// `edge_strength / 20` and clamped to 255.
fn ink_gradient(gray: &[u8], width: usize, height: usize, edge_strength: u8, invert: bool) -> Vec<u8> {
    let gain = f32::from(edge_strength) / EDGE_GAIN_DIVISOR;
    let mut magnitudes = vec![0u8; gray.len()];

    for y in 0..height {
        let up = y.saturating_sub(1);
        let down = (y + 1).min(height - 1);
        for x in 0..width {
            let left = x.saturating_sub(1);
            let right = (x + 1).min(width - 1);

            let center = i32::from(gray[y * width + x]);
            let (l, r) = (gray[y * width + left], gray[y * width + right]);
            let (u, d) = (gray[up * width + x], gray[down * width + x]);

            let (gx, gy) = if invert {
                (
                    (center - i32::from(l.min(r))).max(0),
                    (center - i32::from(u.min(d))).max(0),
                )
            } else {
                (
                    (i32::from(l.max(r)) - center).max(0),
                    (i32::from(u.max(d)) - center).max(0),
                )
            };

            #[allow(clippy::cast_precision_loss)]
            let mag = ((gx * gx + gy * gy) as f32).sqrt() * gain;
            magnitudes[y * width + x] = clamp_u8(mag.min(255.0));
        }
    }

    magnitudes
}

/// Threshold magnitudes and drop line pixels with no line among their
/// 8 neighbors.
fn classify_lines(magnitudes: &[u8], threshold: u8, width: usize, height: usize) -> Vec<bool> {
    let raw: Vec<bool> = magnitudes.iter().map(|&m| m > threshold).collect();
    let mut lines = raw.clone();

    for y in 0..height {
        for x in 0..width {
            let idx = y * width + x;
            if !raw[idx] {
                continue;
            }
            let has_neighbor = (y.saturating_sub(1)..=(y + 1).min(height - 1)).any(|ny| {
                (x.saturating_sub(1)..=(x + 1).min(width - 1))
                    .any(|nx| (nx, ny) != (x, y) && raw[ny * width + nx])
            });
            if !has_neighbor {
                lines[idx] = false;
            }
        }
    }

    lines
}

fn render_edges(work: &mut RasterBuffer, params: &ProcessingParameters) {
    let width = work.width() as usize;
    let height = work.height() as usize;

    let gray = grayscale_plane(work);
    let magnitudes = ink_gradient(&gray, width, height, params.edge_strength, params.invert);
    let lines = classify_lines(&magnitudes, params.threshold, width, height);

    let ink = params.ink();
    if params.is_trace_mode() {
        for (px, &is_line) in work.pixels_mut().zip(&lines) {
            px.copy_from_slice(&[ink, ink, ink, if is_line { 255 } else { 0 }]);
        }
    } else {
        let blend = params.blend;
        for (px, &is_line) in work.pixels_mut().zip(&lines) {
            let line_val = f32::from(if is_line { ink } else { 255 - ink });
            for ch in &mut px[..3] {
                *ch = clamp_u8(f32::from(*ch) * blend + line_val * (1.0 - blend));
            }
            px[3] = 255;
        }
    }
}

fn render_sketch_bypass(work: &mut RasterBuffer, params: &ProcessingParameters) {
    let ink = params.ink();
    let trace = params.is_trace_mode();
    for px in work.pixels_mut() {
        let gray = clamp_u8(luminance(px[0], px[1], px[2]));
        if trace {
            let alpha = if params.invert { gray } else { 255 - gray };
            px.copy_from_slice(&[ink, ink, ink, alpha]);
        } else {
            px.copy_from_slice(&[gray, gray, gray, 255]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn white_with_diagonal(size: u32) -> RasterBuffer {
        let mut img = RasterBuffer::filled(size, size, [255, 255, 255, 255]);
        for i in 0..size {
            img.set_pixel(i, i, [0, 0, 0, 255]);
        }
        img
    }

    fn trace_params(threshold: u8, edge_strength: u8) -> ProcessingParameters {
        ProcessingParameters {
            threshold,
            edge_strength,
            ..ProcessingParameters::default()
        }
    }

    #[test]
    fn empty_source_is_an_error() {
        let err = extract_line_art(&RasterBuffer::new(0, 5), &ProcessingParameters::default());
        assert!(matches!(err, Err(Error::EmptyImage { width: 0, height: 5 })));
    }

    #[test]
    fn diagonal_line_traces_exactly() {
        let img = white_with_diagonal(100);
        let out = extract_line_art(&img, &trace_params(30, 40)).unwrap();
        assert_eq!((out.width(), out.height()), (100, 100));

        for y in 0..100 {
            for x in 0..100 {
                let px = out.pixel(x, y).unwrap();
                if x == y {
                    assert_eq!(px, [0, 0, 0, 255], "line pixel ({x},{y})");
                } else {
                    assert_eq!(px[3], 0, "background pixel ({x},{y})");
                }
            }
        }
    }

    #[test]
    fn uniform_image_has_no_lines() {
        let img = RasterBuffer::filled(20, 20, [90, 140, 30, 255]);
        let out = extract_line_art(&img, &trace_params(10, 140)).unwrap();
        assert!(out.pixels().all(|px| px[3] == 0));
    }

    #[test]
    fn isolated_dot_is_removed() {
        let mut img = RasterBuffer::filled(9, 9, [255, 255, 255, 255]);
        img.set_pixel(4, 4, [0, 0, 0, 255]);
        let out = extract_line_art(&img, &trace_params(30, 40)).unwrap();
        assert!(out.pixels().all(|px| px[3] == 0), "salt pixel should be denoised");
    }

    #[test]
    fn step_edge_marks_dark_side_only() {
        let mut img = RasterBuffer::filled(10, 6, [255, 255, 255, 255]);
        for y in 0..6 {
            for x in 0..5 {
                img.set_pixel(x, y, [0, 0, 0, 255]);
            }
        }
        let out = extract_line_art(&img, &trace_params(30, 40)).unwrap();
        for y in 0..6 {
            for x in 0..10 {
                let expected = if x == 4 { 255 } else { 0 };
                assert_eq!(out.alpha(x, y), Some(expected), "pixel ({x},{y})");
            }
        }
    }

    #[test]
    fn invert_traces_light_lines_in_white() {
        let mut img = RasterBuffer::filled(30, 30, [0, 0, 0, 255]);
        for i in 0..30 {
            img.set_pixel(15, i, [255, 255, 255, 255]);
        }
        let params = ProcessingParameters {
            invert: true,
            ..trace_params(30, 40)
        };
        let out = extract_line_art(&img, &params).unwrap();
        for y in 0..30 {
            assert_eq!(out.pixel(15, y), Some([255, 255, 255, 255]));
            assert_eq!(out.alpha(14, y), Some(0));
            assert_eq!(out.alpha(16, y), Some(0));
        }
    }

    #[test]
    fn preview_mode_is_opaque_and_blends() {
        let img = white_with_diagonal(16);
        let params = ProcessingParameters {
            blend: 0.5,
            ..trace_params(30, 40)
        };
        let out = extract_line_art(&img, &params).unwrap();
        assert!(out.pixels().all(|px| px[3] == 255));
        // line: 0 * 0.5 + 0 * 0.5; paper: 255 * 0.5 + 255 * 0.5
        assert_eq!(out.pixel(3, 3), Some([0, 0, 0, 255]));
        assert_eq!(out.pixel(3, 9), Some([255, 255, 255, 255]));
    }

    #[test]
    fn full_blend_returns_original_colors() {
        let mut img = RasterBuffer::filled(8, 8, [200, 100, 50, 255]);
        img.set_pixel(2, 2, [10, 20, 30, 255]);
        let params = ProcessingParameters {
            blend: 1.0,
            ..trace_params(30, 40)
        };
        let out = extract_line_art(&img, &params).unwrap();
        assert_eq!(out.pixel(2, 2), Some([10, 20, 30, 255]));
        assert_eq!(out.pixel(6, 6), Some([200, 100, 50, 255]));
    }

    #[test]
    fn sketch_bypass_keeps_antialiasing() {
        let mut img = RasterBuffer::filled(4, 1, [255, 255, 255, 255]);
        img.set_pixel(1, 0, [128, 128, 128, 255]);
        img.set_pixel(2, 0, [0, 0, 0, 255]);
        let params = ProcessingParameters {
            is_perfect_sketch: true,
            ..ProcessingParameters::default()
        };
        let out = extract_line_art(&img, &params).unwrap();
        assert_eq!(out.pixel(0, 0), Some([0, 0, 0, 0]));
        assert_eq!(out.pixel(1, 0), Some([0, 0, 0, 127]));
        assert_eq!(out.pixel(2, 0), Some([0, 0, 0, 255]));
    }

    #[test]
    fn sketch_bypass_preview_is_grayscale() {
        let img = RasterBuffer::filled(2, 2, [255, 0, 0, 255]);
        let params = ProcessingParameters {
            is_perfect_sketch: true,
            blend: 0.4,
            ..ProcessingParameters::default()
        };
        let out = extract_line_art(&img, &params).unwrap();
        assert!(out.pixels().all(|px| px == [76, 76, 76, 255]));
    }

    #[test]
    fn output_is_fitted_to_cap() {
        let img = RasterBuffer::filled(400, 200, [255, 255, 255, 255]);
        let params = ProcessingParameters {
            max_dimension: 100,
            ..ProcessingParameters::default()
        };
        let out = extract_line_art(&img, &params).unwrap();
        assert_eq!((out.width(), out.height()), (100, 50));
    }

    #[test]
    fn brightness_and_contrast_follow_css_filters() {
        let mut buf = RasterBuffer::filled(1, 1, [100, 200, 50, 77]);
        adjust_brightness_contrast(&mut buf, 100.0, 100.0);
        assert_eq!(buf.pixel(0, 0), Some([100, 200, 50, 77]));

        adjust_brightness_contrast(&mut buf, 150.0, 100.0);
        assert_eq!(buf.pixel(0, 0), Some([150, 255, 75, 77]));

        let mut buf = RasterBuffer::filled(1, 1, [100, 200, 128, 255]);
        adjust_brightness_contrast(&mut buf, 100.0, 0.0);
        assert_eq!(buf.pixel(0, 0), Some([128, 128, 128, 255]));
    }

    #[test]
    fn embedded_erase_clears_a_stroke() {
        let mut img = RasterBuffer::filled(20, 20, [255, 255, 255, 255]);
        for i in 0..20 {
            img.set_pixel(5, i, [0, 0, 0, 255]);
            img.set_pixel(14, i, [0, 0, 0, 255]);
        }
        let params = trace_params(30, 40).with_action(SpecialAction::erase_at(5, 10));
        let out = extract_line_art(&img, &params).unwrap();
        for y in 0..20 {
            assert_eq!(out.alpha(5, y), Some(0), "erased stroke at row {y}");
            assert_eq!(out.alpha(14, y), Some(255), "other stroke at row {y}");
        }
    }

    #[test]
    fn extraction_is_deterministic() {
        let mut img = white_with_diagonal(50);
        img.set_pixel(10, 30, [40, 80, 120, 255]);
        let params = trace_params(20, 60);
        let a = extract_line_art(&img, &params).unwrap();
        let b = extract_line_art(&img, &params).unwrap();
        assert_eq!(a, b);
    }
}
