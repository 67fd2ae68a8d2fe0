//! Starting-parameter heuristics for a newly loaded image.
//!
//! The analyzer downsamples the source to a fixed square and derives a few
//! global statistics (mean luminance, busyness, colorfulness, share of
//! near-black/near-white pixels). Those decide whether the image is already a
//! clean sketch and how sensitive the edge threshold should be.
//!
//! Output is advisory. [`analyze`] never fails; a blank input yields
//! [`PresetSuggestion::default`].

use crate::params::{ProcessingParameters, DEFAULT_EDGE_STRENGTH, DEFAULT_THRESHOLD};
use crate::raster::{luminance, RasterBuffer};

/// Side of the square the source is downsampled to before measuring.
pub const SAMPLE_SIZE: u32 = 120;

/// Sketch rule: std-dev must stay below this.
const SKETCH_MAX_STDDEV: f32 = 45.0;
/// Sketch rule: mean luminance must exceed this.
const SKETCH_MIN_LUMINANCE: f32 = 170.0;
/// Sketch rule: mean channel spread must stay below this.
const SKETCH_MAX_COLOR_DIFF: f32 = 15.0;
/// Never a sketch above this std-dev.
const BUSY_VETO_STDDEV: f32 = 60.0;
/// Never a sketch below this mean luminance; also the invert cut.
const DARK_LUMINANCE: f32 = 100.0;
/// Photographs above this std-dev get a less sensitive threshold.
const BUSY_PHOTO_STDDEV: f32 = 75.0;
/// Below this mean luminance the threshold drops to find shadow detail.
const VERY_DARK_LUMINANCE: f32 = 80.0;
/// Above this mean luminance the threshold rises slightly.
const BRIGHT_LUMINANCE: f32 = 180.0;
/// Perfect-sketch rule: mean luminance must exceed this.
const PERFECT_MIN_LUMINANCE: f32 = 200.0;
/// Perfect-sketch rule: share of extreme pixels must exceed this.
const PERFECT_MIN_EXTREME_RATIO: f32 = 0.85;
/// Luminance above which a pixel counts as paper.
const EXTREME_LIGHT: f32 = 240.0;
/// Luminance below which a pixel counts as ink.
const EXTREME_DARK: f32 = 15.0;
/// Bounds for suggested threshold and edge strength.
const SUGGESTION_MIN: i32 = 10;
const SUGGESTION_MAX: i32 = 140;

/// Global statistics of the downsampled source.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SampleStats {
    /// Mean BT.601 luminance.
    pub avg_luminance: f32,
    /// Standard deviation of the per-pixel channel mean `(R+G+B)/3`.
    pub std_dev: f32,
    /// Mean of `|R-G| + |G-B| + |B-R|`; near zero for grayscale sources.
    pub avg_color_diff: f32,
    /// Share of pixels with luminance above 240 or below 15.
    pub extreme_ratio: f32,
}

/// Suggested starting parameters for a freshly loaded image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct PresetSuggestion {
    /// Suggested edge threshold, within `[10, 140]`.
    pub threshold: u8,
    /// Suggested gradient gain, within `[10, 140]`.
    pub edge_strength: u8,
    /// Dark source; draw light ink.
    pub invert: bool,
    /// Looks like line art on light paper.
    pub is_sketch: bool,
    /// Almost purely black-on-white; edge detection can be bypassed.
    pub is_perfect_sketch: bool,
}

impl Default for PresetSuggestion {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            edge_strength: DEFAULT_EDGE_STRENGTH,
            invert: false,
            is_sketch: false,
            is_perfect_sketch: false,
        }
    }
}

impl PresetSuggestion {
    /// Fold the suggestion into an existing parameter record.
    pub fn apply_to(&self, params: &mut ProcessingParameters) {
        params.threshold = self.threshold;
        params.edge_strength = self.edge_strength;
        params.invert = self.invert;
        params.is_perfect_sketch = self.is_perfect_sketch;
    }
}

/// Measure [`SampleStats`] over a raster. Returns `None` for an empty raster.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn sample_stats(sample: &RasterBuffer) -> Option<SampleStats> {
    if sample.is_empty() {
        return None;
    }

    let mut lum_total = 0.0_f64;
    let mut mean_sum = 0.0_f64;
    let mut mean_sq_sum = 0.0_f64;
    let mut color_diff_total = 0.0_f64;
    let mut extremes = 0_usize;

    for px in sample.pixels() {
        let (r, g, b) = (px[0], px[1], px[2]);
        let lum = luminance(r, g, b);
        lum_total += f64::from(lum);

        let mean = (f64::from(r) + f64::from(g) + f64::from(b)) / 3.0;
        mean_sum += mean;
        mean_sq_sum += mean * mean;

        color_diff_total += f64::from(r.abs_diff(g))
            + f64::from(g.abs_diff(b))
            + f64::from(b.abs_diff(r));

        if lum > EXTREME_LIGHT || lum < EXTREME_DARK {
            extremes += 1;
        }
    }

    let n = sample.pixel_count() as f64;
    let mean = mean_sum / n;
    let variance = (mean_sq_sum / n - mean * mean).max(0.0);

    #[allow(clippy::cast_possible_truncation)]
    Some(SampleStats {
        avg_luminance: (lum_total / n) as f32,
        std_dev: variance.sqrt() as f32,
        avg_color_diff: (color_diff_total / n) as f32,
        extreme_ratio: (extremes as f64 / n) as f32,
    })
}

/// Turn statistics into a suggestion.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn suggest(stats: &SampleStats) -> PresetSuggestion {
    let mut is_sketch = stats.std_dev < SKETCH_MAX_STDDEV
        && stats.avg_luminance > SKETCH_MIN_LUMINANCE
        && stats.avg_color_diff < SKETCH_MAX_COLOR_DIFF;
    if stats.std_dev > BUSY_VETO_STDDEV || stats.avg_luminance < DARK_LUMINANCE {
        is_sketch = false;
    }

    let (mut threshold, mut edge_strength) = if is_sketch {
        (30_i32, 25_i32)
    } else if stats.std_dev > BUSY_PHOTO_STDDEV {
        (65, 55)
    } else {
        (i32::from(DEFAULT_THRESHOLD), i32::from(DEFAULT_EDGE_STRENGTH))
    };

    if stats.avg_luminance < VERY_DARK_LUMINANCE {
        threshold -= 10;
    }
    if stats.avg_luminance > BRIGHT_LUMINANCE {
        threshold += 5;
    }

    threshold = threshold.clamp(SUGGESTION_MIN, SUGGESTION_MAX);
    edge_strength = edge_strength.clamp(SUGGESTION_MIN, SUGGESTION_MAX);

    let is_perfect_sketch = is_sketch
        && stats.extreme_ratio > PERFECT_MIN_EXTREME_RATIO
        && stats.avg_luminance > PERFECT_MIN_LUMINANCE;

    PresetSuggestion {
        threshold: threshold as u8,
        edge_strength: edge_strength as u8,
        invert: stats.avg_luminance < DARK_LUMINANCE,
        is_sketch,
        is_perfect_sketch,
    }
}

/// Propose starting parameters for `image`.
///
/// Statistics are computed on a [`SAMPLE_SIZE`] square downsample, not the
/// full-resolution image.
#[must_use]
pub fn analyze(image: &RasterBuffer) -> PresetSuggestion {
    if image.is_empty() {
        log::debug!("preset analysis on empty image, using defaults");
        return PresetSuggestion::default();
    }

    let sample = image.resized(SAMPLE_SIZE, SAMPLE_SIZE);
    let Some(stats) = sample_stats(&sample) else {
        return PresetSuggestion::default();
    };
    let suggestion = suggest(&stats);

    log::debug!(
        "preset analysis: lum={:.1} stddev={:.1} color_diff={:.1} extremes={:.2} -> {suggestion:?}",
        stats.avg_luminance,
        stats.std_dev,
        stats.avg_color_diff,
        stats.extreme_ratio,
    );

    suggestion
}
