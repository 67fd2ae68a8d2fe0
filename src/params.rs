//! Processing parameters consumed by the edge extractor.

/// Default edge threshold (0-255 gradient cut).
pub const DEFAULT_THRESHOLD: u8 = 45;
/// Default gradient gain (magnitude is scaled by `edge_strength / 20`).
pub const DEFAULT_EDGE_STRENGTH: u8 = 40;
/// Default long-edge cap for the working buffer.
pub const DEFAULT_MAX_DIMENSION: u32 = 1280;
/// Tolerance used for interactive region erasing, high enough to swallow
/// textured backgrounds in a single tap.
pub const DEFAULT_ERASE_TOLERANCE: u32 = 60;

/// A one-shot action run on the extractor output before it is returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", rename_all = "kebab-case"))]
pub enum SpecialAction {
    /// Flood-erase the region connected to `(start_x, start_y)`.
    EraseRegion {
        /// Seed column in output pixel space.
        start_x: u32,
        /// Seed row in output pixel space.
        start_y: u32,
        /// Maximum `|dR| + |dG| + |dB|` from the seed color.
        tolerance: u32,
    },
}

impl SpecialAction {
    /// An erase action at `(x, y)` with the interactive default tolerance.
    #[must_use]
    pub fn erase_at(x: u32, y: u32) -> Self {
        Self::EraseRegion {
            start_x: x,
            start_y: y,
            tolerance: DEFAULT_ERASE_TOLERANCE,
        }
    }
}

/// Hardware class of the host, selecting resize cap and recompute debounce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum DeviceTier {
    /// Low-memory or low-core devices.
    Low,
    /// Typical phones and laptops.
    #[default]
    Mid,
    /// Desktops with plenty of memory and cores.
    High,
}

impl DeviceTier {
    /// Long-edge cap for the working buffer on this tier.
    #[must_use]
    pub fn max_dimension(self) -> u32 {
        match self {
            Self::Low => 720,
            Self::Mid => DEFAULT_MAX_DIMENSION,
            Self::High => 1920,
        }
    }

    /// Delay before a queued recompute starts, letting rapid slider
    /// changes coalesce.
    #[must_use]
    pub fn debounce(self) -> std::time::Duration {
        let ms = match self {
            Self::Low => 200,
            Self::Mid => 50,
            Self::High => 0,
        };
        std::time::Duration::from_millis(ms)
    }
}

/// Parameters for [`extract_line_art`](crate::edges::extract_line_art).
///
/// Values are not validated; out-of-range inputs produce odd but
/// well-defined output. Callers clamp before calling.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default, rename_all = "camelCase"))]
pub struct ProcessingParameters {
    /// Gradient magnitude above which a pixel is a line.
    pub threshold: u8,
    /// Gradient gain; magnitudes are multiplied by `edge_strength / 20`.
    pub edge_strength: u8,
    /// Treat the light extreme as ink and draw in white.
    pub invert: bool,
    /// `0.0` is trace mode (transparent background), anything above is a
    /// preview cross-fade with the original.
    pub blend: f32,
    /// Brightness pre-filter in percent (100 = unchanged).
    pub brightness: f32,
    /// Contrast pre-filter in percent (100 = unchanged).
    pub contrast: f32,
    /// Source is already clean line art; skip gradient detection.
    pub is_perfect_sketch: bool,
    /// Action applied to the output before it is returned.
    pub special_action: Option<SpecialAction>,
    /// Long-edge cap for the working buffer; `0` disables resizing.
    pub max_dimension: u32,
}

impl Default for ProcessingParameters {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            edge_strength: DEFAULT_EDGE_STRENGTH,
            invert: false,
            blend: 0.0,
            brightness: 100.0,
            contrast: 100.0,
            is_perfect_sketch: false,
            special_action: None,
            max_dimension: DEFAULT_MAX_DIMENSION,
        }
    }
}

impl ProcessingParameters {
    /// Defaults with the resize cap of the given device tier.
    #[must_use]
    pub fn for_tier(tier: DeviceTier) -> Self {
        Self {
            max_dimension: tier.max_dimension(),
            ..Self::default()
        }
    }

    /// `true` when output pixels outside lines should be fully transparent.
    #[must_use]
    #[allow(clippy::float_cmp)]
    pub fn is_trace_mode(&self) -> bool {
        self.blend == 0.0
    }

    /// RGB of the ink: black, or white when inverted.
    #[must_use]
    pub fn ink(&self) -> u8 {
        if self.invert {
            255
        } else {
            0
        }
    }

    /// Return a copy carrying `action`.
    #[must_use]
    pub fn with_action(mut self, action: SpecialAction) -> Self {
        self.special_action = Some(action);
        self
    }
}
