//! The RGBA raster shared by every processing stage.
//!
//! [`RasterBuffer`] owns a flat `width * height * 4` byte array. All stages
//! either return a fresh buffer or mutate one in place; accessors are
//! bounds-checked and return `None` instead of panicking.

use image::imageops::{self, FilterType};
use image::{DynamicImage, RgbaImage};

use crate::error::{Error, Result};

/// Number of 8-bit channels per pixel (R, G, B, A).
pub const CHANNELS: usize = 4;

/// Luminance weight for the red channel (BT.601).
pub const LUMA_R: f32 = 0.299;
/// Luminance weight for the green channel (BT.601).
pub const LUMA_G: f32 = 0.587;
/// Luminance weight for the blue channel (BT.601).
pub const LUMA_B: f32 = 0.114;

/// Perceptual luminance of an RGB triple: `0.299*R + 0.587*G + 0.114*B`.
#[must_use]
pub fn luminance(r: u8, g: u8, b: u8) -> f32 {
    LUMA_R * f32::from(r) + LUMA_G * f32::from(g) + LUMA_B * f32::from(b)
}

/// Round and clamp a float into the 8-bit channel range.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn clamp_u8(value: f32) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}

/// Dimensions that fit inside a `max_dim` square while preserving aspect ratio.
///
/// Images already within the cap are returned unchanged. A `max_dim` of zero
/// disables the cap.
#[must_use]
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
pub fn fit_dimensions(width: u32, height: u32, max_dim: u32) -> (u32, u32) {
    if max_dim == 0 || (width <= max_dim && height <= max_dim) {
        return (width, height);
    }
    let ratio = (max_dim as f64 / width as f64).min(max_dim as f64 / height as f64);
    let w = (width as f64 * ratio).round().max(1.0) as u32;
    let h = (height as f64 * ratio).round().max(1.0) as u32;
    (w.min(max_dim), h.min(max_dim))
}

/// An owned 8-bit RGBA raster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterBuffer {
    image: RgbaImage,
}

impl RasterBuffer {
    /// Create a fully transparent black buffer.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            image: RgbaImage::new(width, height),
        }
    }

    /// Create a buffer where every pixel is `rgba`.
    #[must_use]
    pub fn filled(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        Self {
            image: RgbaImage::from_pixel(width, height, image::Rgba(rgba)),
        }
    }

    /// Wrap a raw RGBA byte vector.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BufferSize`] if `data.len() != width * height * 4`.
    pub fn from_raw(width: u32, height: u32, data: Vec<u8>) -> Result<Self> {
        let expected = width as usize * height as usize * CHANNELS;
        let actual = data.len();
        RgbaImage::from_raw(width, height, data)
            .filter(|_| actual == expected)
            .map(|image| Self { image })
            .ok_or(Error::BufferSize {
                width,
                height,
                expected,
                actual,
            })
    }

    /// Normalize any decoded image to 8-bit RGBA.
    #[must_use]
    pub fn from_image(image: &DynamicImage) -> Self {
        Self {
            image: image.to_rgba8(),
        }
    }

    /// Width in pixels.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Height in pixels.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// `true` when the buffer holds no pixels.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }

    /// Number of pixels (`width * height`).
    #[must_use]
    pub fn pixel_count(&self) -> usize {
        self.width() as usize * self.height() as usize
    }

    /// The raw RGBA bytes in row-major order.
    #[must_use]
    pub fn as_raw(&self) -> &[u8] {
        self.image.as_raw()
    }

    /// Mutable access to the raw RGBA bytes.
    pub fn as_raw_mut(&mut self) -> &mut [u8] {
        &mut self.image
    }

    /// Byte offset of pixel `(x, y)`, or `None` when out of bounds.
    #[must_use]
    pub fn offset(&self, x: u32, y: u32) -> Option<usize> {
        (x < self.width() && y < self.height())
            .then(|| (y as usize * self.width() as usize + x as usize) * CHANNELS)
    }

    /// Pixel at `(x, y)` as `[r, g, b, a]`.
    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        self.offset(x, y).map(|i| {
            let raw = self.as_raw();
            [raw[i], raw[i + 1], raw[i + 2], raw[i + 3]]
        })
    }

    /// Alpha channel of pixel `(x, y)`.
    #[must_use]
    pub fn alpha(&self, x: u32, y: u32) -> Option<u8> {
        self.offset(x, y).map(|i| self.as_raw()[i + 3])
    }

    /// Overwrite pixel `(x, y)`. Returns `false` if the coordinate is out of bounds.
    pub fn set_pixel(&mut self, x: u32, y: u32, rgba: [u8; 4]) -> bool {
        match self.offset(x, y) {
            Some(i) => {
                self.as_raw_mut()[i..i + CHANNELS].copy_from_slice(&rgba);
                true
            }
            None => false,
        }
    }

    /// Iterate over pixels as 4-byte slices.
    pub fn pixels(&self) -> impl Iterator<Item = &[u8]> {
        self.as_raw().chunks_exact(CHANNELS)
    }

    /// Iterate mutably over pixels as 4-byte slices.
    pub fn pixels_mut(&mut self) -> impl Iterator<Item = &mut [u8]> {
        self.as_raw_mut().chunks_exact_mut(CHANNELS)
    }

    /// The alpha channel as a separate plane, one byte per pixel.
    #[must_use]
    pub fn alpha_plane(&self) -> Vec<u8> {
        self.pixels().map(|px| px[3]).collect()
    }

    /// Resample to exactly `width x height` with a bilinear filter.
    #[must_use]
    pub fn resized(&self, width: u32, height: u32) -> Self {
        if width == self.width() && height == self.height() {
            return self.clone();
        }
        Self {
            image: imageops::resize(&self.image, width, height, FilterType::Triangle),
        }
    }

    /// Downscale so neither side exceeds `max_dim`, preserving aspect ratio.
    #[must_use]
    pub fn fitted(&self, max_dim: u32) -> Self {
        let (w, h) = fit_dimensions(self.width(), self.height(), max_dim);
        self.resized(w, h)
    }

    /// Convert into an `image` buffer for encoding.
    #[must_use]
    pub fn into_rgba_image(self) -> RgbaImage {
        self.image
    }
}

impl From<RgbaImage> for RasterBuffer {
    fn from(image: RgbaImage) -> Self {
        Self { image }
    }
}
