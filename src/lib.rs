//! Turn photos and scanned sketches into transparent line-art overlays.
//!
//! The crate is the pixel-processing core of an AR tracing aid: a reference
//! image becomes black (or white) strokes on a transparent background that
//! can be composited over a live camera feed and traced by hand.
//!
//! Every stage works on a [`RasterBuffer`] (8-bit RGBA):
//!
//! - [`preset::analyze`] proposes starting parameters for a new image.
//! - [`edges::extract_line_art`] detects edges, or maps grayscale straight to
//!   alpha for sources that are already clean sketches.
//! - [`distill::distill_lines`] strips the paper from existing line art.
//! - [`eraser::erase_region`] flood-erases a tapped region.
//! - [`palette::sample_palette`] lists a few representative colors.
//!
//! # Quick Start
//!
//! ```no_run
//! use lineart_trace::{analyze, extract_line_art, ProcessingParameters, RasterBuffer};
//!
//! let img = image::open("photo.jpg").unwrap();
//! let source = RasterBuffer::from_image(&img);
//!
//! let mut params = ProcessingParameters::default();
//! analyze(&source).apply_to(&mut params);
//!
//! let line_art = extract_line_art(&source, &params).unwrap();
//! line_art.into_rgba_image().save("photo_lineart.png").unwrap();
//! ```
//!
//! # Interactive use
//!
//! [`LineArtWorker`] runs extraction on a dedicated thread behind a
//! last-write-wins slot, so rapid parameter changes never queue up stale work.

#![deny(missing_docs)]

pub mod distill;
pub mod edges;
mod engine;
pub mod eraser;
pub mod error;
pub mod palette;
pub mod params;
pub mod preset;
pub mod raster;
pub mod worker;

pub use distill::{condition_model_output, distill_lines, estimate_background};
pub use edges::extract_line_art;
pub use engine::{
    default_output_path, is_supported_image, process_directory, process_file, render,
    save_image, ProcessOptions, ProcessResult, Rendered, TraceMode,
};
pub use eraser::erase_region;
pub use error::{Error, Result};
pub use palette::sample_palette;
pub use params::{DeviceTier, ProcessingParameters, SpecialAction};
pub use preset::{analyze, PresetSuggestion};
pub use raster::RasterBuffer;
pub use worker::{LineArtWorker, RenderOutput};
