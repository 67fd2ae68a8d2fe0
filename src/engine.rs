//! File-level driver: load, trace, save.

use std::path::{Path, PathBuf};

use image::ImageFormat;

use crate::distill::{condition_model_output, distill_lines};
use crate::edges::extract_line_art;
use crate::eraser::erase_region;
use crate::error::{Error, Result};
use crate::params::{ProcessingParameters, SpecialAction};
use crate::preset::{analyze, PresetSuggestion};
use crate::raster::RasterBuffer;

/// How a source image becomes line art.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TraceMode {
    /// Photograph or rough sketch: run edge extraction.
    #[default]
    Edges,
    /// Source declared to be clean line art: strip the paper, keep the strokes.
    Sketch,
    /// Output of a line-art model: optionally condition, then strip the paper.
    Distill,
}

/// Options controlling file processing.
#[derive(Debug, Clone)]
pub struct ProcessOptions {
    /// Which pipeline to run.
    pub mode: TraceMode,
    /// Parameters for edge extraction; `max_dimension` and `special_action`
    /// apply to every mode.
    pub params: ProcessingParameters,
    /// Seed `params` from [`analyze`] before extracting (edges mode only).
    pub auto_preset: bool,
    /// Run [`condition_model_output`] before distilling (distill mode only).
    pub condition: bool,
    /// Enable verbose logging.
    pub verbose: bool,
    /// Suppress non-error output.
    pub quiet: bool,
}

impl Default for ProcessOptions {
    fn default() -> Self {
        Self {
            mode: TraceMode::Edges,
            params: ProcessingParameters::default(),
            auto_preset: true,
            condition: false,
            verbose: false,
            quiet: false,
        }
    }
}

/// A traced raster plus the preset that seeded it, if any.
#[derive(Debug, Clone)]
pub struct Rendered {
    /// The line-art output.
    pub raster: RasterBuffer,
    /// Suggestion applied before extraction (edges mode with auto preset).
    pub suggestion: Option<PresetSuggestion>,
}

/// Result of processing a single image file.
#[derive(Debug)]
pub struct ProcessResult {
    /// Path of the processed file.
    pub path: PathBuf,
    /// Whether processing succeeded.
    pub success: bool,
    /// Whether the file was skipped (nothing to trace).
    pub skipped: bool,
    /// Suggestion that seeded the parameters, when auto preset ran.
    pub suggestion: Option<PresetSuggestion>,
    /// Human-readable status message.
    pub message: String,
}

impl ProcessResult {
    fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            success: false,
            skipped: false,
            suggestion: None,
            message: String::new(),
        }
    }
}

/// Run the pipeline selected by `opts.mode` on an in-memory raster.
///
/// # Errors
///
/// Returns [`Error::EmptyImage`] if `source` has no pixels.
pub fn render(source: &RasterBuffer, opts: &ProcessOptions) -> Result<Rendered> {
    if source.is_empty() {
        return Err(Error::EmptyImage {
            width: source.width(),
            height: source.height(),
        });
    }

    match opts.mode {
        TraceMode::Edges => {
            let mut params = opts.params.clone();
            let suggestion = opts.auto_preset.then(|| analyze(source));
            if let Some(s) = &suggestion {
                s.apply_to(&mut params);
            }
            let raster = extract_line_art(source, &params)?;
            Ok(Rendered { raster, suggestion })
        }
        TraceMode::Sketch | TraceMode::Distill => {
            let mut raster = source.fitted(opts.params.max_dimension);
            if opts.mode == TraceMode::Distill && opts.condition {
                condition_model_output(&mut raster);
            }
            distill_lines(&mut raster);
            if let Some(SpecialAction::EraseRegion {
                start_x,
                start_y,
                tolerance,
            }) = opts.params.special_action
            {
                erase_region(&mut raster, start_x, start_y, tolerance);
            }
            Ok(Rendered {
                raster,
                suggestion: None,
            })
        }
    }
}

/// Process a single image file: load, trace, save.
///
/// Returns a [`ProcessResult`] indicating success, skip, or failure.
#[must_use]
pub fn process_file(input: &Path, output: &Path, opts: &ProcessOptions) -> ProcessResult {
    let mut result = ProcessResult::new(input);

    let dyn_img = match image::open(input) {
        Ok(img) => img,
        Err(e) => {
            result.message = format!("Failed to load: {e}");
            return result;
        }
    };

    let source = RasterBuffer::from(dyn_img.into_rgba8());
    if source.is_empty() {
        result.skipped = true;
        result.success = true;
        result.message = format!(
            "Image has no pixels ({}x{})",
            source.width(),
            source.height()
        );
        return result;
    }

    log::info!(
        "tracing {} ({}x{}, {:?})",
        input.display(),
        source.width(),
        source.height(),
        opts.mode
    );

    let rendered = match render(&source, opts) {
        Ok(r) => r,
        Err(e) => {
            result.message = format!("Failed to trace: {e}");
            return result;
        }
    };
    result.suggestion = rendered.suggestion;

    if let Some(parent) = output.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                result.message = format!("Failed to create output directory: {e}");
                return result;
            }
        }
    }

    let (w, h) = (rendered.raster.width(), rendered.raster.height());
    match save_image(rendered.raster, output) {
        Ok(()) => {
            result.success = true;
            result.message = format!("Line art written ({w}x{h})");
        }
        Err(e) => {
            result.message = format!("Failed to save: {e}");
        }
    }

    result
}

/// Process all supported images in a directory.
///
/// Uses parallel iteration when the `cli` feature is enabled (via rayon).
/// Each output is `<output_dir>/<stem>_lineart.png`.
#[must_use]
pub fn process_directory(
    input_dir: &Path,
    output_dir: &Path,
    opts: &ProcessOptions,
) -> Vec<ProcessResult> {
    let entries: Vec<PathBuf> = match std::fs::read_dir(input_dir) {
        Ok(rd) => rd
            .filter_map(std::result::Result::ok)
            .filter(|e| e.file_type().map(|ft| ft.is_file()).unwrap_or(false))
            .map(|e| e.path())
            .filter(|p| is_supported_image(p))
            .collect(),
        Err(e) => {
            let mut failed = ProcessResult::new(input_dir);
            failed.message = format!("Failed to read directory: {e}");
            return vec![failed];
        }
    };

    if !output_dir.exists() {
        if let Err(e) = std::fs::create_dir_all(output_dir) {
            let mut failed = ProcessResult::new(output_dir);
            failed.message = format!("Failed to create output directory: {e}");
            return vec![failed];
        }
    }

    let process = |input: &PathBuf| {
        let output = output_dir.join(output_file_name(input));
        process_file(input, &output, opts)
    };

    #[cfg(feature = "cli")]
    {
        use rayon::prelude::*;
        entries.par_iter().map(process).collect()
    }

    #[cfg(not(feature = "cli"))]
    {
        entries.iter().map(process).collect()
    }
}

/// Check if a file has a supported image extension.
#[must_use]
pub fn is_supported_image(path: &Path) -> bool {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => matches!(
            ext.to_lowercase().as_str(),
            "jpg" | "jpeg" | "png" | "webp" | "bmp"
        ),
        None => false,
    }
}

/// Save a raster in a format that keeps the alpha channel.
///
/// # Errors
///
/// Returns [`Error::UnsupportedFormat`] for formats without alpha (such as
/// JPEG) or unknown extensions, and an I/O or encoding error if writing fails.
pub fn save_image(raster: RasterBuffer, path: &Path) -> Result<()> {
    let format =
        ImageFormat::from_path(path).map_err(|e| Error::UnsupportedFormat(e.to_string()))?;

    match format {
        ImageFormat::Png | ImageFormat::WebP => {
            raster.into_rgba_image().save_with_format(path, format)?;
            Ok(())
        }
        _ => Err(Error::UnsupportedFormat(format!(
            "{format:?} cannot store transparency"
        ))),
    }
}

fn output_file_name(input: &Path) -> String {
    let stem = input.file_stem().unwrap_or_default().to_string_lossy();
    format!("{stem}_lineart.png")
}

/// Generate a default output path from an input path.
///
/// Example: `"photo.jpg"` becomes `"photo_lineart.png"`.
#[must_use]
pub fn default_output_path(input: &Path) -> PathBuf {
    let parent = input.parent().unwrap_or(Path::new("."));
    parent.join(output_file_name(input))
}
