use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, ValueEnum};
use serde::Serialize;

use lineart_trace::{
    analyze, default_output_path, process_directory, process_file, sample_palette, DeviceTier,
    PresetSuggestion, ProcessOptions, ProcessResult, ProcessingParameters, RasterBuffer,
    SpecialAction, TraceMode,
};

#[derive(Clone, Copy, ValueEnum)]
enum Mode {
    /// Edge detection for photographs and rough sketches
    Edges,
    /// Source is already clean line art: strip the paper only
    Sketch,
    /// Source is line-art model output: strip its gray background
    Distill,
}

impl From<Mode> for TraceMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Edges => TraceMode::Edges,
            Mode::Sketch => TraceMode::Sketch,
            Mode::Distill => TraceMode::Distill,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum Tier {
    Low,
    Mid,
    High,
}

impl From<Tier> for DeviceTier {
    fn from(tier: Tier) -> Self {
        match tier {
            Tier::Low => DeviceTier::Low,
            Tier::Mid => DeviceTier::Mid,
            Tier::High => DeviceTier::High,
        }
    }
}

#[derive(Parser)]
#[command(
    name = "lineart-trace",
    about = "Turn photos and sketches into transparent line-art overlays for tracing",
    version,
    after_help = "Simple usage: lineart-trace <image>  (auto-tuned edges, writes <name>_lineart.png)"
)]
#[allow(clippy::struct_excessive_bools)]
struct Cli {
    /// Input image file or directory
    input: String,

    /// Output file or directory (default: {name}_lineart.png)
    #[arg(short, long)]
    output: Option<String>,

    /// Processing pipeline
    #[arg(short, long, value_enum, default_value = "edges")]
    mode: Mode,

    /// Edge threshold (0-255); disables auto preset
    #[arg(short, long)]
    threshold: Option<u8>,

    /// Gradient gain (magnitude x strength/20); disables auto preset
    #[arg(short, long)]
    edge_strength: Option<u8>,

    /// Draw white ink and treat light features as lines
    #[arg(long)]
    invert: bool,

    /// Preview cross-fade with the original (0 = transparent trace output)
    #[arg(short, long, default_value = "0")]
    blend: f32,

    /// Brightness pre-filter in percent
    #[arg(long, default_value = "100")]
    brightness: f32,

    /// Contrast pre-filter in percent
    #[arg(long, default_value = "100")]
    contrast: f32,

    /// Treat the source as a perfect sketch (grayscale becomes alpha)
    #[arg(long)]
    perfect_sketch: bool,

    /// Do not seed parameters from image analysis
    #[arg(long)]
    no_auto: bool,

    /// Clean up raw model output before distilling (distill mode)
    #[arg(long)]
    condition: bool,

    /// Erase the region connected to this output pixel
    #[arg(long, num_args = 2, value_names = ["X", "Y"])]
    erase: Option<Vec<u32>>,

    /// Color tolerance for --erase (sum of channel differences)
    #[arg(long, default_value = "60")]
    tolerance: u32,

    /// Device tier selecting the working size cap
    #[arg(long, value_enum, default_value = "mid")]
    tier: Tier,

    /// Explicit long-edge cap in pixels (overrides --tier, 0 = none)
    #[arg(long)]
    max_dim: Option<u32>,

    /// Print the preset analysis and palette as JSON instead of tracing
    #[arg(long)]
    analyze: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Suppress all non-error output
    #[arg(short, long)]
    quiet: bool,
}

#[derive(Serialize)]
struct AnalysisReport {
    preset: PresetSuggestion,
    palette: Vec<String>,
}

fn main() {
    let cli = Cli::parse();

    let level = if cli.quiet {
        "error"
    } else if cli.verbose {
        "debug"
    } else {
        "info"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();

    if !(0.0..=1.0).contains(&cli.blend) {
        eprintln!("Error: Blend must be between 0.0 and 1.0");
        process::exit(1);
    }

    let input_path = Path::new(&cli.input);
    if !input_path.exists() {
        eprintln!("Error: Input path does not exist: {}", cli.input);
        process::exit(1);
    }

    if cli.analyze {
        run_analysis(input_path);
        return;
    }

    let opts = build_options(&cli);

    if !opts.quiet {
        match opts.mode {
            TraceMode::Edges if opts.auto_preset => eprintln!("Auto preset enabled"),
            TraceMode::Edges => eprintln!(
                "Threshold {} / edge strength {}",
                opts.params.threshold, opts.params.edge_strength
            ),
            TraceMode::Sketch => eprintln!("Sketch mode - stripping paper background"),
            TraceMode::Distill => eprintln!("Distill mode - stripping model background"),
        }
        eprintln!();
    }

    let results = if input_path.is_dir() {
        let output_dir = if let Some(o) = &cli.output {
            PathBuf::from(o)
        } else {
            eprintln!("Error: Output directory is required for batch processing");
            eprintln!("Usage: lineart-trace <input_dir> -o <output_dir>");
            process::exit(1);
        };
        process_directory(input_path, &output_dir, &opts)
    } else {
        let output_path = match &cli.output {
            Some(o) => PathBuf::from(o),
            None => default_output_path(input_path),
        };
        vec![process_file(input_path, &output_path, &opts)]
    };

    let mut success_count = 0u32;
    let mut skip_count = 0u32;
    let mut fail_count = 0u32;

    for r in &results {
        print_result(r, &opts);
        if r.skipped {
            skip_count += 1;
        } else if r.success {
            success_count += 1;
        } else {
            fail_count += 1;
        }
    }

    if results.len() > 1 && !opts.quiet {
        eprintln!();
        eprint!("[Summary] Traced: {success_count}");
        if skip_count > 0 {
            eprint!(", Skipped: {skip_count}");
        }
        if fail_count > 0 {
            eprint!(", Failed: {fail_count}");
        }
        eprintln!(" (Total: {})", results.len());
    }

    if fail_count > 0 {
        process::exit(1);
    }
}

fn build_options(cli: &Cli) -> ProcessOptions {
    let tier = DeviceTier::from(cli.tier);
    let mut params = ProcessingParameters::for_tier(tier);
    if let Some(max_dim) = cli.max_dim {
        params.max_dimension = max_dim;
    }
    if let Some(t) = cli.threshold {
        params.threshold = t;
    }
    if let Some(e) = cli.edge_strength {
        params.edge_strength = e;
    }
    params.invert = cli.invert;
    params.blend = cli.blend;
    params.brightness = cli.brightness;
    params.contrast = cli.contrast;
    params.is_perfect_sketch = cli.perfect_sketch;
    if let Some([x, y]) = cli.erase.as_deref() {
        params.special_action = Some(SpecialAction::EraseRegion {
            start_x: *x,
            start_y: *y,
            tolerance: cli.tolerance,
        });
    }

    let explicit = cli.threshold.is_some()
        || cli.edge_strength.is_some()
        || cli.invert
        || cli.perfect_sketch;

    ProcessOptions {
        mode: cli.mode.into(),
        params,
        auto_preset: !cli.no_auto && !explicit,
        condition: cli.condition,
        verbose: cli.verbose,
        quiet: cli.quiet,
    }
}

fn run_analysis(input: &Path) {
    if input.is_dir() {
        eprintln!("Error: --analyze expects a single image file");
        process::exit(1);
    }
    let img = match image::open(input) {
        Ok(img) => img,
        Err(e) => {
            eprintln!("Error: Failed to load {}: {e}", input.display());
            process::exit(1);
        }
    };
    let source = RasterBuffer::from_image(&img);
    let report = AnalysisReport {
        preset: analyze(&source),
        palette: sample_palette(&source),
    };
    match serde_json::to_string_pretty(&report) {
        Ok(json) => println!("{json}"),
        Err(e) => {
            eprintln!("Error: Failed to serialize analysis: {e}");
            process::exit(1);
        }
    }
}

fn print_result(result: &ProcessResult, opts: &ProcessOptions) {
    if opts.quiet && result.success {
        return;
    }

    let filename = result.path.file_name().map_or_else(
        || result.path.display().to_string(),
        |f| f.to_string_lossy().to_string(),
    );

    if result.skipped {
        if !opts.quiet {
            eprintln!("[SKIP] {filename}: {}", result.message);
        }
    } else if result.success {
        if !opts.quiet {
            match &result.suggestion {
                Some(s) if s.is_perfect_sketch => {
                    eprintln!("[OK] {filename} (clean sketch, grayscale kept)");
                }
                Some(s) => eprintln!(
                    "[OK] {filename} (threshold {}, edge strength {})",
                    s.threshold, s.edge_strength
                ),
                None => eprintln!("[OK] {filename}"),
            }
        }
    } else {
        eprintln!("[FAIL] {filename}: {}", result.message);
    }

    if opts.verbose && !result.message.is_empty() {
        eprintln!("  -> {}", result.message);
    }
}
