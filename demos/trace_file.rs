//! Trace a single image into a transparent line-art PNG.
//!
//! Usage:
//! ```sh
//! cargo run --example trace_file -- input.jpg output.png
//! ```

use std::env;
use std::process;

use lineart_trace::{process_file, ProcessOptions};

fn main() {
    let args: Vec<String> = env::args().collect();
    if args.len() < 3 {
        eprintln!("Usage: {} <input> <output.png>", args[0]);
        process::exit(1);
    }

    let input = &args[1];
    let output = &args[2];

    let opts = ProcessOptions::default();
    let result = process_file(input.as_ref(), output.as_ref(), &opts);

    if result.skipped {
        println!("Skipped: {}", result.message);
    } else if result.success {
        if let Some(s) = result.suggestion {
            println!(
                "Preset: threshold {}, edge strength {}, invert {}",
                s.threshold, s.edge_strength, s.invert
            );
        }
        println!("Done: {}", result.message);
    } else {
        eprintln!("Error: {}", result.message);
        process::exit(1);
    }
}
