use voxel_filter::voxel::io::{load_slices, save_slice, write_json_file};
use voxel_filter::{
    binomial_blur, finite_difference, gradient_norm, BitDepth, BorderFill, NormalizationPolicy,
    OperatorFactory, VoxelAccess,
};

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

#[derive(Debug, Deserialize)]
struct FilterToolConfig {
    /// Grayscale slice images, bottom to top.
    slices: Vec<PathBuf>,
    #[serde(default)]
    filter: FilterConfig,
    output: FilterOutputConfig,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct FilterConfig {
    operation: Operation,
    order: usize,
    skip: usize,
    /// Border padding (voxels per side, each axis) before filtering.
    margin: usize,
    normalization: NormalizationPolicy,
}

#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
enum Operation {
    Blur,
    Difference,
    Gradient,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            operation: Operation::Blur,
            order: 3,
            skip: 1,
            margin: 0,
            normalization: NormalizationPolicy::Gray8QuantitativeClamp,
        }
    }
}

#[derive(Debug, Deserialize)]
struct FilterOutputConfig {
    mid_slice_image: PathBuf,
    report_json: PathBuf,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FilterReport {
    operation: Operation,
    order: usize,
    skip: usize,
    width: usize,
    height: usize,
    depth: usize,
    bits: u8,
    denominator: i64,
    elapsed_load_ms: f64,
    elapsed_filter_ms: f64,
}

fn load_config(path: &Path) -> Result<FilterToolConfig, String> {
    let data = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config {}: {e}", path.display()))?;
    serde_json::from_str(&data)
        .map_err(|e| format!("Failed to parse config {}: {e}", path.display()))
}

fn main() {
    env_logger::init();
    if let Err(err) = run() {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let config_path = env::args().nth(1).ok_or_else(usage)?;
    let config = load_config(Path::new(&config_path))?;

    let load_start = Instant::now();
    let stack = load_slices(&config.slices)?;
    let elapsed_load_ms = load_start.elapsed().as_secs_f64() * 1000.0;

    let filter = &config.filter;
    let mut factory = OperatorFactory::new(stack);
    if filter.margin > 0 {
        factory.enlarge_input(filter.margin, filter.margin, filter.margin, BorderFill::Replicate);
    }

    let filter_start = Instant::now();
    let (mask, denominator) = match filter.operation {
        Operation::Blur => {
            let m = binomial_blur(&mut factory, filter.order, filter.skip);
            let d = m.denominator();
            (m, d)
        }
        Operation::Difference => {
            factory.embed_input(true, BitDepth::Sixteen);
            factory.embed_output(true, BitDepth::Sixteen);
            let m = finite_difference(&mut factory, filter.order, filter.skip)
                .map_err(|e| format!("Failed to build difference mask: {e}"))?;
            let d = m.denominator();
            (m, d)
        }
        Operation::Gradient => {
            factory.embed_input(true, BitDepth::Sixteen);
            factory.embed_output(false, BitDepth::Sixteen);
            let m = gradient_norm(&mut factory, filter.skip, 2 * filter.skip as i64);
            (m, 1)
        }
    };
    let filtered = mask.into_convolved(filter.normalization);
    let elapsed_filter_ms = filter_start.elapsed().as_secs_f64() * 1000.0;

    let (width, height, depth) = filtered.extents();
    let mid = depth / 2;
    save_slice(&filtered, mid, &config.output.mid_slice_image)?;

    let report = FilterReport {
        operation: filter.operation,
        order: filter.order,
        skip: filter.skip,
        width,
        height,
        depth,
        bits: filtered.bit_depth().bits(),
        denominator,
        elapsed_load_ms,
        elapsed_filter_ms,
    };
    write_json_file(&config.output.report_json, &report)?;

    println!(
        "Saved mid-slice (z={mid}) to {}",
        config.output.mid_slice_image.display()
    );
    println!("Saved report to {}", config.output.report_json.display());

    Ok(())
}

fn usage() -> String {
    "Usage: filter_demo <config.json>".to_string()
}
