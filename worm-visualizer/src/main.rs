use anyhow::{Context, Result};
use clap::Parser;
use env_logger::Builder;
use image::{Rgba, RgbaImage};
use indicatif::{ProgressBar, ProgressStyle};
use log::{error, info, warn, LevelFilter};
use rayon::prelude::*;
use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::Instant;
use worm_common::{replay, Snapshot};

mod raster;

use raster::RasterCanvas;

/// Command-line arguments for the visualizer
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Input snapshot file path (.bin, .json or .msgpack)
    #[arg(short, long)]
    input: PathBuf,

    /// Directory the numbered PNG frames are written to
    #[arg(short, long, default_value = "frames")]
    output: PathBuf,

    /// Pixels per world unit
    #[arg(long, default_value_t = 1.0)]
    scale: f32,

    /// Background color - name of the color for the background
    #[arg(long, default_value = "white")]
    bg_color: String,

    /// Render only every n-th snapshot
    #[arg(long, default_value_t = 1)]
    every: usize,
}

// Color definitions for named colors (RGBA format)
const COLOR_MAP: &[(&str, [u8; 4])] = &[
    ("black", [0, 0, 0, 255]),
    ("white", [255, 255, 255, 255]),
    ("cream", [250, 246, 235, 255]),
    ("charcoal", [34, 34, 38, 255]),
];

/// Parse a color name to RGBA values
fn parse_color(color_name: &str) -> [u8; 4] {
    for &(name, color) in COLOR_MAP {
        if name.eq_ignore_ascii_case(color_name) {
            return color;
        }
    }
    // Default to white if color not found
    warn!("Color '{}' not recognized, using white.", color_name);
    [255, 255, 255, 255]
}

/// Reads every snapshot from a file written by the engine, choosing the decoder by extension.
fn load_snapshots(path: &Path) -> Result<Vec<Snapshot>> {
    let file = File::open(path).with_context(|| format!("Failed to open input file: {}", path.display()))?;
    let reader = BufReader::new(file);
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("bin");
    let snapshots: Vec<Snapshot> = match extension {
        "json" => serde_json::from_reader(reader).context("Failed to decode JSON snapshots")?,
        "msgpack" => rmp_serde::from_read(reader).context("Failed to decode MessagePack snapshots")?,
        _ => bincode::deserialize_from(reader).context("Failed to decode bincode snapshots")?,
    };
    Ok(snapshots)
}

/// Draws a snapshot by replaying its canvas calls onto a fresh image
fn draw_frame(snapshot: &Snapshot, scale: f32, bg_color: [u8; 4]) -> RgbaImage {
    let width = (snapshot.viewport.width * scale).ceil().max(1.0) as u32;
    let height = (snapshot.viewport.height * scale).ceil().max(1.0) as u32;
    let mut image = RgbaImage::from_pixel(width, height, Rgba(bg_color));
    {
        let mut canvas = RasterCanvas::new(&mut image, scale);
        replay(&snapshot.commands, &mut canvas);
    }
    image
}

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    run_with_args(args)
}

fn run_with_args(args: Args) -> Result<()> {
    // Initialize logger
    Builder::from_default_env()
        .filter(None, LevelFilter::Info)
        .init();

    info!("Starting Worm Visualizer...");
    info!("Input file: {}", args.input.display());
    info!("Output directory: {}", args.output.display());

    if args.scale <= 0.0 {
        anyhow::bail!("--scale must be positive.");
    }
    let every = args.every.max(1);
    let bg_color = parse_color(&args.bg_color);

    let snapshots: Vec<Snapshot> = load_snapshots(&args.input)?
        .into_iter()
        .step_by(every)
        .collect();
    info!("Rendering {} snapshots", snapshots.len());
    if snapshots.is_empty() {
        warn!("Input file contains no snapshots. Exiting.");
        return Ok(());
    }

    fs::create_dir_all(&args.output)
        .with_context(|| format!("Failed to create output directory {}", args.output.display()))?;

    // Set up progress bar
    let progress_bar = ProgressBar::new(snapshots.len() as u64);
    progress_bar.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} frames ({percent}%) [{eta}]")
            .context("Invalid progress bar template")?
            .progress_chars("#>-"),
    );

    let start_time = Instant::now();
    let output_dir = &args.output;
    let scale = args.scale;

    let failures: Vec<(u32, anyhow::Error)> = snapshots
        .par_iter()
        .filter_map(|snapshot| {
            let image = draw_frame(snapshot, scale, bg_color);
            let path = output_dir.join(format!("frame_{:06}.png", snapshot.tick));
            let result = image
                .save(&path)
                .with_context(|| format!("Failed to write {}", path.display()));
            progress_bar.inc(1);
            result.err().map(|e| (snapshot.tick, e))
        })
        .collect();

    progress_bar.finish_with_message("Rendering complete");

    for (tick, e) in &failures {
        error!("Frame for tick {} failed: {:#}", tick, e);
    }
    let written = snapshots.len() - failures.len();
    let duration = start_time.elapsed();
    info!(
        "Wrote {} frames in {:.2?} ({:.1} frames per second)",
        written,
        duration,
        written as f64 / duration.as_secs_f64()
    );

    if !failures.is_empty() {
        anyhow::bail!("{} frames could not be written.", failures.len());
    }
    Ok(())
}

// Unit tests
#[cfg(test)]
mod tests {
    use super::*;
    use worm_common::{Canvas, Hsl, Paint, RecordingCanvas, Viewport};

    #[test]
    fn unknown_color_falls_back_to_white() {
        assert_eq!(parse_color("Charcoal"), [34, 34, 38, 255]);
        assert_eq!(parse_color("mauve"), [255, 255, 255, 255]);
    }

    #[test]
    fn frame_size_follows_viewport_and_scale() {
        let mut recording = RecordingCanvas::new();
        recording.set_global_alpha(0.92);
        recording.begin_path();
        recording.move_to(10.0, 10.0);
        recording.line_to(90.0, 40.0);
        recording.set_stroke_style(Paint::Hsl(Hsl::new(349.0, 99.0, 63.0)));
        recording.set_line_width(8.0);
        recording.stroke();

        let snapshot = Snapshot {
            tick: 4,
            viewport: Viewport::new(100.0, 50.0),
            heads: vec![(10.0, 10.0)],
            commands: recording.take_commands(),
        };
        let image = draw_frame(&snapshot, 2.0, [255, 255, 255, 255]);
        assert_eq!(image.dimensions(), (200, 100));
        assert_ne!(*image.get_pixel(100, 50), Rgba([255, 255, 255, 255]));
        assert_eq!(*image.get_pixel(190, 5), Rgba([255, 255, 255, 255]));
    }
}
