//! borders: trace the border hierarchy of a mask image and export it.
//!
//! Reads an image file, traces every outer border and hole, prints a
//! summary of the resulting contour tree and optionally writes:
//!
//! - GeoJSON polygons, in pixel space or reprojected to longitude/latitude
//! - an SVG with one path per border
//! - a PNG rendering (and a per-border flipbook)
//! - the post-morphology mask as PNG
//!
//! Set `RUST_LOG=debug` to log every discovered border.
//!
//! # Usage
//!
//! ```text
//! cargo run --release --bin borders -- [OPTIONS] <IMAGE_PATH>
//! ```

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use borders_core::polygon::mark_conflicting_siblings_unusable;
use borders_core::project::{PixelToLonLat, SlippyToLonLat};
use borders_core::{
    PaddingMode, PointConverter, PolygonOptions, ProcessConfig, ProcessResult,
    contours_to_multipolygon,
};
use borders_export::{GeoJsonOptions, RenderOptions, SvgMetadata};
use clap::{Parser, ValueEnum};

/// Trace the borders of a binary mask image.
///
/// Any pixel that is not black (or fully transparent) is foreground.
#[derive(Parser)]
#[command(name = "borders", version)]
struct Cli {
    /// Path to the input image (PNG, JPEG, BMP, WebP).
    image_path: PathBuf,

    /// Erosion radius in pixels, applied before tracing.
    #[arg(long, default_value_t = ProcessConfig::DEFAULT_ERODE_RADIUS)]
    erode: u32,

    /// Dilation radius in pixels, applied after erosion.
    #[arg(long, default_value_t = ProcessConfig::DEFAULT_DILATE_RADIUS)]
    dilate: u32,

    /// Whether to surround the mask with a background ring before tracing.
    #[arg(long, value_enum, default_value_t = Padding::Auto)]
    padding: Padding,

    /// Full process config as a JSON string.
    ///
    /// When provided, `--erode`, `--dilate` and `--padding` are ignored.
    /// The JSON must be a valid `ProcessConfig` serialization.
    #[arg(long)]
    config_json: Option<String>,

    /// Write polygons as GeoJSON to file.
    #[arg(long)]
    geojson: Option<PathBuf>,

    /// Ramer-Douglas-Peucker tolerance for GeoJSON output, in output units.
    #[arg(long)]
    simplify: Option<f64>,

    /// Added to pixel coordinates before reprojection.
    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    pixel_offset: f64,

    /// Treat each pixel as a slippy tile: `X,Y,ZOOM` of the top-left pixel.
    #[arg(long, value_parser = parse_anchor, conflicts_with_all = ["center", "origin"])]
    slippy: Option<Anchor>,

    /// Image rendered at 256 px per tile, centred on `LON,LAT,ZOOM`.
    #[arg(long, value_parser = parse_anchor, allow_hyphen_values = true, conflicts_with = "origin")]
    center: Option<Anchor>,

    /// Image rendered at 256 px per tile, top-left pixel at `LON,LAT,ZOOM`.
    #[arg(long, value_parser = parse_anchor, allow_hyphen_values = true)]
    origin: Option<Anchor>,

    /// Write an SVG with one path per border to file.
    #[arg(long)]
    svg: Option<PathBuf>,

    /// Write a PNG rendering of every border to file.
    #[arg(long)]
    png: Option<PathBuf>,

    /// Also write one PNG per drawn border, named `<png stem>-<n>.png`.
    #[arg(long, requires = "png")]
    flipbook: bool,

    /// Borders with this many points or fewer are left out of the PNG.
    #[arg(long, default_value_t = 0)]
    min_points: usize,

    /// Write the mask that was traced (after erosion and dilation) to file.
    #[arg(long)]
    mask_png: Option<PathBuf>,

    /// Print the tree summary as JSON instead of a human-readable report.
    #[arg(long)]
    json: bool,
}

/// Padding mode selection.
#[derive(Clone, Copy, ValueEnum)]
enum Padding {
    /// Pad only when foreground touches the image edge.
    Auto,
    /// Always pad.
    Always,
    /// Never pad.
    Never,
}

/// A comma-separated `A,B,ZOOM` triple.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Anchor {
    a: f64,
    b: f64,
    zoom: u8,
}

fn parse_anchor(s: &str) -> Result<Anchor, String> {
    let parts: Vec<&str> = s.split(',').map(str::trim).collect();
    let [a, b, zoom] = parts.as_slice() else {
        return Err(format!("expected three comma-separated values, got {s:?}"));
    };
    Ok(Anchor {
        a: a.parse().map_err(|e| format!("{a:?}: {e}"))?,
        b: b.parse().map_err(|e| format!("{b:?}: {e}"))?,
        zoom: zoom.parse().map_err(|e| format!("zoom {zoom:?}: {e}"))?,
    })
}

/// Build a [`ProcessConfig`] from CLI arguments.
///
/// If `--config-json` is provided, the JSON is parsed directly and the
/// individual parameter flags are ignored.
fn config_from_cli(cli: &Cli) -> Result<ProcessConfig, String> {
    if let Some(ref json) = cli.config_json {
        return serde_json::from_str(json).map_err(|e| format!("Error parsing --config-json: {e}"));
    }

    Ok(ProcessConfig {
        erode_radius: cli.erode,
        dilate_radius: cli.dilate,
        padding: match cli.padding {
            Padding::Auto => PaddingMode::Auto,
            Padding::Always => PaddingMode::Always,
            Padding::Never => PaddingMode::Never,
        },
    })
}

/// The coordinate converter selected by `--slippy`, `--center` or `--origin`.
fn converter_from_cli(
    cli: &Cli,
    result: &ProcessResult,
) -> Result<Option<Box<dyn PointConverter>>, String> {
    let converter: Box<dyn PointConverter> = if let Some(s) = cli.slippy {
        Box::new(SlippyToLonLat::new(s.a, s.b, s.zoom).map_err(|e| format!("--slippy: {e}"))?)
    } else if let Some(c) = cli.center {
        let dims = result.dimensions;
        Box::new(
            PixelToLonLat::new(c.a, c.b, c.zoom, dims.width, dims.height)
                .map_err(|e| format!("--center: {e}"))?,
        )
    } else if let Some(o) = cli.origin {
        Box::new(PixelToLonLat::from_origin(o.a, o.b, o.zoom).map_err(|e| format!("--origin: {e}"))?)
    } else {
        return Ok(None);
    };
    Ok(Some(converter))
}

fn write_output(path: &Path, bytes: &[u8], what: &str) -> Result<(), String> {
    std::fs::write(path, bytes)
        .map_err(|e| format!("Error writing {what} to {}: {e}", path.display()))?;
    eprintln!("{what} written to {} ({} bytes)", path.display(), bytes.len());
    Ok(())
}

fn print_report(cli: &Cli, result: &ProcessResult) {
    let summary = result.tree.summary();
    println!(
        "Image: {} ({}x{}{})",
        cli.image_path.display(),
        result.dimensions.width,
        result.dimensions.height,
        if result.padded { ", padded" } else { "" },
    );
    println!(
        "Contours: {} ({} outer, {} holes)",
        summary.contours, summary.outer, summary.holes,
    );
    println!(
        "Conflicting: {}  Parent collisions: {}  Unusable: {}",
        summary.conflicting, summary.parent_collisions, summary.unusable,
    );
    println!("Points: {}  Depth: {}", summary.points, summary.depth);
}

fn write_geojson(cli: &Cli, path: &Path, result: &ProcessResult) -> Result<(), String> {
    let converter = converter_from_cli(cli, result)?;
    let options = PolygonOptions {
        simplify_tolerance: cli.simplify,
        pixel_offset: cli.pixel_offset,
        converter: converter.as_deref(),
    };
    let multi = contours_to_multipolygon(&result.tree, &options).map_err(|e| e.to_string())?;

    let mut properties = serde_json::Map::new();
    if let Some(name) = cli.image_path.file_name().and_then(|s| s.to_str()) {
        properties.insert("source".into(), name.into());
    }
    let geojson = borders_export::to_geojson(
        &multi,
        &GeoJsonOptions {
            properties: Some(properties),
            pretty: false,
        },
    )
    .map_err(|e| e.to_string())?;
    write_output(path, geojson.as_bytes(), "GeoJSON")
}

fn write_svg(
    cli: &Cli,
    path: &Path,
    config: &ProcessConfig,
    result: &ProcessResult,
) -> Result<(), String> {
    let title = cli
        .image_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("borders");
    let config_json = serde_json::to_string(config).map_err(|e| e.to_string())?;
    let metadata = SvgMetadata {
        title: Some(title),
        description: Some("Outer borders in black, holes in red"),
        config_json: Some(&config_json),
    };
    let svg = borders_export::to_svg(&result.tree, result.dimensions, &metadata);
    write_output(path, svg.as_bytes(), "SVG")
}

fn write_png(cli: &Cli, path: &Path, result: &ProcessResult) -> Result<(), String> {
    let options = RenderOptions {
        min_points: cli.min_points,
        flipbook: cli.flipbook,
    };
    let rendered = borders_export::render_contours(&result.tree, result.dimensions, &options);

    let stem = path.with_extension("");
    for (n, frame) in rendered.frames.iter().enumerate() {
        let bytes = borders_export::encode_png(frame).map_err(|e| e.to_string())?;
        let frame_path = PathBuf::from(format!("{}-{n}.png", stem.display()));
        write_output(&frame_path, &bytes, "Frame")?;
    }

    let bytes = borders_export::encode_png(&rendered.image).map_err(|e| e.to_string())?;
    write_output(path, &bytes, "PNG")
}

fn run(cli: &Cli) -> Result<(), String> {
    let config = config_from_cli(cli)?;

    let image_bytes = std::fs::read(&cli.image_path)
        .map_err(|e| format!("Error reading {}: {e}", cli.image_path.display()))?;
    log::info!(
        "read {} ({} bytes)",
        cli.image_path.display(),
        image_bytes.len()
    );

    let mut result = borders_core::process(&image_bytes, &config).map_err(|e| e.to_string())?;
    let marked = mark_conflicting_siblings_unusable(&mut result.tree);
    if marked > 0 {
        log::warn!("{marked} holes conflict with a sibling and were marked unusable");
    }

    if cli.json {
        let json = serde_json::to_string_pretty(&result.tree.summary())
            .map_err(|e| format!("Error serializing summary: {e}"))?;
        println!("{json}");
    } else {
        print_report(cli, &result);
    }

    if let Some(ref path) = cli.mask_png {
        let bytes = borders_core::raster::mask_to_png(&result.mask).map_err(|e| e.to_string())?;
        write_output(path, &bytes, "Mask")?;
    }
    if let Some(ref path) = cli.geojson {
        write_geojson(cli, path, &result)?;
    }
    if let Some(ref path) = cli.svg {
        write_svg(cli, path, &config, &result)?;
    }
    if let Some(ref path) = cli.png {
        write_png(cli, path, &result)?;
    }
    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(msg) => {
            eprintln!("{msg}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("borders").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn anchor_parses_three_values() {
        assert_eq!(
            parse_anchor("144.7, -37.5,21"),
            Ok(Anchor {
                a: 144.7,
                b: -37.5,
                zoom: 21
            })
        );
        assert!(parse_anchor("1,2").is_err());
        assert!(parse_anchor("1,2,300").is_err());
        assert!(parse_anchor("a,2,3").is_err());
    }

    #[test]
    fn flags_build_config() {
        let cli = parse(&["mask.png", "--erode", "2", "--dilate", "3", "--padding", "never"]);
        let config = config_from_cli(&cli).unwrap();
        assert_eq!(config.erode_radius, 2);
        assert_eq!(config.dilate_radius, 3);
        assert_eq!(config.padding, PaddingMode::Never);
    }

    #[test]
    fn config_json_overrides_flags() {
        let cli = parse(&[
            "mask.png",
            "--erode",
            "2",
            "--config-json",
            r#"{"dilate_radius":1,"padding":"always"}"#,
        ]);
        let config = config_from_cli(&cli).unwrap();
        assert_eq!(config.erode_radius, 0);
        assert_eq!(config.dilate_radius, 1);
        assert_eq!(config.padding, PaddingMode::Always);
    }

    #[test]
    fn bad_config_json_is_reported() {
        let cli = parse(&["mask.png", "--config-json", "{"]);
        assert!(config_from_cli(&cli).unwrap_err().contains("--config-json"));
    }

    #[test]
    fn projection_flags_are_exclusive() {
        let result = Cli::try_parse_from([
            "borders",
            "mask.png",
            "--slippy",
            "1,2,3",
            "--center",
            "1,2,3",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn flipbook_requires_png() {
        assert!(Cli::try_parse_from(["borders", "mask.png", "--flipbook"]).is_err());
    }

    #[test]
    fn negative_center_is_accepted() {
        let cli = parse(&["mask.png", "--center", "-122.4,37.8,12"]);
        assert_eq!(cli.center.map(|c| c.a), Some(-122.4));
    }
}
