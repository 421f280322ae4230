//! Rendering of genotype tracks and breakpoint markers.
//!
//! The figure has three horizontal reference lines at y = 1, 0 and -1, one
//! scatter series per track on its line, and four vertical black lines at the
//! candidate breakpoints. The y-axis is fixed to [-10, 10].
//!
use plotters::coord::Shift;
use plotters::prelude::*;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::tracks::{Position, RecPlotError, RecombTracks, Track};

pub const Y_MIN: f64 = -10.0;
pub const Y_MAX: f64 = 10.0;

/// Legend label of the recombinant track.
pub const RECOMB_LABEL: &str = "recomb";

pub const DEFAULT_WIDTH: u32 = 640;
pub const DEFAULT_HEIGHT: u32 = 480;

const MARKER_SIZE: i32 = 4;

// the classic categorical cycle, in draw order
const REFERENCE_COLORS: [RGBColor; 3] = [
    RGBColor(0x1f, 0x77, 0xb4),
    RGBColor(0xff, 0x7f, 0x0e),
    RGBColor(0x2c, 0xa0, 0x2c),
];
const TRACK_COLORS: [RGBColor; 3] = [
    RGBColor(0xd6, 0x27, 0x28),
    RGBColor(0x94, 0x67, 0xbd),
    RGBColor(0x8c, 0x56, 0x4b),
];

/// Output image formats, inferred from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Svg,
    Png,
    Jpeg,
    Bmp,
}

impl ImageFormat {
    /// Infer the format from a path's extension (case-insensitive).
    ///
    /// A path without an extension is written as PNG with `.png` appended,
    /// so the returned path may differ from the input.
    pub fn resolve(path: &Path) -> Result<(ImageFormat, PathBuf), RecPlotError> {
        let extension = path
            .extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        let format = match extension.as_str() {
            "" => {
                let mut with_png = OsString::from(path.as_os_str());
                with_png.push(".png");
                return Ok((ImageFormat::Png, PathBuf::from(with_png)));
            }
            "svg" => ImageFormat::Svg,
            "png" => ImageFormat::Png,
            "jpg" | "jpeg" => ImageFormat::Jpeg,
            "bmp" => ImageFormat::Bmp,
            other => return Err(RecPlotError::UnsupportedFormat(other.to_string())),
        };
        Ok((format, path.to_path_buf()))
    }
}

/// The four candidate breakpoint coordinates: two bounds for the start of the
/// recombinant interval and two for its end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Breakpoints {
    pub start_low: Position,
    pub start_high: Position,
    pub end_low: Position,
    pub end_high: Position,
}

impl Breakpoints {
    pub fn new(
        start_low: Position,
        start_high: Position,
        end_low: Position,
        end_high: Position,
    ) -> Self {
        Self {
            start_low,
            start_high,
            end_low,
            end_high,
        }
    }

    /// The breakpoints in drawing order.
    pub fn positions(&self) -> [Position; 4] {
        [self.start_low, self.start_high, self.end_low, self.end_high]
    }
}

/// A straight line in data coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub from: (f64, f64),
    pub to: (f64, f64),
}

impl Segment {
    fn horizontal(y: f64, x0: f64, x1: f64) -> Self {
        Self {
            from: (x0, y),
            to: (x1, y),
        }
    }

    fn vertical(x: f64, y0: f64, y1: f64) -> Self {
        Self {
            from: (x, y0),
            to: (x, y1),
        }
    }
}

/// Everything the plot draws, in data coordinates and draw order.
#[derive(Debug, Clone, PartialEq)]
pub struct Figure {
    pub x_range: (f64, f64),
    pub y_range: (f64, f64),
    /// One line per track at its level, spanning [0, length].
    pub reference_lines: [Segment; 3],
    /// Scatter points per track.
    pub points: [Vec<(f64, f64)>; 3],
    /// One vertical line per breakpoint, spanning the y range.
    pub breakpoint_lines: [Segment; 4],
    /// The track labelled in the legend, if any.
    pub legend: Option<Track>,
}

fn plot_error<E>(err: DrawingAreaErrorKind<E>) -> RecPlotError
where
    E: std::error::Error + Send + Sync,
{
    RecPlotError::PlotError(err.to_string())
}

/// Whether a backend can draw glyphs. SVG emits text elements; raster
/// backends need a font implementation, enabled by the `fonts` feature.
fn draws_text(format: ImageFormat) -> bool {
    format == ImageFormat::Svg || cfg!(feature = "fonts")
}

/// A recombination plot over a genome of a given length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecombPlot {
    pub length: Position,
    pub breakpoints: Breakpoints,
    pub width: u32,
    pub height: u32,
}

impl RecombPlot {
    pub fn new(length: Position, breakpoints: Breakpoints) -> Self {
        Self {
            length,
            breakpoints,
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
        }
    }

    /// Set the image size in pixels.
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// The x extent: everything drawn, padded by 5% on each side.
    pub fn x_range(&self, tracks: &RecombTracks) -> (f64, f64) {
        let (min, max) = tracks
            .iter()
            .flat_map(|(_, positions)| positions.iter().copied())
            .chain(self.breakpoints.positions())
            .chain([0, self.length])
            .fold((Position::MAX, Position::MIN), |(lo, hi), x| {
                (lo.min(x), hi.max(x))
            });
        let (min, max) = (min as f64, max as f64);
        let span = max - min;
        let pad = if span > 0.0 { 0.05 * span } else { 1.0 };
        (min - pad, max + pad)
    }

    /// Lay out the figure for these tracks.
    pub fn figure(&self, tracks: &RecombTracks) -> Figure {
        let length = self.length as f64;
        Figure {
            x_range: self.x_range(tracks),
            y_range: (Y_MIN, Y_MAX),
            reference_lines: Track::ALL
                .map(|track| Segment::horizontal(track.level(), 0.0, length)),
            points: Track::ALL.map(|track| {
                let y = track.level();
                tracks.track(track).iter().map(|&x| (x as f64, y)).collect()
            }),
            breakpoint_lines: self
                .breakpoints
                .positions()
                .map(|x| Segment::vertical(x as f64, Y_MIN, Y_MAX)),
            legend: tracks.recomb(),
        }
    }

    /// Render the tracks to `path`, choosing the format from its extension.
    ///
    /// Returns the path actually written.
    pub fn render(
        &self,
        tracks: &RecombTracks,
        path: impl AsRef<Path>,
    ) -> Result<PathBuf, RecPlotError> {
        let (format, path) = ImageFormat::resolve(path.as_ref())?;
        let figure = self.figure(tracks);
        let with_text = draws_text(format);
        if !with_text {
            debug!("no font support for {:?}; axis labels and legend omitted", format);
        }
        let size = (self.width, self.height);
        match format {
            ImageFormat::Svg => {
                let root = SVGBackend::new(&path, size).into_drawing_area();
                draw(root, &figure, with_text).map_err(plot_error)?;
            }
            ImageFormat::Png | ImageFormat::Jpeg | ImageFormat::Bmp => {
                let root = BitMapBackend::new(&path, size).into_drawing_area();
                draw(root, &figure, with_text).map_err(plot_error)?;
            }
        }
        info!("wrote {:?} plot to {}", format, path.display());
        Ok(path)
    }
}

fn draw<DB: DrawingBackend>(
    root: DrawingArea<DB, Shift>,
    figure: &Figure,
    with_text: bool,
) -> Result<(), DrawingAreaErrorKind<DB::ErrorType>> {
    root.fill(&WHITE)?;

    let (x_min, x_max) = figure.x_range;
    let (y_min, y_max) = figure.y_range;
    let mut chart = ChartBuilder::on(&root)
        .margin(15)
        .x_label_area_size(35)
        .y_label_area_size(40)
        .build_cartesian_2d(x_min..x_max, y_min..y_max)?;
    if with_text {
        chart.configure_mesh().disable_mesh().draw()?;
    } else {
        chart.draw_series(std::iter::once(Rectangle::new(
            [(x_min, y_min), (x_max, y_max)],
            BLACK.stroke_width(1),
        )))?;
    }

    for (line, color) in figure.reference_lines.iter().zip(REFERENCE_COLORS) {
        chart.draw_series(LineSeries::new([line.from, line.to], color.stroke_width(2)))?;
    }

    for ((track, points), color) in Track::ALL.iter().zip(&figure.points).zip(TRACK_COLORS) {
        let series = chart.draw_series(
            points
                .iter()
                .map(move |&point| Circle::new(point, MARKER_SIZE, color.filled())),
        )?;
        if figure.legend == Some(*track) {
            series
                .label(RECOMB_LABEL)
                .legend(move |(x, y)| Circle::new((x, y), MARKER_SIZE, color.filled()));
        }
    }

    for line in &figure.breakpoint_lines {
        chart.draw_series(LineSeries::new([line.from, line.to], BLACK.stroke_width(1)))?;
    }

    match (figure.legend, with_text) {
        (Some(_), true) => {
            chart
                .configure_series_labels()
                .position(SeriesLabelPosition::UpperRight)
                .background_style(WHITE.mix(0.8))
                .border_style(&BLACK)
                .draw()?;
        }
        (Some(_), false) => {}
        (None, _) => warn!("no recombinant track found; legend omitted"),
    }

    root.present()?;
    Ok(())
}
