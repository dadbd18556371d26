use std::ops::Range;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use plotters::chart::SeriesAnno;
use plotters::coord::Shift;
use plotters::coord::types::RangedCoordf64;
use plotters::drawing::DrawingAreaErrorKind;
use plotters::prelude::*;
use plotters::style::{FontStyle, register_font};

use crate::errors::BenchError;
use crate::stats::{self, EcdfBand, HistogramBin, Summary};
use crate::types::{BenchmarkResult, Rgb, SampleSeries};

pub const HISTOGRAM_BINS: usize = 40;

const FONT: &str = "sans-serif";
const PANEL_SIZE: (u32, u32) = (2100, 500);
const GOLD: RGBColor = RGBColor(255, 215, 0);
const GRAY: RGBColor = RGBColor(128, 128, 128);

static FONT_LOADED: OnceLock<bool> = OnceLock::new();

const FONT_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu-sans-fonts/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/liberation-sans/LiberationSans-Regular.ttf",
    "/usr/share/fonts/truetype/freefont/FreeSans.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

/// Register the chart font once per process. Returns whether text can be drawn.
///
/// Lookup order: `explicit`, `$CBENCH_FONT`, then common system locations.
/// Later calls return the first call's outcome.
pub fn init_fonts(explicit: Option<&Path>) -> bool {
    *FONT_LOADED.get_or_init(|| {
        let env = std::env::var_os("CBENCH_FONT").map(PathBuf::from);
        let candidates = explicit
            .map(Path::to_path_buf)
            .into_iter()
            .chain(env)
            .chain(FONT_CANDIDATES.iter().map(PathBuf::from));

        for path in candidates {
            let Ok(bytes) = std::fs::read(&path) else {
                continue;
            };
            let bytes: &'static [u8] = Box::leak(bytes.into_boxed_slice());
            if register_font(FONT, FontStyle::Normal, bytes).is_ok() {
                tracing::debug!(font = %path.display(), "registered chart font");
                return true;
            }
            tracing::debug!(font = %path.display(), "not a usable font");
        }
        tracing::warn!("no usable font found; charts will be drawn without text");
        false
    })
}

fn text_enabled() -> bool {
    init_fonts(None)
}

fn rgb(c: Rgb) -> RGBColor {
    RGBColor(c.0, c.1, c.2)
}

/// Axis range around `[lo, hi]` with a little headroom on both sides.
fn padded(lo: f64, hi: f64) -> Range<f64> {
    let span = hi - lo;
    let pad = if span > 0.0 {
        span * 0.05
    } else {
        (lo.abs() * 0.05).max(1e-6)
    };
    (lo - pad)..(hi + pad)
}

enum ImageKind {
    Png,
    Svg,
}

impl ImageKind {
    fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("svg") => ImageKind::Svg,
            _ => ImageKind::Png,
        }
    }
}

type Plane = Cartesian2d<RangedCoordf64, RangedCoordf64>;
type DrawResult<DB> = Result<(), DrawingAreaErrorKind<<DB as DrawingBackend>::ErrorType>>;

/// Something that can be drawn onto any plotters backend.
trait Figure {
    fn size(&self) -> (u32, u32);
    fn draw<DB: DrawingBackend>(&self, root: &DrawingArea<DB, Shift>) -> DrawResult<DB>;
}

fn save<F: Figure>(figure: &F, path: &Path) -> Result<(), BenchError> {
    let fail = |detail: String| BenchError::Plot {
        path: path.to_path_buf(),
        detail,
    };
    match ImageKind::from_path(path) {
        ImageKind::Svg => {
            let root = SVGBackend::new(path, figure.size()).into_drawing_area();
            figure.draw(&root).map_err(|e| fail(e.to_string()))?;
            root.present().map_err(|e| fail(e.to_string()))?;
        }
        ImageKind::Png => {
            let root = BitMapBackend::new(path, figure.size()).into_drawing_area();
            figure.draw(&root).map_err(|e| fail(e.to_string()))?;
            root.present().map_err(|e| fail(e.to_string()))?;
        }
    }
    tracing::debug!(path = %path.display(), "chart written");
    Ok(())
}

fn panel<'a, DB: DrawingBackend>(
    area: &'a DrawingArea<DB, Shift>,
    caption: &str,
    x: Range<f64>,
    y: Range<f64>,
    text: bool,
) -> Result<ChartContext<'a, DB, Plane>, DrawingAreaErrorKind<DB::ErrorType>> {
    let mut builder = ChartBuilder::on(area);
    builder.margin(12);
    if text {
        builder
            .caption(caption, (FONT, 20))
            .x_label_area_size(45)
            .y_label_area_size(80);
    }
    builder.build_cartesian_2d(x, y)
}

fn mesh<'a, DB: DrawingBackend + 'a>(
    chart: &mut ChartContext<'a, DB, Plane>,
    x_desc: &str,
    y_desc: &str,
    text: bool,
) -> DrawResult<DB> {
    let mut mesh = chart.configure_mesh();
    if text {
        mesh.x_desc(x_desc)
            .y_desc(y_desc)
            .label_style((FONT, 13))
            .axis_desc_style((FONT, 15));
    } else {
        mesh.x_labels(0).y_labels(0);
    }
    mesh.draw()
}

fn legend<'a, DB: DrawingBackend + 'a>(
    chart: &mut ChartContext<'a, DB, Plane>,
    position: SeriesLabelPosition,
    text: bool,
) -> DrawResult<DB> {
    if !text {
        return Ok(());
    }
    chart
        .configure_series_labels()
        .position(position)
        .label_font((FONT, 12))
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()
}

fn annotate<'a, DB: DrawingBackend + 'a>(
    anno: &mut SeriesAnno<'a, DB>,
    label: impl Into<String>,
    color: RGBAColor,
    text: bool,
) {
    if text {
        anno.label(label)
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));
    }
}

fn hline<'c, 'a, DB: DrawingBackend + 'a>(
    chart: &'c mut ChartContext<'a, DB, Plane>,
    y: f64,
    x: &Range<f64>,
    style: ShapeStyle,
) -> Result<&'c mut SeriesAnno<'a, DB>, DrawingAreaErrorKind<DB::ErrorType>> {
    chart.draw_series(LineSeries::new(vec![(x.start, y), (x.end, y)], style))
}

fn vline<'c, 'a, DB: DrawingBackend + 'a>(
    chart: &'c mut ChartContext<'a, DB, Plane>,
    x: f64,
    y: &Range<f64>,
    style: ShapeStyle,
) -> Result<&'c mut SeriesAnno<'a, DB>, DrawingAreaErrorKind<DB::ErrorType>> {
    chart.draw_series(LineSeries::new(vec![(x, y.start), (x, y.end)], style))
}

// ---------------------------------------------------------------------------
// Bar chart
// ---------------------------------------------------------------------------

struct BarChart<'a> {
    title: &'a str,
    results: Vec<&'a BenchmarkResult>,
    color: RGBColor,
}

impl Figure for BarChart<'_> {
    fn size(&self) -> (u32, u32) {
        let height = (self.results.len() as u32 * 28 + 160).max(600);
        (1400, height)
    }

    fn draw<DB: DrawingBackend>(&self, root: &DrawingArea<DB, Shift>) -> DrawResult<DB> {
        let text = text_enabled();
        root.fill(&WHITE)?;

        let n = self.results.len() as i32;
        let max_time = self
            .results
            .iter()
            .map(|r| r.execution_time)
            .fold(0.0, f64::max);
        let x_max = if max_time > 0.0 { max_time * 1.2 } else { 1.0 };
        let longest = self.results.iter().map(|r| r.name.len()).max().unwrap_or(0);

        let mut builder = ChartBuilder::on(root);
        builder.margin(20);
        if text {
            builder
                .caption(self.title, (FONT, 24))
                .x_label_area_size(50)
                .y_label_area_size((longest as u32 * 8 + 20).max(80));
        }
        let mut chart = builder.build_cartesian_2d(0f64..x_max, (0..n).into_segmented())?;

        let names: Vec<&str> = self.results.iter().map(|r| r.name.as_str()).collect();
        let name_of = |v: &SegmentValue<i32>| match v {
            SegmentValue::Exact(i) | SegmentValue::CenterOf(i) => usize::try_from(*i)
                .ok()
                .and_then(|i| names.get(i))
                .map(|s| s.to_string())
                .unwrap_or_default(),
            SegmentValue::Last => String::new(),
        };

        let mut mesh = chart.configure_mesh();
        mesh.disable_y_mesh();
        if text {
            mesh.x_desc("Execution time (s)")
                .y_desc("Benchmark")
                .y_labels(names.len())
                .y_label_formatter(&name_of)
                .label_style((FONT, 12))
                .axis_desc_style((FONT, 15));
        } else {
            mesh.x_labels(0).y_labels(0);
        }
        mesh.draw()?;

        chart.draw_series(self.results.iter().zip(0..).map(|(r, i)| {
            Rectangle::new(
                [
                    (0.0, SegmentValue::Exact(i)),
                    (r.execution_time, SegmentValue::Exact(i + 1)),
                ],
                self.color.filled(),
            )
        }))?;

        if text {
            chart.draw_series(self.results.iter().zip(0..).map(|(r, i)| {
                Text::new(
                    format!("{:.5} s", r.execution_time),
                    (r.execution_time, SegmentValue::CenterOf(i)),
                    (FONT, 11).into_font(),
                )
            }))?;
        }
        Ok(())
    }
}

/// Render a horizontal bar chart of `results`, fastest at the bottom.
pub fn render_bar_chart(results: &[BenchmarkResult], path: &Path) -> Result<(), BenchError> {
    if results.is_empty() {
        return Err(BenchError::Plot {
            path: path.to_path_buf(),
            detail: "no results to plot".to_string(),
        });
    }
    let mut sorted: Vec<&BenchmarkResult> = results.iter().collect();
    sorted.sort_by(|a, b| a.execution_time.total_cmp(&b.execution_time));
    save(
        &BarChart {
            title: "Benchmark execution times",
            results: sorted,
            color: rgb(Rgb::PINK),
        },
        path,
    )
}

/// Load a results CSV and render it as a bar chart.
pub fn plot_bar_chart_from_csv(csv: &Path, out: &Path) -> Result<(), BenchError> {
    let results = crate::store::read_results(csv)?;
    render_bar_chart(&results, out)
}

// ---------------------------------------------------------------------------
// Repeated-sampling panels
// ---------------------------------------------------------------------------

/// A series with everything the three panels need, computed once.
pub struct PreparedSeries<'a> {
    pub series: &'a SampleSeries,
    pub color: Rgb,
    pub summary: Summary,
    pub band: EcdfBand,
    pub bins: Vec<HistogramBin>,
}

impl<'a> PreparedSeries<'a> {
    pub fn new(series: &'a SampleSeries, color: Rgb, alpha: f64) -> Result<Self, BenchError> {
        let times = series.times();
        Ok(Self {
            series,
            color,
            summary: stats::summarize(times)?,
            band: stats::ecdf_dkw(times, alpha)?,
            bins: stats::histogram(times, HISTOGRAM_BINS)?,
        })
    }
}

#[derive(Clone, Copy, PartialEq)]
enum Layout {
    Single,
    Combined,
}

struct SeriesFigure<'a> {
    title: String,
    items: &'a [PreparedSeries<'a>],
    layout: Layout,
}

impl SeriesFigure<'_> {
    fn bounds(&self) -> (f64, f64) {
        let lo = self.items.iter().map(|p| p.summary.min).fold(f64::INFINITY, f64::min);
        let hi = self.items.iter().map(|p| p.summary.max).fold(f64::NEG_INFINITY, f64::max);
        (lo, hi)
    }

    fn draw_runs<DB: DrawingBackend>(&self, area: &DrawingArea<DB, Shift>, text: bool) -> DrawResult<DB> {
        let runs = self.items.iter().map(|p| p.series.len()).max().unwrap_or(1);
        let (lo, hi) = self.bounds();
        let x = padded(1.0, runs as f64);
        let mut chart = panel(area, "Time per Run", x.clone(), padded(lo, hi), text)?;
        mesh(&mut chart, "Run Number", "Time (s)", text)?;

        for p in self.items {
            let color = rgb(p.color);
            let points = p.series.times().iter().enumerate().map(|(i, &t)| ((i + 1) as f64, t));
            let label = match self.layout {
                Layout::Single => "Execution time".to_string(),
                Layout::Combined => p.series.label().to_string(),
            };
            let anno = chart.draw_series(LineSeries::new(points, color.mix(0.75).stroke_width(1)))?;
            annotate(anno, label, color.mix(0.75), text);

            let s = &p.summary;
            match self.layout {
                Layout::Single => {
                    let anno = hline(&mut chart, s.mean, &x, RED.stroke_width(2))?;
                    annotate(anno, format!("Mean {:.6}s", s.mean), RED.mix(1.0), text);
                    let anno = hline(&mut chart, s.median, &x, GOLD.stroke_width(2))?;
                    annotate(anno, format!("Median {:.6}s", s.median), GOLD.mix(1.0), text);
                }
                Layout::Combined => {
                    let anno = hline(&mut chart, s.mean, &x, color.stroke_width(2))?;
                    let label = format!("Mean ({}): {:.6}s", p.series.label(), s.mean);
                    annotate(anno, label, color.mix(1.0), text);
                }
            }
        }
        legend(&mut chart, SeriesLabelPosition::UpperRight, text)
    }

    fn draw_histogram<DB: DrawingBackend>(&self, area: &DrawingArea<DB, Shift>, text: bool) -> DrawResult<DB> {
        let lo = self
            .items
            .iter()
            .filter_map(|p| p.bins.first().map(|b| b.lower))
            .fold(f64::INFINITY, f64::min);
        let hi = self
            .items
            .iter()
            .filter_map(|p| p.bins.last().map(|b| b.upper))
            .fold(f64::NEG_INFINITY, f64::max);
        let top = self
            .items
            .iter()
            .flat_map(|p| p.bins.iter().map(|b| b.count))
            .max()
            .unwrap_or(1)
            .max(1) as f64
            * 1.1;
        let y = 0.0..top;
        let mut chart = panel(area, "Distribution", padded(lo, hi), y.clone(), text)?;
        mesh(&mut chart, "Time (s)", "Frequency", text)?;

        let fill = match self.layout {
            Layout::Single => 0.85,
            Layout::Combined => 0.55,
        };
        for p in self.items {
            let color = rgb(p.color);
            let anno = chart.draw_series(p.bins.iter().map(|b| {
                Rectangle::new([(b.lower, 0.0), (b.upper, b.count as f64)], color.mix(fill).filled())
            }))?;
            if self.layout == Layout::Combined {
                annotate(anno, p.series.label(), color.mix(fill), text);
            }

            let s = &p.summary;
            match self.layout {
                Layout::Single => {
                    let anno = vline(&mut chart, s.mean, &y, RED.stroke_width(2))?;
                    annotate(anno, format!("Mean {:.6}s", s.mean), RED.mix(1.0), text);
                    let anno = vline(&mut chart, s.median, &y, GOLD.stroke_width(2))?;
                    annotate(anno, format!("Median {:.6}s", s.median), GOLD.mix(1.0), text);
                    if let Some(sd) = s.stdev {
                        let anno = vline(&mut chart, s.mean - sd, &y, GRAY.mix(0.7).stroke_width(1))?;
                        annotate(anno, format!("±1σ  {sd:.6}s"), GRAY.mix(0.7), text);
                        vline(&mut chart, s.mean + sd, &y, GRAY.mix(0.7).stroke_width(1))?;
                    }
                }
                Layout::Combined => {
                    let anno = vline(&mut chart, s.mean, &y, color.stroke_width(2))?;
                    annotate(anno, format!("Mean: {:.6}s", s.mean), color.mix(1.0), text);
                }
            }
        }
        legend(&mut chart, SeriesLabelPosition::UpperRight, text)
    }

    fn draw_ecdf<DB: DrawingBackend>(&self, area: &DrawingArea<DB, Shift>, text: bool) -> DrawResult<DB> {
        let (lo, hi) = self.bounds();
        let caption = match (self.layout, self.items.first()) {
            (Layout::Single, Some(p)) => format!("{} - ECDF + DKW Bands", p.series.label()),
            _ => {
                let pct = self.items.first().map_or(95, |p| p.band.confidence_percent());
                format!("ECDF + DKW {pct}% Confidence Bands")
            }
        };
        let mut chart = panel(area, &caption, padded(lo, hi), 0.0..1.05, text)?;
        mesh(&mut chart, "Execution Time (s)", "Cumulative Probability", text)?;

        for p in self.items {
            let color = rgb(p.color);
            let band = &p.band;
            let upper = stats::step_path(&band.x, &band.upper);
            let lower = stats::step_path(&band.x, &band.lower);

            let mut outline = upper.clone();
            outline.extend(lower.iter().rev().copied());
            chart.draw_series(std::iter::once(Polygon::new(outline, color.mix(0.15).filled())))?;

            let ecdf_label = match self.layout {
                Layout::Single => "ECDF".to_string(),
                Layout::Combined => format!("ECDF - {}", p.series.label()),
            };
            let anno = chart.draw_series(LineSeries::new(
                stats::step_path(&band.x, &band.ecdf_y),
                color.stroke_width(2),
            ))?;
            annotate(anno, ecdf_label, color.mix(1.0), text);

            let band_label = match self.layout {
                Layout::Single => format!(
                    "DKW {}% band  (ε={:.4})",
                    band.confidence_percent(),
                    band.epsilon
                ),
                Layout::Combined => format!("DKW band (ε={:.4})", band.epsilon),
            };
            let anno = chart.draw_series(LineSeries::new(upper, color.mix(0.7).stroke_width(1)))?;
            annotate(anno, band_label, color.mix(0.7), text);
            chart.draw_series(LineSeries::new(lower, color.mix(0.7).stroke_width(1)))?;
        }
        legend(&mut chart, SeriesLabelPosition::LowerRight, text)
    }
}

impl Figure for SeriesFigure<'_> {
    fn size(&self) -> (u32, u32) {
        PANEL_SIZE
    }

    fn draw<DB: DrawingBackend>(&self, root: &DrawingArea<DB, Shift>) -> DrawResult<DB> {
        let text = text_enabled();
        root.fill(&WHITE)?;
        let panels = if text {
            root.titled(&self.title, (FONT, 26))?.split_evenly((1, 3))
        } else {
            root.split_evenly((1, 3))
        };
        self.draw_runs(&panels[0], text)?;
        self.draw_histogram(&panels[1], text)?;
        self.draw_ecdf(&panels[2], text)
    }
}

/// Render the three panels (time per run, distribution, ECDF with DKW band)
/// for one program.
pub fn render_series(prepared: &PreparedSeries<'_>, path: &Path) -> Result<(), BenchError> {
    let items = std::slice::from_ref(prepared);
    save(
        &SeriesFigure {
            title: format!(
                "Benchmark - {} ({} Runs)",
                prepared.series.label(),
                prepared.series.len()
            ),
            items,
            layout: Layout::Single,
        },
        path,
    )
}

/// Overlay every program in the same three panels.
pub fn render_combined(prepared: &[PreparedSeries<'_>], path: &Path) -> Result<(), BenchError> {
    if prepared.is_empty() {
        return Err(BenchError::Plot {
            path: path.to_path_buf(),
            detail: "no series to plot".to_string(),
        });
    }
    let runs = prepared.iter().map(|p| p.series.len()).max().unwrap_or(0);
    save(
        &SeriesFigure {
            title: format!("Benchmark - Combined Comparison ({runs} Runs)"),
            items: prepared,
            layout: Layout::Combined,
        },
        path,
    )
}
