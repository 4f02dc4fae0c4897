// src/chart.rs
use std::ops::Range;

use plotters::coord::Shift;
use plotters::element::{DynElement, IntoDynElement};
use plotters::prelude::*;
use plotters::series::DashedLineSeries;

use crate::config::PlotSettings;
use crate::data_types::{GraphType, NumericSeries};
use crate::error::{Error, Result};

/// Bars span 0.8 x-units, centered on their x value.
const BAR_HALF_WIDTH: f64 = 0.4;
const MARKER_SIZE: i32 = 3;

/// In-memory drawing surface shared by the refresh loop and the export path.
///
/// Holds the RGB pixels of the last render plus the inputs that produced
/// them, so vector export can re-draw the same frame.
pub struct ChartSurface {
    width: u32,
    height: u32,
    buffer: Vec<u8>,
    scene: Option<Scene>,
}

#[derive(Clone)]
pub(crate) struct Scene {
    pub(crate) series: Vec<NumericSeries>,
    pub(crate) graph_type: GraphType,
    pub(crate) settings: PlotSettings,
}

impl ChartSurface {
    pub fn new(width: u32, height: u32) -> Self {
        ChartSurface {
            width,
            height,
            buffer: vec![0xff; (width as usize) * (height as usize) * 3],
            scene: None,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// RGB pixels, row-major, three bytes per pixel.
    pub fn buffer(&self) -> &[u8] {
        &self.buffer
    }

    pub(crate) fn scene(&self) -> Option<&Scene> {
        self.scene.as_ref()
    }
}

/// Clears the surface and draws every series with the primitive selected by
/// `graph_type`, then labels, title, legend and optional grid.
///
/// The frame is drawn off to the side and committed only when it completed,
/// so a failing render leaves the surface showing its previous contents.
pub fn render(
    surface: &mut ChartSurface,
    series: &[NumericSeries],
    graph_type: GraphType,
    settings: &PlotSettings,
) -> Result<()> {
    let (width, height) = (surface.width, surface.height);
    let mut buffer = vec![0xffu8; (width as usize) * (height as usize) * 3];
    {
        let root = BitMapBackend::with_buffer(&mut buffer, (width, height)).into_drawing_area();
        draw_frame(&root, series, graph_type, settings)?;
        root.present().map_err(render_error)?;
    }
    surface.buffer = buffer;
    surface.scene = Some(Scene {
        series: series.to_vec(),
        graph_type,
        settings: settings.clone(),
    });
    Ok(())
}

/// Draws one full frame onto any plotters backend. Shared between the
/// raster preview and the SVG export.
pub(crate) fn draw_frame<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    series: &[NumericSeries],
    graph_type: GraphType,
    settings: &PlotSettings,
) -> Result<()> {
    // Style options are validated before the frame is cleared.
    let color = parse_color(&settings.line_color)?;
    let line_style = parse_line_style(&settings.line_style)?;
    let marker = effective_marker(&settings.marker, graph_type)?;
    let legend_position = parse_legend_loc(&settings.legend_loc)?;
    let stroke = color.stroke_width(settings.line_width);

    root.fill(&WHITE).map_err(render_error)?;

    let (x_range, y_range) = axis_ranges(series, graph_type);
    let mut chart = ChartBuilder::on(root)
        .caption(settings.title.as_str(), ("sans-serif", 24))
        .margin(10)
        .x_label_area_size(36)
        .y_label_area_size(44)
        .build_cartesian_2d(x_range, y_range)
        .map_err(render_error)?;

    {
        let mut mesh = chart.configure_mesh();
        mesh.x_desc(settings.xlabel.as_str())
            .y_desc(settings.ylabel.as_str());
        if !settings.grid {
            mesh.disable_x_mesh().disable_y_mesh();
        }
        mesh.draw().map_err(render_error)?;
    }

    for one in series {
        match graph_type {
            GraphType::Line => {
                let points = one.points.iter().copied();
                let anno = match line_style {
                    LineStyle::Solid => chart
                        .draw_series(LineSeries::new(points, stroke))
                        .map_err(render_error)?,
                    LineStyle::Dashed => chart
                        .draw_series(DashedLineSeries::new(points, 8, 4, stroke))
                        .map_err(render_error)?,
                    LineStyle::Dotted => chart
                        .draw_series(DashedLineSeries::new(points, 2, 4, stroke))
                        .map_err(render_error)?,
                };
                anno.label(one.label.as_str()).legend(move |(x, y)| {
                    PathElement::new(vec![(x, y), (x + 18, y)], stroke)
                });
                if let Some(marker) = marker {
                    chart
                        .draw_series(
                            one.points
                                .iter()
                                .map(|&point| marker_element(marker, point, color)),
                        )
                        .map_err(render_error)?;
                }
            }
            GraphType::Bar => {
                // One bar per x value; overlapping series are drawn in
                // sequence, not offset.
                chart
                    .draw_series(one.points.iter().map(|&(x, y)| {
                        Rectangle::new(
                            [(x - BAR_HALF_WIDTH, 0.0), (x + BAR_HALF_WIDTH, y)],
                            color.filled(),
                        )
                    }))
                    .map_err(render_error)?
                    .label(one.label.as_str())
                    .legend(move |(x, y)| {
                        Rectangle::new([(x, y - 4), (x + 12, y + 4)], color.filled())
                    });
            }
            GraphType::Scatter => {
                let marker = marker.unwrap_or(Marker::Circle);
                chart
                    .draw_series(
                        one.points
                            .iter()
                            .map(|&point| marker_element(marker, point, color)),
                    )
                    .map_err(render_error)?
                    .label(one.label.as_str())
                    .legend(move |(x, y)| {
                        Circle::new((x + 6, y), MARKER_SIZE, color.filled())
                    });
            }
        }
    }

    if !series.is_empty() {
        let mut labels = chart.configure_series_labels();
        labels
            .position(legend_position)
            .label_font(("sans-serif", settings.legend_fontsize));
        if settings.legend_frameon {
            labels.background_style(WHITE.mix(0.8)).border_style(BLACK);
        }
        labels.draw().map_err(render_error)?;
    }

    Ok(())
}

fn render_error<E: std::fmt::Display>(err: E) -> Error {
    Error::Render(err.to_string())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineStyle {
    Solid,
    Dashed,
    Dotted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Marker {
    Circle,
    Square,
    Cross,
    Triangle,
}

fn marker_element<'a, DB: DrawingBackend + 'a>(
    marker: Marker,
    point: (f64, f64),
    color: RGBColor,
) -> DynElement<'a, DB, (f64, f64)> {
    let style = color.filled();
    match marker {
        Marker::Circle => Circle::new(point, MARKER_SIZE, style).into_dyn(),
        Marker::Square => (EmptyElement::at(point)
            + Rectangle::new(
                [(-MARKER_SIZE, -MARKER_SIZE), (MARKER_SIZE, MARKER_SIZE)],
                style,
            ))
        .into_dyn(),
        Marker::Cross => Cross::new(point, MARKER_SIZE, style).into_dyn(),
        Marker::Triangle => TriangleMarker::new(point, MARKER_SIZE + 1, style).into_dyn(),
    }
}

fn axis_ranges(series: &[NumericSeries], graph_type: GraphType) -> (Range<f64>, Range<f64>) {
    let mut x_min = f64::INFINITY;
    let mut x_max = f64::NEG_INFINITY;
    let mut y_min = f64::INFINITY;
    let mut y_max = f64::NEG_INFINITY;
    for one in series {
        for &(x, y) in &one.points {
            if x < x_min {
                x_min = x;
            }
            if x > x_max {
                x_max = x;
            }
            if y < y_min {
                y_min = y;
            }
            if y > y_max {
                y_max = y;
            }
        }
    }
    if x_min > x_max || y_min > y_max {
        return (0.0..1.0, 0.0..1.0);
    }
    if graph_type == GraphType::Bar {
        // bars grow from the zero line and need room at the outer x values
        y_min = y_min.min(0.0);
        y_max = y_max.max(0.0);
        x_min -= 2.0 * BAR_HALF_WIDTH;
        x_max += 2.0 * BAR_HALF_WIDTH;
    }
    if x_min == x_max {
        x_min -= 1.0;
        x_max += 1.0;
    }
    if y_min == y_max {
        y_min -= 1.0;
        y_max += 1.0;
    }
    (x_min..x_max, y_min..y_max)
}

fn parse_color(name: &str) -> Result<RGBColor> {
    let normalized = name.trim().to_ascii_lowercase();
    if let Some(hex) = normalized.strip_prefix('#') {
        if hex.len() == 6 {
            if let (Ok(r), Ok(g), Ok(b)) = (
                u8::from_str_radix(&hex[0..2], 16),
                u8::from_str_radix(&hex[2..4], 16),
                u8::from_str_radix(&hex[4..6], 16),
            ) {
                return Ok(RGBColor(r, g, b));
            }
        }
        return Err(Error::Render(format!("unrecognized color '{name}'")));
    }
    match normalized.as_str() {
        "black" => Ok(RGBColor(0, 0, 0)),
        "white" => Ok(RGBColor(255, 255, 255)),
        "red" => Ok(RGBColor(255, 0, 0)),
        "green" => Ok(RGBColor(0, 128, 0)),
        "blue" => Ok(RGBColor(0, 0, 255)),
        "yellow" => Ok(RGBColor(255, 255, 0)),
        "cyan" => Ok(RGBColor(0, 255, 255)),
        "magenta" => Ok(RGBColor(255, 0, 255)),
        "orange" => Ok(RGBColor(255, 165, 0)),
        "purple" => Ok(RGBColor(128, 0, 128)),
        "brown" => Ok(RGBColor(165, 42, 42)),
        "gray" | "grey" => Ok(RGBColor(128, 128, 128)),
        _ => Err(Error::Render(format!("unrecognized color '{name}'"))),
    }
}

fn parse_line_style(style: &str) -> Result<LineStyle> {
    match style.trim() {
        "" | "-" | "solid" => Ok(LineStyle::Solid),
        "--" | "dashed" => Ok(LineStyle::Dashed),
        ":" | "dotted" => Ok(LineStyle::Dotted),
        other => Err(Error::Render(format!("unsupported line style '{other}'"))),
    }
}

/// Resolves the marker option; scatter charts default to circles.
fn effective_marker(marker: &str, graph_type: GraphType) -> Result<Option<Marker>> {
    let marker = marker.trim();
    if marker.is_empty() {
        return Ok(match graph_type {
            GraphType::Scatter => Some(Marker::Circle),
            _ => None,
        });
    }
    match marker {
        "o" => Ok(Some(Marker::Circle)),
        "s" => Ok(Some(Marker::Square)),
        "x" | "+" => Ok(Some(Marker::Cross)),
        "^" => Ok(Some(Marker::Triangle)),
        other => Err(Error::Render(format!("unsupported marker '{other}'"))),
    }
}

fn parse_legend_loc(loc: &str) -> Result<SeriesLabelPosition> {
    match loc.trim().to_ascii_lowercase().as_str() {
        "best" | "upper right" => Ok(SeriesLabelPosition::UpperRight),
        "upper left" => Ok(SeriesLabelPosition::UpperLeft),
        "lower left" => Ok(SeriesLabelPosition::LowerLeft),
        "lower right" => Ok(SeriesLabelPosition::LowerRight),
        "right" | "center right" => Ok(SeriesLabelPosition::MiddleRight),
        "center left" => Ok(SeriesLabelPosition::MiddleLeft),
        "upper center" => Ok(SeriesLabelPosition::UpperMiddle),
        "lower center" => Ok(SeriesLabelPosition::LowerMiddle),
        "center" => Ok(SeriesLabelPosition::MiddleMiddle),
        other => Err(Error::Render(format!("unrecognized legend location '{other}'"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_types::SeriesKey;

    fn settings() -> PlotSettings {
        PlotSettings {
            xlabel: "x".into(),
            ylabel: "y".into(),
            title: "t".into(),
            legend_loc: "upper right".into(),
            legend_fontsize: 10,
            legend_title: String::new(),
            legend_title_fontsize: 10,
            legend_shadow: false,
            legend_frameon: true,
            grid: false,
            line_style: "-".into(),
            line_color: "blue".into(),
            line_width: 1,
            marker: String::new(),
        }
    }

    fn one_series(points: Vec<(f64, f64)>) -> Vec<NumericSeries> {
        vec![NumericSeries {
            key: SeriesKey {
                worksheet: "Sheet1".into(),
                x_index: 0,
                y_index: 1,
            },
            label: "Sheet1 (x0, y1)".into(),
            points,
        }]
    }

    #[test]
    fn colors_parse_by_name_and_hex() {
        assert_eq!(parse_color("blue").unwrap(), RGBColor(0, 0, 255));
        assert_eq!(parse_color(" Red ").unwrap(), RGBColor(255, 0, 0));
        assert_eq!(parse_color("#1e90ff").unwrap(), RGBColor(30, 144, 255));
        assert!(parse_color("chartreuse-ish").is_err());
        assert!(parse_color("#12345").is_err());
    }

    #[test]
    fn line_styles_and_markers_parse() {
        assert_eq!(parse_line_style("-").unwrap(), LineStyle::Solid);
        assert_eq!(parse_line_style("--").unwrap(), LineStyle::Dashed);
        assert_eq!(parse_line_style(":").unwrap(), LineStyle::Dotted);
        assert!(parse_line_style("-.").is_err());

        assert_eq!(
            effective_marker("", GraphType::Line).unwrap(),
            None
        );
        assert_eq!(
            effective_marker("", GraphType::Scatter).unwrap(),
            Some(Marker::Circle)
        );
        assert_eq!(
            effective_marker("s", GraphType::Line).unwrap(),
            Some(Marker::Square)
        );
        assert!(effective_marker("*", GraphType::Line).is_err());
    }

    #[test]
    fn legend_locations_cover_the_anchor_strings() {
        assert!(parse_legend_loc("best").is_ok());
        assert!(parse_legend_loc("Upper Left").is_ok());
        assert!(parse_legend_loc("lower center").is_ok());
        assert!(parse_legend_loc("nowhere").is_err());
    }

    #[test]
    fn axis_ranges_widen_degenerate_extents() {
        let series = one_series(vec![(2.0, 5.0)]);
        let (x, y) = axis_ranges(&series, GraphType::Line);
        assert_eq!(x, 1.0..3.0);
        assert_eq!(y, 4.0..6.0);
    }

    #[test]
    fn axis_ranges_default_when_there_are_no_points() {
        let (x, y) = axis_ranges(&[], GraphType::Line);
        assert_eq!(x, 0.0..1.0);
        assert_eq!(y, 0.0..1.0);
    }

    #[test]
    fn bar_ranges_include_the_zero_line() {
        let series = one_series(vec![(1.0, 3.0), (2.0, 5.0)]);
        let (x, y) = axis_ranges(&series, GraphType::Bar);
        assert!(y.start <= 0.0);
        assert!(x.start < 1.0 && x.end > 2.0);
    }

    #[test]
    fn render_commits_pixels_and_remembers_the_scene() {
        let mut surface = ChartSurface::new(160, 120);
        let series = one_series(vec![(1.0, 5.0), (2.0, 4.0), (3.0, 1.0)]);
        render(&mut surface, &series, GraphType::Line, &settings()).unwrap();
        assert!(surface.buffer().iter().any(|&byte| byte != 0xff));
        assert!(surface.scene().is_some());
    }

    #[test]
    fn invalid_color_fails_before_touching_the_surface() {
        let mut surface = ChartSurface::new(160, 120);
        let mut bad = settings();
        bad.line_color = "not-a-color".into();
        let series = one_series(vec![(1.0, 1.0)]);
        let err = render(&mut surface, &series, GraphType::Line, &bad).unwrap_err();
        assert!(matches!(err, Error::Render(_)));
        assert!(surface.buffer().iter().all(|&byte| byte == 0xff));
        assert!(surface.scene().is_none());
    }

    #[test]
    fn rendering_no_series_still_draws_the_empty_chart() {
        let mut surface = ChartSurface::new(160, 120);
        render(&mut surface, &[], GraphType::Line, &settings()).unwrap();
        assert!(surface.scene().is_some());
    }
}
