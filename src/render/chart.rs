//! PNG backend for the chart spec.

use crate::Result;
use crate::render::{ChartSpec, Panel};

use plotters::coord::Shift;
use plotters::prelude::*;
use std::path::Path;

const WIDTH: u32 = 1600;
const HEIGHT: u32 = 1000;
/// Left strip reserved for the run-summary annotation block.
const ANNOTATION_WIDTH: i32 = 280;

const SERIES_COLORS: [RGBColor; 6] = [RED, BLUE, GREEN, MAGENTA, CYAN, BLACK];

/// Draw the whole figure: title, annotation column, stacked panels.
pub fn draw_png(spec: &ChartSpec, path: &Path) -> Result<()> {
    let root = BitMapBackend::new(path, (WIDTH, HEIGHT)).into_drawing_area();
    root.fill(&WHITE)?;
    let titled = root.titled(&spec.title, ("sans-serif", 28))?;

    let (annotations, panel_strip) = titled.split_horizontally(ANNOTATION_WIDTH);
    draw_annotations(&annotations, &spec.annotations)?;

    let areas = panel_strip.split_evenly((spec.panels.len(), 1));
    for (panel, area) in spec.panels.iter().zip(areas.iter()) {
        draw_panel(panel, area)?;
    }

    root.present()?;
    Ok(())
}

fn draw_annotations(
    area: &DrawingArea<BitMapBackend<'_>, Shift>,
    lines: &[String],
) -> Result<()> {
    for (i, line) in lines.iter().enumerate() {
        let size = if i == 0 { 20 } else { 16 };
        area.draw(&Text::new(
            line.clone(),
            (10, 40 + i as i32 * 26),
            ("sans-serif", size).into_font(),
        ))?;
    }
    Ok(())
}

fn draw_panel(panel: &Panel, area: &DrawingArea<BitMapBackend<'_>, Shift>) -> Result<()> {
    let x_max = panel
        .series
        .iter()
        .flat_map(|s| s.points.iter().map(|p| p.0))
        .max()
        .unwrap_or(1)
        .max(1) as f64;
    let y_max = panel
        .series
        .iter()
        .flat_map(|s| s.points.iter().map(|p| p.1))
        .fold(f64::MIN, f64::max)
        .max(1.0)
        * 1.05;

    let mut chart = ChartBuilder::on(area)
        .caption(&panel.title, ("sans-serif", 22))
        .margin(10)
        .x_label_area_size(36)
        .y_label_area_size(64)
        .build_cartesian_2d(0.0..x_max, 0.0..y_max)?;

    let mut mesh = chart.configure_mesh();
    mesh.y_desc(panel.y_label);
    if let Some(x_label) = panel.x_label {
        mesh.x_desc(x_label);
    }
    mesh.draw()?;

    for (i, series) in panel.series.iter().enumerate() {
        let color = SERIES_COLORS[i % SERIES_COLORS.len()];
        let points: Vec<(f64, f64)> = series
            .points
            .iter()
            .map(|&(s, v)| (s as f64, v))
            .collect();

        chart
            .draw_series(LineSeries::new(points.clone(), &color))?
            .label(&series.label)
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));
        chart.draw_series(points.iter().map(|&p| Circle::new(p, 3, color.filled())))?;
    }

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;

    Ok(())
}
