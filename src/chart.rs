use std::collections::BTreeMap;
use std::f64::consts::PI;

use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};

use crate::convert::format_date;
use crate::models::RatingChange;

pub const MIME_TYPE: &str = "image/svg+xml";

const WIDTH: u32 = 1200;
const HEIGHT: u32 = 700;
const FONT: &str = "sans-serif";

const PALETTE: [RGBColor; 10] = [
    RGBColor(31, 119, 180),
    RGBColor(255, 127, 14),
    RGBColor(44, 160, 44),
    RGBColor(214, 39, 40),
    RGBColor(148, 103, 189),
    RGBColor(140, 86, 75),
    RGBColor(227, 119, 194),
    RGBColor(127, 127, 127),
    RGBColor(188, 189, 34),
    RGBColor(23, 190, 207),
];
const GAIN: RGBColor = RGBColor(44, 160, 44);
const LOSS: RGBColor = RGBColor(214, 39, 40);
const RATING_LINE: RGBColor = RGBColor(70, 130, 180);

#[derive(Debug, thiserror::Error)]
#[error("failed to render chart: {0}")]
pub struct ChartError(String);

impl<E: std::error::Error + Send + Sync> From<DrawingAreaErrorKind<E>> for ChartError {
    fn from(e: DrawingAreaErrorKind<E>) -> Self {
        Self(e.to_string())
    }
}

fn color(i: usize) -> RGBColor {
    PALETTE[i % PALETTE.len()]
}

fn padded<T: Copy + Ord + std::ops::Sub<Output = T> + std::ops::Add<Output = T>>(
    values: impl Iterator<Item = T>,
    pad: T,
) -> Option<(T, T)> {
    let (lo, hi) = values.fold(None, |acc: Option<(T, T)>, v| match acc {
        None => Some((v, v)),
        Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
    })?;
    Some((lo - pad, hi + pad))
}

fn month_label(t: &i64) -> String {
    format_date(*t, "%b %Y")
}

/// Rating history with one line per handle. Handles without rating changes
/// are skipped.
pub fn rating_history(series: &[(String, Vec<&RatingChange>)]) -> Result<String, ChartError> {
    let points: Vec<(&str, Vec<(i64, i32)>)> = series
        .iter()
        .filter(|(_, changes)| !changes.is_empty())
        .map(|(handle, changes)| {
            let pts = changes
                .iter()
                .map(|c| (c.rating_update_time_seconds, c.new_rating))
                .collect();
            (handle.as_str(), pts)
        })
        .collect();

    let all = || points.iter().flat_map(|(_, pts)| pts.iter());
    let (x0, x1) = padded(all().map(|p| p.0), 86_400 * 15)
        .ok_or_else(|| ChartError("no rating data".into()))?;
    let (y0, y1) = padded(all().map(|p| p.1), 100).unwrap_or((0, 1));

    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, (WIDTH, HEIGHT)).into_drawing_area();
        root.fill(&WHITE)?;

        let mut chart = ChartBuilder::on(&root)
            .caption("Codeforces Rating History", (FONT, 28))
            .margin(20)
            .x_label_area_size(50)
            .y_label_area_size(60)
            .build_cartesian_2d(x0..x1, y0..y1)?;

        chart
            .configure_mesh()
            .x_desc("Date")
            .y_desc("Rating")
            .x_label_formatter(&month_label)
            .x_labels(12)
            .draw()?;

        for (i, (handle, pts)) in points.iter().enumerate() {
            let c = color(i);
            chart
                .draw_series(LineSeries::new(pts.iter().copied(), c.stroke_width(2)))?
                .label(*handle)
                .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], c.stroke_width(2)));
            chart.draw_series(pts.iter().map(|&p| Circle::new(p, 3, c.filled())))?;
        }

        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperLeft)
            .background_style(&WHITE.mix(0.8))
            .border_style(&BLACK)
            .draw()?;

        root.present()?;
    }
    Ok(svg)
}

/// Rating line on top, per-contest rating deltas as bars underneath.
pub fn performance(handle: &str, changes: &[&RatingChange]) -> Result<String, ChartError> {
    let (x0, x1) = padded(changes.iter().map(|c| c.rating_update_time_seconds), 86_400 * 15)
        .ok_or_else(|| ChartError("no rating data".into()))?;
    let (y0, y1) = padded(changes.iter().map(|c| c.new_rating), 100).unwrap_or((0, 1));
    let (d0, d1) = padded(changes.iter().map(|c| c.delta()), 20).unwrap_or((-1, 1));
    let (d0, d1) = (d0.min(-20), d1.max(20));
    let half_bar = 86_400 * 5;

    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, (WIDTH, HEIGHT)).into_drawing_area();
        root.fill(&WHITE)?;
        let root = root.titled(
            &format!("Rating and Performance History for {handle}"),
            (FONT, 28),
        )?;
        let panels = root.split_evenly((2, 1));

        let mut top = ChartBuilder::on(&panels[0])
            .margin(15)
            .x_label_area_size(30)
            .y_label_area_size(60)
            .build_cartesian_2d(x0..x1, y0..y1)?;
        top.configure_mesh()
            .y_desc("Rating")
            .x_label_formatter(&month_label)
            .draw()?;
        top.draw_series(LineSeries::new(
            changes.iter().map(|c| (c.rating_update_time_seconds, c.new_rating)),
            RATING_LINE.stroke_width(2),
        ))?;
        top.draw_series(
            changes
                .iter()
                .map(|c| Circle::new((c.rating_update_time_seconds, c.new_rating), 3, RATING_LINE.filled())),
        )?;

        let mut bottom = ChartBuilder::on(&panels[1])
            .margin(15)
            .x_label_area_size(40)
            .y_label_area_size(60)
            .build_cartesian_2d(x0..x1, d0..d1)?;
        bottom
            .configure_mesh()
            .x_desc("Date")
            .y_desc("Rating Change")
            .x_label_formatter(&month_label)
            .draw()?;
        bottom.draw_series(changes.iter().map(|c| {
            let t = c.rating_update_time_seconds;
            let fill = if c.delta() >= 0 { GAIN } else { LOSS };
            Rectangle::new([(t - half_bar, 0), (t + half_bar, c.delta())], fill.mix(0.7).filled())
        }))?;
        bottom.draw_series(LineSeries::new([(x0, 0), (x1, 0)], BLACK.mix(0.5).stroke_width(1)))?;

        root.present()?;
    }
    Ok(svg)
}

/// Bars of solved problem counts per rating bin.
pub fn rating_distribution(
    handle: &str,
    bins: &BTreeMap<i32, usize>,
    bin_size: i32,
) -> Result<String, ChartError> {
    let (&first, _) = bins
        .first_key_value()
        .ok_or_else(|| ChartError("no rated problems".into()))?;
    let last = bins.keys().next_back().copied().unwrap_or(first);
    let max_count = bins.values().copied().max().unwrap_or(0) as i32;

    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, (WIDTH, HEIGHT)).into_drawing_area();
        root.fill(&WHITE)?;

        let mut chart = ChartBuilder::on(&root)
            .caption(format!("Solved Problem Rating Distribution for {handle}"), (FONT, 28))
            .margin(20)
            .x_label_area_size(50)
            .y_label_area_size(60)
            .build_cartesian_2d(first..last + bin_size, 0..max_count + 1)?;

        chart
            .configure_mesh()
            .x_desc("Problem Rating")
            .y_desc("Number of Problems Solved")
            .draw()?;

        chart.draw_series(bins.iter().map(|(&r, &c)| {
            Rectangle::new([(r, 0), (r + bin_size, c as i32)], PALETTE[0].mix(0.8).filled())
        }))?;
        chart.draw_series(bins.iter().map(|(&r, &c)| {
            Rectangle::new([(r, 0), (r + bin_size, c as i32)], BLACK.stroke_width(1))
        }))?;

        root.present()?;
    }
    Ok(svg)
}

/// Horizontal bars, largest first from the top.
pub fn horizontal_bars(title: &str, x_desc: &str, items: &[(String, usize)]) -> Result<String, ChartError> {
    if items.is_empty() {
        return Err(ChartError("nothing to plot".into()));
    }
    let max_count = items.iter().map(|(_, c)| *c as u32).max().unwrap_or(0);
    let n = items.len();

    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, (WIDTH, HEIGHT)).into_drawing_area();
        root.fill(&WHITE)?;

        let mut chart = ChartBuilder::on(&root)
            .caption(title, (FONT, 28))
            .margin(20)
            .x_label_area_size(50)
            .y_label_area_size(220)
            .build_cartesian_2d(0u32..max_count + 1, (0usize..n).into_segmented())?;

        chart
            .configure_mesh()
            .disable_y_mesh()
            .x_desc(x_desc)
            .y_labels(n)
            .y_label_formatter(&|v| match v {
                // Row 0 is drawn at the bottom, so index from the end.
                SegmentValue::CenterOf(i) if *i < n => items[n - 1 - i].0.clone(),
                _ => String::new(),
            })
            .draw()?;

        chart.draw_series(
            Histogram::horizontal(&chart)
                .style(PALETTE[0].mix(0.8).filled())
                .margin(4)
                .data(items.iter().enumerate().map(|(i, (_, c))| (n - 1 - i, *c as u32))),
        )?;

        root.present()?;
    }
    Ok(svg)
}

/// Pie chart with percentage labels and a legend.
pub fn pie(title: &str, slices: &[(String, usize)]) -> Result<String, ChartError> {
    let total: usize = slices.iter().map(|(_, c)| c).sum();
    if total == 0 {
        return Err(ChartError("nothing to plot".into()));
    }

    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, (WIDTH, HEIGHT)).into_drawing_area();
        root.fill(&WHITE)?;
        let root = root.titled(title, (FONT, 28))?;
        draw_pie(&root, slices, total)?;
        root.present()?;
    }
    Ok(svg)
}

fn draw_pie<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    slices: &[(String, usize)],
    total: usize,
) -> Result<(), DrawingAreaErrorKind<DB::ErrorType>> {
    let (w, h) = area.dim_in_pixel();
    let radius = f64::from(h.min(w)) * 0.38;
    let (cx, cy) = (f64::from(w) * 0.38, f64::from(h) * 0.5);

    let center_label = (FONT, 16)
        .into_font()
        .color(&WHITE)
        .pos(Pos::new(HPos::Center, VPos::Center));

    // Start at 12 o'clock, clockwise.
    let mut angle = -PI / 2.0;
    for (i, (_, count)) in slices.iter().enumerate() {
        let share = *count as f64 / total as f64;
        let sweep = share * 2.0 * PI;
        let steps = ((sweep / (PI / 90.0)).ceil() as usize).max(1);

        let mut points = Vec::with_capacity(steps + 2);
        points.push((cx as i32, cy as i32));
        for s in 0..=steps {
            let a = angle + sweep * s as f64 / steps as f64;
            points.push(((cx + radius * a.cos()) as i32, (cy + radius * a.sin()) as i32));
        }
        area.draw(&Polygon::new(points, color(i).filled()))?;

        if share >= 0.03 {
            let mid = angle + sweep / 2.0;
            let at = (
                (cx + radius * 0.7 * mid.cos()) as i32,
                (cy + radius * 0.7 * mid.sin()) as i32,
            );
            area.draw(&Text::new(format!("{:.1}%", share * 100.0), at, center_label.clone()))?;
        }
        angle += sweep;
    }

    let legend_x = (cx + radius + 60.0) as i32;
    let mut legend_y = (cy - radius) as i32;
    for (i, (label, count)) in slices.iter().enumerate() {
        area.draw(&Rectangle::new(
            [(legend_x, legend_y), (legend_x + 16, legend_y + 16)],
            color(i).filled(),
        ))?;
        area.draw(&Text::new(
            format!("{label} ({count})"),
            (legend_x + 24, legend_y + 2),
            (FONT, 16).into_font(),
        ))?;
        legend_y += 28;
    }
    Ok(())
}
