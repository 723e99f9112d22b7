//! Terminal rendering of the vitals line chart.

use chrono::TimeZone;
use std::fmt::{Display, Write};

use super::axis::{format_tick, ticks, y_domain};
use super::domain::{ChartDomain, ChartView};
use crate::vitals::{ChartRow, VitalType};

const Y_LABEL_WIDTH: usize = 7;
const SERIES_GLYPHS: [char; 2] = ['*', 'o'];

/// Plot dimensions in character cells
#[derive(Debug, Clone, Copy)]
pub struct RenderOptions {
    pub width: usize,
    pub height: usize,
    pub x_ticks: usize,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            width: 60,
            height: 12,
            x_ticks: 4,
        }
    }
}

/// Draw the rows that fall inside the view's visible domain.
///
/// Empty or single-point datasets render a flat frame with a "No data" notice.
pub fn render_chart<Tz>(
    view: &ChartView,
    rows: &[ChartRow],
    vital: VitalType,
    options: RenderOptions,
    tz: &Tz,
) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let width = options.width.max(2);
    let height = options.height.max(2);
    let mut out = String::new();
    let _ = writeln!(out, "{} - {}", vital, view.range().label());

    let (Some(visible), Some((y_lo, y_hi))) = (view.visible(), y_domain(rows)) else {
        render_empty(&mut out, width, height);
        return out;
    };

    let mut grid = vec![vec![' '; width]; height];
    let series_count = if vital == VitalType::BloodPressure { 2 } else { 1 };
    for series in 0..series_count {
        let points: Vec<(f64, f64)> = rows
            .iter()
            .filter(|r| visible.contains(r.timestamp_ms() as f64))
            .filter_map(|r| {
                let value = r.values().nth(series)?;
                Some((
                    to_column(r.timestamp_ms() as f64, &visible, width),
                    to_row(value, y_lo, y_hi, height),
                ))
            })
            .collect();
        plot_series(&mut grid, &points, SERIES_GLYPHS[series]);
    }

    for (i, line) in grid.iter().enumerate() {
        let label = if i == 0 {
            format!("{:>w$.1}", y_hi, w = Y_LABEL_WIDTH)
        } else if i == height - 1 {
            format!("{:>w$.1}", y_lo, w = Y_LABEL_WIDTH)
        } else if i == height / 2 {
            format!("{:>w$.1}", (y_hi + y_lo) / 2.0, w = Y_LABEL_WIDTH)
        } else {
            " ".repeat(Y_LABEL_WIDTH)
        };
        let _ = writeln!(out, "{} |{}", label, line.iter().collect::<String>());
    }
    let _ = writeln!(out, "{} +{}", " ".repeat(Y_LABEL_WIDTH), "-".repeat(width));
    let _ = writeln!(
        out,
        "{}  {}",
        " ".repeat(Y_LABEL_WIDTH),
        tick_line(&visible, view, width, options.x_ticks, tz)
    );
    let _ = writeln!(out, "{}", legend(vital));
    out
}

fn render_empty(out: &mut String, width: usize, height: usize) {
    let notice = "No data";
    for i in 0..height {
        let body = if i == height / 2 {
            let pad = width.saturating_sub(notice.len()) / 2;
            format!("{}{}{}", " ".repeat(pad), notice, " ".repeat(width.saturating_sub(pad + notice.len())))
        } else {
            " ".repeat(width)
        };
        let _ = writeln!(out, "{} |{}", " ".repeat(Y_LABEL_WIDTH), body);
    }
    let _ = writeln!(out, "{} +{}", " ".repeat(Y_LABEL_WIDTH), "-".repeat(width));
}

fn to_column(ms: f64, domain: &ChartDomain, width: usize) -> f64 {
    let span = domain.span();
    if span <= 0.0 {
        return 0.0;
    }
    ((ms - domain.start) / span * (width - 1) as f64).clamp(0.0, (width - 1) as f64)
}

fn to_row(value: f64, lo: f64, hi: f64, height: usize) -> f64 {
    let span = hi - lo;
    if span <= 0.0 {
        return (height / 2) as f64;
    }
    ((hi - value) / span * (height - 1) as f64).clamp(0.0, (height - 1) as f64)
}

fn plot_series(grid: &mut [Vec<char>], points: &[(f64, f64)], glyph: char) {
    for pair in points.windows(2) {
        let ((c0, r0), (c1, r1)) = (pair[0], pair[1]);
        let (start, end) = (c0.round() as usize, c1.round() as usize);
        for col in start..=end {
            let t = if end > start {
                (col - start) as f64 / (end - start) as f64
            } else {
                0.0
            };
            let row = (r0 + (r1 - r0) * t).round() as usize;
            put(grid, row, col, glyph);
        }
    }
    if let [(c, r)] = points {
        put(grid, r.round() as usize, c.round() as usize, glyph);
    }
}

fn put(grid: &mut [Vec<char>], row: usize, col: usize, glyph: char) {
    if let Some(cell) = grid.get_mut(row).and_then(|line| line.get_mut(col)) {
        if *cell == ' ' {
            *cell = glyph;
        }
    }
}

fn tick_line<Tz>(visible: &ChartDomain, view: &ChartView, width: usize, count: usize, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let mut line = vec![' '; width + 12];
    for ms in ticks(visible, count) {
        let label = format_tick(ms, view.range(), tz);
        let col = to_column(ms, visible, width).round() as usize;
        let start = col.saturating_sub(label.chars().count() / 2);
        for (i, ch) in label.chars().enumerate() {
            if let Some(cell) = line.get_mut(start + i) {
                *cell = ch;
            }
        }
    }
    line.into_iter().collect::<String>().trim_end().to_string()
}

fn legend(vital: VitalType) -> String {
    match vital {
        VitalType::BloodPressure => format!(
            "  {} Systolic  {} Diastolic ({})",
            SERIES_GLYPHS[0],
            SERIES_GLYPHS[1],
            vital.unit()
        ),
        other => format!("  {} {} ({})", SERIES_GLYPHS[0], other, other.unit()),
    }
}
