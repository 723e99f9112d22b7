use chrono::{DateTime, TimeZone, Utc};
use std::fmt::Display;

use super::domain::{ChartDomain, TimeRange};
use crate::vitals::ChartRow;

/// Padding applied above and below the data on the y-axis
pub const Y_PADDING: f64 = 2.0;

/// Format an x-axis tick: hour:minute for the 24h view, month/day otherwise
pub fn format_tick<Tz>(ms: f64, range: TimeRange, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let Some(utc) = DateTime::<Utc>::from_timestamp_millis(ms.round() as i64) else {
        return String::new();
    };
    let local = utc.with_timezone(tz);
    match range {
        TimeRange::Day => local.format("%-I:%M %p").to_string(),
        TimeRange::Week | TimeRange::Month => local.format("%b %-d").to_string(),
    }
}

/// `count` evenly spaced tick positions across the domain, edges included
pub fn ticks(domain: &ChartDomain, count: usize) -> Vec<f64> {
    match count {
        0 => Vec::new(),
        1 => vec![domain.start],
        _ => {
            let step = domain.span() / (count - 1) as f64;
            (0..count).map(|i| domain.start + step * i as f64).collect()
        }
    }
}

/// Auto-fit y domain: `[min - 2, max + 2]` over every plotted value
pub fn y_domain<'a, I>(rows: I) -> Option<(f64, f64)>
where
    I: IntoIterator<Item = &'a ChartRow>,
{
    rows.into_iter()
        .flat_map(|r| r.values())
        .filter(|v| v.is_finite())
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
        .map(|(lo, hi)| (lo - Y_PADDING, hi + Y_PADDING))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn ms(y: i32, m: u32, d: u32, h: u32, min: u32) -> f64 {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0)
            .unwrap()
            .timestamp_millis() as f64
    }

    #[test]
    fn test_format_tick_day_uses_clock_time() {
        assert_eq!(format_tick(ms(2024, 6, 3, 14, 5), TimeRange::Day, &Utc), "2:05 PM");
        assert_eq!(format_tick(ms(2024, 6, 3, 0, 30), TimeRange::Day, &Utc), "12:30 AM");
    }

    #[test]
    fn test_format_tick_multi_day_uses_month_day() {
        assert_eq!(format_tick(ms(2024, 6, 3, 14, 5), TimeRange::Week, &Utc), "Jun 3");
        assert_eq!(format_tick(ms(2024, 12, 25, 9, 0), TimeRange::Month, &Utc), "Dec 25");
    }

    #[test]
    fn test_ticks_include_edges() {
        let domain = ChartDomain::new(0.0, 100.0);
        assert_eq!(ticks(&domain, 5), vec![0.0, 25.0, 50.0, 75.0, 100.0]);
        assert_eq!(ticks(&domain, 1), vec![0.0]);
        assert!(ticks(&domain, 0).is_empty());
    }

    #[test]
    fn test_y_domain_padding() {
        let rows = [
            ChartRow::Scalar { timestamp: 0, value: 70.0 },
            ChartRow::Scalar { timestamp: 1, value: 90.0 },
        ];
        assert_eq!(y_domain(&rows), Some((68.0, 92.0)));
    }

    #[test]
    fn test_y_domain_spans_both_pressure_lines() {
        let rows = [ChartRow::BloodPressure {
            timestamp: 0,
            systolic: 130.0,
            diastolic: 85.0,
        }];
        assert_eq!(y_domain(&rows), Some((83.0, 132.0)));
    }

    #[test]
    fn test_y_domain_empty() {
        let rows: [ChartRow; 0] = [];
        assert_eq!(y_domain(&rows), None);
    }
}
