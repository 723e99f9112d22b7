//! Visible time domain of the vitals chart with zoom and pan.
//!
//! `initial` is the full data extent of the loaded dataset; `visible` is the
//! current window and always stays inside `initial`. When the dataset has
//! fewer than two distinct timestamps there is no domain and every operation
//! is a no-op.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

use crate::vitals::ChartRow;

/// Fraction of the visible span moved per zoom step, per edge
pub const ZOOM_STEP: f64 = 0.2;

const HOUR_MS: f64 = 60.0 * 60.0 * 1000.0;
const DAY_MS: f64 = 24.0 * HOUR_MS;

/// Time range granularity of the dashboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TimeRange {
    #[default]
    #[serde(rename = "24h")]
    Day,
    #[serde(rename = "7d")]
    Week,
    #[serde(rename = "30d")]
    Month,
}

impl TimeRange {
    pub const ALL: [TimeRange; 3] = [TimeRange::Day, TimeRange::Week, TimeRange::Month];

    /// Smallest visible span zoom-in may produce
    pub fn min_zoom_span_ms(&self) -> f64 {
        match self {
            Self::Day => HOUR_MS,
            Self::Week | Self::Month => DAY_MS,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Day => "Last 24 Hours",
            Self::Week => "Last 7 Days",
            Self::Month => "Last 30 Days",
        }
    }

    /// Number of samples and spacing used when generating a dataset
    pub fn sampling(&self) -> (usize, chrono::Duration) {
        match self {
            Self::Day => (24, chrono::Duration::hours(1)),
            Self::Week => (7, chrono::Duration::days(1)),
            Self::Month => (30, chrono::Duration::days(1)),
        }
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Day => "24h",
            Self::Week => "7d",
            Self::Month => "30d",
        })
    }
}

impl std::str::FromStr for TimeRange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "24h" | "day" => Ok(Self::Day),
            "7d" | "week" => Ok(Self::Week),
            "30d" | "month" => Ok(Self::Month),
            _ => Err(format!("Unknown time range: {} (expected 24h, 7d or 30d)", s)),
        }
    }
}

/// Closed interval of epoch milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChartDomain {
    pub start: f64,
    pub end: f64,
}

impl ChartDomain {
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    pub fn span(&self) -> f64 {
        self.end - self.start
    }

    pub fn contains(&self, ms: f64) -> bool {
        ms >= self.start && ms <= self.end
    }

    /// True when `other` lies entirely inside this domain
    pub fn encloses(&self, other: &ChartDomain) -> bool {
        other.start >= self.start && other.end <= self.end
    }

    fn shifted(&self, delta: f64) -> Self {
        Self::new(self.start + delta, self.end + delta)
    }
}

/// Zoom/pan state of the chart for the active dataset
#[derive(Debug, Clone, PartialEq)]
pub struct ChartView {
    range: TimeRange,
    initial: Option<ChartDomain>,
    visible: Option<ChartDomain>,
}

impl ChartView {
    pub fn new(range: TimeRange) -> Self {
        Self {
            range,
            initial: None,
            visible: None,
        }
    }

    /// Create a view already loaded with `rows`
    pub fn with_rows(range: TimeRange, rows: &[ChartRow]) -> Self {
        let mut view = Self::new(range);
        view.load(rows);
        view
    }

    pub fn range(&self) -> TimeRange {
        self.range
    }

    pub fn initial(&self) -> Option<ChartDomain> {
        self.initial
    }

    pub fn visible(&self) -> Option<ChartDomain> {
        self.visible
    }

    pub fn is_interactive(&self) -> bool {
        self.initial.is_some()
    }

    /// Adopt a new dataset: recompute the full extent and reset the window
    pub fn load(&mut self, rows: &[ChartRow]) {
        self.initial = match (rows.first(), rows.last()) {
            (Some(first), Some(last)) if last.timestamp_ms() > first.timestamp_ms() => Some(
                ChartDomain::new(first.timestamp_ms() as f64, last.timestamp_ms() as f64),
            ),
            _ => None,
        };
        self.visible = self.initial;
        debug!("Chart loaded {} rows, domain {:?}", rows.len(), self.initial);
    }

    /// Change granularity and adopt the dataset generated for it
    pub fn set_range(&mut self, range: TimeRange, rows: &[ChartRow]) {
        self.range = range;
        self.load(rows);
    }

    /// Shrink the window by `ZOOM_STEP` from each edge. Refused when the
    /// result would be narrower than the range's minimum span.
    pub fn zoom_in(&mut self) -> bool {
        let Some(visible) = self.visible else {
            return false;
        };
        let span = visible.span();
        let next = ChartDomain::new(visible.start + span * ZOOM_STEP, visible.end - span * ZOOM_STEP);
        if next.span() < self.range.min_zoom_span_ms() {
            debug!("Zoom in refused: span {} below minimum", next.span());
            return false;
        }
        self.visible = Some(next);
        true
    }

    /// Grow the window by `ZOOM_STEP` from each edge, clamped to the full extent
    pub fn zoom_out(&mut self) -> bool {
        let (Some(visible), Some(initial)) = (self.visible, self.initial) else {
            return false;
        };
        let span = visible.span();
        let next = ChartDomain::new(
            (visible.start - span * ZOOM_STEP).max(initial.start),
            (visible.end + span * ZOOM_STEP).min(initial.end),
        );
        self.replace_visible(next)
    }

    /// Restore the full extent
    pub fn reset(&mut self) -> bool {
        match self.initial {
            Some(initial) => self.replace_visible(initial),
            None => false,
        }
    }

    /// Start a drag gesture at pixel `x` on a plot `width_px` wide.
    /// The gesture ends when the returned guard is dropped.
    pub fn begin_pan(&mut self, x: f64, width_px: f64) -> PanGesture<'_> {
        let anchor = self.visible;
        PanGesture {
            view: self,
            start_x: x,
            width_px,
            anchor,
        }
    }

    /// Convenience for a complete drag from `from_x` to `to_x`
    pub fn pan_by(&mut self, from_x: f64, to_x: f64, width_px: f64) -> bool {
        let mut gesture = self.begin_pan(from_x, width_px);
        gesture.drag_to(to_x)
    }

    fn replace_visible(&mut self, next: ChartDomain) -> bool {
        let changed = self.visible != Some(next);
        self.visible = Some(next);
        changed
    }
}

/// An in-progress drag. Holds the domain snapshot taken at drag start.
pub struct PanGesture<'a> {
    view: &'a mut ChartView,
    start_x: f64,
    width_px: f64,
    anchor: Option<ChartDomain>,
}

impl PanGesture<'_> {
    /// Move the pointer to `x`. Dragging right reveals earlier time.
    pub fn drag_to(&mut self, x: f64) -> bool {
        let (Some(anchor), Some(initial)) = (self.anchor, self.view.initial) else {
            return false;
        };
        if !(self.width_px > 0.0) {
            return false;
        }

        let dx = x - self.start_x;
        let time_shift = dx * (anchor.span() / self.width_px);
        let mut next = anchor.shifted(-time_shift);

        // Translate rigidly back inside the extent so the width is preserved
        if next.start < initial.start {
            next = next.shifted(initial.start - next.start);
        }
        if next.end > initial.end {
            next = next.shifted(initial.end - next.end);
        }

        self.view.replace_visible(next)
    }

    pub fn visible(&self) -> Option<ChartDomain> {
        self.view.visible
    }
}

impl Drop for PanGesture<'_> {
    fn drop(&mut self) {
        debug!("Pan gesture released at {:?}", self.view.visible);
    }
}
