pub mod axis;
pub mod domain;
pub mod render;

pub use axis::{format_tick, ticks, y_domain};
pub use domain::{ChartDomain, ChartView, PanGesture, TimeRange, ZOOM_STEP};
pub use render::{render_chart, RenderOptions};
