pub mod aggregator;
pub mod series;
pub mod store;
pub mod types;

pub use aggregator::{is_critical, trend, Trend};
pub use series::ChartRow;
pub use store::{ReadingStore, VitalsHistory};
pub use types::{BloodPressure, Measurement, NormalRange, PrimaryValue, Reading, VitalType};
