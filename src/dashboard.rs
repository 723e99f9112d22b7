//! Dashboard session: the patient, the selected time range and vital, and
//! the chart view over the selected series.

use chrono::{DateTime, TimeZone, Utc};
use serde::Serialize;
use std::fmt::Display;
use tracing::info;

use crate::capture::NewVitalData;
use crate::chart::{render_chart, ChartView, RenderOptions, TimeRange};
use crate::patient::Patient;
use crate::vitals::{series, ChartRow, Measurement, Trend, VitalType};

/// Summary tile for one vital type
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VitalCard {
    pub vital: VitalType,
    pub value: String,
    pub unit: &'static str,
    pub trend: Trend,
    pub critical: bool,
    pub recorded_at: Option<DateTime<Utc>>,
}

impl VitalCard {
    pub fn title(&self) -> &'static str {
        self.vital.label()
    }
}

fn format_measurement(vital: VitalType, measurement: &Measurement) -> String {
    match (vital, measurement) {
        (_, Measurement::BloodPressure(bp)) => bp.to_string(),
        (VitalType::HeartRate, Measurement::Scalar(v)) => v.to_string(),
        (_, Measurement::Scalar(v)) => format!("{:.1}", v),
    }
}

pub struct Dashboard {
    patient: Patient,
    time_range: TimeRange,
    active_vital: VitalType,
    chart: ChartView,
}

impl Dashboard {
    pub fn new(patient: Patient, time_range: TimeRange) -> Self {
        let active_vital = VitalType::HeartRate;
        let rows = series::rows(&patient.vitals, active_vital);
        Self {
            chart: ChartView::with_rows(time_range, &rows),
            patient,
            time_range,
            active_vital,
        }
    }

    pub fn patient(&self) -> &Patient {
        &self.patient
    }

    pub fn time_range(&self) -> TimeRange {
        self.time_range
    }

    pub fn active_vital(&self) -> VitalType {
        self.active_vital
    }

    pub fn chart(&self) -> &ChartView {
        &self.chart
    }

    /// Zoom and pan controls act on this view
    pub fn chart_mut(&mut self) -> &mut ChartView {
        &mut self.chart
    }

    pub fn chart_rows(&self) -> Vec<ChartRow> {
        series::rows(&self.patient.vitals, self.active_vital)
    }

    fn reload_chart(&mut self) {
        let rows = self.chart_rows();
        self.chart.set_range(self.time_range, &rows);
    }

    /// Switch granularity; `patient` is the history generated for the new range
    pub fn set_time_range(&mut self, range: TimeRange, patient: Patient) {
        info!("Time range changed to {}", range);
        self.time_range = range;
        self.patient = patient;
        self.reload_chart();
    }

    pub fn select_vital(&mut self, vital: VitalType) {
        self.active_vital = vital;
        self.reload_chart();
    }

    /// Record a normalized capture at `at` across all four series
    pub fn add_new_vital(&mut self, entry: NewVitalData, at: DateTime<Utc>) {
        self.patient.vitals.record(at, &entry);
        info!("Added new vitals reading at {}", at);
        self.reload_chart();
    }

    pub fn card(&self, vital: VitalType) -> VitalCard {
        let history = &self.patient.vitals;
        let latest = history.latest(vital);
        VitalCard {
            vital,
            value: latest
                .as_ref()
                .map(|(_, m)| format_measurement(vital, m))
                .unwrap_or_else(|| "--".to_string()),
            unit: vital.unit(),
            trend: history.trend(vital),
            critical: history.is_latest_critical(vital),
            recorded_at: latest.map(|(at, _)| at),
        }
    }

    pub fn cards(&self) -> Vec<VitalCard> {
        VitalType::ALL.iter().map(|v| self.card(*v)).collect()
    }

    pub fn render_chart<Tz>(&self, options: RenderOptions, tz: &Tz) -> String
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        render_chart(&self.chart, &self.chart_rows(), self.active_vital, options, tz)
    }
}
