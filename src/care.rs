//! Caregiver log: meals, activities and medication reminders.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CareError {
    #[error("Please enter a description for the log entry.")]
    EmptyDescription,

    #[error("Medication, dosage and time are all required.")]
    IncompleteReminder,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogKind {
    Meal,
    Activity,
}

impl fmt::Display for LogKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Meal => "meal",
            Self::Activity => "activity",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyLogEntry {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub kind: LogKind,
    pub description: String,
    pub timestamp: DateTime<Utc>,
}

/// Meal and activity entries, newest first
#[derive(Debug, Clone, Default)]
pub struct DailyLog {
    entries: Vec<DailyLogEntry>,
}

impl DailyLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// A few entries from earlier in the day
    pub fn sample(now: DateTime<Utc>) -> Self {
        let mut log = Self::new();
        let seed = [
            (LogKind::Meal, "Oatmeal with berries for breakfast.", 10),
            (LogKind::Activity, "20-minute slow walk in the park.", 8),
            (LogKind::Meal, "Chicken soup and toast for lunch.", 5),
        ];
        for (kind, description, hours_ago) in seed {
            // Seed text is never blank
            let _ = log.add(kind, description, now - Duration::hours(hours_ago));
        }
        log
    }

    pub fn add(
        &mut self,
        kind: LogKind,
        description: &str,
        at: DateTime<Utc>,
    ) -> Result<&DailyLogEntry, CareError> {
        let description = description.trim();
        if description.is_empty() {
            return Err(CareError::EmptyDescription);
        }
        let entry = DailyLogEntry {
            id: Uuid::new_v4(),
            kind,
            description: description.to_string(),
            timestamp: at,
        };
        debug!("Logged {} at {}", kind, at);
        let pos = self
            .entries
            .iter()
            .position(|e| e.timestamp <= at)
            .unwrap_or(self.entries.len());
        self.entries.insert(pos, entry);
        Ok(&self.entries[pos])
    }

    pub fn entries(&self) -> &[DailyLogEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MedicationReminder {
    pub id: Uuid,
    pub medication: String,
    pub dosage: String,
    pub time: String,
}

/// Medication reminders in insertion order
#[derive(Debug, Clone, Default)]
pub struct MedicationSchedule {
    reminders: Vec<MedicationReminder>,
}

impl MedicationSchedule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sample() -> Self {
        let mut schedule = Self::new();
        let _ = schedule.add("Lisinopril", "10mg", "08:00 AM");
        let _ = schedule.add("Metformin", "500mg", "08:00 PM");
        schedule
    }

    pub fn add(
        &mut self,
        medication: &str,
        dosage: &str,
        time: &str,
    ) -> Result<&MedicationReminder, CareError> {
        let (medication, dosage, time) = (medication.trim(), dosage.trim(), time.trim());
        if medication.is_empty() || dosage.is_empty() || time.is_empty() {
            return Err(CareError::IncompleteReminder);
        }
        self.reminders.push(MedicationReminder {
            id: Uuid::new_v4(),
            medication: medication.to_string(),
            dosage: dosage.to_string(),
            time: time.to_string(),
        });
        Ok(&self.reminders[self.reminders.len() - 1])
    }

    pub fn reminders(&self) -> &[MedicationReminder] {
        &self.reminders
    }
}
