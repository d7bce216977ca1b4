//! History entry types.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use skycheck_weather::{QueryOrigin, WeatherReading};

/// Calendar date format stored in the `date` column.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// One persisted weather observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemperatureRecord {
    pub id: i64,
    pub date: String,
    pub place_name: String,
    pub description: String,
    pub temperature_c: f64,
    pub humidity_pct: i32,
    pub pressure_hpa: i32,
    pub is_local_origin: bool,
    pub captured_at_ms: i64,
}

/// A record that has not been stored yet (no id).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTemperatureRecord {
    pub date: String,
    pub place_name: String,
    pub description: String,
    pub temperature_c: f64,
    pub humidity_pct: i32,
    pub pressure_hpa: i32,
    pub is_local_origin: bool,
    pub captured_at_ms: i64,
}

impl NewTemperatureRecord {
    /// Build a record from a published reading.
    pub fn from_reading(
        reading: &WeatherReading,
        origin: QueryOrigin,
        date: NaiveDate,
        captured_at_ms: i64,
    ) -> Self {
        Self {
            date: date.format(DATE_FORMAT).to_string(),
            place_name: reading.place_name.clone(),
            description: reading.description.clone(),
            temperature_c: reading.temperature_c,
            humidity_pct: reading.humidity_pct,
            pressure_hpa: reading.pressure_hpa,
            is_local_origin: origin.is_local(),
            captured_at_ms,
        }
    }

    pub(crate) fn into_record(self, id: i64) -> TemperatureRecord {
        TemperatureRecord {
            id,
            date: self.date,
            place_name: self.place_name,
            description: self.description,
            temperature_c: self.temperature_c,
            humidity_pct: self.humidity_pct,
            pressure_hpa: self.pressure_hpa,
            is_local_origin: self.is_local_origin,
            captured_at_ms: self.captured_at_ms,
        }
    }
}

impl TemperatureRecord {
    /// Whether two records share the uniqueness key
    /// `(date, place_name, temperature_c, description)`.
    pub fn same_key(&self, other: &NewTemperatureRecord) -> bool {
        self.date == other.date
            && self.place_name == other.place_name
            && self.temperature_c == other.temperature_c
            && self.description == other.description
    }
}
