//! Demo history used to keep a fresh install showing something on the health screen.

use crate::record::NewTemperatureRecord;

struct DemoRow {
    date: &'static str,
    place: &'static str,
    description: &'static str,
    temperature_c: f64,
    humidity_pct: i32,
    pressure_hpa: i32,
}

const DEMO_ROWS: &[DemoRow] = &[
    DemoRow {
        date: "2024-10-01",
        place: "Healthy City",
        description: "Clear Skies",
        temperature_c: 22.0,
        humidity_pct: 40,
        pressure_hpa: 1013,
    },
    DemoRow {
        date: "2024-10-02",
        place: "Healthy City",
        description: "Clear Skies",
        temperature_c: 22.0,
        humidity_pct: 40,
        pressure_hpa: 1013,
    },
    DemoRow {
        date: "2023-11-03",
        place: "Cold City",
        description: "Very Cold",
        temperature_c: -5.0,
        humidity_pct: 20,
        pressure_hpa: 1000,
    },
    DemoRow {
        date: "2021-12-02",
        place: "Moderate City",
        description: "Chilly with low humidity",
        temperature_c: 8.0,
        humidity_pct: 25,
        pressure_hpa: 1005,
    },
    DemoRow {
        date: "2024-10-03",
        place: "Hot City",
        description: "Very hot and humid",
        temperature_c: 42.0,
        humidity_pct: 75,
        pressure_hpa: 1015,
    },
    DemoRow {
        date: "2024-10-04",
        place: "Warm City",
        description: "Warm and moderate",
        temperature_c: 25.0,
        humidity_pct: 50,
        pressure_hpa: 1010,
    },
    DemoRow {
        date: "2024-10-05",
        place: "Humid City",
        description: "Moderate temperature with high humidity",
        temperature_c: 23.0,
        humidity_pct: 80,
        pressure_hpa: 900,
    },
    DemoRow {
        date: "2024-10-05",
        place: "High Pressure City",
        description: "Moderate temperature with high humidity",
        temperature_c: 23.0,
        humidity_pct: 80,
        pressure_hpa: 1066,
    },
];

/// Demo records stamped with `captured_at_ms`.
pub fn demo_records(captured_at_ms: i64) -> Vec<NewTemperatureRecord> {
    DEMO_ROWS
        .iter()
        .map(|row| NewTemperatureRecord {
            date: row.date.to_string(),
            place_name: row.place.to_string(),
            description: row.description.to_string(),
            temperature_c: row.temperature_c,
            humidity_pct: row.humidity_pct,
            pressure_hpa: row.pressure_hpa,
            is_local_origin: false,
            captured_at_ms,
        })
        .collect()
}
