//! Weather history for skycheck.
//!
//! Stores successful readings in SQLite (deduplicated on date, place,
//! temperature and description) and derives health alerts from them.

pub mod alerts;
pub mod client;
pub mod demo;
pub mod record;
pub mod recorder;
pub mod store;

pub use alerts::{AlertMessages, AlertRule, AlertRuleEngine, EnglishMessages, HealthAlert, CATALOG};
pub use client::{HistoryClient, HistoryEntry};
pub use demo::demo_records;
pub use record::{NewTemperatureRecord, TemperatureRecord, DATE_FORMAT};
pub use recorder::{Clock, FixedClock, HistoryRecorder, SystemClock};
pub use store::{HistoryError, HistoryResult, HistoryStore, InsertOutcome, SqliteHistoryStore};
