//! Persists successful weather fetches.

use chrono::{Local, NaiveDate, Utc};
use skycheck_weather::{Observable, QueryOrigin, Subscription, WeatherReading, WeatherUiState};
use std::sync::Arc;

use crate::client::HistoryClient;
use crate::record::NewTemperatureRecord;
use crate::store::{HistoryResult, InsertOutcome};

/// Source of the calendar date and capture time stamped on new records.
pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
    fn now_millis(&self) -> i64;
}

/// Wall clock: local calendar date, UTC epoch milliseconds.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }

    fn now_millis(&self) -> i64 {
        Utc::now().timestamp_millis()
    }
}

/// Clock frozen at one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    pub date: NaiveDate,
    pub millis: i64,
}

impl FixedClock {
    pub fn new(date: NaiveDate, millis: i64) -> Self {
        Self { date, millis }
    }
}

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.date
    }

    fn now_millis(&self) -> i64 {
        self.millis
    }
}

/// Maps `Success` transitions to history inserts.
#[derive(Clone)]
pub struct HistoryRecorder {
    history: HistoryClient,
    clock: Arc<dyn Clock>,
}

impl HistoryRecorder {
    pub fn new(history: HistoryClient, clock: Arc<dyn Clock>) -> Self {
        Self { history, clock }
    }

    /// Store one reading. A natural-key duplicate returns `Duplicate`, not an error.
    pub fn record(
        &self,
        reading: &WeatherReading,
        origin: QueryOrigin,
    ) -> HistoryResult<InsertOutcome> {
        let record = NewTemperatureRecord::from_reading(
            reading,
            origin,
            self.clock.today(),
            self.clock.now_millis(),
        );
        self.history.insert(&record)
    }

    /// Record every `Success` published on `state` until the subscription drops.
    ///
    /// Inserts run inline on the publishing thread, so writes land in
    /// publication order.
    pub fn observe(&self, state: &Observable<WeatherUiState>) -> Subscription {
        let recorder = self.clone();
        state.subscribe(move |s| {
            if let WeatherUiState::Success { reading, origin } = s {
                if let Err(e) = recorder.record(reading, *origin) {
                    tracing::warn!("Failed to record history for {}: {}", reading.place_name, e);
                }
            }
        })
    }
}

impl std::fmt::Debug for HistoryRecorder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HistoryRecorder").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;
    use crate::store::SqliteHistoryStore;
    use skycheck_weather::FetchError;

    fn reading(place: &str, temp: f64) -> WeatherReading {
        WeatherReading {
            place_name: place.into(),
            temperature_c: temp,
            humidity_pct: 50,
            pressure_hpa: 1010,
            description: "Clear Sky".into(),
            icon_code: "01d".into(),
        }
    }

    fn recorder() -> (HistoryRecorder, HistoryClient) {
        let history = HistoryClient::new(SqliteHistoryStore::in_memory().unwrap());
        let clock = FixedClock::new(NaiveDate::from_ymd_opt(2024, 10, 1).unwrap(), 1_727_740_800_000);
        (HistoryRecorder::new(history.clone(), Arc::new(clock)), history)
    }

    #[test]
    fn test_record_uses_clock() {
        let (recorder, history) = recorder();
        recorder.record(&reading("Tokyo", 20.0), QueryOrigin::Device).unwrap();

        let stored = history.records_blocking().unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].date, "2024-10-01");
        assert_eq!(stored[0].captured_at_ms, 1_727_740_800_000);
        assert!(stored[0].is_local_origin);
    }

    #[test]
    fn test_repeat_reading_is_duplicate() {
        let (recorder, history) = recorder();
        let r = reading("Tokyo", 20.0);

        assert!(!recorder.record(&r, QueryOrigin::City).unwrap().is_duplicate());
        assert!(recorder.record(&r, QueryOrigin::City).unwrap().is_duplicate());
        assert_eq!(history.records_blocking().unwrap().len(), 1);
    }

    #[test]
    fn test_observe_records_success_only() {
        let (recorder, history) = recorder();
        let state = Observable::new(WeatherUiState::Idle);
        let _sub = recorder.observe(&state);

        state.set(WeatherUiState::Loading);
        state.set(WeatherUiState::Error(FetchError::Unknown("x".into())));
        state.set(WeatherUiState::Success {
            reading: reading("Oslo", 3.0),
            origin: QueryOrigin::City,
        });
        state.set(WeatherUiState::Success {
            reading: reading("Oslo", 3.0),
            origin: QueryOrigin::City,
        });

        let stored = history.records_blocking().unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].place_name, "Oslo");
    }

    #[test]
    fn test_dropping_subscription_stops_recording() {
        let (recorder, history) = recorder();
        let state = Observable::new(WeatherUiState::Idle);
        let sub = recorder.observe(&state);
        drop(sub);

        state.set(WeatherUiState::Success {
            reading: reading("Oslo", 3.0),
            origin: QueryOrigin::City,
        });
        assert!(history.records_blocking().unwrap().is_empty());
    }
}
