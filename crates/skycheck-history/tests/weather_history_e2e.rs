//! End-to-end: state machine fetches feed the history store and alert engine.

use async_trait::async_trait;
use chrono::NaiveDate;
use skycheck_history::{
    AlertRuleEngine, FixedClock, HistoryClient, HistoryRecorder, SqliteHistoryStore,
};
use skycheck_weather::{
    Coordinates, FetchError, FixedLocationPlatform, LocationCoordinator, QueryOrigin,
    WeatherProvider, WeatherReading, WeatherStateMachine, WeatherUiState,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::runtime::Handle;
use tokio::sync::oneshot;

#[derive(Default)]
struct CannedProvider {
    readings: HashMap<String, WeatherReading>,
    delayed: Mutex<HashMap<String, oneshot::Receiver<()>>>,
}

impl CannedProvider {
    fn with(mut self, reading: WeatherReading) -> Self {
        self.readings.insert(reading.place_name.clone(), reading);
        self
    }

    fn hold(&self, city: &str) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.delayed.lock().unwrap().insert(city.to_string(), rx);
        tx
    }
}

#[async_trait]
impl WeatherProvider for CannedProvider {
    async fn get_by_name(&self, city: &str) -> Result<WeatherReading, FetchError> {
        let held = self.delayed.lock().unwrap().remove(city);
        if let Some(rx) = held {
            let _ = rx.await;
        }
        self.readings
            .get(city)
            .cloned()
            .ok_or(FetchError::NotFound { origin: QueryOrigin::City })
    }

    async fn get_by_coordinates(&self, _: Coordinates) -> Result<WeatherReading, FetchError> {
        Err(FetchError::NotFound { origin: QueryOrigin::Device })
    }
}

fn reading(place: &str, temperature_c: f64, description: &str) -> WeatherReading {
    WeatherReading {
        place_name: place.to_string(),
        temperature_c,
        humidity_pct: 50,
        pressure_hpa: 1010,
        description: description.to_string(),
        icon_code: "01d".to_string(),
    }
}

fn history() -> (HistoryClient, HistoryRecorder) {
    let history = HistoryClient::new(SqliteHistoryStore::in_memory().unwrap());
    let clock = FixedClock::new(NaiveDate::from_ymd_opt(2024, 10, 1).unwrap(), 1_000);
    let recorder = HistoryRecorder::new(history.clone(), Arc::new(clock));
    (history, recorder)
}

fn machine(provider: Arc<CannedProvider>) -> WeatherStateMachine {
    WeatherStateMachine::new(
        provider,
        LocationCoordinator::new(Arc::new(FixedLocationPlatform::default())),
        Handle::current(),
        "Tokyo",
    )
}

#[tokio::test]
async fn test_tokyo_fetch_is_recorded_with_allergy_alert() {
    let provider = Arc::new(CannedProvider::default().with(reading("Tokyo", 20.0, "Clear Sky")));
    let sm = machine(provider);
    let (history, recorder) = history();
    let _sub = recorder.observe(&sm.state());

    sm.fetch_by_city("Tokyo").unwrap().finished().await;

    let state = sm.current_state();
    let shown = state.reading().unwrap();
    assert_eq!(shown.place_name, "Tokyo");
    assert_eq!(shown.temperature_c, 20.0);

    let records = history.list_records().await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].place_name, "Tokyo");
    assert_eq!(records[0].temperature_c, 20.0);
    assert_eq!(records[0].date, "2024-10-01");

    let entries = history
        .entries_with_alerts(&AlertRuleEngine::default())
        .await
        .unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].alerts, vec!["elevated pollen/allergy risk".to_string()]);
}

#[tokio::test]
async fn test_refetching_same_city_keeps_one_row() {
    let provider = Arc::new(CannedProvider::default().with(reading("Tokyo", 20.0, "Clear Sky")));
    let sm = machine(provider);
    let (history, recorder) = history();
    let _sub = recorder.observe(&sm.state());

    sm.fetch_by_city("Tokyo").unwrap().finished().await;
    sm.fetch_by_city("Tokyo").unwrap().finished().await;

    assert_eq!(history.count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_superseded_fetch_is_never_recorded() {
    let provider = CannedProvider::default()
        .with(reading("Cairo", 38.0, "sunny"))
        .with(reading("Oslo", 2.0, "snow"));
    let release_cairo = provider.hold("Cairo");
    let provider = Arc::new(provider);
    let sm = machine(provider);
    let (history, recorder) = history();
    let _sub = recorder.observe(&sm.state());

    let cairo = sm.fetch_by_city("Cairo").unwrap();
    let oslo = sm.fetch_by_city("Oslo").unwrap();
    oslo.finished().await;
    let _ = release_cairo.send(());
    cairo.finished().await;

    let records = history.list_records().await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].place_name, "Oslo");
    assert_eq!(sm.current_state().reading().unwrap().place_name, "Oslo");
}

#[tokio::test]
async fn test_declined_location_records_default_city() {
    let provider = Arc::new(CannedProvider::default().with(reading("Tokyo", 20.0, "Clear Sky")));
    let sm = machine(provider);
    let (history, recorder) = history();
    let _sub = recorder.observe(&sm.state());

    sm.fetch_by_location().finished().await;
    assert!(sm.rationale().current());
    assert!(history.list_records().await.unwrap().is_empty());

    sm.decline_rationale().unwrap().finished().await;

    let records = history.list_records().await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].place_name, "Tokyo");
    assert!(!records[0].is_local_origin);
}

#[tokio::test]
async fn test_failed_fetch_records_nothing() {
    let sm = machine(Arc::new(CannedProvider::default()));
    let (history, recorder) = history();
    let _sub = recorder.observe(&sm.state());

    sm.fetch_by_city("Atlantis").unwrap().finished().await;

    assert!(matches!(sm.current_state(), WeatherUiState::Error(_)));
    assert_eq!(sm.current_state().error_message(), Some("No data for city"));
    assert!(history.list_records().await.unwrap().is_empty());
}
