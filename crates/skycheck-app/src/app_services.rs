//! Composition root: builds the weather and history services from config.

use skycheck_core::{AppError, Config, DatabaseError, WeatherError};
use skycheck_history::{
    AlertRuleEngine, Clock, HistoryClient, HistoryRecorder, SqliteHistoryStore, SystemClock,
};
use skycheck_weather::{
    Coordinates, FixedLocationPlatform, LocationCoordinator, OpenWeatherClient, Subscription,
    WeatherStateMachine,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;

/// Weather fetching plus the subscription that records its successes.
pub struct WeatherSession {
    pub machine: WeatherStateMachine,
    _recording: Subscription,
}

pub struct AppServices {
    config: Config,
    history: HistoryClient,
    clock: Arc<dyn Clock>,
    alerts: AlertRuleEngine,
}

impl AppServices {
    /// Open the history database. The weather client is built on demand so
    /// history commands work without an API key.
    pub fn new(config: Config) -> Result<Self, AppError> {
        let db_path = config.history_db_path();
        tracing::debug!("Opening history database at {}", db_path.display());
        let store = SqliteHistoryStore::new(&db_path)
            .map_err(|e| AppError::Database(DatabaseError::ConnectionFailed(e.to_string())))?;

        Ok(Self {
            config,
            history: HistoryClient::new(store),
            clock: Arc::new(SystemClock),
            alerts: AlertRuleEngine::default(),
        })
    }

    pub fn history(&self) -> &HistoryClient {
        &self.history
    }

    pub fn alerts(&self) -> &AlertRuleEngine {
        &self.alerts
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    /// Build the state machine and start recording its successful fetches.
    pub fn weather_session(&self, runtime: Handle) -> Result<WeatherSession, AppError> {
        let weather = &self.config.weather;
        let api_key = weather
            .effective_api_key()
            .ok_or(AppError::Weather(WeatherError::MissingApiKey))?;

        let provider = OpenWeatherClient::with_options(
            api_key,
            &weather.base_url,
            &weather.units,
            Duration::from_secs(weather.request_timeout_secs),
        )
        .map_err(|e| AppError::Weather(WeatherError::Unknown(e.to_string())))?;

        let fixed = self
            .config
            .location
            .coordinates()
            .map(|(lat, lon)| Coordinates::new(lat, lon));
        let locator = LocationCoordinator::new(Arc::new(FixedLocationPlatform::new(fixed)));

        let machine = WeatherStateMachine::new(
            Arc::new(provider),
            locator,
            runtime,
            weather.default_city.clone(),
        );

        let recorder = HistoryRecorder::new(self.history.clone(), Arc::clone(&self.clock));
        let recording = recorder.observe(&machine.state());

        Ok(WeatherSession {
            machine,
            _recording: recording,
        })
    }
}
