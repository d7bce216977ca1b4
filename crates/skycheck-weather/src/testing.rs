//! Test doubles for the provider and location seams.
#![allow(clippy::unwrap_used, clippy::expect_used)]

use crate::location::LocationPlatform;
use crate::provider::WeatherProvider;
use crate::types::{Coordinates, FetchError, FetchTarget, LocationError, QueryOrigin, WeatherReading};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::oneshot;

pub(crate) fn reading(place: &str, temperature_c: f64) -> WeatherReading {
    WeatherReading {
        place_name: place.to_string(),
        temperature_c,
        humidity_pct: 50,
        pressure_hpa: 1010,
        description: "clear sky".to_string(),
        icon_code: "01d".to_string(),
    }
}

type Reply = Result<WeatherReading, FetchError>;

/// Provider answering from a table, or from a gate the test releases later.
#[derive(Default)]
pub(crate) struct StubProvider {
    by_name: Mutex<HashMap<String, Reply>>,
    gates: Mutex<HashMap<String, oneshot::Receiver<Reply>>>,
    by_coordinates: Mutex<Option<Reply>>,
    calls: Mutex<Vec<FetchTarget>>,
}

impl StubProvider {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn respond(&self, city: &str, reply: Reply) {
        self.by_name.lock().insert(city.to_string(), reply);
    }

    pub(crate) fn respond_to_coordinates(&self, reply: Reply) {
        *self.by_coordinates.lock() = Some(reply);
    }

    /// The next lookup of `city` blocks until the returned sender fires.
    pub(crate) fn gate(&self, city: &str) -> oneshot::Sender<Reply> {
        let (tx, rx) = oneshot::channel();
        self.gates.lock().insert(city.to_string(), rx);
        tx
    }

    pub(crate) fn calls(&self) -> Vec<FetchTarget> {
        self.calls.lock().clone()
    }

    pub(crate) fn coordinate_calls(&self) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|t| matches!(t, FetchTarget::Coordinates(_)))
            .count()
    }
}

#[async_trait]
impl WeatherProvider for StubProvider {
    async fn get_by_name(&self, city: &str) -> Result<WeatherReading, FetchError> {
        self.calls.lock().push(FetchTarget::City(city.to_string()));
        let gate = self.gates.lock().remove(city);
        if let Some(rx) = gate {
            return rx
                .await
                .unwrap_or_else(|_| Err(FetchError::Unknown("gate dropped".into())));
        }
        self.by_name
            .lock()
            .get(city)
            .cloned()
            .unwrap_or(Err(FetchError::NotFound {
                origin: QueryOrigin::City,
            }))
    }

    async fn get_by_coordinates(
        &self,
        coordinates: Coordinates,
    ) -> Result<WeatherReading, FetchError> {
        self.calls.lock().push(FetchTarget::Coordinates(coordinates));
        self.by_coordinates
            .lock()
            .clone()
            .unwrap_or(Err(FetchError::NotFound {
                origin: QueryOrigin::Device,
            }))
    }
}

/// Location platform with scripted permission state.
pub(crate) struct FakePlatform {
    pub(crate) authorized: bool,
    pub(crate) rationale: bool,
    pub(crate) fix: Mutex<Result<Option<Coordinates>, LocationError>>,
    gate: Mutex<Option<oneshot::Receiver<()>>>,
    prompts: AtomicUsize,
    lookups: AtomicUsize,
}

impl FakePlatform {
    pub(crate) fn new(authorized: bool, rationale: bool, fix: Option<Coordinates>) -> Arc<Self> {
        Arc::new(Self {
            authorized,
            rationale,
            fix: Mutex::new(Ok(fix)),
            gate: Mutex::new(None),
            prompts: AtomicUsize::new(0),
            lookups: AtomicUsize::new(0),
        })
    }

    /// The next location lookup blocks until the returned sender fires.
    pub(crate) fn gate(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        *self.gate.lock() = Some(rx);
        tx
    }

    pub(crate) fn prompts(&self) -> usize {
        self.prompts.load(Ordering::SeqCst)
    }

    pub(crate) fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LocationPlatform for FakePlatform {
    fn is_authorized(&self) -> bool {
        self.authorized
    }

    fn should_show_rationale(&self) -> bool {
        self.rationale
    }

    fn request_permission(&self) {
        self.prompts.fetch_add(1, Ordering::SeqCst);
    }

    async fn last_known_location(&self) -> Result<Option<Coordinates>, LocationError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        let gate = self.gate.lock().take();
        if let Some(rx) = gate {
            let _ = rx.await;
        }
        self.fix.lock().clone()
    }
}
