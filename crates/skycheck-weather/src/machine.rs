//! Weather request orchestration.
//!
//! `WeatherStateMachine` owns the single "current fetch" slot. Every new
//! intent bumps the slot's generation, cancels the previous task's token and
//! publishes `Loading`. A task may publish only while its generation is still
//! current, checked under the same lock that starts new fetches, so a late
//! response can never overwrite the state of a newer request.
//!
//! Values are staged on the observables while the slot lock is held and
//! delivered to subscribers after it is released. Subscribers may therefore
//! start new fetches from their callbacks.

use crate::location::{LocationCoordinator, LocationOutcome};
use crate::observable::Observable;
use crate::provider::WeatherProvider;
use crate::state::WeatherUiState;
use crate::types::{Coordinates, FetchError, FetchTarget, QueryOrigin, WeatherReading};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

#[derive(Default)]
struct FetchSlot {
    generation: u64,
    token: Option<CancellationToken>,
}

/// Right to publish, held by one task at a time.
#[derive(Clone)]
struct Ticket {
    generation: u64,
    token: CancellationToken,
}

struct Inner {
    provider: Arc<dyn WeatherProvider>,
    locator: LocationCoordinator,
    runtime: Handle,
    default_city: String,
    state: Observable<WeatherUiState>,
    subject: Observable<String>,
    rationale: Observable<bool>,
    coordinates: Mutex<Option<Coordinates>>,
    slot: Mutex<FetchSlot>,
}

impl Inner {
    /// Take the slot: supersede whatever was in flight and publish `Loading`
    /// (and the new query subject, if any).
    fn begin(&self, subject: Option<String>) -> Ticket {
        let ticket = {
            let mut slot = self.slot.lock();
            if let Some(previous) = slot.token.take() {
                previous.cancel();
            }
            slot.generation += 1;
            let token = CancellationToken::new();
            slot.token = Some(token.clone());
            if let Some(subject) = subject {
                self.subject.stage(subject);
            }
            self.state.stage(WeatherUiState::Loading);
            tracing::debug!(generation = slot.generation, "Fetch started");

            Ticket {
                generation: slot.generation,
                token,
            }
        };
        self.flush();
        ticket
    }

    /// Run `publish` only while `ticket` still owns the slot.
    ///
    /// `publish` must only `stage` values; they are delivered once the slot
    /// lock is released.
    fn publish_if_current(&self, ticket: &Ticket, publish: impl FnOnce(&Self)) -> bool {
        {
            let slot = self.slot.lock();
            if slot.generation != ticket.generation || ticket.token.is_cancelled() {
                tracing::debug!(
                    generation = ticket.generation,
                    current = slot.generation,
                    "Discarding superseded result"
                );
                return false;
            }
            publish(self);
        }
        self.flush();
        true
    }

    fn flush(&self) {
        self.subject.flush();
        self.state.flush();
        self.rationale.flush();
    }

    fn is_current(&self, ticket: &Ticket) -> bool {
        self.slot.lock().generation == ticket.generation && !ticket.token.is_cancelled()
    }

    async fn run_fetch(&self, ticket: Ticket, target: FetchTarget) {
        let origin = target.origin();
        let call = async {
            match &target {
                FetchTarget::City(name) => self.provider.get_by_name(name).await,
                FetchTarget::Coordinates(c) => self.provider.get_by_coordinates(*c).await,
            }
        };

        let result = tokio::select! {
            _ = ticket.token.cancelled() => {
                tracing::debug!(generation = ticket.generation, "Fetch cancelled");
                return;
            }
            result = call => result,
        };

        self.complete(&ticket, origin, result);
    }

    fn complete(
        &self,
        ticket: &Ticket,
        origin: QueryOrigin,
        result: Result<WeatherReading, FetchError>,
    ) {
        self.publish_if_current(ticket, |inner| match result {
            Ok(reading) => {
                tracing::info!(
                    "Fetched weather for {}: {:.1}°C, {}",
                    reading.place_name,
                    reading.temperature_c,
                    reading.description
                );
                if !reading.place_name.is_empty() {
                    inner.subject.stage(reading.place_name.clone());
                }
                inner.state.stage(WeatherUiState::Success { reading, origin });
            }
            Err(e) => {
                tracing::warn!("Weather fetch failed: {}", e);
                inner.state.stage(WeatherUiState::Error(e));
            }
        });
    }

    async fn run_location(&self, ticket: Ticket) {
        let outcome = tokio::select! {
            _ = ticket.token.cancelled() => {
                tracing::debug!(generation = ticket.generation, "Location request superseded");
                return;
            }
            outcome = self.locator.resolve() => outcome,
        };

        match outcome {
            LocationOutcome::Resolved(coordinates) => {
                *self.coordinates.lock() = Some(coordinates);
                if self.is_current(&ticket) {
                    self.run_fetch(ticket, FetchTarget::Coordinates(coordinates))
                        .await;
                }
            }
            LocationOutcome::RationaleNeeded => {
                self.publish_if_current(&ticket, |inner| inner.rationale.stage(true));
            }
            LocationOutcome::PermissionRequested => {
                tracing::debug!("Waiting for the platform permission result");
            }
            LocationOutcome::Unavailable => {
                tracing::warn!("No device location available; local fetch not started");
            }
        }
    }
}

/// Awaitable handle for one started fetch.
pub struct FetchHandle {
    generation: u64,
    task: JoinHandle<()>,
}

impl FetchHandle {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Wait for the task to finish (publishing or discarding its result).
    pub async fn finished(self) {
        if let Err(e) = self.task.await {
            tracing::error!(generation = self.generation, "Fetch task failed: {}", e);
        }
    }
}

impl std::fmt::Debug for FetchHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetchHandle")
            .field("generation", &self.generation)
            .finish()
    }
}

/// Orchestrates city and device-location weather fetches.
///
/// Cheap to clone; clones drive the same slot and observables.
#[derive(Clone)]
pub struct WeatherStateMachine {
    inner: Arc<Inner>,
}

impl WeatherStateMachine {
    /// `runtime` is where fetch tasks are spawned. `default_city` is the
    /// fallback when location access is declined.
    pub fn new(
        provider: Arc<dyn WeatherProvider>,
        locator: LocationCoordinator,
        runtime: Handle,
        default_city: impl Into<String>,
    ) -> Self {
        let default_city = default_city.into();
        Self {
            inner: Arc::new(Inner {
                provider,
                locator,
                runtime,
                subject: Observable::new(default_city.clone()),
                default_city,
                state: Observable::new(WeatherUiState::Idle),
                rationale: Observable::new(false),
                coordinates: Mutex::new(None),
                slot: Mutex::new(FetchSlot::default()),
            }),
        }
    }

    /// Published UI state.
    pub fn state(&self) -> Observable<WeatherUiState> {
        self.inner.state.clone()
    }

    pub fn current_state(&self) -> WeatherUiState {
        self.inner.state.current()
    }

    /// Current query subject (the city text shown to the user).
    pub fn subject(&self) -> Observable<String> {
        self.inner.subject.clone()
    }

    pub fn set_subject(&self, name: impl Into<String>) {
        self.inner.subject.set(name.into());
    }

    /// `true` while the location rationale dialog should be visible.
    pub fn rationale(&self) -> Observable<bool> {
        self.inner.rationale.clone()
    }

    pub fn cached_coordinates(&self) -> Option<Coordinates> {
        *self.inner.coordinates.lock()
    }

    pub fn default_city(&self) -> &str {
        &self.inner.default_city
    }

    /// Fetch weather for a city. Blank names are ignored and return `None`.
    pub fn fetch_by_city(&self, name: &str) -> Option<FetchHandle> {
        let name = name.trim();
        if name.is_empty() {
            tracing::debug!("Ignoring fetch for empty city name");
            return None;
        }

        Some(self.start(FetchTarget::City(name.to_string()), Some(name.to_string())))
    }

    /// Fetch weather for the device location.
    ///
    /// Uses the coordinates cached earlier in the session if any, otherwise
    /// resolves them first. A rationale request is surfaced through
    /// [`rationale`](Self::rationale) and no fetch is started.
    pub fn fetch_by_location(&self) -> FetchHandle {
        if let Some(coordinates) = self.cached_coordinates() {
            return self.start(FetchTarget::Coordinates(coordinates), None);
        }

        let ticket = self.inner.begin(None);
        let generation = ticket.generation;
        let inner = Arc::clone(&self.inner);
        let task = self
            .inner
            .runtime
            .spawn(async move { inner.run_location(ticket).await });

        FetchHandle { generation, task }
    }

    /// User accepted the rationale dialog: hide it and show the platform prompt.
    pub fn accept_rationale(&self) {
        self.inner.rationale.set(false);
        self.inner.locator.request_permission();
    }

    /// User declined the rationale dialog: hide it and fall back to the default city.
    pub fn decline_rationale(&self) -> Option<FetchHandle> {
        self.inner.rationale.set(false);
        self.fetch_default_city()
    }

    /// Answer from the platform permission prompt.
    pub fn on_permission_result(&self, granted: bool) -> Option<FetchHandle> {
        if granted {
            tracing::info!("Location permission granted");
            Some(self.fetch_by_location())
        } else {
            tracing::info!("Location permission denied, using default city");
            self.fetch_default_city()
        }
    }

    pub fn fetch_default_city(&self) -> Option<FetchHandle> {
        let city = self.inner.default_city.clone();
        self.fetch_by_city(&city)
    }

    fn start(&self, target: FetchTarget, subject: Option<String>) -> FetchHandle {
        let ticket = self.inner.begin(subject);
        let generation = ticket.generation;
        let inner = Arc::clone(&self.inner);
        let task = self
            .inner
            .runtime
            .spawn(async move { inner.run_fetch(ticket, target).await });

        FetchHandle { generation, task }
    }
}
