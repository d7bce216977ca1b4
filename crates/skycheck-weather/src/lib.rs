//! Current-weather fetching for skycheck.
//!
//! Provides the OpenWeatherMap provider, device location negotiation and the
//! state machine that turns user intents into observable UI state.

pub mod types;
pub mod location;
pub mod machine;
pub mod observable;
pub mod provider;
pub mod state;

#[cfg(test)]
mod testing;

pub use types::*;
pub use location::{FixedLocationPlatform, LocationCoordinator, LocationOutcome, LocationPlatform};
pub use machine::{FetchHandle, WeatherStateMachine};
pub use observable::{Observable, Subscription};
pub use provider::{icon_url, OpenWeatherClient, WeatherProvider};
pub use state::WeatherUiState;
