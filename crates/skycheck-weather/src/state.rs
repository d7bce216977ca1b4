use crate::types::{FetchError, QueryOrigin, WeatherReading};

/// Observable output of the weather state machine.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum WeatherUiState {
    #[default]
    Idle,
    Loading,
    Success {
        reading: WeatherReading,
        origin: QueryOrigin,
    },
    Error(FetchError),
}

impl WeatherUiState {
    pub fn is_loading(&self) -> bool {
        matches!(self, WeatherUiState::Loading)
    }

    pub fn reading(&self) -> Option<&WeatherReading> {
        match self {
            WeatherUiState::Success { reading, .. } => Some(reading),
            _ => None,
        }
    }

    /// Display text for the error state.
    pub fn error_message(&self) -> Option<&'static str> {
        match self {
            WeatherUiState::Error(e) => Some(e.user_message()),
            _ => None,
        }
    }
}
