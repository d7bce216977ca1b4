use serde::{Deserialize, Serialize};

/// Geographic position of the device.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

impl std::fmt::Display for Coordinates {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.4}, {:.4}", self.latitude, self.longitude)
    }
}

/// Current conditions returned by a weather provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherReading {
    /// Place name as resolved by the provider (may differ from the query)
    pub place_name: String,
    pub temperature_c: f64,
    pub humidity_pct: i32,
    pub pressure_hpa: i32,
    pub description: String,
    pub icon_code: String,
}

/// What a fetch is asking the provider for.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchTarget {
    City(String),
    Coordinates(Coordinates),
}

impl FetchTarget {
    pub fn origin(&self) -> QueryOrigin {
        match self {
            FetchTarget::City(_) => QueryOrigin::City,
            FetchTarget::Coordinates(_) => QueryOrigin::Device,
        }
    }
}

/// Whether a reading came from a typed city or from the device location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryOrigin {
    City,
    Device,
}

impl QueryOrigin {
    pub fn is_local(self) -> bool {
        matches!(self, QueryOrigin::Device)
    }
}

/// Failure of a single fetch.
///
/// `Clone + PartialEq` so it can live inside the published UI state.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    /// Upstream has no data for the query; retrying without changing input is pointless.
    #[error("No data for {origin:?} query")]
    NotFound { origin: QueryOrigin },

    /// Upstream was unreachable or answered with a failure status.
    #[error("Service error: {0}")]
    ServiceError(String),

    /// Anything uncategorized (e.g. an undecodable body).
    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl FetchError {
    /// Text shown in the error state.
    pub fn user_message(&self) -> &'static str {
        match self {
            FetchError::NotFound {
                origin: QueryOrigin::City,
            } => "No data for city",
            FetchError::NotFound {
                origin: QueryOrigin::Device,
            } => "No data for your location",
            FetchError::ServiceError(_) => "Service Error",
            FetchError::Unknown(_) => "Unknown Error",
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, FetchError::NotFound { .. })
    }
}

/// Location service errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum LocationError {
    #[error("Location permission denied")]
    PermissionDenied,
    #[error("Location service unavailable")]
    ServiceUnavailable,
    #[error("Location error: {0}")]
    Other(String),
}
