use super::IntoAppError;
use skycheck_core::{AppError, LocationError, WeatherError};
use skycheck_weather::{FetchError, LocationError as DeviceLocationError, QueryOrigin};

impl IntoAppError for FetchError {
    fn into_app_error(self) -> AppError {
        match self {
            FetchError::NotFound {
                origin: QueryOrigin::City,
            } => AppError::Weather(WeatherError::NotFound("city query".into())),
            FetchError::NotFound {
                origin: QueryOrigin::Device,
            } => AppError::Weather(WeatherError::NotFound("device location".into())),
            FetchError::ServiceError(s) => AppError::Weather(WeatherError::ServiceError(s)),
            FetchError::Unknown(s) => AppError::Weather(WeatherError::Unknown(s)),
        }
    }
}

impl IntoAppError for DeviceLocationError {
    fn into_app_error(self) -> AppError {
        match self {
            DeviceLocationError::PermissionDenied => {
                AppError::Location(LocationError::PermissionDenied)
            }
            DeviceLocationError::ServiceUnavailable => AppError::Location(
                LocationError::Unavailable("location service unavailable".into()),
            ),
            DeviceLocationError::Other(s) => AppError::Location(LocationError::Unavailable(s)),
        }
    }
}
