//! Maps crate errors to skycheck_core::AppError for consistent user-facing messages.
//! Each source crate has its own module to keep mappings small and readable.

mod history;
mod weather;

use skycheck_core::AppError;

/// Conversion into the application error for errors defined in other crates.
pub trait IntoAppError {
    fn into_app_error(self) -> AppError;
}

/// `?`-friendly mapping for results carrying a crate error.
pub trait AppResultExt<T> {
    fn app_err(self) -> Result<T, AppError>;
}

impl<T, E: IntoAppError> AppResultExt<T> for Result<T, E> {
    fn app_err(self) -> Result<T, AppError> {
        self.map_err(IntoAppError::into_app_error)
    }
}
