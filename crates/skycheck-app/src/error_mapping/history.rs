use super::IntoAppError;
use skycheck_core::{AppError, DatabaseError};
use skycheck_history::HistoryError;

impl IntoAppError for HistoryError {
    fn into_app_error(self) -> AppError {
        match self {
            HistoryError::Storage(s) => AppError::Database(DatabaseError::QueryFailed(s)),
            HistoryError::Other(e) => AppError::Other(e),
        }
    }
}
