/// Application-level errors
///
/// The `Display` text of each variant is what the title view surfaces as a
/// transient notice when an operation aborts.
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("External API error: {0}")]
    ExternalApi(String),

    #[error("Not signed in: a valid session is required to save progress")]
    Unauthenticated,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Nothing to mark for {0}: no episodes could be listed")]
    NothingToMark(String),
}

impl AppError {
    /// True for failures reported by (or on the way to) a remote service
    pub fn is_network(&self) -> bool {
        matches!(
            self,
            AppError::HttpClient(_) | AppError::ExternalApi(_) | AppError::Unauthenticated
        )
    }
}

pub type AppResult<T> = Result<T, AppError>;
