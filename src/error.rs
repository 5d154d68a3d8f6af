use thiserror::Error;

/// Adapter failures. `Display` is the text shown to users, so wording changes
/// here are visible to every consumer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FeedError {
    #[error("Timed out while connecting to the observatory service. Please try again.")]
    ObservatoryTimeout,

    #[error("Too many requests were sent. Please wait a moment.")]
    ObservatoryRateLimited,

    #[error("The observatory service is currently unavailable.")]
    ObservatoryUnavailable,

    #[error("Observatory data cannot be reached.")]
    ObservatoryUnreachable,

    #[error("Survey earthquakes could not be retrieved.")]
    SurveyUnavailable,
}

pub type Result<T> = std::result::Result<T, FeedError>;
