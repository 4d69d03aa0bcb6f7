use thiserror::Error;

#[derive(Debug, Error)]
pub enum RenewalError {
    #[error("invalid time of day '{0}': expected HH:MM")]
    InvalidTime(String),

    #[error("invalid date '{0}': expected YYYY-MM-DD")]
    InvalidDate(String),

    #[error("invalid utc offset '{0}': expected +HH:MM or -HH:MM")]
    InvalidOffset(String),

    #[error("interval starting at {start} for {duration_minutes} minutes runs past the end of the day")]
    IntervalOutOfDay {
        start: String,
        duration_minutes: u32,
    },

    #[error("feed is empty: no header line found")]
    FeedEmpty,

    #[error("feed not found: {0}")]
    FeedNotFound(String),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("event sink error: {0}")]
    Sink(String),

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, RenewalError>;
