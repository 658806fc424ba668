use thiserror::Error;

/// Why a per-company external call produced no value.
///
/// Recorded next to each company instead of being swallowed, so callers can
/// tell "no news this week" apart from "the feed could not be fetched".
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("request timed out")]
    Timeout,

    #[error("network error: {0}")]
    Network(#[source] reqwest::Error),

    #[error("unexpected HTTP status: {0}")]
    Status(reqwest::StatusCode),

    #[error("malformed feed: {0}")]
    Feed(String),

    #[error("invalid request URL: {0}")]
    Url(#[from] url::ParseError),
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            FetchError::Timeout
        } else {
            FetchError::Network(e)
        }
    }
}

impl From<feed_rs::parser::ParseFeedError> for FetchError {
    fn from(e: feed_rs::parser::ParseFeedError) -> Self {
        FetchError::Feed(e.to_string())
    }
}

/// Mail submission failures.
#[derive(Error, Debug)]
pub enum EmailError {
    #[error("invalid email address '{address}': {source}")]
    Address {
        address: String,
        #[source]
        source: lettre::address::AddressError,
    },

    #[error("failed to build message: {0}")]
    Message(#[from] lettre::error::Error),

    #[error("SMTP authentication failed: {0}")]
    Authentication(#[source] lettre::transport::smtp::Error),

    #[error("failed to send email: {0}")]
    Transport(#[source] lettre::transport::smtp::Error),
}
