use thiserror::Error;

/// Client-credentials exchange failed. Cloneable so every caller waiting on a
/// shared refresh can observe the same failure.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum AuthError {
    #[error("token request failed: {0}")]
    Transport(String),
    #[error("token endpoint rejected credentials: {status} - {body}")]
    Rejected { status: u16, body: String },
    #[error("malformed token response: {0}")]
    InvalidResponse(String),
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("page request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("API error: {status} - {body}")]
    Status { status: u16, body: String },
    #[error("malformed page response: {0}")]
    Malformed(String),
}

#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("delivery request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("channel rejected message: {status} - {body}")]
    Rejected { status: u16, body: String },
}

/// Terminal failure of a single tick.
#[derive(Debug, Error)]
pub enum PollError {
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Fetch(#[from] FetchError),
}
