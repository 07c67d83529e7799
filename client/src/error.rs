use thiserror::Error;

/// Failure talking to the traffic API. Always terminal for the operation
/// that issued the request.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ApiError {
    #[error("fetch error: {0}")]
    Network(String),
    #[error("HTTP {0}")]
    Status(u16),
    #[error("parse error: {0}")]
    Decode(String),
}

/// Input rejected before any request is made. The message is shown to the
/// user verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("Please enter both start and end locations")]
    MissingEndpoints,
    #[error("Invalid coordinates format. Use: latitude, longitude")]
    InvalidCoordinates,
    #[error("Please enter a location to search")]
    EmptySearch,
}
