use thiserror::Error;

/// Errors from the MusicBrainz lookup layer.
///
/// A 404 from the web service is not represented here: lookups report
/// absence as `Ok(None)` instead of an error.
#[derive(Debug, Error)]
pub enum MusicBrainzError {
    /// Any non-404 error response from the web service.
    #[error("MusicBrainz responded with status {code}: {message}")]
    Response { code: u16, message: String },
    #[error(transparent)]
    Transport(#[from] reqwest::Error),
    #[error("failed to decode MusicBrainz data: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Errors from the database management commands.
#[derive(Debug, Error)]
pub enum BootstrapError {
    /// Invalid or disallowed input, surfaced before anything runs.
    #[error("{0}")]
    Configuration(String),
    /// An administrative subprocess exited non-zero.
    #[error("failed to {step}")]
    Provisioning { step: &'static str },
    /// A subprocess could not be spawned at all.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
