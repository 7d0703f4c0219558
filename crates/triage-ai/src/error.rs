use thiserror::Error;
use triage_core::CoreError;

#[derive(Error, Debug)]
pub enum LabelError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server returned {status}: {body}")]
    Server { status: u16, body: String },
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("model returned no content")]
    EmptyResponse,
    #[error("invalid model response: {0}")]
    Validation(String),
    #[error(transparent)]
    Core(#[from] CoreError),
}
