use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("need at least {required} joined rows, found {available}")]
    InsufficientData { required: usize, available: usize },
}
