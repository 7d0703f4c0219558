pub mod adapter;
pub mod client;
mod error;
pub mod governor;
pub mod prompt;
pub mod schema;

pub use adapter::{LabelContract, label_batch, validate_response};
pub use client::{DEFAULT_MODEL, GeminiClient, LabelClient, LabelRequest};
pub use error::LabelError;
pub use governor::Governor;
pub use schema::{MAX_MESSAGE_CHARS, build_schema};
