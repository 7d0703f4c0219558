pub mod batch;
pub mod curate;
mod error;
pub mod labels;
pub mod schema;
pub mod ticket;

pub use batch::{batch_count, chunk};
pub use curate::{Curator, priority_targets};
pub use error::CoreError;
pub use labels::AllowedLabels;
pub use schema::tables;
pub use ticket::{BatchItem, DemoExample, LabelResult, SourceRecord};
