pub mod dataset;
pub mod loaders;
pub mod quiz;
pub mod source;

pub use dataset::{ParsedDataset, QaPair};
pub use loaders::{load_sources, read_json, write_json_atomic};
pub use quiz::{FormattedQuestion, ModelRecord, QuizArtifact};
pub use source::{SourceDescriptor, SourceList};
