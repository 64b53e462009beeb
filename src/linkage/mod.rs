// src/linkage/mod.rs
pub mod comparator;
pub mod confidence;
pub mod engine;
pub mod error;
pub mod indexer;
pub mod profile;

pub use engine::{LinkageOutput, RecordLinkage};
pub use error::LinkageError;
pub use profile::ProfileSelector;
