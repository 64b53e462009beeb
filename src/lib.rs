pub mod cleaning;
pub mod datasets;
pub mod job;
pub mod linkage;
pub mod models;
pub mod utils;
