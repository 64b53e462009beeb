// src/cleaning/mod.rs
pub mod business_name;
pub mod geo;
pub mod lookup_tables;
pub mod website;

pub use business_name::BusinessNameCleaner;
pub use geo::GeoStandardizer;
