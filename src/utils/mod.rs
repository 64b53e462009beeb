pub mod config;
pub mod constants;
pub mod db_connect;
pub mod env;
pub mod progress_bars;
pub mod warehouse;
