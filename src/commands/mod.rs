pub mod analyze;
pub mod config;
pub mod index;
pub mod search;
pub mod status;
