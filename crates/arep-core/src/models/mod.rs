//! Data models: configuration, raw tables and extracted records.

pub mod config;
pub mod records;
pub mod table;
