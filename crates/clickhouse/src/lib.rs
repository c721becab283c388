//! ClickHouse-backed aggregation tables.

pub mod client;
pub mod config;
pub mod error;
pub mod table;

pub use client::*;
pub use config::*;
pub use error::ClientError;
pub use table::ClickHouseTable;
