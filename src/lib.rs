pub mod cli;
pub mod config;
pub mod error;
pub mod feeds;
pub mod models;
pub mod processors;
pub mod readers;
pub mod store;
pub mod utils;
pub mod writers;

pub use config::{RunConfig, StationConfig};
pub use error::{ProcessingError, Result};
