//! Core types shared by every stage of the pipeline.

pub mod config;
pub mod error;
pub mod output;

pub use config::{Config, MarketplaceConfig};
pub use error::{BisectError, Result, Side};
