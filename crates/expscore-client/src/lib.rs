//! expscore-client: Loading experiment records.
//!
//! Implements the `ExperimentSource` trait for the coursework REST API, for
//! JSON files exported from it, and for in-memory fixtures. Also owns the
//! `expscore.toml` configuration file.

pub mod batch;
pub mod config;
pub mod error;
pub mod file;
pub mod http;
pub mod mock;

pub use batch::fetch_all;
pub use config::{create_source, load_config_from, ApiConfig, ExpscoreConfig};
pub use error::ClientError;
