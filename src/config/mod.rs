// src/config/mod.rs

//! Configuration loading and validation for tfdriver.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk (`loader.rs`).
//! - Validate required fields and input syntax (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{load_and_validate, load_from_path};
pub use model::{ConfigFile, LogSection, RawConfigFile, ServiceConfig, SessionSection, StoreSection};
