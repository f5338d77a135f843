//! Configuration module for Coffer
//!
//! This module provides configuration management including:
//! - Base directory resolution
//! - User settings persistence

pub mod paths;
pub mod settings;

pub use paths::CofferPaths;
pub use settings::Settings;
