//! Configuration loading and defaults.

pub mod settings;

pub use settings::{
    AuthServiceConfig, DetectionConfig, EvictionConfig, ServerConfig, WardenConfig,
};
