//! Shared errors and configuration for mediarelay.
//!
//! This crate provides common pieces used by the server and its binaries:
//! - Application-wide error taxonomy
//! - Configuration management

pub mod config;
pub mod error;

pub use config::{
    AppConfig, CloudinaryConfig, LocalFsConfig, ProviderConfig, ProviderKind, ServerConfig,
    SignatureAlgorithm, UploadConfig,
};
pub use error::{AppError, AppResult};
