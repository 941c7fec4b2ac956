//! Core upload pipeline for mediarelay.
//!
//! This crate contains the request-independent parts of the relay with no
//! web framework dependencies.
//!
//! # Modules
//!
//! - `upload` - Resource kinds, temp-file buffering and the relay service
//! - `provider` - Media provider trait and its Cloudinary / local implementations

pub mod provider;
pub mod upload;
