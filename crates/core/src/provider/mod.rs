//! Media providers that take a buffered file and return a durable URL.
//!
//! # Providers
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                     MediaProvider                            │
//! │        upload_large(path, kind) -> ProviderUpload            │
//! ├──────────────────────────────┬───────────────────────────────┤
//! │ CloudinaryProvider           │ LocalFsProvider (dev only)    │
//! │ chunked signed POSTs         │ OpenDAL Fs operator           │
//! └──────────────────────────────┴───────────────────────────────┘
//! ```

mod cloudinary;
mod error;
mod local;
mod types;

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use mediarelay_shared::{ProviderConfig, ProviderKind};

use crate::upload::ResourceKind;

pub use cloudinary::CloudinaryProvider;
pub use error::ProviderError;
pub use local::LocalFsProvider;
pub use types::ProviderUpload;

/// External media storage that accepts a local file and hosts it.
#[async_trait]
pub trait MediaProvider: Send + Sync {
    /// Upload the file at `path`, hinting the provider with `kind`.
    ///
    /// Resolves once the provider has accepted (or rejected) the whole file.
    async fn upload_large(
        &self,
        path: &Path,
        kind: ResourceKind,
    ) -> Result<ProviderUpload, ProviderError>;

    /// Short provider name for logs and health output.
    fn name(&self) -> &'static str;
}

/// Build the configured provider.
///
/// # Errors
///
/// Returns an error if the selected provider's settings are incomplete.
pub fn from_config(config: &ProviderConfig) -> Result<Arc<dyn MediaProvider>, ProviderError> {
    match config.kind {
        ProviderKind::Cloudinary => Ok(Arc::new(CloudinaryProvider::new(
            config.cloudinary.clone(),
        )?)),
        ProviderKind::LocalFs => Ok(Arc::new(LocalFsProvider::new(&config.local_fs)?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_config_rejects_missing_credentials() {
        let config = ProviderConfig::default();
        let err = from_config(&config).err().expect("should fail");
        assert!(matches!(err, ProviderError::Configuration(_)));
    }

    #[test]
    fn test_from_config_local_fs() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut config = ProviderConfig {
            kind: ProviderKind::LocalFs,
            ..ProviderConfig::default()
        };
        config.local_fs.root = dir.path().to_path_buf();

        let provider = from_config(&config).expect("should build");
        assert_eq!(provider.name(), "local");
    }
}
