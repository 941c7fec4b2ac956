//! Application configuration management.

use std::path::PathBuf;

use serde::Deserialize;

/// Default upload ceiling: 100 MiB.
pub const DEFAULT_MAX_FILE_SIZE: u64 = 100 * 1024 * 1024;

/// Application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Upload pipeline configuration.
    #[serde(default)]
    pub upload: UploadConfig,
    /// Media provider configuration.
    #[serde(default)]
    pub provider: ProviderConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Origins allowed to make cross-origin requests.
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: Vec<String>,
    /// Directory holding the built single-page application.
    #[serde(default = "default_static_dir")]
    pub static_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            allowed_origins: default_allowed_origins(),
            static_dir: default_static_dir(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_allowed_origins() -> Vec<String> {
    vec!["http://localhost:5173".to_string()]
}

fn default_static_dir() -> PathBuf {
    PathBuf::from("client/build")
}

/// Upload pipeline configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadConfig {
    /// Directory where incoming files are buffered before forwarding.
    #[serde(default = "default_temp_dir")]
    pub temp_dir: PathBuf,
    /// Maximum accepted file size in bytes.
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            temp_dir: default_temp_dir(),
            max_file_size: default_max_file_size(),
        }
    }
}

fn default_temp_dir() -> PathBuf {
    PathBuf::from("/tmp/uploads")
}

fn default_max_file_size() -> u64 {
    DEFAULT_MAX_FILE_SIZE
}

/// Which media provider receives forwarded uploads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    /// Cloudinary hosted media storage.
    #[default]
    Cloudinary,
    /// Local filesystem (development only).
    LocalFs,
}

/// Media provider configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProviderConfig {
    /// Selected provider.
    #[serde(default)]
    pub kind: ProviderKind,
    /// Cloudinary settings, used when `kind = "cloudinary"`.
    #[serde(default)]
    pub cloudinary: CloudinaryConfig,
    /// Local filesystem settings, used when `kind = "local_fs"`.
    #[serde(default)]
    pub local_fs: LocalFsConfig,
}

/// Hash used to sign Cloudinary upload parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignatureAlgorithm {
    /// SHA-1, the account default.
    #[default]
    Sha1,
    /// SHA-256, for accounts configured to require it.
    Sha256,
}

/// Cloudinary credentials and tuning.
#[derive(Debug, Clone, Deserialize)]
pub struct CloudinaryConfig {
    /// Cloud (account) name.
    #[serde(default)]
    pub cloud_name: String,
    /// API key.
    #[serde(default)]
    pub api_key: String,
    /// API secret.
    #[serde(default)]
    pub api_secret: String,
    /// API base URL.
    #[serde(default = "default_api_base")]
    pub api_base: String,
    /// Bytes per chunk for large uploads.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: u64,
    /// Signing hash.
    #[serde(default)]
    pub signature_algorithm: SignatureAlgorithm,
}

impl Default for CloudinaryConfig {
    fn default() -> Self {
        Self {
            cloud_name: String::new(),
            api_key: String::new(),
            api_secret: String::new(),
            api_base: default_api_base(),
            chunk_size: default_chunk_size(),
            signature_algorithm: SignatureAlgorithm::default(),
        }
    }
}

fn default_api_base() -> String {
    "https://api.cloudinary.com".to_string()
}

fn default_chunk_size() -> u64 {
    20_000_000
}

/// Local filesystem provider settings.
#[derive(Debug, Clone, Deserialize)]
pub struct LocalFsConfig {
    /// Root directory for stored media.
    #[serde(default = "default_local_root")]
    pub root: PathBuf,
    /// Public base URL under which `root` is served.
    #[serde(default = "default_public_base_url")]
    pub public_base_url: String,
}

impl Default for LocalFsConfig {
    fn default() -> Self {
        Self {
            root: default_local_root(),
            public_base_url: default_public_base_url(),
        }
    }
}

fn default_local_root() -> PathBuf {
    PathBuf::from("./media")
}

fn default_public_base_url() -> String {
    "http://localhost:5000/media".to_string()
}

/// Unprefixed variables honoured for compatibility with existing deployments.
const LEGACY_OVERRIDES: [(&str, &str); 4] = [
    ("PORT", "server.port"),
    ("CLOUDINARY_CLOUD_NAME", "provider.cloudinary.cloud_name"),
    ("CLOUDINARY_API_KEY", "provider.cloudinary.api_key"),
    ("CLOUDINARY_API_SECRET", "provider.cloudinary.api_secret"),
];

impl AppConfig {
    /// Loads configuration from config files and the environment.
    ///
    /// Later sources win: `config/default`, `config/{RUN_MODE}`,
    /// `MEDIARELAY__*` variables, then the legacy unprefixed variables.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let mut builder = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(
                config::Environment::with_prefix("MEDIARELAY")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("server.allowed_origins")
                    .try_parsing(true),
            );

        for (var, key) in LEGACY_OVERRIDES {
            builder = builder.set_override_option(key, std::env::var(var).ok())?;
        }
        if let Ok(origins) = std::env::var("ALLOWED_ORIGINS") {
            builder = builder.set_override("server.allowed_origins", split_origins(&origins))?;
        }

        builder.build()?.try_deserialize()
    }

    /// Address the server binds to.
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

/// Split a comma separated origin list, dropping blanks.
fn split_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const ENV_KEYS: [&str; 9] = [
        "RUN_MODE",
        "PORT",
        "ALLOWED_ORIGINS",
        "CLOUDINARY_CLOUD_NAME",
        "CLOUDINARY_API_KEY",
        "CLOUDINARY_API_SECRET",
        "MEDIARELAY__SERVER__PORT",
        "MEDIARELAY__PROVIDER__KIND",
        "MEDIARELAY__UPLOAD__TEMP_DIR",
    ];

    fn cleared() -> Vec<(&'static str, Option<&'static str>)> {
        ENV_KEYS.iter().map(|k| (*k, None)).collect()
    }

    #[test]
    fn test_defaults() {
        temp_env::with_vars(cleared(), || {
            let config = AppConfig::load().expect("should load");
            assert_eq!(config.server.port, 5000);
            assert_eq!(config.server.host, "0.0.0.0");
            assert_eq!(config.server.allowed_origins, vec!["http://localhost:5173"]);
            assert_eq!(config.upload.max_file_size, 104_857_600);
            assert_eq!(config.upload.temp_dir, PathBuf::from("/tmp/uploads"));
            assert_eq!(config.provider.kind, ProviderKind::Cloudinary);
            assert_eq!(config.provider.cloudinary.chunk_size, 20_000_000);
            assert_eq!(
                config.provider.cloudinary.signature_algorithm,
                SignatureAlgorithm::Sha1
            );
        });
    }

    #[test]
    fn test_prefixed_environment() {
        let mut vars = cleared();
        vars.retain(|(k, _)| !k.starts_with("MEDIARELAY"));
        vars.push(("MEDIARELAY__SERVER__PORT", Some("8081")));
        vars.push(("MEDIARELAY__PROVIDER__KIND", Some("local_fs")));
        vars.push(("MEDIARELAY__UPLOAD__TEMP_DIR", Some("/var/tmp/relay")));

        temp_env::with_vars(vars, || {
            let config = AppConfig::load().expect("should load");
            assert_eq!(config.server.port, 8081);
            assert_eq!(config.provider.kind, ProviderKind::LocalFs);
            assert_eq!(config.upload.temp_dir, PathBuf::from("/var/tmp/relay"));
        });
    }

    #[test]
    fn test_legacy_variables_override() {
        let mut vars = cleared();
        vars.retain(|(k, _)| {
            !matches!(
                *k,
                "PORT"
                    | "ALLOWED_ORIGINS"
                    | "CLOUDINARY_CLOUD_NAME"
                    | "CLOUDINARY_API_KEY"
                    | "CLOUDINARY_API_SECRET"
                    | "MEDIARELAY__SERVER__PORT"
            )
        });
        vars.push(("PORT", Some("7000")));
        vars.push(("MEDIARELAY__SERVER__PORT", Some("8081")));
        vars.push(("CLOUDINARY_CLOUD_NAME", Some("demo")));
        vars.push(("CLOUDINARY_API_KEY", Some("123456789012345")));
        vars.push(("CLOUDINARY_API_SECRET", Some("shh")));
        vars.push((
            "ALLOWED_ORIGINS",
            Some("http://localhost:5173, https://uploads.example.com"),
        ));

        temp_env::with_vars(vars, || {
            let config = AppConfig::load().expect("should load");
            assert_eq!(config.server.port, 7000);
            assert_eq!(config.provider.cloudinary.cloud_name, "demo");
            assert_eq!(config.provider.cloudinary.api_key, "123456789012345");
            assert_eq!(config.provider.cloudinary.api_secret, "shh");
            assert_eq!(
                config.server.allowed_origins,
                vec!["http://localhost:5173", "https://uploads.example.com"]
            );
        });
    }

    #[test]
    fn test_split_origins_drops_blanks() {
        assert_eq!(
            split_origins(" a ,, b ,"),
            vec!["a".to_string(), "b".to_string()]
        );
        assert!(split_origins("").is_empty());
    }

    #[test]
    fn test_bind_address() {
        let config = AppConfig::default();
        assert_eq!(config.bind_address(), "0.0.0.0:5000");
    }
}
