//! # Configuration Management
//!
//! This module loads the companion backend's configuration from multiple sources:
//! - TOML configuration file (config.toml, optional)
//! - Environment variables (with APP_ prefix)
//! - Default values (built into the code)
//!
//! ## Configuration Priority (highest to lowest):
//! 1. `HOST` / `PORT` environment variables (deployment platforms set these)
//! 2. Environment variables such as `APP_SERVER__PORT` or `APP_UPLOADS__CLEANUP_DELAY_MS`
//! 3. Configuration file (config.toml)
//! 4. Default values (defined in the Default impl)
//!
//! ## Why `__` as the nesting separator:
//! Several keys contain underscores (`max_file_size_bytes`, `cleanup_delay_ms`),
//! so a single `_` cannot tell nesting apart from the key itself.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

/// MIME types accepted by the audio upload endpoint.
pub const DEFAULT_AUDIO_MIME_TYPES: [&str; 4] = ["audio/wav", "audio/mp3", "audio/webm", "audio/ogg"];

/// 10 MiB upload cap.
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;

/// Uploaded clips are removed one hour after they are accepted.
pub const DEFAULT_CLEANUP_DELAY_MS: u64 = 3_600_000;

/// Main application configuration, built once at startup and shared read-only.
///
/// ## Sections:
/// - `server`: where the HTTP listener binds
/// - `uploads`: where audio clips go, how big they may be, and how long they live
/// - `companion`: knobs for the simulated companion (random seed)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub uploads: UploadConfig,
    pub companion: CompanionConfig,
}

/// Server-specific configuration settings.
///
/// ## Common values:
/// - `host = "127.0.0.1"`: Only accept connections from localhost
/// - `host = "0.0.0.0"`: Accept connections from any interface (the default)
/// - `port = 3000`: Default listen port
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Audio upload settings.
///
/// ## Fields:
/// - `dir`: Directory uploaded clips are written to (created on first upload)
/// - `max_file_size_bytes`: Largest accepted clip; larger uploads are rejected with 400
/// - `allowed_mime_types`: Declared content types accepted for the `audio` field
/// - `cleanup_delay_ms`: How long a stored clip is kept before it is deleted
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    pub dir: String,
    pub max_file_size_bytes: u64,
    pub allowed_mime_types: Vec<String>,
    pub cleanup_delay_ms: u64,
}

/// Settings for the simulated companion behaviour.
///
/// `random_seed` pins greeting choice, mock transcription and mock vitals to a
/// reproducible sequence. Leave it unset for real randomness.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompanionConfig {
    pub random_seed: Option<u64>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 3000,
            },
            uploads: UploadConfig {
                dir: "./uploads/audio".to_string(),
                max_file_size_bytes: DEFAULT_MAX_UPLOAD_BYTES,
                allowed_mime_types: DEFAULT_AUDIO_MIME_TYPES.iter().map(|m| m.to_string()).collect(),
                cleanup_delay_ms: DEFAULT_CLEANUP_DELAY_MS,
            },
            companion: CompanionConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from multiple sources in priority order.
    ///
    /// ## Loading Process:
    /// 1. Start with built-in defaults
    /// 2. Override with values from config.toml (if it exists)
    /// 3. Override with `APP_`-prefixed environment variables
    /// 4. Apply the bare `HOST` and `PORT` variables last
    ///
    /// ## Environment Variable Examples:
    /// - `APP_SERVER__HOST=127.0.0.1`
    /// - `APP_UPLOADS__DIR=/var/lib/companion/audio`
    /// - `APP_COMPANION__RANDOM_SEED=42`
    /// - `PORT=8080`
    pub fn load() -> Result<Self> {
        let mut settings = config::Config::builder()
            .add_source(config::Config::try_from(&AppConfig::default())?)
            .add_source(config::File::with_name("config").required(false))
            .add_source(
                config::Environment::with_prefix("APP")
                    .prefix_separator("_")
                    .separator("__"),
            );

        if let Ok(host) = env::var("HOST") {
            settings = settings.set_override("server.host", host)?;
        }

        if let Ok(port) = env::var("PORT") {
            settings = settings.set_override("server.port", port)?;
        }

        let config = settings
            .build()?
            .try_deserialize()
            .context("invalid configuration")?;
        Ok(config)
    }

    /// Validate that the configuration values make sense.
    ///
    /// ## What this checks:
    /// - Server port is not 0
    /// - Upload directory is not empty
    /// - Upload size limit is greater than 0
    /// - At least one MIME type is accepted
    /// - Cleanup delay is greater than 0
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(anyhow::anyhow!("Server port cannot be 0"));
        }

        if self.uploads.dir.trim().is_empty() {
            return Err(anyhow::anyhow!("Upload directory cannot be empty"));
        }

        if self.uploads.max_file_size_bytes == 0 {
            return Err(anyhow::anyhow!("Max upload size must be greater than 0"));
        }

        if self.uploads.allowed_mime_types.is_empty() {
            return Err(anyhow::anyhow!("At least one audio MIME type must be allowed"));
        }

        if self.uploads.cleanup_delay_ms == 0 {
            return Err(anyhow::anyhow!("Cleanup delay must be greater than 0"));
        }

        Ok(())
    }

    /// Address the HTTP server binds to, e.g. `0.0.0.0:3000`.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

impl UploadConfig {
    pub fn dir_path(&self) -> PathBuf {
        PathBuf::from(&self.dir)
    }

    pub fn cleanup_delay(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.cleanup_delay_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.uploads.max_file_size_bytes, 10 * 1024 * 1024);
        assert_eq!(config.uploads.cleanup_delay_ms, 3_600_000);
        assert_eq!(
            config.uploads.allowed_mime_types,
            vec!["audio/wav", "audio/mp3", "audio/webm", "audio/ogg"]
        );
        assert!(config.companion.random_seed.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = AppConfig::default();
        config.server.port = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.uploads.allowed_mime_types.clear();
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.uploads.max_file_size_bytes = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.uploads.cleanup_delay_ms = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.uploads.dir = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_defaults_survive_config_round_trip() {
        // The loader seeds the builder from the Default impl, so the defaults
        // must come back out of the config crate intact.
        let built = config::Config::builder()
            .add_source(config::Config::try_from(&AppConfig::default()).unwrap())
            .build()
            .unwrap();
        let config: AppConfig = built.try_deserialize().unwrap();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.uploads.allowed_mime_types.len(), 4);
        assert!(config.companion.random_seed.is_none());
    }

    #[test]
    fn test_bind_addr_and_delay() {
        let mut config = AppConfig::default();
        config.server.host = "127.0.0.1".to_string();
        config.server.port = 8081;
        config.uploads.cleanup_delay_ms = 1500;
        assert_eq!(config.bind_addr(), "127.0.0.1:8081");
        assert_eq!(config.uploads.cleanup_delay().as_millis(), 1500);
        assert_eq!(config.uploads.dir_path(), PathBuf::from("./uploads/audio"));
    }
}
