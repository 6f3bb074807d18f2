//! Centralized, layered configuration for codetriever.
//!
//! Every tunable the pipeline kernel reads is a [`Constant`] declared once
//! in [`constants`], with a declared type tag, a default, and an
//! environment-variable name. Resolution order is always explicit `set` >
//! environment variable (coerced to the constant's tag) > default; a
//! constant declared frozen refuses `set` outright. This replaces dynamic
//! per-field typing with one small, testable coercion function per tag
//! (see [`value::ConfigValue::coerce`]).
//!
//! [`ApplicationConfig`] layers on top of the constant registry for the
//! handful of settings that are structural rather than tunable — the
//! on-disk app directory and the active deployment [`Profile`] — loaded
//! through the same [`ConfigurationSource`] composition the rest of the
//! workspace already uses for environment/file precedence.

pub mod constant;
pub mod constants;
pub mod error;
pub mod profile;
pub mod source;
pub mod validation;
pub mod value;

pub use constant::Constant;
pub use error::{ConfigError, ConfigResult};
pub use profile::Profile;
pub use value::ConfigValue;

use std::path::PathBuf;

/// Structural, non-tunable application settings: where everything lives on
/// disk and which deployment profile is active.
#[derive(Debug, Clone)]
pub struct ApplicationConfig {
    pub profile: Profile,
    /// App directory root. Defaults to `~/.mcp-brag`.
    pub app_dir: PathBuf,
}

impl ApplicationConfig {
    /// Build a config for an explicit profile, app dir resolved from the
    /// environment (`CODETRIEVER_APP_DIR`) or the default `~/.mcp-brag`.
    #[must_use]
    pub fn with_profile(profile: Profile) -> Self {
        let app_dir = std::env::var("CODETRIEVER_APP_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| default_app_dir());
        Self { profile, app_dir }
    }

    /// Path to `config.yaml` under the app dir.
    #[must_use]
    pub fn config_file_path(&self) -> PathBuf {
        self.app_dir.join("config.yaml")
    }

    /// Path to the embedded vector index database file.
    #[must_use]
    pub fn embeddings_db_path(&self) -> PathBuf {
        self.app_dir
            .join("data")
            .join("sqlite_db_files")
            .join("embeddings.db")
    }

    /// Root directory for per-download-task temp audio directories.
    #[must_use]
    pub fn temp_audio_dir(&self) -> PathBuf {
        self.app_dir.join("temp_audio")
    }

    /// Root directory for persisted transcription text files.
    #[must_use]
    pub fn audio_transcriptions_dir(&self) -> PathBuf {
        self.app_dir.join("audio_transcriptions")
    }

    /// Create every directory in the on-disk layout that doesn't exist yet.
    ///
    /// # Errors
    /// Returns an error if any directory cannot be created.
    pub fn ensure_layout(&self) -> ConfigResult<()> {
        for dir in [
            self.app_dir.clone(),
            self.embeddings_db_path()
                .parent()
                .expect("embeddings db always has a parent")
                .to_path_buf(),
            self.temp_audio_dir(),
            self.audio_transcriptions_dir(),
        ] {
            std::fs::create_dir_all(&dir)?;
        }
        Ok(())
    }
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self::with_profile(Profile::default())
    }
}

fn default_app_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".mcp-brag")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn on_disk_layout_matches_design() {
        let cfg = ApplicationConfig {
            profile: Profile::Test,
            app_dir: PathBuf::from("/tmp/mcp-brag-test"),
        };
        assert_eq!(
            cfg.config_file_path(),
            PathBuf::from("/tmp/mcp-brag-test/config.yaml")
        );
        assert_eq!(
            cfg.embeddings_db_path(),
            PathBuf::from("/tmp/mcp-brag-test/data/sqlite_db_files/embeddings.db")
        );
        assert_eq!(
            cfg.temp_audio_dir(),
            PathBuf::from("/tmp/mcp-brag-test/temp_audio")
        );
        assert_eq!(
            cfg.audio_transcriptions_dir(),
            PathBuf::from("/tmp/mcp-brag-test/audio_transcriptions")
        );
    }
}
