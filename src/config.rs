//! Configuration file support.
//!
//! The command line tool reads defaults and key storage locations from a TOML
//! file. The library itself never loads configuration on its own; callers
//! turn a [`CsrKitConfig`] into a provider with [`CsrKitConfig::key_provider`].

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::CsrKitError;
use crate::profile::{ECC_KEY_LENGTHS, KeyAlgorithm, RSA_KEY_LENGTHS};
use crate::provider::SoftwareKeyProvider;

pub type Result<T> = std::result::Result<T, CsrKitError>;

/// Algorithm names as written in the configuration file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ConfiguredAlgorithm {
    #[default]
    Rsa,
    Ecc,
}

impl From<ConfiguredAlgorithm> for KeyAlgorithm {
    fn from(value: ConfiguredAlgorithm) -> Self {
        match value {
            ConfiguredAlgorithm::Rsa => KeyAlgorithm::Rsa,
            ConfiguredAlgorithm::Ecc => KeyAlgorithm::Ecc,
        }
    }
}

/// Tool configuration.
///
/// ```toml
/// default_algorithm = "ecc"
/// default_ecc_key_length = 384
/// machine_key_directory = "/var/lib/csrkit/keys"
/// user_key_directory = "/home/me/.local/share/csrkit/keys"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CsrKitConfig {
    /// Algorithm used when none is given on the command line.
    pub default_algorithm: ConfiguredAlgorithm,

    /// RSA key length used when none is given on the command line.
    pub default_rsa_key_length: Option<u32>,

    /// ECC key length used when none is given on the command line.
    pub default_ecc_key_length: Option<u32>,

    /// Where machine context keys are written, if anywhere.
    pub machine_key_directory: Option<PathBuf>,

    /// Where user context keys are written, if anywhere.
    pub user_key_directory: Option<PathBuf>,
}

impl CsrKitConfig {
    /// Default location: `<config dir>/csrkit/config.toml`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("csrkit").join("config.toml"))
    }

    /// Loads the configuration from `path`.
    pub fn load(path: &Path) -> Result<Self> {
        log::debug!("Loading configuration from: {}", path.display());

        let content = fs::read_to_string(path).map_err(|e| {
            CsrKitError::ConfigurationError(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;

        let config: CsrKitConfig = toml::from_str(&content).map_err(|e| {
            CsrKitError::ConfigurationError(format!("Failed to parse config file: {e}"))
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Loads `path` when given, otherwise the default location if it exists,
    /// otherwise the built-in defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => match Self::default_path().filter(|p| p.exists()) {
                Some(default) => Self::load(&default),
                None => Ok(Self::default()),
            },
        }
    }

    /// Writes the configuration to `path`, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                CsrKitError::ConfigurationError(format!(
                    "Failed to create config directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let content = toml::to_string_pretty(self).map_err(|e| {
            CsrKitError::ConfigurationError(format!("Failed to serialize config: {e}"))
        })?;

        fs::write(path, content).map_err(|e| {
            CsrKitError::ConfigurationError(format!(
                "Failed to write config file {}: {}",
                path.display(),
                e
            ))
        })
    }

    /// Rejects default key lengths the resolver would refuse.
    pub fn validate(&self) -> Result<()> {
        let checks = [
            ("default_rsa_key_length", self.default_rsa_key_length, RSA_KEY_LENGTHS),
            ("default_ecc_key_length", self.default_ecc_key_length, ECC_KEY_LENGTHS),
        ];
        for (field, value, allowed) in checks {
            if let Some(length) = value {
                if !allowed.contains(&length) {
                    return Err(CsrKitError::ConfigurationError(format!(
                        "{field} = {length} is not one of {allowed:?}"
                    )));
                }
            }
        }
        Ok(())
    }

    /// Key length to request for `algorithm` when the caller gave none.
    pub fn default_key_length(&self, algorithm: KeyAlgorithm) -> Option<u32> {
        match algorithm {
            KeyAlgorithm::Rsa => self.default_rsa_key_length,
            KeyAlgorithm::Ecc => self.default_ecc_key_length,
        }
    }

    /// A software provider writing keys to the configured directories.
    pub fn key_provider(&self) -> SoftwareKeyProvider {
        let mut provider = SoftwareKeyProvider::new();
        if let Some(dir) = &self.machine_key_directory {
            provider = provider.with_machine_key_directory(dir);
        }
        if let Some(dir) = &self.user_key_directory {
            provider = provider.with_user_key_directory(dir);
        }
        provider
    }
}
