//! Runtime configuration: the in-memory snapshot and the settings document
//! it is seeded from.
//!
//! The store is a JSON document next to the engine resources. A missing or
//! malformed document never fails initialization — the defaults win, a
//! warning is logged, and the fallback is queryable so the host (and tests)
//! can observe it.

use std::path::Path;
use std::str::FromStr;

use serde::Deserialize;
use tracing::warn;

/// Compute backend requested for personalization inference. Which backends
/// actually work on the host is reported by [`crate::capability::probe`];
/// this value is never validated against it here — the host is responsible
/// for only offering available backends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    Cpu,
    Cuda,
    Vulkan,
}

impl Backend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Backend::Cpu => "cpu",
            Backend::Cuda => "cuda",
            Backend::Vulkan => "vulkan",
        }
    }
}

impl FromStr for Backend {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cpu" => Ok(Backend::Cpu),
            "cuda" => Ok(Backend::Cuda),
            "vulkan" => Ok(Backend::Vulkan),
            _ => Err(()),
        }
    }
}

/// In-memory configuration cache. Loaded once at startup, mutated in place
/// by the configuration entry points, read by the request builder on every
/// conversion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigSnapshot {
    /// Whether personalization mode is requested.
    pub enabled: bool,
    /// Free-text user description fed to personalization.
    pub profile: String,
    pub backend: Backend,
}

/// Snapshot plus the pieces that live outside it: the stored left-side
/// context (seeds the session) and whether defaults were substituted.
#[derive(Debug, Clone, Default)]
pub struct LoadedConfig {
    pub snapshot: ConfigSnapshot,
    pub context: String,
    pub using_defaults: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read settings: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed settings document: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Default, Deserialize)]
struct SettingsDoc {
    #[serde(default)]
    personalization: PersonalizationDoc,
    #[serde(default)]
    context: String,
}

#[derive(Debug, Default, Deserialize)]
struct PersonalizationDoc {
    #[serde(default)]
    enabled: bool,
    #[serde(default)]
    profile: String,
    #[serde(default)]
    backend: Backend,
}

fn read_settings(path: &Path) -> Result<SettingsDoc, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

/// Load the settings document, substituting defaults on any failure.
pub fn load_or_default(path: &Path) -> LoadedConfig {
    match read_settings(path) {
        Ok(doc) => LoadedConfig {
            snapshot: ConfigSnapshot {
                enabled: doc.personalization.enabled,
                profile: doc.personalization.profile,
                backend: doc.personalization.backend,
            },
            context: doc.context,
            using_defaults: false,
        },
        Err(err) => {
            warn!(path = %path.display(), %err, "settings load failed, using defaults");
            LoadedConfig {
                using_defaults: true,
                ..LoadedConfig::default()
            }
        }
    }
}
