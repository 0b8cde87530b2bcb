//! Conversion-request construction.
//!
//! `build` is a pure function over the configuration snapshot, the base
//! resource path, and the current left-side context. It is re-evaluated for
//! every conversion request — profile and context can change between
//! keystrokes, so nothing here is cached.

use std::path::{Path, PathBuf};

use crate::config::ConfigSnapshot;

/// Product/version string attached identically to every request.
pub const VERSION_STRING: &str = concat!("kanabridge/", env!("CARGO_PKG_VERSION"));

/// Dictionary directory under the base resource path.
const DICTIONARY_DIR: &str = "Dictionary";
/// Emoji/text-replacement data file under the base resource path.
const TEXT_REPLACER_FILE: &str = "EmojiDictionary/emoji_all_E15.1.txt";
/// Scratch/working directory; fixed relative path, never user data.
const SCRATCH_DIR: &str = "./work";
/// Model-weight file for personalization, directly under the base path.
const MODEL_WEIGHT_FILE: &str = "model.gguf";
/// Personalization inference budget: one pass per request.
const INFERENCE_LIMIT: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    JaJp,
}

/// Personalization is a tagged mode: either fully off or fully on. There is
/// no way to carry a stale profile alongside a disabled flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersonalizationMode {
    Off,
    On {
        /// Model weight file.
        weight: PathBuf,
        /// Inference passes allowed for this request.
        inference_limit: u32,
        /// Ask the engine for more numerous/diverse candidates.
        rich_candidates: bool,
        /// Free-text user description biasing generation.
        profile: String,
        /// Text committed to the left of the composition.
        left_context: String,
    },
}

impl PersonalizationMode {
    pub fn is_on(&self) -> bool {
        matches!(self, Self::On { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestMetadata {
    pub version_string: &'static str,
}

/// Options for one conversion request, handed to the engine as-is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionRequest {
    pub language: Language,
    /// Engine-side learning/adaptation. Always disabled; the host owns
    /// history, not the engine.
    pub learning_enabled: bool,
    pub dictionary_dir: PathBuf,
    pub text_replacer: PathBuf,
    pub scratch_dir: PathBuf,
    pub personalization: PersonalizationMode,
    pub metadata: RequestMetadata,
}

/// Assemble the options for one request. `context` is the session's current
/// left-side context; it only reaches the engine when personalization is on.
pub fn build(config: &ConfigSnapshot, base_path: &Path, context: &str) -> ConversionRequest {
    let personalization = if config.enabled {
        PersonalizationMode::On {
            weight: base_path.join(MODEL_WEIGHT_FILE),
            inference_limit: INFERENCE_LIMIT,
            rich_candidates: true,
            profile: config.profile.clone(),
            left_context: context.to_owned(),
        }
    } else {
        PersonalizationMode::Off
    };

    ConversionRequest {
        language: Language::JaJp,
        learning_enabled: false,
        dictionary_dir: base_path.join(DICTIONARY_DIR),
        text_replacer: base_path.join(TEXT_REPLACER_FILE),
        scratch_dir: PathBuf::from(SCRATCH_DIR),
        personalization,
        metadata: RequestMetadata {
            version_string: VERSION_STRING,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Backend;

    fn config(enabled: bool, profile: &str) -> ConfigSnapshot {
        ConfigSnapshot {
            enabled,
            profile: profile.to_owned(),
            backend: Backend::Cpu,
        }
    }

    #[test]
    fn fixed_resource_paths() {
        let req = build(&config(false, ""), Path::new("/opt/ime"), "");
        assert_eq!(req.dictionary_dir, Path::new("/opt/ime/Dictionary"));
        assert_eq!(
            req.text_replacer,
            Path::new("/opt/ime/EmojiDictionary/emoji_all_E15.1.txt")
        );
        assert_eq!(req.scratch_dir, Path::new("./work"));
        assert!(!req.learning_enabled);
        assert_eq!(req.metadata.version_string, VERSION_STRING);
    }

    #[test]
    fn disabled_omits_payload_entirely() {
        let req = build(&config(false, "stale profile"), Path::new("/opt/ime"), "stale context");
        // Not an "off" flag next to stale data: the variant carries nothing.
        assert_eq!(req.personalization, PersonalizationMode::Off);
    }

    #[test]
    fn enabled_carries_profile_and_context() {
        let req = build(&config(true, "casual writer"), Path::new("/opt/ime"), "今日は");
        match req.personalization {
            PersonalizationMode::On {
                ref weight,
                inference_limit,
                rich_candidates,
                ref profile,
                ref left_context,
            } => {
                assert_eq!(weight, Path::new("/opt/ime/model.gguf"));
                assert_eq!(inference_limit, 1);
                assert!(rich_candidates);
                assert_eq!(profile, "casual writer");
                assert_eq!(left_context, "今日は");
            }
            PersonalizationMode::Off => panic!("personalization should be on"),
        }
    }

    #[test]
    fn rebuild_sees_updated_context() {
        let cfg = config(true, "p");
        let first = build(&cfg, Path::new("/b"), "one");
        let second = build(&cfg, Path::new("/b"), "two");
        assert_ne!(first.personalization, second.personalization);
    }
}
