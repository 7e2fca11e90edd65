//! Inlining thresholds
//!
//! One `InliningConfig` is resolved per compilation unit, before the inlining
//! phase starts, and is never mutated while decisions are being made.

use crate::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;

pub const ENV_INLINE_EVERYTHING: &str = "OTTER_INLINE_EVERYTHING";
pub const ENV_MAX_DESIRED_SIZE: &str = "OTTER_INLINE_MAX_DESIRED_SIZE";
pub const ENV_MAX_INLINING_SIZE: &str = "OTTER_INLINE_MAX_INLINING_SIZE";
pub const ENV_TRIVIAL_SIZE: &str = "OTTER_INLINE_TRIVIAL_SIZE";
pub const ENV_SMALL_COMPILED_SIZE: &str = "OTTER_INLINE_SMALL_COMPILED_SIZE";
pub const ENV_LIMIT_INVOKES: &str = "OTTER_INLINE_LIMIT_INVOKES";

/// Thresholds consulted by the inlining policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InliningConfig {
    /// Inline every candidate, ignoring all size limits
    pub inline_everything: bool,

    /// Caller graph size (in nodes) at which inlining stops for the unit
    pub maximum_desired_size: usize,

    /// Base node bound for the relevance-scaled size test
    pub maximum_inlining_size: usize,

    /// Callees below this node count are always cheap enough to inline
    pub trivial_inlining_size: usize,

    /// Cap on the size of a callee's previous standalone compilation.
    /// Zero or negative disables the check.
    pub small_compiled_low_level_graph_size: i64,

    /// Cap on the summed probability of the calls nested in a callee.
    /// Zero or negative disables the check.
    pub limit_inlined_invokes: f64,
}

impl Default for InliningConfig {
    fn default() -> Self {
        Self {
            inline_everything: false,
            maximum_desired_size: 20_000,
            maximum_inlining_size: 300,
            trivial_inlining_size: 10,
            small_compiled_low_level_graph_size: 300,
            limit_inlined_invokes: 5.0,
        }
    }
}

impl InliningConfig {
    /// Load configuration from environment variables.
    ///
    /// Malformed values are logged and the default is kept.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        for err in config.apply_overrides(env_lookup) {
            tracing::warn!(%err, "ignoring inlining override");
        }
        config
    }

    /// Load configuration from environment variables, failing on the first
    /// malformed value.
    pub fn try_from_env() -> Result<Self, ConfigError> {
        Self::try_from_lookup(env_lookup)
    }

    /// Defaults overridden by `lookup`, failing on the first malformed value
    pub fn try_from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Self::default().try_merge_with(lookup)
    }

    /// Apply every override `lookup` knows about. Well-formed values are
    /// applied even if others fail; the failures are returned.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Vec<ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut errors = Vec::new();

        override_field(&lookup, ENV_INLINE_EVERYTHING, &mut self.inline_everything, &mut errors);
        override_field(&lookup, ENV_MAX_DESIRED_SIZE, &mut self.maximum_desired_size, &mut errors);
        override_field(&lookup, ENV_MAX_INLINING_SIZE, &mut self.maximum_inlining_size, &mut errors);
        override_field(&lookup, ENV_TRIVIAL_SIZE, &mut self.trivial_inlining_size, &mut errors);
        override_field(
            &lookup,
            ENV_SMALL_COMPILED_SIZE,
            &mut self.small_compiled_low_level_graph_size,
            &mut errors,
        );

        let mut limit = self.limit_inlined_invokes;
        override_field(&lookup, ENV_LIMIT_INVOKES, &mut limit, &mut errors);
        if limit.is_finite() {
            self.limit_inlined_invokes = limit;
        } else {
            errors.push(ConfigError::InvalidValue {
                key: ENV_LIMIT_INVOKES.to_string(),
                value: limit.to_string(),
            });
        }

        errors
    }

    /// Merge with environment variables (env vars take precedence)
    pub fn merge_with_env(mut self) -> Self {
        for err in self.apply_overrides(env_lookup) {
            tracing::warn!(%err, "ignoring inlining override");
        }
        self
    }

    /// Merge with environment variables, failing on the first malformed value
    pub fn try_merge_with_env(self) -> Result<Self, ConfigError> {
        self.try_merge_with(env_lookup)
    }

    fn try_merge_with<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        match self.apply_overrides(lookup).into_iter().next() {
            Some(err) => Err(err),
            None => Ok(self),
        }
    }

    /// Load configuration from TOML file
    #[cfg(feature = "toml-config")]
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&contents).map_err(|err| ConfigError::Parse {
            path: path.to_path_buf(),
            message: err.to_string(),
        })
    }

    /// Load configuration from TOML file (stub when toml feature is disabled)
    #[cfg(not(feature = "toml-config"))]
    pub fn from_file(_path: &Path) -> Result<Self, ConfigError> {
        Err(ConfigError::TomlDisabled)
    }

    /// Threshold for the previous compiled-size check, if enabled
    pub fn previous_size_limit(&self) -> Option<f64> {
        (self.small_compiled_low_level_graph_size > 0)
            .then_some(self.small_compiled_low_level_graph_size as f64)
    }

    /// Threshold for the nested invoke probability check, if enabled
    pub fn invoke_probability_limit(&self) -> Option<f64> {
        (self.limit_inlined_invokes > 0.0).then_some(self.limit_inlined_invokes)
    }
}

fn env_lookup(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

fn override_field<T, F>(lookup: &F, key: &str, field: &mut T, errors: &mut Vec<ConfigError>)
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(key) else {
        return;
    };
    match raw.trim().parse() {
        Ok(value) => *field = value,
        Err(_) => errors.push(ConfigError::InvalidValue {
            key: key.to_string(),
            value: raw,
        }),
    }
}
