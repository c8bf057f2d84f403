use config::{Config, ConfigError, Environment};
use serde::Deserialize;

/// Run settings for the dump walker. Loaded from `WIKI_*` environment
/// variables, then overridden by command-line flags.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Settings {
    /// Stop after this many pages (skipped pages count).
    pub limit: Option<usize>,
    /// Upper bound on normalizer passes per article; 1 is single-pass.
    pub max_passes: usize,
    /// Pages normalized in parallel per batch.
    pub chunk_size: usize,
    /// Log a progress line every this many pages.
    pub progress_every: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            limit: None,
            max_passes: 1,
            chunk_size: 500,
            progress_every: 1000,
        }
    }
}

impl Settings {
    /// Defaults, then `WIKI_LIMIT`, `WIKI_MAX_PASSES`, `WIKI_CHUNK_SIZE`,
    /// `WIKI_PROGRESS_EVERY`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::load(Environment::with_prefix("WIKI").try_parsing(true))
    }

    fn load(env: Environment) -> Result<Self, ConfigError> {
        let defaults = Settings::default();
        let settings: Settings = Config::builder()
            .set_default("max_passes", defaults.max_passes as u64)?
            .set_default("chunk_size", defaults.chunk_size as u64)?
            .set_default("progress_every", defaults.progress_every as u64)?
            .add_source(env)
            .build()?
            .try_deserialize()?;
        Ok(settings.clamped())
    }

    /// Apply command-line overrides; `None` keeps the loaded value.
    pub fn with_overrides(
        mut self,
        limit: Option<usize>,
        max_passes: Option<usize>,
        chunk_size: Option<usize>,
    ) -> Self {
        if limit.is_some() {
            self.limit = limit;
        }
        if let Some(n) = max_passes {
            self.max_passes = n;
        }
        if let Some(n) = chunk_size {
            self.chunk_size = n;
        }
        self.clamped()
    }

    fn clamped(mut self) -> Self {
        self.max_passes = self.max_passes.max(1);
        self.chunk_size = self.chunk_size.max(1);
        self.progress_every = self.progress_every.max(1);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(vars: &[(&str, &str)]) -> Environment {
        let source: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Environment::with_prefix("WIKI")
            .try_parsing(true)
            .source(Some(source))
    }

    #[test]
    fn defaults_without_env() {
        let settings = Settings::load(env(&[])).unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn env_overrides_defaults() {
        let settings = Settings::load(env(&[
            ("WIKI_LIMIT", "25"),
            ("WIKI_MAX_PASSES", "3"),
            ("WIKI_PROGRESS_EVERY", "10"),
        ]))
        .unwrap();
        assert_eq!(settings.limit, Some(25));
        assert_eq!(settings.max_passes, 3);
        assert_eq!(settings.chunk_size, 500);
        assert_eq!(settings.progress_every, 10);
    }

    #[test]
    fn cli_overrides_win() {
        let settings = Settings::default().with_overrides(Some(5), Some(4), None);
        assert_eq!(settings.limit, Some(5));
        assert_eq!(settings.max_passes, 4);
        assert_eq!(settings.chunk_size, 500);
    }

    #[test]
    fn zero_values_clamped() {
        let settings = Settings::default().with_overrides(None, Some(0), Some(0));
        assert_eq!(settings.max_passes, 1);
        assert_eq!(settings.chunk_size, 1);
    }
}
