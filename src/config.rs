use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// How function calls are resolved against the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ParseMode {
    /// Unknown names and arity mismatches are parse errors
    #[default]
    Strict,
    /// Unresolvable calls become unchecked placeholders; used by tooling
    /// that needs tree shape, not executability
    Lenient,
}

/// Knobs shared by the parser and the include resolver.
///
/// ```toml
/// mode = "lenient"
/// max_tokens = 50000
/// max_nesting_depth = 64
/// max_include_depth = 20
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ParserConfig {
    pub mode: ParseMode,
    /// Upper bound on tokens pulled for one statement
    pub max_tokens: usize,
    /// Deepest nesting of parentheses, prefix operators, calls, filter
    /// groups and sub-selects; bounds parser recursion
    pub max_nesting_depth: usize,
    /// Levels of nested include expansion before giving up
    pub max_include_depth: usize,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            mode: ParseMode::Strict,
            max_tokens: 100_000,
            max_nesting_depth: 128,
            max_include_depth: 100,
        }
    }
}

impl ParserConfig {
    pub fn lenient() -> Self {
        Self {
            mode: ParseMode::Lenient,
            ..Self::default()
        }
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_fill_missing_keys() {
        let config = ParserConfig::from_toml_str("mode = \"lenient\"").unwrap();
        assert_eq!(config.mode, ParseMode::Lenient);
        assert_eq!(config.max_tokens, 100_000);
        assert_eq!(config.max_nesting_depth, 128);
        assert_eq!(config.max_include_depth, 100);
    }

    #[test]
    fn test_rejects_unknown_mode() {
        assert!(ParserConfig::from_toml_str("mode = \"sloppy\"").is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "max_tokens = 64\nmax_nesting_depth = 16\nmax_include_depth = 3").unwrap();
        let config = ParserConfig::load(file.path()).unwrap();
        assert_eq!(config.mode, ParseMode::Strict);
        assert_eq!(config.max_tokens, 64);
        assert_eq!(config.max_nesting_depth, 16);
        assert_eq!(config.max_include_depth, 3);
    }
}
