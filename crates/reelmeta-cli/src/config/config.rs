//! `AppConfig` struct and TOML read/write.

use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

/// Top-level application configuration.
#[derive(Debug, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct AppConfig {
    /// Request defaults sent to TMDB.
    #[serde(default)]
    pub tmdb: TmdbConfig,
}

/// Request defaults.
#[derive(Debug, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct TmdbConfig {
    /// Request language (`en`, `pt-BR`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    /// Comma separated image languages (`en,null`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include_image_language: Option<String>,
    /// ISO 3166-1 region for listings and searches.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
}

impl AppConfig {
    /// Loads config from a TOML file. Returns default if file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("failed to parse {}", path.display()))
    }

    /// Saves config to a TOML file, creating parent directories if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if directory creation or file write fails.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory {}", parent.display()))?;
        }
        let content = self.to_toml()?;
        std::fs::write(path, content).with_context(|| format!("failed to write {}", path.display()))
    }

    /// Renders the config as TOML.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("failed to serialize config to TOML")
    }

    /// Stores a request language after checking its shape.
    ///
    /// The code is checked against TMDB's tables only when a command
    /// connects.
    ///
    /// # Errors
    ///
    /// Returns an error unless the value looks like `xx` or `xx-YY`.
    pub fn set_language(&mut self, language: &str) -> Result<()> {
        let mut parts = language.split('-');
        let primary = parts.next().unwrap_or_default();
        let region = parts.next();
        let valid = is_code(primary)
            && region.is_none_or(is_code)
            && parts.next().is_none();
        if !valid {
            bail!("language must look like `en` or `en-US`, got `{language}`");
        }
        self.tmdb.language = Some(match region {
            Some(region) => format!("{}-{}", primary.to_lowercase(), region.to_uppercase()),
            None => primary.to_lowercase(),
        });
        Ok(())
    }

    /// Stores the default region, uppercased.
    ///
    /// # Errors
    ///
    /// Returns an error unless the value is two letters.
    pub fn set_region(&mut self, region: &str) -> Result<()> {
        if !is_code(region) {
            bail!("region must be a two letter ISO 3166-1 code, got `{region}`");
        }
        self.tmdb.region = Some(region.to_uppercase());
        Ok(())
    }

    /// Stores the image languages, lowercased. Each entry is an ISO 639-1
    /// code or `null` (images without text).
    ///
    /// # Errors
    ///
    /// Returns an error if the list is empty or an entry is malformed.
    pub fn set_image_languages(&mut self, languages: &str) -> Result<()> {
        let entries: Vec<String> = languages
            .split(',')
            .map(|entry| entry.trim().to_lowercase())
            .collect();
        if let Some(bad) = entries
            .iter()
            .find(|entry| entry.as_str() != "null" && !is_code(entry))
        {
            bail!("image languages must be two letter ISO 639-1 codes or `null`, got `{bad}`");
        }
        self.tmdb.include_image_language = Some(entries.join(","));
        Ok(())
    }
}

fn is_code(text: &str) -> bool {
    text.len() == 2 && text.bytes().all(|b| b.is_ascii_alphabetic())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn test_default_config() {
        // Arrange & Act
        let config = AppConfig::default();

        // Assert
        assert!(config.tmdb.language.is_none());
        assert!(config.tmdb.region.is_none());
    }

    #[test]
    fn test_load_nonexistent_returns_default() {
        // Arrange
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.toml");

        // Act
        let config = AppConfig::load(&path).unwrap();

        // Assert
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_save_and_load() {
        // Arrange
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let config = AppConfig {
            tmdb: TmdbConfig {
                language: Some(String::from("pt-BR")),
                include_image_language: Some(String::from("en,null")),
                region: Some(String::from("BR")),
            },
        };

        // Act
        config.save(&path).unwrap();
        let loaded = AppConfig::load(&path).unwrap();

        // Assert
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_rejects_malformed_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[tmdb\nlanguage = ").unwrap();

        let result = AppConfig::load(&path);

        assert!(result.is_err());
    }

    #[test]
    fn test_set_language_normalizes_case() {
        // Arrange
        let mut config = AppConfig::default();

        // Act
        config.set_language("PT-br").unwrap();

        // Assert
        assert_eq!(config.tmdb.language.as_deref(), Some("pt-BR"));
        assert!(config.set_language("english").is_err());
        assert!(config.set_language("en-US-x").is_err());
        assert_eq!(config.tmdb.language.as_deref(), Some("pt-BR"));
    }

    #[test]
    fn test_set_region() {
        let mut config = AppConfig::default();

        config.set_region("gb").unwrap();

        assert_eq!(config.tmdb.region.as_deref(), Some("GB"));
        assert!(config.set_region("GBR").is_err());
    }

    #[test]
    fn test_set_image_languages() {
        // Arrange
        let mut config = AppConfig::default();

        // Act
        config.set_image_languages("EN, null,ja").unwrap();

        // Assert
        assert_eq!(config.tmdb.include_image_language.as_deref(), Some("en,null,ja"));
        assert!(config.set_image_languages("english").is_err());
        assert!(config.set_image_languages("en,").is_err());
        assert_eq!(config.tmdb.include_image_language.as_deref(), Some("en,null,ja"));
    }
}
