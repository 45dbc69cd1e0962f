//! Per-facade lookup tables and request preferences.
//!
//! Every object built by the dispatcher receives a `&Context` so that
//! country, language and genre references resolve against the tables
//! loaded by the owning [`Tmdb`](crate::Tmdb) instance.

use std::collections::BTreeMap;

use crate::error::{Result, TmdbError};
use crate::objs::{Country, Genre, Language};

/// Image base used until the configuration has been loaded.
const DEFAULT_IMAGE_BASE_URL: &str = "https://image.tmdb.org/t/p/original";

/// Lookup tables and preferences shared by all objects of one facade.
#[derive(Debug, Clone)]
pub struct Context {
    /// Request language (ISO 639-1 or primary translation code).
    language: String,
    /// `include_image_language` query value for full loads.
    include_image_language: Option<String>,
    /// `include_video_language` query value for full loads.
    include_video_language: Option<String>,
    /// Prefix for image paths, including the size segment.
    image_base_url: String,
    /// Countries by lowercase ISO 3166-1 code.
    countries: BTreeMap<String, Country>,
    /// Languages by lowercase ISO 639-1 code.
    languages: BTreeMap<String, Language>,
    /// Primary translations by lowercase code, mapped to their canonical spelling.
    translations: BTreeMap<String, String>,
    /// Movie genres by id.
    movie_genres: BTreeMap<u64, Genre>,
    /// TV genres by id.
    tv_genres: BTreeMap<u64, Genre>,
    /// Whether lists are read through the v4 API.
    v4_lists: bool,
}

impl Default for Context {
    fn default() -> Self {
        Self {
            language: String::from("en"),
            include_image_language: None,
            include_video_language: None,
            image_base_url: String::from(DEFAULT_IMAGE_BASE_URL),
            countries: BTreeMap::new(),
            languages: BTreeMap::new(),
            translations: BTreeMap::new(),
            movie_genres: BTreeMap::new(),
            tv_genres: BTreeMap::new(),
            v4_lists: false,
        }
    }
}

impl Context {
    /// Current request language.
    #[must_use]
    pub fn language(&self) -> &str {
        &self.language
    }

    /// `include_image_language` preference.
    #[must_use]
    pub fn include_image_language(&self) -> Option<&str> {
        self.include_image_language.as_deref()
    }

    /// `include_video_language` preference.
    #[must_use]
    pub fn include_video_language(&self) -> Option<&str> {
        self.include_video_language.as_deref()
    }

    /// Whether lists are read through the v4 API.
    #[must_use]
    pub const fn v4_lists(&self) -> bool {
        self.v4_lists
    }

    /// Full URL of an image path.
    #[must_use]
    pub fn image_url(&self, path: &str) -> String {
        format!("{}{path}", self.image_base_url)
    }

    /// Country by ISO 3166-1 code, case-insensitive.
    #[must_use]
    pub fn country(&self, code: &str) -> Option<&Country> {
        self.countries.get(&code.to_lowercase())
    }

    /// Language by ISO 639-1 code, case-insensitive.
    #[must_use]
    pub fn language_entry(&self, code: &str) -> Option<&Language> {
        self.languages.get(&code.to_lowercase())
    }

    /// Movie genre by id.
    #[must_use]
    pub fn movie_genre(&self, id: u64) -> Option<&Genre> {
        self.movie_genres.get(&id)
    }

    /// TV genre by id.
    #[must_use]
    pub fn tv_genre(&self, id: u64) -> Option<&Genre> {
        self.tv_genres.get(&id)
    }

    /// All movie genres, ordered by id.
    pub fn movie_genres(&self) -> impl Iterator<Item = &Genre> {
        self.movie_genres.values()
    }

    /// All TV genres, ordered by id.
    pub fn tv_genres(&self) -> impl Iterator<Item = &Genre> {
        self.tv_genres.values()
    }

    /// Validates a country code against the loaded table and returns it
    /// upper-cased.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for unknown codes.
    pub fn validate_country(&self, code: &str) -> Result<String> {
        if self.countries.contains_key(&code.to_lowercase()) {
            Ok(code.to_uppercase())
        } else {
            Err(TmdbError::invalid(format!(
                "Country: {code} is invalid see Configuration.countries for the options."
            )))
        }
    }

    /// Validates a language code against the ISO 639-1 table.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for unknown codes.
    pub fn validate_language(&self, code: &str) -> Result<String> {
        let lower = code.to_lowercase();
        if self.languages.contains_key(&lower) {
            Ok(lower)
        } else {
            Err(TmdbError::invalid(format!(
                "Language: {code} is invalid see Configuration.languages for the options."
            )))
        }
    }

    /// Validates a language code against the ISO 639-1 table, falling back
    /// to the primary translations (`pt-BR` style codes).
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` when the code is in neither table.
    pub fn validate_request_language(&self, code: &str) -> Result<String> {
        self.validate_language(code).or_else(|_| {
            self.translations
                .get(&code.to_lowercase())
                .cloned()
                .ok_or_else(|| {
                    TmdbError::invalid(format!(
                        "Language: {code} is invalid see Configuration.languages and Configuration.primary_translations for the options."
                    ))
                })
        })
    }

    pub(crate) fn set_language(&mut self, language: String) {
        self.language = language;
    }

    pub(crate) fn set_include_image_language(&mut self, value: Option<String>) {
        self.include_image_language = value;
    }

    pub(crate) fn set_include_video_language(&mut self, value: Option<String>) {
        self.include_video_language = value;
    }

    pub(crate) fn set_image_base_url(&mut self, url: String) {
        self.image_base_url = url;
    }

    pub(crate) const fn set_v4_lists(&mut self, enabled: bool) {
        self.v4_lists = enabled;
    }

    pub(crate) fn insert_country(&mut self, country: Country) {
        if let Some(code) = &country.iso_3166_1 {
            self.countries.insert(code.to_lowercase(), country);
        }
    }

    pub(crate) fn insert_language(&mut self, language: Language) {
        if let Some(code) = &language.iso_639_1 {
            self.languages.insert(code.to_lowercase(), language);
        }
    }

    pub(crate) fn insert_translation(&mut self, code: &str) {
        self.translations
            .insert(code.to_lowercase(), String::from(code));
    }

    pub(crate) fn insert_movie_genre(&mut self, genre: Genre) {
        if let Some(id) = genre.id {
            self.movie_genres.insert(id, genre);
        }
    }

    pub(crate) fn insert_tv_genre(&mut self, genre: Genre) {
        if let Some(id) = genre.id {
            self.tv_genres.insert(id, genre);
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    fn context() -> Context {
        let mut ctx = Context::default();
        ctx.insert_country(Country {
            iso_3166_1: Some(String::from("GB")),
            name: Some(String::from("United Kingdom")),
            native_name: None,
        });
        ctx.insert_language(Language {
            iso_639_1: Some(String::from("fr")),
            english_name: Some(String::from("French")),
            name: Some(String::from("Français")),
        });
        ctx.insert_translation("pt-BR");
        ctx
    }

    #[test]
    fn test_validate_country_is_case_insensitive() {
        // Arrange
        let ctx = context();

        // Act
        let valid = ctx.validate_country("gb");
        let invalid = ctx.validate_country("xx");

        // Assert
        assert_eq!(valid.unwrap(), "GB");
        assert!(matches!(invalid, Err(TmdbError::InvalidArgument(_))));
    }

    #[test]
    fn test_validate_request_language_falls_back_to_translations() {
        let ctx = context();
        assert_eq!(ctx.validate_request_language("FR").unwrap(), "fr");
        assert_eq!(ctx.validate_request_language("pt-br").unwrap(), "pt-BR");
        assert!(ctx.validate_request_language("zz").is_err());
        assert!(ctx.validate_language("pt-BR").is_err());
    }

    #[test]
    fn test_image_url_uses_base() {
        let mut ctx = Context::default();
        ctx.set_image_base_url(String::from("https://img.example/original"));
        assert_eq!(ctx.image_url("/a.png"), "https://img.example/original/a.png");
    }
}
