//! API configuration: image sizes and the lookup tables.
//!
//! The facade loads this once on connect and copies countries, languages,
//! primary translations and the secure image base URL into its
//! [`Context`].

use crate::coerce::Kind;
use crate::context::Context;
use crate::entity::{Entity, EntityId, Fields, FromPayload, Reload, Seed, lazy_fields};
use crate::error::Result;
use crate::transport::ApiRequest;

use super::{Country, Department, Language, Timezones};

/// TMDB configuration.
pub type Configuration = Entity<ConfigurationData>;

lazy_fields! {
    /// Fields of a [`Configuration`].
    pub struct ConfigurationData {
        /// Backdrop sizes.
        pub backdrop_sizes: Vec<String>,
        /// Plain HTTP image base URL.
        pub base_image_url: Option<String>,
        /// Keys reported by the change lists.
        pub change_keys: Vec<String>,
        /// Countries.
        pub countries: Vec<Country>,
        /// Departments and their jobs.
        pub departments: Vec<Department>,
        /// Languages.
        pub languages: Vec<Language>,
        /// Logo sizes.
        pub logo_sizes: Vec<String>,
        /// Poster sizes.
        pub poster_sizes: Vec<String>,
        /// Primary translations, e.g. `en-US`.
        pub primary_translations: Vec<String>,
        /// Profile sizes.
        pub profile_sizes: Vec<String>,
        /// HTTPS image base URL.
        pub secure_base_image_url: Option<String>,
        /// Still sizes.
        pub still_sizes: Vec<String>,
        /// Timezones by country.
        pub timezones: Vec<Timezones>,
    }
}

impl FromPayload for ConfigurationData {
    fn populate(f: &mut Fields<'_>) -> Result<Self> {
        Ok(Self {
            backdrop_sizes: f.list("backdrop_sizes", &["images", "backdrop_sizes"], Kind::Str)?,
            base_image_url: f.at("base_image_url", &["images", "base_url"], Kind::Str)?,
            change_keys: f.list("change_keys", &["change_keys"], Kind::Str)?,
            countries: f.list("countries", &["countries"], Kind::LoadCountry)?,
            departments: f.list("departments", &["jobs"], Kind::LoadDepartment)?,
            languages: f.list("languages", &["languages"], Kind::LoadLanguage)?,
            logo_sizes: f.list("logo_sizes", &["images", "logo_sizes"], Kind::Str)?,
            poster_sizes: f.list("poster_sizes", &["images", "poster_sizes"], Kind::Str)?,
            primary_translations: f.list(
                "primary_translations",
                &["primary_translations"],
                Kind::Str,
            )?,
            profile_sizes: f.list("profile_sizes", &["images", "profile_sizes"], Kind::Str)?,
            secure_base_image_url: f.at(
                "secure_base_image_url",
                &["images", "secure_base_url"],
                Kind::Str,
            )?,
            still_sizes: f.list("still_sizes", &["images", "still_sizes"], Kind::Str)?,
            timezones: f.list("timezones", &["timezones"], Kind::LoadTimezone)?,
        })
    }
}

impl Reload for ConfigurationData {
    const KIND: &'static str = "configuration";
    const APPEND: Option<&'static str> =
        Some("countries,jobs,languages,primary_translations,timezones");

    fn identity(&self) -> Option<EntityId> {
        None
    }

    fn label(&self) -> Option<String> {
        Some(String::from("API3 Configuration"))
    }

    fn load_request(&self, _: &Seed, _: &Context, append: Option<&str>) -> Result<ApiRequest> {
        Ok(ApiRequest::get("configuration").query_opt("append_to_response", append))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::indexing_slicing)]

    use serde_json::json;

    use super::*;

    #[test]
    fn test_configuration_tables() {
        let payload = json!({
            "images": {"base_url": "http://image.tmdb.org/t/p/", "secure_base_url": "https://image.tmdb.org/t/p/", "poster_sizes": ["w92", "original"]},
            "change_keys": ["adult", "air_date"],
            "countries": [{"iso_3166_1": "US", "english_name": "United States of America"}],
            "languages": [{"iso_639_1": "en", "english_name": "English", "name": "English"}],
            "jobs": [{"department": "Directing", "jobs": ["Director"]}],
            "primary_translations": ["en-US", "fr-FR"],
            "timezones": [{"iso_3166_1": "US", "zones": ["America/New_York"]}]
        });

        let config = Configuration::from_json(payload, &Context::default(), false).unwrap();
        let data = config.peek();

        assert_eq!(config.to_string(), "API3 Configuration");
        assert_eq!(data.secure_base_image_url.as_deref(), Some("https://image.tmdb.org/t/p/"));
        assert_eq!(data.poster_sizes, vec!["w92", "original"]);
        assert_eq!(data.countries[0].name.as_deref(), Some("United States of America"));
        assert_eq!(data.departments[0].jobs, vec!["Director"]);
        assert_eq!(data.timezones[0].zones, vec!["America/New_York"]);
        assert_eq!(data.primary_translations.len(), 2);
    }
}
