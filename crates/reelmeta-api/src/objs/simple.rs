//! Small value objects embedded in entity payloads.

use chrono::NaiveDateTime;

use crate::coerce::{Kind, Options};
use crate::entity::{Fields, FromPayload};
use crate::error::Result;

use super::Episode;

/// Text of the construction key (country code for per-country maps).
fn key_text(fields: &Fields<'_>) -> Option<String> {
    fields.seed().key.as_ref().map(ToString::to_string)
}

/// Alternative name of a company or network.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AlternativeName {
    /// Name.
    pub name: Option<String>,
    /// Kind of name (`type`).
    pub name_type: Option<String>,
}

impl FromPayload for AlternativeName {
    fn populate(fields: &mut Fields<'_>) -> Result<Self> {
        Ok(Self {
            name: fields.one("name", Kind::Str)?,
            name_type: fields.at("name_type", &["type"], Kind::Str)?,
        })
    }
}

/// Alternative title of a movie or show.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AlternativeTitle {
    /// Country the title is used in.
    pub iso_3166_1: Option<String>,
    /// Title.
    pub title: Option<String>,
    /// Kind of title (`type`).
    pub title_type: Option<String>,
}

impl FromPayload for AlternativeTitle {
    fn populate(fields: &mut Fields<'_>) -> Result<Self> {
        Ok(Self {
            iso_3166_1: fields.one("iso_3166_1", Kind::Str)?,
            title: fields.one("title", Kind::Str)?,
            title_type: fields.at("title_type", &["type"], Kind::Str)?,
        })
    }
}

/// One certification of a country's rating system.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Certification {
    /// Certification label.
    pub certification: Option<String>,
    /// Meaning of the label.
    pub meaning: Option<String>,
    /// Position in the country's ordering.
    pub order: i64,
}

impl FromPayload for Certification {
    fn populate(fields: &mut Fields<'_>) -> Result<Self> {
        Ok(Self {
            certification: fields.one("certification", Kind::Str)?,
            meaning: fields.one("meaning", Kind::Str)?,
            order: fields.one("order", Kind::Int)?,
        })
    }
}

/// Country.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Country {
    /// ISO 3166-1 code.
    pub iso_3166_1: Option<String>,
    /// English name.
    pub name: Option<String>,
    /// Native name.
    pub native_name: Option<String>,
}

impl FromPayload for Country {
    fn populate(fields: &mut Fields<'_>) -> Result<Self> {
        Ok(Self {
            iso_3166_1: fields.one("iso_3166_1", Kind::Str)?,
            name: fields.first("name", &[&["name"], &["english_name"]], Kind::Str, Options::single())?,
            native_name: fields.one("native_name", Kind::Str)?,
        })
    }
}

/// Certifications of one country, ordered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CountryCertifications {
    /// ISO 3166-1 code (map key).
    pub iso_3166_1: Option<String>,
    /// Country looked up from the code.
    pub country: Option<Country>,
    /// Certifications sorted by `order`.
    pub certifications: Vec<Certification>,
}

impl FromPayload for CountryCertifications {
    fn populate(fields: &mut Fields<'_>) -> Result<Self> {
        let iso_3166_1 = key_text(fields);
        let country = iso_3166_1
            .as_deref()
            .and_then(|code| fields.ctx().country(code))
            .cloned();
        let mut certifications: Vec<Certification> =
            fields.list("certifications", &[], Kind::Certification)?;
        certifications.sort_by_key(|c| c.order);
        Ok(Self {
            iso_3166_1,
            country,
            certifications,
        })
    }
}

/// Watch providers of one country.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CountryWatchProviders {
    /// ISO 3166-1 code (map key).
    pub iso_3166_1: Option<String>,
    /// Country looked up from the code.
    pub country: Option<Country>,
    /// TMDB page listing the providers.
    pub link: Option<String>,
    /// Providers renting the title.
    pub rent: Vec<WatchProvider>,
    /// Providers selling the title.
    pub buy: Vec<WatchProvider>,
    /// Subscription providers.
    pub flatrate: Vec<WatchProvider>,
    /// Free providers.
    pub free: Vec<WatchProvider>,
    /// Ad-supported providers.
    pub ads: Vec<WatchProvider>,
}

impl FromPayload for CountryWatchProviders {
    fn populate(fields: &mut Fields<'_>) -> Result<Self> {
        let iso_3166_1 = key_text(fields);
        let country = iso_3166_1
            .as_deref()
            .and_then(|code| fields.ctx().country(code))
            .cloned();
        Ok(Self {
            iso_3166_1,
            country,
            link: fields.one("link", Kind::Str)?,
            rent: fields.list("rent", &["rent"], Kind::WatchProvider)?,
            buy: fields.list("buy", &["buy"], Kind::WatchProvider)?,
            flatrate: fields.list("flatrate", &["flatrate"], Kind::WatchProvider)?,
            free: fields.list("free", &["free"], Kind::WatchProvider)?,
            ads: fields.list("ads", &["ads"], Kind::WatchProvider)?,
        })
    }
}

/// Department and its jobs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Department {
    /// Department name.
    pub department: Option<String>,
    /// Jobs within the department.
    pub jobs: Vec<String>,
}

impl FromPayload for Department {
    fn populate(fields: &mut Fields<'_>) -> Result<Self> {
        Ok(Self {
            department: fields.one("department", Kind::Str)?,
            jobs: fields.list("jobs", &["jobs"], Kind::Str)?,
        })
    }
}

/// Movie or TV genre.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Genre {
    /// Genre id.
    pub id: Option<u64>,
    /// Genre name.
    pub name: Option<String>,
}

impl FromPayload for Genre {
    fn populate(fields: &mut Fields<'_>) -> Result<Self> {
        Ok(Self {
            id: fields.get("id", &["id"], Kind::Int, Options::single().default_none())?,
            name: fields.one("name", Kind::Str)?,
        })
    }
}

/// One group of an episode group.
#[derive(Debug, Clone)]
pub struct Group {
    /// Group id.
    pub id: Option<String>,
    /// Group name.
    pub name: Option<String>,
    /// Position within the episode group.
    pub order: i64,
    /// Whether the group is locked.
    pub locked: Option<bool>,
    /// Episodes in the group.
    pub episodes: Vec<Episode>,
}

impl FromPayload for Group {
    fn populate(fields: &mut Fields<'_>) -> Result<Self> {
        Ok(Self {
            id: fields.one("id", Kind::Str)?,
            name: fields.one("name", Kind::Str)?,
            order: fields.one("order", Kind::Int)?,
            locked: fields.one("locked", Kind::Bool)?,
            episodes: fields.list("episodes", &["episodes"], Kind::Episode)?,
        })
    }
}

/// Language.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Language {
    /// ISO 639-1 code.
    pub iso_639_1: Option<String>,
    /// English name.
    pub english_name: Option<String>,
    /// Native name.
    pub name: Option<String>,
}

impl FromPayload for Language {
    fn populate(fields: &mut Fields<'_>) -> Result<Self> {
        Ok(Self {
            iso_639_1: fields.one("iso_639_1", Kind::Str)?,
            english_name: fields.one("english_name", Kind::Str)?,
            name: fields.one("name", Kind::Str)?,
        })
    }
}

/// Release of a movie in one country.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReleaseDate {
    /// Certification at release.
    pub certification: Option<String>,
    /// Release language code.
    pub iso_639_1: Option<String>,
    /// Release language.
    pub language: Option<Language>,
    /// Free-form note.
    pub note: Option<String>,
    /// Release timestamp.
    pub release_date: Option<NaiveDateTime>,
    /// Release type (1 premiere .. 6 TV).
    pub release_type: i64,
}

impl FromPayload for ReleaseDate {
    fn populate(fields: &mut Fields<'_>) -> Result<Self> {
        Ok(Self {
            certification: fields.one("certification", Kind::Str)?,
            iso_639_1: fields.one("iso_639_1", Kind::Str)?,
            language: fields.at("language", &["iso_639_1"], Kind::Language)?,
            note: fields.one("note", Kind::Str)?,
            release_date: fields.one("release_date", Kind::Date)?,
            release_type: fields.at("release_type", &["type"], Kind::Int)?,
        })
    }
}

/// Time zones of a country.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Timezones {
    /// ISO 3166-1 code.
    pub iso_3166_1: Option<String>,
    /// Zone names.
    pub zones: Vec<String>,
}

impl FromPayload for Timezones {
    fn populate(fields: &mut Fields<'_>) -> Result<Self> {
        Ok(Self {
            iso_3166_1: fields.one("iso_3166_1", Kind::Str)?,
            zones: fields.list("zones", &["zones"], Kind::Str)?,
        })
    }
}

/// Legacy trailer entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Trailer {
    /// Trailer name.
    pub name: Option<String>,
    /// Size label.
    pub size: Option<String>,
    /// Source key on the hosting site.
    pub source: Option<String>,
    /// Trailer type.
    pub trailer_type: Option<String>,
}

impl FromPayload for Trailer {
    fn populate(fields: &mut Fields<'_>) -> Result<Self> {
        Ok(Self {
            name: fields.one("name", Kind::Str)?,
            size: fields.one("size", Kind::Str)?,
            source: fields.one("source", Kind::Str)?,
            trailer_type: fields.at("trailer_type", &["type"], Kind::Str)?,
        })
    }
}

/// Translation of an entity's text fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Translation {
    /// Country code.
    pub iso_3166_1: Option<String>,
    /// Country looked up from the code.
    pub country: Option<Country>,
    /// Language code.
    pub iso_639_1: Option<String>,
    /// Language looked up from the code.
    pub language: Option<Language>,
    /// Native language name.
    pub language_name: Option<String>,
    /// English language name.
    pub english_language_name: Option<String>,
    /// Translated biography (people).
    pub biography: Option<String>,
    /// Translated homepage.
    pub homepage: Option<String>,
    /// Translated name (shows, people).
    pub name: Option<String>,
    /// Translated overview.
    pub overview: Option<String>,
    /// Translated tagline.
    pub tagline: Option<String>,
    /// Translated title (movies, collections).
    pub title: Option<String>,
}

impl FromPayload for Translation {
    fn populate(fields: &mut Fields<'_>) -> Result<Self> {
        Ok(Self {
            iso_3166_1: fields.one("iso_3166_1", Kind::Str)?,
            country: fields.at("country", &["iso_3166_1"], Kind::Country)?,
            iso_639_1: fields.one("iso_639_1", Kind::Str)?,
            language: fields.at("language", &["iso_639_1"], Kind::Language)?,
            language_name: fields.at("language_name", &["name"], Kind::Str)?,
            english_language_name: fields.at("english_language_name", &["english_name"], Kind::Str)?,
            biography: fields.at("biography", &["data", "biography"], Kind::Str)?,
            homepage: fields.at("homepage", &["data", "homepage"], Kind::Str)?,
            name: fields.at("name", &["data", "name"], Kind::Str)?,
            overview: fields.at("overview", &["data", "overview"], Kind::Str)?,
            tagline: fields.at("tagline", &["data", "tagline"], Kind::Str)?,
            title: fields.at("title", &["data", "title"], Kind::Str)?,
        })
    }
}

/// v4 list owner.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct User {
    /// Account id.
    pub id: Option<String>,
    /// Gravatar hash.
    pub gravatar_hash: Option<String>,
    /// Display name.
    pub name: Option<String>,
    /// Username.
    pub username: Option<String>,
}

impl FromPayload for User {
    fn populate(fields: &mut Fields<'_>) -> Result<Self> {
        Ok(Self {
            id: fields.one("id", Kind::Str)?,
            gravatar_hash: fields.one("gravatar_hash", Kind::Str)?,
            name: fields.one("name", Kind::Str)?,
            username: fields.one("username", Kind::Str)?,
        })
    }
}

/// Video hosted on an external site.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Video {
    /// Video id.
    pub id: Option<String>,
    /// Country code.
    pub iso_3166_1: Option<String>,
    /// Country looked up from the code.
    pub country: Option<Country>,
    /// Language code.
    pub iso_639_1: Option<String>,
    /// Language looked up from the code.
    pub language: Option<Language>,
    /// Key on the hosting site.
    pub key: Option<String>,
    /// Video name.
    pub name: Option<String>,
    /// Whether published by the rights holder.
    pub official: Option<bool>,
    /// Publication time.
    pub published_at: Option<NaiveDateTime>,
    /// Hosting site.
    pub site: Option<String>,
    /// Vertical resolution.
    pub size: i64,
    /// Video type (Trailer, Teaser, ...).
    pub video_type: Option<String>,
}

impl FromPayload for Video {
    fn populate(fields: &mut Fields<'_>) -> Result<Self> {
        Ok(Self {
            id: fields.one("id", Kind::Str)?,
            iso_3166_1: fields.one("iso_3166_1", Kind::Str)?,
            country: fields.at("country", &["iso_3166_1"], Kind::Country)?,
            iso_639_1: fields.one("iso_639_1", Kind::Str)?,
            language: fields.at("language", &["iso_639_1"], Kind::Language)?,
            key: fields.one("key", Kind::Str)?,
            name: fields.one("name", Kind::Str)?,
            official: fields.one("official", Kind::Bool)?,
            published_at: fields.one("published_at", Kind::Date)?,
            site: fields.one("site", Kind::Str)?,
            size: fields.one("size", Kind::Int)?,
            video_type: fields.at("video_type", &["type"], Kind::Str)?,
        })
    }
}

/// Streaming, rental or purchase provider.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WatchProvider {
    /// Provider id.
    pub id: Option<u64>,
    /// Provider name.
    pub name: Option<String>,
    /// Ordering hint.
    pub display_priority: i64,
    /// Logo path.
    pub logo_path: Option<String>,
    /// Full logo URL.
    pub logo_url: Option<String>,
}

impl FromPayload for WatchProvider {
    fn populate(fields: &mut Fields<'_>) -> Result<Self> {
        Ok(Self {
            id: fields.get("id", &["provider_id"], Kind::Int, Options::single().default_none())?,
            name: fields.at("name", &["provider_name"], Kind::Str)?,
            display_priority: fields.one("display_priority", Kind::Int)?,
            logo_path: fields.one("logo_path", Kind::Str)?,
            logo_url: fields.image_url("logo_url", &["logo_path"])?,
        })
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::indexing_slicing)]

    use serde_json::json;

    use chrono::NaiveDate;

    use super::*;
    use crate::coerce::{FromCoerced, Key, coerce};
    use crate::context::Context;
    use crate::entity::{Seed, build};

    #[test]
    fn test_country_falls_back_to_english_name() {
        // Arrange
        let payload = json!({"iso_3166_1": "DE", "english_name": "Germany", "native_name": "Deutschland"});

        // Act
        let country: Country = build(&payload, &Context::default(), &Seed::default()).unwrap();

        // Assert
        assert_eq!(country.name.as_deref(), Some("Germany"));
        assert_eq!(country.native_name.as_deref(), Some("Deutschland"));
    }

    #[test]
    fn test_country_certifications_sorted_and_keyed() {
        // Arrange
        let payload = json!({"certifications": {"US": [
            {"certification": "R", "meaning": "Restricted", "order": 4},
            {"certification": "G", "meaning": "General", "order": 1},
            {"certification": "PG", "meaning": "Parental Guidance", "order": 2}
        ]}});

        // Act
        let coerced = coerce(
            Some(&payload),
            &["certifications"],
            Kind::CountryCertifications,
            &Options::dict(),
            &Context::default(),
        )
        .unwrap();
        let map: std::collections::BTreeMap<String, CountryCertifications> =
            std::collections::BTreeMap::from_coerced(coerced).unwrap();

        // Assert
        let us = &map["US"];
        assert_eq!(us.iso_3166_1.as_deref(), Some("US"));
        let labels: Vec<_> = us
            .certifications
            .iter()
            .map(|c| c.certification.as_deref().unwrap())
            .collect();
        assert_eq!(labels, ["G", "PG", "R"]);
    }

    #[test]
    fn test_watch_providers_by_country() {
        let payload = json!({
            "link": "https://www.themoviedb.org/movie/550/watch?locale=US",
            "flatrate": [{"provider_id": 8, "provider_name": "Netflix", "display_priority": 2, "logo_path": "/n.jpg"}],
            "rent": [{"provider_id": 2, "provider_name": "Apple TV"}]
        });
        let seed = Seed::keyed(Some(Key::Str(String::from("US"))));

        let providers: CountryWatchProviders = build(&payload, &Context::default(), &seed).unwrap();

        assert_eq!(providers.iso_3166_1.as_deref(), Some("US"));
        assert_eq!(providers.flatrate[0].id, Some(8));
        assert_eq!(providers.flatrate[0].name.as_deref(), Some("Netflix"));
        assert_eq!(
            providers.flatrate[0].logo_url.as_deref(),
            Some("https://image.tmdb.org/t/p/original/n.jpg")
        );
        assert_eq!(providers.rent.len(), 1);
        assert!(providers.buy.is_empty());
    }

    #[test]
    fn test_translation_reads_nested_data() {
        let payload = json!({
            "iso_3166_1": "FR", "iso_639_1": "fr", "name": "Français", "english_name": "French",
            "data": {"title": "Le Parrain", "overview": "..."}
        });

        let translation: Translation = build(&payload, &Context::default(), &Seed::default()).unwrap();

        assert_eq!(translation.title.as_deref(), Some("Le Parrain"));
        assert_eq!(translation.language_name.as_deref(), Some("Français"));
        assert_eq!(translation.english_language_name.as_deref(), Some("French"));
        assert!(translation.name.is_none());
    }

    #[test]
    fn test_release_date_parses_timestamp() {
        let payload = json!({"certification": "R", "type": 3, "release_date": "1999-10-15T00:00:00.000Z", "note": ""});

        let release: ReleaseDate = build(&payload, &Context::default(), &Seed::default()).unwrap();

        assert_eq!(release.release_type, 3);
        assert_eq!(
            release.release_date.unwrap().date(),
            NaiveDate::from_ymd_opt(1999, 10, 15).unwrap()
        );
    }
}
