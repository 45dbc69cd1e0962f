//! TMDB domain objects.
//!
//! Entities (movies, shows, people, ...) are [`Entity`](crate::entity::Entity)
//! wrappers around a data struct and load lazily. Everything in [`simple`]
//! and [`image`] is a plain value built once from its payload.

mod account;
mod collection;
mod company;
mod configuration;
mod credit;
mod episode;
mod episode_group;
mod image;
mod keyword;
mod list;
mod movie;
mod person;
mod review;
mod season;
mod simple;
mod tv;

use std::fmt;

pub use account::{Account, AccountData};
pub use collection::{Collection, CollectionData};
pub use company::{Company, CompanyData, Network, NetworkData};
pub use configuration::{Configuration, ConfigurationData};
pub use credit::{Credit, CreditData};
pub use episode::{Episode, EpisodeData};
pub use episode_group::{EpisodeGroup, EpisodeGroupData};
pub use image::{Image, ImageType, Tagged};
pub use keyword::{Keyword, KeywordData};
#[allow(clippy::module_name_repetitions)]
pub use list::{LIST_SORTS, ListDetails, ListItem, ListUpdate, TmdbList, list_source};
pub use movie::{Movie, MovieData};
pub use person::{Person, PersonData};
pub use review::{Review, ReviewData};
pub use season::{Season, SeasonData};
pub use simple::{
    AlternativeName, AlternativeTitle, Certification, Country, CountryCertifications,
    CountryWatchProviders, Department, Genre, Group, Language, ReleaseDate, Timezones, Trailer,
    Translation, User, Video, WatchProvider,
};
pub use tv::{TvShow, TvShowData};

use crate::context::Context;
use crate::error::{Result, TmdbError};
use crate::transport::ApiRequest;

/// A movie, show or person picked by a `media_type` discriminator.
#[derive(Debug, Clone, PartialEq)]
pub enum Media {
    /// Movie.
    Movie(Box<Movie>),
    /// TV show.
    TvShow(Box<TvShow>),
    /// Person.
    Person(Box<Person>),
}

impl Media {
    /// `media_type` discriminator of the variant.
    #[must_use]
    pub const fn media_type(&self) -> &'static str {
        match self {
            Self::Movie(_) => "movie",
            Self::TvShow(_) => "tv",
            Self::Person(_) => "person",
        }
    }

    /// Numeric id of the wrapped entity.
    #[must_use]
    pub fn id(&self) -> Option<u64> {
        match self {
            Self::Movie(movie) => movie.peek().id,
            Self::TvShow(show) => show.peek().id,
            Self::Person(person) => person.peek().id,
        }
    }
}

impl fmt::Display for Media {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Movie(movie) => movie.fmt(f),
            Self::TvShow(show) => show.fmt(f),
            Self::Person(person) => person.fmt(f),
        }
    }
}

/// Id needed to address an entity remotely.
pub(crate) fn require_id<I: Clone>(id: Option<&I>, kind: &str) -> Result<I> {
    id.cloned()
        .ok_or_else(|| TmdbError::invalid(format!("{kind} has no id to load")))
}

/// Detail GET with the facade's language preferences.
pub(crate) fn detail_request(path: String, ctx: &Context, append: Option<&str>) -> ApiRequest {
    ApiRequest::get(path)
        .query("language", ctx.language())
        .query_opt("include_image_language", ctx.include_image_language())
        .query_opt("include_video_language", ctx.include_video_language())
        .query_opt("append_to_response", append)
}

/// Rejects ratings outside `[0.5, 10.0]`.
pub(crate) fn validate_rating(rating: f64) -> Result<f64> {
    if (0.5..=10.0).contains(&rating) {
        Ok(rating)
    } else {
        Err(TmdbError::invalid("Rating must be between 0.5 and 10.0"))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn test_validate_rating_bounds() {
        assert!(validate_rating(0.5).is_ok());
        assert!(validate_rating(10.0).is_ok());
        assert!(matches!(validate_rating(0.4), Err(TmdbError::InvalidArgument(_))));
        assert!(matches!(validate_rating(10.5), Err(TmdbError::InvalidArgument(_))));
        assert!(validate_rating(f64::NAN).is_err());
    }

    #[test]
    fn test_detail_request_carries_preferences() {
        let request = detail_request(String::from("movie/1"), &Context::default(), Some("videos"));
        assert_eq!(request.query_value("language"), Some("en"));
        assert_eq!(request.query_value("append_to_response"), Some("videos"));
        assert!(request.query_value("include_image_language").is_none());
    }
}
