//! Movies.
#![allow(clippy::future_not_send)]

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::coerce::{Key, Kind, Options};
use crate::context::Context;
use crate::entity::{Entity, EntityId, Fields, FromPayload, Reload, Seed, lazy_fields};
use crate::error::Result;
use crate::paged::PagedResult;
use crate::tmdb::{AccountFlag, Tmdb};
use crate::transport::{ApiRequest, LocalTransport};

use super::{
    AlternativeTitle, Collection, Company, Country, CountryWatchProviders, Credit, Genre, Image,
    Keyword, Language, ReleaseDate, Review, TmdbList, Trailer, Translation, Video, detail_request,
    require_id,
};

/// A movie.
pub type Movie = Entity<MovieData>;

lazy_fields! {
    /// Fields of a [`Movie`].
    pub struct MovieData {
        /// Adult title.
        pub adult: Option<bool>,
        /// Alternative titles.
        pub alternative_titles: Vec<AlternativeTitle>,
        /// Backdrop path.
        pub backdrop_path: Option<String>,
        /// Full backdrop URL.
        pub backdrop_url: Option<String>,
        /// Backdrop images.
        pub backdrops: Vec<Image>,
        /// Budget in USD.
        pub budget: u64,
        /// Cast.
        pub cast: Vec<Credit>,
        /// Collection the movie belongs to.
        pub collection: Option<Box<Collection>>,
        /// Production companies.
        pub companies: Vec<Company>,
        /// Production countries.
        pub countries: Vec<Country>,
        /// Crew.
        pub crew: Vec<Credit>,
        /// Facebook id.
        pub facebook_id: Option<String>,
        /// In the account's favorites.
        pub favorite: Option<bool>,
        /// Genres.
        pub genres: Vec<Genre>,
        /// Homepage.
        pub homepage: Option<String>,
        /// TMDB id.
        pub id: Option<u64>,
        /// IMDb id.
        pub imdb_id: Option<String>,
        /// Instagram id.
        pub instagram_id: Option<String>,
        /// Keywords.
        pub keywords: Vec<Keyword>,
        /// Lists containing the movie.
        pub lists: Option<PagedResult<TmdbList>>,
        /// Logo images.
        pub logos: Vec<Image>,
        /// Original language.
        pub original_language: Option<Language>,
        /// Original title.
        pub original_title: Option<String>,
        /// Overview.
        pub overview: Option<String>,
        /// Popularity score.
        pub popularity: f64,
        /// Poster path.
        pub poster_path: Option<String>,
        /// Full poster URL.
        pub poster_url: Option<String>,
        /// Poster images.
        pub posters: Vec<Image>,
        /// The account's rating.
        pub rated: Option<f64>,
        /// Recommended movies.
        pub recommendations: Option<PagedResult<Movie>>,
        /// Primary release date.
        pub release_date: Option<NaiveDate>,
        /// Release dates by country.
        pub release_dates: BTreeMap<String, Vec<ReleaseDate>>,
        /// Revenue in USD.
        pub revenue: u64,
        /// Reviews.
        pub reviews: Option<PagedResult<Review>>,
        /// Runtime in minutes.
        pub runtime: u64,
        /// Similar movies.
        pub similar: Option<PagedResult<Movie>>,
        /// Spoken languages.
        pub spoken_languages: Vec<Language>,
        /// Release status.
        pub status: Option<String>,
        /// Tagline.
        pub tagline: Option<String>,
        /// Title.
        pub title: Option<String>,
        /// Legacy YouTube trailers.
        pub trailers: Vec<Trailer>,
        /// Translations.
        pub translations: Vec<Translation>,
        /// Twitter id.
        pub twitter_id: Option<String>,
        /// Video release.
        pub video: Option<bool>,
        /// Videos.
        pub videos: Vec<Video>,
        /// Average vote.
        pub vote_average: f64,
        /// Number of votes.
        pub vote_count: u64,
        /// Watch providers by country.
        pub watch_providers: BTreeMap<String, CountryWatchProviders>,
        /// In the account's watchlist.
        pub watchlist: Option<bool>,
        /// Wikidata id.
        pub wikidata_id: Option<String>,
    }
}

impl FromPayload for MovieData {
    fn populate(f: &mut Fields<'_>) -> Result<Self> {
        let id: Option<u64> = f.get("id", &["id"], Kind::Int, Options::single().default_none())?;
        let key = id.map(Key::from);
        let keyed = || Options::single().keyed(key.clone());
        let genres = if f.has("genres") {
            f.list("genres", &["genres"], Kind::LoadGenre)?
        } else {
            f.list("genres", &["genre_ids"], Kind::MovieGenre)?
        };

        Ok(Self {
            adult: f.one("adult", Kind::Bool)?,
            alternative_titles: f.list(
                "alternative_titles",
                &["alternative_titles", "titles"],
                Kind::AlternativeTitle,
            )?,
            backdrop_path: f.one("backdrop_path", Kind::Str)?,
            backdrop_url: f.image_url("backdrop_url", &["backdrop_path"])?,
            backdrops: f.list("backdrops", &["images", "backdrops"], Kind::Backdrop)?,
            budget: f.one("budget", Kind::Int)?,
            cast: f.list("cast", &["credits", "cast"], Kind::MovieCast)?,
            collection: f.at("collection", &["belongs_to_collection"], Kind::Collection)?,
            companies: f.list("companies", &["production_companies"], Kind::Company)?,
            countries: f.list("countries", &["production_countries"], Kind::Country)?,
            crew: f.list("crew", &["credits", "crew"], Kind::MovieCrew)?,
            facebook_id: f.at("facebook_id", &["external_ids", "facebook_id"], Kind::Str)?,
            favorite: f.at("favorite", &["account_states", "favorite"], Kind::Bool)?,
            genres,
            homepage: f.one("homepage", Kind::Str)?,
            id,
            imdb_id: f.first(
                "imdb_id",
                &[&["imdb_id"], &["external_ids", "imdb_id"]],
                Kind::Str,
                Options::single(),
            )?,
            instagram_id: f.at("instagram_id", &["external_ids", "instagram_id"], Kind::Str)?,
            keywords: f.list("keywords", &["keywords", "keywords"], Kind::Keyword)?,
            lists: f.get("lists", &["lists"], Kind::MovieLists, keyed())?,
            logos: f.list("logos", &["images", "logos"], Kind::Logo)?,
            original_language: f.one("original_language", Kind::Language)?,
            original_title: f.one("original_title", Kind::Str)?,
            overview: f.one("overview", Kind::Str)?,
            popularity: f.one("popularity", Kind::Float)?,
            poster_path: f.one("poster_path", Kind::Str)?,
            poster_url: f.image_url("poster_url", &["poster_path"])?,
            posters: f.list("posters", &["images", "posters"], Kind::Poster)?,
            rated: f.at("rated", &["account_states", "rated"], Kind::Rated)?,
            recommendations: f.get(
                "recommendations",
                &["recommendations"],
                Kind::RecommendedMovies,
                keyed(),
            )?,
            release_date: f.one("release_date", Kind::Date)?,
            release_dates: f.at(
                "release_dates",
                &["release_dates", "results"],
                Kind::ReleaseDatesByCountry,
            )?,
            revenue: f.one("revenue", Kind::Int)?,
            reviews: f.get("reviews", &["reviews"], Kind::MovieReviews, keyed())?,
            runtime: f.one("runtime", Kind::Int)?,
            similar: f.get("similar", &["similar"], Kind::SimilarMovies, keyed())?,
            spoken_languages: f.list("spoken_languages", &["spoken_languages"], Kind::Language)?,
            status: f.one("status", Kind::Str)?,
            tagline: f.one("tagline", Kind::Str)?,
            title: f.one("title", Kind::Str)?,
            trailers: f.list("trailers", &["trailers", "youtube"], Kind::Trailer)?,
            translations: f.list(
                "translations",
                &["translations", "translations"],
                Kind::Translation,
            )?,
            twitter_id: f.at("twitter_id", &["external_ids", "twitter_id"], Kind::Str)?,
            video: f.one("video", Kind::Bool)?,
            videos: f.list("videos", &["videos", "results"], Kind::Video)?,
            vote_average: f.one("vote_average", Kind::Float)?,
            vote_count: f.one("vote_count", Kind::Int)?,
            watch_providers: f.get(
                "watch_providers",
                &["watch/providers", "results"],
                Kind::CountryWatchProviders,
                Options::dict(),
            )?,
            watchlist: f.at("watchlist", &["account_states", "watchlist"], Kind::Bool)?,
            wikidata_id: f.at("wikidata_id", &["external_ids", "wikidata_id"], Kind::Str)?,
        })
    }
}

impl Reload for MovieData {
    const KIND: &'static str = "movie";
    const APPEND: Option<&'static str> = Some(
        "account_states,alternative_titles,credits,external_ids,images,keywords,lists,\
         recommendations,release_dates,reviews,similar,trailers,translations,videos,\
         watch/providers",
    );

    fn identity(&self) -> Option<EntityId> {
        self.id.map(EntityId::Int)
    }

    fn label(&self) -> Option<String> {
        self.title.clone()
    }

    fn load_request(&self, _: &Seed, ctx: &Context, append: Option<&str>) -> Result<ApiRequest> {
        let id = require_id(self.id.as_ref(), Self::KIND)?;
        Ok(detail_request(format!("movie/{id}"), ctx, append))
    }
}

impl Movie {
    fn path(&self) -> Result<String> {
        Ok(format!("movie/{}", require_id(self.peek().id.as_ref(), MovieData::KIND)?))
    }

    /// Rates the movie for the session's account.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` when `rating` is outside `[0.5, 10.0]`;
    /// `AuthenticationRequired` without a session.
    pub async fn rate<T: LocalTransport>(&self, tmdb: &Tmdb<T>, rating: f64) -> Result<()> {
        tmdb.rate_media(self.path()?, rating).await
    }

    /// Removes the account's rating.
    ///
    /// # Errors
    ///
    /// `AuthenticationRequired` without a session.
    pub async fn delete_rating<T: LocalTransport>(&self, tmdb: &Tmdb<T>) -> Result<()> {
        tmdb.unrate_media(self.path()?).await
    }

    /// Adds the movie to the account's favorites.
    ///
    /// # Errors
    ///
    /// `AuthenticationRequired` without a session.
    pub async fn mark_as_favorite<T: LocalTransport>(&self, tmdb: &Tmdb<T>) -> Result<()> {
        self.flag(tmdb, AccountFlag::Favorite, true).await
    }

    /// Removes the movie from the account's favorites.
    ///
    /// # Errors
    ///
    /// `AuthenticationRequired` without a session.
    pub async fn remove_as_favorite<T: LocalTransport>(&self, tmdb: &Tmdb<T>) -> Result<()> {
        self.flag(tmdb, AccountFlag::Favorite, false).await
    }

    /// Adds the movie to the account's watchlist.
    ///
    /// # Errors
    ///
    /// `AuthenticationRequired` without a session.
    pub async fn add_to_watchlist<T: LocalTransport>(&self, tmdb: &Tmdb<T>) -> Result<()> {
        self.flag(tmdb, AccountFlag::Watchlist, true).await
    }

    /// Removes the movie from the account's watchlist.
    ///
    /// # Errors
    ///
    /// `AuthenticationRequired` without a session.
    pub async fn remove_from_watchlist<T: LocalTransport>(&self, tmdb: &Tmdb<T>) -> Result<()> {
        self.flag(tmdb, AccountFlag::Watchlist, false).await
    }

    async fn flag<T: LocalTransport>(
        &self,
        tmdb: &Tmdb<T>,
        flag: AccountFlag,
        value: bool,
    ) -> Result<()> {
        let id = require_id(self.peek().id.as_ref(), MovieData::KIND)?;
        tmdb.set_account_flag(flag, "movie", id, value).await
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::indexing_slicing)]
    #![allow(clippy::float_cmp)]

    use serde_json::json;

    use super::*;
    use crate::testing::MockTransport;
    use crate::transport::Method;

    fn full_payload() -> serde_json::Value {
        json!({
            "id": 550,
            "title": "Fight Club",
            "imdb_id": "tt0137523",
            "release_date": "1999-10-15",
            "genres": [{"id": 18, "name": "Drama"}],
            "belongs_to_collection": null,
            "production_companies": [{"id": 508, "name": "Regency Enterprises"}],
            "account_states": {"favorite": false, "rated": {"value": 8.0}, "watchlist": true},
            "credits": {
                "cast": [{"id": 819, "name": "Edward Norton", "character": "The Narrator", "credit_id": "52fe4250c3a36847f80149f3", "order": 0}],
                "crew": [{"id": 7467, "name": "David Fincher", "job": "Director", "department": "Directing", "credit_id": "52fe4250c3a36847f8014a11"}]
            },
            "recommendations": {"page": 1, "total_pages": 2, "total_results": 40, "results": [{"id": 680, "title": "Pulp Fiction"}]},
            "release_dates": {"results": [{"iso_3166_1": "US", "release_dates": [{"certification": "R", "type": 3, "release_date": "1999-10-15T00:00:00.000Z"}]}]},
            "watch/providers": {"results": {"US": {"link": "https://tmdb.example/550", "rent": [{"provider_id": 2, "provider_name": "Apple TV"}]}}},
            "videos": {"results": [{"id": "v1", "key": "SUXWAEX2jlg", "site": "YouTube", "type": "Trailer", "official": true}]}
        })
    }

    #[test]
    fn test_full_payload_populates_nested_objects() {
        // Arrange & Act
        let movie = Movie::from_json(full_payload(), &Context::default(), false).unwrap();
        let data = movie.peek();

        // Assert
        assert_eq!(movie.to_string(), "[550:Fight Club]");
        assert_eq!(data.genres[0].name.as_deref(), Some("Drama"));
        assert!(data.collection.is_none());
        assert_eq!(data.companies[0].peek().name.as_deref(), Some("Regency Enterprises"));
        assert_eq!(data.rated, Some(8.0));
        assert_eq!(data.watchlist, Some(true));
        assert_eq!(data.cast[0].peek().character.as_deref(), Some("The Narrator"));
        assert_eq!(data.cast[0].peek().credit_type.as_deref(), Some("cast"));
        assert_eq!(data.crew[0].peek().job.as_deref(), Some("Director"));
        assert_eq!(data.release_dates["US"][0].certification.as_deref(), Some("R"));
        assert_eq!(data.watch_providers["US"].rent[0].id, Some(2));
        assert_eq!(data.videos[0].video_type.as_deref(), Some("Trailer"));
        let recommendations = data.recommendations.as_ref().unwrap();
        assert_eq!(recommendations.total_results(), 40);
        assert_eq!(
            recommendations.source().request().path,
            "movie/550/recommendations"
        );
    }

    #[tokio::test]
    async fn test_embedded_recommendations_page_forward() {
        // Arrange
        let transport = MockTransport::new().route_page(
            "movie/550/recommendations",
            2,
            json!({"page": 2, "total_pages": 2, "total_results": 40, "results": [{"id": 13, "title": "Forrest Gump"}]}),
        );
        let tmdb = Tmdb::from_parts(transport, Context::default());
        let movie = Movie::from_json(full_payload(), tmdb.context(), false).unwrap();
        let mut recommendations = movie.peek().recommendations.clone().unwrap();

        // Act
        recommendations.load_next(&tmdb).await.unwrap();

        // Assert
        assert_eq!(recommendations.results()[0].peek().id, Some(13));
        assert_eq!(tmdb.transport().count("movie/550/recommendations"), 1);
    }

    #[tokio::test]
    async fn test_rate_posts_value_with_session() {
        // Arrange
        let transport = MockTransport::new()
            .with_session()
            .route_method(Method::Post, "movie/550/rating", json!({"success": true}))
            .route_method(Method::Delete, "movie/550/rating", json!({"success": true}));
        let tmdb = Tmdb::from_parts(transport, Context::default());
        let movie = Movie::from_json(json!({"id": 550}), tmdb.context(), true).unwrap();

        // Act
        movie.rate(&tmdb, 8.5).await.unwrap();
        movie.delete_rating(&tmdb).await.unwrap();
        let out_of_range = movie.rate(&tmdb, 11.0).await;

        // Assert
        let calls = tmdb.transport().calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].body, Some(json!({"value": 8.5})));
        assert!(calls[0].session);
        assert_eq!(calls[1].method, Method::Delete);
        assert!(matches!(out_of_range, Err(crate::TmdbError::InvalidArgument(_))));
    }

    #[tokio::test]
    async fn test_rate_without_session_is_authentication_required() {
        let tmdb = Tmdb::from_parts(MockTransport::new(), Context::default());
        let movie = Movie::from_json(json!({"id": 550}), tmdb.context(), true).unwrap();

        let result = movie.rate(&tmdb, 5.0).await;

        assert!(matches!(result, Err(crate::TmdbError::AuthenticationRequired(_))));
    }

    #[tokio::test]
    async fn test_favorite_and_watchlist_toggle() {
        // Arrange
        let transport = MockTransport::new()
            .with_session()
            .route("account", json!({"id": 42, "username": "someone"}))
            .route_method(Method::Post, "account/42/favorite", json!({"success": true}))
            .route_method(Method::Post, "account/42/watchlist", json!({"success": true}));
        let tmdb = Tmdb::from_parts(transport, Context::default());
        let movie = Movie::from_json(json!({"id": 550}), tmdb.context(), true).unwrap();

        // Act
        movie.mark_as_favorite(&tmdb).await.unwrap();
        movie.remove_from_watchlist(&tmdb).await.unwrap();

        // Assert
        let transport = tmdb.transport();
        assert_eq!(transport.count("account"), 1);
        assert_eq!(
            transport.last("account/42/favorite").unwrap().body,
            Some(json!({"media_type": "movie", "media_id": 550, "favorite": true}))
        );
        assert_eq!(
            transport.last("account/42/watchlist").unwrap().body,
            Some(json!({"media_type": "movie", "media_id": 550, "watchlist": false}))
        );
    }
}
