//! TV shows.
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
    AlternativeTitle, Company, Country, CountryWatchProviders, Credit, Episode, EpisodeGroup,
    Genre, Image, Keyword, Language, Network, Season, Translation, Video, detail_request,
    require_id,
};

/// A TV show.
pub type TvShow = Entity<TvShowData>;

lazy_fields! {
    /// Fields of a [`TvShow`].
    pub struct TvShowData {
        /// Cast across all seasons, one credit per role.
        pub aggregate_cast: Vec<Credit>,
        /// Crew across all seasons, one credit per job.
        pub aggregate_crew: Vec<Credit>,
        /// Alternative titles.
        pub alternative_titles: Vec<AlternativeTitle>,
        /// Backdrop path.
        pub backdrop_path: Option<String>,
        /// Full backdrop URL.
        pub backdrop_url: Option<String>,
        /// Backdrop images.
        pub backdrops: Vec<Image>,
        /// Cast of the latest season.
        pub cast: Vec<Credit>,
        /// Production companies.
        pub companies: Vec<Company>,
        /// Content rating by country.
        pub content_ratings: BTreeMap<String, String>,
        /// Production countries.
        pub countries: Vec<Country>,
        /// Creators.
        pub created_by: Vec<Credit>,
        /// Crew of the latest season.
        pub crew: Vec<Credit>,
        /// Episode groups.
        pub episode_groups: Vec<EpisodeGroup>,
        /// Typical episode runtimes in minutes.
        pub episode_run_time: Vec<u64>,
        /// Facebook id.
        pub facebook_id: Option<String>,
        /// In the account's favorites.
        pub favorite: Option<bool>,
        /// First air date.
        pub first_air_date: Option<NaiveDate>,
        /// Genres.
        pub genres: Vec<Genre>,
        /// Homepage.
        pub homepage: Option<String>,
        /// TMDB id.
        pub id: Option<u64>,
        /// IMDb id.
        pub imdb_id: Option<String>,
        /// Still producing episodes.
        pub in_production: Option<bool>,
        /// Instagram id.
        pub instagram_id: Option<String>,
        /// Keywords.
        pub keywords: Vec<Keyword>,
        /// Languages.
        pub languages: Vec<Language>,
        /// Last air date.
        pub last_air_date: Option<NaiveDate>,
        /// Most recently aired episode.
        pub last_episode_to_air: Option<Box<Episode>>,
        /// Logo images.
        pub logos: Vec<Image>,
        /// Name.
        pub name: Option<String>,
        /// Networks.
        pub networks: Vec<Network>,
        /// Next scheduled episode.
        pub next_episode_to_air: Option<Box<Episode>>,
        /// Number of episodes.
        pub number_of_episodes: u64,
        /// Number of seasons.
        pub number_of_seasons: u64,
        /// Countries of origin.
        pub origin_countries: Vec<Country>,
        /// Original language.
        pub original_language: Option<Language>,
        /// Original name.
        pub original_name: Option<String>,
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
        /// Recommended shows.
        pub recommendations: Option<PagedResult<TvShow>>,
        /// Seasons.
        pub seasons: Vec<Season>,
        /// Similar shows.
        pub similar: Option<PagedResult<TvShow>>,
        /// Spoken languages.
        pub spoken_languages: Vec<Language>,
        /// Production status.
        pub status: Option<String>,
        /// Tagline.
        pub tagline: Option<String>,
        /// Translations.
        pub translations: Vec<Translation>,
        /// TVDB id.
        pub tvdb_id: Option<u64>,
        /// TVRage id.
        pub tvrage_id: Option<u64>,
        /// Twitter id.
        pub twitter_id: Option<String>,
        /// Show type (Scripted, Miniseries, ...).
        pub show_type: Option<String>,
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

impl FromPayload for TvShowData {
    #[allow(clippy::too_many_lines)]
    fn populate(f: &mut Fields<'_>) -> Result<Self> {
        let id: Option<u64> = f.get("id", &["id"], Kind::Int, Options::single().default_none())?;
        let key = id.map(Key::from);
        let keyed = || Options::single().keyed(key.clone());
        let keyed_list = || Options::list().keyed(key.clone());
        let optional = || Options::single().default_none();
        let genres = if f.has("genres") {
            f.list("genres", &["genres"], Kind::LoadGenre)?
        } else {
            f.list("genres", &["genre_ids"], Kind::TvGenre)?
        };

        Ok(Self {
            aggregate_cast: f.get(
                "aggregate_cast",
                &["aggregate_credits", "cast"],
                Kind::AggTvCast,
                Options::extend(),
            )?,
            aggregate_crew: f.get(
                "aggregate_crew",
                &["aggregate_credits", "crew"],
                Kind::AggTvCrew,
                Options::extend(),
            )?,
            alternative_titles: f.list(
                "alternative_titles",
                &["alternative_titles", "results"],
                Kind::AlternativeTitle,
            )?,
            backdrop_path: f.one("backdrop_path", Kind::Str)?,
            backdrop_url: f.image_url("backdrop_url", &["backdrop_path"])?,
            backdrops: f.list("backdrops", &["images", "backdrops"], Kind::Backdrop)?,
            cast: f.list("cast", &["credits", "cast"], Kind::TvCast)?,
            companies: f.list("companies", &["production_companies"], Kind::Company)?,
            content_ratings: f.at(
                "content_ratings",
                &["content_ratings", "results"],
                Kind::ContentRating,
            )?,
            countries: f.list("countries", &["production_countries"], Kind::Country)?,
            created_by: f.list("created_by", &["created_by"], Kind::TvCast)?,
            crew: f.list("crew", &["credits", "crew"], Kind::TvCrew)?,
            episode_groups: f.list(
                "episode_groups",
                &["episode_groups", "results"],
                Kind::EpisodeGroup,
            )?,
            episode_run_time: f.list("episode_run_time", &["episode_run_time"], Kind::Int)?,
            facebook_id: f.at("facebook_id", &["external_ids", "facebook_id"], Kind::Str)?,
            favorite: f.at("favorite", &["account_states", "favorite"], Kind::Bool)?,
            first_air_date: f.one("first_air_date", Kind::Date)?,
            genres,
            homepage: f.one("homepage", Kind::Str)?,
            id,
            imdb_id: f.at("imdb_id", &["external_ids", "imdb_id"], Kind::Str)?,
            in_production: f.one("in_production", Kind::Bool)?,
            instagram_id: f.at("instagram_id", &["external_ids", "instagram_id"], Kind::Str)?,
            keywords: f.list("keywords", &["keywords", "results"], Kind::Keyword)?,
            languages: f.list("languages", &["languages"], Kind::Language)?,
            last_air_date: f.one("last_air_date", Kind::Date)?,
            last_episode_to_air: f.get(
                "last_episode_to_air",
                &["last_episode_to_air"],
                Kind::Episode,
                keyed(),
            )?,
            logos: f.list("logos", &["images", "logos"], Kind::Logo)?,
            name: f.one("name", Kind::Str)?,
            networks: f.list("networks", &["networks"], Kind::Network)?,
            next_episode_to_air: f.get(
                "next_episode_to_air",
                &["next_episode_to_air"],
                Kind::Episode,
                keyed(),
            )?,
            number_of_episodes: f.one("number_of_episodes", Kind::Int)?,
            number_of_seasons: f.one("number_of_seasons", Kind::Int)?,
            origin_countries: f.list("origin_countries", &["origin_country"], Kind::Country)?,
            original_language: f.one("original_language", Kind::Language)?,
            original_name: f.one("original_name", Kind::Str)?,
            overview: f.one("overview", Kind::Str)?,
            popularity: f.one("popularity", Kind::Float)?,
            poster_path: f.one("poster_path", Kind::Str)?,
            poster_url: f.image_url("poster_url", &["poster_path"])?,
            posters: f.list("posters", &["images", "posters"], Kind::Poster)?,
            rated: f.at("rated", &["account_states", "rated"], Kind::Rated)?,
            recommendations: f.get(
                "recommendations",
                &["recommendations"],
                Kind::RecommendedTv,
                keyed(),
            )?,
            seasons: f.get("seasons", &["seasons"], Kind::Season, keyed_list())?,
            similar: f.get("similar", &["similar"], Kind::SimilarTv, keyed())?,
            spoken_languages: f.list("spoken_languages", &["spoken_languages"], Kind::Language)?,
            status: f.one("status", Kind::Str)?,
            tagline: f.one("tagline", Kind::Str)?,
            translations: f.list(
                "translations",
                &["translations", "translations"],
                Kind::Translation,
            )?,
            tvdb_id: f.get("tvdb_id", &["external_ids", "tvdb_id"], Kind::Int, optional())?,
            tvrage_id: f.get("tvrage_id", &["external_ids", "tvrage_id"], Kind::Int, optional())?,
            twitter_id: f.at("twitter_id", &["external_ids", "twitter_id"], Kind::Str)?,
            show_type: f.at("show_type", &["type"], Kind::Str)?,
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

impl Reload for TvShowData {
    const KIND: &'static str = "tv";
    const APPEND: Option<&'static str> = Some(
        "account_states,aggregate_credits,alternative_titles,content_ratings,credits,\
         episode_groups,external_ids,images,keywords,recommendations,similar,translations,\
         videos,watch/providers",
    );

    fn identity(&self) -> Option<EntityId> {
        self.id.map(EntityId::Int)
    }

    fn label(&self) -> Option<String> {
        self.name.clone()
    }

    fn load_request(&self, _: &Seed, ctx: &Context, append: Option<&str>) -> Result<ApiRequest> {
        let id = require_id(self.id.as_ref(), Self::KIND)?;
        Ok(detail_request(format!("tv/{id}"), ctx, append))
    }
}

impl TvShow {
    fn show_id(&self) -> Result<u64> {
        require_id(self.peek().id.as_ref(), TvShowData::KIND)
    }

    /// Rates the show for the session's account.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` when `rating` is outside `[0.5, 10.0]`;
    /// `AuthenticationRequired` without a session.
    pub async fn rate<T: LocalTransport>(&self, tmdb: &Tmdb<T>, rating: f64) -> Result<()> {
        tmdb.rate_media(format!("tv/{}", self.show_id()?), rating)
            .await
    }

    /// Removes the account's rating.
    ///
    /// # Errors
    ///
    /// `AuthenticationRequired` without a session.
    pub async fn delete_rating<T: LocalTransport>(&self, tmdb: &Tmdb<T>) -> Result<()> {
        tmdb.unrate_media(format!("tv/{}", self.show_id()?)).await
    }

    /// Adds the show to the account's favorites.
    ///
    /// # Errors
    ///
    /// `AuthenticationRequired` without a session.
    pub async fn mark_as_favorite<T: LocalTransport>(&self, tmdb: &Tmdb<T>) -> Result<()> {
        tmdb.set_account_flag(AccountFlag::Favorite, "tv", self.show_id()?, true)
            .await
    }

    /// Removes the show from the account's favorites.
    ///
    /// # Errors
    ///
    /// `AuthenticationRequired` without a session.
    pub async fn remove_as_favorite<T: LocalTransport>(&self, tmdb: &Tmdb<T>) -> Result<()> {
        tmdb.set_account_flag(AccountFlag::Favorite, "tv", self.show_id()?, false)
            .await
    }

    /// Adds the show to the account's watchlist.
    ///
    /// # Errors
    ///
    /// `AuthenticationRequired` without a session.
    pub async fn add_to_watchlist<T: LocalTransport>(&self, tmdb: &Tmdb<T>) -> Result<()> {
        tmdb.set_account_flag(AccountFlag::Watchlist, "tv", self.show_id()?, true)
            .await
    }

    /// Removes the show from the account's watchlist.
    ///
    /// # Errors
    ///
    /// `AuthenticationRequired` without a session.
    pub async fn remove_from_watchlist<T: LocalTransport>(&self, tmdb: &Tmdb<T>) -> Result<()> {
        tmdb.set_account_flag(AccountFlag::Watchlist, "tv", self.show_id()?, false)
            .await
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::indexing_slicing)]

    use serde_json::json;

    use super::*;
    use crate::context::Context;
    use crate::testing::MockTransport;

    #[test]
    fn test_show_payload_keys_children_by_show_id() {
        // Arrange
        let payload = json!({
            "id": 1399,
            "name": "Game of Thrones",
            "type": "Scripted",
            "episode_run_time": [60, 55],
            "seasons": [{"id": 3624, "name": "Season 1", "season_number": 1}],
            "last_episode_to_air": {"id": 1551830, "season_number": 8, "episode_number": 6},
            "content_ratings": {"results": [{"iso_3166_1": "US", "rating": "TV-MA"}]},
            "aggregate_credits": {"cast": [
                {"id": 22970, "name": "Peter Dinklage", "roles": [{"credit_id": "c1", "character": "Tyrion Lannister", "episode_count": 67}]}
            ]},
            "external_ids": {"tvdb_id": 121361, "imdb_id": "tt0944947"}
        });

        // Act
        let show = TvShow::from_json(payload, &Context::default(), false).unwrap();
        let data = show.peek();

        // Assert
        assert_eq!(show.to_string(), "[1399:Game of Thrones]");
        assert_eq!(data.show_type.as_deref(), Some("Scripted"));
        assert_eq!(data.episode_run_time, vec![60, 55]);
        assert_eq!(data.seasons[0].peek().tv_id, Some(1399));
        let last = data.last_episode_to_air.as_ref().unwrap();
        assert_eq!(last.peek().tv_id, Some(1399));
        assert_eq!(last.peek().episode_number, 6);
        assert_eq!(data.content_ratings["US"], "TV-MA");
        assert_eq!(data.aggregate_cast.len(), 1);
        assert_eq!(data.aggregate_cast[0].peek().character.as_deref(), Some("Tyrion Lannister"));
        assert_eq!(data.tvdb_id, Some(121_361));
        assert_eq!(data.imdb_id.as_deref(), Some("tt0944947"));
        assert!(data.tvrage_id.is_none());
    }

    #[tokio::test]
    async fn test_stub_season_loads_its_own_path() {
        // Arrange
        let transport = MockTransport::new().route(
            "tv/1399/season/1",
            json!({"id": 3624, "name": "Season 1", "season_number": 1, "episodes": [{"id": 63056, "episode_number": 1, "season_number": 1, "name": "Winter Is Coming"}]}),
        );
        let tmdb = Tmdb::from_parts(transport, Context::default());
        let show = TvShow::from_json(
            json!({"id": 1399, "seasons": [{"id": 3624, "season_number": 1}]}),
            tmdb.context(),
            true,
        )
        .unwrap();
        let mut season = show.peek().seasons[0].clone();

        // Act
        let episodes = season.episodes(&tmdb).await.unwrap();

        // Assert
        assert_eq!(episodes[0].peek().name.as_deref(), Some("Winter Is Coming"));
        assert_eq!(episodes[0].peek().tv_id, Some(1399));
        assert_eq!(tmdb.transport().count("tv/1399/season/1"), 1);
    }
}
