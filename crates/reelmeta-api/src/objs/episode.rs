//! TV episodes.
#![allow(clippy::future_not_send)]

use chrono::NaiveDate;

use crate::coerce::{Key, Kind, Options};
use crate::context::Context;
use crate::entity::{Entity, EntityId, Fields, FromPayload, Reload, Seed, lazy_fields};
use crate::error::{Result, TmdbError};
use crate::tmdb::Tmdb;
use crate::transport::{ApiRequest, LocalTransport};

use super::{Credit, Image, Translation, Video, detail_request};

/// An episode of a TV show.
pub type Episode = Entity<EpisodeData>;

lazy_fields! {
    /// Fields of an [`Episode`].
    pub struct EpisodeData {
        /// Air date.
        pub air_date: Option<NaiveDate>,
        /// Cast.
        pub cast: Vec<Credit>,
        /// Crew.
        pub crew: Vec<Credit>,
        /// Episode number within the season.
        pub episode_number: u64,
        /// Guest stars.
        pub guest_stars: Vec<Credit>,
        /// TMDB id.
        pub id: Option<u64>,
        /// IMDb id.
        pub imdb_id: Option<String>,
        /// Name.
        pub name: Option<String>,
        /// Position inside an episode group.
        pub order: Option<u64>,
        /// Overview.
        pub overview: Option<String>,
        /// Production code.
        pub production_code: Option<String>,
        /// The account's rating.
        pub rated: Option<f64>,
        /// Runtime in minutes.
        pub runtime: Option<u64>,
        /// Season number.
        pub season_number: u64,
        /// Still path.
        pub still_path: Option<String>,
        /// Full still URL.
        pub still_url: Option<String>,
        /// Still images.
        pub stills: Vec<Image>,
        /// Translations.
        pub translations: Vec<Translation>,
        /// Show id.
        pub tv_id: Option<u64>,
        /// TVDB id.
        pub tvdb_id: Option<u64>,
        /// TVRage id.
        pub tvrage_id: Option<u64>,
        /// Videos.
        pub videos: Vec<Video>,
        /// Average vote.
        pub vote_average: f64,
        /// Number of votes.
        pub vote_count: u64,
    }
}

impl FromPayload for EpisodeData {
    fn populate(f: &mut Fields<'_>) -> Result<Self> {
        let optional = || Options::single().default_none();
        let tv_id = if f.has("show_id") {
            f.get("tv_id", &["show_id"], Kind::Int, optional())?
        } else {
            let key = f.seed().key.as_ref().and_then(Key::as_u64);
            if key.is_some() {
                f.mark("tv_id");
            }
            key
        };

        Ok(Self {
            air_date: f.one("air_date", Kind::Date)?,
            cast: f.list("cast", &["credits", "cast"], Kind::TvCast)?,
            crew: f.first(
                "crew",
                &[&["credits", "crew"], &["crew"]],
                Kind::TvCrew,
                Options::list(),
            )?,
            episode_number: f.one("episode_number", Kind::Int)?,
            guest_stars: f.first(
                "guest_stars",
                &[&["credits", "guest_stars"], &["guest_stars"]],
                Kind::TvCast,
                Options::list(),
            )?,
            id: f.get("id", &["id"], Kind::Int, optional())?,
            imdb_id: f.at("imdb_id", &["external_ids", "imdb_id"], Kind::Str)?,
            name: f.one("name", Kind::Str)?,
            order: f.get("order", &["order"], Kind::Int, optional())?,
            overview: f.one("overview", Kind::Str)?,
            production_code: f.one("production_code", Kind::Str)?,
            rated: f.at("rated", &["account_states", "rated"], Kind::Rated)?,
            runtime: f.get("runtime", &["runtime"], Kind::Int, optional())?,
            season_number: f.one("season_number", Kind::Int)?,
            still_path: f.one("still_path", Kind::Str)?,
            still_url: f.image_url("still_url", &["still_path"])?,
            stills: f.list("stills", &["images", "stills"], Kind::Still)?,
            translations: f.list(
                "translations",
                &["translations", "translations"],
                Kind::Translation,
            )?,
            tv_id,
            tvdb_id: f.get("tvdb_id", &["external_ids", "tvdb_id"], Kind::Int, optional())?,
            tvrage_id: f.get("tvrage_id", &["external_ids", "tvrage_id"], Kind::Int, optional())?,
            videos: f.list("videos", &["videos", "results"], Kind::Video)?,
            vote_average: f.one("vote_average", Kind::Float)?,
            vote_count: f.one("vote_count", Kind::Int)?,
        })
    }
}

impl EpisodeData {
    fn path(&self) -> Result<String> {
        let tv_id = self
            .tv_id
            .ok_or_else(|| TmdbError::invalid("episode has no show id"))?;
        Ok(format!(
            "tv/{tv_id}/season/{}/episode/{}",
            self.season_number, self.episode_number
        ))
    }
}

impl Reload for EpisodeData {
    const KIND: &'static str = "episode";
    const APPEND: Option<&'static str> =
        Some("account_states,credits,external_ids,images,translations,videos");

    fn identity(&self) -> Option<EntityId> {
        self.id.map(EntityId::Int)
    }

    fn label(&self) -> Option<String> {
        self.name.clone()
    }

    fn load_request(&self, _: &Seed, ctx: &Context, append: Option<&str>) -> Result<ApiRequest> {
        Ok(detail_request(self.path()?, ctx, append))
    }
}

impl Episode {
    /// Rates the episode for the session's account.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` when `rating` is outside `[0.5, 10.0]` or the show
    /// id is unknown; `AuthenticationRequired` without a session.
    pub async fn rate<T: LocalTransport>(&self, tmdb: &Tmdb<T>, rating: f64) -> Result<()> {
        tmdb.rate_media(self.peek().path()?, rating).await
    }

    /// Removes the account's rating.
    ///
    /// # Errors
    ///
    /// `AuthenticationRequired` without a session.
    pub async fn delete_rating<T: LocalTransport>(&self, tmdb: &Tmdb<T>) -> Result<()> {
        tmdb.unrate_media(self.peek().path()?).await
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::indexing_slicing)]

    use serde_json::json;

    use super::*;
    use crate::testing::MockTransport;
    use crate::transport::Method;

    #[test]
    fn test_show_id_in_payload_wins_over_seed() {
        let seed = Seed::keyed(Some(Key::Int(1)));
        let episode = Episode::new(
            json!({"id": 9, "show_id": 1399, "season_number": 1, "episode_number": 2, "guest_stars": [{"id": 5, "name": "Guest"}]}),
            &Context::default(),
            seed,
            true,
        )
        .unwrap();

        assert_eq!(episode.peek().tv_id, Some(1399));
        assert_eq!(episode.peek().guest_stars.len(), 1);
        assert_eq!(episode.peek().guest_stars[0].peek().media_type.as_deref(), Some("tv"));
    }

    #[tokio::test]
    async fn test_episode_rating_path() {
        // Arrange
        let transport = MockTransport::new().with_session().route_method(
            Method::Post,
            "tv/1399/season/1/episode/1/rating",
            json!({"success": true}),
        );
        let tmdb = Tmdb::from_parts(transport, Context::default());
        let episode = Episode::from_json(
            json!({"id": 63056, "show_id": 1399, "season_number": 1, "episode_number": 1}),
            tmdb.context(),
            true,
        )
        .unwrap();

        // Act
        episode.rate(&tmdb, 9.0).await.unwrap();

        // Assert
        assert_eq!(tmdb.transport().count("tv/1399/season/1/episode/1/rating"), 1);
    }
}
