//! TV seasons.

use chrono::NaiveDate;

use crate::coerce::{Key, Kind, Options};
use crate::context::Context;
use crate::entity::{Entity, EntityId, Fields, FromPayload, Reload, Seed, lazy_fields};
use crate::error::{Result, TmdbError};
use crate::transport::ApiRequest;

use super::{Credit, Episode, Image, Translation, Video, detail_request};

/// A season of a TV show.
pub type Season = Entity<SeasonData>;

lazy_fields! {
    /// Fields of a [`Season`].
    pub struct SeasonData {
        /// Cast across the season's episodes, one credit per role.
        pub aggregate_cast: Vec<Credit>,
        /// Crew across the season's episodes, one credit per job.
        pub aggregate_crew: Vec<Credit>,
        /// Air date of the first episode.
        pub air_date: Option<NaiveDate>,
        /// Cast.
        pub cast: Vec<Credit>,
        /// Crew.
        pub crew: Vec<Credit>,
        /// Episodes.
        pub episodes: Vec<Episode>,
        /// Facebook id.
        pub facebook_id: Option<String>,
        /// TMDB id.
        pub id: Option<u64>,
        /// Instagram id.
        pub instagram_id: Option<String>,
        /// Name.
        pub name: Option<String>,
        /// Overview.
        pub overview: Option<String>,
        /// Poster path.
        pub poster_path: Option<String>,
        /// Full poster URL.
        pub poster_url: Option<String>,
        /// Poster images.
        pub posters: Vec<Image>,
        /// Season number (0 for specials).
        pub season_number: u64,
        /// Translations.
        pub translations: Vec<Translation>,
        /// Show id.
        pub tv_id: Option<u64>,
        /// TVDB id.
        pub tvdb_id: Option<u64>,
        /// TVRage id.
        pub tvrage_id: Option<u64>,
        /// Twitter id.
        pub twitter_id: Option<String>,
        /// Videos.
        pub videos: Vec<Video>,
        /// Average vote.
        pub vote_average: f64,
    }
}

impl FromPayload for SeasonData {
    fn populate(f: &mut Fields<'_>) -> Result<Self> {
        let tv_id = match f.seed().key.as_ref().and_then(Key::as_u64) {
            Some(id) => {
                f.mark("tv_id");
                Some(id)
            }
            None => f.get("tv_id", &["show_id"], Kind::Int, Options::single().default_none())?,
        };
        let optional = || Options::single().default_none();

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
            air_date: f.one("air_date", Kind::Date)?,
            cast: f.list("cast", &["credits", "cast"], Kind::TvCast)?,
            crew: f.list("crew", &["credits", "crew"], Kind::TvCrew)?,
            episodes: f.get(
                "episodes",
                &["episodes"],
                Kind::Episode,
                Options::list().keyed(tv_id.map(Key::from)),
            )?,
            facebook_id: f.at("facebook_id", &["external_ids", "facebook_id"], Kind::Str)?,
            id: f.get("id", &["id"], Kind::Int, optional())?,
            instagram_id: f.at("instagram_id", &["external_ids", "instagram_id"], Kind::Str)?,
            name: f.one("name", Kind::Str)?,
            overview: f.one("overview", Kind::Str)?,
            poster_path: f.one("poster_path", Kind::Str)?,
            poster_url: f.image_url("poster_url", &["poster_path"])?,
            posters: f.list("posters", &["images", "posters"], Kind::Poster)?,
            season_number: f.one("season_number", Kind::Int)?,
            translations: f.list(
                "translations",
                &["translations", "translations"],
                Kind::Translation,
            )?,
            tv_id,
            tvdb_id: f.get("tvdb_id", &["external_ids", "tvdb_id"], Kind::Int, optional())?,
            tvrage_id: f.get("tvrage_id", &["external_ids", "tvrage_id"], Kind::Int, optional())?,
            twitter_id: f.at("twitter_id", &["external_ids", "twitter_id"], Kind::Str)?,
            videos: f.list("videos", &["videos", "results"], Kind::Video)?,
            vote_average: f.one("vote_average", Kind::Float)?,
        })
    }
}

impl Reload for SeasonData {
    const KIND: &'static str = "season";
    const APPEND: Option<&'static str> =
        Some("aggregate_credits,credits,external_ids,images,translations,videos");

    fn identity(&self) -> Option<EntityId> {
        self.id.map(EntityId::Int)
    }

    fn label(&self) -> Option<String> {
        self.name.clone()
    }

    fn load_request(&self, _: &Seed, ctx: &Context, append: Option<&str>) -> Result<ApiRequest> {
        let tv_id = self
            .tv_id
            .ok_or_else(|| TmdbError::invalid("season has no show id to load"))?;
        Ok(detail_request(
            format!("tv/{tv_id}/season/{}", self.season_number),
            ctx,
            append,
        ))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use serde_json::json;

    use super::*;

    #[test]
    fn test_season_without_show_id_cannot_load() {
        let season = Season::from_json(json!({"id": 1, "season_number": 2}), &Context::default(), true)
            .unwrap();

        let request = season.peek().load_request(season.seed(), &Context::default(), None);

        assert!(matches!(request, Err(TmdbError::InvalidArgument(_))));
        assert!(!season.is_populated("tv_id"));
    }
}
