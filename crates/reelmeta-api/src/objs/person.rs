//! People: cast and crew members.

use chrono::NaiveDate;

use crate::coerce::{Key, Kind, Options};
use crate::context::Context;
use crate::entity::{Entity, EntityId, Fields, FromPayload, Reload, Seed, lazy_fields};
use crate::error::Result;
use crate::paged::PagedResult;
use crate::transport::ApiRequest;

use super::{Credit, Image, Media, Tagged, Translation, detail_request, require_id};

/// A person.
pub type Person = Entity<PersonData>;

lazy_fields! {
    /// Fields of a [`Person`].
    pub struct PersonData {
        /// Adult performer.
        pub adult: Option<bool>,
        /// Other names.
        pub also_known_as: Vec<String>,
        /// Biography.
        pub biography: Option<String>,
        /// Date of birth.
        pub birthday: Option<NaiveDate>,
        /// Date of death.
        pub deathday: Option<NaiveDate>,
        /// Facebook id.
        pub facebook_id: Option<String>,
        /// Gender code.
        pub gender: u64,
        /// Homepage.
        pub homepage: Option<String>,
        /// TMDB id.
        pub id: Option<u64>,
        /// IMDb id.
        pub imdb_id: Option<String>,
        /// Instagram id.
        pub instagram_id: Option<String>,
        /// Titles the person is known for (search results only).
        pub known_for: Vec<Media>,
        /// Department the person is known for.
        pub known_for_department: Option<String>,
        /// Movie cast credits.
        pub movie_cast: Vec<Credit>,
        /// Movie crew credits.
        pub movie_crew: Vec<Credit>,
        /// Name.
        pub name: Option<String>,
        /// Place of birth.
        pub place_of_birth: Option<String>,
        /// Popularity score.
        pub popularity: f64,
        /// Profile path.
        pub profile_path: Option<String>,
        /// Full profile URL.
        pub profile_url: Option<String>,
        /// Profile images.
        pub profiles: Vec<Image>,
        /// Images the person is tagged in.
        pub tagged: Option<PagedResult<Tagged>>,
        /// Translations.
        pub translations: Vec<Translation>,
        /// TV cast credits.
        pub tv_cast: Vec<Credit>,
        /// TV crew credits.
        pub tv_crew: Vec<Credit>,
        /// TVRage id.
        pub tvrage_id: Option<u64>,
        /// Twitter id.
        pub twitter_id: Option<String>,
        /// Wikidata id.
        pub wikidata_id: Option<String>,
    }
}

impl FromPayload for PersonData {
    fn populate(f: &mut Fields<'_>) -> Result<Self> {
        let optional = || Options::single().default_none();
        let id: Option<u64> = f.get("id", &["id"], Kind::Int, optional())?;

        Ok(Self {
            adult: f.one("adult", Kind::Bool)?,
            also_known_as: f.list("also_known_as", &["also_known_as"], Kind::Str)?,
            biography: f.one("biography", Kind::Str)?,
            birthday: f.one("birthday", Kind::Date)?,
            deathday: f.one("deathday", Kind::Date)?,
            facebook_id: f.at("facebook_id", &["external_ids", "facebook_id"], Kind::Str)?,
            gender: f.one("gender", Kind::Int)?,
            homepage: f.one("homepage", Kind::Str)?,
            id,
            imdb_id: f.first(
                "imdb_id",
                &[&["imdb_id"], &["external_ids", "imdb_id"]],
                Kind::Str,
                Options::single(),
            )?,
            instagram_id: f.at("instagram_id", &["external_ids", "instagram_id"], Kind::Str)?,
            known_for: f.list("known_for", &["known_for"], Kind::MediaType)?,
            known_for_department: f.one("known_for_department", Kind::Str)?,
            movie_cast: f.list("movie_cast", &["movie_credits", "cast"], Kind::MovieCast)?,
            movie_crew: f.list("movie_crew", &["movie_credits", "crew"], Kind::MovieCrew)?,
            name: f.one("name", Kind::Str)?,
            place_of_birth: f.one("place_of_birth", Kind::Str)?,
            popularity: f.one("popularity", Kind::Float)?,
            profile_path: f.one("profile_path", Kind::Str)?,
            profile_url: f.image_url("profile_url", &["profile_path"])?,
            profiles: f.list("profiles", &["images", "profiles"], Kind::Profile)?,
            tagged: f.get(
                "tagged",
                &["tagged_images"],
                Kind::TaggedImages,
                Options::single().keyed(id.map(Key::from)),
            )?,
            translations: f.list(
                "translations",
                &["translations", "translations"],
                Kind::Translation,
            )?,
            tv_cast: f.list("tv_cast", &["tv_credits", "cast"], Kind::TvCast)?,
            tv_crew: f.list("tv_crew", &["tv_credits", "crew"], Kind::TvCrew)?,
            tvrage_id: f.get("tvrage_id", &["external_ids", "tvrage_id"], Kind::Int, optional())?,
            twitter_id: f.at("twitter_id", &["external_ids", "twitter_id"], Kind::Str)?,
            wikidata_id: f.at("wikidata_id", &["external_ids", "wikidata_id"], Kind::Str)?,
        })
    }
}

impl Reload for PersonData {
    const KIND: &'static str = "person";
    const APPEND: Option<&'static str> =
        Some("movie_credits,tv_credits,external_ids,images,tagged_images,translations");

    fn identity(&self) -> Option<EntityId> {
        self.id.map(EntityId::Int)
    }

    fn label(&self) -> Option<String> {
        self.name.clone()
    }

    fn load_request(&self, _: &Seed, ctx: &Context, append: Option<&str>) -> Result<ApiRequest> {
        let id = require_id(self.id.as_ref(), Self::KIND)?;
        Ok(detail_request(format!("person/{id}"), ctx, append))
    }
}
