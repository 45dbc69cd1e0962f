//! Cast and crew credits.
//!
//! A credit payload comes in three shapes: flat entries of a `credits`
//! block, aggregate entries (expanded per role by the dispatcher before
//! they get here) and the `credit/{id}` detail shape with nested `person`
//! and `media` objects. All three populate the same [`CreditData`].

use crate::coerce::{Key, Kind, Options};
use crate::context::Context;
use crate::entity::{Entity, EntityId, Fields, FromPayload, Reload, Seed, lazy_fields};
use crate::error::Result;
use crate::transport::ApiRequest;

use super::{Episode, Media, Movie, Season, TvShow, detail_request, require_id};

/// A cast or crew credit.
pub type Credit = Entity<CreditData>;

lazy_fields! {
    /// Fields of a [`Credit`].
    pub struct CreditData {
        /// Adult performer.
        pub adult: Option<bool>,
        /// Character played.
        pub character: Option<String>,
        /// `cast` or `crew`.
        pub credit_type: Option<String>,
        /// Crew department.
        pub department: Option<String>,
        /// Episodes credited (TV).
        pub episode_count: Option<u64>,
        /// Episodes of the credit (TV detail shape).
        pub episodes: Vec<Episode>,
        /// Gender code.
        pub gender: u64,
        /// Credit id.
        pub id: Option<String>,
        /// Crew job.
        pub job: Option<String>,
        /// Titles the person is known for.
        pub known_for: Vec<Media>,
        /// Department the person is known for.
        pub known_for_department: Option<String>,
        /// `movie` or `tv`.
        pub media_type: Option<String>,
        /// Movie of the credit.
        pub movie: Option<Box<Movie>>,
        /// Person name.
        pub name: Option<String>,
        /// Billing order.
        pub order: Option<u64>,
        /// Person original name.
        pub original_name: Option<String>,
        /// Person id.
        pub person_id: Option<u64>,
        /// Person popularity.
        pub popularity: f64,
        /// Profile path.
        pub profile_path: Option<String>,
        /// Full profile URL.
        pub profile_url: Option<String>,
        /// Seasons of the credit (TV detail shape).
        pub seasons: Vec<Season>,
        /// Show of the credit.
        pub tv_show: Option<Box<TvShow>>,
    }
}

impl FromPayload for CreditData {
    #[allow(clippy::too_many_lines)]
    fn populate(f: &mut Fields<'_>) -> Result<Self> {
        let person = f.has("person");
        let in_person = |field: &'static str| -> Vec<&'static str> {
            if person { vec!["person", field] } else { vec![field] }
        };
        let optional = || Options::single().default_none();

        let seed = f.seed();
        let credit_type = seeded(f, "credit_type", seed.credit_type)?;
        let media_type = seeded(f, "media_type", seed.media_type)?;
        let character = if f.has("media") {
            f.at("character", &["media", "character"], Kind::Str)?
        } else {
            f.one("character", Kind::Str)?
        };
        let id = if f.has("credit_id") {
            f.at("id", &["credit_id"], Kind::Str)?
        } else {
            f.one("id", Kind::Str)?
        };

        // Person-view credits are the media item itself plus a credit id.
        let media_shaped = !person
            && f.has("credit_id")
            && (f.has("title") || f.has("release_date") || f.has("first_air_date"));
        let person_id = if media_shaped {
            None
        } else {
            f.get("person_id", &in_person("id"), Kind::Int, optional())?
        };

        let mut movie = None;
        let mut tv_show = None;
        let mut seasons = Vec::new();
        let mut episodes = Vec::new();
        if f.has("media") {
            match media_type.as_deref() {
                Some("movie") => movie = f.at("movie", &["media"], Kind::Movie)?,
                Some("tv") => {
                    let show: Option<Box<TvShow>> = f.at("tv_show", &["media"], Kind::TvShow)?;
                    let key = show.as_ref().and_then(|s| s.peek().id).map(Key::from);
                    seasons = f.get(
                        "seasons",
                        &["media", "seasons"],
                        Kind::Season,
                        Options::list().keyed(key.clone()),
                    )?;
                    episodes = f.get(
                        "episodes",
                        &["media", "episodes"],
                        Kind::Episode,
                        Options::list().keyed(key),
                    )?;
                    tv_show = show;
                }
                _ => {}
            }
        } else if media_shaped {
            match media_type.as_deref() {
                Some("movie") => movie = f.at("movie", &[], Kind::Movie)?,
                Some("tv") => tv_show = f.at("tv_show", &[], Kind::TvShow)?,
                _ => {}
            }
        }

        Ok(Self {
            adult: f.at("adult", &in_person("adult"), Kind::Bool)?,
            character,
            credit_type,
            department: f.one("department", Kind::Str)?,
            episode_count: f.get("episode_count", &["episode_count"], Kind::Int, optional())?,
            episodes,
            gender: f.at("gender", &in_person("gender"), Kind::Int)?,
            id,
            job: f.one("job", Kind::Str)?,
            known_for: f.list("known_for", &["person", "known_for"], Kind::MediaType)?,
            known_for_department: f.at(
                "known_for_department",
                &in_person("known_for_department"),
                Kind::Str,
            )?,
            media_type,
            movie,
            name: f.at("name", &in_person("name"), Kind::Str)?,
            order: f.get("order", &["order"], Kind::Int, optional())?,
            original_name: f.at("original_name", &in_person("original_name"), Kind::Str)?,
            person_id,
            popularity: f.at("popularity", &in_person("popularity"), Kind::Float)?,
            profile_path: f.at("profile_path", &in_person("profile_path"), Kind::Str)?,
            profile_url: f.image_url("profile_url", &in_person("profile_path"))?,
            seasons,
            tv_show,
        })
    }
}

/// Payload value of `name`, else the seed's default for it.
fn seeded(
    f: &mut Fields<'_>,
    name: &'static str,
    default: Option<&'static str>,
) -> Result<Option<String>> {
    let value: Option<String> = f.one(name, Kind::Str)?;
    if value.is_some() {
        return Ok(value);
    }
    if default.is_some() {
        f.mark(name);
    }
    Ok(default.map(String::from))
}

impl Reload for CreditData {
    const KIND: &'static str = "credit";

    fn identity(&self) -> Option<EntityId> {
        self.id.clone().map(EntityId::Str)
    }

    fn label(&self) -> Option<String> {
        self.name.clone()
    }

    fn load_request(&self, _: &Seed, ctx: &Context, append: Option<&str>) -> Result<ApiRequest> {
        let id = require_id(self.id.as_ref(), Self::KIND)?;
        Ok(detail_request(format!("credit/{id}"), ctx, append))
    }
}
