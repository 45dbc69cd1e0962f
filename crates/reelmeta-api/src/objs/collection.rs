//! Movie collections.

use crate::coerce::{Kind, Options};
use crate::context::Context;
use crate::entity::{Entity, EntityId, Fields, FromPayload, Reload, Seed, lazy_fields};
use crate::error::Result;
use crate::transport::ApiRequest;

use super::{Image, Movie, Translation, detail_request, require_id};

/// A collection of movies, e.g. a franchise.
pub type Collection = Entity<CollectionData>;

lazy_fields! {
    /// Fields of a [`Collection`].
    pub struct CollectionData {
        /// Backdrop path.
        pub backdrop_path: Option<String>,
        /// Full backdrop URL.
        pub backdrop_url: Option<String>,
        /// Backdrop images.
        pub backdrops: Vec<Image>,
        /// TMDB id.
        pub id: Option<u64>,
        /// Movies in the collection.
        pub movies: Vec<Movie>,
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
        /// Translations.
        pub translations: Vec<Translation>,
    }
}

impl FromPayload for CollectionData {
    fn populate(f: &mut Fields<'_>) -> Result<Self> {
        Ok(Self {
            backdrop_path: f.one("backdrop_path", Kind::Str)?,
            backdrop_url: f.image_url("backdrop_url", &["backdrop_path"])?,
            backdrops: f.list("backdrops", &["images", "backdrops"], Kind::Backdrop)?,
            id: f.get("id", &["id"], Kind::Int, Options::single().default_none())?,
            movies: f.list("movies", &["parts"], Kind::Movie)?,
            name: f.one("name", Kind::Str)?,
            overview: f.one("overview", Kind::Str)?,
            poster_path: f.one("poster_path", Kind::Str)?,
            poster_url: f.image_url("poster_url", &["poster_path"])?,
            posters: f.list("posters", &["images", "posters"], Kind::Poster)?,
            translations: f.list(
                "translations",
                &["translations", "translations"],
                Kind::Translation,
            )?,
        })
    }
}

impl Reload for CollectionData {
    const KIND: &'static str = "collection";
    const APPEND: Option<&'static str> = Some("images,translations");

    fn identity(&self) -> Option<EntityId> {
        self.id.map(EntityId::Int)
    }

    fn label(&self) -> Option<String> {
        self.name.clone()
    }

    fn load_request(&self, _: &Seed, ctx: &Context, append: Option<&str>) -> Result<ApiRequest> {
        let id = require_id(self.id.as_ref(), Self::KIND)?;
        Ok(detail_request(format!("collection/{id}"), ctx, append))
    }
}
