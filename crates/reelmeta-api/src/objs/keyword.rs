//! Keywords.
#![allow(clippy::future_not_send)]

use crate::coerce::{Kind, Options};
use crate::context::Context;
use crate::entity::{Entity, EntityId, Fields, FromPayload, Reload, Seed, lazy_fields};
use crate::error::Result;
use crate::paged::PagedResult;
use crate::tmdb::{DiscoverParams, Tmdb};
use crate::transport::{ApiRequest, LocalTransport};

use super::{Movie, TvShow, detail_request, require_id};

/// A keyword tagged on movies and shows.
pub type Keyword = Entity<KeywordData>;

lazy_fields! {
    /// Fields of a [`Keyword`].
    pub struct KeywordData {
        /// TMDB id.
        pub id: Option<u64>,
        /// Name.
        pub name: Option<String>,
    }
}

impl FromPayload for KeywordData {
    fn populate(f: &mut Fields<'_>) -> Result<Self> {
        Ok(Self {
            id: f.get("id", &["id"], Kind::Int, Options::single().default_none())?,
            name: f.one("name", Kind::Str)?,
        })
    }
}

impl Reload for KeywordData {
    const KIND: &'static str = "keyword";

    fn identity(&self) -> Option<EntityId> {
        self.id.map(EntityId::Int)
    }

    fn label(&self) -> Option<String> {
        self.name.clone()
    }

    fn load_request(&self, _: &Seed, ctx: &Context, _: Option<&str>) -> Result<ApiRequest> {
        let id = require_id(self.id.as_ref(), Self::KIND)?;
        Ok(ApiRequest::get(format!("keyword/{id}")).query("language", ctx.language()))
    }
}

impl Keyword {
    /// Movies tagged with this keyword.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` without an id; otherwise propagates the discover
    /// request failure.
    pub async fn movies<T: LocalTransport>(&self, tmdb: &Tmdb<T>) -> Result<PagedResult<Movie>> {
        let id = require_id(self.peek().id.as_ref(), KeywordData::KIND)?;
        tmdb.discover_movies(DiscoverParams::new().param("with_keywords", id))
            .await
    }

    /// Shows tagged with this keyword.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` without an id; otherwise propagates the discover
    /// request failure.
    pub async fn tv_shows<T: LocalTransport>(
        &self,
        tmdb: &Tmdb<T>,
    ) -> Result<PagedResult<TvShow>> {
        let id = require_id(self.peek().id.as_ref(), KeywordData::KIND)?;
        tmdb.discover_tv_shows(DiscoverParams::new().param("with_keywords", id))
            .await
    }
}
