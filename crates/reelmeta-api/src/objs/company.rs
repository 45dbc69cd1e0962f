//! Production companies and TV networks.
#![allow(clippy::future_not_send)]

use crate::coerce::{Kind, Options};
use crate::context::Context;
use crate::entity::{Entity, EntityId, Fields, FromPayload, Reload, Seed, lazy_fields};
use crate::error::Result;
use crate::paged::PagedResult;
use crate::tmdb::{DiscoverParams, Tmdb};
use crate::transport::{ApiRequest, LocalTransport};

use super::{AlternativeName, Country, Image, Movie, TvShow, detail_request, require_id};

const APPEND: &str = "alternative_names,images";

/// A production company.
pub type Company = Entity<CompanyData>;

/// A TV network.
pub type Network = Entity<NetworkData>;

lazy_fields! {
    /// Fields of a [`Company`].
    pub struct CompanyData {
        /// Alternative names.
        pub alternative_names: Vec<AlternativeName>,
        /// Description.
        pub description: Option<String>,
        /// Headquarters.
        pub headquarters: Option<String>,
        /// Homepage.
        pub homepage: Option<String>,
        /// TMDB id.
        pub id: Option<u64>,
        /// Logo path.
        pub logo_path: Option<String>,
        /// Full logo URL.
        pub logo_url: Option<String>,
        /// Logo images.
        pub logos: Vec<Image>,
        /// Name.
        pub name: Option<String>,
        /// Origin country code.
        pub origin_country: Option<String>,
        /// Parent company.
        pub parent_company: Option<Box<Company>>,
    }
}

lazy_fields! {
    /// Fields of a [`Network`].
    pub struct NetworkData {
        /// Alternative names.
        pub alternative_names: Vec<AlternativeName>,
        /// Origin country.
        pub country: Option<Country>,
        /// Headquarters.
        pub headquarters: Option<String>,
        /// Homepage.
        pub homepage: Option<String>,
        /// TMDB id.
        pub id: Option<u64>,
        /// Logo path.
        pub logo_path: Option<String>,
        /// Full logo URL.
        pub logo_url: Option<String>,
        /// Logo images.
        pub logos: Vec<Image>,
        /// Name.
        pub name: Option<String>,
    }
}

impl FromPayload for CompanyData {
    fn populate(f: &mut Fields<'_>) -> Result<Self> {
        Ok(Self {
            alternative_names: f.list(
                "alternative_names",
                &["alternative_names", "results"],
                Kind::AlternativeName,
            )?,
            description: f.one("description", Kind::Str)?,
            headquarters: f.one("headquarters", Kind::Str)?,
            homepage: f.one("homepage", Kind::Str)?,
            id: f.get("id", &["id"], Kind::Int, Options::single().default_none())?,
            logo_path: f.one("logo_path", Kind::Str)?,
            logo_url: f.image_url("logo_url", &["logo_path"])?,
            logos: f.list("logos", &["images", "logos"], Kind::Logo)?,
            name: f.one("name", Kind::Str)?,
            origin_country: f.one("origin_country", Kind::Str)?,
            parent_company: f.one("parent_company", Kind::Company)?,
        })
    }
}

impl FromPayload for NetworkData {
    fn populate(f: &mut Fields<'_>) -> Result<Self> {
        Ok(Self {
            alternative_names: f.list(
                "alternative_names",
                &["alternative_names", "results"],
                Kind::AlternativeName,
            )?,
            country: f.at("country", &["origin_country"], Kind::Country)?,
            headquarters: f.one("headquarters", Kind::Str)?,
            homepage: f.one("homepage", Kind::Str)?,
            id: f.get("id", &["id"], Kind::Int, Options::single().default_none())?,
            logo_path: f.one("logo_path", Kind::Str)?,
            logo_url: f.image_url("logo_url", &["logo_path"])?,
            logos: f.list("logos", &["images", "logos"], Kind::Logo)?,
            name: f.one("name", Kind::Str)?,
        })
    }
}

impl Reload for CompanyData {
    const KIND: &'static str = "company";
    const APPEND: Option<&'static str> = Some(APPEND);

    fn identity(&self) -> Option<EntityId> {
        self.id.map(EntityId::Int)
    }

    fn label(&self) -> Option<String> {
        self.name.clone()
    }

    fn load_request(&self, _: &Seed, ctx: &Context, append: Option<&str>) -> Result<ApiRequest> {
        let id = require_id(self.id.as_ref(), Self::KIND)?;
        Ok(detail_request(format!("company/{id}"), ctx, append))
    }
}

impl Reload for NetworkData {
    const KIND: &'static str = "network";
    const APPEND: Option<&'static str> = Some(APPEND);

    fn identity(&self) -> Option<EntityId> {
        self.id.map(EntityId::Int)
    }

    fn label(&self) -> Option<String> {
        self.name.clone()
    }

    fn load_request(&self, _: &Seed, ctx: &Context, append: Option<&str>) -> Result<ApiRequest> {
        let id = require_id(self.id.as_ref(), Self::KIND)?;
        Ok(detail_request(format!("network/{id}"), ctx, append))
    }
}

impl Company {
    /// Movies produced by this company, via discover.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` without an id; otherwise propagates the discover
    /// request failure.
    pub async fn movies<T: LocalTransport>(&self, tmdb: &Tmdb<T>) -> Result<PagedResult<Movie>> {
        let id = require_id(self.peek().id.as_ref(), CompanyData::KIND)?;
        tmdb.discover_movies(DiscoverParams::new().param("with_companies", id))
            .await
    }

    /// Shows produced by this company, via discover.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` without an id; otherwise propagates the discover
    /// request failure.
    pub async fn tv_shows<T: LocalTransport>(
        &self,
        tmdb: &Tmdb<T>,
    ) -> Result<PagedResult<TvShow>> {
        let id = require_id(self.peek().id.as_ref(), CompanyData::KIND)?;
        tmdb.discover_tv_shows(DiscoverParams::new().param("with_companies", id))
            .await
    }
}

impl Network {
    /// Shows aired by this network, via discover.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` without an id; otherwise propagates the discover
    /// request failure.
    pub async fn tv_shows<T: LocalTransport>(
        &self,
        tmdb: &Tmdb<T>,
    ) -> Result<PagedResult<TvShow>> {
        let id = require_id(self.peek().id.as_ref(), NetworkData::KIND)?;
        tmdb.discover_tv_shows(DiscoverParams::new().param("with_networks", id))
            .await
    }
}
