//! The `Tmdb` facade.
//!
//! Owns a transport and the [`Context`] every object is built against.
//! Entity getters, listings, searches, account views and writes are split
//! across the submodules as inherent `impl` blocks.
#![allow(clippy::future_not_send)]

mod account;
mod listing;
mod lookup;
mod params;

use serde_json::{Value, json};
use tokio::sync::OnceCell;
use tracing::instrument;

pub use account::{AccountFlag, NewList, V3_SORTS, V4_MOVIE_SORTS, V4_SHOW_SORTS};
pub use lookup::FindResults;
pub use params::{
    DISCOVER_MOVIE_OPTIONS, DISCOVER_MOVIE_SORTS, DISCOVER_TV_OPTIONS, DISCOVER_TV_SORTS,
    DiscoverParams, DiscoverValue, FindQuery, SearchOptions, TimeWindow, TrendingMedia,
    validate_date,
};

use crate::coerce::{FromCoerced, Key, Kind, Options, coerce};
use crate::context::Context;
use crate::entity::{Entity, Reload, Seed};
use crate::error::{Result, TmdbError};
use crate::objs::{
    Account, Collection, Company, Configuration, ConfigurationData, Credit, Episode, EpisodeGroup,
    Genre, Keyword, LIST_SORTS, Movie, Network, Person, Review, Season, TmdbList, TvShow,
    list_source,
};
use crate::paged::PagedResult;
use crate::transport::{ApiRequest, LocalTransport};

/// TMDB facade.
///
/// Built with [`Tmdb::builder`], which loads the configuration and genre
/// tables before any object is parsed.
#[derive(Debug)]
pub struct Tmdb<T> {
    transport: T,
    context: Context,
    account_id: OnceCell<u64>,
}

/// Builder for [`Tmdb`].
#[derive(Debug)]
pub struct TmdbBuilder<T> {
    transport: T,
    language: Option<String>,
    include_image_language: Option<String>,
    include_video_language: Option<String>,
}

impl<T: LocalTransport> TmdbBuilder<T> {
    /// Request language (ISO 639-1 or primary translation such as `pt-BR`).
    #[must_use]
    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    /// Comma separated `include_image_language` codes (`null` allowed).
    #[must_use]
    pub fn include_image_language(mut self, languages: impl Into<String>) -> Self {
        self.include_image_language = Some(languages.into());
        self
    }

    /// Comma separated `include_video_language` codes (`null` allowed).
    #[must_use]
    pub fn include_video_language(mut self, languages: impl Into<String>) -> Self {
        self.include_video_language = Some(languages.into());
        self
    }

    /// Loads the configuration and genre tables and applies the language
    /// preferences.
    ///
    /// # Errors
    ///
    /// Propagates transport failures; `InvalidArgument` for unknown
    /// language codes.
    #[instrument(skip_all)]
    pub async fn connect(self) -> Result<Tmdb<T>> {
        let mut tmdb = Tmdb::from_parts(self.transport, Context::default());
        tmdb.load_tables().await?;

        if let Some(language) = self.language {
            tmdb.set_language(&language)?;
        }
        let image = self
            .include_image_language
            .map(|codes| tmdb.validate_language_list(&codes))
            .transpose()?;
        let video = self
            .include_video_language
            .map(|codes| tmdb.validate_language_list(&codes))
            .transpose()?;
        tmdb.context.set_include_image_language(image);
        tmdb.context.set_include_video_language(video);
        let v4 = tmdb.transport.has_v4_token();
        tmdb.context.set_v4_lists(v4);

        tracing::debug!(
            language = tmdb.context.language(),
            v4_lists = v4,
            "connected to TMDB"
        );
        Ok(tmdb)
    }
}

impl<T> Tmdb<T> {
    /// Wraps an already configured context without any network access.
    #[must_use]
    pub fn from_parts(transport: T, context: Context) -> Self {
        Self {
            transport,
            context,
            account_id: OnceCell::new(),
        }
    }

    /// Underlying transport.
    #[must_use]
    pub const fn transport(&self) -> &T {
        &self.transport
    }

    /// Lookup tables and request preferences.
    #[must_use]
    pub const fn context(&self) -> &Context {
        &self.context
    }

    /// Sets the request language.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` when the code is neither a known language nor a
    /// primary translation.
    pub fn set_language(&mut self, language: &str) -> Result<()> {
        let language = self.context.validate_request_language(language)?;
        self.context.set_language(language);
        Ok(())
    }

    fn validate_language_list(&self, codes: &str) -> Result<String> {
        codes
            .split(',')
            .map(str::trim)
            .map(|code| {
                if code == "null" {
                    Ok(String::from(code))
                } else {
                    self.context.validate_language(code)
                }
            })
            .collect::<Result<Vec<_>>>()
            .map(|codes| codes.join(","))
    }

    /// Coerces the value at `path` of a payload against this facade's
    /// lookup tables.
    pub(crate) fn extract<V: FromCoerced>(
        &self,
        payload: &Value,
        path: &[&str],
        kind: Kind,
        options: &Options,
    ) -> Result<V> {
        V::from_coerced(coerce(Some(payload), path, kind, options, &self.context)?)
    }
}

impl<T: LocalTransport> Tmdb<T> {
    /// Starts building a facade over `transport`.
    #[must_use]
    pub const fn builder(transport: T) -> TmdbBuilder<T> {
        TmdbBuilder {
            transport,
            language: None,
            include_image_language: None,
            include_video_language: None,
        }
    }

    /// Sends a request through the transport.
    pub(crate) async fn send(&self, request: ApiRequest) -> Result<Value> {
        self.transport.send(request).await
    }

    /// Checks v4 access: a read token, and write scope when `write` is set.
    pub(crate) fn require_v4(&self, write: bool) -> Result<()> {
        if !self.transport.has_v4_token() {
            return Err(TmdbError::AuthenticationRequired(String::from(
                "Requires V4 API Read Access Token",
            )));
        }
        if write && !self.transport.has_write_scope() {
            return Err(TmdbError::AuthenticationRequired(String::from(
                "Requires V4 API Write Access Token",
            )));
        }
        Ok(())
    }

    async fn load_tables(&mut self) -> Result<()> {
        let config = self.configuration(true).await?;
        let data = config.peek();
        for country in &data.countries {
            self.context.insert_country(country.clone());
        }
        for language in &data.languages {
            self.context.insert_language(language.clone());
        }
        for code in &data.primary_translations {
            self.context.insert_translation(code);
        }
        if let Some(base) = &data.secure_base_image_url {
            self.context.set_image_base_url(format!("{base}original"));
        }

        for genre in self.movie_genres().await? {
            self.context.insert_movie_genre(genre);
        }
        for genre in self.tv_genres().await? {
            self.context.insert_tv_genre(genre);
        }
        Ok(())
    }

    async fn entity<D: Reload>(&self, stub: Value, seed: Seed, load: bool) -> Result<Entity<D>> {
        let mut entity = Entity::new(stub, &self.context, seed, true)?;
        if load {
            entity.reload(self).await?;
        }
        Ok(entity)
    }

    /// Movie `id`; a partial stub unless `load`.
    ///
    /// # Errors
    ///
    /// Propagates load failures.
    pub async fn movie(&self, id: u64, load: bool) -> Result<Movie> {
        self.entity(json!({"id": id}), Seed::default(), load).await
    }

    /// TV show `id`.
    ///
    /// # Errors
    ///
    /// Propagates load failures.
    pub async fn tv_show(&self, id: u64, load: bool) -> Result<TvShow> {
        self.entity(json!({"id": id}), Seed::default(), load).await
    }

    /// Person `id`.
    ///
    /// # Errors
    ///
    /// Propagates load failures.
    pub async fn person(&self, id: u64, load: bool) -> Result<Person> {
        self.entity(json!({"id": id}), Seed::default(), load).await
    }

    /// Collection `id`.
    ///
    /// # Errors
    ///
    /// Propagates load failures.
    pub async fn collection(&self, id: u64, load: bool) -> Result<Collection> {
        self.entity(json!({"id": id}), Seed::default(), load).await
    }

    /// Company `id`.
    ///
    /// # Errors
    ///
    /// Propagates load failures.
    pub async fn company(&self, id: u64, load: bool) -> Result<Company> {
        self.entity(json!({"id": id}), Seed::default(), load).await
    }

    /// Network `id`.
    ///
    /// # Errors
    ///
    /// Propagates load failures.
    pub async fn network(&self, id: u64, load: bool) -> Result<Network> {
        self.entity(json!({"id": id}), Seed::default(), load).await
    }

    /// Keyword `id`.
    ///
    /// # Errors
    ///
    /// Propagates load failures.
    pub async fn keyword(&self, id: u64, load: bool) -> Result<Keyword> {
        self.entity(json!({"id": id}), Seed::default(), load).await
    }

    /// Review `id`.
    ///
    /// # Errors
    ///
    /// Propagates load failures.
    pub async fn review(&self, id: &str, load: bool) -> Result<Review> {
        self.entity(json!({"id": id}), Seed::default(), load).await
    }

    /// Credit `id`.
    ///
    /// # Errors
    ///
    /// Propagates load failures.
    pub async fn credit(&self, id: &str, load: bool) -> Result<Credit> {
        self.entity(json!({"id": id}), Seed::default(), load).await
    }

    /// Episode group `id`.
    ///
    /// # Errors
    ///
    /// Propagates load failures.
    pub async fn episode_group(&self, id: &str, load: bool) -> Result<EpisodeGroup> {
        self.entity(json!({"id": id}), Seed::default(), load).await
    }

    /// Season `season_number` of show `tv_id`.
    ///
    /// # Errors
    ///
    /// Propagates load failures.
    pub async fn tv_season(&self, tv_id: u64, season_number: u64, load: bool) -> Result<Season> {
        let seed = Seed::keyed(Some(Key::Int(tv_id)));
        self.entity(json!({"season_number": season_number}), seed, load)
            .await
    }

    /// Episode `episode_number` of season `season_number` of show `tv_id`.
    ///
    /// # Errors
    ///
    /// Propagates load failures.
    pub async fn tv_episode(
        &self,
        tv_id: u64,
        season_number: u64,
        episode_number: u64,
        load: bool,
    ) -> Result<Episode> {
        let seed = Seed::keyed(Some(Key::Int(tv_id)));
        let stub = json!({"season_number": season_number, "episode_number": episode_number});
        self.entity(stub, seed, load).await
    }

    /// The session's account.
    ///
    /// # Errors
    ///
    /// `AuthenticationRequired` without a session when `load` is set.
    pub async fn account(&self, load: bool) -> Result<Account> {
        self.entity(json!({}), Seed::default(), load).await
    }

    /// API configuration.
    ///
    /// # Errors
    ///
    /// Propagates load failures.
    pub async fn configuration(&self, load: bool) -> Result<Configuration> {
        self.entity::<ConfigurationData>(json!({}), Seed::default(), load)
            .await
    }

    /// List `id`, read through v4 when a v4 token is configured. Unless
    /// `load`, the list is partial and fetches its items on first page access.
    ///
    /// # Errors
    ///
    /// Propagates load failures; `PrivateResource` for private lists.
    pub async fn list(&self, id: &str, load: bool) -> Result<TmdbList> {
        let source = list_source(id, &self.context, None);
        if load {
            PagedResult::fetch(self, source).await
        } else {
            PagedResult::summary(&json!({"id": id}), &self.context, source)
        }
    }

    /// List `id` sorted by `sort_by` (v4 only).
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for an unknown sort key; `AuthenticationRequired`
    /// without a v4 token.
    pub async fn sorted_list(&self, id: &str, sort_by: &str) -> Result<TmdbList> {
        if !LIST_SORTS.contains(&sort_by) {
            return Err(TmdbError::invalid(format!("sort_by not in {LIST_SORTS:?}")));
        }
        self.require_v4(false)?;
        PagedResult::fetch(self, list_source(id, &self.context, Some(sort_by))).await
    }

    /// Movie genres in the request language.
    ///
    /// # Errors
    ///
    /// Propagates transport failures.
    pub async fn movie_genres(&self) -> Result<Vec<Genre>> {
        self.genres("genre/movie/list").await
    }

    /// TV genres in the request language.
    ///
    /// # Errors
    ///
    /// Propagates transport failures.
    pub async fn tv_genres(&self) -> Result<Vec<Genre>> {
        self.genres("genre/tv/list").await
    }

    async fn genres(&self, path: &str) -> Result<Vec<Genre>> {
        let request = ApiRequest::get(path).query("language", self.context.language());
        let payload = self.send(request).await?;
        self.extract(&payload, &["genres"], Kind::LoadGenre, &Options::list())
    }
}
