//! Listings, searches, discover and trending.
#![allow(clippy::future_not_send)]

use crate::coerce::{FromCoerced, Kind};
use crate::entity::{Entity, Reload, Seed};
use crate::error::Result;
use crate::objs::{Collection, Company, Keyword, Media, Movie, Person, TvShow};
use crate::paged::{DateWindow, Envelope, PageSource, PagedResult};
use crate::transport::{ApiRequest, LocalTransport};

use super::{DiscoverParams, SearchOptions, Tmdb, TimeWindow, TrendingMedia};

impl<T: LocalTransport> Tmdb<T> {
    pub(super) fn localized(&self, path: &str) -> ApiRequest {
        ApiRequest::get(path).query("language", self.context.language())
    }

    pub(super) fn region(&self, region: Option<&str>) -> Result<Option<String>> {
        region.map(|code| self.context.validate_country(code)).transpose()
    }

    async fn listing<V: FromCoerced, X: Envelope>(
        &self,
        request: ApiRequest,
        element: Kind,
    ) -> Result<PagedResult<V, X>> {
        PagedResult::fetch(self, PageSource::listing(request, element)).await
    }

    async fn search<V: FromCoerced>(&self, request: ApiRequest, element: Kind) -> Result<PagedResult<V>> {
        PagedResult::fetch(self, PageSource::search(request, element)).await
    }

    async fn latest<D: Reload>(&self, path: &str) -> Result<Entity<D>> {
        let payload = self.send(self.localized(path)).await?;
        Entity::new(payload, &self.context, Seed::default(), false)
    }

    /// Most recently added movie.
    ///
    /// # Errors
    ///
    /// Propagates transport failures.
    pub async fn latest_movie(&self) -> Result<Movie> {
        self.latest("movie/latest").await
    }

    /// Most recently added show.
    ///
    /// # Errors
    ///
    /// Propagates transport failures.
    pub async fn latest_tv(&self) -> Result<TvShow> {
        self.latest("tv/latest").await
    }

    /// Most recently added person.
    ///
    /// # Errors
    ///
    /// Propagates transport failures.
    pub async fn latest_person(&self) -> Result<Person> {
        self.latest("person/latest").await
    }

    /// Movies in theatres, with the covered release window.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for an unknown region.
    pub async fn now_playing_movies(&self, region: Option<&str>) -> Result<PagedResult<Movie, DateWindow>> {
        let request = self
            .localized("movie/now_playing")
            .query_opt("region", self.region(region)?);
        self.listing(request, Kind::Movie).await
    }

    /// Popular movies.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for an unknown region.
    pub async fn popular_movies(&self, region: Option<&str>) -> Result<PagedResult<Movie>> {
        let request = self
            .localized("movie/popular")
            .query_opt("region", self.region(region)?);
        self.listing(request, Kind::Movie).await
    }

    /// Top rated movies.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for an unknown region.
    pub async fn top_rated_movies(&self, region: Option<&str>) -> Result<PagedResult<Movie>> {
        let request = self
            .localized("movie/top_rated")
            .query_opt("region", self.region(region)?);
        self.listing(request, Kind::Movie).await
    }

    /// Upcoming movies, with the covered release window.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for an unknown region.
    pub async fn upcoming_movies(&self, region: Option<&str>) -> Result<PagedResult<Movie, DateWindow>> {
        let request = self
            .localized("movie/upcoming")
            .query_opt("region", self.region(region)?);
        self.listing(request, Kind::Movie).await
    }

    /// Popular people.
    ///
    /// # Errors
    ///
    /// Propagates transport failures.
    pub async fn popular_people(&self) -> Result<PagedResult<Person>> {
        self.listing(self.localized("person/popular"), Kind::Person).await
    }

    /// Shows airing today.
    ///
    /// # Errors
    ///
    /// Propagates transport failures.
    pub async fn tv_airing_today(&self) -> Result<PagedResult<TvShow>> {
        self.listing(self.localized("tv/airing_today"), Kind::TvShow).await
    }

    /// Shows airing in the next seven days.
    ///
    /// # Errors
    ///
    /// Propagates transport failures.
    pub async fn tv_on_the_air(&self) -> Result<PagedResult<TvShow>> {
        self.listing(self.localized("tv/on_the_air"), Kind::TvShow).await
    }

    /// Popular shows.
    ///
    /// # Errors
    ///
    /// Propagates transport failures.
    pub async fn popular_tv(&self) -> Result<PagedResult<TvShow>> {
        self.listing(self.localized("tv/popular"), Kind::TvShow).await
    }

    /// Top rated shows.
    ///
    /// # Errors
    ///
    /// Propagates transport failures.
    pub async fn top_rated_tv(&self) -> Result<PagedResult<TvShow>> {
        self.listing(self.localized("tv/top_rated"), Kind::TvShow).await
    }

    /// Trending titles and people.
    ///
    /// # Errors
    ///
    /// Propagates transport failures.
    pub async fn trending(&self, media: TrendingMedia, window: TimeWindow) -> Result<PagedResult<Media>> {
        let path = format!("trending/{}/{}", media.as_str(), window.as_str());
        self.listing(self.localized(&path), Kind::MediaType).await
    }

    /// Movies matching `params`.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` naming the first invalid parameter.
    pub async fn discover_movies(&self, params: DiscoverParams) -> Result<PagedResult<Movie>> {
        let request = self.discover_request("discover/movie", &params, true)?;
        self.listing(request, Kind::Movie).await
    }

    /// Shows matching `params`.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` naming the first invalid parameter.
    pub async fn discover_tv_shows(&self, params: DiscoverParams) -> Result<PagedResult<TvShow>> {
        let request = self.discover_request("discover/tv", &params, false)?;
        self.listing(request, Kind::TvShow).await
    }

    fn discover_request(&self, path: &str, params: &DiscoverParams, movie: bool) -> Result<ApiRequest> {
        let validated = params.validate(movie, &self.context)?;
        Ok(validated
            .into_iter()
            .fold(self.localized(path), |request, (key, value)| {
                request.query(&key, value)
            }))
    }

    /// Companies named like `query`.
    ///
    /// # Errors
    ///
    /// `NotFound` when nothing matches.
    pub async fn company_search(&self, query: &str) -> Result<PagedResult<Company>> {
        let request = ApiRequest::get("search/company").query("query", query);
        self.search(request, Kind::Company).await
    }

    /// Collections named like `query`.
    ///
    /// # Errors
    ///
    /// `NotFound` when nothing matches.
    pub async fn collection_search(&self, query: &str) -> Result<PagedResult<Collection>> {
        let request = self.localized("search/collection").query("query", query);
        self.search(request, Kind::Collection).await
    }

    /// Keywords named like `query`.
    ///
    /// # Errors
    ///
    /// `NotFound` when nothing matches.
    pub async fn keyword_search(&self, query: &str) -> Result<PagedResult<Keyword>> {
        let request = ApiRequest::get("search/keyword").query("query", query);
        self.search(request, Kind::Keyword).await
    }

    /// Movies titled like `query`.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for an unknown region; `NotFound` when nothing
    /// matches.
    pub async fn movie_search(&self, query: &str, options: &SearchOptions) -> Result<PagedResult<Movie>> {
        let request = self
            .localized("search/movie")
            .query("query", query)
            .query_opt("include_adult", options.include_adult)
            .query_opt("region", self.region(options.region.as_deref())?)
            .query_opt("year", options.year)
            .query_opt("primary_release_year", options.primary_release_year);
        self.search(request, Kind::Movie).await
    }

    /// Movies, shows and people matching `query`.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for an unknown region; `NotFound` when nothing
    /// matches.
    pub async fn multi_search(&self, query: &str, options: &SearchOptions) -> Result<PagedResult<Media>> {
        let request = self
            .localized("search/multi")
            .query("query", query)
            .query_opt("include_adult", options.include_adult)
            .query_opt("region", self.region(options.region.as_deref())?);
        self.search(request, Kind::MediaType).await
    }

    /// People named like `query`.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for an unknown region; `NotFound` when nothing
    /// matches.
    pub async fn people_search(&self, query: &str, options: &SearchOptions) -> Result<PagedResult<Person>> {
        let request = self
            .localized("search/person")
            .query("query", query)
            .query_opt("include_adult", options.include_adult)
            .query_opt("region", self.region(options.region.as_deref())?);
        self.search(request, Kind::Person).await
    }

    /// Shows named like `query`.
    ///
    /// # Errors
    ///
    /// `NotFound` when nothing matches.
    pub async fn tv_search(&self, query: &str, options: &SearchOptions) -> Result<PagedResult<TvShow>> {
        let request = self
            .localized("search/tv")
            .query("query", query)
            .query_opt("include_adult", options.include_adult)
            .query_opt("first_air_date_year", options.first_air_date_year);
        self.search(request, Kind::TvShow).await
    }
}
