//! Page cursor over TMDB listing endpoints.
//!
//! A [`PagedResult`] wraps any endpoint answering with the
//! `{page, total_pages, total_results, results}` envelope, or the legacy v3
//! list shape (`items`/`item_count`, one page). Fetched pages are cached, so
//! revisiting a page costs no request. Iteration only covers the current
//! page; callers page forward explicitly.
#![allow(clippy::future_not_send)]

use std::collections::BTreeMap;
use std::fmt::Debug;

use chrono::NaiveDate;
use serde_json::Value;

use crate::coerce::{FromCoerced, Kind, Options, coerce};
use crate::context::Context;
use crate::error::{Result, TmdbError};
use crate::tmdb::Tmdb;
use crate::transport::{ApiRequest, LocalTransport};

/// Payload layout of a paged endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageShape {
    /// `{page, total_pages, total_results, results}`.
    Standard,
    /// v3 list details: `{items, item_count}`, always a single page.
    LegacyList,
}

/// Where pages come from and how their elements are built.
#[derive(Debug, Clone, PartialEq)]
pub struct PageSource {
    request: ApiRequest,
    element: Kind,
    shape: PageShape,
    search: bool,
}

impl PageSource {
    /// Regular listing.
    #[must_use]
    pub const fn listing(request: ApiRequest, element: Kind) -> Self {
        Self {
            request,
            element,
            shape: PageShape::Standard,
            search: false,
        }
    }

    /// Search listing; zero total results is `NotFound`.
    #[must_use]
    pub const fn search(request: ApiRequest, element: Kind) -> Self {
        Self {
            request,
            element,
            shape: PageShape::Standard,
            search: true,
        }
    }

    /// Legacy v3 list details.
    #[must_use]
    pub const fn legacy_list(request: ApiRequest) -> Self {
        Self {
            request,
            element: Kind::MediaType,
            shape: PageShape::LegacyList,
            search: false,
        }
    }

    /// Request template; the `page` parameter is set per fetch.
    #[must_use]
    pub const fn request(&self) -> &ApiRequest {
        &self.request
    }

    /// Payload layout.
    #[must_use]
    pub const fn shape(&self) -> PageShape {
        self.shape
    }

    /// Whether this is a search listing.
    #[must_use]
    pub const fn is_search(&self) -> bool {
        self.search
    }

    fn page_request(&self, page: u32) -> ApiRequest {
        let mut request = self.request.clone();
        if self.shape == PageShape::Standard {
            request.set_query("page", page);
        }
        request
    }
}

/// Extra fields a listing carries next to the page envelope.
pub trait Envelope: Sized + Clone + Debug {
    /// Pulls the extra fields out of a page payload.
    ///
    /// # Errors
    ///
    /// Propagates coercion failures.
    fn extract(payload: &Value, ctx: &Context, source: &PageSource) -> Result<Self>;
}

impl Envelope for () {
    fn extract(_: &Value, _: &Context, _: &PageSource) -> Result<Self> {
        Ok(())
    }
}

/// `dates.minimum`/`dates.maximum` of now-playing and upcoming movies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateWindow {
    /// Earliest release date covered.
    pub minimum: Option<NaiveDate>,
    /// Latest release date covered.
    pub maximum: Option<NaiveDate>,
}

impl Envelope for DateWindow {
    fn extract(payload: &Value, ctx: &Context, _: &PageSource) -> Result<Self> {
        let date = |key: &str| -> Result<Option<NaiveDate>> {
            Option::from_coerced(coerce(
                Some(payload),
                &["dates", key],
                Kind::Date,
                &Options::single(),
                ctx,
            )?)
        };
        Ok(Self {
            minimum: date("minimum")?,
            maximum: date("maximum")?,
        })
    }
}

/// One parsed page.
struct Page<T, X> {
    page: u32,
    total_pages: u32,
    total_results: u64,
    results: Vec<T>,
    extra: X,
}

/// Cursor over a paged endpoint.
#[derive(Debug, Clone)]
pub struct PagedResult<T, X = ()> {
    source: PageSource,
    page: u32,
    total_pages: u32,
    total_results: u64,
    cache: BTreeMap<u32, Vec<T>>,
    extra: X,
    partial: bool,
}

impl<T: FromCoerced, X: Envelope> PagedResult<T, X> {
    /// Fetches page 1 of `source`.
    ///
    /// # Errors
    ///
    /// Propagates transport and coercion failures. A search source whose
    /// first page reports zero results is `NotFound`.
    pub async fn fetch<Tr: LocalTransport>(tmdb: &Tmdb<Tr>, source: PageSource) -> Result<Self> {
        let payload = tmdb.send(source.page_request(1)).await?;
        let result = Self::from_payload(&payload, tmdb.context(), source)?;
        if result.source.search && result.total_results == 0 {
            return Err(TmdbError::NotFound(String::from("No results found")));
        }
        Ok(result)
    }

    /// Builds the cursor from a complete page payload obtained elsewhere,
    /// treating it as page 1.
    ///
    /// # Errors
    ///
    /// Propagates coercion failures.
    pub fn from_payload(payload: &Value, ctx: &Context, source: PageSource) -> Result<Self> {
        let parsed = parse_page::<T, X>(payload, ctx, &source)?;
        let mut cache = BTreeMap::new();
        cache.insert(parsed.page, parsed.results);
        Ok(Self {
            source,
            page: parsed.page,
            total_pages: parsed.total_pages,
            total_results: parsed.total_results,
            cache,
            extra: parsed.extra,
            partial: false,
        })
    }

    /// Builds a partial cursor from a summary without any elements, such as
    /// `{id, name, item_count}`. Only the envelope is read; the first page
    /// access fetches page 1 and replaces the totals.
    ///
    /// # Errors
    ///
    /// Propagates coercion failures.
    pub fn summary(payload: &Value, ctx: &Context, source: PageSource) -> Result<Self> {
        let extra = X::extract(payload, ctx, &source)?;
        let total_results = ["total_results", "item_count"]
            .iter()
            .find_map(|key| payload.get(key).and_then(Value::as_u64))
            .unwrap_or(0);
        Ok(Self {
            source,
            page: 1,
            total_pages: 1,
            total_results,
            cache: BTreeMap::new(),
            extra,
            partial: true,
        })
    }

    /// Fetches page 1 if the cursor was built from a summary; no-op otherwise.
    ///
    /// # Errors
    ///
    /// Propagates transport and coercion failures.
    pub async fn load<Tr: LocalTransport>(&mut self, tmdb: &Tmdb<Tr>) -> Result<()> {
        if self.partial {
            tracing::debug!(path = %self.source.request.path, "loading partial listing");
            self.reload(tmdb).await?;
        }
        Ok(())
    }

    /// Moves to `page`, fetching it unless cached.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` when `page` is outside `1..=total_pages`;
    /// otherwise propagates transport and coercion failures.
    pub async fn load_page<Tr: LocalTransport>(&mut self, tmdb: &Tmdb<Tr>, page: u32) -> Result<()> {
        self.load(tmdb).await?;
        if page < 1 || page > self.total_pages {
            return Err(TmdbError::invalid(format!(
                "Page must be an integer 1-{}",
                self.total_pages
            )));
        }
        if self.cache.contains_key(&page) {
            self.page = page;
            return Ok(());
        }

        tracing::debug!(path = %self.source.request.path, page, "loading page");
        let payload = tmdb.send(self.source.page_request(page)).await?;
        let parsed = parse_page::<T, X>(&payload, tmdb.context(), &self.source)?;
        self.absorb(parsed);
        Ok(())
    }

    /// Moves to the next page.
    ///
    /// # Errors
    ///
    /// `NotFound` when already on the last page.
    pub async fn load_next<Tr: LocalTransport>(&mut self, tmdb: &Tmdb<Tr>) -> Result<()> {
        self.load(tmdb).await?;
        let next = self.page.saturating_add(1);
        if next > self.total_pages {
            return Err(TmdbError::NotFound(String::from("No Next Page")));
        }
        self.load_page(tmdb, next).await
    }

    /// Collects the first `amount` results across pages, walking from
    /// page 1. May issue one request per uncached page.
    ///
    /// `amount` is clamped to `total_results`; an empty listing yields an
    /// empty vector.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` when `amount` is zero; otherwise propagates page
    /// load failures.
    pub async fn get_results<Tr: LocalTransport>(
        &mut self,
        tmdb: &Tmdb<Tr>,
        amount: usize,
    ) -> Result<Vec<&T>> {
        if amount < 1 {
            return Err(TmdbError::invalid("amount must be greater then 0"));
        }
        self.load(tmdb).await?;
        let total = usize::try_from(self.total_results).unwrap_or(usize::MAX);
        let amount = amount.min(total);
        if amount == 0 {
            return Ok(Vec::new());
        }

        let mut collected = 0_usize;
        let mut current = 0_u32;
        while collected < amount && current < self.total_pages {
            current = current.saturating_add(1);
            self.load_page(tmdb, current).await?;
            collected = collected.saturating_add(self.results().len());
        }

        Ok(self
            .cache
            .range(..=current)
            .flat_map(|(_, results)| results.iter())
            .take(amount)
            .collect())
    }

    /// Drops the cache and fetches page 1 again.
    ///
    /// # Errors
    ///
    /// Propagates transport and coercion failures.
    pub async fn reload<Tr: LocalTransport>(&mut self, tmdb: &Tmdb<Tr>) -> Result<()> {
        let payload = tmdb.send(self.source.page_request(1)).await?;
        let parsed = parse_page::<T, X>(&payload, tmdb.context(), &self.source)?;
        self.cache.clear();
        self.absorb(parsed);
        self.partial = false;
        Ok(())
    }

    fn absorb(&mut self, parsed: Page<T, X>) {
        self.page = parsed.page;
        self.total_pages = parsed.total_pages;
        self.total_results = parsed.total_results;
        self.extra = parsed.extra;
        self.cache.insert(parsed.page, parsed.results);
    }
}

impl<T, X> PagedResult<T, X> {
    /// Current page number (1-based).
    #[must_use]
    pub const fn page(&self) -> u32 {
        self.page
    }

    /// Total pages reported by the last fetch.
    #[must_use]
    pub const fn total_pages(&self) -> u32 {
        self.total_pages
    }

    /// Total results reported by the last fetch.
    #[must_use]
    pub const fn total_results(&self) -> u64 {
        self.total_results
    }

    /// Elements of the current page; empty until a partial cursor is loaded.
    #[must_use]
    pub fn results(&self) -> &[T] {
        self.cache.get(&self.page).map_or(&[], Vec::as_slice)
    }

    /// Iterates the current page only.
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.results().iter()
    }

    /// Listing-specific envelope fields.
    #[must_use]
    pub const fn extra(&self) -> &X {
        &self.extra
    }

    /// Page source.
    #[must_use]
    pub const fn source(&self) -> &PageSource {
        &self.source
    }

    /// Whether built from a summary and not loaded yet.
    #[must_use]
    pub const fn is_partial(&self) -> bool {
        self.partial
    }

    /// Whether `page` is already cached.
    #[must_use]
    pub fn is_cached(&self, page: u32) -> bool {
        self.cache.contains_key(&page)
    }
}

impl<'a, T, X> IntoIterator for &'a PagedResult<T, X> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

fn parse_page<T: FromCoerced, X: Envelope>(
    payload: &Value,
    ctx: &Context,
    source: &PageSource,
) -> Result<Page<T, X>> {
    let int = |key: &str| -> Result<i64> {
        i64::from_coerced(coerce(Some(payload), &[key], Kind::Int, &Options::single(), ctx)?)
    };
    let (page, total_pages, total_results, results_key) = match source.shape {
        PageShape::Standard => (
            u32::try_from(int("page")?.max(1)).unwrap_or(1),
            u32::try_from(int("total_pages")?.max(0)).unwrap_or(u32::MAX),
            u64::try_from(int("total_results")?.max(0)).unwrap_or(0),
            "results",
        ),
        PageShape::LegacyList => (
            1,
            1,
            u64::try_from(int("item_count")?.max(0)).unwrap_or(0),
            "items",
        ),
    };
    let results = Vec::from_coerced(coerce(
        Some(payload),
        &[results_key],
        source.element,
        &Options::list(),
        ctx,
    )?)?;
    Ok(Page {
        page,
        total_pages,
        total_results,
        results,
        extra: X::extract(payload, ctx, source)?,
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::indexing_slicing)]

    use serde_json::json;

    use super::*;
    use crate::objs::Movie;
    use crate::testing::{MockTransport, page_of_movies};

    /// Transport serving `movie/popular` with 47 results over 3 pages.
    fn popular() -> MockTransport {
        MockTransport::new()
            .route_page("movie/popular", 1, page_of_movies(1, 3, 47, 20))
            .route_page("movie/popular", 2, page_of_movies(2, 3, 47, 20))
            .route_page("movie/popular", 3, page_of_movies(3, 3, 47, 7))
    }

    fn five_pages() -> MockTransport {
        (1..=5).fold(MockTransport::new(), |transport, page| {
            transport.route_page("movie/top_rated", page, page_of_movies(page, 5, 100, 20))
        })
    }

    fn source(path: &str) -> PageSource {
        PageSource::listing(ApiRequest::get(path).query("language", "en"), Kind::Movie)
    }

    #[tokio::test]
    async fn test_load_page_range() {
        // Arrange
        let tmdb = Tmdb::from_parts(five_pages(), Context::default());
        let mut paged: PagedResult<Movie> =
            PagedResult::fetch(&tmdb, source("movie/top_rated")).await.unwrap();

        // Act & Assert
        assert!(matches!(
            paged.load_page(&tmdb, 0).await,
            Err(TmdbError::InvalidArgument(_))
        ));
        assert!(matches!(
            paged.load_page(&tmdb, 6).await,
            Err(TmdbError::InvalidArgument(_))
        ));
        for page in 1..=5 {
            paged.load_page(&tmdb, page).await.unwrap();
            assert_eq!(paged.page(), page);
        }
        assert!(matches!(
            paged.load_next(&tmdb).await,
            Err(TmdbError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_revisited_page_is_served_from_cache() {
        // Arrange
        let tmdb = Tmdb::from_parts(five_pages(), Context::default());
        let mut paged: PagedResult<Movie> =
            PagedResult::fetch(&tmdb, source("movie/top_rated")).await.unwrap();

        // Act
        paged.load_page(&tmdb, 3).await.unwrap();
        paged.load_page(&tmdb, 1).await.unwrap();
        paged.load_page(&tmdb, 3).await.unwrap();

        // Assert
        assert_eq!(tmdb.transport().count_page("movie/top_rated", 3), 1);
        assert_eq!(tmdb.transport().count_page("movie/top_rated", 1), 1);
        assert_eq!(paged.page(), 3);
        assert!(paged.is_cached(3));
    }

    #[tokio::test]
    async fn test_get_results_clamps_and_accumulates() {
        // Arrange
        let tmdb = Tmdb::from_parts(popular(), Context::default());
        let mut paged: PagedResult<Movie> =
            PagedResult::fetch(&tmdb, source("movie/popular")).await.unwrap();

        // Act
        let all = paged.get_results(&tmdb, 50).await.unwrap().len();
        let ten: Vec<Option<u64>> = paged
            .get_results(&tmdb, 10)
            .await
            .unwrap()
            .into_iter()
            .map(|movie| movie.peek().id)
            .collect();
        let zero = paged.get_results(&tmdb, 0).await;

        // Assert
        assert_eq!(all, 47);
        assert_eq!(ten.len(), 10);
        assert_eq!(ten[0], Some(1));
        assert_eq!(ten[9], Some(10));
        assert!(matches!(zero, Err(TmdbError::InvalidArgument(_))));
        for page in 1..=3 {
            assert_eq!(tmdb.transport().count_page("movie/popular", page), 1);
        }
    }

    #[tokio::test]
    async fn test_get_results_small_amount_visits_first_page_only() {
        let tmdb = Tmdb::from_parts(popular(), Context::default());
        let mut paged: PagedResult<Movie> =
            PagedResult::fetch(&tmdb, source("movie/popular")).await.unwrap();

        let results = paged.get_results(&tmdb, 10).await.unwrap().len();

        assert_eq!(results, 10);
        assert_eq!(tmdb.transport().total(), 1);
    }

    #[tokio::test]
    async fn test_iteration_covers_current_page_only() {
        let tmdb = Tmdb::from_parts(popular(), Context::default());
        let mut paged: PagedResult<Movie> =
            PagedResult::fetch(&tmdb, source("movie/popular")).await.unwrap();

        assert_eq!(paged.iter().count(), 20);
        paged.load_page(&tmdb, 3).await.unwrap();
        assert_eq!((&paged).into_iter().count(), 7);
        assert_eq!(paged.results()[0].peek().id, Some(41));
    }

    #[tokio::test]
    async fn test_search_without_results_is_not_found() {
        // Arrange
        let transport = MockTransport::new().route(
            "search/movie",
            json!({"page": 1, "total_pages": 0, "total_results": 0, "results": []}),
        );
        let tmdb = Tmdb::from_parts(transport, Context::default());
        let search = PageSource::search(
            ApiRequest::get("search/movie").query("query", "zzzz"),
            Kind::Movie,
        );

        // Act
        let result = PagedResult::<Movie>::fetch(&tmdb, search).await;

        // Assert
        assert!(matches!(result, Err(TmdbError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_empty_listing_is_not_an_error() {
        let transport = MockTransport::new().route(
            "movie/upcoming",
            json!({"page": 1, "total_pages": 0, "total_results": 0, "results": [],
                   "dates": {"minimum": "2024-01-01", "maximum": "2024-01-31"}}),
        );
        let tmdb = Tmdb::from_parts(transport, Context::default());

        let paged: PagedResult<Movie, DateWindow> =
            PagedResult::fetch(&tmdb, source("movie/upcoming")).await.unwrap();

        assert!(paged.results().is_empty());
        assert_eq!(
            paged.extra().minimum,
            NaiveDate::from_ymd_opt(2024, 1, 1)
        );
        assert_eq!(
            paged.extra().maximum,
            NaiveDate::from_ymd_opt(2024, 1, 31)
        );
    }

    #[tokio::test]
    async fn test_get_results_on_empty_listing() {
        // Arrange
        let transport = MockTransport::new().route(
            "movie/upcoming",
            json!({"page": 1, "total_pages": 0, "total_results": 0, "results": []}),
        );
        let tmdb = Tmdb::from_parts(transport, Context::default());
        let mut paged: PagedResult<Movie> =
            PagedResult::fetch(&tmdb, source("movie/upcoming")).await.unwrap();

        // Act
        let results = paged.get_results(&tmdb, 5).await.unwrap().len();

        // Assert
        assert_eq!(results, 0);
        assert_eq!(tmdb.transport().total(), 1);
    }

    #[tokio::test]
    async fn test_summary_fetches_on_first_access() {
        // Arrange
        let tmdb = Tmdb::from_parts(popular(), Context::default());
        let mut paged: PagedResult<Movie> = PagedResult::summary(
            &json!({"id": 1, "total_results": 47}),
            tmdb.context(),
            source("movie/popular"),
        )
        .unwrap();
        assert!(paged.is_partial());
        assert!(paged.results().is_empty());
        assert_eq!(tmdb.transport().total(), 0);

        // Act
        let results = paged.get_results(&tmdb, 25).await.unwrap().len();
        paged.load_page(&tmdb, 1).await.unwrap();

        // Assert
        assert_eq!(results, 25);
        assert!(!paged.is_partial());
        assert_eq!(paged.total_pages(), 3);
        assert_eq!(tmdb.transport().count_page("movie/popular", 1), 1);
        assert_eq!(tmdb.transport().count_page("movie/popular", 2), 1);
        assert_eq!(tmdb.transport().total(), 2);
    }

    #[tokio::test]
    async fn test_summary_load_next_starts_after_first_page() {
        let tmdb = Tmdb::from_parts(popular(), Context::default());
        let mut paged: PagedResult<Movie> =
            PagedResult::summary(&json!({}), tmdb.context(), source("movie/popular")).unwrap();

        paged.load_next(&tmdb).await.unwrap();

        assert_eq!(paged.page(), 2);
        assert_eq!(paged.results()[0].peek().id, Some(21));
        assert_eq!(tmdb.transport().total(), 2);
    }

    #[tokio::test]
    async fn test_page_totals_last_write_wins() {
        let transport = MockTransport::new()
            .route_page("trending/movie/day", 1, page_of_movies(1, 2, 40, 20))
            .route_page("trending/movie/day", 2, page_of_movies(2, 3, 45, 20));
        let tmdb = Tmdb::from_parts(transport, Context::default());
        let mut paged: PagedResult<Movie> =
            PagedResult::fetch(&tmdb, source("trending/movie/day")).await.unwrap();

        paged.load_next(&tmdb).await.unwrap();

        assert_eq!(paged.total_pages(), 3);
        assert_eq!(paged.total_results(), 45);
    }

    #[tokio::test]
    async fn test_fetch_failure_propagates() {
        let tmdb = Tmdb::from_parts(MockTransport::new(), Context::default());
        let result = PagedResult::<Movie>::fetch(&tmdb, source("movie/missing")).await;
        assert!(matches!(result, Err(TmdbError::NotFound(_))));
    }

    #[test]
    fn test_legacy_list_shape_is_single_page() {
        // Arrange
        let payload = json!({
            "id": "1",
            "item_count": 2,
            "items": [
                {"media_type": "movie", "id": 550, "title": "Fight Club"},
                {"media_type": "tv", "id": 1399, "name": "Game of Thrones"}
            ]
        });
        let source = PageSource::legacy_list(ApiRequest::get("list/1"));

        // Act
        let paged: PagedResult<crate::objs::Media> =
            PagedResult::from_payload(&payload, &Context::default(), source).unwrap();

        // Assert
        assert_eq!(paged.page(), 1);
        assert_eq!(paged.total_pages(), 1);
        assert_eq!(paged.total_results(), 2);
        assert_eq!(paged.results().len(), 2);
        assert!(!paged.is_partial());
        assert!(paged.source().request().query_value("page").is_none());
    }
}
