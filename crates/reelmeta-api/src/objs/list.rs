//! User lists.
//!
//! A list is a paged view of movies and shows with list metadata as its
//! envelope. When the facade holds a v4 token lists are read through the
//! v4 endpoint (paged, sortable); otherwise through the v3 endpoint, which
//! returns every item on a single page. Writes go through v4 when the
//! token carries write scope and fall back to the v3 session endpoints.
#![allow(clippy::future_not_send)]

use serde_json::{Map, Value, json};

use crate::coerce::{Kind, Options};
use crate::context::Context;
use crate::entity::{Fields, Seed};
use crate::error::{Result, TmdbError};
use crate::paged::{Envelope, PageShape, PageSource, PagedResult};
use crate::tmdb::Tmdb;
use crate::transport::{ApiRequest, ApiVersion, LocalTransport, Method};

use super::{Country, Language, Media, Movie, TvShow, User};

/// Sort keys accepted by v4 lists.
pub const LIST_SORTS: [&str; 8] = [
    "original_order.asc",
    "original_order.desc",
    "vote_average.asc",
    "vote_average.desc",
    "primary_release_date.asc",
    "primary_release_date.desc",
    "title.asc",
    "title.desc",
];

/// A user list: its items page by page, with [`ListDetails`] alongside.
pub type TmdbList = PagedResult<Media, ListDetails>;

/// List metadata. Fields only the v4 endpoint returns stay `None` for
/// lists read through v3, and the other way round.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListDetails {
    /// Average rating of the items (v4).
    pub average_rating: Option<f64>,
    /// Backdrop path (v4).
    pub backdrop_path: Option<String>,
    /// Full backdrop URL (v4).
    pub backdrop_url: Option<String>,
    /// Item comments keyed by `{media_type}:{id}` (v4).
    pub comments: Value,
    /// Country (v4).
    pub country: Option<Country>,
    /// Owner (v4).
    pub created_by: Option<User>,
    /// Owner's username (v3).
    pub created_by_name: Option<String>,
    /// Description.
    pub description: Option<String>,
    /// Users who marked the list as favorite (v3).
    pub favorite_count: Option<u64>,
    /// List id.
    pub id: Option<String>,
    /// ISO 3166-1 code (v4).
    pub iso_3166_1: Option<String>,
    /// ISO 639-1 code.
    pub iso_639_1: Option<String>,
    /// Language looked up from the code.
    pub language: Option<Language>,
    /// Name.
    pub name: Option<String>,
    /// Item object ids keyed by `{media_type}:{id}` (v4).
    pub object_ids: Value,
    /// Poster path.
    pub poster_path: Option<String>,
    /// Full poster URL.
    pub poster_url: Option<String>,
    /// Public visibility (v4).
    pub public: Option<bool>,
    /// Total revenue of the items (v4).
    pub revenue: Option<u64>,
    /// Total runtime of the items (v4).
    pub runtime: Option<u64>,
    /// Sort order (v4).
    pub sort_by: Option<String>,
}

impl Envelope for ListDetails {
    fn extract(payload: &Value, ctx: &Context, source: &PageSource) -> Result<Self> {
        let seed = Seed::default();
        let mut f = Fields::new(payload, ctx, &seed);
        let optional = || Options::single().default_none();
        let mut details = Self {
            description: f.one("description", Kind::Str)?,
            id: f.one("id", Kind::Str)?,
            iso_639_1: f.one("iso_639_1", Kind::Str)?,
            language: f.at("language", &["iso_639_1"], Kind::Language)?,
            name: f.one("name", Kind::Str)?,
            poster_path: f.one("poster_path", Kind::Str)?,
            poster_url: f.image_url("poster_url", &["poster_path"])?,
            ..Self::default()
        };

        if source.shape() == PageShape::LegacyList {
            details.created_by_name = f.one("created_by", Kind::Str)?;
            details.favorite_count = f.get("favorite_count", &["favorite_count"], Kind::Int, optional())?;
        } else {
            details.average_rating = f.get("average_rating", &["average_rating"], Kind::Float, optional())?;
            details.backdrop_path = f.one("backdrop_path", Kind::Str)?;
            details.backdrop_url = f.image_url("backdrop_url", &["backdrop_path"])?;
            details.comments = f.one("comments", Kind::Raw)?;
            details.country = f.at("country", &["iso_3166_1"], Kind::Country)?;
            details.created_by = f.one("created_by", Kind::User)?;
            details.iso_3166_1 = f.one("iso_3166_1", Kind::Str)?;
            details.object_ids = f.one("object_ids", Kind::Raw)?;
            details.public = f.one("public", Kind::Bool)?;
            details.revenue = f.get("revenue", &["revenue"], Kind::Int, optional())?;
            details.runtime = f.get("runtime", &["runtime"], Kind::Int, optional())?;
            details.sort_by = f.one("sort_by", Kind::Str)?;
        }
        Ok(details)
    }
}

/// Page source of list `id` for the context's API generation.
#[must_use]
pub fn list_source(id: &str, ctx: &Context, sort_by: Option<&str>) -> PageSource {
    let request = ApiRequest::get(format!("list/{id}")).query("language", ctx.language());
    if ctx.v4_lists() {
        PageSource::listing(request.v4().query_opt("sort_by", sort_by), Kind::MediaType)
    } else {
        PageSource::legacy_list(request)
    }
}

/// A movie or show to put on, look up in, or take off a list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListItem {
    /// Movie id.
    Movie(u64),
    /// Show id.
    Tv(u64),
}

impl ListItem {
    /// `movie` or `tv`.
    #[must_use]
    pub const fn media_type(self) -> &'static str {
        match self {
            Self::Movie(_) => "movie",
            Self::Tv(_) => "tv",
        }
    }

    /// Media id.
    #[must_use]
    pub const fn id(self) -> u64 {
        match self {
            Self::Movie(id) | Self::Tv(id) => id,
        }
    }

    fn to_json(self) -> Value {
        json!({"media_type": self.media_type(), "media_id": self.id()})
    }
}

impl TryFrom<&Movie> for ListItem {
    type Error = TmdbError;

    fn try_from(movie: &Movie) -> Result<Self> {
        movie
            .peek()
            .id
            .map(Self::Movie)
            .ok_or_else(|| TmdbError::invalid("movie has no id"))
    }
}

impl TryFrom<&TvShow> for ListItem {
    type Error = TmdbError;

    fn try_from(show: &TvShow) -> Result<Self> {
        show.peek()
            .id
            .map(Self::Tv)
            .ok_or_else(|| TmdbError::invalid("show has no id"))
    }
}

/// Metadata changes for [`TmdbList::update`]; `None` leaves a field as is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListUpdate {
    /// New name.
    pub name: Option<String>,
    /// New description.
    pub description: Option<String>,
    /// New visibility.
    pub public: Option<bool>,
    /// New sort order, one of [`LIST_SORTS`].
    pub sort_by: Option<String>,
}

impl PagedResult<Media, ListDetails> {
    fn list_id(&self) -> Result<&str> {
        self.extra()
            .id
            .as_deref()
            .ok_or_else(|| TmdbError::invalid("list has no id"))
    }

    /// Updates the list metadata through v4.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` when nothing is set or `sort_by` is unknown;
    /// `AuthenticationRequired` without a v4 token.
    pub async fn update<T: LocalTransport>(&self, tmdb: &Tmdb<T>, changes: &ListUpdate) -> Result<()> {
        if changes == &ListUpdate::default() {
            return Err(TmdbError::invalid(
                "Must have at least one parameter to update (name, description, public, or sort_by)",
            ));
        }
        if let Some(sort_by) = changes.sort_by.as_deref() {
            if !LIST_SORTS.contains(&sort_by) {
                return Err(TmdbError::invalid(format!("sort_by not in {LIST_SORTS:?}")));
            }
        }
        tmdb.require_v4(false)?;

        let mut body = Map::new();
        if let Some(name) = &changes.name {
            body.insert(String::from("name"), json!(name));
        }
        if let Some(description) = &changes.description {
            body.insert(String::from("description"), json!(description));
        }
        if let Some(public) = changes.public {
            body.insert(String::from("public"), json!(public));
        }
        if let Some(sort_by) = &changes.sort_by {
            body.insert(String::from("sort_by"), json!(sort_by));
        }
        let request = ApiRequest::new(ApiVersion::V4, Method::Put, format!("list/{}", self.list_id()?))
            .body(Value::Object(body));
        tmdb.send(request).await.map(drop)
    }

    /// Whether `item` is on the list.
    ///
    /// # Errors
    ///
    /// `AuthenticationRequired` for a show without a v4 token; otherwise
    /// propagates transport failures.
    pub async fn has_item<T: LocalTransport>(&self, tmdb: &Tmdb<T>, item: ListItem) -> Result<bool> {
        check_item(tmdb, item)?;
        let id = self.list_id()?;
        if tmdb.transport().has_write_scope() {
            let request = ApiRequest::get(format!("list/{id}/item_status"))
                .v4()
                .query("media_id", item.id())
                .query("media_type", item.media_type());
            return match tmdb.send(request).await {
                Ok(status) => Ok(v4_item_present(&status, item)),
                Err(TmdbError::NotFound(_)) => Ok(false),
                Err(err) => Err(err),
            };
        }

        let request = ApiRequest::get(format!("list/{id}/item_status")).query("movie_id", item.id());
        let status = tmdb.send(request).await?;
        Ok(status
            .get("item_present")
            .and_then(Value::as_bool)
            .unwrap_or_default())
    }

    /// Adds `items` to the list.
    ///
    /// # Errors
    ///
    /// `AuthenticationRequired` without a session, or for shows without a
    /// v4 token; otherwise propagates transport failures.
    pub async fn add_items<T: LocalTransport>(&self, tmdb: &Tmdb<T>, items: &[ListItem]) -> Result<()> {
        self.write_items(tmdb, items, Method::Post, "add_item").await
    }

    /// Removes `items` from the list.
    ///
    /// # Errors
    ///
    /// `AuthenticationRequired` without a session, or for shows without a
    /// v4 token; otherwise propagates transport failures.
    pub async fn remove_items<T: LocalTransport>(&self, tmdb: &Tmdb<T>, items: &[ListItem]) -> Result<()> {
        self.write_items(tmdb, items, Method::Delete, "remove_item").await
    }

    async fn write_items<T: LocalTransport>(
        &self,
        tmdb: &Tmdb<T>,
        items: &[ListItem],
        v4_method: Method,
        v3_action: &str,
    ) -> Result<()> {
        for item in items {
            check_item(tmdb, *item)?;
        }
        let id = self.list_id()?;
        if tmdb.transport().has_write_scope() {
            let body = json!({"items": items.iter().map(|item| item.to_json()).collect::<Vec<_>>()});
            let request = ApiRequest::new(ApiVersion::V4, v4_method, format!("list/{id}/items")).body(body);
            return tmdb.send(request).await.map(drop);
        }

        for item in items {
            let request = ApiRequest::post(format!("list/{id}/{v3_action}"))
                .body(json!({"media_id": item.id()}))
                .with_session();
            tmdb.send(request).await?;
        }
        Ok(())
    }

    /// Sets the comment of each item.
    ///
    /// # Errors
    ///
    /// `AuthenticationRequired` without v4 write scope.
    pub async fn update_items<T: LocalTransport>(
        &self,
        tmdb: &Tmdb<T>,
        items: &[(ListItem, String)],
    ) -> Result<()> {
        tmdb.require_v4(true)?;
        let body = json!({
            "items": items
                .iter()
                .map(|(item, comment)| {
                    json!({"media_type": item.media_type(), "media_id": item.id(), "comment": comment})
                })
                .collect::<Vec<_>>()
        });
        let request = ApiRequest::new(ApiVersion::V4, Method::Put, format!("list/{}/items", self.list_id()?))
            .body(body);
        tmdb.send(request).await.map(drop)
    }

    /// Removes every item.
    ///
    /// # Errors
    ///
    /// `AuthenticationRequired` without a session or v4 write scope.
    pub async fn clear<T: LocalTransport>(&self, tmdb: &Tmdb<T>) -> Result<()> {
        let id = self.list_id()?;
        let request = if tmdb.transport().has_write_scope() {
            ApiRequest::get(format!("list/{id}/clear")).v4()
        } else {
            ApiRequest::post(format!("list/{id}/clear"))
                .query("confirm", true)
                .with_session()
        };
        tmdb.send(request).await.map(drop)
    }

    /// Deletes the list.
    ///
    /// # Errors
    ///
    /// `AuthenticationRequired` without a session or v4 write scope.
    pub async fn delete<T: LocalTransport>(&self, tmdb: &Tmdb<T>) -> Result<()> {
        let id = self.list_id()?;
        let request = if tmdb.transport().has_write_scope() {
            ApiRequest::delete(format!("list/{id}")).v4()
        } else {
            ApiRequest::delete(format!("list/{id}")).with_session()
        };
        tmdb.send(request).await.map(drop)
    }
}

/// Reads a v4 `item_status` body: `success` must be set and the echoed
/// media must match `item`.
fn v4_item_present(status: &Value, item: ListItem) -> bool {
    let success = status.get("success").and_then(Value::as_bool).unwrap_or_default();
    let same_id = status
        .get("media_id")
        .and_then(Value::as_u64)
        .is_none_or(|id| id == item.id());
    let same_type = status
        .get("media_type")
        .and_then(Value::as_str)
        .is_none_or(|media_type| media_type == item.media_type());
    success && same_id && same_type
}

/// Shows can only be handled through v4.
fn check_item<T: LocalTransport>(tmdb: &Tmdb<T>, item: ListItem) -> Result<()> {
    if matches!(item, ListItem::Tv(_)) {
        tmdb.require_v4(false)?;
    }
    Ok(())
}
