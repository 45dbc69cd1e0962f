//! Account views and session writes.
//!
//! Account listings go through v4 when the transport holds a write-scoped
//! token, otherwise through the v3 session endpoints. Writes on single
//! titles (ratings, favorites, watchlist) always use the v3 session.
#![allow(clippy::future_not_send)]

use serde_json::{Value, json};

use crate::coerce::{FromCoerced, Kind};
use crate::error::{Result, TmdbError};
use crate::objs::{Episode, Movie, TmdbList, TvShow, validate_rating};
use crate::paged::{PageSource, PagedResult};
use crate::transport::{ApiRequest, LocalTransport};

use super::Tmdb;

/// Sort keys of the v3 account listings.
pub const V3_SORTS: [&str; 2] = ["created_at.asc", "created_at.desc"];

/// Sort keys of the v4 movie listings.
pub const V4_MOVIE_SORTS: [&str; 8] = [
    "created_at.asc",
    "created_at.desc",
    "release_date.asc",
    "release_date.desc",
    "title.asc",
    "title.desc",
    "vote_average.asc",
    "vote_average.desc",
];

/// Sort keys of the v4 show listings.
pub const V4_SHOW_SORTS: [&str; 8] = [
    "created_at.asc",
    "created_at.desc",
    "first_air_date.asc",
    "first_air_date.desc",
    "name.asc",
    "name.desc",
    "vote_average.asc",
    "vote_average.desc",
];

/// Per-account flag on a movie or show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccountFlag {
    /// Favorites.
    Favorite,
    /// Watchlist.
    Watchlist,
}

impl AccountFlag {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Favorite => "favorite",
            Self::Watchlist => "watchlist",
        }
    }
}

/// A list to create with [`Tmdb::create_list`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewList {
    /// Name.
    pub name: String,
    /// ISO 639-1 language of the list.
    pub iso_639_1: String,
    /// Description.
    pub description: String,
    /// Public visibility (v4 only).
    pub public: bool,
    /// ISO 3166-1 country (v4 only).
    pub iso_3166_1: Option<String>,
}

/// Which account listing, with its v3 and v4 path suffixes.
#[derive(Debug, Clone, Copy)]
struct AccountView {
    v3: &'static str,
    v4: &'static str,
    movie: bool,
    element: Kind,
}

const CREATED_LISTS: AccountView = AccountView {
    v3: "lists",
    v4: "lists",
    movie: true,
    element: Kind::List,
};
const FAVORITE_MOVIES: AccountView = AccountView {
    v3: "favorite/movies",
    v4: "movie/favorites",
    movie: true,
    element: Kind::Movie,
};
const FAVORITE_TV: AccountView = AccountView {
    v3: "favorite/tv",
    v4: "tv/favorites",
    movie: false,
    element: Kind::TvShow,
};
const RATED_MOVIES: AccountView = AccountView {
    v3: "rated/movies",
    v4: "movie/rated",
    movie: true,
    element: Kind::Movie,
};
const RATED_TV: AccountView = AccountView {
    v3: "rated/tv",
    v4: "tv/rated",
    movie: false,
    element: Kind::TvShow,
};
const MOVIE_WATCHLIST: AccountView = AccountView {
    v3: "watchlist/movies",
    v4: "movie/watchlist",
    movie: true,
    element: Kind::Movie,
};
const TV_WATCHLIST: AccountView = AccountView {
    v3: "watchlist/tv",
    v4: "tv/watchlist",
    movie: false,
    element: Kind::TvShow,
};

fn check_sort(sort_by: Option<&str>, v3: bool, movie: bool) -> Result<()> {
    let Some(sort_by) = sort_by else {
        return Ok(());
    };
    let allowed: &[&str] = match (v3, movie) {
        (true, _) => &V3_SORTS,
        (false, true) => &V4_MOVIE_SORTS,
        (false, false) => &V4_SHOW_SORTS,
    };
    if allowed.contains(&sort_by) {
        Ok(())
    } else {
        Err(TmdbError::invalid(format!("sort_by not in {allowed:?}")))
    }
}

impl<T: LocalTransport> Tmdb<T> {
    /// v3 account id of the session, fetched once.
    async fn v3_account_id(&self) -> Result<u64> {
        self.account_id
            .get_or_try_init(|| async {
                let account = self.send(ApiRequest::get("account").with_session()).await?;
                account
                    .get("id")
                    .and_then(Value::as_u64)
                    .ok_or_else(|| TmdbError::Remote(String::from("account without id")))
            })
            .await
            .copied()
    }

    fn v4_account(&self) -> Result<String> {
        self.transport
            .v4_account_id()
            .map(String::from)
            .ok_or_else(|| {
                TmdbError::AuthenticationRequired(String::from("Requires V4 API Write Access Token"))
            })
    }

    /// Source of an account listing, v4 unless `v3` is forced or the token
    /// lacks write scope.
    async fn account_source(
        &self,
        view: AccountView,
        sort_by: Option<&str>,
        v3: bool,
    ) -> Result<PageSource> {
        let v3 = v3 || !self.transport.has_write_scope();
        check_sort(sort_by, v3, view.movie)?;
        let request = if v3 {
            let id = self.v3_account_id().await?;
            ApiRequest::get(format!("account/{id}/{}", view.v3))
                .query("language", self.context.language())
                .query_opt("sort_by", sort_by)
                .with_session()
        } else {
            let id = self.v4_account()?;
            ApiRequest::get(format!("account/{id}/{}", view.v4))
                .v4()
                .query_opt("sort_by", sort_by)
        };
        Ok(PageSource::listing(request, view.element))
    }

    /// Lists created by the account.
    ///
    /// # Errors
    ///
    /// `AuthenticationRequired` without a session or v4 write scope.
    pub async fn created_lists(&self, v3: bool) -> Result<PagedResult<TmdbList>> {
        let source = self.account_source(CREATED_LISTS, None, v3).await?;
        PagedResult::fetch(self, source).await
    }

    /// The account's favorite movies.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for a sort key of the wrong API generation;
    /// `AuthenticationRequired` without a session or v4 write scope.
    pub async fn favorite_movies(&self, sort_by: Option<&str>, v3: bool) -> Result<PagedResult<Movie>> {
        let source = self.account_source(FAVORITE_MOVIES, sort_by, v3).await?;
        PagedResult::fetch(self, source).await
    }

    /// The account's favorite shows.
    ///
    /// # Errors
    ///
    /// As [`Tmdb::favorite_movies`].
    pub async fn favorite_tv_shows(&self, sort_by: Option<&str>, v3: bool) -> Result<PagedResult<TvShow>> {
        let source = self.account_source(FAVORITE_TV, sort_by, v3).await?;
        PagedResult::fetch(self, source).await
    }

    /// Movies rated by the account.
    ///
    /// # Errors
    ///
    /// As [`Tmdb::favorite_movies`].
    pub async fn rated_movies(&self, sort_by: Option<&str>, v3: bool) -> Result<PagedResult<Movie>> {
        let source = self.account_source(RATED_MOVIES, sort_by, v3).await?;
        PagedResult::fetch(self, source).await
    }

    /// Shows rated by the account.
    ///
    /// # Errors
    ///
    /// As [`Tmdb::favorite_movies`].
    pub async fn rated_tv_shows(&self, sort_by: Option<&str>, v3: bool) -> Result<PagedResult<TvShow>> {
        let source = self.account_source(RATED_TV, sort_by, v3).await?;
        PagedResult::fetch(self, source).await
    }

    /// Episodes rated by the account (v3 only).
    ///
    /// # Errors
    ///
    /// As [`Tmdb::favorite_movies`].
    pub async fn rated_episodes(&self, sort_by: Option<&str>) -> Result<PagedResult<Episode>> {
        check_sort(sort_by, true, false)?;
        let id = self.v3_account_id().await?;
        let request = ApiRequest::get(format!("account/{id}/rated/tv/episodes"))
            .query("language", self.context.language())
            .query_opt("sort_by", sort_by)
            .with_session();
        PagedResult::fetch(self, PageSource::listing(request, Kind::Episode)).await
    }

    /// The account's movie watchlist.
    ///
    /// # Errors
    ///
    /// As [`Tmdb::favorite_movies`].
    pub async fn movie_watchlist(&self, sort_by: Option<&str>, v3: bool) -> Result<PagedResult<Movie>> {
        let source = self.account_source(MOVIE_WATCHLIST, sort_by, v3).await?;
        PagedResult::fetch(self, source).await
    }

    /// The account's show watchlist.
    ///
    /// # Errors
    ///
    /// As [`Tmdb::favorite_movies`].
    pub async fn tv_show_watchlist(&self, sort_by: Option<&str>, v3: bool) -> Result<PagedResult<TvShow>> {
        let source = self.account_source(TV_WATCHLIST, sort_by, v3).await?;
        PagedResult::fetch(self, source).await
    }

    /// Movies recommended to the account (v4 write scope only).
    ///
    /// # Errors
    ///
    /// `AuthenticationRequired` without v4 write scope.
    pub async fn movie_recommendations(&self, sort_by: Option<&str>) -> Result<PagedResult<Movie>> {
        self.recommendations("movie/recommendations", sort_by, true, Kind::Movie)
            .await
    }

    /// Shows recommended to the account (v4 write scope only).
    ///
    /// # Errors
    ///
    /// `AuthenticationRequired` without v4 write scope.
    pub async fn tv_show_recommendations(&self, sort_by: Option<&str>) -> Result<PagedResult<TvShow>> {
        self.recommendations("tv/recommendations", sort_by, false, Kind::TvShow)
            .await
    }

    async fn recommendations<V: FromCoerced>(
        &self,
        suffix: &str,
        sort_by: Option<&str>,
        movie: bool,
        element: Kind,
    ) -> Result<PagedResult<V>> {
        check_sort(sort_by, false, movie)?;
        self.require_v4(true)?;
        let request = ApiRequest::get(format!("account/{}/{suffix}", self.v4_account()?))
            .v4()
            .query_opt("sort_by", sort_by);
        PagedResult::fetch(self, PageSource::listing(request, element)).await
    }

    /// Rates the title at `path` (`movie/550`, `tv/1399/season/1/episode/1`).
    pub(crate) async fn rate_media(&self, path: String, rating: f64) -> Result<()> {
        let rating = validate_rating(rating)?;
        let request = ApiRequest::post(format!("{path}/rating"))
            .body(json!({"value": rating}))
            .with_session();
        self.send(request).await.map(drop)
    }

    /// Removes the rating of the title at `path`.
    pub(crate) async fn unrate_media(&self, path: String) -> Result<()> {
        let request = ApiRequest::delete(format!("{path}/rating")).with_session();
        self.send(request).await.map(drop)
    }

    /// Sets or clears an account flag on a movie or show.
    pub(crate) async fn set_account_flag(
        &self,
        flag: AccountFlag,
        media_type: &str,
        id: u64,
        value: bool,
    ) -> Result<()> {
        let account = self.v3_account_id().await?;
        let mut body = json!({"media_type": media_type, "media_id": id});
        if let Value::Object(fields) = &mut body {
            fields.insert(String::from(flag.as_str()), Value::Bool(value));
        }
        let request = ApiRequest::post(format!("account/{account}/{}", flag.as_str()))
            .body(body)
            .with_session();
        self.send(request).await.map(drop)
    }

    /// Creates a list and returns its id. Uses v4 when the token has write
    /// scope, otherwise the v3 session.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for unknown language or country codes;
    /// `AuthenticationRequired` without a session or v4 write scope.
    pub async fn create_list(&self, list: &NewList) -> Result<String> {
        let language = self.context.validate_language(&list.iso_639_1)?;
        let country = list
            .iso_3166_1
            .as_deref()
            .map(|code| self.context.validate_country(code))
            .transpose()?;

        let (request, id_key) = if self.transport.has_write_scope() {
            let body = json!({
                "name": list.name,
                "iso_639_1": language,
                "description": list.description,
                "public": list.public,
                "iso_3166_1": country,
            });
            (ApiRequest::post("list").v4().body(body), "id")
        } else {
            let body = json!({
                "name": list.name,
                "description": list.description,
                "language": language,
            });
            (ApiRequest::post("list").body(body).with_session(), "list_id")
        };

        let created = self.send(request).await?;
        created
            .get(id_key)
            .map(|id| match id {
                Value::String(text) => text.clone(),
                other => other.to_string(),
            })
            .ok_or_else(|| TmdbError::Remote(format!("created list without {id_key}")))
    }
}
