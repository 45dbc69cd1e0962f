//! Reference tables, external id lookup and change feeds.
#![allow(clippy::future_not_send)]

use std::collections::BTreeMap;

use crate::coerce::{FromCoerced, Kind, Options};
use crate::error::{Result, TmdbError};
use crate::objs::{Country, CountryCertifications, Episode, Movie, Person, Season, TvShow, WatchProvider};
use crate::transport::{ApiRequest, LocalTransport};

use super::{FindQuery, Tmdb, validate_date};

/// Everything `find/{id}` matched.
#[derive(Debug, Clone, Default)]
pub struct FindResults {
    /// Matching movies.
    pub movie_results: Vec<Movie>,
    /// Matching people.
    pub person_results: Vec<Person>,
    /// Matching shows.
    pub tv_results: Vec<TvShow>,
    /// Matching episodes.
    pub tv_episode_results: Vec<Episode>,
    /// Matching seasons.
    pub tv_season_results: Vec<Season>,
}

impl FindResults {
    /// Whether nothing matched.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.movie_results.is_empty()
            && self.person_results.is_empty()
            && self.tv_results.is_empty()
            && self.tv_episode_results.is_empty()
            && self.tv_season_results.is_empty()
    }
}

impl<T: LocalTransport> Tmdb<T> {
    /// Movie certifications of every country, keyed by country code.
    ///
    /// # Errors
    ///
    /// Propagates transport failures.
    pub async fn movie_certifications(&self) -> Result<BTreeMap<String, CountryCertifications>> {
        self.certifications("certification/movie/list").await
    }

    /// TV certifications of every country, keyed by country code.
    ///
    /// # Errors
    ///
    /// Propagates transport failures.
    pub async fn tv_certifications(&self) -> Result<BTreeMap<String, CountryCertifications>> {
        self.certifications("certification/tv/list").await
    }

    async fn certifications(&self, path: &str) -> Result<BTreeMap<String, CountryCertifications>> {
        let payload = self.send(ApiRequest::get(path)).await?;
        self.extract(&payload, &["certifications"], Kind::CountryCertifications, &Options::dict())
    }

    /// Countries with watch provider data.
    ///
    /// # Errors
    ///
    /// Propagates transport failures.
    pub async fn provider_regions(&self) -> Result<Vec<Country>> {
        let payload = self.send(self.localized("watch/providers/regions")).await?;
        self.extract(&payload, &["results"], Kind::LoadCountry, &Options::list())
    }

    /// Movie watch providers, optionally for one region.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for an unknown region.
    pub async fn movie_providers(&self, watch_region: Option<&str>) -> Result<Vec<WatchProvider>> {
        self.providers("watch/providers/movie", watch_region).await
    }

    /// TV watch providers, optionally for one region.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for an unknown region.
    pub async fn tv_providers(&self, watch_region: Option<&str>) -> Result<Vec<WatchProvider>> {
        self.providers("watch/providers/tv", watch_region).await
    }

    async fn providers(&self, path: &str, watch_region: Option<&str>) -> Result<Vec<WatchProvider>> {
        let request = self
            .localized(path)
            .query_opt("watch_region", self.region(watch_region)?);
        let payload = self.send(request).await?;
        self.extract(&payload, &["results"], Kind::WatchProvider, &Options::list())
    }

    /// Looks up titles and people by an external id.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` when no id is set; `NotFound` when nothing
    /// matches.
    pub async fn find_by_id(&self, query: &FindQuery) -> Result<FindResults> {
        let (id, source) = query.source()?;
        let request = self
            .localized(&format!("find/{id}"))
            .query("external_source", source);
        let payload = self.send(request).await?;

        let list = Options::list();
        let results = FindResults {
            movie_results: self.extract(&payload, &["movie_results"], Kind::Movie, &list)?,
            person_results: self.extract(&payload, &["person_results"], Kind::Person, &list)?,
            tv_results: self.extract(&payload, &["tv_results"], Kind::TvShow, &list)?,
            tv_episode_results: self.extract(&payload, &["tv_episode_results"], Kind::Episode, &list)?,
            tv_season_results: self.extract(&payload, &["tv_season_results"], Kind::Season, &list)?,
        };
        if results.is_empty() {
            return Err(TmdbError::NotFound(format!(
                "No Results were found for {source}: {id}"
            )));
        }
        tracing::debug!(source, id = %id, "find matched");
        Ok(results)
    }

    /// Movies changed in the window (the last day when unbounded).
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for a malformed date.
    pub async fn movie_change_list(&self, start: Option<&str>, end: Option<&str>) -> Result<Vec<Movie>> {
        self.changes("movie/changes", start, end, Kind::Movie).await
    }

    /// Shows changed in the window.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for a malformed date.
    pub async fn tv_change_list(&self, start: Option<&str>, end: Option<&str>) -> Result<Vec<TvShow>> {
        self.changes("tv/changes", start, end, Kind::TvShow).await
    }

    /// People changed in the window.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for a malformed date.
    pub async fn person_change_list(&self, start: Option<&str>, end: Option<&str>) -> Result<Vec<Person>> {
        self.changes("person/changes", start, end, Kind::Person).await
    }

    async fn changes<V: FromCoerced>(
        &self,
        path: &str,
        start: Option<&str>,
        end: Option<&str>,
        element: Kind,
    ) -> Result<Vec<V>> {
        let request = ApiRequest::get(path)
            .query_opt("start_date", start.map(validate_date).transpose()?)
            .query_opt("end_date", end.map(validate_date).transpose()?);
        let payload = self.send(request).await?;
        self.extract(&payload, &["results"], element, &Options::list())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use serde_json::json;

    use super::*;
    use crate::context::Context;
    use crate::objs::Country;
    use crate::testing::MockTransport;

    fn context() -> Context {
        let mut ctx = Context::default();
        ctx.insert_country(Country {
            iso_3166_1: Some(String::from("US")),
            name: Some(String::from("United States of America")),
            native_name: None,
        });
        ctx
    }

    #[tokio::test]
    async fn test_certifications_are_keyed_and_ordered() {
        // Arrange
        let transport = MockTransport::new().route(
            "certification/movie/list",
            json!({"certifications": {"US": [
                {"certification": "R", "meaning": "Restricted", "order": 4},
                {"certification": "G", "meaning": "General", "order": 1}
            ]}}),
        );
        let tmdb = Tmdb::from_parts(transport, context());

        // Act
        let by_country = tmdb.movie_certifications().await.unwrap();

        // Assert
        let us = by_country.get("US").unwrap();
        assert_eq!(us.iso_3166_1.as_deref(), Some("US"));
        assert_eq!(
            us.country.as_ref().and_then(|c| c.name.as_deref()),
            Some("United States of America")
        );
        let labels: Vec<_> = us
            .certifications
            .iter()
            .filter_map(|c| c.certification.as_deref())
            .collect();
        assert_eq!(labels, ["G", "R"]);
    }

    #[tokio::test]
    async fn test_providers_validate_region() {
        // Arrange
        let transport = MockTransport::new().route(
            "watch/providers/tv",
            json!({"results": [{"provider_id": 8, "provider_name": "Netflix", "display_priority": 0, "logo_path": "/n.jpg"}]}),
        );
        let tmdb = Tmdb::from_parts(transport, context());

        // Act
        let providers = tmdb.tv_providers(Some("us")).await.unwrap();
        let invalid = tmdb.movie_providers(Some("qq")).await;

        // Assert
        assert_eq!(providers.len(), 1);
        assert_eq!(providers.first().and_then(|p| p.id), Some(8));
        assert_eq!(
            tmdb.transport()
                .last("watch/providers/tv")
                .unwrap()
                .query_value("watch_region"),
            Some("US")
        );
        assert!(matches!(invalid, Err(TmdbError::InvalidArgument(_))));
    }

    #[tokio::test]
    async fn test_find_by_external_id() {
        // Arrange
        let transport = MockTransport::new().route(
            "find/tt0133093",
            json!({
                "movie_results": [{"id": 603, "title": "The Matrix"}],
                "person_results": [],
                "tv_results": [],
                "tv_episode_results": [],
                "tv_season_results": []
            }),
        );
        let tmdb = Tmdb::from_parts(transport, context());
        let query = FindQuery {
            imdb_id: Some(String::from("tt0133093")),
            ..FindQuery::default()
        };

        // Act
        let found = tmdb.find_by_id(&query).await.unwrap();

        // Assert
        assert_eq!(found.movie_results.len(), 1);
        assert!(found.person_results.is_empty());
        let request = tmdb.transport().last("find/tt0133093").unwrap();
        assert_eq!(request.query_value("external_source"), Some("imdb_id"));
    }

    #[tokio::test]
    async fn test_find_without_matches_is_not_found() {
        let transport = MockTransport::new().route("find/12345", json!({"movie_results": []}));
        let tmdb = Tmdb::from_parts(transport, context());
        let query = FindQuery {
            tvdb_id: Some(12345),
            ..FindQuery::default()
        };

        let result = tmdb.find_by_id(&query).await;

        assert!(matches!(result, Err(TmdbError::NotFound(msg)) if msg.contains("tvdb_id: 12345")));
    }

    #[tokio::test]
    async fn test_change_list_checks_dates() {
        // Arrange
        let transport = MockTransport::new().route(
            "person/changes",
            json!({"results": [{"id": 1, "adult": false}, {"id": 2, "adult": null}], "page": 1}),
        );
        let tmdb = Tmdb::from_parts(transport, context());

        // Act
        let people = tmdb
            .person_change_list(Some("2024-01-01"), None)
            .await
            .unwrap();
        let invalid = tmdb.movie_change_list(Some("01/01/2024"), None).await;

        // Assert
        assert_eq!(people.len(), 2);
        let request = tmdb.transport().last("person/changes").unwrap();
        assert_eq!(request.query_value("start_date"), Some("2024-01-01"));
        assert_eq!(request.query_value("end_date"), None);
        assert!(matches!(invalid, Err(TmdbError::InvalidArgument(_))));
        assert_eq!(tmdb.transport().count("movie/changes"), 0);
    }
}
