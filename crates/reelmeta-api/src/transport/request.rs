//! Transport-agnostic request description.

use serde_json::Value;

/// TMDB API generation a request targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiVersion {
    /// `https://api.themoviedb.org/3`, authenticated with the API key.
    V3,
    /// `https://api.themoviedb.org/4`, authenticated with a bearer token.
    V4,
}

/// HTTP method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    /// GET.
    Get,
    /// POST.
    Post,
    /// PUT.
    Put,
    /// DELETE.
    Delete,
}

/// A single call against the TMDB API.
///
/// `path` is relative to the version's base URL (no leading slash).
/// Credentials are attached by the transport; `session` asks it to add the
/// v3 `session_id` as well.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    /// API generation.
    pub version: ApiVersion,
    /// HTTP method.
    pub method: Method,
    /// Relative path, e.g. `movie/550`.
    pub path: String,
    /// Query parameters in insertion order.
    pub query: Vec<(String, String)>,
    /// Optional JSON body.
    pub body: Option<Value>,
    /// Whether the v3 session id must be attached.
    pub session: bool,
}

impl ApiRequest {
    /// Creates a request with no query, body or session.
    #[must_use]
    pub fn new(version: ApiVersion, method: Method, path: impl Into<String>) -> Self {
        Self {
            version,
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
            session: false,
        }
    }

    /// GET against v3.
    #[must_use]
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(ApiVersion::V3, Method::Get, path)
    }

    /// POST against v3.
    #[must_use]
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(ApiVersion::V3, Method::Post, path)
    }

    /// DELETE against v3.
    #[must_use]
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(ApiVersion::V3, Method::Delete, path)
    }

    /// Switches the request to the v4 API.
    #[must_use]
    pub const fn v4(mut self) -> Self {
        self.version = ApiVersion::V4;
        self
    }

    /// Appends a query parameter.
    #[must_use]
    pub fn query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((String::from(key), value.to_string()));
        self
    }

    /// Appends a query parameter when `value` is `Some`.
    #[must_use]
    pub fn query_opt(self, key: &str, value: Option<impl ToString>) -> Self {
        match value {
            Some(value) => self.query(key, value),
            None => self,
        }
    }

    /// Sets the JSON body.
    #[must_use]
    pub fn body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Marks the request as requiring the v3 session id.
    #[must_use]
    pub const fn with_session(mut self) -> Self {
        self.session = true;
        self
    }

    /// Replaces (or inserts) a query parameter in place.
    pub fn set_query(&mut self, key: &str, value: impl ToString) {
        let value = value.to_string();
        if let Some(entry) = self.query.iter_mut().find(|(k, _)| k == key) {
            entry.1 = value;
        } else {
            self.query.push((String::from(key), value));
        }
    }

    /// Returns the value of a query parameter.
    #[must_use]
    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}
