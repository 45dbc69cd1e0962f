//! In-memory transport recording every request, for protocol tests.
#![allow(clippy::arithmetic_side_effects)]

use std::cell::RefCell;

use serde_json::{Value, json};

use crate::error::{Result, TmdbError};
use crate::transport::{ApiRequest, LocalTransport, Method};

/// One canned response.
#[derive(Debug)]
struct Route {
    method: Method,
    path: String,
    page: Option<u32>,
    response: Value,
}

/// Transport answering from canned routes and recording calls.
#[derive(Debug, Default)]
pub struct MockTransport {
    routes: Vec<Route>,
    calls: RefCell<Vec<ApiRequest>>,
    v4_token: bool,
    account_id: Option<String>,
    session: bool,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answers GET `path` with `response`, whatever the page.
    pub fn route(self, path: &str, response: Value) -> Self {
        self.route_method(Method::Get, path, response)
    }

    /// Answers `method` on `path` with `response`.
    pub fn route_method(mut self, method: Method, path: &str, response: Value) -> Self {
        self.routes.push(Route {
            method,
            path: String::from(path),
            page: None,
            response,
        });
        self
    }

    /// Answers GET `path` for one page.
    pub fn route_page(mut self, path: &str, page: u32, response: Value) -> Self {
        self.routes.push(Route {
            method: Method::Get,
            path: String::from(path),
            page: Some(page),
            response,
        });
        self
    }

    /// Enables a v3 session.
    pub const fn with_session(mut self) -> Self {
        self.session = true;
        self
    }

    /// Enables a v4 read token.
    pub const fn with_v4_token(mut self) -> Self {
        self.v4_token = true;
        self
    }

    /// Enables v4 write scope (token and account id).
    pub fn with_write_scope(mut self) -> Self {
        self.v4_token = true;
        self.session = true;
        self.account_id = Some(String::from("v4-account"));
        self
    }

    /// Every recorded request in order.
    pub fn calls(&self) -> Vec<ApiRequest> {
        self.calls.borrow().clone()
    }

    /// Number of requests issued.
    pub fn total(&self) -> usize {
        self.calls.borrow().len()
    }

    /// Number of requests for `path`.
    pub fn count(&self, path: &str) -> usize {
        self.calls.borrow().iter().filter(|r| r.path == path).count()
    }

    /// Number of requests for one page of `path`.
    pub fn count_page(&self, path: &str, page: u32) -> usize {
        let page = page.to_string();
        self.calls
            .borrow()
            .iter()
            .filter(|r| r.path == path && r.query_value("page") == Some(page.as_str()))
            .count()
    }

    /// Last request issued for `path`.
    pub fn last(&self, path: &str) -> Option<ApiRequest> {
        self.calls
            .borrow()
            .iter()
            .rev()
            .find(|r| r.path == path)
            .cloned()
    }
}

impl LocalTransport for MockTransport {
    async fn send(&self, request: ApiRequest) -> Result<Value> {
        if request.session && !self.session {
            return Err(TmdbError::AuthenticationRequired(String::from("no session")));
        }
        self.calls.borrow_mut().push(request.clone());
        let page = request.query_value("page").and_then(|p| p.parse().ok());
        self.routes
            .iter()
            .find(|route| {
                route.method == request.method
                    && route.path == request.path
                    && route.page.is_none_or(|wanted| Some(wanted) == page)
            })
            .map(|route| route.response.clone())
            .ok_or_else(|| TmdbError::NotFound(format!("no route for {}", request.path)))
    }

    async fn session_token(&self) -> Result<String> {
        if self.session {
            Ok(String::from("session"))
        } else {
            Err(TmdbError::AuthenticationRequired(String::from("no session")))
        }
    }

    fn read_credential(&self) -> &str {
        "test-key"
    }

    fn has_write_scope(&self) -> bool {
        self.v4_token && self.account_id.is_some()
    }

    fn has_v4_token(&self) -> bool {
        self.v4_token
    }

    fn v4_account_id(&self) -> Option<&str> {
        self.account_id.as_deref()
    }
}

/// Standard page payload of `count` movies numbered from the page offset.
pub fn page_of_movies(page: u32, total_pages: u32, total_results: u64, count: u64) -> Value {
    let first = u64::from(page - 1) * 20 + 1;
    let results: Vec<Value> = (first..first + count)
        .map(|id| json!({"id": id, "title": format!("Movie {id}")}))
        .collect();
    json!({
        "page": page,
        "total_pages": total_pages,
        "total_results": total_results,
        "results": results,
    })
}
