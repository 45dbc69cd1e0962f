//! `Transport` trait definition.
#![allow(clippy::future_not_send)]

use serde_json::Value;

use super::request::ApiRequest;
use crate::error::Result;

/// Transport and credential contract the client core depends on.
///
/// Abstracts HTTP access for mock substitution in tests.
/// Uses `trait_variant::make` to generate a `Send`-bound async trait.
#[allow(clippy::module_name_repetitions)]
#[trait_variant::make(Transport: Send)]
pub trait LocalTransport {
    /// Executes a request and returns the decoded JSON body.
    ///
    /// # Errors
    ///
    /// Returns the categorized [`TmdbError`](crate::TmdbError) for the
    /// response: `NotFound`, `Unauthorized`, `AuthenticationRequired`,
    /// `PrivateResource`, `Remote` or `Connection`.
    async fn send(&self, request: ApiRequest) -> Result<Value>;

    /// Returns the v3 session id, converting the v4 token on first use.
    ///
    /// # Errors
    ///
    /// Returns `AuthenticationRequired` when no session can be established.
    async fn session_token(&self) -> Result<String>;

    /// Returns the read-only API key.
    fn read_credential(&self) -> &str;

    /// Whether a v4 user access token with a known account is configured.
    fn has_write_scope(&self) -> bool;

    /// Whether any v4 bearer token is configured.
    fn has_v4_token(&self) -> bool;

    /// v4 account object id, when known.
    fn v4_account_id(&self) -> Option<&str>;
}
