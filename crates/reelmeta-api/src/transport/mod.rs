//! HTTP transport for the TMDB v3 and v4 APIs.
//!
//! Builds authenticated requests, decodes JSON responses and maps
//! failures onto [`TmdbError`](crate::TmdbError).

mod api;
mod client;
mod request;

#[allow(clippy::module_name_repetitions)]
pub use api::{LocalTransport, Transport};
pub use client::{TmdbClient, TmdbClientBuilder};
pub use request::{ApiRequest, ApiVersion, Method};
