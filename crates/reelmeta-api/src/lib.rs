//! Typed client for the TMDB v3 and v4 APIs.
//!
//! [`Tmdb`] is the entry point: it owns a [`transport::Transport`] and the
//! shared lookup [`context::Context`] (countries, languages, genres and the
//! image base URL) loaded on connect. Responses become lazy
//! [`entity::Entity`] values that fetch their full detail payload the first
//! time a missing field is read, and paginated endpoints become
//! [`paged::PagedResult`] values that cache every page they load.
//!
//! Entities are read-only outside of a reload:
//!
//! ```compile_fail
//! use reelmeta_api::context::Context;
//! use reelmeta_api::objs::Movie;
//!
//! let movie = Movie::from_json(serde_json::json!({"id": 603}), &Context::default(), true).unwrap();
//! movie.peek().title = Some(String::from("Renamed"));
//! ```

pub mod coerce;
pub mod context;
pub mod entity;
pub mod error;
pub mod objs;
pub mod paged;
pub mod tmdb;
pub mod transport;

#[cfg(test)]
mod testing;

pub use error::{Result, TmdbError};
pub use tmdb::Tmdb;
