//! Lazy, partially loaded domain objects.
//!
//! An [`Entity`] is built from whatever payload is at hand: a full detail
//! response, a fragment embedded in another response, or a stub holding
//! only an id. Each field remembers whether its path was present in that
//! payload. Reading a missing field of a partial entity through its lazy
//! accessor issues the entity's full-load request once, re-populates every
//! field from the response and clears the partial flag.
//!
//! Entities are immutable from the outside: the data is only reachable by
//! shared reference and the only way to change it is [`Entity::reload`].
#![allow(clippy::future_not_send)]

use std::collections::BTreeSet;
use std::fmt;

use serde_json::Value;

use crate::coerce::{FromCoerced, Key, Kind, Options, coerce, walk};
use crate::context::Context;
use crate::error::Result;
use crate::tmdb::Tmdb;
use crate::transport::{ApiRequest, LocalTransport};

/// Remote identifier of an entity.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EntityId {
    /// Numeric id (movies, shows, people, ...).
    Int(u64),
    /// Text id (credits, reviews, episode groups).
    Str(String),
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(id) => write!(f, "{id}"),
            Self::Str(id) => f.write_str(id),
        }
    }
}

/// Construction context carried from the dispatcher into population.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Seed {
    /// Parent id or map key handed down by keyed kinds.
    pub key: Option<Key>,
    /// `cast` or `crew`, for credits.
    pub credit_type: Option<&'static str>,
    /// `movie` or `tv`, for credits.
    pub media_type: Option<&'static str>,
}

impl Seed {
    /// Seed holding only a construction key.
    #[must_use]
    pub const fn keyed(key: Option<Key>) -> Self {
        Self {
            key,
            credit_type: None,
            media_type: None,
        }
    }

    /// Seed for a credit of the given type and media.
    #[must_use]
    pub const fn credit(credit_type: &'static str, media_type: &'static str) -> Self {
        Self {
            key: None,
            credit_type: Some(credit_type),
            media_type: Some(media_type),
        }
    }
}

/// Field population reader over one raw payload.
///
/// Every accessor records the field name as populated when its path
/// resolves in the payload, even if the value there is `null`.
#[derive(Debug)]
pub struct Fields<'a> {
    raw: &'a Value,
    ctx: &'a Context,
    seed: &'a Seed,
    populated: BTreeSet<&'static str>,
}

impl<'a> Fields<'a> {
    /// Creates a reader over `raw`.
    #[must_use]
    pub const fn new(raw: &'a Value, ctx: &'a Context, seed: &'a Seed) -> Self {
        Self {
            raw,
            ctx,
            seed,
            populated: BTreeSet::new(),
        }
    }

    /// Coerces the value at `path` into field `name`.
    ///
    /// # Errors
    ///
    /// Propagates coercion and conversion failures.
    pub fn get<V: FromCoerced>(
        &mut self,
        name: &'static str,
        path: &[&str],
        kind: Kind,
        options: Options,
    ) -> Result<V> {
        if walk(Some(self.raw), path).is_some() {
            self.populated.insert(name);
        }
        V::from_coerced(coerce(Some(self.raw), path, kind, &options, self.ctx)?)
    }

    /// Single value stored under the field's own name.
    ///
    /// # Errors
    ///
    /// Propagates coercion and conversion failures.
    pub fn one<V: FromCoerced>(&mut self, name: &'static str, kind: Kind) -> Result<V> {
        self.get(name, &[name], kind, Options::single())
    }

    /// Single value at an explicit path.
    ///
    /// # Errors
    ///
    /// Propagates coercion and conversion failures.
    pub fn at<V: FromCoerced>(
        &mut self,
        name: &'static str,
        path: &[&str],
        kind: Kind,
    ) -> Result<V> {
        self.get(name, path, kind, Options::single())
    }

    /// List at an explicit path.
    ///
    /// # Errors
    ///
    /// Propagates coercion and conversion failures.
    pub fn list<V: FromCoerced>(
        &mut self,
        name: &'static str,
        path: &[&str],
        kind: Kind,
    ) -> Result<Vec<V>> {
        self.get(name, path, kind, Options::list())
    }

    /// Uses the first of `paths` that resolves, else the first path.
    ///
    /// # Errors
    ///
    /// Propagates coercion and conversion failures.
    pub fn first<V: FromCoerced>(
        &mut self,
        name: &'static str,
        paths: &[&[&str]],
        kind: Kind,
        options: Options,
    ) -> Result<V> {
        let raw = self.raw;
        let path = paths
            .iter()
            .copied()
            .find(|path| walk(Some(raw), path).is_some())
            .or_else(|| paths.first().copied())
            .unwrap_or(&[]);
        self.get(name, path, kind, options)
    }

    /// Full image URL for the image path at `path`.
    ///
    /// # Errors
    ///
    /// Propagates conversion failures.
    pub fn image_url(&mut self, name: &'static str, path: &[&str]) -> Result<Option<String>> {
        self.get(name, path, Kind::ImageUrl, Options::single())
    }

    /// Marks a computed field as populated.
    pub fn mark(&mut self, name: &'static str) {
        self.populated.insert(name);
    }

    /// Whether the payload has a top-level `key`.
    #[must_use]
    pub fn has(&self, key: &str) -> bool {
        self.raw.get(key).is_some()
    }

    /// Raw payload.
    #[must_use]
    pub const fn raw(&self) -> &'a Value {
        self.raw
    }

    /// Lookup context.
    #[must_use]
    pub const fn ctx(&self) -> &'a Context {
        self.ctx
    }

    /// Construction seed.
    #[must_use]
    pub const fn seed(&self) -> &'a Seed {
        self.seed
    }
}

/// A value object populated from a JSON payload.
pub trait FromPayload: Sized {
    /// Runs the field-population pass.
    ///
    /// # Errors
    ///
    /// Propagates coercion failures of individual fields.
    fn populate(fields: &mut Fields<'_>) -> Result<Self>;
}

/// Builds a value object from `raw`.
///
/// # Errors
///
/// Propagates coercion failures of individual fields.
pub fn build<S: FromPayload>(raw: &Value, ctx: &Context, seed: &Seed) -> Result<S> {
    let mut fields = Fields::new(raw, ctx, seed);
    S::populate(&mut fields)
}

/// Data of an entity that can be fully (re)loaded from TMDB.
pub trait Reload: FromPayload + Clone + fmt::Debug {
    /// Entity kind used in logs.
    const KIND: &'static str;

    /// Default `append_to_response` value of the full load.
    const APPEND: Option<&'static str> = None;

    /// Remote id, if known.
    fn identity(&self) -> Option<EntityId>;

    /// Display name.
    fn label(&self) -> Option<String>;

    /// Request performing the full load.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` when the identifiers needed for the
    /// request are missing.
    fn load_request(&self, seed: &Seed, ctx: &Context, append: Option<&str>)
    -> Result<ApiRequest>;
}

/// A lazily loaded domain object.
#[derive(Debug, Clone)]
pub struct Entity<D> {
    raw: Value,
    data: D,
    partial: bool,
    seed: Seed,
    populated: BTreeSet<&'static str>,
    name: Option<String>,
}

impl<D: Reload> Entity<D> {
    /// Builds an entity from a payload obtained elsewhere.
    ///
    /// # Errors
    ///
    /// Propagates coercion failures of individual fields.
    pub fn from_json(raw: Value, ctx: &Context, partial: bool) -> Result<Self> {
        Self::new(raw, ctx, Seed::default(), partial)
    }

    pub(crate) fn new(raw: Value, ctx: &Context, seed: Seed, partial: bool) -> Result<Self> {
        let (data, populated) = populate::<D>(&raw, ctx, &seed)?;
        let name = data.label();
        Ok(Self {
            raw,
            data,
            partial,
            seed,
            populated,
            name,
        })
    }

    /// Current data without triggering any load.
    #[must_use]
    pub const fn peek(&self) -> &D {
        &self.data
    }

    /// Payload the data was last populated from.
    #[must_use]
    pub const fn raw_payload(&self) -> &Value {
        &self.raw
    }

    /// Whether the entity was built from a fragment and not yet fully loaded.
    #[must_use]
    pub const fn is_partial(&self) -> bool {
        self.partial
    }

    /// Whether `field` was present in the payload.
    #[must_use]
    pub fn is_populated(&self, field: &str) -> bool {
        self.populated.contains(field)
    }

    /// Remote id, if known.
    #[must_use]
    pub fn identity(&self) -> Option<EntityId> {
        self.data.identity()
    }

    /// Display name.
    #[must_use]
    pub fn label(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Construction seed.
    pub(crate) const fn seed(&self) -> &Seed {
        &self.seed
    }

    /// Issues the full load and re-populates every field.
    ///
    /// # Errors
    ///
    /// Propagates transport and coercion failures; the entity is left
    /// unchanged on error.
    pub async fn reload<T: LocalTransport>(&mut self, tmdb: &Tmdb<T>) -> Result<()> {
        self.load(tmdb, D::APPEND).await?;
        self.partial = false;
        Ok(())
    }

    /// Reloads with a custom `append_to_response`. The entity stays
    /// partial, so fields outside `append` may still trigger a full load.
    ///
    /// # Errors
    ///
    /// Propagates transport and coercion failures.
    pub async fn reload_appending<T: LocalTransport>(
        &mut self,
        tmdb: &Tmdb<T>,
        append: &str,
    ) -> Result<()> {
        self.load(tmdb, Some(append)).await
    }

    async fn load<T: LocalTransport>(&mut self, tmdb: &Tmdb<T>, append: Option<&str>) -> Result<()> {
        let request = self.data.load_request(&self.seed, tmdb.context(), append)?;
        tracing::debug!(kind = D::KIND, path = %request.path, "loading entity");
        let raw = tmdb.send(request).await?;
        self.refresh(raw, tmdb.context())
    }

    /// Re-populates from `raw` in place.
    pub(crate) fn refresh(&mut self, raw: Value, ctx: &Context) -> Result<()> {
        let (data, populated) = populate::<D>(&raw, ctx, &self.seed)?;
        self.name = data.label();
        self.data = data;
        self.populated = populated;
        self.raw = raw;
        Ok(())
    }

    /// Performs the deferred full load when `field` was never populated.
    ///
    /// # Errors
    ///
    /// Propagates failures of the full load.
    pub async fn ensure_loaded<T: LocalTransport>(
        &mut self,
        tmdb: &Tmdb<T>,
        field: &str,
    ) -> Result<()> {
        if self.partial && !self.populated.contains(field) {
            tracing::debug!(kind = D::KIND, field, "field not populated, loading full entity");
            self.reload(tmdb).await?;
        }
        Ok(())
    }

    /// Generic lazy read: ensures `name` is loaded, then applies `read`.
    ///
    /// # Errors
    ///
    /// Propagates failures of the deferred full load.
    pub async fn field<'a, T, V>(
        &'a mut self,
        tmdb: &Tmdb<T>,
        name: &str,
        read: impl FnOnce(&'a D) -> V,
    ) -> Result<V>
    where
        T: LocalTransport,
    {
        self.ensure_loaded(tmdb, name).await?;
        Ok(read(&self.data))
    }
}

fn populate<D: FromPayload>(
    raw: &Value,
    ctx: &Context,
    seed: &Seed,
) -> Result<(D, BTreeSet<&'static str>)> {
    let mut fields = Fields::new(raw, ctx, seed);
    let data = D::populate(&mut fields)?;
    Ok((data, fields.populated))
}

impl<D: Reload> PartialEq for Entity<D> {
    fn eq(&self, other: &Self) -> bool {
        match (self.identity(), other.identity()) {
            (Some(left), Some(right)) => left == right,
            (None, None) => self.name == other.name,
            _ => false,
        }
    }
}

impl<D: Reload> PartialEq<u64> for Entity<D> {
    fn eq(&self, other: &u64) -> bool {
        matches!(self.identity(), Some(EntityId::Int(id)) if id == *other)
    }
}

impl<D: Reload> PartialEq<str> for Entity<D> {
    fn eq(&self, other: &str) -> bool {
        self.name.as_deref() == Some(other)
    }
}

impl<D: Reload> PartialEq<&str> for Entity<D> {
    fn eq(&self, other: &&str) -> bool {
        self == *other
    }
}

impl<D: Reload> fmt::Display for Entity<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self.name.as_deref().unwrap_or_default();
        match self.identity() {
            Some(EntityId::Int(0)) | None => f.write_str(name),
            Some(EntityId::Str(id)) if id.is_empty() => f.write_str(name),
            Some(id) => write!(f, "[{id}:{name}]"),
        }
    }
}

/// Generates a data struct and one lazy accessor per field on
/// `Entity<Data>`.
macro_rules! lazy_fields {
    (
        $(#[$meta:meta])*
        pub struct $data:ident {
            $(
                $(#[$field_meta:meta])*
                pub $field:ident : $ty:ty
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone)]
        pub struct $data {
            $(
                $(#[$field_meta])*
                pub $field: $ty,
            )*
        }

        #[allow(clippy::future_not_send, clippy::ref_option)]
        impl $crate::entity::Entity<$data> {
            $(
                $(#[$field_meta])*
                ///
                /// Loads the full entity first when it is partial and this
                /// field was not part of its payload.
                ///
                /// # Errors
                ///
                /// Propagates failures of the deferred full load.
                pub async fn $field<T: $crate::transport::LocalTransport>(
                    &mut self,
                    tmdb: &$crate::tmdb::Tmdb<T>,
                ) -> $crate::error::Result<&$ty> {
                    self.ensure_loaded(tmdb, stringify!($field)).await?;
                    Ok(&self.peek().$field)
                }
            )*
        }
    };
}

pub(crate) use lazy_fields;
