//! Value coercion dispatcher.
//!
//! [`coerce`] walks a path into an untyped JSON payload and turns the value
//! found there into a [`Coerced`] tree according to a closed [`Kind`] tag:
//! a primitive, a list or map of coerced values, or a fully built domain
//! [`Object`]. Typed fields are then extracted with [`FromCoerced`].

use std::collections::BTreeMap;
use std::fmt;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde_json::Value;

use crate::context::Context;
use crate::entity::{Entity, Seed, build};
use crate::error::{Result, TmdbError};
use crate::objs::{
    AlternativeName, AlternativeTitle, Certification, Collection, Company, Country,
    CountryCertifications, CountryWatchProviders, Credit, Department, Episode, EpisodeGroup,
    Genre, Group, Image, ImageType, Keyword, Language, Media, Movie, Network, Person,
    ReleaseDate, Review, Season, Tagged, Timezones, TmdbList, Trailer, Translation, TvShow, User,
    Video, WatchProvider, list_source,
};
use crate::paged::{PageSource, PagedResult};
use crate::transport::ApiRequest;

/// Closed vocabulary of value kinds understood by the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    /// Integer.
    Int,
    /// Floating point number.
    Float,
    /// Boolean, including textual spellings.
    Bool,
    /// `YYYY-MM-DD` date or `YYYY-MM-DDTHH:MM:SS` timestamp.
    Date,
    /// Plain text.
    Str,
    /// JSON passed through untouched.
    Raw,
    /// Image path expanded to a full image URL.
    ImageUrl,
    /// Account rating: a number, `{value}` object, or `false`.
    Rated,
    /// `[{iso_3166_1, rating}]` flattened into a map.
    ContentRating,
    /// `[{iso_3166_1, release_dates}]` grouped into a map of release dates.
    ReleaseDatesByCountry,
    /// Country resolved from the lookup tables.
    Country,
    /// Language resolved from the lookup tables.
    Language,
    /// Movie genre resolved from the lookup tables.
    MovieGenre,
    /// TV genre resolved from the lookup tables.
    TvGenre,
    /// [`AlternativeName`].
    AlternativeName,
    /// [`AlternativeTitle`].
    AlternativeTitle,
    /// [`Certification`].
    Certification,
    /// [`Country`] built from its own payload.
    LoadCountry,
    /// [`CountryCertifications`], keyed by country code.
    CountryCertifications,
    /// [`CountryWatchProviders`], keyed by country code.
    CountryWatchProviders,
    /// [`Department`].
    LoadDepartment,
    /// [`Genre`] built from its own payload.
    LoadGenre,
    /// Episode group [`Group`].
    Group,
    /// [`Language`] built from its own payload.
    LoadLanguage,
    /// [`ReleaseDate`].
    ReleaseDate,
    /// [`Timezones`].
    LoadTimezone,
    /// [`Trailer`].
    Trailer,
    /// [`Translation`].
    Translation,
    /// [`User`].
    User,
    /// [`Video`].
    Video,
    /// [`WatchProvider`].
    WatchProvider,
    /// Backdrop [`Image`].
    Backdrop,
    /// Logo [`Image`].
    Logo,
    /// Poster [`Image`].
    Poster,
    /// Profile [`Image`].
    Profile,
    /// Still [`Image`].
    Still,
    /// [`Tagged`] image.
    Tagged,
    /// [`Collection`].
    Collection,
    /// [`Company`].
    Company,
    /// Movie cast [`Credit`].
    MovieCast,
    /// Movie crew [`Credit`].
    MovieCrew,
    /// TV cast [`Credit`].
    TvCast,
    /// TV crew [`Credit`].
    TvCrew,
    /// Aggregate TV cast, one [`Credit`] per role.
    AggTvCast,
    /// Aggregate TV crew, one [`Credit`] per job.
    AggTvCrew,
    /// [`Keyword`].
    Keyword,
    /// [`Movie`].
    Movie,
    /// [`Network`].
    Network,
    /// [`Person`].
    Person,
    /// [`Review`].
    Review,
    /// [`TvShow`].
    TvShow,
    /// [`Season`], keyed by show id.
    Season,
    /// [`Episode`], keyed by show id.
    Episode,
    /// [`EpisodeGroup`].
    EpisodeGroup,
    /// [`Media`] selected by the `media_type` discriminator.
    MediaType,
    /// [`TmdbList`].
    List,
    /// Reviews of a movie, keyed by movie id.
    MovieReviews,
    /// Lists containing a movie, keyed by movie id.
    MovieLists,
    /// Movie recommendations, keyed by movie id.
    RecommendedMovies,
    /// Similar movies, keyed by movie id.
    SimilarMovies,
    /// TV recommendations, keyed by show id.
    RecommendedTv,
    /// Similar TV shows, keyed by show id.
    SimilarTv,
    /// Tagged images of a person, keyed by person id.
    TaggedImages,
}

impl Kind {
    /// Kind for a `media_type` discriminator value.
    #[must_use]
    pub fn from_media_type(media_type: &str) -> Option<Self> {
        match media_type {
            "movie" => Some(Self::Movie),
            "tv" => Some(Self::TvShow),
            "person" => Some(Self::Person),
            _ => None,
        }
    }

    /// Whether the kind defaults to zero instead of absent.
    const fn is_numeric(self) -> bool {
        matches!(self, Self::Int | Self::Float)
    }
}

/// Extra construction key handed to keyed kinds (parent id, country code).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Key {
    /// Numeric key such as a show id.
    Int(u64),
    /// Text key such as a country code.
    Str(String),
}

impl Key {
    /// Numeric value of the key.
    #[must_use]
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Self::Int(id) => Some(*id),
            Self::Str(text) => text.parse().ok(),
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(id) => write!(f, "{id}"),
            Self::Str(text) => f.write_str(text),
        }
    }
}

impl From<u64> for Key {
    fn from(id: u64) -> Self {
        Self::Int(id)
    }
}

/// How the value at the path is shaped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Shape {
    /// A single value.
    #[default]
    Single,
    /// An array; each element is coerced.
    List,
    /// An array whose coerced elements are lists, flattened one level.
    Extend,
    /// An object; each value is coerced and its key passed along.
    Dict,
}

/// Coercion options.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Options {
    /// Shape of the value at the path.
    pub shape: Shape,
    /// Return absent instead of `0`/empty list for missing values.
    pub default_is_none: bool,
    /// Construction key for keyed kinds.
    pub key: Option<Key>,
}

impl Options {
    /// Single value, default semantics.
    #[must_use]
    pub const fn single() -> Self {
        Self::shaped(Shape::Single)
    }

    /// List of values.
    #[must_use]
    pub const fn list() -> Self {
        Self::shaped(Shape::List)
    }

    /// Flattened list of lists.
    #[must_use]
    pub const fn extend() -> Self {
        Self::shaped(Shape::Extend)
    }

    /// Map of values keyed by the source keys.
    #[must_use]
    pub const fn dict() -> Self {
        Self::shaped(Shape::Dict)
    }

    const fn shaped(shape: Shape) -> Self {
        Self {
            shape,
            default_is_none: false,
            key: None,
        }
    }

    /// Missing values become absent regardless of kind.
    #[must_use]
    pub const fn default_none(mut self) -> Self {
        self.default_is_none = true;
        self
    }

    /// Sets the construction key.
    #[must_use]
    pub fn keyed(mut self, key: Option<Key>) -> Self {
        self.key = key;
        self
    }
}

/// Result of a coercion.
#[derive(Debug, Clone)]
pub enum Coerced {
    /// Nothing there (or the kind's null default).
    Absent,
    /// Integer.
    Int(i64),
    /// Floating point number.
    Float(f64),
    /// Boolean.
    Bool(bool),
    /// Calendar date.
    Date(NaiveDate),
    /// Date and time.
    DateTime(NaiveDateTime),
    /// Text.
    Str(String),
    /// Untouched JSON.
    Raw(Value),
    /// Ordered values.
    List(Vec<Self>),
    /// Values keyed by text.
    Map(BTreeMap<String, Self>),
    /// Domain object.
    Object(Box<Object>),
}

impl Coerced {
    /// Wraps a domain object.
    fn object(object: Object) -> Self {
        Self::Object(Box::new(object))
    }

    /// Whether this is [`Coerced::Absent`].
    #[must_use]
    pub const fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }

    /// Short description for error messages.
    fn describe(&self) -> String {
        match self {
            Self::Absent => String::from("absent"),
            Self::Int(v) => v.to_string(),
            Self::Float(v) => v.to_string(),
            Self::Bool(v) => v.to_string(),
            Self::Date(v) => v.to_string(),
            Self::DateTime(v) => v.to_string(),
            Self::Str(v) => format!("{v:?}"),
            Self::Raw(v) => v.to_string(),
            Self::List(v) => format!("list of {}", v.len()),
            Self::Map(v) => format!("map of {}", v.len()),
            Self::Object(v) => String::from(v.variant_name()),
        }
    }
}

/// Conversion out of a [`Coerced`] value into a typed field.
pub trait FromCoerced: Sized {
    /// Converts the coerced value.
    ///
    /// # Errors
    ///
    /// Returns `Conversion` when the value has the wrong shape.
    fn from_coerced(value: Coerced) -> Result<Self>;
}

/// Declares the domain object registry and its typed extractors.
macro_rules! object_registry {
    ($($variant:ident($ty:ty)),* $(,)?) => {
        /// A domain object produced by the dispatcher.
        #[derive(Debug, Clone)]
        #[allow(clippy::large_enum_variant)]
        pub enum Object {
            $(
                #[doc = concat!("A `", stringify!($ty), "`.")]
                $variant($ty),
            )*
        }

        impl Object {
            /// Registry name of the variant.
            #[must_use]
            pub const fn variant_name(&self) -> &'static str {
                match self {
                    $(Self::$variant(_) => stringify!($variant),)*
                }
            }
        }

        $(
            impl FromCoerced for $ty {
                fn from_coerced(value: Coerced) -> Result<Self> {
                    match value {
                        Coerced::Object(object) => match *object {
                            Object::$variant(inner) => Ok(inner),
                            other => Err(TmdbError::conversion(
                                stringify!($variant),
                                other.variant_name(),
                            )),
                        },
                        other => Err(TmdbError::conversion(stringify!($variant), other.describe())),
                    }
                }
            }
        )*
    };
}

object_registry! {
    AlternativeName(AlternativeName),
    AlternativeTitle(AlternativeTitle),
    Certification(Certification),
    Country(Country),
    CountryCertifications(CountryCertifications),
    CountryWatchProviders(CountryWatchProviders),
    Department(Department),
    Genre(Genre),
    Group(Group),
    Language(Language),
    ReleaseDate(ReleaseDate),
    Timezones(Timezones),
    Trailer(Trailer),
    Translation(Translation),
    User(User),
    Video(Video),
    WatchProvider(WatchProvider),
    Image(Image),
    Tagged(Tagged),
    Collection(Collection),
    Company(Company),
    Credit(Credit),
    Keyword(Keyword),
    Movie(Movie),
    Network(Network),
    Person(Person),
    Review(Review),
    TvShow(TvShow),
    Season(Season),
    Episode(Episode),
    EpisodeGroup(EpisodeGroup),
    List(TmdbList),
    Reviews(PagedResult<Review>),
    Lists(PagedResult<TmdbList>),
    Movies(PagedResult<Movie>),
    TvShows(PagedResult<TvShow>),
    TaggedImages(PagedResult<Tagged>),
}

impl FromCoerced for Media {
    fn from_coerced(value: Coerced) -> Result<Self> {
        match value {
            Coerced::Object(object) => match *object {
                Object::Movie(movie) => Ok(Self::Movie(Box::new(movie))),
                Object::TvShow(show) => Ok(Self::TvShow(Box::new(show))),
                Object::Person(person) => Ok(Self::Person(Box::new(person))),
                other => Err(TmdbError::conversion("Media", other.variant_name())),
            },
            other => Err(TmdbError::conversion("Media", other.describe())),
        }
    }
}

impl FromCoerced for Coerced {
    fn from_coerced(value: Coerced) -> Result<Self> {
        Ok(value)
    }
}

impl FromCoerced for i64 {
    #[allow(clippy::as_conversions, clippy::cast_possible_truncation)]
    fn from_coerced(value: Coerced) -> Result<Self> {
        match value {
            Coerced::Int(v) => Ok(v),
            Coerced::Float(v) => Ok(v.trunc() as Self),
            Coerced::Absent => Ok(0),
            other => Err(TmdbError::conversion("integer", other.describe())),
        }
    }
}

impl FromCoerced for u64 {
    fn from_coerced(value: Coerced) -> Result<Self> {
        let signed = i64::from_coerced(value)?;
        Self::try_from(signed).map_err(|_| TmdbError::conversion("unsigned integer", signed))
    }
}

impl FromCoerced for u32 {
    fn from_coerced(value: Coerced) -> Result<Self> {
        let signed = i64::from_coerced(value)?;
        Self::try_from(signed).map_err(|_| TmdbError::conversion("unsigned integer", signed))
    }
}

impl FromCoerced for f64 {
    #[allow(clippy::as_conversions, clippy::cast_precision_loss)]
    fn from_coerced(value: Coerced) -> Result<Self> {
        match value {
            Coerced::Float(v) => Ok(v),
            Coerced::Int(v) => Ok(v as Self),
            Coerced::Absent => Ok(0.0),
            other => Err(TmdbError::conversion("float", other.describe())),
        }
    }
}

impl FromCoerced for bool {
    fn from_coerced(value: Coerced) -> Result<Self> {
        match value {
            Coerced::Bool(v) => Ok(v),
            other => Err(TmdbError::conversion("boolean", other.describe())),
        }
    }
}

impl FromCoerced for String {
    fn from_coerced(value: Coerced) -> Result<Self> {
        match value {
            Coerced::Str(v) => Ok(v),
            other => Err(TmdbError::conversion("string", other.describe())),
        }
    }
}

impl FromCoerced for NaiveDate {
    fn from_coerced(value: Coerced) -> Result<Self> {
        match value {
            Coerced::Date(v) => Ok(v),
            Coerced::DateTime(v) => Ok(v.date()),
            other => Err(TmdbError::conversion("date", other.describe())),
        }
    }
}

impl FromCoerced for NaiveDateTime {
    fn from_coerced(value: Coerced) -> Result<Self> {
        match value {
            Coerced::DateTime(v) => Ok(v),
            Coerced::Date(v) => Ok(v.and_time(NaiveTime::MIN)),
            other => Err(TmdbError::conversion("date-time", other.describe())),
        }
    }
}

impl FromCoerced for Value {
    fn from_coerced(value: Coerced) -> Result<Self> {
        match value {
            Coerced::Raw(v) => Ok(v),
            Coerced::Absent => Ok(Self::Null),
            other => Err(TmdbError::conversion("json", other.describe())),
        }
    }
}

impl<V: FromCoerced> FromCoerced for Option<V> {
    fn from_coerced(value: Coerced) -> Result<Self> {
        if value.is_absent() {
            Ok(None)
        } else {
            V::from_coerced(value).map(Some)
        }
    }
}

impl<V: FromCoerced> FromCoerced for Box<V> {
    fn from_coerced(value: Coerced) -> Result<Self> {
        V::from_coerced(value).map(Box::new)
    }
}

impl<V: FromCoerced> FromCoerced for Vec<V> {
    fn from_coerced(value: Coerced) -> Result<Self> {
        match value {
            Coerced::List(items) => items
                .into_iter()
                .filter(|item| !item.is_absent())
                .map(V::from_coerced)
                .collect(),
            Coerced::Absent => Ok(Self::new()),
            other => Err(TmdbError::conversion("list", other.describe())),
        }
    }
}

impl<V: FromCoerced> FromCoerced for BTreeMap<String, V> {
    fn from_coerced(value: Coerced) -> Result<Self> {
        match value {
            Coerced::Map(entries) => entries
                .into_iter()
                .filter(|(_, item)| !item.is_absent())
                .map(|(key, item)| V::from_coerced(item).map(|v| (key, v)))
                .collect(),
            Coerced::Absent => Ok(Self::new()),
            other => Err(TmdbError::conversion("map", other.describe())),
        }
    }
}

/// Resolves `path` inside `source`. An empty path yields `source` itself.
#[must_use]
pub fn walk<'v>(source: Option<&'v Value>, path: &[&str]) -> Option<&'v Value> {
    path.iter()
        .try_fold(source?, |value, key| value.get(*key))
}

/// Default for a single value of `kind`.
const fn single_default(kind: Kind, default_is_none: bool) -> Coerced {
    if !default_is_none && kind.is_numeric() {
        match kind {
            Kind::Float => Coerced::Float(0.0),
            _ => Coerced::Int(0),
        }
    } else {
        Coerced::Absent
    }
}

/// Coerces the value found at `path` inside `source`.
///
/// A path that does not resolve, or resolves to `null`, yields the default:
/// `0` for numeric kinds, an empty list for list shapes, otherwise absent.
/// `options.default_is_none` makes every default absent.
///
/// # Errors
///
/// Malformed primitives (`"abc"` as an integer, an unparsable date) yield
/// `Conversion`. Object constructors propagate their own errors.
pub fn coerce(
    source: Option<&Value>,
    path: &[&str],
    kind: Kind,
    options: &Options,
    ctx: &Context,
) -> Result<Coerced> {
    let Some(value) = walk(source, path).filter(|value| !value.is_null()) else {
        let listy = matches!(options.shape, Shape::List | Shape::Extend);
        return Ok(if listy && !options.default_is_none {
            Coerced::List(Vec::new())
        } else {
            single_default(kind, options.default_is_none)
        });
    };

    let key = options.key.as_ref();
    let dn = options.default_is_none;
    match options.shape {
        Shape::Single => coerce_value(value, kind, key, dn, ctx),
        Shape::List => as_array(value)?
            .iter()
            .map(|item| coerce_value(item, kind, key, dn, ctx))
            .collect::<Result<Vec<_>>>()
            .map(Coerced::List),
        Shape::Extend => {
            let mut flattened = Vec::new();
            for item in as_array(value)? {
                match coerce_value(item, kind, key, dn, ctx)? {
                    Coerced::List(items) => flattened.extend(items),
                    Coerced::Absent => {}
                    other => flattened.push(other),
                }
            }
            Ok(Coerced::List(flattened))
        }
        Shape::Dict => {
            let entries = value
                .as_object()
                .ok_or_else(|| TmdbError::conversion("object", value))?;
            entries
                .iter()
                .map(|(entry_key, item)| {
                    let item_key = Key::Str(entry_key.clone());
                    coerce_value(item, kind, Some(&item_key), dn, ctx)
                        .map(|coerced| (entry_key.clone(), coerced))
                })
                .collect::<Result<BTreeMap<_, _>>>()
                .map(Coerced::Map)
        }
    }
}

fn as_array(value: &Value) -> Result<&Vec<Value>> {
    value
        .as_array()
        .ok_or_else(|| TmdbError::conversion("array", value))
}

/// Coerces a single, already located value.
fn coerce_value(
    value: &Value,
    kind: Kind,
    key: Option<&Key>,
    default_is_none: bool,
    ctx: &Context,
) -> Result<Coerced> {
    if value.is_null() {
        return Ok(single_default(kind, default_is_none));
    }
    construct(value, kind, key, ctx)
}

/// Dispatches one value to its kind's constructor.
#[allow(clippy::too_many_lines)]
fn construct(value: &Value, kind: Kind, key: Option<&Key>, ctx: &Context) -> Result<Coerced> {
    let keyed = || Seed::keyed(key.cloned());
    let coerced = match kind {
        Kind::Int => Coerced::Int(to_int(value)?),
        Kind::Float => Coerced::Float(to_float(value)?),
        Kind::Bool => to_bool(value),
        Kind::Date => to_date(value)?,
        Kind::Str => Coerced::Str(to_text(value)),
        Kind::Raw => Coerced::Raw(value.clone()),
        Kind::ImageUrl => match value.as_str() {
            Some(path) if !path.is_empty() => Coerced::Str(ctx.image_url(path)),
            _ => Coerced::Absent,
        },
        Kind::Rated => match value {
            Value::Number(_) => Coerced::Float(to_float(value)?),
            Value::Object(rating) => rating
                .get("value")
                .map(to_float)
                .transpose()?
                .map_or(Coerced::Absent, Coerced::Float),
            _ => Coerced::Absent,
        },
        Kind::ContentRating => Coerced::Map(
            as_array(value)?
                .iter()
                .filter_map(|entry| {
                    let country = entry.get("iso_3166_1")?.as_str()?;
                    let rating = entry.get("rating")?;
                    Some((String::from(country), Coerced::Str(to_text(rating))))
                })
                .collect(),
        ),
        Kind::ReleaseDatesByCountry => {
            let mut by_country = BTreeMap::new();
            for entry in as_array(value)? {
                let Some(country) = entry.get("iso_3166_1").and_then(Value::as_str) else {
                    continue;
                };
                let dates = coerce(
                    Some(entry),
                    &["release_dates"],
                    Kind::ReleaseDate,
                    &Options::list(),
                    ctx,
                )?;
                by_country.insert(String::from(country), dates);
            }
            Coerced::Map(by_country)
        }
        Kind::Country => lookup_code(value, "iso_3166_1")
            .and_then(|code| ctx.country(&code))
            .map_or(Coerced::Absent, |c| Coerced::object(Object::Country(c.clone()))),
        Kind::Language => lookup_code(value, "iso_639_1")
            .and_then(|code| ctx.language_entry(&code))
            .map_or(Coerced::Absent, |l| Coerced::object(Object::Language(l.clone()))),
        Kind::MovieGenre => lookup_id(value)
            .and_then(|id| ctx.movie_genre(id))
            .map_or(Coerced::Absent, |g| Coerced::object(Object::Genre(g.clone()))),
        Kind::TvGenre => lookup_id(value)
            .and_then(|id| ctx.tv_genre(id))
            .map_or(Coerced::Absent, |g| Coerced::object(Object::Genre(g.clone()))),
        Kind::AlternativeName => {
            Coerced::object(Object::AlternativeName(build(value, ctx, &keyed())?))
        }
        Kind::AlternativeTitle => {
            Coerced::object(Object::AlternativeTitle(build(value, ctx, &keyed())?))
        }
        Kind::Certification => Coerced::object(Object::Certification(build(value, ctx, &keyed())?)),
        Kind::LoadCountry => Coerced::object(Object::Country(build(value, ctx, &keyed())?)),
        Kind::CountryCertifications => {
            Coerced::object(Object::CountryCertifications(build(value, ctx, &keyed())?))
        }
        Kind::CountryWatchProviders => {
            Coerced::object(Object::CountryWatchProviders(build(value, ctx, &keyed())?))
        }
        Kind::LoadDepartment => Coerced::object(Object::Department(build(value, ctx, &keyed())?)),
        Kind::LoadGenre => Coerced::object(Object::Genre(build(value, ctx, &keyed())?)),
        Kind::Group => Coerced::object(Object::Group(build(value, ctx, &keyed())?)),
        Kind::LoadLanguage => Coerced::object(Object::Language(build(value, ctx, &keyed())?)),
        Kind::ReleaseDate => Coerced::object(Object::ReleaseDate(build(value, ctx, &keyed())?)),
        Kind::LoadTimezone => Coerced::object(Object::Timezones(build(value, ctx, &keyed())?)),
        Kind::Trailer => Coerced::object(Object::Trailer(build(value, ctx, &keyed())?)),
        Kind::Translation => Coerced::object(Object::Translation(build(value, ctx, &keyed())?)),
        Kind::User => Coerced::object(Object::User(build(value, ctx, &keyed())?)),
        Kind::Video => Coerced::object(Object::Video(build(value, ctx, &keyed())?)),
        Kind::WatchProvider => Coerced::object(Object::WatchProvider(build(value, ctx, &keyed())?)),
        Kind::Backdrop => image(value, ctx, ImageType::Backdrop)?,
        Kind::Logo => image(value, ctx, ImageType::Logo)?,
        Kind::Poster => image(value, ctx, ImageType::Poster)?,
        Kind::Profile => image(value, ctx, ImageType::Profile)?,
        Kind::Still => image(value, ctx, ImageType::Still)?,
        Kind::Tagged => Coerced::object(Object::Tagged(Tagged::new(value, ctx)?)),
        Kind::Collection => Coerced::object(Object::Collection(entity(value, ctx, keyed())?)),
        Kind::Company => Coerced::object(Object::Company(entity(value, ctx, keyed())?)),
        Kind::MovieCast => credit(value, ctx, "cast", "movie")?,
        Kind::MovieCrew => credit(value, ctx, "crew", "movie")?,
        Kind::TvCast => credit(value, ctx, "cast", "tv")?,
        Kind::TvCrew => credit(value, ctx, "crew", "tv")?,
        Kind::AggTvCast => aggregate_credits(value, ctx, "roles", "cast")?,
        Kind::AggTvCrew => aggregate_credits(value, ctx, "jobs", "crew")?,
        Kind::Keyword => Coerced::object(Object::Keyword(entity(value, ctx, keyed())?)),
        Kind::Movie => Coerced::object(Object::Movie(entity(value, ctx, keyed())?)),
        Kind::Network => Coerced::object(Object::Network(entity(value, ctx, keyed())?)),
        Kind::Person => Coerced::object(Object::Person(entity(value, ctx, keyed())?)),
        Kind::Review => Coerced::object(Object::Review(entity(value, ctx, keyed())?)),
        Kind::TvShow => Coerced::object(Object::TvShow(entity(value, ctx, keyed())?)),
        Kind::Season => Coerced::object(Object::Season(entity(value, ctx, keyed())?)),
        Kind::Episode => Coerced::object(Object::Episode(entity(value, ctx, keyed())?)),
        Kind::EpisodeGroup => Coerced::object(Object::EpisodeGroup(entity(value, ctx, keyed())?)),
        Kind::MediaType => match value
            .get("media_type")
            .and_then(Value::as_str)
            .and_then(Kind::from_media_type)
        {
            Some(media_kind) => construct(value, media_kind, key, ctx)?,
            None => Coerced::Absent,
        },
        Kind::List => {
            let id = value
                .get("id")
                .map(to_text)
                .ok_or_else(|| TmdbError::conversion("list", "payload without id"))?;
            Coerced::object(Object::List(PagedResult::summary(
                value,
                ctx,
                list_source(&id, ctx, None),
            )?))
        }
        Kind::MovieReviews => Coerced::object(Object::Reviews(nested(
            value, ctx, "movie", "reviews", key, Kind::Review,
        )?)),
        Kind::MovieLists => Coerced::object(Object::Lists(nested(
            value, ctx, "movie", "lists", key, Kind::List,
        )?)),
        Kind::RecommendedMovies => Coerced::object(Object::Movies(nested(
            value,
            ctx,
            "movie",
            "recommendations",
            key,
            Kind::Movie,
        )?)),
        Kind::SimilarMovies => Coerced::object(Object::Movies(nested(
            value, ctx, "movie", "similar", key, Kind::Movie,
        )?)),
        Kind::RecommendedTv => Coerced::object(Object::TvShows(nested(
            value,
            ctx,
            "tv",
            "recommendations",
            key,
            Kind::TvShow,
        )?)),
        Kind::SimilarTv => Coerced::object(Object::TvShows(nested(
            value, ctx, "tv", "similar", key, Kind::TvShow,
        )?)),
        Kind::TaggedImages => Coerced::object(Object::TaggedImages(nested(
            value,
            ctx,
            "person",
            "tagged_images",
            key,
            Kind::Tagged,
        )?)),
    };
    Ok(coerced)
}

/// Builds a partial entity from an embedded payload.
fn entity<D: crate::entity::Reload>(value: &Value, ctx: &Context, seed: Seed) -> Result<Entity<D>> {
    Entity::new(value.clone(), ctx, seed, true)
}

fn image(value: &Value, ctx: &Context, image_type: ImageType) -> Result<Coerced> {
    Ok(Coerced::object(Object::Image(Image::new(
        value, ctx, image_type,
    )?)))
}

fn credit(
    value: &Value,
    ctx: &Context,
    credit_type: &'static str,
    media_type: &'static str,
) -> Result<Coerced> {
    let seed = Seed::credit(credit_type, media_type);
    Ok(Coerced::object(Object::Credit(entity(value, ctx, seed)?)))
}

/// Expands an aggregate credit into one TV credit per entry of `roles_key`,
/// each entry overlaid on a copy of the shared person fields.
fn aggregate_credits(
    value: &Value,
    ctx: &Context,
    roles_key: &str,
    credit_type: &'static str,
) -> Result<Coerced> {
    let Some(base) = value.as_object() else {
        return Err(TmdbError::conversion("aggregate credit", value));
    };
    let roles = base
        .get(roles_key)
        .and_then(Value::as_array)
        .map_or(&[][..], Vec::as_slice);

    let mut credits = Vec::with_capacity(roles.len());
    for role in roles {
        let mut merged = base.clone();
        if let Some(fields) = role.as_object() {
            for (field, field_value) in fields {
                merged.insert(field.clone(), field_value.clone());
            }
        }
        credits.push(credit(&Value::Object(merged), ctx, credit_type, "tv")?);
    }
    Ok(Coerced::List(credits))
}

/// Builds an embedded page view such as `movie/{id}/recommendations`.
fn nested<T: FromCoerced>(
    value: &Value,
    ctx: &Context,
    parent: &str,
    endpoint: &str,
    key: Option<&Key>,
    element: Kind,
) -> Result<PagedResult<T>> {
    let parent_id = key.ok_or_else(|| {
        TmdbError::conversion(
            "embedded page",
            format!("{parent}/{endpoint} without parent id"),
        )
    })?;
    let request =
        ApiRequest::get(format!("{parent}/{parent_id}/{endpoint}")).query("language", ctx.language());
    PagedResult::from_payload(value, ctx, PageSource::listing(request, element))
}

/// Extracts a lowercase lookup code from a bare string or `{field: code}`.
fn lookup_code(value: &Value, field: &str) -> Option<String> {
    let code = match value {
        Value::Object(entries) => entries.get(field)?,
        other => other,
    };
    Some(to_text(code).to_lowercase())
}

/// Extracts a numeric id from a bare number or `{id}`.
fn lookup_id(value: &Value) -> Option<u64> {
    let id = match value {
        Value::Object(entries) => entries.get("id")?,
        other => other,
    };
    to_int(id).ok().and_then(|id| u64::try_from(id).ok())
}

/// Renders a value as text; strings are taken verbatim.
fn to_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

#[allow(clippy::as_conversions, clippy::cast_possible_truncation)]
fn to_int(value: &Value) -> Result<i64> {
    match value {
        Value::Number(number) => number
            .as_i64()
            .or_else(|| number.as_f64().map(|f| f.trunc() as i64))
            .ok_or_else(|| TmdbError::conversion("integer", number)),
        Value::String(text) => text
            .trim()
            .parse()
            .map_err(|_| TmdbError::conversion("integer", text)),
        Value::Bool(flag) => Ok(i64::from(*flag)),
        other => Err(TmdbError::conversion("integer", other)),
    }
}

fn to_float(value: &Value) -> Result<f64> {
    match value {
        Value::Number(number) => number
            .as_f64()
            .ok_or_else(|| TmdbError::conversion("float", number)),
        Value::String(text) => text
            .trim()
            .parse()
            .map_err(|_| TmdbError::conversion("float", text)),
        Value::Bool(flag) => Ok(if *flag { 1.0 } else { 0.0 }),
        other => Err(TmdbError::conversion("float", other)),
    }
}

fn to_bool(value: &Value) -> Coerced {
    if let Value::Bool(flag) = value {
        return Coerced::Bool(*flag);
    }
    match to_text(value).to_lowercase().as_str() {
        "t" | "true" | "1" | "y" | "yes" => Coerced::Bool(true),
        "f" | "false" | "0" | "n" | "no" => Coerced::Bool(false),
        _ => Coerced::Absent,
    }
}

fn to_date(value: &Value) -> Result<Coerced> {
    let Some(text) = value.as_str() else {
        return Err(TmdbError::conversion("date", value));
    };
    if text.is_empty() {
        return Ok(Coerced::Absent);
    }
    if text.contains('T') {
        let mut chars = text.chars();
        chars.next_back();
        let trimmed = chars.as_str();
        let stamp = trimmed.split('.').next().unwrap_or(trimmed);
        NaiveDateTime::parse_from_str(stamp, "%Y-%m-%dT%H:%M:%S")
            .map(Coerced::DateTime)
            .map_err(|_| TmdbError::conversion("date-time", text))
    } else {
        NaiveDate::parse_from_str(text, "%Y-%m-%d")
            .map(Coerced::Date)
            .map_err(|_| TmdbError::conversion("date", text))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::indexing_slicing)]
    #![allow(clippy::float_cmp)]

    use serde_json::json;

    use super::*;

    fn single(source: &Value, path: &[&str], kind: Kind) -> Coerced {
        coerce(Some(source), path, kind, &Options::single(), &Context::default()).unwrap()
    }

    #[test]
    fn test_missing_path_defaults_by_kind() {
        // Arrange
        let source = json!({"present": {"inner": 1}});
        let ctx = Context::default();

        // Act
        let int = coerce(Some(&source), &["missing"], Kind::Int, &Options::single(), &ctx).unwrap();
        let float = coerce(Some(&source), &["present", "nope"], Kind::Float, &Options::single(), &ctx)
            .unwrap();
        let list = coerce(Some(&source), &["missing"], Kind::Movie, &Options::list(), &ctx).unwrap();
        let extended =
            coerce(Some(&source), &["missing"], Kind::AggTvCast, &Options::extend(), &ctx).unwrap();
        let text = coerce(Some(&source), &["missing"], Kind::Str, &Options::single(), &ctx).unwrap();
        let object = coerce(None, &["id"], Kind::Movie, &Options::single(), &ctx).unwrap();

        // Assert
        assert!(matches!(int, Coerced::Int(0)));
        assert!(matches!(float, Coerced::Float(v) if v == 0.0));
        assert!(matches!(list, Coerced::List(ref v) if v.is_empty()));
        assert!(matches!(extended, Coerced::List(ref v) if v.is_empty()));
        assert!(text.is_absent());
        assert!(object.is_absent());
    }

    #[test]
    fn test_default_is_none_always_absent() {
        let source = json!({"value": null});
        let ctx = Context::default();
        for (kind, options) in [
            (Kind::Int, Options::single().default_none()),
            (Kind::Float, Options::single().default_none()),
            (Kind::Str, Options::list().default_none()),
            (Kind::Int, Options::extend().default_none()),
        ] {
            let missing = coerce(Some(&source), &["missing"], kind, &options, &ctx).unwrap();
            let null = coerce(Some(&source), &["value"], kind, &options, &ctx).unwrap();
            assert!(missing.is_absent(), "{kind:?} {options:?}");
            assert!(null.is_absent(), "{kind:?} {options:?}");
        }
    }

    #[test]
    fn test_bool_accepts_documented_spellings() {
        for truthy in [json!(true), json!("t"), json!("T"), json!("true"), json!("TRUE"), json!("1"), json!("y"), json!("yes"), json!(1)] {
            let coerced = single(&json!({"v": truthy}), &["v"], Kind::Bool);
            assert!(matches!(coerced, Coerced::Bool(true)), "{truthy}");
        }
        for falsy in [json!(false), json!("f"), json!("false"), json!("0"), json!("n"), json!("no")] {
            let coerced = single(&json!({"v": falsy}), &["v"], Kind::Bool);
            assert!(matches!(coerced, Coerced::Bool(false)), "{falsy}");
        }
        for other in [json!("maybe"), json!(""), json!("2")] {
            let coerced = single(&json!({"v": other}), &["v"], Kind::Bool);
            assert!(coerced.is_absent(), "{other}");
        }
    }

    #[test]
    fn test_date_formats() {
        // Arrange
        let source = json!({
            "day": "2020-12-25",
            "stamp": "2020-12-25T10:30:00.000Z",
            "plain_stamp": "2020-12-25T10:30:00Z",
            "empty": ""
        });

        // Act
        let day = NaiveDate::from_coerced(single(&source, &["day"], Kind::Date)).unwrap();
        let stamp = NaiveDateTime::from_coerced(single(&source, &["stamp"], Kind::Date)).unwrap();
        let plain = NaiveDateTime::from_coerced(single(&source, &["plain_stamp"], Kind::Date)).unwrap();
        let empty = single(&source, &["empty"], Kind::Date);

        // Assert
        let expected_day = NaiveDate::from_ymd_opt(2020, 12, 25).unwrap();
        let expected_stamp = expected_day.and_hms_opt(10, 30, 0).unwrap();
        assert_eq!(day, expected_day);
        assert_eq!(stamp, expected_stamp);
        assert_eq!(plain, expected_stamp);
        assert!(empty.is_absent());
    }

    #[test]
    fn test_empty_date_absent_even_with_default_none() {
        let source = json!({"d": ""});
        let coerced = coerce(
            Some(&source),
            &["d"],
            Kind::Date,
            &Options::single().default_none(),
            &Context::default(),
        )
        .unwrap();
        assert!(coerced.is_absent());
    }

    #[test]
    fn test_malformed_primitives_propagate() {
        let source = json!({"n": "abc", "d": "25/12/2020", "f": "x1"});
        let ctx = Context::default();

        let int = coerce(Some(&source), &["n"], Kind::Int, &Options::single(), &ctx);
        let date = coerce(Some(&source), &["d"], Kind::Date, &Options::single(), &ctx);
        let float = coerce(Some(&source), &["f"], Kind::Float, &Options::single(), &ctx);

        assert!(matches!(int, Err(TmdbError::Conversion { target: "integer", .. })));
        assert!(matches!(date, Err(TmdbError::Conversion { target: "date", .. })));
        assert!(matches!(float, Err(TmdbError::Conversion { target: "float", .. })));
    }

    #[test]
    fn test_numbers_from_text_and_floats() {
        let source = json!({"a": "42", "b": 7.9, "c": "2.5", "d": true});
        assert!(matches!(single(&source, &["a"], Kind::Int), Coerced::Int(42)));
        assert!(matches!(single(&source, &["b"], Kind::Int), Coerced::Int(7)));
        assert!(matches!(single(&source, &["c"], Kind::Float), Coerced::Float(v) if v == 2.5));
        assert!(matches!(single(&source, &["d"], Kind::Int), Coerced::Int(1)));
    }

    #[test]
    fn test_list_and_dict_shapes() {
        // Arrange
        let source = json!({
            "ids": [1, "2", null],
            "by_country": {"US": "PG-13", "DE": "12"}
        });
        let ctx = Context::default();

        // Act
        let ids = coerce(Some(&source), &["ids"], Kind::Int, &Options::list(), &ctx).unwrap();
        let map = coerce(Some(&source), &["by_country"], Kind::Str, &Options::dict(), &ctx).unwrap();

        // Assert
        let ids: Vec<i64> = Vec::from_coerced(ids).unwrap();
        assert_eq!(ids, vec![1, 2, 0]);
        let map: BTreeMap<String, String> = BTreeMap::from_coerced(map).unwrap();
        assert_eq!(map["US"], "PG-13");
        assert_eq!(map["DE"], "12");
    }

    #[test]
    fn test_list_shape_rejects_non_array() {
        let source = json!({"ids": {"a": 1}});
        let result = coerce(Some(&source), &["ids"], Kind::Int, &Options::list(), &Context::default());
        assert!(matches!(result, Err(TmdbError::Conversion { target: "array", .. })));
    }

    #[test]
    fn test_aggregate_cast_one_credit_per_role() {
        // Arrange
        let source = json!({
            "adult": false,
            "gender": 2,
            "id": 17419,
            "known_for_department": "Acting",
            "name": "Bryan Cranston",
            "roles": [
                {"credit_id": "52542282760ee313280017f9", "character": "Walter White", "episode_count": 62},
                {"credit_id": "5e8f5b5d98f1f10015d1f1a2", "character": "Heisenberg", "episode_count": 3}
            ],
            "total_episode_count": 65
        });

        // Act
        let coerced = coerce(Some(&source), &[], Kind::AggTvCast, &Options::single(), &Context::default())
            .unwrap();
        let credits: Vec<Credit> = Vec::from_coerced(coerced).unwrap();

        // Assert
        assert_eq!(credits.len(), 2);
        let first = credits[0].peek();
        let second = credits[1].peek();
        assert_eq!(first.name.as_deref(), Some("Bryan Cranston"));
        assert_eq!(second.name.as_deref(), Some("Bryan Cranston"));
        assert_eq!(first.person_id, Some(17419));
        assert_eq!(first.character.as_deref(), Some("Walter White"));
        assert_eq!(second.character.as_deref(), Some("Heisenberg"));
        assert_eq!(first.id.as_deref(), Some("52542282760ee313280017f9"));
        assert_eq!(second.id.as_deref(), Some("5e8f5b5d98f1f10015d1f1a2"));
        assert_eq!(first.credit_type.as_deref(), Some("cast"));
        assert_eq!(first.media_type.as_deref(), Some("tv"));
    }

    #[test]
    fn test_extend_flattens_aggregate_crew() {
        let source = json!({"crew": [
            {"id": 1, "name": "A", "jobs": [{"credit_id": "a1", "job": "Writer"}, {"credit_id": "a2", "job": "Director"}]},
            {"id": 2, "name": "B", "jobs": [{"credit_id": "b1", "job": "Producer"}]}
        ]});

        let coerced = coerce(Some(&source), &["crew"], Kind::AggTvCrew, &Options::extend(), &Context::default())
            .unwrap();
        let credits: Vec<Credit> = Vec::from_coerced(coerced).unwrap();

        assert_eq!(credits.len(), 3);
        assert_eq!(credits[2].peek().job.as_deref(), Some("Producer"));
        assert_eq!(credits[2].peek().credit_type.as_deref(), Some("crew"));
    }

    #[test]
    fn test_media_type_dispatch() {
        // Arrange
        let source = json!({"results": [
            {"media_type": "movie", "id": 1, "title": "Alien"},
            {"media_type": "tv", "id": 2, "name": "Lost"},
            {"media_type": "person", "id": 3, "name": "Sigourney Weaver"},
            {"media_type": "collection", "id": 4}
        ]});

        // Act
        let coerced = coerce(Some(&source), &["results"], Kind::MediaType, &Options::list(), &Context::default())
            .unwrap();
        let media: Vec<Media> = Vec::from_coerced(coerced).unwrap();

        // Assert
        assert_eq!(media.len(), 3);
        assert!(matches!(&media[0], Media::Movie(movie) if movie.peek().title.as_deref() == Some("Alien")));
        assert!(matches!(&media[1], Media::TvShow(show) if **show == 2_u64));
        assert!(matches!(&media[2], Media::Person(_)));
    }

    #[test]
    fn test_lookup_kinds_use_context_tables() {
        // Arrange
        let mut ctx = Context::default();
        ctx.insert_country(Country {
            iso_3166_1: Some(String::from("US")),
            name: Some(String::from("United States of America")),
            native_name: None,
        });
        ctx.insert_movie_genre(Genre {
            id: Some(28),
            name: Some(String::from("Action")),
        });
        let source = json!({
            "country": {"iso_3166_1": "US", "name": "United States"},
            "code": "us",
            "unknown": "zz",
            "genre_ids": [28, 99999]
        });

        // Act
        let from_object = coerce(Some(&source), &["country"], Kind::Country, &Options::single(), &ctx).unwrap();
        let from_code = coerce(Some(&source), &["code"], Kind::Country, &Options::single(), &ctx).unwrap();
        let unknown = coerce(Some(&source), &["unknown"], Kind::Country, &Options::single(), &ctx).unwrap();
        let genres = coerce(Some(&source), &["genre_ids"], Kind::MovieGenre, &Options::list(), &ctx).unwrap();

        // Assert
        let country = Country::from_coerced(from_object).unwrap();
        assert_eq!(country.name.as_deref(), Some("United States of America"));
        assert!(matches!(Country::from_coerced(from_code), Ok(_)));
        assert!(unknown.is_absent());
        let genres: Vec<Genre> = Vec::from_coerced(genres).unwrap();
        assert_eq!(genres.len(), 1);
        assert_eq!(genres[0].name.as_deref(), Some("Action"));
    }

    #[test]
    fn test_content_rating_and_rated() {
        let source = json!({
            "content_ratings": {"results": [
                {"iso_3166_1": "US", "rating": "TV-MA"},
                {"iso_3166_1": "DE", "rating": "16"}
            ]},
            "rated_number": 7.5,
            "rated_object": {"value": 8.0},
            "rated_false": false
        });

        let ratings = single(&source, &["content_ratings", "results"], Kind::ContentRating);
        let ratings: BTreeMap<String, String> = BTreeMap::from_coerced(ratings).unwrap();
        assert_eq!(ratings["US"], "TV-MA");
        assert_eq!(ratings.len(), 2);

        assert!(matches!(single(&source, &["rated_number"], Kind::Rated), Coerced::Float(v) if v == 7.5));
        assert!(matches!(single(&source, &["rated_object"], Kind::Rated), Coerced::Float(v) if v == 8.0));
        assert!(single(&source, &["rated_false"], Kind::Rated).is_absent());
    }

    #[test]
    fn test_image_url_prefixes_base() {
        let source = json!({"poster_path": "/abc.jpg", "empty": ""});
        let url = String::from_coerced(single(&source, &["poster_path"], Kind::ImageUrl)).unwrap();
        assert_eq!(url, "https://image.tmdb.org/t/p/original/abc.jpg");
        assert!(single(&source, &["empty"], Kind::ImageUrl).is_absent());
    }

    #[test]
    fn test_wrong_object_kind_is_conversion_error() {
        let source = json!({"id": 1, "title": "Alien"});
        let coerced = single(&source, &[], Kind::Movie);
        let result = TvShow::from_coerced(coerced);
        assert!(matches!(result, Err(TmdbError::Conversion { target: "TvShow", .. })));
    }
}
