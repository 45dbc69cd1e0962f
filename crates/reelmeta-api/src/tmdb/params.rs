//! Request parameter types and their validation.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;

use crate::context::Context;
use crate::error::{Result, TmdbError};

/// Parameter names accepted by `discover/movie`.
pub const DISCOVER_MOVIE_OPTIONS: [&str; 36] = [
    "region",
    "sort_by",
    "certification_country",
    "certification",
    "certification.lte",
    "certification.gte",
    "include_adult",
    "include_video",
    "primary_release_year",
    "primary_release_date.gte",
    "primary_release_date.lte",
    "release_date.gte",
    "release_date.lte",
    "with_release_type",
    "year",
    "vote_count.gte",
    "vote_count.lte",
    "vote_average.gte",
    "vote_average.lte",
    "with_cast",
    "with_crew",
    "with_people",
    "with_companies",
    "with_genres",
    "without_genres",
    "with_keywords",
    "without_keywords",
    "with_runtime.gte",
    "with_runtime.lte",
    "with_original_language",
    "with_watch_providers",
    "watch_region",
    "with_watch_monetization_types",
    "without_companies",
    "with_title_translation",
    "with_overview_translation",
];

/// Sort keys accepted by `discover/movie`.
pub const DISCOVER_MOVIE_SORTS: [&str; 14] = [
    "popularity.asc",
    "popularity.desc",
    "release_date.asc",
    "release_date.desc",
    "revenue.asc",
    "revenue.desc",
    "primary_release_date.asc",
    "primary_release_date.desc",
    "original_title.asc",
    "original_title.desc",
    "vote_average.asc",
    "vote_average.desc",
    "vote_count.asc",
    "vote_count.desc",
];

/// Parameter names accepted by `discover/tv`.
pub const DISCOVER_TV_OPTIONS: [&str; 30] = [
    "sort_by",
    "air_date.gte",
    "air_date.lte",
    "first_air_date.gte",
    "first_air_date.lte",
    "first_air_date_year",
    "timezone",
    "vote_average.gte",
    "vote_average.lte",
    "vote_count.gte",
    "vote_count.lte",
    "with_genres",
    "with_networks",
    "without_genres",
    "with_runtime.gte",
    "with_runtime.lte",
    "include_null_first_air_dates",
    "with_original_language",
    "without_keywords",
    "screened_theatrically",
    "with_companies",
    "with_keywords",
    "with_watch_providers",
    "watch_region",
    "with_watch_monetization_types",
    "with_status",
    "with_type",
    "without_companies",
    "with_name_translation",
    "with_overview_translation",
];

/// Sort keys accepted by `discover/tv`.
pub const DISCOVER_TV_SORTS: [&str; 6] = [
    "popularity.asc",
    "popularity.desc",
    "first_air_date.desc",
    "first_air_date.asc",
    "vote_average.asc",
    "vote_average.desc",
];

const CERTIFICATION_KEYS: [&str; 3] = ["certification", "certification.lte", "certification.gte"];

const BOOL_KEYS: [&str; 4] = [
    "include_adult",
    "include_video",
    "include_null_first_air_dates",
    "screened_theatrically",
];

const DATE_KEYS: [&str; 8] = [
    "primary_release_date.gte",
    "primary_release_date.lte",
    "release_date.gte",
    "release_date.lte",
    "air_date.gte",
    "air_date.lte",
    "first_air_date.gte",
    "first_air_date.lte",
];

const INT_KEYS: [&str; 6] = [
    "primary_release_year",
    "first_air_date_year",
    "vote_count.gte",
    "vote_count.lte",
    "with_runtime.gte",
    "with_runtime.lte",
];

const VOTE_AVERAGE_KEYS: [&str; 2] = ["vote_average.gte", "vote_average.lte"];

const MONETIZATION_TYPES: [&str; 5] = ["flatrate", "free", "ads", "rent", "buy"];

/// One discover parameter value.
#[derive(Debug, Clone, PartialEq)]
pub enum DiscoverValue {
    /// Text, passed through.
    Text(String),
    /// Integer.
    Int(i64),
    /// Number.
    Float(f64),
    /// Flag.
    Bool(bool),
    /// Calendar date.
    Date(NaiveDate),
    /// Values joined with `,`.
    List(Vec<String>),
}

impl fmt::Display for DiscoverValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => f.write_str(text),
            Self::Int(value) => write!(f, "{value}"),
            Self::Float(value) => write!(f, "{value}"),
            Self::Bool(value) => write!(f, "{value}"),
            Self::Date(date) => write!(f, "{}", date.format("%Y-%m-%d")),
            Self::List(values) => f.write_str(&values.join(",")),
        }
    }
}

impl From<&str> for DiscoverValue {
    fn from(value: &str) -> Self {
        Self::Text(String::from(value))
    }
}

impl From<String> for DiscoverValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for DiscoverValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for DiscoverValue {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<u32> for DiscoverValue {
    fn from(value: u32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<u64> for DiscoverValue {
    fn from(value: u64) -> Self {
        Self::Int(i64::try_from(value).unwrap_or(i64::MAX))
    }
}

impl From<f64> for DiscoverValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for DiscoverValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<NaiveDate> for DiscoverValue {
    fn from(value: NaiveDate) -> Self {
        Self::Date(value)
    }
}

impl<V: ToString> From<Vec<V>> for DiscoverValue {
    fn from(values: Vec<V>) -> Self {
        Self::List(values.iter().map(ToString::to_string).collect())
    }
}

impl<V: ToString> From<&[V]> for DiscoverValue {
    fn from(values: &[V]) -> Self {
        Self::List(values.iter().map(ToString::to_string).collect())
    }
}

/// Parameters for `discover/movie` and `discover/tv`.
///
/// Values are checked when the request is made, against the option list
/// of the endpoint used.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiscoverParams {
    params: Vec<(String, DiscoverValue)>,
}

impl DiscoverParams {
    /// Creates an empty parameter set.
    #[must_use]
    pub const fn new() -> Self {
        Self { params: Vec::new() }
    }

    /// Adds (or replaces) a parameter.
    #[must_use]
    pub fn param(mut self, key: &str, value: impl Into<DiscoverValue>) -> Self {
        let value = value.into();
        if let Some(entry) = self.params.iter_mut().find(|(k, _)| k == key) {
            entry.1 = value;
        } else {
            self.params.push((String::from(key), value));
        }
        self
    }

    fn contains(&self, key: &str) -> bool {
        self.params.iter().any(|(k, _)| k == key)
    }

    /// Validates every parameter and renders it as a query value.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` naming the first offending parameter.
    pub fn validate(&self, movie: bool, ctx: &Context) -> Result<Vec<(String, String)>> {
        let (options, sorts): (&[&str], &[&str]) = if movie {
            (&DISCOVER_MOVIE_OPTIONS, &DISCOVER_MOVIE_SORTS)
        } else {
            (&DISCOVER_TV_OPTIONS, &DISCOVER_TV_SORTS)
        };

        let mut validated = Vec::with_capacity(self.params.len());
        for (key, value) in &self.params {
            let key = key.as_str();
            if !options.contains(&key) {
                return Err(TmdbError::invalid(format!("{key} is not a valid parameter")));
            }
            let rendered = match key {
                "sort_by" => {
                    let sort = value.to_string();
                    if !sorts.contains(&sort.as_str()) {
                        return Err(TmdbError::invalid(format!("{sort} is not a valid sort_by option")));
                    }
                    sort
                }
                "region" => ctx.validate_country(&value.to_string())?,
                "certification_country" => {
                    if !CERTIFICATION_KEYS.iter().any(|k| self.contains(k)) {
                        return Err(TmdbError::invalid(
                            "certification_country must be used with either certification, certification.lte, or certification.gte",
                        ));
                    }
                    value.to_string()
                }
                k if CERTIFICATION_KEYS.contains(&k) => {
                    if !self.contains("certification_country") {
                        return Err(TmdbError::invalid(
                            "certification must be used with certification_country",
                        ));
                    }
                    value.to_string()
                }
                k if BOOL_KEYS.contains(&k) => match value {
                    DiscoverValue::Bool(flag) => flag.to_string(),
                    _ => return Err(TmdbError::invalid(format!("{k} must be either true or false"))),
                },
                k if DATE_KEYS.contains(&k) => match value {
                    DiscoverValue::Date(date) => date.format("%Y-%m-%d").to_string(),
                    other => validate_date(&other.to_string()).map_err(|_| {
                        TmdbError::invalid(format!(
                            "{k} must be a date or match pattern YYYY-MM-DD (e.g. 2020-12-25)"
                        ))
                    })?,
                },
                k if INT_KEYS.contains(&k) => match value {
                    DiscoverValue::Int(n) if *n >= 1 => n.to_string(),
                    _ => {
                        return Err(TmdbError::invalid(format!(
                            "{k} must be an integer greater then 0"
                        )));
                    }
                },
                k if VOTE_AVERAGE_KEYS.contains(&k) => match value {
                    DiscoverValue::Float(n) if *n >= 1.0 => n.to_string(),
                    _ => {
                        return Err(TmdbError::invalid(format!(
                            "{k} must be a number greater then 0.0"
                        )));
                    }
                },
                "with_watch_monetization_types" => {
                    if !self.contains("watch_region") {
                        return Err(TmdbError::invalid(
                            "with_watch_monetization_types must be used with watch_region",
                        ));
                    }
                    let kind = value.to_string();
                    if !MONETIZATION_TYPES.contains(&kind.as_str()) {
                        return Err(TmdbError::invalid(format!(
                            "{kind} is not a valid with_watch_monetization_types option. Options: [flatrate, free, ads, rent, or buy]"
                        )));
                    }
                    kind
                }
                _ => value.to_string(),
            };
            validated.push((String::from(key), rendered));
        }
        Ok(validated)
    }
}

/// Normalizes a `YYYY-MM-DD` date.
///
/// # Errors
///
/// `InvalidArgument` when the text is not a valid date.
pub fn validate_date(text: &str) -> Result<String> {
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .map(|date| date.format("%Y-%m-%d").to_string())
        .map_err(|_| {
            TmdbError::invalid(format!("date: {text} must be a date in the format YYYY-MM-DD"))
        })
}

/// Media filter of the trending endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrendingMedia {
    /// Movies, shows and people.
    All,
    /// Movies.
    Movie,
    /// TV shows.
    Tv,
    /// People.
    Person,
}

impl TrendingMedia {
    /// Path segment.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Movie => "movie",
            Self::Tv => "tv",
            Self::Person => "person",
        }
    }
}

impl FromStr for TrendingMedia {
    type Err = TmdbError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "all" => Ok(Self::All),
            "movie" => Ok(Self::Movie),
            "tv" => Ok(Self::Tv),
            "person" => Ok(Self::Person),
            _ => Err(TmdbError::invalid(format!(
                "media_type: {s} Invalid. Options: all, movie, tv, or person"
            ))),
        }
    }
}

/// Time window of the trending endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeWindow {
    /// Last day.
    Day,
    /// Last week.
    Week,
}

impl TimeWindow {
    /// Path segment.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Day => "day",
            Self::Week => "week",
        }
    }
}

impl FromStr for TimeWindow {
    type Err = TmdbError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "day" => Ok(Self::Day),
            "week" => Ok(Self::Week),
            _ => Err(TmdbError::invalid(format!(
                "time_window: {s} Invalid. Options: day or week"
            ))),
        }
    }
}

/// Optional filters of the search endpoints. Each endpoint only sends the
/// filters it understands.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchOptions {
    /// Include adult titles and people.
    pub include_adult: Option<bool>,
    /// ISO 3166-1 region (movie, multi and person searches).
    pub region: Option<String>,
    /// Release year (movie search).
    pub year: Option<u32>,
    /// Primary release year (movie search).
    pub primary_release_year: Option<u32>,
    /// First air date year (TV search).
    pub first_air_date_year: Option<u32>,
}

/// External ids accepted by `find/{id}`. The first id set, in field order,
/// is used.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FindQuery {
    /// IMDb id.
    pub imdb_id: Option<String>,
    /// Freebase MID.
    pub freebase_mid: Option<String>,
    /// Freebase id.
    pub freebase_id: Option<String>,
    /// TVDB id.
    pub tvdb_id: Option<u64>,
    /// TVRage id.
    pub tvrage_id: Option<u64>,
    /// Facebook id.
    pub facebook_id: Option<String>,
    /// Twitter id.
    pub twitter_id: Option<String>,
    /// Instagram id.
    pub instagram_id: Option<String>,
}

impl FindQuery {
    /// The external id and its `external_source` name.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` when no id is set.
    pub fn source(&self) -> Result<(String, &'static str)> {
        let text = [
            (&self.imdb_id, "imdb_id"),
            (&self.freebase_mid, "freebase_mid"),
            (&self.freebase_id, "freebase_id"),
        ];
        let numeric = [(self.tvdb_id, "tvdb_id"), (self.tvrage_id, "tvrage_id")];
        let social = [
            (&self.facebook_id, "facebook_id"),
            (&self.twitter_id, "twitter_id"),
            (&self.instagram_id, "instagram_id"),
        ];

        text.into_iter()
            .find_map(|(id, source)| id.clone().map(|id| (id, source)))
            .or_else(|| {
                numeric
                    .into_iter()
                    .find_map(|(id, source)| id.map(|id| (id.to_string(), source)))
            })
            .or_else(|| {
                social
                    .into_iter()
                    .find_map(|(id, source)| id.clone().map(|id| (id, source)))
            })
            .ok_or_else(|| TmdbError::invalid("At least one ID is required"))
    }
}
