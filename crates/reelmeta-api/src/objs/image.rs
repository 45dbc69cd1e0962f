//! Images and tagged images.

use std::fmt;

use serde_json::Value;

use crate::coerce::{FromCoerced, Kind, Options, coerce};
use crate::context::Context;
use crate::entity::{Fields, Seed};
use crate::error::Result;

use super::{Language, Media};

/// What an image depicts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageType {
    /// Backdrop.
    Backdrop,
    /// Logo.
    Logo,
    /// Poster.
    Poster,
    /// Profile picture.
    Profile,
    /// Episode still.
    Still,
}

impl ImageType {
    fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "backdrop" => Some(Self::Backdrop),
            "logo" => Some(Self::Logo),
            "poster" => Some(Self::Poster),
            "profile" => Some(Self::Profile),
            "still" => Some(Self::Still),
            _ => None,
        }
    }
}

impl fmt::Display for ImageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Backdrop => "Backdrop",
            Self::Logo => "Logo",
            Self::Poster => "Poster",
            Self::Profile => "Profile",
            Self::Still => "Still",
        })
    }
}

/// Image file of an entity.
#[derive(Debug, Clone, PartialEq)]
pub struct Image {
    /// What the image depicts.
    pub image_type: ImageType,
    /// Width over height.
    pub aspect_ratio: f64,
    /// Path relative to the image base.
    pub file_path: Option<String>,
    /// File extension, e.g. `.jpg`.
    pub file_type: Option<String>,
    /// Height in pixels.
    pub height: u64,
    /// Image id.
    pub id: Option<String>,
    /// Language code of any text in the image.
    pub iso_639_1: Option<String>,
    /// Language looked up from the code.
    pub language: Option<Language>,
    /// Full image URL.
    pub url: Option<String>,
    /// Average vote.
    pub vote_average: f64,
    /// Number of votes.
    pub vote_count: u64,
    /// Width in pixels.
    pub width: u64,
}

impl Image {
    /// Builds an image of `image_type` from its payload.
    ///
    /// # Errors
    ///
    /// Propagates coercion failures.
    pub fn new(value: &Value, ctx: &Context, image_type: ImageType) -> Result<Self> {
        let seed = Seed::default();
        let mut fields = Fields::new(value, ctx, &seed);
        Ok(Self {
            image_type,
            aspect_ratio: fields.one("aspect_ratio", Kind::Float)?,
            file_path: fields.one("file_path", Kind::Str)?,
            file_type: fields.one("file_type", Kind::Str)?,
            height: fields.one("height", Kind::Int)?,
            id: fields.one("id", Kind::Str)?,
            iso_639_1: fields.one("iso_639_1", Kind::Str)?,
            language: fields.at("language", &["iso_639_1"], Kind::Language)?,
            url: fields.image_url("url", &["file_path"])?,
            vote_average: fields.one("vote_average", Kind::Float)?,
            vote_count: fields.one("vote_count", Kind::Int)?,
            width: fields.one("width", Kind::Int)?,
        })
    }
}

impl fmt::Display for Image {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}:{}]",
            self.image_type,
            self.file_path.as_deref().unwrap_or_default()
        )
    }
}

/// Image a person was tagged in, with the media it belongs to.
#[derive(Debug, Clone, PartialEq)]
pub struct Tagged {
    /// The image itself.
    pub image: Image,
    /// `movie` or `tv`.
    pub media_type: Option<String>,
    /// Media the image belongs to.
    pub media: Option<Media>,
}

impl Tagged {
    /// Builds a tagged image from its payload.
    ///
    /// # Errors
    ///
    /// Propagates coercion failures.
    pub fn new(value: &Value, ctx: &Context) -> Result<Self> {
        let image_type = value
            .get("image_type")
            .and_then(Value::as_str)
            .and_then(ImageType::from_tag)
            .unwrap_or(ImageType::Backdrop);
        let media_type = value
            .get("media_type")
            .and_then(Value::as_str)
            .map(String::from);

        // The embedded media carries no discriminator of its own.
        let media = match (value.get("media"), &media_type) {
            (Some(Value::Object(media)), Some(media_type)) => {
                let mut media = media.clone();
                media
                    .entry("media_type")
                    .or_insert_with(|| Value::String(media_type.clone()));
                Option::from_coerced(coerce(
                    Some(&Value::Object(media)),
                    &[],
                    Kind::MediaType,
                    &Options::single(),
                    ctx,
                )?)?
            }
            _ => None,
        };

        Ok(Self {
            image: Image::new(value, ctx, image_type)?,
            media_type,
            media,
        })
    }
}

impl fmt::Display for Tagged {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.image.fmt(f)
    }
}
