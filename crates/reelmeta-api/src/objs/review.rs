//! User reviews.

use chrono::NaiveDateTime;

use crate::coerce::{Kind, Options};
use crate::context::Context;
use crate::entity::{Entity, EntityId, Fields, FromPayload, Reload, Seed, lazy_fields};
use crate::error::Result;
use crate::transport::ApiRequest;

use super::{Language, require_id};

/// A review of a movie or show.
pub type Review = Entity<ReviewData>;

lazy_fields! {
    /// Fields of a [`Review`].
    pub struct ReviewData {
        /// Author display name.
        pub author: Option<String>,
        /// Author avatar path.
        pub avatar_path: Option<String>,
        /// Full author avatar URL.
        pub avatar_url: Option<String>,
        /// Review text.
        pub content: Option<String>,
        /// Creation time.
        pub created_at: Option<NaiveDateTime>,
        /// Review id.
        pub id: Option<String>,
        /// ISO 639-1 code.
        pub iso_639_1: Option<String>,
        /// Language looked up from the code.
        pub language: Option<Language>,
        /// Id of the reviewed title.
        pub media_id: Option<u64>,
        /// Title of the reviewed title.
        pub media_title: Option<String>,
        /// `movie` or `tv`.
        pub media_type: Option<String>,
        /// Author's rating.
        pub rating: Option<f64>,
        /// Last update time.
        pub updated_at: Option<NaiveDateTime>,
        /// Review page.
        pub url: Option<String>,
        /// Author username.
        pub username: Option<String>,
    }
}

impl FromPayload for ReviewData {
    fn populate(f: &mut Fields<'_>) -> Result<Self> {
        let optional = || Options::single().default_none();
        let id = if f.has("review_id") {
            f.at("id", &["review_id"], Kind::Str)?
        } else {
            f.one("id", Kind::Str)?
        };

        Ok(Self {
            author: f.one("author", Kind::Str)?,
            avatar_path: f.at("avatar_path", &["author_details", "avatar_path"], Kind::Str)?,
            avatar_url: f.image_url("avatar_url", &["author_details", "avatar_path"])?,
            content: f.one("content", Kind::Str)?,
            created_at: f.one("created_at", Kind::Date)?,
            id,
            iso_639_1: f.one("iso_639_1", Kind::Str)?,
            language: f.at("language", &["iso_639_1"], Kind::Language)?,
            media_id: f.get("media_id", &["media_id"], Kind::Int, optional())?,
            media_title: f.one("media_title", Kind::Str)?,
            media_type: f.one("media_type", Kind::Str)?,
            rating: f.get("rating", &["author_details", "rating"], Kind::Float, optional())?,
            updated_at: f.one("updated_at", Kind::Date)?,
            url: f.one("url", Kind::Str)?,
            username: f.at("username", &["author_details", "username"], Kind::Str)?,
        })
    }
}

impl Reload for ReviewData {
    const KIND: &'static str = "review";

    fn identity(&self) -> Option<EntityId> {
        self.id.clone().map(EntityId::Str)
    }

    fn label(&self) -> Option<String> {
        self.author.clone()
    }

    fn load_request(&self, _: &Seed, _: &Context, _: Option<&str>) -> Result<ApiRequest> {
        let id = require_id(self.id.as_ref(), Self::KIND)?;
        Ok(ApiRequest::get(format!("review/{id}")))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]

    use serde_json::json;

    use super::*;

    #[test]
    fn test_review_author_details_and_timestamps() {
        let payload = json!({
            "id": "5488c29bc3a3686f4a00004a",
            "author": "Travis Bell",
            "author_details": {"username": "travisbell", "avatar_path": null, "rating": 7.0},
            "content": "Great movie.",
            "created_at": "2014-12-10T22:04:43.421Z",
            "media_id": 118_340,
            "media_type": "Movie"
        });

        let review = Review::from_json(payload, &Context::default(), false).unwrap();
        let data = review.peek();

        assert_eq!(review.to_string(), "[5488c29bc3a3686f4a00004a:Travis Bell]");
        assert_eq!(data.username.as_deref(), Some("travisbell"));
        assert_eq!(data.rating, Some(7.0));
        assert!(data.avatar_url.is_none());
        assert_eq!(data.created_at.unwrap().to_string(), "2014-12-10 22:04:43");
        assert_eq!(data.media_id, Some(118_340));
    }

    #[test]
    fn test_review_id_prefers_review_id_key() {
        let review = Review::from_json(
            json!({"id": 1, "review_id": "abc", "author": "x"}),
            &Context::default(),
            true,
        )
        .unwrap();

        assert_eq!(review.peek().id.as_deref(), Some("abc"));
        assert_eq!(review.peek().load_request(review.seed(), &Context::default(), None).unwrap().path, "review/abc");
    }
}
