//! The session's TMDB account.

use crate::coerce::{Kind, Options};
use crate::context::Context;
use crate::entity::{Entity, EntityId, Fields, FromPayload, Reload, Seed, lazy_fields};
use crate::error::Result;
use crate::transport::ApiRequest;

use super::{Country, Language};

/// The authenticated v3 account.
pub type Account = Entity<AccountData>;

lazy_fields! {
    /// Fields of an [`Account`].
    pub struct AccountData {
        /// Gravatar hash.
        pub avatar_hash: Option<String>,
        /// TMDB avatar path.
        pub avatar_path: Option<String>,
        /// Full avatar URL.
        pub avatar_url: Option<String>,
        /// Default country.
        pub country: Option<Country>,
        /// v3 account id.
        pub id: Option<u64>,
        /// Include adult titles in searches.
        pub include_adult: Option<bool>,
        /// Default ISO 3166-1 code.
        pub iso_3166_1: Option<String>,
        /// Default ISO 639-1 code.
        pub iso_639_1: Option<String>,
        /// Default language.
        pub language: Option<Language>,
        /// Display name.
        pub name: Option<String>,
        /// Username.
        pub username: Option<String>,
    }
}

impl FromPayload for AccountData {
    fn populate(f: &mut Fields<'_>) -> Result<Self> {
        Ok(Self {
            avatar_hash: f.at("avatar_hash", &["avatar", "gravatar", "hash"], Kind::Str)?,
            avatar_path: f.at("avatar_path", &["avatar", "tmdb", "avatar_path"], Kind::Str)?,
            avatar_url: f.image_url("avatar_url", &["avatar", "tmdb", "avatar_path"])?,
            country: f.at("country", &["iso_3166_1"], Kind::Country)?,
            id: f.get("id", &["id"], Kind::Int, Options::single().default_none())?,
            include_adult: f.one("include_adult", Kind::Bool)?,
            iso_3166_1: f.one("iso_3166_1", Kind::Str)?,
            iso_639_1: f.one("iso_639_1", Kind::Str)?,
            language: f.at("language", &["iso_639_1"], Kind::Language)?,
            name: f.one("name", Kind::Str)?,
            username: f.one("username", Kind::Str)?,
        })
    }
}

impl Reload for AccountData {
    const KIND: &'static str = "account";

    fn identity(&self) -> Option<EntityId> {
        self.id.map(EntityId::Int)
    }

    fn label(&self) -> Option<String> {
        self.name.clone().filter(|name| !name.is_empty()).or_else(|| self.username.clone())
    }

    fn load_request(&self, _: &Seed, _: &Context, _: Option<&str>) -> Result<ApiRequest> {
        Ok(ApiRequest::get("account").with_session())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use serde_json::json;

    use super::*;

    #[test]
    fn test_account_falls_back_to_username_label() {
        let payload = json!({
            "id": 548,
            "name": "",
            "username": "travisbell",
            "include_adult": false,
            "iso_639_1": "en",
            "iso_3166_1": "CA",
            "avatar": {"gravatar": {"hash": "c9e9fc152ee756a900db85757c29815d"}, "tmdb": {"avatar_path": null}}
        });

        let account = Account::from_json(payload, &Context::default(), false).unwrap();

        assert_eq!(account.to_string(), "[548:travisbell]");
        assert_eq!(account.peek().avatar_hash.as_deref(), Some("c9e9fc152ee756a900db85757c29815d"));
        assert!(account.peek().avatar_url.is_none());
        assert_eq!(account.peek().include_adult, Some(false));
    }

    #[test]
    fn test_account_load_needs_session() {
        let account = Account::from_json(json!({}), &Context::default(), true).unwrap();

        let request = account.peek().load_request(account.seed(), &Context::default(), None).unwrap();

        assert_eq!(request.path, "account");
        assert!(request.session);
    }
}
