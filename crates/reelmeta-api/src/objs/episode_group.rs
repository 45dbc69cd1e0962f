//! Alternative episode orderings of a show.

use crate::coerce::Kind;
use crate::context::Context;
use crate::entity::{Entity, EntityId, Fields, FromPayload, Reload, Seed, lazy_fields};
use crate::error::Result;
use crate::transport::ApiRequest;

use super::{Group, Network, require_id};

/// An episode group.
pub type EpisodeGroup = Entity<EpisodeGroupData>;

lazy_fields! {
    /// Fields of an [`EpisodeGroup`].
    pub struct EpisodeGroupData {
        /// Description.
        pub description: Option<String>,
        /// Episodes across all groups.
        pub episode_count: u64,
        /// Number of groups.
        pub group_count: u64,
        /// Groups.
        pub groups: Vec<Group>,
        /// Episode group id.
        pub id: Option<String>,
        /// Name.
        pub name: Option<String>,
        /// Network the ordering comes from.
        pub network: Option<Box<Network>>,
        /// Group type code.
        pub group_type: u64,
    }
}

impl FromPayload for EpisodeGroupData {
    fn populate(f: &mut Fields<'_>) -> Result<Self> {
        Ok(Self {
            description: f.one("description", Kind::Str)?,
            episode_count: f.one("episode_count", Kind::Int)?,
            group_count: f.one("group_count", Kind::Int)?,
            groups: f.list("groups", &["groups"], Kind::Group)?,
            id: f.one("id", Kind::Str)?,
            name: f.one("name", Kind::Str)?,
            network: f.one("network", Kind::Network)?,
            group_type: f.at("group_type", &["type"], Kind::Int)?,
        })
    }
}

impl Reload for EpisodeGroupData {
    const KIND: &'static str = "episode group";

    fn identity(&self) -> Option<EntityId> {
        self.id.clone().map(EntityId::Str)
    }

    fn label(&self) -> Option<String> {
        self.name.clone()
    }

    fn load_request(&self, _: &Seed, ctx: &Context, _: Option<&str>) -> Result<ApiRequest> {
        let id = require_id(self.id.as_ref(), Self::KIND)?;
        Ok(ApiRequest::get(format!("tv/episode_group/{id}")).query("language", ctx.language()))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::indexing_slicing)]

    use serde_json::json;

    use super::*;
    use crate::testing::MockTransport;
    use crate::tmdb::Tmdb;

    #[tokio::test]
    async fn test_stub_group_loads_groups() {
        // Arrange
        let transport = MockTransport::new().route(
            "tv/episode_group/5acf93e60e0a26346d0000ce",
            json!({
                "id": "5acf93e60e0a26346d0000ce",
                "name": "Production order",
                "type": 6,
                "group_count": 1,
                "episode_count": 1,
                "network": {"id": 49, "name": "HBO"},
                "groups": [{"id": "g1", "name": "Season 1", "order": 1, "locked": true, "episodes": [
                    {"id": 63056, "show_id": 1399, "season_number": 1, "episode_number": 1, "order": 0}
                ]}]
            }),
        );
        let tmdb = Tmdb::from_parts(transport, Context::default());
        let mut group = EpisodeGroup::from_json(
            json!({"id": "5acf93e60e0a26346d0000ce"}),
            tmdb.context(),
            true,
        )
        .unwrap();

        // Act
        let groups = group.groups(&tmdb).await.unwrap().clone();

        // Assert
        assert_eq!(groups[0].episodes[0].peek().tv_id, Some(1399));
        assert_eq!(group.peek().group_type, 6);
        assert_eq!(group.peek().network.as_ref().unwrap().peek().id, Some(49));
        assert_eq!(tmdb.transport().count("tv/episode_group/5acf93e60e0a26346d0000ce"), 1);
    }
}
