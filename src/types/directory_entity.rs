//! Entity records returned by the directory.

use serde::{Deserialize, Serialize};

use super::entity_ref::EntityRef;

/// Relation type linking a group to each of its members.
pub const RELATION_HAS_MEMBER: &str = "hasMember";

/// A directed relation from an entity to `target_ref`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Relation {
    #[serde(rename = "type")]
    pub relation_type: String,
    pub target_ref: EntityRef,
}

impl Relation {
    pub fn new(relation_type: impl Into<String>, target_ref: EntityRef) -> Self {
        Self {
            relation_type: relation_type.into(),
            target_ref,
        }
    }

    pub fn has_member(target_ref: EntityRef) -> Self {
        Self::new(RELATION_HAS_MEMBER, target_ref)
    }
}

/// The directory's record for an entity, as far as the engine reads it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryEntity {
    pub entity_ref: EntityRef,
    #[serde(default)]
    pub relations: Vec<Relation>,
}

impl DirectoryEntity {
    pub fn new(entity_ref: EntityRef, relations: Vec<Relation>) -> Self {
        Self {
            entity_ref,
            relations,
        }
    }

    /// Targets of every `hasMember` relation.
    pub fn members(&self) -> impl Iterator<Item = &EntityRef> {
        self.relations
            .iter()
            .filter(|r| r.relation_type == RELATION_HAS_MEMBER)
            .map(|r| &r.target_ref)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_members_only_reads_has_member() {
        let entity = DirectoryEntity::new(
            EntityRef::group("realm", "ops"),
            vec![
                Relation::has_member(EntityRef::user("alice")),
                Relation::new("childOf", EntityRef::group("realm", "eng")),
                Relation::has_member(EntityRef::user("bob")),
            ],
        );
        let members: Vec<String> = entity.members().map(|m| m.to_string()).collect();
        assert_eq!(members, vec!["user:default/alice", "user:default/bob"]);
    }

    #[test]
    fn test_deserialize_directory_payload() {
        let entity: DirectoryEntity = serde_json::from_value(serde_json::json!({
            "entityRef": "group:realm/platform-admins",
            "relations": [
                { "type": "hasMember", "targetRef": "user:realm/alice" },
                { "type": "memberOf", "targetRef": "group:realm/everyone" }
            ]
        }))
        .unwrap();
        assert_eq!(entity.entity_ref, EntityRef::group("realm", "platform-admins"));
        assert_eq!(entity.members().count(), 1);
    }

    #[test]
    fn test_deserialize_without_relations() {
        let entity: DirectoryEntity = serde_json::from_value(serde_json::json!({
            "entityRef": "group:realm/empty"
        }))
        .unwrap();
        assert_eq!(entity.members().count(), 0);
    }
}
