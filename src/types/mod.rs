//! Data model types for requests, decisions and directory records.
//!
//! Canonical string forms:
//! - Identity reference: `kind:namespace/name`, e.g. `group:realm/platform-admins`
//! - Bare names default to kind `user` in namespace `default`: `alice` is `user:default/alice`
//!
//! All identity components are compared case-insensitively.

mod admin;
mod decision;
mod directory_entity;
mod entity_ref;
mod request;

pub use admin::{AdminEntry, ResolvedAdminSet};
pub use decision::{DecisionPath, DefaultDecision, PolicyDecision};
pub use directory_entity::{DirectoryEntity, RELATION_HAS_MEMBER, Relation};
pub use entity_ref::{DEFAULT_NAMESPACE, EntityRef, KIND_GROUP, KIND_USER};
pub use request::PermissionRequest;
