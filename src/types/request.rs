//! Permission request type.

use std::fmt::{Display, Formatter, Result as FmtResult};

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::entity_ref::EntityRef;

/// A request to authorize `requester` for `permission`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq, Hash)]
pub struct PermissionRequest {
    /// Permission name, e.g. `catalog.entity.read`
    pub permission: String,
    /// Identity reference of the caller, e.g. `user:default/alice`
    #[schema(value_type = String)]
    pub requester: EntityRef,
}

impl PermissionRequest {
    pub fn new(permission: impl Into<String>, requester: EntityRef) -> Self {
        Self {
            permission: permission.into(),
            requester,
        }
    }
}

impl Display for PermissionRequest {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{} -> {}", self.requester, self.permission)
    }
}
