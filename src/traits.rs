use async_trait::async_trait;

use crate::error::{DirectoryError, SubPolicyError};
use crate::types::{DirectoryEntity, EntityRef, PermissionRequest, PolicyDecision};

/// Anything that can look up entity records, e.g. a catalog client.
///
/// Authentication towards the backing service is the implementation's concern.
#[async_trait]
pub trait DirectoryClient: Send + Sync {
    /// Fetch the record for `entity`, or `None` if the directory does not know it.
    async fn get_entity(
        &self,
        entity: &EntityRef,
    ) -> Result<Option<DirectoryEntity>, DirectoryError>;
}

/// A domain-specific evaluator for permissions outside the administrator fast path.
///
/// Its decision is returned to the caller unchanged.
#[async_trait]
pub trait SubPolicy: Send + Sync {
    async fn evaluate(
        &self,
        request: &PermissionRequest,
        requester: &EntityRef,
    ) -> Result<PolicyDecision, SubPolicyError>;
}
