//! Expansion of configured administrator entries into user identities.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::future::join_all;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::error::{DirectoryError, PolicyError};
use crate::traits::DirectoryClient;
use crate::types::{AdminEntry, DirectoryEntity, EntityRef, Relation, ResolvedAdminSet};

/// What to do when a group entry cannot be expanded.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum GroupLookupFailure {
    /// Leave the group's members out and mark the admin set as degraded.
    #[default]
    Skip,
    /// Fail the whole admin set computation.
    Abort,
}

/// Flattens [`AdminEntry`] lists into the set of administrator identities.
pub struct AdminDirectory {
    client: Arc<dyn DirectoryClient>,
    lookup_timeout: Duration,
    on_failure: GroupLookupFailure,
}

impl AdminDirectory {
    pub fn new(
        client: Arc<dyn DirectoryClient>,
        lookup_timeout: Duration,
        on_failure: GroupLookupFailure,
    ) -> Self {
        Self {
            client,
            lookup_timeout,
            on_failure,
        }
    }

    /// Resolve `entries` into a fresh [`ResolvedAdminSet`].
    ///
    /// User entries are taken as they are. Group entries are looked up
    /// concurrently and replaced by the targets of their `hasMember` relations.
    pub async fn resolve_admins(
        &self,
        entries: &[AdminEntry],
    ) -> Result<ResolvedAdminSet, PolicyError> {
        let (groups, users): (Vec<&AdminEntry>, Vec<&AdminEntry>) =
            entries.iter().unique().partition(|entry| entry.is_group());

        let mut members: HashSet<EntityRef> =
            users.into_iter().map(|u| u.entity_ref().clone()).collect();

        let lookups = groups
            .into_iter()
            .map(|entry| async move { (entry, self.lookup(entry.entity_ref()).await) });

        let mut unresolved = Vec::new();
        for (entry, result) in join_all(lookups).await {
            match result {
                Ok(Some(entity)) => {
                    let before = members.len();
                    members.extend(entity.members().cloned());
                    debug!(
                        event = "AdminResolution",
                        phase = "GroupExpanded",
                        group = entry.to_string(),
                        added = members.len() - before
                    );
                }
                Ok(None) => {
                    warn!(
                        event = "AdminResolution",
                        phase = "GroupMissing",
                        group = entry.to_string()
                    );
                }
                Err(err) => match self.on_failure {
                    GroupLookupFailure::Skip => {
                        warn!(
                            event = "AdminResolution",
                            phase = "GroupSkipped",
                            group = entry.to_string(),
                            error = err.to_string()
                        );
                        unresolved.push(entry.clone());
                    }
                    GroupLookupFailure::Abort => {
                        warn!(
                            event = "AdminResolution",
                            phase = "Aborted",
                            group = entry.to_string(),
                            error = err.to_string()
                        );
                        return Err(PolicyError::DirectoryLookup {
                            entity: entry.to_string(),
                            message: err.to_string(),
                        });
                    }
                },
            }
        }

        Ok(ResolvedAdminSet::new(members, unresolved))
    }

    async fn lookup(&self, group: &EntityRef) -> Result<Option<DirectoryEntity>, DirectoryError> {
        timeout(self.lookup_timeout, self.client.get_entity(group))
            .await
            .unwrap_or(Err(DirectoryError::Timeout(self.lookup_timeout)))
    }
}

/// An in-memory directory, for embedding fixed group memberships.
#[derive(Debug, Clone, Default)]
pub struct StaticDirectory {
    entities: HashMap<EntityRef, DirectoryEntity>,
}

impl StaticDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `group` with `members` as its `hasMember` targets.
    pub fn with_group<I>(mut self, group: EntityRef, members: I) -> Self
    where
        I: IntoIterator<Item = EntityRef>,
    {
        let relations = members.into_iter().map(Relation::has_member).collect();
        self.entities
            .insert(group.clone(), DirectoryEntity::new(group, relations));
        self
    }

    pub fn with_entity(mut self, entity: DirectoryEntity) -> Self {
        self.entities.insert(entity.entity_ref.clone(), entity);
        self
    }
}

#[async_trait]
impl DirectoryClient for StaticDirectory {
    async fn get_entity(
        &self,
        entity: &EntityRef,
    ) -> Result<Option<DirectoryEntity>, DirectoryError> {
        Ok(self.entities.get(entity).cloned())
    }
}
