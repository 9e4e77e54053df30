//! Configured administrator entries and the flattened administrator set.

use std::collections::HashSet;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::time::SystemTime;

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::error::PolicyError;

use super::entity_ref::{EntityRef, KIND_USER};

/// A single configured administrator, either a user or a group to expand.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AdminEntry(EntityRef);

impl AdminEntry {
    /// Parse a configured entry, defaulting to kind `user` in `default_namespace`.
    pub fn parse(raw: &str, default_namespace: &str) -> Result<Self, PolicyError> {
        EntityRef::parse_with_defaults(raw, KIND_USER, default_namespace).map(AdminEntry)
    }

    pub fn entity_ref(&self) -> &EntityRef {
        &self.0
    }

    pub fn is_group(&self) -> bool {
        self.0.is_group()
    }
}

impl From<EntityRef> for AdminEntry {
    fn from(entity: EntityRef) -> Self {
        AdminEntry(entity)
    }
}

impl Display for AdminEntry {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.0)
    }
}

/// An immutable snapshot of every identity that counts as an administrator.
///
/// `unresolved` lists the group entries whose expansion failed while this
/// snapshot was computed; a snapshot with unresolved entries is degraded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedAdminSet {
    members: HashSet<EntityRef>,
    unresolved: Vec<AdminEntry>,
    computed_at: SystemTime,
}

impl ResolvedAdminSet {
    pub fn new(members: HashSet<EntityRef>, unresolved: Vec<AdminEntry>) -> Self {
        Self {
            members,
            unresolved,
            computed_at: SystemTime::now(),
        }
    }

    pub fn contains(&self, identity: &EntityRef) -> bool {
        self.members.contains(identity)
    }

    pub fn members(&self) -> &HashSet<EntityRef> {
        &self.members
    }

    pub fn unresolved(&self) -> &[AdminEntry] {
        &self.unresolved
    }

    pub fn is_degraded(&self) -> bool {
        !self.unresolved.is_empty()
    }

    pub fn computed_at(&self) -> SystemTime {
        self.computed_at
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

impl Display for ResolvedAdminSet {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "[{}]", self.members.iter().sorted().join(", "))
    }
}
