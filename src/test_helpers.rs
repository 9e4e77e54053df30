//! Stub collaborators shared by the unit tests.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::directory::StaticDirectory;
use crate::error::{DirectoryError, SubPolicyError};
use crate::metrics::{AdminRefreshStats, EvaluationPhases, EvaluationStats, MetricsSink};
use crate::traits::{DirectoryClient, SubPolicy};
use crate::types::{DirectoryEntity, EntityRef, PermissionRequest, PolicyDecision};

pub(crate) const PLATFORM_ADMINS: &str = "group:realm/platform-admins";
pub(crate) const PLATFORM_ADMIN_MEMBERS: [&str; 3] =
    ["user:realm/alice", "user:realm/bob", "user:realm/carol"];

/// `group:realm/platform-admins` with three members.
pub(crate) fn platform_admins_directory() -> StaticDirectory {
    StaticDirectory::new().with_group(
        EntityRef::group("realm", "platform-admins"),
        PLATFORM_ADMIN_MEMBERS.map(|m| m.parse::<EntityRef>().unwrap()),
    )
}

/// Wraps a [`StaticDirectory`], counting lookups and optionally slowing or failing them.
pub(crate) struct CountingDirectory {
    inner: StaticDirectory,
    calls: AtomicUsize,
    delay: Option<Duration>,
    failing: HashSet<EntityRef>,
}

impl CountingDirectory {
    pub(crate) fn new(inner: StaticDirectory) -> Self {
        Self {
            inner,
            calls: AtomicUsize::new(0),
            delay: None,
            failing: HashSet::new(),
        }
    }

    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub(crate) fn failing_on(mut self, group: EntityRef) -> Self {
        self.failing.insert(group);
        self
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DirectoryClient for CountingDirectory {
    async fn get_entity(
        &self,
        entity: &EntityRef,
    ) -> Result<Option<DirectoryEntity>, DirectoryError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing.contains(entity) {
            return Err(DirectoryError::Unavailable(format!("{entity} is unreachable")));
        }
        self.inner.get_entity(entity).await
    }
}

/// Returns a fixed decision and records every call.
pub(crate) struct FixedSubPolicy {
    decision: PolicyDecision,
    calls: Mutex<Vec<(String, EntityRef)>>,
}

impl FixedSubPolicy {
    pub(crate) fn new(decision: PolicyDecision) -> Self {
        Self {
            decision,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn calls(&self) -> Vec<(String, EntityRef)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl SubPolicy for FixedSubPolicy {
    async fn evaluate(
        &self,
        request: &PermissionRequest,
        requester: &EntityRef,
    ) -> Result<PolicyDecision, SubPolicyError> {
        self.calls
            .lock()
            .unwrap()
            .push((request.permission.clone(), requester.clone()));
        Ok(self.decision.clone())
    }
}

/// Always fails.
pub(crate) struct FailingSubPolicy;

#[async_trait]
impl SubPolicy for FailingSubPolicy {
    async fn evaluate(
        &self,
        _request: &PermissionRequest,
        _requester: &EntityRef,
    ) -> Result<PolicyDecision, SubPolicyError> {
        Err(SubPolicyError::new("catalog", "rules backend unreachable"))
    }
}

/// Collects everything the engine reports.
#[derive(Default)]
pub(crate) struct RecordingSink {
    pub(crate) evaluations: Mutex<Vec<EvaluationStats>>,
    pub(crate) refreshes: Mutex<Vec<AdminRefreshStats>>,
    pub(crate) phases: Mutex<Vec<EvaluationPhases>>,
}

impl RecordingSink {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }
}

impl MetricsSink for RecordingSink {
    fn on_evaluation(&self, stats: &EvaluationStats) {
        self.evaluations.lock().unwrap().push(stats.clone());
    }

    fn on_admin_refresh(&self, stats: &AdminRefreshStats) {
        self.refreshes.lock().unwrap().push(stats.clone());
    }

    fn on_evaluation_phases(&self, _stats: &EvaluationStats, phases: &EvaluationPhases) {
        self.phases.lock().unwrap().push(phases.clone());
    }
}
