use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use itertools::Itertools;
use tracing::{debug, info, warn};

use crate::cache::{AdminCache, AdminSetResult};
use crate::classify::PermissionClassifier;
use crate::config::EngineConfig;
use crate::directory::AdminDirectory;
use crate::error::PolicyError;
use crate::metrics::{
    AdminRefreshStats, EvaluationPhases, EvaluationStats, MetricsSink, NoOpSink,
};
use crate::timers::PhaseTimer;
use crate::traits::{DirectoryClient, SubPolicy};
use crate::types::{
    AdminEntry, DecisionPath, DefaultDecision, EntityRef, KIND_USER, PermissionRequest,
    PolicyDecision,
};

/// Cache key used by engines that own their cache.
pub const DEFAULT_CACHE_KEY: &str = "admins";

struct EngineInner {
    admins: Arc<Vec<AdminEntry>>,
    directory: Arc<AdminDirectory>,
    cache: Arc<AdminCache<String>>,
    cache_key: String,
    ttl: Duration,
    classifier: PermissionClassifier,
    sub_policies: HashMap<String, Arc<dyn SubPolicy>>,
    default_decision: DefaultDecision,
    default_namespace: String,
    metrics: Arc<dyn MetricsSink>,
}

/// The main engine handle. Cloneable and thread-safe.
#[derive(Clone)]
pub struct DecisionEngine {
    inner: Arc<EngineInner>,
}

impl DecisionEngine {
    pub fn builder(config: EngineConfig) -> DecisionEngineBuilder {
        DecisionEngineBuilder::new(config)
    }

    /// Decide whether `request.requester` holds `request.permission`.
    ///
    /// 1. Administrators are allowed everything.
    /// 2. Permissions owned by a delegated domain get that domain's sub-policy
    ///    decision, unchanged.
    /// 3. Everything else gets the configured default decision.
    ///
    /// Never fails: an unavailable admin set or a failing sub-policy is a `Deny`.
    pub async fn evaluate(&self, request: &PermissionRequest) -> PolicyDecision {
        let started = Instant::now();
        let mut admin_lookup = Duration::ZERO;
        let mut delegate = Duration::ZERO;

        debug!(
            event = "Request",
            phase = "Evaluation",
            permission = request.permission.as_str(),
            requester = request.requester.to_string()
        );

        let admins = {
            let _timer = PhaseTimer::new(&mut admin_lookup);
            self.admins().await
        };

        let (decision, path, domain) = match admins {
            Err(err) => {
                warn!(
                    event = "Request",
                    phase = "AdminSet",
                    permission = request.permission.as_str(),
                    error = err.to_string()
                );
                (
                    PolicyDecision::deny_because(format!("administrator set unavailable: {err}")),
                    DecisionPath::AdminSetUnavailable,
                    None,
                )
            }
            Ok(admins) if admins.contains(&request.requester) => (
                PolicyDecision::allow_because("requester is an administrator"),
                DecisionPath::Administrator,
                None,
            ),
            Ok(_) => match self.inner.classifier.classify(&request.permission) {
                Some(domain) => {
                    let decision = {
                        let _timer = PhaseTimer::new(&mut delegate);
                        self.delegate(domain, request).await
                    };
                    (decision, DecisionPath::Delegated, Some(domain.to_string()))
                }
                None => (
                    self.inner.default_decision.decide(&request.permission),
                    DecisionPath::Default,
                    None,
                ),
            },
        };

        let duration = started.elapsed();
        debug!(
            event = "Request",
            phase = "Result",
            path = path.to_string(),
            domain = domain.as_deref().unwrap_or("-"),
            decision = decision.to_string()
        );

        let stats = EvaluationStats {
            duration,
            allowed: decision.is_allow(),
            path,
            domain,
            permission: request.permission.clone(),
            requester: request.requester.to_string(),
        };
        self.inner.metrics.on_evaluation(&stats);
        self.inner.metrics.on_evaluation_phases(
            &stats,
            &EvaluationPhases {
                admin_lookup_ms: admin_lookup.as_secs_f64() * 1_000.0,
                delegate_ms: delegate.as_secs_f64() * 1_000.0,
                total_ms: duration.as_secs_f64() * 1_000.0,
            },
        );

        decision
    }

    async fn delegate(&self, domain: &str, request: &PermissionRequest) -> PolicyDecision {
        let Some(policy) = self.inner.sub_policies.get(domain) else {
            // The builder rejects domains without a sub-policy.
            return PolicyDecision::deny_because(format!("no sub-policy for domain '{domain}'"));
        };

        match policy.evaluate(request, &request.requester).await {
            Ok(decision) => decision,
            Err(err) => {
                warn!(
                    event = "Request",
                    phase = "Delegation",
                    domain,
                    permission = request.permission.as_str(),
                    error = err.to_string()
                );
                PolicyDecision::deny_because(err.to_string())
            }
        }
    }

    /// The current administrator set, recomputed if the cached one expired.
    pub async fn admins(&self) -> AdminSetResult {
        let inner = &self.inner;
        inner
            .cache
            .get_or_compute(&inner.cache_key, inner.ttl, || {
                let directory = Arc::clone(&inner.directory);
                let entries = Arc::clone(&inner.admins);
                let metrics = Arc::clone(&inner.metrics);
                async move {
                    let started = Instant::now();
                    let result = directory.resolve_admins(&entries).await;
                    let duration = started.elapsed();

                    let (admins, unresolved) = result
                        .as_ref()
                        .map(|set| (set.len(), set.unresolved().len()))
                        .unwrap_or_default();
                    info!(
                        event = "AdminSet",
                        phase = "Refreshed",
                        admins,
                        unresolved,
                        failed = result.is_err(),
                        duration_ms = duration.as_millis() as u64
                    );
                    metrics.on_admin_refresh(&AdminRefreshStats {
                        duration,
                        admins,
                        unresolved,
                        failed: result.is_err(),
                    });
                    result
                }
            })
            .await
    }

    /// Drop the cached administrator set and compute a fresh one.
    pub async fn refresh_admins(&self) -> AdminSetResult {
        self.inner.cache.invalidate(&self.inner.cache_key);
        self.admins().await
    }

    pub async fn is_admin(&self, identity: &EntityRef) -> Result<bool, PolicyError> {
        Ok(self.admins().await?.contains(identity))
    }

    /// Parse a requester reference, filling a missing namespace from the
    /// configured `defaultNamespace` the same way admin entries are parsed.
    ///
    /// `EntityRef::from_str` always falls back to `default`; use this when
    /// requesters arrive as bare names.
    pub fn parse_requester(&self, raw: &str) -> Result<EntityRef, PolicyError> {
        EntityRef::parse_with_defaults(raw, KIND_USER, &self.inner.default_namespace)
    }

    /// Build a request whose requester is parsed with [`Self::parse_requester`].
    pub fn request(
        &self,
        permission: impl Into<String>,
        requester: &str,
    ) -> Result<PermissionRequest, PolicyError> {
        Ok(PermissionRequest::new(permission, self.parse_requester(requester)?))
    }

    pub fn default_decision(&self) -> DefaultDecision {
        self.inner.default_decision
    }

    pub fn cache_key(&self) -> &str {
        &self.inner.cache_key
    }
}

/// Wires an engine from its configuration and collaborators.
pub struct DecisionEngineBuilder {
    config: EngineConfig,
    directory: Option<Arc<dyn DirectoryClient>>,
    sub_policies: HashMap<String, Arc<dyn SubPolicy>>,
    metrics: Option<Arc<dyn MetricsSink>>,
    shared_cache: Option<(Arc<AdminCache<String>>, String)>,
}

impl DecisionEngineBuilder {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            directory: None,
            sub_policies: HashMap::new(),
            metrics: None,
            shared_cache: None,
        }
    }

    pub fn directory(mut self, directory: Arc<dyn DirectoryClient>) -> Self {
        self.directory = Some(directory);
        self
    }

    /// Register the sub-policy for a domain listed in the configuration.
    pub fn sub_policy(mut self, domain: impl Into<String>, policy: Arc<dyn SubPolicy>) -> Self {
        self.sub_policies.insert(domain.into(), policy);
        self
    }

    pub fn metrics_sink(mut self, sink: Arc<dyn MetricsSink>) -> Self {
        self.metrics = Some(sink);
        self
    }

    /// Use `cache` under `key` instead of a cache private to this engine.
    pub fn shared_cache(mut self, cache: Arc<AdminCache<String>>, key: impl Into<String>) -> Self {
        self.shared_cache = Some((cache, key.into()));
        self
    }

    pub fn build(self) -> Result<DecisionEngine, PolicyError> {
        let config = self.config;
        config.validate()?;

        let directory = self.directory.ok_or_else(|| {
            PolicyError::Config("a directory client is required".to_string())
        })?;

        let classifier = PermissionClassifier::new(&config.domains)?;
        let missing = classifier
            .domains()
            .filter(|d| !self.sub_policies.contains_key(*d))
            .collect_vec();
        if !missing.is_empty() {
            return Err(PolicyError::Config(format!(
                "no sub-policy registered for domain(s): {}",
                missing.join(", ")
            )));
        }
        let unknown = self
            .sub_policies
            .keys()
            .filter(|d| !config.domains.contains_key(*d))
            .sorted()
            .collect_vec();
        if !unknown.is_empty() {
            return Err(PolicyError::Config(format!(
                "sub-policy registered for unconfigured domain(s): {}",
                unknown.into_iter().join(", ")
            )));
        }

        let admins = config.admin_entries()?;
        let (cache, cache_key) = self.shared_cache.unwrap_or_else(|| {
            (
                Arc::new(AdminCache::new(config.cache.degraded_ttl())),
                DEFAULT_CACHE_KEY.to_string(),
            )
        });

        info!(
            event = "Engine",
            phase = "Built",
            admins = admins.iter().join(", "),
            domains = classifier.domains().join(", "),
            default_decision = config.default_decision.to_string(),
            on_group_lookup_failure = config.on_group_lookup_failure.to_string(),
            cache_key = cache_key.as_str()
        );

        Ok(DecisionEngine {
            inner: Arc::new(EngineInner {
                admins: Arc::new(admins),
                directory: Arc::new(AdminDirectory::new(
                    directory,
                    config.cache.lookup_timeout(),
                    config.on_group_lookup_failure,
                )),
                cache,
                cache_key,
                ttl: config.cache.ttl(),
                classifier,
                sub_policies: self.sub_policies,
                default_decision: config.default_decision,
                default_namespace: config.default_namespace,
                metrics: self.metrics.unwrap_or_else(|| Arc::new(NoOpSink)),
            }),
        })
    }
}

#[cfg(test)]
mod tests;
