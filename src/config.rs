//! Startup configuration for the decision engine.
//!
//! ```json
//! {
//!   "admins": ["group:realm/platform-admins", "alice"],
//!   "defaultDecision": "allow",
//!   "onGroupLookupFailure": "skip",
//!   "cache": { "ttlSecs": 1800, "degradedTtlSecs": 60, "lookupTimeoutSecs": 10 },
//!   "domains": { "catalog": { "permissions": ["catalog.*"] } }
//! }
//! ```

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::classify::PermissionPattern;
use crate::directory::GroupLookupFailure;
use crate::error::PolicyError;
use crate::types::{AdminEntry, DEFAULT_NAMESPACE, DefaultDecision};

const DEFAULT_TTL_SECS: u64 = 30 * 60;
const DEFAULT_DEGRADED_TTL_SECS: u64 = 60;
const DEFAULT_LOOKUP_TIMEOUT_SECS: u64 = 10;
/// One year; longer cache and timeout settings are rejected.
const MAX_DURATION_SECS: u64 = 365 * 24 * 60 * 60;

fn default_namespace() -> String {
    DEFAULT_NAMESPACE.to_string()
}

/// Cache and directory timing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct CacheConfig {
    /// How long a fully resolved admin set stays valid
    pub ttl_secs: u64,
    /// How long a degraded admin set stays valid before failed groups are retried
    pub degraded_ttl_secs: u64,
    /// Timeout for each directory lookup
    pub lookup_timeout_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: DEFAULT_TTL_SECS,
            degraded_ttl_secs: DEFAULT_DEGRADED_TTL_SECS,
            lookup_timeout_secs: DEFAULT_LOOKUP_TIMEOUT_SECS,
        }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    pub fn degraded_ttl(&self) -> Duration {
        Duration::from_secs(self.degraded_ttl_secs)
    }

    pub fn lookup_timeout(&self) -> Duration {
        Duration::from_secs(self.lookup_timeout_secs)
    }
}

/// Permissions handed to a domain's sub-policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DomainConfig {
    /// Exact permission names or prefix globs such as `catalog.*`
    pub permissions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct EngineConfig {
    /// Administrator identity references; groups are expanded through the directory
    pub admins: Vec<String>,
    #[serde(default = "default_namespace")]
    pub default_namespace: String,
    #[serde(default)]
    pub default_decision: DefaultDecision,
    #[serde(default)]
    pub on_group_lookup_failure: GroupLookupFailure,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub domains: BTreeMap<String, DomainConfig>,
}

impl EngineConfig {
    /// A configuration with the given admins and every other setting at its default.
    pub fn new<I, S>(admins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            admins: admins.into_iter().map(Into::into).collect(),
            default_namespace: default_namespace(),
            default_decision: DefaultDecision::default(),
            on_group_lookup_failure: GroupLookupFailure::default(),
            cache: CacheConfig::default(),
            domains: BTreeMap::new(),
        }
    }

    /// Parse and validate a JSON document.
    pub fn from_json_str(text: &str) -> Result<Self, PolicyError> {
        let config: EngineConfig = serde_json::from_str(text)?;
        config.validate()?;
        debug!(
            event = "Config",
            phase = "Loaded",
            admins = config.admins.len(),
            domains = config.domains.len()
        );
        Ok(config)
    }

    pub fn with_domain<I, S>(mut self, name: impl Into<String>, permissions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.domains.insert(
            name.into(),
            DomainConfig {
                permissions: permissions.into_iter().map(Into::into).collect(),
            },
        );
        self
    }

    pub fn with_default_decision(mut self, decision: DefaultDecision) -> Self {
        self.default_decision = decision;
        self
    }

    pub fn with_group_lookup_failure(mut self, policy: GroupLookupFailure) -> Self {
        self.on_group_lookup_failure = policy;
        self
    }

    pub fn with_cache(mut self, cache: CacheConfig) -> Self {
        self.cache = cache;
        self
    }

    /// Check everything that would otherwise fail at request time.
    pub fn validate(&self) -> Result<(), PolicyError> {
        if self.admins.is_empty() {
            return Err(PolicyError::Config(
                "at least one administrator entry is required".to_string(),
            ));
        }
        if self.default_namespace.trim().is_empty() {
            return Err(PolicyError::Config(
                "defaultNamespace must not be empty".to_string(),
            ));
        }
        self.admin_entries()?;

        for (field, secs) in [
            ("ttlSecs", self.cache.ttl_secs),
            ("degradedTtlSecs", self.cache.degraded_ttl_secs),
            ("lookupTimeoutSecs", self.cache.lookup_timeout_secs),
        ] {
            if !(1..=MAX_DURATION_SECS).contains(&secs) {
                return Err(PolicyError::Config(format!(
                    "cache.{field} must be between 1 and {MAX_DURATION_SECS}, got {secs}"
                )));
            }
        }

        for (name, domain) in &self.domains {
            if domain.permissions.is_empty() {
                return Err(PolicyError::Config(format!(
                    "domain '{name}' lists no permissions"
                )));
            }
            for raw in &domain.permissions {
                PermissionPattern::parse(raw).map_err(|e| {
                    PolicyError::Config(format!("domain '{name}': {e}"))
                })?;
            }
        }
        Ok(())
    }

    /// Parse the configured administrator list.
    pub fn admin_entries(&self) -> Result<Vec<AdminEntry>, PolicyError> {
        self.admins
            .iter()
            .map(|raw| {
                AdminEntry::parse(raw, &self.default_namespace)
                    .map_err(|e| PolicyError::Config(format!("admin entry '{raw}': {e}")))
            })
            .collect()
    }
}
