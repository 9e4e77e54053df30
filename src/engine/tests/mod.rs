use std::sync::Arc;
use std::time::Duration;

use super::*;
use crate::config::CacheConfig;
use crate::directory::GroupLookupFailure;
use crate::test_helpers::{
    CountingDirectory, FailingSubPolicy, FixedSubPolicy, PLATFORM_ADMIN_MEMBERS, PLATFORM_ADMINS,
    RecordingSink, platform_admins_directory,
};

mod concurrency;

const CATALOG: &str = "catalog";
const TTL: Duration = Duration::from_secs(30 * 60);
const DEGRADED_TTL: Duration = Duration::from_secs(60);

/// Platform admins plus a directly listed user, with `catalog.*` delegated.
fn base_config() -> EngineConfig {
    EngineConfig::new([PLATFORM_ADMINS, "user:realm/dave"]).with_domain(CATALOG, ["catalog.*"])
}

struct Fixture {
    engine: DecisionEngine,
    directory: Arc<CountingDirectory>,
    sub_policy: Arc<FixedSubPolicy>,
    sink: Arc<RecordingSink>,
}

fn fixture_with(
    config: EngineConfig,
    directory: CountingDirectory,
    sub_decision: PolicyDecision,
) -> Fixture {
    let directory = Arc::new(directory);
    let sub_policy = Arc::new(FixedSubPolicy::new(sub_decision));
    let sink = RecordingSink::new();
    let engine = DecisionEngine::builder(config)
        .directory(directory.clone())
        .sub_policy(CATALOG, sub_policy.clone())
        .metrics_sink(sink.clone())
        .build()
        .expect("engine should build");
    Fixture {
        engine,
        directory,
        sub_policy,
        sink,
    }
}

fn fixture() -> Fixture {
    fixture_with(
        base_config(),
        CountingDirectory::new(platform_admins_directory()),
        PolicyDecision::deny_because("catalog rule: not an owner"),
    )
}

fn request(permission: &str, requester: &str) -> PermissionRequest {
    PermissionRequest::new(
        permission,
        requester.parse().expect("test requester should parse"),
    )
}

fn assert_allow(decision: &PolicyDecision) {
    assert!(
        matches!(decision, PolicyDecision::Allow { .. }),
        "expected Allow, got {decision}"
    );
}

fn assert_deny(decision: &PolicyDecision) {
    assert!(
        matches!(decision, PolicyDecision::Deny { .. }),
        "expected Deny, got {decision}"
    );
}
