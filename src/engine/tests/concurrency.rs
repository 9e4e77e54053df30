use futures::future::join_all;

use super::*;

fn slow_fixture(delay: Duration) -> Fixture {
    fixture_with(
        base_config(),
        CountingDirectory::new(platform_admins_directory()).with_delay(delay),
        PolicyDecision::deny(),
    )
}

#[test]
fn test_engine_is_send_sync_and_clone() {
    fn assert_traits<T: Send + Sync + Clone + 'static>() {}
    assert_traits::<DecisionEngine>();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_evaluations_share_one_computation() {
    let fx = slow_fixture(Duration::from_millis(100));

    let handles = (0..50)
        .map(|i| {
            let engine = fx.engine.clone();
            let requester = if i % 2 == 0 {
                "user:realm/alice"
            } else {
                "user:default/eve"
            };
            tokio::spawn(async move { engine.evaluate(&request("entity.read", requester)).await })
        })
        .collect::<Vec<_>>();

    let decisions = join_all(handles)
        .await
        .into_iter()
        .map(|joined| joined.unwrap())
        .collect::<Vec<_>>();

    assert_eq!(fx.directory.calls(), 1);
    assert_eq!(fx.sink.refreshes.lock().unwrap().len(), 1);
    assert_eq!(decisions.len(), 50);
    assert!(decisions.iter().all(PolicyDecision::is_allow));
    assert_eq!(fx.sink.evaluations.lock().unwrap().len(), 50);
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_callers_observe_same_admin_set() {
    let fx = slow_fixture(Duration::from_secs(2));

    let sets = join_all((0..10).map(|_| fx.engine.admins())).await;
    let first = sets[0].as_ref().unwrap();
    for set in &sets {
        assert!(Arc::ptr_eq(first, set.as_ref().unwrap()));
    }
    assert_eq!(fx.directory.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_cancelled_evaluation_still_populates_cache() {
    let fx = slow_fixture(Duration::from_secs(5));

    let cancelled = tokio::time::timeout(
        Duration::from_secs(1),
        fx.engine.evaluate(&request("entity.read", "user:realm/alice")),
    )
    .await;
    assert!(cancelled.is_err());

    let decision = fx
        .engine
        .evaluate(&request("entity.read", "user:realm/alice"))
        .await;
    assert_allow(&decision);
    assert_eq!(fx.directory.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_clones_share_admin_set() {
    let fx = fixture();
    let clone = fx.engine.clone();

    let a = fx.engine.admins().await.unwrap();
    let b = clone.admins().await.unwrap();

    assert!(Arc::ptr_eq(&a, &b));
    assert_eq!(fx.directory.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_slow_group_lookup_times_out() {
    let config = base_config().with_cache(CacheConfig {
        lookup_timeout_secs: 1,
        ..CacheConfig::default()
    });
    let fx = fixture_with(
        config,
        CountingDirectory::new(platform_admins_directory()).with_delay(Duration::from_secs(30)),
        PolicyDecision::deny(),
    );

    let admins = fx.engine.admins().await.unwrap();
    assert!(admins.is_degraded());
    assert!(!admins.contains(&EntityRef::group("realm", "platform-admins")));
    assert!(admins.contains(&"user:realm/dave".parse::<EntityRef>().unwrap()));

    let alice = fx
        .engine
        .evaluate(&request("some.other.permission", "user:realm/alice"))
        .await;
    assert_eq!(alice.reason().map(|r| r.contains("default")), Some(true));
}
