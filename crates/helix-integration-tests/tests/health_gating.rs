//! Health-gated routing: fail-safe defaults, probe-driven recovery, and
//! transition hygiene under repeated failures.

use std::time::Duration;

use anyhow::Result;

use helix_integration_tests::{wait_until, TierHarness};
use helix_resolver::{spawn_probe_loop, HealthConfig};
use helix_types::{ResolutionSource, ResolutionStatus, ESM2_LARGE, ESM2_SMALL};

const SEQ: &str = "MVLSPADKTNVKAAWGKVGAHAGEYGAEALERMFLSF";

fn probe_config(h: &TierHarness) -> HealthConfig {
    HealthConfig {
        endpoint: h.stub.endpoint().to_string(),
        probe_interval: Duration::from_millis(25),
        probe_timeout: Duration::from_millis(500),
    }
}

#[tokio::test]
async fn test_failsafe_default_never_contacts_remote() -> Result<()> {
    let h = TierHarness::unprobed().await?;

    let result = h.resolver.resolve(SEQ, ESM2_LARGE).await?;
    assert_eq!(result.status, ResolutionStatus::Completed);
    assert_eq!(result.source, ResolutionSource::LocalFallback);
    assert_eq!(result.model_id, ESM2_SMALL);

    // No probe ever succeeded, so no remote call was ever made.
    assert_eq!(h.stub.counters().get_calls, 0);
    assert_eq!(h.stub.counters().submit_task_calls, 0);
    assert_eq!(h.store.job_count(), 0);
    assert_eq!(h.resolver.metrics().snapshot().local_fallbacks, 1);
    Ok(())
}

#[tokio::test]
async fn test_probe_loop_gates_the_tier_walk() -> Result<()> {
    let h = TierHarness::unprobed().await?;
    let probe = spawn_probe_loop(&h.monitor, probe_config(&h));

    assert!(wait_until(Duration::from_secs(2), || h.monitor.is_healthy()).await);
    let online = h.resolver.resolve(SEQ, ESM2_LARGE).await?;
    assert_eq!(online.source, ResolutionSource::NewJob);

    h.stub.set_serving(false);
    assert!(wait_until(Duration::from_secs(2), || !h.monitor.is_healthy()).await);
    let offline = h.resolver.resolve(SEQ, ESM2_LARGE).await?;
    assert_eq!(offline.source, ResolutionSource::LocalFallback);
    assert_eq!(offline.model_id, ESM2_SMALL);

    h.stub.set_serving(true);
    assert!(wait_until(Duration::from_secs(2), || h.monitor.is_healthy()).await);
    let recovered = h.resolver.resolve(SEQ, ESM2_LARGE).await?;
    assert_eq!(recovered.source, ResolutionSource::JobQueue);

    assert_eq!(h.monitor.transition_count(), 3);
    probe.abort();
    Ok(())
}

#[tokio::test]
async fn test_repeated_probe_failures_stay_on_one_side() -> Result<()> {
    let h = TierHarness::unprobed().await?;
    h.stub.state().lock().fail_health = true;

    let probe = spawn_probe_loop(&h.monitor, probe_config(&h));

    // Several failed probes later the monitor has not flapped once.
    tokio::time::sleep(Duration::from_millis(150)).await;
    assert!(!h.monitor.is_healthy());
    assert_eq!(h.monitor.transition_count(), 0);

    h.stub.state().lock().fail_health = false;
    assert!(wait_until(Duration::from_secs(2), || h.monitor.is_healthy()).await);
    assert_eq!(h.monitor.transition_count(), 1);

    // Steady healthy probes add no further edges.
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(h.monitor.transition_count(), 1);
    probe.abort();
    Ok(())
}
