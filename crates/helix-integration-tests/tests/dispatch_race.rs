//! Concurrent dispatch semantics: one job and one task per (sequence, model)
//! pair no matter how many callers race, and independent pairs dispatch
//! independently.

use std::sync::Arc;

use anyhow::Result;

use helix_integration_tests::TierHarness;
use helix_store::MetadataStore;
use helix_types::{
    fingerprint, JobStatus, ModelCatalog, ResolutionSource, ResolutionStatus, ESM2_LARGE,
};

const SEQ: &str = "MVLSPADKTNVKAAWGKVGAHAGEYGAEALERMFLSF";

#[tokio::test(flavor = "multi_thread")]
async fn test_thundering_herd_dispatches_one_job() -> Result<()> {
    let h = TierHarness::healthy().await?;

    let mut handles = Vec::new();
    for _ in 0..200 {
        let resolver = Arc::clone(&h.resolver);
        handles.push(tokio::spawn(
            async move { resolver.resolve(SEQ, ESM2_LARGE).await },
        ));
    }

    let mut new_job = 0;
    let mut job_queue = 0;
    for handle in handles {
        let result = handle.await??;
        assert_eq!(result.status, ResolutionStatus::Pending);
        match result.source {
            ResolutionSource::NewJob => new_job += 1,
            ResolutionSource::JobQueue => job_queue += 1,
            other => panic!("unexpected source {:?}", other),
        }
    }

    assert_eq!(new_job, 1);
    assert_eq!(job_queue, 199);
    assert_eq!(h.store.job_count(), 1);
    assert_eq!(h.stub.counters().submit_task_calls, 1);
    assert_eq!(h.stub.state().lock().queued_for(ESM2_LARGE), 1);
    assert_eq!(h.resolver.metrics().snapshot().jobs_dispatched, 1);
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn test_distinct_pairs_dispatch_independently() -> Result<()> {
    let h = TierHarness::healthy().await?;

    let mut handles = Vec::new();
    for i in 0..32 {
        let resolver = Arc::clone(&h.resolver);
        let sequence = format!("M{}", "A".repeat(i + 1));
        handles.push(tokio::spawn(async move {
            resolver.resolve(&sequence, ESM2_LARGE).await
        }));
    }

    for handle in handles {
        let result = handle.await??;
        assert_eq!(result.status, ResolutionStatus::Pending);
        assert_eq!(result.source, ResolutionSource::NewJob);
    }

    assert_eq!(h.store.job_count(), 32);
    assert_eq!(h.stub.counters().submit_task_calls, 32);
    assert_eq!(h.stub.state().lock().queued_for(ESM2_LARGE), 32);
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn test_herd_after_completion_all_hit_cache() -> Result<()> {
    let h = TierHarness::healthy().await?;

    let first = h.resolver.resolve(SEQ, ESM2_LARGE).await?;
    assert_eq!(first.source, ResolutionSource::NewJob);

    let worker = h.worker(ESM2_LARGE, 4).await?;
    assert_eq!(worker.poll_once().await?, 1);

    let mut handles = Vec::new();
    for _ in 0..50 {
        let resolver = Arc::clone(&h.resolver);
        handles.push(tokio::spawn(
            async move { resolver.resolve(SEQ, ESM2_LARGE).await },
        ));
    }
    for handle in handles {
        let result = handle.await??;
        assert_eq!(result.status, ResolutionStatus::Completed);
        assert_eq!(result.source, ResolutionSource::RemoteCache);
    }

    // Concurrent back-fills collapse onto one record and one closed job.
    assert_eq!(h.store.record_count(), 1);
    assert_eq!(h.store.job_count(), 1);
    let fp = fingerprint(SEQ);
    let profile = ModelCatalog::standard().profile(ESM2_LARGE)?.clone();
    assert_eq!(
        h.store.get_job_status(&fp, &profile).await?,
        Some(JobStatus::Completed)
    );
    assert_eq!(h.stub.counters().submit_task_calls, 1);
    Ok(())
}
