//! Concurrency and Batch Tests
//!
//! - Independent notifications synchronized in parallel tasks
//! - Losing a link race surfaces as a retryable conflict
//! - Pipeline batch summaries and per-notification isolation

mod common;

use std::sync::Arc;

use common::*;
use xavyo_core::{ResourceId, TaskContext};
use xavyo_provisioning::repository::InMemoryRepository;
use xavyo_provisioning::sync::{
    ChangeNotification, ProcessingStatus, SyncError, SyncPipeline, SynchronizationEngine,
};
use xavyo_provisioning::{Shadow, SyncSituation};

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_parallel_notifications_are_independent() {
    init_test_logging();
    let repo = Arc::new(InMemoryRepository::new());
    let resource = ldap();
    let mut users = Vec::new();
    for i in 0..16 {
        let focus = user(&format!("user{i}"));
        repo.insert_focus(focus.clone()).await;
        users.push(focus);
    }
    let (engine, recomputer) = engine(repo.clone(), &resource, correlate_by_uid());
    let engine = Arc::new(engine);

    let mut handles = Vec::new();
    for i in 0..16 {
        let engine = engine.clone();
        let shadow = account(&resource, &format!("user{i}"));
        handles.push(tokio::spawn(async move {
            let ctx = engine
                .synchronize(&ChangeNotification::added(shadow.clone()), &TaskContext::new())
                .await;
            (shadow, ctx)
        }));
    }

    for (i, handle) in handles.into_iter().enumerate() {
        let (shadow, ctx) = handle.await.unwrap();
        let ctx = ctx.unwrap().unwrap();
        assert_eq!(ctx.resolved, SyncSituation::Linked);
        assert_eq!(ctx.focus_id, Some(users[i].id));
        assert_eq!(repo.owner_of(shadow.id).await, Some(users[i].id));
    }
    assert_eq!(recomputer.calls(), 16);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_same_shadow_twice_ends_with_one_owner() {
    init_test_logging();
    let repo = Arc::new(InMemoryRepository::new());
    let resource = ldap();
    let jack = user("jack");
    repo.insert_focus(jack.clone()).await;
    let (engine, _) = engine(repo.clone(), &resource, correlate_by_uid());
    let engine = Arc::new(engine);

    let shadow = account(&resource, "jack");
    let first = {
        let engine = engine.clone();
        let notification = ChangeNotification::added(shadow.clone());
        tokio::spawn(async move { engine.synchronize(&notification, &TaskContext::new()).await })
    };
    let second = {
        let engine = engine.clone();
        let notification = ChangeNotification::added(shadow.clone());
        tokio::spawn(async move { engine.synchronize(&notification, &TaskContext::new()).await })
    };

    for result in [first.await.unwrap(), second.await.unwrap()] {
        let ctx = result.unwrap().unwrap();
        assert_eq!(ctx.resolved, SyncSituation::Linked);
        assert_eq!(ctx.focus_id, Some(jack.id));
    }
    assert_eq!(repo.owner_of(shadow.id).await, Some(jack.id));
    assert_eq!(repo.focus(jack.id).await.unwrap().link_refs, vec![shadow.id]);
}

#[tokio::test]
async fn test_lost_link_race_is_retryable_conflict() {
    init_test_logging();
    let inner = Arc::new(InMemoryRepository::new());
    let jack = user("jack");
    inner.insert_focus(jack.clone()).await;
    let racing = Arc::new(RacingRepository::new(inner.clone()).await);
    let resource = ldap();
    let (engine, recomputer) = engine(racing.clone(), &resource, correlate_by_uid());

    let shadow = account(&resource, "jack");
    let err = engine
        .synchronize(&ChangeNotification::added(shadow.clone()), &TaskContext::new())
        .await
        .unwrap_err();

    assert!(err.is_conflict());
    assert!(err.is_retryable());
    match err {
        SyncError::LinkConflict {
            shadow_id,
            focus_id,
            ..
        } => {
            assert_eq!(shadow_id, shadow.id);
            assert_eq!(focus_id, jack.id);
        }
        other => panic!("expected link conflict, got {other:?}"),
    }
    assert_eq!(racing.races(), 1);
    assert_eq!(inner.owner_of(shadow.id).await, Some(racing.rival));
    assert_eq!(inner.write_situation_calls(), 0);
    assert_eq!(recomputer.calls(), 0);
}

#[tokio::test]
async fn test_pipeline_summarizes_batch() {
    init_test_logging();
    let repo = Arc::new(InMemoryRepository::new());
    repo.insert_focus(user("jack")).await;
    let resource = ldap();
    let (engine, _) = engine(repo.clone(), &resource, correlate_by_uid());
    let pipeline = SyncPipeline::new(Arc::new(engine)).with_concurrency(2);

    let linked = account(&resource, "jack");
    let unmatched = account(&resource, "will");
    let protected = account(&resource, "admin").protected();
    let foreign = Shadow::new(ResourceId::new(), "account");
    let notifications = vec![
        ChangeNotification::added(linked.clone()),
        ChangeNotification::added(unmatched.clone()),
        ChangeNotification::added(protected.clone()),
        ChangeNotification::added(foreign.clone()),
    ];

    let summary = pipeline
        .process_batch(notifications, &TaskContext::new())
        .await;

    assert_eq!(summary.processed, 4);
    assert_eq!(summary.succeeded, 2);
    assert_eq!(summary.bypassed, 1);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.conflicts, 0);

    let shadows: Vec<_> = summary.results.iter().map(|r| r.shadow_id).collect();
    assert_eq!(shadows, vec![linked.id, unmatched.id, protected.id, foreign.id]);
    assert_eq!(summary.results[0].resolved, Some(SyncSituation::Linked));
    assert_eq!(summary.results[1].resolved, Some(SyncSituation::Unmatched));
    assert_eq!(summary.results[2].status, ProcessingStatus::Bypassed);
    assert_eq!(summary.results[3].status, ProcessingStatus::Failed);
    assert!(summary.results[3].error.as_deref().unwrap().contains("Resource not found"));
}

#[tokio::test]
async fn test_pipeline_reports_conflicts() {
    init_test_logging();
    let inner = Arc::new(InMemoryRepository::new());
    inner.insert_focus(user("jack")).await;
    let racing = Arc::new(RacingRepository::new(inner.clone()).await);
    let resource = ldap();
    let engine = SynchronizationEngine::builder(racing)
        .resource(resource.clone(), correlate_by_uid())
        .build()
        .unwrap();

    let summary = SyncPipeline::new(Arc::new(engine))
        .process_batch(
            vec![ChangeNotification::added(account(&resource, "jack"))],
            &TaskContext::new(),
        )
        .await;

    assert_eq!(summary.conflicts, 1);
    assert_eq!(summary.retryable().count(), 1);
    assert_eq!(summary.results[0].status, ProcessingStatus::Conflict);
}

#[tokio::test]
async fn test_cancelled_batch_fails_every_notification() {
    init_test_logging();
    let repo = Arc::new(InMemoryRepository::new());
    let resource = ldap();
    let (engine, _) = engine(repo.clone(), &resource, correlate_by_uid());
    let task = TaskContext::new();
    task.cancel();

    let summary = SyncPipeline::new(Arc::new(engine))
        .process_batch(
            vec![
                ChangeNotification::added(account(&resource, "jack")),
                ChangeNotification::added(account(&resource, "will")),
            ],
            &task,
        )
        .await;

    assert_eq!(summary.failed, 2);
    assert_eq!(repo.write_situation_calls(), 0);
}
