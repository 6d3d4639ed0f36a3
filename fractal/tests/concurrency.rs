//! Concurrent evaluation, sibling steps, cancellation, and event streaming.


use std::sync::Arc;
use std::time::Duration;

use fractal::{
    CancellationToken, EngineConfig, EngineEvent, ExpandOutcome, FractalEngine, MockLlm,
    NodeStatus,
};
use tokio::sync::mpsc;

#[tokio::test]
async fn step_evaluates_all_children_concurrently() {
    let explorer = Arc::new(MockLlm::with_reply(r#"["a","b","c"]"#));
    let critic = Arc::new(MockLlm::with_reply("0.8").with_delay(Duration::from_millis(100)));
    let engine = FractalEngine::new(explorer.clone(), critic.clone(), EngineConfig::default());
    let root = engine.create_root("q").unwrap();

    let outcome = engine.run_step(root.id).await.unwrap();
    assert_eq!(outcome.children().len(), 3);
    assert_eq!(critic.call_count(), 3);
    assert_eq!(critic.max_concurrency(), 3);
    for id in outcome.children() {
        let child = engine.get(*id).unwrap();
        assert_eq!(child.status, NodeStatus::Evaluated);
        assert_eq!(child.score, 0.8);
    }
}

#[tokio::test]
async fn sibling_steps_run_side_by_side() {
    let explorer = Arc::new(
        MockLlm::scripted([r#"["left","right"]"#], r#"["leaf"]"#)
            .with_delay(Duration::from_millis(50)),
    );
    let critic = Arc::new(MockLlm::with_reply("0.5"));
    let engine = FractalEngine::new(explorer.clone(), critic, EngineConfig::default());
    let root = engine.create_root("q").unwrap();
    let kids = engine.run_step(root.id).await.unwrap().children().to_vec();

    let (left, right) = tokio::join!(engine.run_step(kids[0]), engine.run_step(kids[1]));
    assert_eq!(left.unwrap().children().len(), 1);
    assert_eq!(right.unwrap().children().len(), 1);
    assert_eq!(explorer.max_concurrency(), 2);
    assert_eq!(engine.len(), 5);
}

#[tokio::test]
async fn same_node_stepped_twice_expands_once() {
    let explorer = Arc::new(MockLlm::with_reply(r#"["a","b"]"#).with_delay(Duration::from_millis(50)));
    let critic = Arc::new(MockLlm::with_reply("0.5"));
    let engine = FractalEngine::new(explorer.clone(), critic, EngineConfig::default());
    let root = engine.create_root("q").unwrap();

    let (first, second) = tokio::join!(engine.run_step(root.id), engine.run_step(root.id));
    let outcomes = [first.unwrap(), second.unwrap()];
    assert_eq!(
        outcomes.iter().filter(|o| **o == ExpandOutcome::Skipped).count(),
        1
    );
    assert_eq!(explorer.call_count(), 1);
    assert_eq!(engine.store().children(root.id).unwrap().len(), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn racing_steps_across_threads_expand_once() {
    let explorer = Arc::new(MockLlm::with_reply(r#"["a","b"]"#).with_delay(Duration::from_millis(50)));
    let critic = Arc::new(MockLlm::with_reply("0.5"));
    let engine = Arc::new(FractalEngine::new(
        explorer.clone(),
        critic,
        EngineConfig::default(),
    ));
    let root = engine.create_root("q").unwrap().id;

    let start = Arc::new(tokio::sync::Barrier::new(8));
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let engine = engine.clone();
            let start = start.clone();
            tokio::spawn(async move {
                start.wait().await;
                engine.run_step(root).await
            })
        })
        .collect();
    let mut outcomes = Vec::new();
    for handle in handles {
        outcomes.push(handle.await.unwrap().unwrap());
    }

    let expanded: Vec<_> = outcomes
        .iter()
        .filter(|o| matches!(o, ExpandOutcome::Expanded { .. }))
        .collect();
    assert_eq!(expanded.len(), 1);
    assert_eq!(expanded[0].children().len(), 2);
    assert_eq!(
        outcomes.iter().filter(|o| **o == ExpandOutcome::Skipped).count(),
        7
    );
    assert_eq!(explorer.call_count(), 1);
    assert_eq!(engine.store().children(root).unwrap().len(), 2);
    assert_eq!(engine.len(), 3);
}

#[tokio::test]
async fn cancelled_step_reverts_node_for_retry() {
    let explorer = Arc::new(MockLlm::with_reply(r#"["a"]"#).with_delay(Duration::from_secs(5)));
    let critic = Arc::new(MockLlm::with_reply("0.5"));
    let engine = FractalEngine::new(explorer, critic, EngineConfig::default());
    let root = engine.create_root("q").unwrap();

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        trigger.cancel();
    });
    assert_eq!(engine.run_step_with_cancel(root.id, &cancel).await, Ok(None));
    let node = engine.get(root.id).unwrap();
    assert_eq!(node.status, NodeStatus::Pending);
    assert!(node.children.is_empty());
}

#[tokio::test]
async fn events_follow_step_order() {
    let explorer = Arc::new(MockLlm::with_reply(r#"["a","b"]"#));
    let critic = Arc::new(MockLlm::with_reply("0.4"));
    let (tx, mut rx) = mpsc::unbounded_channel();
    let engine =
        FractalEngine::new(explorer, critic, EngineConfig::default()).with_events(tx);
    let root = engine.create_root("q").unwrap();
    let outcome = engine.run_step(root.id).await.unwrap();
    drop(engine);

    let mut events = Vec::new();
    while let Some(event) = rx.recv().await {
        events.push(event);
    }
    assert_eq!(events.len(), 4);
    assert_eq!(events[0], EngineEvent::RootCreated { id: root.id });
    assert_eq!(
        events[1],
        EngineEvent::Expanded {
            parent: root.id,
            children: outcome.children().to_vec(),
        }
    );
    for event in &events[2..] {
        assert!(matches!(
            event,
            EngineEvent::Evaluated { score, fallback: false, .. } if *score == 0.4
        ));
    }
}
