//! End-to-end tests for the execution channel: a real spawned context, a
//! real client, and the scripted guest interpreter from `common`.

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use cell_runtime::{
    spawn_context, ExecError, ExecutionClient, ExecutionService, Interpreter, ProgressStage,
};
use common::ScriptedInterpreter;

fn scripted_service(name: &str) -> ExecutionService {
    ExecutionService::start(name, || -> Result<Box<dyn Interpreter>, String> {
        Ok(Box::new(ScriptedInterpreter::new()))
    })
    .expect("service should start")
}

#[tokio::test]
async fn evaluated_result_resolves_as_string() {
    let service = scripted_service("eval-ok");
    let result = service.submit("x = 4").await.unwrap();
    assert_eq!(result, "");
    let result = service.submit("x").await.unwrap();
    assert_eq!(result, "4");
}

#[tokio::test]
async fn print_resolves_with_captured_output() {
    let service = scripted_service("print");
    let result = service.submit(r#"print("Hello, Python!")"#).await.unwrap();
    assert_eq!(result.trim_end_matches('\n'), "Hello, Python!");
}

#[tokio::test]
async fn raised_exception_rejects_with_its_text() {
    let service = scripted_service("raise");
    let err = service
        .submit(r#"raise Exception("Test error")"#)
        .await
        .unwrap_err();
    match err {
        ExecError::Execution(msg) => assert!(msg.contains("Test error")),
        other => panic!("expected Execution error, got {:?}", other),
    }
}

#[tokio::test]
async fn namespace_persists_across_submissions() {
    let service = scripted_service("persist");
    service.submit("x = 1").await.unwrap();
    assert_eq!(service.submit("x").await.unwrap(), "1");

    // A fault in between must not reset the namespace.
    let _ = service.submit("not_defined").await.unwrap_err();
    assert_eq!(service.submit("x").await.unwrap(), "1");
}

#[tokio::test]
async fn bootstrap_runs_exactly_once() {
    let created = Arc::new(AtomicUsize::new(0));
    let created_clone = created.clone();
    let service = ExecutionService::start(
        "init-once",
        move || -> Result<Box<dyn Interpreter>, String> {
            created_clone.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(ScriptedInterpreter::new()))
        },
    )
    .unwrap();

    for i in 0..10 {
        service.submit(format!("v{} = {}", i, i)).await.unwrap();
    }
    assert_eq!(created.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn interleaved_submissions_never_swap_results() {
    let service = scripted_service("interleave");
    service.submit("a = 1").await.unwrap();
    service.submit("b = 2").await.unwrap();

    // Both in flight before either resolves; each must get its own value.
    let (ra, rb) = tokio::join!(service.submit("a"), service.submit("b"));
    assert_eq!(ra.unwrap(), "1");
    assert_eq!(rb.unwrap(), "2");
}

#[tokio::test]
async fn first_submission_reports_loading_then_running() {
    let service = scripted_service("progress");
    let mut progress = service.subscribe_progress();

    service.submit("x = 1").await.unwrap();

    let first = progress.recv().await.unwrap();
    assert_eq!(first.stage, ProgressStage::Loading);
    let second = progress.recv().await.unwrap();
    assert_eq!(second.stage, ProgressStage::Running);
    assert_eq!(first.id, second.id);

    // The bootstrap is done; later submissions go straight to running.
    service.submit("y = 2").await.unwrap();
    let third = progress.recv().await.unwrap();
    assert_eq!(third.stage, ProgressStage::Running);
    assert_ne!(third.id, first.id);
}

#[tokio::test]
async fn failed_bootstrap_rejects_current_and_later_submissions() {
    let service = ExecutionService::start("init-fail", || -> Result<Box<dyn Interpreter>, String> {
        Err("bundle fetch failed: 503".to_string())
    })
    .unwrap();

    let err = service.submit("x = 1").await.unwrap_err();
    match err {
        ExecError::Execution(msg) => assert!(msg.contains("bundle fetch failed")),
        other => panic!("expected Execution error, got {:?}", other),
    }

    // Terminal: no re-initialization, but the channel still answers.
    let err = service.submit("x = 1").await.unwrap_err();
    match err {
        ExecError::Execution(msg) => assert!(msg.contains("bundle fetch failed")),
        other => panic!("expected Execution error, got {:?}", other),
    }
}

#[tokio::test]
async fn terminated_context_makes_channel_unavailable() {
    let (handle, request_tx, response_rx) =
        spawn_context("terminate", || -> Result<Box<dyn Interpreter>, String> {
            Ok(Box::new(ScriptedInterpreter::new()))
        })
        .unwrap();
    let client = ExecutionClient::new(request_tx, response_rx);

    client.submit("x = 1").await.unwrap();
    handle.join();

    // The worker is gone, so the request channel is closed.
    let err = tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            match client.submit("x").await {
                Err(e) => break e,
                Ok(_) => tokio::task::yield_now().await,
            }
        }
    })
    .await
    .expect("submit should start failing after termination");
    match err {
        ExecError::ChannelUnavailable(_) => {}
        other => panic!("expected ChannelUnavailable, got {:?}", other),
    }
}

#[tokio::test]
async fn shutdown_joins_the_context_thread() {
    let service = scripted_service("shutdown");
    service.submit("x = 1").await.unwrap();
    service.shutdown();
}
