// End-to-end dispatch flows: raw inArguments through normalization,
// encoding, artifact handling, and outcome classification — everything
// short of a live HTTP socket.

use std::sync::Arc;

use serde_json::json;
use smsbridge_core::config::{ArtifactConfig, BranchStyle, RetentionMode, SingleSendMode};
use smsbridge_core::DispatchOutcome;
use smsbridge_dispatch::client::MockCall;
use smsbridge_dispatch::{normalize_arguments, ArtifactStore, Dispatcher, MockGatewayClient};

fn build_dispatcher(retention: RetentionMode) -> (Dispatcher, Arc<MockGatewayClient>, String) {
    let dir = std::env::temp_dir()
        .join(format!("smsbridge-flow-{}", uuid::Uuid::new_v4()))
        .to_string_lossy()
        .into_owned();
    let store = ArtifactStore::new(&ArtifactConfig {
        dir: dir.clone(),
        retention,
        public_base: "/files".to_string(),
    });
    let client = Arc::new(MockGatewayClient::new());
    let dispatcher = Dispatcher::new(client.clone(), store, "SOIB", SingleSendMode::Query);
    (dispatcher, client, dir)
}

#[tokio::test]
async fn single_instant_send_renders_sent_branch() {
    let (dispatcher, client, _) = build_dispatcher(RetentionMode::Delete);
    client.push_estado("ENVIADO");

    let args = json!({"telefono": "600111222", "texto": "Hola"});
    let req = normalize_arguments(&args, 160).unwrap();
    let report = dispatcher.dispatch(vec![req]).await;

    assert_eq!(report.outcome, DispatchOutcome::Sent);
    assert_eq!(report.outcome.branch_value(BranchStyle::Scheduled), "sent");
    assert_eq!(report.outcome.branch_value(BranchStyle::Instant), "sent");
    assert_eq!(client.call_count(), 1);
}

#[tokio::test]
async fn scheduled_two_record_batch_writes_ordered_file_then_deletes_it() {
    let (dispatcher, client, dir) = build_dispatcher(RetentionMode::Delete);
    client.push_estado("PROGRAMADO");

    let raw = [
        json!({"telefono": "600000001", "texto": "uno", "fechaEnvio": "2026-02-19T09:02"}),
        json!({"telefono": "600000002", "texto": "dos", "fechaEnvio": "2026-02-19T09:02"}),
    ];
    let requests = raw
        .iter()
        .map(|v| normalize_arguments(v, 160).unwrap())
        .collect();

    let report = dispatcher.dispatch(requests).await;

    assert_eq!(report.outcome, DispatchOutcome::Scheduled);
    assert_eq!(
        report.outcome.branch_value(BranchStyle::Scheduled),
        "scheduled"
    );
    // delete mode: no retrievable path in the response
    assert!(report.artifact_path.is_none());

    match &client.calls()[0] {
        MockCall::Batch {
            records,
            file_content,
            campaign,
        } => {
            assert_eq!(*records, 2);
            assert_eq!(
                file_content,
                "19/02/2026|09:02|600000001|uno\n19/02/2026|09:02|600000002|dos"
            );
            assert_eq!(campaign, "SOIB");
        }
        other => panic!("expected batch upload, got {other:?}"),
    }

    // the temp directory holds nothing once the dispatch completed
    let mut entries = tokio::fs::read_dir(&dir).await.unwrap();
    assert!(entries.next_entry().await.unwrap().is_none());
}

#[tokio::test]
async fn publish_mode_keeps_file_and_reports_path() {
    let (dispatcher, client, dir) = build_dispatcher(RetentionMode::Publish);
    client.push_estado("ENVIADO");

    let requests = vec![
        normalize_arguments(&json!({"telefono": "600000001", "texto": "uno"}), 160).unwrap(),
        normalize_arguments(&json!({"telefono": "600000002", "texto": "dos"}), 160).unwrap(),
    ];
    let report = dispatcher.dispatch(requests).await;

    let public = report.artifact_path.expect("publish mode must expose a path");
    let file_name = public.strip_prefix("/files/").unwrap();
    let on_disk = std::path::Path::new(&dir).join(file_name);
    assert!(on_disk.exists());
    let _ = tokio::fs::remove_file(on_disk).await;
}

#[tokio::test]
async fn mixed_synonyms_in_one_batch_normalize_consistently() {
    let (dispatcher, client, _) = build_dispatcher(RetentionMode::Delete);
    client.push_estado("ENVIADO");

    let requests = vec![
        normalize_arguments(&json!({"telefono": "600000001", "texto": "uno"}), 160).unwrap(),
        normalize_arguments(&json!({"phone": "600000002", "message": "dos"}), 160).unwrap(),
    ];
    let report = dispatcher.dispatch(requests).await;

    assert_eq!(report.outcome, DispatchOutcome::Sent);
    match &client.calls()[0] {
        MockCall::Batch { file_content, .. } => {
            assert_eq!(file_content, "600000001|uno\n600000002|dos");
        }
        other => panic!("expected batch upload, got {other:?}"),
    }
}

#[tokio::test]
async fn gateway_rejection_renders_failure_branch_per_vocabulary() {
    let (dispatcher, client, _) = build_dispatcher(RetentionMode::Delete);
    client.push_estado("rechazado");

    let req = normalize_arguments(&json!({"telefono": "600111222", "texto": "Hola"}), 160).unwrap();
    let report = dispatcher.dispatch(vec![req]).await;

    assert_eq!(report.outcome, DispatchOutcome::Failed);
    assert_eq!(report.outcome.branch_value(BranchStyle::Scheduled), "failed");
    assert_eq!(report.outcome.branch_value(BranchStyle::Instant), "notsent");
}
