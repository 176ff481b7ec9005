mod common;

use alloy::primitives::U256;

use tron_signing_adapters::{AdapterConfig, IntentStoreAdapter};
use tron_signing_core::{FlowIntent, IntentStore, PortError, SagaPhase, TimestampMs};

use common::{OWNER, SPENDER, TOKEN};

fn intent(id: &str, revision: u64, phase: SagaPhase) -> FlowIntent {
    FlowIntent {
        intent_id: id.to_owned(),
        sender: OWNER.to_owned(),
        token_contract: TOKEN.to_owned(),
        spender_contract: SPENDER.to_owned(),
        amount: U256::from(100_000_000u64),
        fee_limit: 100_000_000,
        phase,
        approve_txid: None,
        transfer_txid: None,
        compensation_txid: None,
        last_error: None,
        state_revision: revision,
        created_at_ms: TimestampMs(1_760_000_000_000),
        updated_at_ms: TimestampMs(1_760_000_000_000 + revision),
    }
}

fn exercise(store: &IntentStoreAdapter) {
    store
        .save_intent(&intent("intent-a", 0, SagaPhase::Recorded))
        .expect("save a0");
    store
        .save_intent(&intent("intent-a", 2, SagaPhase::Approved))
        .expect("save a2");
    store
        .save_intent(&intent("intent-a", 2, SagaPhase::Approved))
        .expect("same revision is idempotent");
    store
        .save_intent(&intent("intent-b", 1, SagaPhase::Approving))
        .expect("save b1");

    let err = store
        .save_intent(&intent("intent-a", 1, SagaPhase::Approving))
        .expect_err("regression");
    assert!(matches!(err, PortError::Conflict(_)));

    let a = store
        .load_intent("intent-a")
        .expect("load")
        .expect("present");
    assert_eq!(a.state_revision, 2);
    assert_eq!(a.phase, SagaPhase::Approved);
    assert!(store.load_intent("intent-missing").expect("load").is_none());

    let mut ids: Vec<String> = store
        .list_intents()
        .expect("list")
        .into_iter()
        .map(|x| x.intent_id)
        .collect();
    ids.sort();
    assert_eq!(ids, vec!["intent-a", "intent-b"]);
}

#[test]
fn memory_store_rejects_revision_regression() {
    exercise(&IntentStoreAdapter::in_memory());
}

#[test]
fn file_store_rejects_revision_regression_and_survives_reopen() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("state").join("intents.json");
    exercise(&IntentStoreAdapter::file(&path));

    let reopened = IntentStoreAdapter::from_config(&AdapterConfig {
        intent_store_path: Some(path.clone()),
        ..AdapterConfig::default()
    });
    assert_eq!(reopened.list_intents().expect("list").len(), 2);
    let raw = std::fs::read_to_string(&path).expect("read file");
    assert!(raw.contains("intent-b"));
}

#[test]
fn corrupt_file_is_a_validation_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("intents.json");
    std::fs::write(&path, b"{ not json").expect("write");

    let err = IntentStoreAdapter::file(&path)
        .list_intents()
        .expect_err("corrupt");
    assert!(matches!(err, PortError::Validation(_)));
}
