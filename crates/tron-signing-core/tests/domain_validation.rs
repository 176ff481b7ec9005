use alloy::primitives::U256;
use serde_json::json;
use tron_signing_core::{
    method_param_types, BroadcastResult, BuildResult, ContractCall, FlowError, FlowStep,
    Notification, PortError, Severity, SignedTransaction, TypedParam, DEFAULT_FEE_LIMIT,
};

const TOKEN: &str = "TR7NHqjeKQxGTCi8q8ZY4pL8otSzgjLj6t";
const SPENDER: &str = "TJcyoiPsNra9ozVkAMHaXaDhH8TJCUwuLD";
const OWNER: &str = "TPZvqumzsmNhLNLMYGb7o2rUAfXqtFgkmR";

#[test]
fn method_param_types_are_canonical() {
    assert_eq!(
        method_param_types("approve(address,uint256)").unwrap(),
        vec!["address", "uint256"]
    );
    assert_eq!(
        method_param_types("transferUserUSDT(uint)").unwrap(),
        vec!["uint256"]
    );
    assert!(method_param_types("totalSupply()").unwrap().is_empty());
    assert!(method_param_types("approve").is_err());
    assert!(method_param_types("(address)").is_err());
    assert!(method_param_types("swap((address,uint256))").is_err());
}

#[test]
fn stock_calls_validate() {
    let amount = U256::from(100_000_000u64);
    ContractCall::approve(TOKEN, SPENDER, amount, DEFAULT_FEE_LIMIT, OWNER)
        .validate()
        .expect("approve valid");
    ContractCall::transfer_user_usdt(SPENDER, amount, DEFAULT_FEE_LIMIT, OWNER)
        .validate()
        .expect("transferUserUSDT valid");
    ContractCall::token_transfer(TOKEN, OWNER, amount, DEFAULT_FEE_LIMIT, OWNER)
        .validate()
        .expect("transfer valid");
}

#[test]
fn arity_and_type_mismatches_are_rejected() {
    let mut call = ContractCall::approve(TOKEN, SPENDER, U256::from(1), DEFAULT_FEE_LIMIT, OWNER);
    call.params.pop();
    let err = call.validate().expect_err("arity");
    assert!(err.to_string().contains("argument count mismatch"));

    call.params = vec![
        TypedParam::Uint256(U256::from(1)),
        TypedParam::Address(SPENDER.to_owned()),
    ];
    assert!(call.validate().is_err());

    call.params.clear();
    let err = call.validate().expect_err("empty params");
    assert!(err.to_string().contains("empty parameter list"));

    let mut call = ContractCall::approve(TOKEN, SPENDER, U256::from(1), 0, OWNER);
    assert!(call.validate().is_err());
    call.fee_limit = 1;
    call.owner_address.clear();
    assert!(call.validate().is_err());
}

#[test]
fn typed_params_serialize_as_type_value_pairs() {
    let value = serde_json::to_value(TypedParam::Address(SPENDER.to_owned())).unwrap();
    assert_eq!(value, json!({ "type": "address", "value": SPENDER }));
    let value = serde_json::to_value(TypedParam::Uint256(U256::from(5))).unwrap();
    assert_eq!(value["type"], "uint256");
}

#[test]
fn build_result_requires_true_flag_and_transaction() {
    let missing: BuildResult = serde_json::from_value(json!({})).unwrap();
    assert!(missing
        .into_transaction()
        .unwrap_err()
        .contains("no result"));

    let refused: BuildResult =
        serde_json::from_value(json!({ "result": { "code": "OTHER_ERROR", "message": "boom" } }))
            .unwrap();
    assert!(refused.into_transaction().unwrap_err().contains("boom"));

    let ok: BuildResult = serde_json::from_value(json!({
        "result": { "result": true },
        "transaction": {
            "visible": true,
            "txID": "ab",
            "raw_data": { "contract": [] },
            "raw_data_hex": "0a02"
        }
    }))
    .unwrap();
    assert_eq!(ok.into_transaction().unwrap().txid, "ab");
}

#[test]
fn signed_transaction_round_trips_node_json() {
    let raw = json!({
        "visible": true,
        "txID": "ab",
        "raw_data": { "contract": [] },
        "raw_data_hex": "0a02",
        "signature": ["deadbeef"]
    });
    let signed: SignedTransaction = serde_json::from_value(raw.clone()).unwrap();
    assert!(signed.has_signature());
    assert_eq!(signed.txid(), "ab");
    assert_eq!(serde_json::to_value(&signed).unwrap(), raw);

    let unsigned: SignedTransaction =
        serde_json::from_value(json!({ "txID": "ab", "raw_data": {}, "signature": [""] }))
            .unwrap();
    assert!(!unsigned.has_signature());
}

#[test]
fn broadcast_result_keeps_raw_payload() {
    let ok = BroadcastResult::from_response(json!({ "result": true, "txid": "ff" }));
    assert!(ok.result);
    assert_eq!(ok.txid.as_deref(), Some("ff"));

    let failed = BroadcastResult::from_response(json!({ "code": "DUP_TRANSACTION_ERROR" }));
    assert!(!failed.result);
    assert_eq!(failed.code.as_deref(), Some("DUP_TRANSACTION_ERROR"));
    assert_eq!(failed.raw["code"], "DUP_TRANSACTION_ERROR");
}

#[test]
fn wallet_errors_map_to_taxonomy() {
    let err = FlowError::from_wallet(None, PortError::NotFound("TronLink".to_owned()));
    assert!(matches!(err, FlowError::WalletNotFound(_)));
    let err = FlowError::from_wallet(None, PortError::Disconnected("gone".to_owned()));
    assert!(matches!(err, FlowError::WalletDisconnected(_)));
    let err = FlowError::from_wallet(
        Some(FlowStep::Approve),
        PortError::Rejected("user".to_owned()),
    );
    assert!(matches!(err, FlowError::SigningRejected { .. }));
    let err = FlowError::from_wallet(None, PortError::Transport("io".to_owned()));
    assert!(matches!(err, FlowError::Port(_)));
}

#[test]
fn notifications_carry_error_text() {
    let n = Notification::from_error(&FlowError::WalletNotFound("TronLink".to_owned()));
    assert_eq!(n.severity, Severity::Error);
    assert_eq!(n.message, "wallet not found: TronLink");

    let n = Notification::from_error(&FlowError::Broadcast {
        step: FlowStep::Transfer,
        payload: json!({ "code": "SIGERROR" }),
    });
    assert!(n.message.starts_with("Transaction failed: transfer broadcast failed"));
}
