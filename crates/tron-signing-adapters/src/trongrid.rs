use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use serde_json::{json, Value};
use tracing::{debug, warn};

use tron_signing_core::{
    BroadcastResult, BuildFlag, BuildResult, ChainClient, ContractCall, PortError,
    SignedTransaction, UnsignedTransaction,
};

use crate::abi::encode_parameters;
use crate::AdapterConfig;

// `TRON-PRO-API-KEY`; header names are case-insensitive and `http` wants lowercase
pub const API_KEY_HEADER: &str = "tron-pro-api-key";

/// Full-node HTTP client speaking the TronGrid `/wallet/*` API.
#[derive(Debug, Clone)]
pub struct TronGridClient {
    base_url: String,
    client: reqwest::Client,
}

impl TronGridClient {
    pub fn with_config(config: &AdapterConfig) -> Result<Self, PortError> {
        let mut headers = HeaderMap::new();
        if let Some(ref key) = config.api_key {
            let value = HeaderValue::from_str(key)
                .map_err(|e| PortError::Validation(format!("invalid api key header: {e}")))?;
            headers.insert(API_KEY_HEADER, value);
        }
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .default_headers(headers)
            .build()
            .map_err(|e| PortError::Transport(format!("failed to build http client: {e}")))?;
        Ok(Self {
            base_url: config.full_host.trim_end_matches('/').to_owned(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn post(&self, path: &str, body: Value) -> Result<Value, PortError> {
        let url = format!("{}{path}", self.base_url);
        debug!(target: "adapters::trongrid", %url, request = %body, "full node request");
        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| PortError::Transport(format!("{path} request failed: {e}")))?;
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| PortError::Transport(format!("{path} status {status}: read failed: {e}")))?;
        if !status.is_success() {
            warn!(target: "adapters::trongrid", %url, %status, response = %text, "full node error status");
            return Err(PortError::Transport(format!("{path} status {status}: {text}")));
        }
        let payload: Value = serde_json::from_str(&text)
            .map_err(|e| PortError::Transport(format!("{path} json decode failed: {e}")))?;
        debug!(target: "adapters::trongrid", %url, response = %payload, "full node response");
        Ok(payload)
    }
}

#[async_trait]
impl ChainClient for TronGridClient {
    async fn trigger_smart_contract(&self, call: &ContractCall) -> Result<BuildResult, PortError> {
        let body = json!({
            "owner_address": call.owner_address,
            "contract_address": call.contract_address,
            "function_selector": call.method_signature,
            "parameter": encode_parameters(&call.params)?,
            "fee_limit": call.fee_limit,
            "call_value": 0,
            "visible": true,
        });
        let payload = self.post("/wallet/triggersmartcontract", body).await?;
        let mut built: BuildResult = serde_json::from_value(payload)
            .map_err(|e| PortError::Transport(format!("unexpected build response: {e}")))?;
        if let Some(flag) = built.result.as_mut() {
            flag.message = flag.message.take().map(|m| decode_node_message(&m));
        }
        Ok(built)
    }

    async fn build_trx_transfer(
        &self,
        to_address: &str,
        amount_sun: u64,
        owner_address: &str,
    ) -> Result<BuildResult, PortError> {
        let body = json!({
            "to_address": to_address,
            "owner_address": owner_address,
            "amount": amount_sun,
            "visible": true,
        });
        let payload = self.post("/wallet/createtransaction", body).await?;
        // this endpoint answers with the bare transaction, or `{"Error": ...}`
        if payload.get("txID").is_some() {
            let tx: UnsignedTransaction = serde_json::from_value(payload)
                .map_err(|e| PortError::Transport(format!("unexpected transaction: {e}")))?;
            return Ok(BuildResult::ok(tx));
        }
        let message = payload
            .get("Error")
            .and_then(Value::as_str)
            .map(str::to_owned)
            .unwrap_or_else(|| payload.to_string());
        Ok(BuildResult {
            result: Some(BuildFlag {
                result: false,
                code: None,
                message: Some(message),
            }),
            transaction: None,
        })
    }

    async fn send_raw_transaction(
        &self,
        signed: &SignedTransaction,
    ) -> Result<BroadcastResult, PortError> {
        let body = serde_json::to_value(signed)
            .map_err(|e| PortError::Validation(format!("signed tx serialization failed: {e}")))?;
        let payload = self.post("/wallet/broadcasttransaction", body).await?;
        let mut result = BroadcastResult::from_response(payload);
        result.message = result.message.take().map(|m| decode_node_message(&m));
        Ok(result)
    }
}

/// Node error messages arrive hex-encoded; anything that does not decode to
/// UTF-8 is returned unchanged.
pub fn decode_node_message(raw: &str) -> String {
    alloy::hex::decode(raw)
        .ok()
        .and_then(|bytes| String::from_utf8(bytes).ok())
        .unwrap_or_else(|| raw.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_hex_node_messages() {
        assert_eq!(
            decode_node_message("5349474552524f52"),
            "SIGERROR".to_owned()
        );
        assert_eq!(decode_node_message("not hex"), "not hex");
    }
}
