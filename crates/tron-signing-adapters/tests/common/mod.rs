#![allow(dead_code)]

use std::io::Read;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

use serde_json::{json, Value};
use tiny_http::{Response, Server, StatusCode};

use tron_signing_adapters::{AdapterConfig, RuntimeProfile};
use tron_signing_core::{ClockPort, PortError};

pub const OWNER: &str = "TPZvqumzsmNhLNLMYGb7o2rUAfXqtFgkmR";
pub const TOKEN: &str = "TR7NHqjeKQxGTCi8q8ZY4pL8otSzgjLj6t";
pub const SPENDER: &str = "TJcyoiPsNra9ozVkAMHaXaDhH8TJCUwuLD";

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub path: String,
    pub body: Value,
    pub api_key: Option<String>,
}

pub type Requests = Arc<Mutex<Vec<RecordedRequest>>>;

/// Serves up to `max_requests` JSON requests, answering each through
/// `handler(path, body) -> (status, payload)`.
pub fn spawn_json_server<F>(max_requests: usize, handler: F) -> (String, Requests)
where
    F: Fn(&str, &Value) -> (u16, Value) + Send + 'static,
{
    spawn_text_server(max_requests, move |path, body| {
        let (code, payload) = handler(path, body);
        (code, payload.to_string())
    })
}

/// Like [`spawn_json_server`], but the response body is sent verbatim.
pub fn spawn_text_server<F>(max_requests: usize, handler: F) -> (String, Requests)
where
    F: Fn(&str, &Value) -> (u16, String) + Send + 'static,
{
    let server = Server::http("127.0.0.1:0").expect("start server");
    let addr = format!("http://{}", server.server_addr());
    let requests: Requests = Arc::new(Mutex::new(Vec::new()));
    let recorded = Arc::clone(&requests);

    thread::spawn(move || {
        for _ in 0..max_requests {
            let mut req = match server.recv() {
                Ok(r) => r,
                Err(_) => break,
            };
            let path = req.url().to_owned();
            let api_key = req
                .headers()
                .iter()
                .find(|h| h.field.equiv("TRON-PRO-API-KEY"))
                .map(|h| h.value.as_str().to_owned());
            let mut raw = String::new();
            let _ = req.as_reader().read_to_string(&mut raw);
            let body: Value = serde_json::from_str(&raw).unwrap_or(Value::Null);

            let (code, payload) = handler(&path, &body);
            if let Ok(mut g) = recorded.lock() {
                g.push(RecordedRequest {
                    path,
                    body,
                    api_key,
                });
            }
            let response = Response::from_string(payload).with_status_code(StatusCode(code));
            let _ = req.respond(response);
        }
    });

    (addr, requests)
}

pub fn unsigned_tx_json(txid: &str) -> Value {
    json!({
        "visible": true,
        "txID": txid,
        "raw_data": {
            "contract": [{ "type": "TriggerSmartContract" }],
            "expiration": 1_760_000_060_000u64,
            "timestamp": 1_760_000_000_000u64
        },
        "raw_data_hex": "0a02"
    })
}

pub fn config_with(full_host: Option<&str>, wallet_proxy_url: Option<&str>) -> AdapterConfig {
    let mut cfg = AdapterConfig {
        runtime_profile: RuntimeProfile::Development,
        request_timeout_ms: 5_000,
        wallet_proxy_url: wallet_proxy_url.map(str::to_owned),
        ..AdapterConfig::default()
    };
    if let Some(host) = full_host {
        cfg.full_host = host.to_owned();
    }
    cfg
}

#[derive(Debug, Default)]
pub struct TestClock {
    now: AtomicU64,
}

impl ClockPort for TestClock {
    fn now_ms(&self) -> Result<u64, PortError> {
        Ok(self.now.fetch_add(1, Ordering::SeqCst) + 1_760_000_000_000)
    }
}
