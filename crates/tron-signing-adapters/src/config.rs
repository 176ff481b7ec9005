use std::path::PathBuf;

use alloy::primitives::address;
use tracing::warn;

use tron_signing_core::{ConcurrencyPolicy, FlowPolicy, DEFAULT_FEE_LIMIT};

use crate::address::TronAddress;
use crate::wallet::SUPPORTED_WALLETS;

pub const ENV_PREFIX: &str = "TRON_DAPP_";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RuntimeProfile {
    #[default]
    Development,
    Production,
}

impl RuntimeProfile {
    fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Some(Self::Development),
            "production" | "prod" => Some(Self::Production),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AdapterConfig {
    pub runtime_profile: RuntimeProfile,
    pub full_host: String,
    /// Sent as `TRON-PRO-API-KEY` on every full-node request.
    pub api_key: Option<String>,
    pub request_timeout_ms: u64,
    pub default_fee_limit: u64,
    pub wallet_proxy_url: Option<String>,
    pub installed_wallets: Vec<String>,
    pub preferred_wallet: Option<String>,
    /// Connect as soon as a wallet is selected. Never applied on startup.
    pub auto_connect: bool,
    pub deterministic_address: String,
    pub intent_store_path: Option<PathBuf>,
    pub token_contract: String,
    pub spender_contract: String,
    pub demo_receiver: String,
    pub approve_amount: String,
    pub trx_transfer_amount: String,
    pub reject_concurrent_flows: bool,
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            runtime_profile: RuntimeProfile::Development,
            full_host: "https://api.trongrid.io".to_owned(),
            api_key: None,
            request_timeout_ms: 15_000,
            default_fee_limit: DEFAULT_FEE_LIMIT,
            wallet_proxy_url: None,
            installed_wallets: SUPPORTED_WALLETS.iter().map(|w| (*w).to_owned()).collect(),
            preferred_wallet: None,
            auto_connect: true,
            deterministic_address: TronAddress::from_evm(address!(
                "1000000000000000000000000000000000000001"
            ))
            .to_base58(),
            intent_store_path: None,
            token_contract: "TR7NHqjeKQxGTCi8q8ZY4pL8otSzgjLj6t".to_owned(),
            spender_contract: "TJcyoiPsNra9ozVkAMHaXaDhH8TJCUwuLD".to_owned(),
            demo_receiver: "TPZvqumzsmNhLNLMYGb7o2rUAfXqtFgkmR".to_owned(),
            approve_amount: "100".to_owned(),
            trx_transfer_amount: "0.001".to_owned(),
            reject_concurrent_flows: true,
        }
    }
}

impl AdapterConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(format!("{ENV_PREFIX}{key}")).ok())
    }

    /// Builds a config from `lookup(KEY)`; unset or unparsable keys keep
    /// their defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_owned())
                .filter(|v| !v.is_empty())
        };
        let mut cfg = Self::default();

        if let Some(raw) = get("PROFILE") {
            match RuntimeProfile::parse(&raw) {
                Some(profile) => cfg.runtime_profile = profile,
                None => warn!(target: "adapters::config", value = %raw, "unknown runtime profile"),
            }
        }
        if let Some(v) = get("FULL_HOST") {
            cfg.full_host = v.trim_end_matches('/').to_owned();
        }
        cfg.api_key = get("API_KEY");
        parse_into(&get, "REQUEST_TIMEOUT_MS", &mut cfg.request_timeout_ms);
        parse_into(&get, "FEE_LIMIT", &mut cfg.default_fee_limit);
        cfg.wallet_proxy_url = get("WALLET_PROXY_URL");
        if let Some(v) = get("INSTALLED_WALLETS") {
            cfg.installed_wallets = v
                .split(',')
                .map(|x| x.trim().to_owned())
                .filter(|x| !x.is_empty())
                .collect();
        }
        cfg.preferred_wallet = get("PREFERRED_WALLET");
        parse_into(&get, "AUTO_CONNECT", &mut cfg.auto_connect);
        if let Some(v) = get("DETERMINISTIC_ADDRESS") {
            cfg.deterministic_address = v;
        }
        cfg.intent_store_path = get("INTENT_STORE").map(PathBuf::from);
        if let Some(v) = get("TOKEN_CONTRACT") {
            cfg.token_contract = v;
        }
        if let Some(v) = get("SPENDER_CONTRACT") {
            cfg.spender_contract = v;
        }
        if let Some(v) = get("RECEIVER") {
            cfg.demo_receiver = v;
        }
        if let Some(v) = get("APPROVE_AMOUNT") {
            cfg.approve_amount = v;
        }
        if let Some(v) = get("TRX_AMOUNT") {
            cfg.trx_transfer_amount = v;
        }
        parse_into(&get, "REJECT_CONCURRENT_FLOWS", &mut cfg.reject_concurrent_flows);
        cfg
    }

    pub fn strict_runtime_required(&self) -> bool {
        self.runtime_profile == RuntimeProfile::Production
    }

    pub fn flow_policy(&self) -> FlowPolicy {
        FlowPolicy {
            default_fee_limit: self.default_fee_limit,
            concurrency: if self.reject_concurrent_flows {
                ConcurrencyPolicy::RejectDuplicate
            } else {
                ConcurrencyPolicy::Allow
            },
        }
    }
}

fn parse_into<G, T>(get: &G, key: &str, slot: &mut T)
where
    G: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let Some(raw) = get(key) else {
        return;
    };
    match raw.parse() {
        Ok(v) => *slot = v,
        Err(e) => warn!(target: "adapters::config", key, value = %raw, error = %e, "ignoring invalid setting"),
    }
}
