pub mod abi;
pub mod address;
pub mod clock;
pub mod compensation;
pub mod config;
pub mod intent_store;
pub mod trongrid;
pub mod wallet;

pub use abi::{encode_parameters, function_selector};
pub use address::{AddressError, TronAddress};
pub use clock::SystemClockAdapter;
pub use compensation::RevokeAllowanceHook;
pub use config::{AdapterConfig, RuntimeProfile};
pub use intent_store::IntentStoreAdapter;
pub use trongrid::TronGridClient;
pub use wallet::{WalletAdapter, SUPPORTED_WALLETS};
