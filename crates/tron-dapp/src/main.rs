//! tron-dapp: connect a TRON wallet, sign messages and run approve/transfer flows

use eframe::egui;
use eyre::WrapErr;

use tron_signing_adapters::AdapterConfig;

mod app;
mod bridge;
mod state;
mod toast;
mod ui;

fn main() -> eyre::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let config = AdapterConfig::from_env();
    tracing::info!(
        full_host = %config.full_host,
        profile = ?config.runtime_profile,
        "Starting tron-dapp"
    );
    let bridge = bridge::DappBridge::from_config(config).wrap_err("failed to build adapters")?;

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("TRON dApp")
            .with_inner_size([820.0, 720.0])
            .with_min_inner_size([560.0, 420.0]),
        ..Default::default()
    };

    eframe::run_native(
        "tron-dapp",
        native_options,
        Box::new(move |cc| Ok(Box::new(app::App::new(cc, bridge)))),
    )
    .map_err(|e| eyre::eyre!("ui terminated: {e}"))
}
