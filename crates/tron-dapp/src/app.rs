//! Main application state and update loop

use std::sync::{Arc, Mutex};

use eframe::egui;
use tracing::debug;

use tron_signing_core::{
    CompensationOutcome, FlowIntent, Notification, WalletEvent, WalletEventKind,
};

use crate::bridge::{DappBridge, OpKind, OpResult, Operation, ResultQueue};
use crate::state::{ApproveState, Banner, SignMessageState, TransferState, WalletPanelState};
use crate::toast::Toasts;
use crate::ui;

const MAX_EVENT_LOG: usize = 50;

pub struct App {
    bridge: DappBridge,
    results: ResultQueue,
    wallet: WalletPanelState,
    sign: SignMessageState,
    transfer: TransferState,
    approve: ApproveState,
    toasts: Toasts,
    /// Wallet events, newest last
    event_log: Vec<String>,
    pending: Vec<FlowIntent>,
    resuming: Option<String>,
}

impl App {
    pub fn new(_cc: &eframe::CreationContext<'_>, bridge: DappBridge) -> Self {
        let config = bridge.config();
        let wallet = WalletPanelState::new(
            bridge.available_wallets(),
            config.preferred_wallet.as_deref(),
        );
        let transfer = TransferState::from_config(config);
        let approve = ApproveState::from_config(config);
        let pending = bridge.pending_compensations();
        Self {
            results: Arc::new(Mutex::new(Vec::new())),
            wallet,
            sign: SignMessageState::default(),
            transfer,
            approve,
            toasts: Toasts::default(),
            event_log: Vec::new(),
            pending,
            resuming: None,
            bridge,
        }
    }
}

impl eframe::App for App {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        ctx.set_visuals(egui::Visuals::dark());

        let now = ctx.input(|i| i.time);
        self.check_results(now);
        self.check_wallet_events();

        let mut ops = Vec::new();

        egui::TopBottomPanel::top("header").show(ctx, |ui| {
            ui.add_space(8.0);
            ui.horizontal(|ui| {
                ui.heading(
                    egui::RichText::new("TRON dApp")
                        .size(22.0)
                        .color(ui::ACCENT_COLOR),
                );
                ui.add_space(20.0);
                ui.separator();
                let status = match self.wallet.connection.connected_address() {
                    Some(address) => format!("Connected: {address}"),
                    None => "Not connected".to_owned(),
                };
                ui.label(status);
            });
            ui.add_space(4.0);
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                ui.add_space(10.0);
                self.render_components(ui, &mut ops);
                self.render_connection_info(ui);
                self.render_sign_message(ui, &mut ops);
                self.render_transfer(ui, &mut ops);
                self.render_compensations(ui, &mut ops);
                self.render_event_log(ui);
                ui.add_space(20.0);
            });
        });

        for op in ops {
            self.dispatch(ctx, op);
        }

        self.toasts.show(ctx);
    }
}

impl App {
    fn dispatch(&mut self, ctx: &egui::Context, op: Operation) {
        match op.kind() {
            OpKind::Connect | OpKind::Disconnect => self.wallet.busy = true,
            OpKind::SignMessage => self.sign.busy = true,
            OpKind::TransferTrx => {
                self.transfer.busy = true;
                self.transfer.banner = None;
            }
            OpKind::ApproveTransfer => {
                self.approve.busy = true;
                self.approve.banner = None;
            }
            OpKind::ResumeCompensation => {}
        }
        if let Operation::ResumeCompensation(ref id) = op {
            self.resuming = Some(id.clone());
        }
        self.bridge.spawn(ctx, &self.results, op);
    }

    fn check_results(&mut self, now: f64) {
        let drained: Vec<OpResult> = match self.results.lock() {
            Ok(mut g) => g.drain(..).collect(),
            Err(_) => return,
        };

        for result in drained {
            match result {
                OpResult::Connected(state) => {
                    self.wallet.busy = false;
                    if let Some(ref name) = state.wallet_name {
                        self.wallet.selected_wallet = name.clone();
                    }
                    self.wallet.connection = state;
                }
                OpResult::Disconnected => {
                    self.wallet.busy = false;
                    self.wallet.connection = self.bridge.connection_state();
                    self.sign.signature = None;
                }
                OpResult::MessageSigned(signature) => {
                    self.sign.busy = false;
                    self.sign.signature = Some(signature);
                }
                OpResult::TrxTransferred(receipt) => {
                    self.transfer.busy = false;
                    let address = self
                        .wallet
                        .connection
                        .connected_address()
                        .unwrap_or_default()
                        .to_owned();
                    let notification = Notification::transfer_success(&address, &receipt);
                    self.toasts.push(notification.clone(), now);
                    self.transfer.banner = Some(Banner::Success(notification));
                }
                OpResult::FlowCompleted(outcome) => {
                    self.approve.busy = false;
                    let notification = Notification::flow_success(&outcome);
                    self.toasts.push(notification.clone(), now);
                    self.approve.banner = Some(Banner::Success(notification));
                }
                OpResult::CompensationSettled(outcome) => {
                    self.resuming = None;
                    let message = match outcome {
                        CompensationOutcome::Compensated { txid } => {
                            format!("Allowance revoked in {txid}")
                        }
                        CompensationOutcome::Deferred { reason } => {
                            format!("Compensation deferred: {reason}")
                        }
                    };
                    self.toasts.push(Notification::info(message), now);
                    self.pending = self.bridge.pending_compensations();
                }
                OpResult::Failed { op, error } => {
                    let notification = Notification::from_error(&error);
                    match op {
                        OpKind::Connect | OpKind::Disconnect => self.wallet.busy = false,
                        OpKind::SignMessage => self.sign.busy = false,
                        OpKind::TransferTrx => {
                            self.transfer.busy = false;
                            self.transfer.banner =
                                Some(Banner::Failure(notification.message.clone()));
                        }
                        OpKind::ApproveTransfer => {
                            self.approve.busy = false;
                            self.approve.banner =
                                Some(Banner::Failure(notification.message.clone()));
                            self.pending = self.bridge.pending_compensations();
                        }
                        OpKind::ResumeCompensation => self.resuming = None,
                    }
                    if error.is_wallet_error() {
                        self.wallet.connection = self.bridge.connection_state();
                    }
                    self.toasts.push(notification, now);
                }
            }
        }
    }

    fn check_wallet_events(&mut self) {
        let events = self.bridge.drain_wallet_events();
        if events.is_empty() {
            return;
        }
        for event in &events {
            debug!(sequence = event.sequence, kind = ?event.kind, value = %event.value, "wallet event");
            self.event_log.push(describe_event(event));
        }
        if self.event_log.len() > MAX_EVENT_LOG {
            let overflow = self.event_log.len() - MAX_EVENT_LOG;
            self.event_log.drain(..overflow);
        }
        self.wallet.connection = self.bridge.connection_state();
    }

    fn render_components(&mut self, ui: &mut egui::Ui, ops: &mut Vec<Operation>) {
        ui::styled_heading(ui, "UI Components");
        ui.add_space(8.0);

        let connected = self.wallet.connection.connected;
        let busy = self.wallet.busy;

        ui::card(ui, |ui| {
            egui::Grid::new("component_table")
                .num_columns(2)
                .spacing([40.0, 10.0])
                .striped(true)
                .show(ui, |ui| {
                    ui.label(egui::RichText::new("Component").strong());
                    ui.label(egui::RichText::new("Action").strong());
                    ui.end_row();

                    ui.label("Connect Button");
                    if ui::primary_button(ui, "Connect", !busy && !connected).clicked() {
                        ops.push(Operation::Connect(self.wallet.selected()));
                    }
                    ui.end_row();

                    ui.label("Disconnect Button");
                    if ui::primary_button(ui, "Disconnect", !busy && connected).clicked() {
                        ops.push(Operation::Disconnect);
                    }
                    ui.end_row();

                    ui.label("Select Wallet");
                    let previous = self.wallet.selected_wallet.clone();
                    ui.add_enabled_ui(!busy, |ui| {
                        egui::ComboBox::from_id_salt("wallet_select")
                            .selected_text(&self.wallet.selected_wallet)
                            .width(180.0)
                            .show_ui(ui, |ui| {
                                for name in &self.wallet.wallets {
                                    ui.selectable_value(
                                        &mut self.wallet.selected_wallet,
                                        name.clone(),
                                        name,
                                    );
                                }
                            });
                    });
                    if self.wallet.selected_wallet != previous && self.bridge.config().auto_connect
                    {
                        ops.push(Operation::Connect(self.wallet.selected()));
                    }
                    ui.end_row();

                    ui.label("Multi Action");
                    let address = self.wallet.connection.address.clone();
                    ui.add_enabled_ui(!busy, |ui| {
                        let label = if connected { "Wallet ▾" } else { "Connect ▾" };
                        ui.menu_button(label, |ui| {
                            if !connected {
                                for name in &self.wallet.wallets {
                                    if ui.button(format!("Connect {name}")).clicked() {
                                        ops.push(Operation::Connect(Some(name.clone())));
                                        ui.close_menu();
                                    }
                                }
                            } else {
                                if let Some(ref address) = address {
                                    if ui.button("Copy address").clicked() {
                                        ui::copy_to_clipboard(address);
                                        ui.close_menu();
                                    }
                                }
                                if ui.button("Disconnect").clicked() {
                                    ops.push(Operation::Disconnect);
                                    ui.close_menu();
                                }
                            }
                        });
                    });
                    ui.end_row();
                });

            if busy {
                ui.add_space(6.0);
                ui::busy_indicator(ui, "Waiting for wallet...");
            }
        });
    }

    fn render_connection_info(&self, ui: &mut egui::Ui) {
        ui::section_header(ui, "Wallet Connection Info");
        let state = &self.wallet.connection;
        egui::Grid::new("connection_info")
            .num_columns(2)
            .spacing([20.0, 6.0])
            .show(ui, |ui| {
                ui.label("Connected:");
                let (text, color) = if state.connected {
                    ("yes", ui::SUCCESS_COLOR)
                } else {
                    ("no", ui::ERROR_COLOR)
                };
                ui.label(egui::RichText::new(text).color(color));
                ui.end_row();

                ui.label("Wallet:");
                ui.label(state.wallet_name.as_deref().unwrap_or("-"));
                ui.end_row();

                ui.label("Address:");
                match state.address {
                    Some(ref address) => ui::copyable_value(ui, address),
                    None => {
                        ui.label("-");
                    }
                }
                ui.end_row();
            });
    }

    fn render_sign_message(&mut self, ui: &mut egui::Ui, ops: &mut Vec<Operation>) {
        ui::section_header(ui, "Sign a message");
        let address = self.wallet.connection.connected_address().map(str::to_owned);

        ui.horizontal(|ui| {
            ui.label("Message:");
            ui.add(
                egui::TextEdit::singleline(&mut self.sign.message).desired_width(320.0),
            );
        });
        ui.add_space(6.0);
        ui.horizontal(|ui| {
            let can_sign = address.is_some() && !self.sign.busy;
            if ui::primary_button(ui, "Sign Message", can_sign).clicked() {
                ops.push(Operation::SignMessage(self.sign.message.clone()));
            }
            if self.sign.busy {
                ui.spinner();
            }
        });
        if let Some(ref signature) = self.sign.signature {
            ui.add_space(6.0);
            ui.label("Signed message:");
            ui::copyable_value(ui, signature);
        }

        ui.add_space(12.0);
        ui.label(egui::RichText::new("Approve and transfer USDT").strong());
        egui::Grid::new("approve_form")
            .num_columns(2)
            .spacing([20.0, 6.0])
            .show(ui, |ui| {
                ui.label("Token:");
                ui.text_edit_singleline(&mut self.approve.token_contract);
                ui.end_row();
                ui.label("Spender:");
                ui.text_edit_singleline(&mut self.approve.spender_contract);
                ui.end_row();
                ui.label("Amount:");
                ui.text_edit_singleline(&mut self.approve.amount);
                ui.end_row();
            });
        ui.add_space(6.0);
        ui.horizontal(|ui| {
            let enabled = address.is_some() && !self.approve.busy;
            if ui::primary_button(ui, "Approval", enabled).clicked() {
                if let Some(ref sender) = address {
                    match self.approve.request(sender) {
                        Ok(request) => ops.push(Operation::ApproveTransfer(request)),
                        Err(e) => {
                            self.approve.banner = Some(Banner::Failure(
                                Notification::from_error(&e).message,
                            ))
                        }
                    }
                }
            }
            if self.approve.busy {
                ui.spinner();
            }
        });
        if let Some(ref banner) = self.approve.banner {
            ui.add_space(4.0);
            ui::banner(ui, banner);
        }
    }

    fn render_transfer(&mut self, ui: &mut egui::Ui, ops: &mut Vec<Operation>) {
        ui::section_header(ui, "Sign a Transaction");
        let connected = self.wallet.connection.connected;

        egui::Grid::new("transfer_form")
            .num_columns(2)
            .spacing([20.0, 6.0])
            .show(ui, |ui| {
                ui.label("Receiver:");
                ui.text_edit_singleline(&mut self.transfer.receiver);
                ui.end_row();
                ui.label("Amount (TRX):");
                ui.text_edit_singleline(&mut self.transfer.amount);
                ui.end_row();
            });
        ui.add_space(6.0);
        ui.horizontal(|ui| {
            let label = format!("Transfer {} TRX", self.transfer.amount.trim());
            if ui::primary_button(ui, &label, connected && !self.transfer.busy).clicked() {
                match self.transfer.amount_sun() {
                    Ok(amount_sun) => ops.push(Operation::TransferTrx {
                        receiver: self.transfer.receiver.trim().to_owned(),
                        amount_sun,
                    }),
                    Err(e) => {
                        self.transfer.banner =
                            Some(Banner::Failure(Notification::from_error(&e).message))
                    }
                }
            }
            if self.transfer.busy {
                ui.spinner();
            }
        });
        if let Some(ref banner) = self.transfer.banner {
            ui.add_space(4.0);
            ui::banner(ui, banner);
        }
    }

    fn render_compensations(&mut self, ui: &mut egui::Ui, ops: &mut Vec<Operation>) {
        if self.pending.is_empty() {
            return;
        }
        ui::section_header(ui, "Pending compensations");
        ui.label(
            egui::RichText::new("Approvals whose transfer failed. The allowance is still live.")
                .color(egui::Color32::GRAY),
        );
        ui.add_space(6.0);
        for intent in &self.pending {
            ui.horizontal(|ui| {
                ui.label(egui::RichText::new(&intent.intent_id).monospace());
                if let Some(ref txid) = intent.approve_txid {
                    ui.label(format!("approve {txid}"));
                }
                let busy = self.resuming.as_deref() == Some(intent.intent_id.as_str());
                if ui
                    .add_enabled(!busy, egui::Button::new("Revoke allowance"))
                    .clicked()
                {
                    ops.push(Operation::ResumeCompensation(intent.intent_id.clone()));
                }
                if busy {
                    ui.spinner();
                }
            });
        }
    }

    fn render_event_log(&self, ui: &mut egui::Ui) {
        ui::section_header(ui, "Wallet events");
        if self.event_log.is_empty() {
            ui.label(egui::RichText::new("No events yet").color(egui::Color32::GRAY));
            return;
        }
        for line in self.event_log.iter().rev() {
            ui.label(egui::RichText::new(line).monospace().size(12.0));
        }
    }
}

fn describe_event(event: &WalletEvent) -> String {
    match event.kind {
        WalletEventKind::Connected => format!("#{} connected: {}", event.sequence, event.value),
        WalletEventKind::AccountChanged => {
            format!("#{} account changed: {}", event.sequence, event.value)
        }
        WalletEventKind::Disconnected => format!("#{} disconnected", event.sequence),
    }
}
