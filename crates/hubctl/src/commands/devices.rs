//! Device command handlers.

use std::path::Path;

use chrono::{DateTime, Utc};
use futures_util::StreamExt;
use serde::Serialize;
use tabled::Tabled;
use tokio_util::sync::CancellationToken;

use hubctl_core::{
    CoreError, Device, DeviceCreationResult, DeviceState, Notification, Notifier, OnboardingFlow,
    OnboardingStrategy,
};

use crate::cli::{DevicesArgs, DevicesCommand, GlobalOpts, OutputFormat, StateArg};
use crate::config::HubContext;
use crate::error::CliError;
use crate::output::{self, TerminalNotifier};

use super::util;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct DeviceRow {
    #[tabled(rename = "Device ID")]
    device_id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "State")]
    state: String,
    #[tabled(rename = "Owner")]
    owner: String,
}

impl DeviceRow {
    fn new(d: &Device, color: bool) -> Self {
        Self {
            device_id: d.device_id.clone(),
            name: d.display_name().to_owned(),
            state: output::paint_state(d.state, color),
            owner: d.owner.clone(),
        }
    }
}

fn detail(d: &Device, color: bool) -> String {
    [
        format!("Device ID: {}", d.device_id),
        format!("Name:      {}", d.display_name()),
        format!("State:     {}", output::paint_state(d.state, color)),
        format!("Owner:     {}", if d.owner.is_empty() { "-" } else { &d.owner }),
        format!("Record ID: {}", d.id.as_deref().unwrap_or("-")),
    ]
    .join("\n")
}

#[derive(Serialize)]
struct SummaryView {
    total: usize,
    on: usize,
    off: usize,
    last_refresh: Option<DateTime<Utc>>,
}

fn summary_detail(s: &SummaryView) -> String {
    let refreshed = s
        .last_refresh
        .map_or_else(|| "-".into(), |t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string());
    [
        format!("Total:     {}", s.total),
        format!("On:        {}", s.on),
        format!("Off:       {}", s.off),
        format!("Refreshed: {refreshed}"),
    ]
    .join("\n")
}

fn creation_detail(r: &DeviceCreationResult, saved_qr: Option<&Path>) -> String {
    let mut lines = vec![
        format!("Device ID: {}", r.device_id),
        format!("Topic:     {}", r.topic),
    ];
    if let Some(message) = r.message() {
        lines.push(format!("Message:   {message}"));
    }
    match (r.qr(), saved_qr) {
        (Some(_), Some(path)) => lines.push(format!("QR code:   {}", path.display())),
        (Some(qr), None) => lines.push(format!("QR code:   {qr}")),
        (None, _) => {}
    }
    lines.join("\n")
}

/// A state change seen on the watch stream.
#[derive(Serialize)]
struct StateEvent<'a> {
    device_id: &'a str,
    state: DeviceState,
    at: DateTime<Utc>,
}

fn not_found(device_id: &str) -> CliError {
    CliError::NotFound {
        resource_type: "device".into(),
        identifier: device_id.into(),
        list_command: "devices list".into(),
    }
}

fn to_state(arg: StateArg) -> DeviceState {
    match arg {
        StateArg::On => DeviceState::On,
        StateArg::Off => DeviceState::Off,
    }
}

// ── Handler ─────────────────────────────────────────────────────────

#[allow(clippy::too_many_lines)]
pub async fn handle(
    ctx: &HubContext,
    args: DevicesArgs,
    global: &GlobalOpts,
    ui: &TerminalNotifier,
) -> Result<(), CliError> {
    let hub = &ctx.hub;
    let color = output::should_color(&global.color);

    match args.command {
        DevicesCommand::List => {
            util::load_devices(hub, ui).await?;
            let devices = hub.devices();
            let out = output::render_list(
                &global.output,
                devices.as_slice(),
                |d| DeviceRow::new(d, color),
                |d| d.device_id.clone(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        DevicesCommand::Get { device_id } => {
            util::load_devices(hub, ui).await?;
            let device = hub.device(&device_id).ok_or_else(|| not_found(&device_id))?;
            let out = output::render_single(
                &global.output,
                &device,
                |d| detail(d, color),
                |d| d.state.to_string(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        DevicesCommand::Summary => {
            util::load_devices(hub, ui).await?;
            let summary = hub.summary();
            let view = SummaryView {
                total: summary.total,
                on: summary.on,
                off: summary.off,
                last_refresh: hub.board().last_refresh(),
            };
            let out = output::render_single(&global.output, &view, summary_detail, |s| {
                format!("{} {} {}", s.total, s.on, s.off)
            })?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        DevicesCommand::Toggle { device_id, state } => {
            let target = match state {
                Some(arg) => to_state(arg),
                None => {
                    util::load_devices(hub, ui).await?;
                    hub.device(&device_id)
                        .ok_or_else(|| not_found(&device_id))?
                        .state
                        .toggled()
                }
            };
            set_state(ctx, &device_id, target, global, ui, color).await
        }

        DevicesCommand::On { device_id } => {
            set_state(ctx, &device_id, DeviceState::On, global, ui, color).await
        }

        DevicesCommand::Off { device_id } => {
            set_state(ctx, &device_id, DeviceState::Off, global, ui, color).await
        }

        DevicesCommand::Register { id, scan, name } => {
            util::require_session(hub)?;
            let id = match (id, scan) {
                (Some(id), _) => id,
                (None, Some(source)) => {
                    let id = util::scan_device_id(&source)?;
                    ui.notify(Notification::success(
                        "QR Code scanned!",
                        "Device ID has been filled automatically.",
                    ));
                    id
                }
                (None, None) => {
                    return Err(CliError::Validation {
                        field: "id".into(),
                        reason: "pass --id or --scan".into(),
                    });
                }
            };

            let strategy = OnboardingStrategy::client_supplied(id, name.unwrap_or_default());
            let mut flow = OnboardingFlow::new();
            let result =
                util::with_spinner(ui, "Registering device...", flow.submit(hub, strategy)).await?;

            let out = output::render_single(
                &global.output,
                &result,
                |r| creation_detail(r, None),
                |r| r.device_id.clone(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        DevicesCommand::Add { name, save_qr } => {
            util::require_session(hub)?;
            let strategy = OnboardingStrategy::server_generated(name);
            let mut flow = OnboardingFlow::new();
            let result =
                util::with_spinner(ui, "Adding device...", flow.submit(hub, strategy)).await?;

            // Render the result even if the write fails: the QR is one-time.
            let saved = flow.save_qr(&save_qr);
            flow.close();

            if let Ok(ref path) = saved {
                ui.info(&format!("Saved QR code to {}", path.display()));
            }
            let out = output::render_single(
                &global.output,
                &result,
                |r| creation_detail(r, saved.as_deref().ok()),
                |r| r.device_id.clone(),
            )?;
            output::print_output(&out, global.quiet);
            saved.map(|_| ()).map_err(CliError::from)
        }

        DevicesCommand::Watch { device_id } => watch(ctx, &device_id, global, color).await,
    }
}

async fn set_state(
    ctx: &HubContext,
    device_id: &str,
    state: DeviceState,
    global: &GlobalOpts,
    ui: &TerminalNotifier,
    color: bool,
) -> Result<(), CliError> {
    let hub = &ctx.hub;
    util::require_session(hub)?;
    util::with_spinner(ui, "Updating device...", hub.toggle(device_id, state)).await?;

    // The reload after the toggle may have failed; then there is nothing
    // fresh to show.
    if let Some(device) = hub.device(device_id) {
        let out = output::render_single(
            &global.output,
            &device,
            |d| detail(d, color),
            |d| d.state.to_string(),
        )?;
        output::print_output(&out, global.quiet);
    }
    Ok(())
}

async fn watch(
    ctx: &HubContext,
    device_id: &str,
    global: &GlobalOpts,
    color: bool,
) -> Result<(), CliError> {
    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_interrupt.cancel();
        }
    });

    let mut stream = ctx.hub.watch_device(device_id, cancel.clone()).await?;
    tracing::info!(device_id, "watching device state");

    while let Some(state) = stream.next().await {
        let event = StateEvent {
            device_id,
            state: state.map_err(CoreError::from)?,
            at: Utc::now(),
        };
        let line = match global.output {
            OutputFormat::Table => format!(
                "{}  {}  {}",
                event.at.format("%H:%M:%S"),
                event.device_id,
                output::paint_state(event.state, color)
            ),
            OutputFormat::Json | OutputFormat::JsonCompact => serde_json::to_string(&event)?,
            OutputFormat::Yaml => format!("---\n{}", serde_yaml::to_string(&event)?),
            OutputFormat::Plain => event.state.to_string(),
        };
        output::print_output(&line, global.quiet);
    }

    cancel.cancel();
    Ok(())
}
