// Copyright (C) 2026 Castpanel contributors
//
// This file is part of Castpanel.
//
// Castpanel is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// Castpanel is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with Castpanel.  If not, see <https://www.gnu.org/licenses/>.

use std::sync::Arc;

use anyhow::Result;
use backend_client::BackendClient;
use log::{debug, error};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use panel::config::Config;
use panel::session::{broker, BrokerMessage};
use panel::transport::TcpTransport;
use panel::ui::{LoggingModal, UiState};
use panel::workflow::CastWorkflow;
use panel::Event;

fn render(ui: &UiState) {
    if !ui.picker_open {
        return;
    }

    if let Some(loading) = ui.loading {
        println!("[{}]", loading.message());
    }

    if ui.device_list_visible {
        if ui.devices.is_empty() {
            println!("No receivers found");
        }
        for device in &ui.devices {
            println!("  * {}", device.display_name);
        }
    }

    if let Some(err) = &ui.error {
        println!("Error: {err}");
    }
}

fn spawn_command_loop(event_tx: mpsc::Sender<Event>, backend: BackendClient, preview_url: String) {
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        println!("Commands: open | pick <device> | retry | relay <device> | close | quit");

        while let Ok(Some(line)) = lines.next_line().await {
            let line = line.trim();

            let event = if line == "open" {
                Event::OpenPicker
            } else if line == "close" {
                Event::ClosePicker
            } else if line == "retry" {
                Event::RetryScan
            } else if line == "quit" {
                Event::Quit
            } else if let Some(device) = line.strip_prefix("pick ") {
                Event::DeviceSelected(device.to_owned())
            } else if let Some(device) = line.strip_prefix("relay ") {
                // Out-of-band path: the backend relays the command itself
                match backend.cast(device, &preview_url).await {
                    Ok(()) => println!("Relay cast requested"),
                    Err(err) => error!("Relay cast failed: {err}"),
                }
                continue;
            } else if line.is_empty() {
                continue;
            } else {
                println!("Unknown command: {line}");
                continue;
            };

            let quit = matches!(event, Event::Quit);
            if event_tx.send(event).await.is_err() || quit {
                break;
            }
        }
    });
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_module("panel", panel::default_log_level())
        .filter_module("castpanel", panel::default_log_level())
        .filter_module("cast_proto", panel::default_log_level())
        .filter_module("backend_client", panel::default_log_level())
        .init();

    let config = Config::load()?;
    debug!("Loaded config: {config:?}");

    let (event_tx, event_rx) = mpsc::channel::<Event>(100);
    let (broker_tx, broker_rx) = mpsc::channel::<BrokerMessage>(100);

    tokio::spawn(broker(TcpTransport::new(config.receiver_addr), broker_rx));

    let backend = BackendClient::new(config.backend_url.clone());

    let mut workflow = CastWorkflow::new(
        Arc::new(backend.clone()),
        broker_tx.clone(),
        event_tx.clone(),
        Box::new(LoggingModal),
        config.preview_url.clone(),
    );

    spawn_command_loop(event_tx, backend, config.preview_url);

    workflow.run_event_loop(event_rx, render).await;

    if !broker_tx.is_closed() {
        let _ = broker_tx.send(BrokerMessage::Quit).await;
    }

    Ok(())
}
