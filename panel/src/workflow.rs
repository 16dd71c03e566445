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

use backend_client::ReceiverDevice;
use cast_proto::models::CastCommand;
use log::{debug, warn};
use tokio::sync::mpsc::{Receiver, Sender};
use tokio::sync::oneshot;

use crate::discovery::{self, DeviceScanner};
use crate::session::{BrokerMessage, DispatchError};
use crate::ui::{self, ModalSurface, UiState};
use crate::Event;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowState {
    Idle,
    Discovering,
    AwaitingSelection,
    Casting,
    Succeeded,
    Failed,
}

/// Drives the user-visible cast flow: scan, pick, dispatch.
///
/// Transitions happen only on user input or operation completions.
/// Completions carry the interaction sequence number they belong to;
/// anything stale is dropped.
pub struct CastWorkflow {
    scanner: Arc<dyn DeviceScanner>,
    broker_tx: Sender<BrokerMessage>,
    event_tx: Sender<Event>,
    modal: Box<dyn ModalSurface + Send>,
    preview_url: String,
    state: WorkflowState,
    devices: Vec<ReceiverDevice>,
    error: Option<String>,
    seq: u64,
}

impl CastWorkflow {
    pub fn new(
        scanner: Arc<dyn DeviceScanner>,
        broker_tx: Sender<BrokerMessage>,
        event_tx: Sender<Event>,
        modal: Box<dyn ModalSurface + Send>,
        preview_url: String,
    ) -> Self {
        Self {
            scanner,
            broker_tx,
            event_tx,
            modal,
            preview_url,
            state: WorkflowState::Idle,
            devices: Vec::new(),
            error: None,
            seq: 0,
        }
    }

    pub fn state(&self) -> WorkflowState {
        self.state
    }

    pub fn devices(&self) -> &[ReceiverDevice] {
        &self.devices
    }

    pub fn ui_state(&self) -> UiState {
        ui::project(self.state, &self.devices, self.error.as_deref())
    }

    pub fn handle_event(&mut self, event: Event) {
        match event {
            Event::OpenPicker => {
                if !matches!(self.state, WorkflowState::Idle | WorkflowState::Succeeded) {
                    debug!("Picker already open, ignoring");
                    return;
                }

                self.modal.show(ui::CAST_PICKER_MODAL);
                self.begin_scan();
            }
            Event::RetryScan => {
                if !matches!(self.state, WorkflowState::Failed) {
                    debug!("Nothing to retry");
                    return;
                }

                self.begin_scan();
            }
            Event::ScanFinished { seq, result } => {
                if seq != self.seq || !matches!(self.state, WorkflowState::Discovering) {
                    debug!("Ignoring stale scan result");
                    return;
                }

                match result {
                    Ok(devices) => {
                        debug!("Scan finished with {} device(s)", devices.len());
                        self.devices = devices;
                        self.state = WorkflowState::AwaitingSelection;
                    }
                    Err(err) => {
                        warn!("Scan failed: {err}");
                        self.error = Some(err.to_string());
                        self.state = WorkflowState::Failed;
                    }
                }
            }
            Event::DeviceSelected(id) => {
                let can_select = matches!(self.state, WorkflowState::AwaitingSelection)
                    || (matches!(self.state, WorkflowState::Failed) && !self.devices.is_empty());
                if !can_select {
                    debug!("No selection expected, ignoring `{id}`");
                    return;
                }
                if !self.devices.iter().any(|device| device.id == id) {
                    warn!("Unknown device `{id}` selected");
                    return;
                }

                debug!("Casting {} to `{id}`", self.preview_url);
                self.error = None;
                self.state = WorkflowState::Casting;
                self.begin_dispatch();
            }
            Event::DispatchFinished { seq, result } => {
                if seq != self.seq || !matches!(self.state, WorkflowState::Casting) {
                    debug!("Ignoring stale dispatch result");
                    return;
                }

                match result {
                    Ok(()) => {
                        debug!("Cast dispatched");
                        self.state = WorkflowState::Succeeded;
                        self.modal.hide();
                    }
                    Err(err) => {
                        warn!("Dispatch failed: {err}");
                        // The scanned devices stay available for a re-pick
                        self.error = Some(err.to_string());
                        self.state = WorkflowState::Failed;
                    }
                }
            }
            Event::ClosePicker => {
                // Bumping the sequence makes in-flight completions stale
                self.seq += 1;
                self.state = WorkflowState::Idle;
                self.devices.clear();
                self.error = None;
                self.modal.hide();
            }
            Event::Quit => {}
        }
    }

    pub async fn run_event_loop<F>(&mut self, mut event_rx: Receiver<Event>, mut on_change: F)
    where
        F: FnMut(&UiState),
    {
        while let Some(event) = event_rx.recv().await {
            if matches!(event, Event::Quit) {
                break;
            }
            self.handle_event(event);
            on_change(&self.ui_state());
        }

        debug!("Workflow controller terminated");
    }

    fn begin_scan(&mut self) {
        self.seq += 1;
        self.devices.clear();
        self.error = None;
        self.state = WorkflowState::Discovering;

        discovery::spawn_scan(Arc::clone(&self.scanner), self.seq, self.event_tx.clone());
    }

    fn begin_dispatch(&mut self) {
        let command = CastCommand::Load {
            url: self.preview_url.clone(),
        };
        let seq = self.seq;
        let broker_tx = self.broker_tx.clone();
        let event_tx = self.event_tx.clone();

        tokio::spawn(async move {
            let (reply_tx, reply_rx) = oneshot::channel();
            let result = match broker_tx
                .send(BrokerMessage::Dispatch {
                    command,
                    reply: reply_tx,
                })
                .await
            {
                Ok(()) => reply_rx
                    .await
                    .unwrap_or(Err(DispatchError::BrokerUnavailable)),
                Err(_) => Err(DispatchError::BrokerUnavailable),
            };

            if event_tx
                .send(Event::DispatchFinished { seq, result })
                .await
                .is_err()
            {
                debug!("Workflow went away before dispatch finished");
            }
        });
    }
}
