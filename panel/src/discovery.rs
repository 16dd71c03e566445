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

use backend_client::{BackendClient, DiscoveryError, ReceiverDevice};
use log::debug;
use tokio::sync::mpsc::Sender;

use crate::Event;

/// One backend scan for currently visible receivers.
#[async_trait::async_trait]
pub trait DeviceScanner: Send + Sync {
    async fn scan(&self) -> Result<Vec<ReceiverDevice>, DiscoveryError>;
}

#[async_trait::async_trait]
impl DeviceScanner for BackendClient {
    async fn scan(&self) -> Result<Vec<ReceiverDevice>, DiscoveryError> {
        BackendClient::scan(self).await
    }
}

/// Run one scan in the background and report back as [Event::ScanFinished].
pub fn spawn_scan(scanner: Arc<dyn DeviceScanner>, seq: u64, event_tx: Sender<Event>) {
    tokio::spawn(async move {
        let result = scanner.scan().await;
        if event_tx
            .send(Event::ScanFinished { seq, result })
            .await
            .is_err()
        {
            debug!("Workflow went away before scan finished");
        }
    });
}
