pub mod config;
pub mod discovery;
pub mod preview;
pub mod session;
pub mod transport;
pub mod ui;
pub mod workflow;

use backend_client::{DiscoveryError, ReceiverDevice};

use crate::session::DispatchError;

#[derive(Debug)]
pub enum Event {
    OpenPicker,
    ClosePicker,
    RetryScan,
    ScanFinished {
        seq: u64,
        result: Result<Vec<ReceiverDevice>, DiscoveryError>,
    },
    DeviceSelected(String),
    DispatchFinished {
        seq: u64,
        result: Result<(), DispatchError>,
    },
    Quit,
}

pub fn default_log_level() -> log::LevelFilter {
    if cfg!(debug_assertions) {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    }
}
