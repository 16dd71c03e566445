use backend_client::ReceiverDevice;
use log::debug;

use crate::workflow::WorkflowState;

/// Selector of the cast picker modal in the admin page.
pub const CAST_PICKER_MODAL: &str = "modal-cast-picker";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadingKind {
    Scanning,
    Casting,
}

impl LoadingKind {
    pub fn message(&self) -> &'static str {
        match self {
            LoadingKind::Scanning => "Scanning for receivers...",
            LoadingKind::Casting => "Casting...",
        }
    }
}

/// What the page should show. Derived from the workflow alone; rendering
/// technology never feeds state back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UiState {
    pub picker_open: bool,
    pub loading: Option<LoadingKind>,
    pub device_list_visible: bool,
    pub devices: Vec<ReceiverDevice>,
    pub error: Option<String>,
}

pub fn project(state: WorkflowState, devices: &[ReceiverDevice], error: Option<&str>) -> UiState {
    let loading = match state {
        WorkflowState::Discovering => Some(LoadingKind::Scanning),
        WorkflowState::Casting => Some(LoadingKind::Casting),
        _ => None,
    };

    // After a failed cast the scanned devices stay visible so the user can
    // pick again without a re-scan; a failed scan has no list to show.
    let device_list_visible = matches!(state, WorkflowState::AwaitingSelection)
        || (matches!(state, WorkflowState::Failed) && !devices.is_empty());

    UiState {
        picker_open: !matches!(state, WorkflowState::Idle | WorkflowState::Succeeded),
        loading,
        device_list_visible,
        devices: devices.to_vec(),
        error: error.map(str::to_owned),
    }
}

/// Boundary to the admin panel's generic modal subsystem. The workflow
/// only ever shows the picker and hides it again; the implementation is
/// not ours.
pub trait ModalSurface {
    fn show(&mut self, id: &str);
    fn hide(&mut self);
}

pub struct LoggingModal;

impl ModalSurface for LoggingModal {
    fn show(&mut self, id: &str) {
        debug!("Modal shown: {id}");
    }

    fn hide(&mut self) {
        debug!("Modal hidden");
    }
}
