use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Lifecycle of an application update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum UpdateState {
    Idle,
    Checking,
    Available {
        version: String,
        notes: String,
    },
    Downloading {
        percent: f64,
    },
    Downloaded {
        version: String,
        #[serde(skip)]
        artifact: PathBuf,
    },
    Installing {
        version: String,
    },
    Error {
        message: String,
    },
}

impl UpdateState {
    pub fn name(&self) -> &'static str {
        match self {
            UpdateState::Idle => "idle",
            UpdateState::Checking => "checking",
            UpdateState::Available { .. } => "available",
            UpdateState::Downloading { .. } => "downloading",
            UpdateState::Downloaded { .. } => "downloaded",
            UpdateState::Installing { .. } => "installing",
            UpdateState::Error { .. } => "error",
        }
    }
}

/// Runtime notifications from an update source.
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateEvent {
    Checking,
    Available {
        version: String,
        notes: String,
    },
    NotAvailable,
    Progress {
        percent: f64,
        bytes_per_second: f64,
        transferred: u64,
        total: u64,
    },
    Downloaded {
        version: String,
        artifact: PathBuf,
    },
    Error(String),
}
