use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, Sender};

use crate::app::domain::update::{UpdateEvent, UpdateState};
use crate::app::infrastructure::error::{AppError, Result};
use crate::app::services::updater::UpdateSource;
use crate::ipc::events::{Event, EventBus};

/// Update lifecycle driven by events from an [`UpdateSource`].
///
/// Commands only start work or reject illegal transitions with
/// `INVALID_STATE`; state moves when the source reports back through
/// [`AutoUpdater::handle_event`].
pub struct AutoUpdater {
    state: UpdateState,
    source: Box<dyn UpdateSource>,
    tx: Sender<UpdateEvent>,
    rx: Receiver<UpdateEvent>,
    events: EventBus,
    staged: Option<PathBuf>,
}

impl AutoUpdater {
    pub fn new(source: Box<dyn UpdateSource>, events: EventBus) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            state: UpdateState::Idle,
            source,
            tx,
            rx,
            events,
            staged: None,
        }
    }

    pub fn state(&self) -> &UpdateState {
        &self.state
    }

    /// Sender the source reports through. Cloned into worker threads.
    pub fn sender(&self) -> Sender<UpdateEvent> {
        self.tx.clone()
    }

    fn invalid(&self, command: &str) -> AppError {
        AppError::InvalidState(format!("cannot {} while {}", command, self.state.name()))
    }

    pub fn check_for_updates(&mut self) -> Result<()> {
        match self.state {
            UpdateState::Idle | UpdateState::Error { .. } | UpdateState::Available { .. } => {
                tracing::info!("checking for updates");
                self.source.check(self.tx.clone());
                Ok(())
            }
            _ => Err(self.invalid("check for updates")),
        }
    }

    /// Start downloading the available release. Never called implicitly.
    pub fn download_update(&mut self) -> Result<()> {
        let UpdateState::Available { version, .. } = &self.state else {
            return Err(self.invalid("download"));
        };
        let version = version.clone();
        tracing::info!(%version, "downloading update");
        self.state = UpdateState::Downloading { percent: 0.0 };
        self.source.download(&version, self.tx.clone());
        Ok(())
    }

    /// Mark the downloaded release for installation. The swap and relaunch
    /// happen in [`AutoUpdater::finish_install`] once the host has torn down.
    pub fn install(&mut self) -> Result<()> {
        let UpdateState::Downloaded { version, artifact } = &self.state else {
            return Err(self.invalid("install"));
        };
        tracing::info!(%version, "update scheduled for install");
        self.staged = Some(artifact.clone());
        self.state = UpdateState::Installing {
            version: version.clone(),
        };
        Ok(())
    }

    pub fn is_installing(&self) -> bool {
        matches!(self.state, UpdateState::Installing { .. })
    }

    /// Replace the program with the staged artifact. Returns `false` when no
    /// install was requested.
    pub fn finish_install(&mut self) -> Result<bool> {
        let Some(artifact) = self.staged.take() else {
            return Ok(false);
        };
        self.source.install(&artifact)?;
        Ok(true)
    }

    /// Acknowledge a failed check or download and return to idle.
    pub fn dismiss_error(&mut self) -> Result<()> {
        if !matches!(self.state, UpdateState::Error { .. }) {
            return Err(self.invalid("dismiss an update error"));
        }
        tracing::debug!("update error dismissed");
        self.state = UpdateState::Idle;
        Ok(())
    }

    /// Apply every event the source has reported so far.
    pub fn poll(&mut self) -> usize {
        let pending: Vec<UpdateEvent> = self.rx.try_iter().collect();
        let count = pending.len();
        for event in pending {
            self.handle_event(event);
        }
        count
    }

    pub fn handle_event(&mut self, event: UpdateEvent) {
        if self.is_installing() {
            tracing::debug!(?event, "update event ignored while installing");
            return;
        }

        match event {
            UpdateEvent::Checking => {
                if !matches!(
                    self.state,
                    UpdateState::Downloading { .. } | UpdateState::Downloaded { .. }
                ) {
                    self.state = UpdateState::Checking;
                }
            }
            UpdateEvent::Available { version, notes } => {
                if matches!(
                    self.state,
                    UpdateState::Downloading { .. } | UpdateState::Downloaded { .. }
                ) {
                    return;
                }
                tracing::info!(%version, "update available");
                self.events.emit(Event::UpdateAvailable {
                    version: version.clone(),
                    notes: notes.clone(),
                });
                self.state = UpdateState::Available { version, notes };
            }
            UpdateEvent::NotAvailable => {
                if matches!(self.state, UpdateState::Checking) {
                    tracing::info!("no update available");
                    self.state = UpdateState::Idle;
                }
            }
            UpdateEvent::Progress {
                percent,
                bytes_per_second,
                transferred,
                total,
            } => {
                if !matches!(
                    self.state,
                    UpdateState::Available { .. } | UpdateState::Downloading { .. }
                ) {
                    return;
                }
                self.events.emit(Event::DownloadProgress {
                    percent,
                    bytes_per_second,
                    transferred,
                    total,
                });
                self.state = UpdateState::Downloading { percent };
            }
            UpdateEvent::Downloaded { version, artifact } => {
                if !matches!(
                    self.state,
                    UpdateState::Available { .. } | UpdateState::Downloading { .. }
                ) {
                    return;
                }
                tracing::info!(%version, "update downloaded");
                self.events.emit(Event::UpdateDownloaded {
                    version: version.clone(),
                });
                self.state = UpdateState::Downloaded { version, artifact };
            }
            UpdateEvent::Error(message) => {
                tracing::warn!(%message, "update failed");
                self.events.emit(Event::UpdateError {
                    message: message.clone(),
                });
                self.state = UpdateState::Error { message };
            }
        }
    }
}
