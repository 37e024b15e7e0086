#![allow(dead_code)]

use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::mpsc::Sender;

use markpad::app::domain::update::UpdateEvent;
use markpad::app::infrastructure::config_store::ConfigStore;
use markpad::app::infrastructure::platform::Platform;
use markpad::app::services::updater::UpdateSource;
use markpad::app::Result;
use markpad::ipc::{Bridge, Collaborators, IpcRouter, LocalTransport};

/// Update source that hands its event sender to the test.
#[derive(Clone, Default)]
pub struct ScriptedSource {
    pub sender: Rc<RefCell<Option<Sender<UpdateEvent>>>>,
    pub installed: Rc<RefCell<Vec<PathBuf>>>,
}

impl ScriptedSource {
    pub fn emit(&self, event: UpdateEvent) {
        let sender = self.sender.borrow();
        sender
            .as_ref()
            .expect("source has not been asked for anything yet")
            .send(event)
            .unwrap();
    }
}

impl UpdateSource for ScriptedSource {
    fn check(&mut self, events: Sender<UpdateEvent>) {
        let _ = events.send(UpdateEvent::Checking);
        *self.sender.borrow_mut() = Some(events);
    }

    fn download(&mut self, _version: &str, events: Sender<UpdateEvent>) {
        *self.sender.borrow_mut() = Some(events);
    }

    fn install(&mut self, artifact: &Path) -> Result<()> {
        self.installed.borrow_mut().push(artifact.to_path_buf());
        Ok(())
    }
}

pub struct Harness {
    pub bridge: Bridge,
    pub transport: LocalTransport,
    pub source: ScriptedSource,
}

pub fn harness(config_path: &Path) -> Harness {
    let source = ScriptedSource::default();
    let config = ConfigStore::open(config_path).into_shared();
    let router = IpcRouter::new(
        config,
        Platform::Linux,
        Box::new(source.clone()),
        Collaborators::default(),
    );
    let transport = LocalTransport::new(router);
    Harness {
        bridge: Bridge::new(transport.clone()),
        transport,
        source,
    }
}

pub fn path_str(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}
