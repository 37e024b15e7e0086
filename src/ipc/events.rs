//! One-way main → renderer event channels.
//!
//! Events are queued when emitted and delivered on [`EventBus::flush`], after
//! the request that produced them has returned.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use serde_json::{Value, json};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    MenuAction,
    FileDropped,
    UpdateAvailable,
    UpdateDownloaded,
    UpdateError,
    DownloadProgress,
    SettingsChanged,
}

impl EventKind {
    pub const ALL: [EventKind; 7] = [
        EventKind::MenuAction,
        EventKind::FileDropped,
        EventKind::UpdateAvailable,
        EventKind::UpdateDownloaded,
        EventKind::UpdateError,
        EventKind::DownloadProgress,
        EventKind::SettingsChanged,
    ];

    pub fn channel(&self) -> &'static str {
        match self {
            EventKind::MenuAction => "menu:action",
            EventKind::FileDropped => "file:dropped",
            EventKind::UpdateAvailable => "update-available",
            EventKind::UpdateDownloaded => "update-downloaded",
            EventKind::UpdateError => "update-error",
            EventKind::DownloadProgress => "download-progress",
            EventKind::SettingsChanged => "advanced-markdown:settings-changed",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    MenuAction {
        action: String,
        payload: Option<Value>,
    },
    FileDropped {
        path: String,
    },
    UpdateAvailable {
        version: String,
        notes: String,
    },
    UpdateDownloaded {
        version: String,
    },
    UpdateError {
        message: String,
    },
    DownloadProgress {
        percent: f64,
        bytes_per_second: f64,
        transferred: u64,
        total: u64,
    },
    SettingsChanged {
        name: String,
        enabled: bool,
    },
}

impl Event {
    pub fn kind(&self) -> EventKind {
        match self {
            Event::MenuAction { .. } => EventKind::MenuAction,
            Event::FileDropped { .. } => EventKind::FileDropped,
            Event::UpdateAvailable { .. } => EventKind::UpdateAvailable,
            Event::UpdateDownloaded { .. } => EventKind::UpdateDownloaded,
            Event::UpdateError { .. } => EventKind::UpdateError,
            Event::DownloadProgress { .. } => EventKind::DownloadProgress,
            Event::SettingsChanged { .. } => EventKind::SettingsChanged,
        }
    }

    /// Positional arguments as delivered to renderer listeners.
    pub fn args(&self) -> Vec<Value> {
        match self {
            Event::MenuAction { action, payload } => match payload {
                Some(p) => vec![json!(action), p.clone()],
                None => vec![json!(action)],
            },
            Event::FileDropped { path } => vec![json!(path)],
            Event::UpdateAvailable { version, notes } => {
                vec![json!({"version": version, "releaseNotes": notes})]
            }
            Event::UpdateDownloaded { version } => vec![json!({"version": version})],
            Event::UpdateError { message } => vec![json!(message)],
            Event::DownloadProgress {
                percent,
                bytes_per_second,
                transferred,
                total,
            } => vec![json!({
                "percent": percent,
                "bytesPerSecond": bytes_per_second,
                "transferred": transferred,
                "total": total,
            })],
            Event::SettingsChanged { name, enabled } => vec![json!(name), json!(enabled)],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u64);

/// Receives the event arguments only, never the event object itself.
pub type Listener = Rc<dyn Fn(&[Value])>;

#[derive(Default)]
struct BusInner {
    queue: VecDeque<Event>,
    listeners: Vec<(ListenerId, EventKind, Listener)>,
    next_id: u64,
}

/// Shared, single-threaded event bus. Clones refer to the same bus.
#[derive(Clone, Default)]
pub struct EventBus {
    inner: Rc<RefCell<BusInner>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emit(&self, event: Event) {
        tracing::trace!(channel = event.kind().channel(), "event queued");
        self.inner.borrow_mut().queue.push_back(event);
    }

    pub fn subscribe(&self, kind: EventKind, listener: Listener) -> ListenerId {
        let mut inner = self.inner.borrow_mut();
        inner.next_id += 1;
        let id = ListenerId(inner.next_id);
        inner.listeners.push((id, kind, listener));
        id
    }

    /// Detach a listener. Returns `false` if it was already gone.
    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        let mut inner = self.inner.borrow_mut();
        let before = inner.listeners.len();
        inner.listeners.retain(|(lid, _, _)| *lid != id);
        inner.listeners.len() != before
    }

    pub fn listener_count(&self, kind: EventKind) -> usize {
        self.inner
            .borrow()
            .listeners
            .iter()
            .filter(|(_, k, _)| *k == kind)
            .count()
    }

    pub fn pending(&self) -> usize {
        self.inner.borrow().queue.len()
    }

    /// Take queued events without delivering them to listeners.
    pub fn drain(&self) -> Vec<Event> {
        self.inner.borrow_mut().queue.drain(..).collect()
    }

    /// Deliver queued events in order. Listeners may emit, subscribe or
    /// unsubscribe while being called; newly emitted events are delivered in
    /// the same flush.
    pub fn flush(&self) -> usize {
        let mut delivered = 0;
        loop {
            let next = self.inner.borrow_mut().queue.pop_front();
            let Some(event) = next else { break };
            let kind = event.kind();
            let targets: Vec<Listener> = self
                .inner
                .borrow()
                .listeners
                .iter()
                .filter(|(_, k, _)| *k == kind)
                .map(|(_, _, l)| l.clone())
                .collect();
            let args = event.args();
            for listener in targets {
                listener(&args);
            }
            delivered += 1;
        }
        delivered
    }
}
