use std::cell::RefCell;
use std::rc::Rc;

use serde_json::Value;

use crate::ipc::events::{EventBus, EventKind, Listener, ListenerId};
use crate::ipc::response::Response;
use crate::ipc::router::IpcRouter;

/// The raw messaging primitive behind the renderer facade.
pub trait Transport {
    fn invoke(&self, channel: &str, args: Vec<Value>) -> Response;
    fn listen(&self, kind: EventKind, listener: Listener) -> ListenerId;
    fn unlisten(&self, id: ListenerId) -> bool;
}

/// In-process transport: requests run on the router directly and queued
/// events are flushed once each request has returned.
#[derive(Clone)]
pub struct LocalTransport {
    router: Rc<RefCell<IpcRouter>>,
    events: EventBus,
}

impl LocalTransport {
    pub fn new(router: IpcRouter) -> Self {
        let events = router.events();
        Self {
            router: Rc::new(RefCell::new(router)),
            events,
        }
    }

    pub fn router(&self) -> Rc<RefCell<IpcRouter>> {
        self.router.clone()
    }

    /// Apply pending update events and deliver everything queued.
    pub fn pump(&self) -> usize {
        self.router.borrow_mut().poll_updates();
        self.events.flush()
    }
}

impl Transport for LocalTransport {
    fn invoke(&self, channel: &str, args: Vec<Value>) -> Response {
        let response = self.router.borrow_mut().handle(channel, &args);
        self.pump();
        response
    }

    fn listen(&self, kind: EventKind, listener: Listener) -> ListenerId {
        self.events.subscribe(kind, listener)
    }

    fn unlisten(&self, id: ListenerId) -> bool {
        self.events.unsubscribe(id)
    }
}
