//! MarkPad main-process coordination layer: stateful managers behind a typed
//! request/response channel.

pub mod app;
pub mod ipc;
