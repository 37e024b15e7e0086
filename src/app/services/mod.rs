//! Services layer - business operations and utilities.
//!
//! - Text operations
//! - Markdown export and post-processing
//! - Update checking (GitHub releases)
//! - Clipboard images
//! - Dialogs and the system shell

pub mod clipboard;
pub mod export;
pub mod shell;
pub mod text_ops;
pub mod updater;
