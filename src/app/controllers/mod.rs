//! Controllers layer - the stateful managers.
//!
//! Each manager owns one slice of main-process state and persists it through
//! the shared config store:
//! - Tabs and workspace
//! - Global search and templates
//! - Shortcuts, menu and advanced markdown flags
//! - Update lifecycle

pub mod advanced_markdown;
pub mod menu;
pub mod search;
pub mod shortcuts;
pub mod tabs;
pub mod templates;
pub mod update;
pub mod workspace;
