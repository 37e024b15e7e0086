//! Domain layer - core data structures and types.
//!
//! This module contains the fundamental domain models:
//! - Tabs and their persisted form
//! - Recent files, templates, feature flags
//! - The action namespace and key bindings
//! - Update lifecycle state and workspace tree nodes

pub mod action;
pub mod features;
pub mod keybinding;
pub mod recent;
pub mod tab;
pub mod template;
pub mod update;
pub mod workspace;

pub use action::ActionId;
pub use features::{Feature, FeatureFlags};
pub use keybinding::Keybinding;
pub use recent::RecentFile;
pub use tab::{CursorPosition, PersistedTab, Tab, TabId};
pub use template::{Template, TemplateOrigin};
pub use update::{UpdateEvent, UpdateState};
pub use workspace::{NodeKind, TreeNode};
