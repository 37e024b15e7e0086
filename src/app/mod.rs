//! Application layer - organized by Clean Architecture principles.
//!
//! # Structure
//!
//! - `domain/` - Core data structures (Tab, Template, ActionId, UpdateState)
//! - `controllers/` - Stateful managers (tabs, workspace, search, menu, updater)
//! - `services/` - Stateless operations (text ops, export, update source, shell)
//! - `infrastructure/` - Config persistence, platform detection, errors

pub mod controllers;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-exports for convenient external access
pub use infrastructure::config_store::{ConfigStore, SharedConfig};
pub use infrastructure::error::{AppError, Result};
pub use infrastructure::platform::{Platform, detect_system_dark_mode};
pub use services::updater::UpdateChannel;
