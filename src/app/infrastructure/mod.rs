//! Infrastructure layer - external integrations and utilities.
//!
//! This module contains code that interfaces with external systems:
//! - JSON config persistence
//! - Platform-specific detection
//! - Error types

pub mod config_store;
pub mod error;
pub mod platform;
