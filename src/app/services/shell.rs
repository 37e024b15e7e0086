//! Desktop collaborators: native dialogs and the system URL opener.

use std::path::PathBuf;

use crate::app::infrastructure::error::{AppError, Result};

const ALLOWED_SCHEMES: [&str; 3] = ["http", "https", "mailto"];

/// Native file pickers. `None` means the user cancelled.
pub trait Dialogs {
    fn open_file(&self) -> Option<PathBuf>;
    fn open_folder(&self) -> Option<PathBuf>;
    fn save_file(&self, suggested_name: &str, extension: &str) -> Option<PathBuf>;
}

/// Used when no windowing shell is attached; every dialog is cancelled.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoDialogs;

impl Dialogs for NoDialogs {
    fn open_file(&self) -> Option<PathBuf> {
        None
    }

    fn open_folder(&self) -> Option<PathBuf> {
        None
    }

    fn save_file(&self, _suggested_name: &str, _extension: &str) -> Option<PathBuf> {
        None
    }
}

pub trait Shell {
    fn open_external(&self, url: &str) -> Result<()>;
}

/// Opens URLs with the platform's default handler.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemShell;

impl Shell for SystemShell {
    fn open_external(&self, url: &str) -> Result<()> {
        open::that(url).map_err(|e| AppError::io(url, e))
    }
}

/// Only web and mail links may leave the application.
pub fn check_external_url(url: &str) -> Result<()> {
    let scheme = url
        .split_once(':')
        .map(|(s, _)| s.to_ascii_lowercase())
        .ok_or_else(|| AppError::InvalidArgument(format!("not a URL: {}", url)))?;
    if !ALLOWED_SCHEMES.contains(&scheme.as_str()) {
        return Err(AppError::InvalidArgument(format!(
            "scheme '{}' cannot be opened externally",
            scheme
        )));
    }
    if scheme != "mailto" && !url[scheme.len() + 1..].starts_with("//") {
        return Err(AppError::InvalidArgument(format!("not a URL: {}", url)));
    }
    Ok(())
}
