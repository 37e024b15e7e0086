use serde::{Deserialize, Serialize};

use crate::app::infrastructure::error::{AppError, Result};
use crate::app::infrastructure::platform::Platform;

/// Modifiers in their canonical order.
const MODIFIERS: [&str; 3] = ["Ctrl", "Alt", "Shift"];

/// A normalized key binding such as `Ctrl+Shift+S`.
///
/// `Ctrl` is the primary modifier: `Cmd`, `Command`, `Meta` and `CmdOrCtrl`
/// all normalize to it, and it is shown as `Cmd` on macOS.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Keybinding(String);

impl Keybinding {
    pub fn parse(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(AppError::InvalidArgument("key binding is empty".to_string()));
        }

        // A trailing "++" binds the plus key itself
        let (body, plus_key) = match raw.strip_suffix("++") {
            Some(body) => (body, true),
            None => (raw, false),
        };

        let mut modifiers = [false; 3];
        let mut key: Option<String> = None;
        if plus_key {
            key = Some("+".to_string());
        }

        for token in body.split('+').map(str::trim) {
            if token.is_empty() {
                if plus_key && body.is_empty() {
                    continue;
                }
                return Err(AppError::InvalidArgument(format!("malformed key binding: {}", raw)));
            }
            if let Some(idx) = modifier_index(token) {
                modifiers[idx] = true;
                continue;
            }
            if key.is_some() {
                return Err(AppError::InvalidArgument(format!(
                    "key binding has more than one key: {}",
                    raw
                )));
            }
            key = Some(canonical_key(token));
        }

        let key = key.ok_or_else(|| {
            AppError::InvalidArgument(format!("key binding has no key: {}", raw))
        })?;

        let mut parts: Vec<&str> = MODIFIERS
            .iter()
            .zip(modifiers)
            .filter(|(_, on)| *on)
            .map(|(m, _)| *m)
            .collect();
        parts.push(&key);
        Ok(Keybinding(parts.join("+")))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Accelerator text as the native menu of `platform` displays it.
    pub fn accelerator(&self, platform: Platform) -> String {
        let modifier = platform.primary_modifier();
        let mut parts: Vec<&str> = self.0.split('+').collect();
        if self.0.ends_with("++") {
            parts.retain(|p| !p.is_empty());
            parts.push("+");
        }
        parts
            .iter()
            .map(|p| if *p == "Ctrl" { modifier } else { *p })
            .collect::<Vec<_>>()
            .join("+")
    }
}

impl TryFrom<String> for Keybinding {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self> {
        Keybinding::parse(&value)
    }
}

impl From<Keybinding> for String {
    fn from(binding: Keybinding) -> String {
        binding.0
    }
}

impl std::fmt::Display for Keybinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

fn modifier_index(token: &str) -> Option<usize> {
    match token.to_ascii_lowercase().as_str() {
        "ctrl" | "control" | "cmd" | "command" | "meta" | "super" | "cmdorctrl"
        | "commandorcontrol" | "mod" => Some(0),
        "alt" | "option" | "opt" => Some(1),
        "shift" => Some(2),
        _ => None,
    }
}

fn canonical_key(token: &str) -> String {
    let lower = token.to_ascii_lowercase();
    let named = match lower.as_str() {
        "esc" | "escape" => Some("Escape"),
        "enter" | "return" => Some("Enter"),
        "tab" => Some("Tab"),
        "space" | "spacebar" => Some("Space"),
        "backspace" => Some("Backspace"),
        "del" | "delete" => Some("Delete"),
        "ins" | "insert" => Some("Insert"),
        "up" | "arrowup" => Some("Up"),
        "down" | "arrowdown" => Some("Down"),
        "left" | "arrowleft" => Some("Left"),
        "right" | "arrowright" => Some("Right"),
        "home" => Some("Home"),
        "end" => Some("End"),
        "pageup" => Some("PageUp"),
        "pagedown" => Some("PageDown"),
        "plus" => Some("+"),
        _ => None,
    };
    if let Some(name) = named {
        return name.to_string();
    }
    if token.chars().count() == 1 {
        return token.to_uppercase();
    }
    if lower.starts_with('f') && lower[1..].chars().all(|c| c.is_ascii_digit()) {
        return lower.to_uppercase();
    }
    let mut chars = lower.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
