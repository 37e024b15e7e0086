use serde::{Deserialize, Serialize};

/// Desktop platform the menu and accelerators are built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Mac,
    Windows,
    Linux,
}

impl Platform {
    pub fn current() -> Self {
        if cfg!(target_os = "macos") {
            Platform::Mac
        } else if cfg!(target_os = "windows") {
            Platform::Windows
        } else {
            Platform::Linux
        }
    }

    pub fn from_str(s: &str) -> Option<Platform> {
        match s.to_ascii_lowercase().as_str() {
            "mac" | "macos" | "darwin" => Some(Platform::Mac),
            "windows" | "win32" => Some(Platform::Windows),
            "linux" => Some(Platform::Linux),
            _ => None,
        }
    }

    /// Label of the primary modifier key in accelerators.
    pub fn primary_modifier(&self) -> &'static str {
        match self {
            Platform::Mac => "Cmd",
            Platform::Windows | Platform::Linux => "Ctrl",
        }
    }

    pub fn is_mac(&self) -> bool {
        matches!(self, Platform::Mac)
    }
}

pub fn detect_system_dark_mode() -> bool {
    // Windows: Check registry for dark mode preference
    #[cfg(target_os = "windows")]
    {
        use winreg::RegKey;
        use winreg::enums::HKEY_CURRENT_USER;

        if let Ok(hkcu) = RegKey::predef(HKEY_CURRENT_USER)
            .open_subkey("Software\\Microsoft\\Windows\\CurrentVersion\\Themes\\Personalize")
        {
            // AppsUseLightTheme: 0 = dark mode, 1 = light mode
            if let Ok(value) = hkcu.get_value::<u32, _>("AppsUseLightTheme") {
                return value == 0;
            }
        }
    }

    #[cfg(target_os = "linux")]
    {
        use std::process::Command;

        if let Ok(output) = Command::new("gsettings")
            .args(["get", "org.gnome.desktop.interface", "color-scheme"])
            .output()
        {
            let scheme = String::from_utf8_lossy(&output.stdout);
            if scheme.contains("prefer-dark") {
                return true;
            }
        }
    }

    #[cfg(target_os = "macos")]
    {
        use std::process::Command;

        if let Ok(output) = Command::new("defaults")
            .args(["read", "-g", "AppleInterfaceStyle"])
            .output()
        {
            if output.status.success() {
                let style = String::from_utf8_lossy(&output.stdout).to_lowercase();
                if style.contains("dark") {
                    return true;
                }
            }
        }
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_platform_from_str() {
        assert_eq!(Platform::from_str("darwin"), Some(Platform::Mac));
        assert_eq!(Platform::from_str("Windows"), Some(Platform::Windows));
        assert_eq!(Platform::from_str("linux"), Some(Platform::Linux));
        assert_eq!(Platform::from_str("beos"), None);
    }

    #[test]
    fn test_primary_modifier() {
        assert_eq!(Platform::Mac.primary_modifier(), "Cmd");
        assert_eq!(Platform::Linux.primary_modifier(), "Ctrl");
    }
}
