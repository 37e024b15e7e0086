use serde::{Deserialize, Serialize};

use crate::app::infrastructure::error::{AppError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feature {
    Mermaid,
    Katex,
    Callouts,
}

impl Feature {
    pub const ALL: [Feature; 3] = [Feature::Mermaid, Feature::Katex, Feature::Callouts];

    pub fn as_str(&self) -> &'static str {
        match self {
            Feature::Mermaid => "mermaid",
            Feature::Katex => "katex",
            Feature::Callouts => "callouts",
        }
    }

    pub fn parse(name: &str) -> Result<Feature> {
        match name {
            "mermaid" => Ok(Feature::Mermaid),
            "katex" => Ok(Feature::Katex),
            "callouts" => Ok(Feature::Callouts),
            _ => Err(AppError::UnknownFeature(name.to_string())),
        }
    }
}

/// The advanced-markdown feature triad. Every flag defaults to enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureFlags {
    #[serde(default = "default_enabled")]
    pub mermaid: bool,
    #[serde(default = "default_enabled")]
    pub katex: bool,
    #[serde(default = "default_enabled")]
    pub callouts: bool,
}

fn default_enabled() -> bool {
    true
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self {
            mermaid: true,
            katex: true,
            callouts: true,
        }
    }
}

impl FeatureFlags {
    pub fn get(&self, feature: Feature) -> bool {
        match feature {
            Feature::Mermaid => self.mermaid,
            Feature::Katex => self.katex,
            Feature::Callouts => self.callouts,
        }
    }

    pub fn set(&mut self, feature: Feature, enabled: bool) {
        match feature {
            Feature::Mermaid => self.mermaid = enabled,
            Feature::Katex => self.katex = enabled,
            Feature::Callouts => self.callouts = enabled,
        }
    }

    /// Enabled feature names in declaration order.
    pub fn enabled(&self) -> Vec<&'static str> {
        Feature::ALL
            .iter()
            .filter(|f| self.get(**f))
            .map(|f| f.as_str())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_all_enabled() {
        let flags = FeatureFlags::default();
        assert_eq!(flags.enabled(), vec!["mermaid", "katex", "callouts"]);
    }

    #[test]
    fn test_partial_config() {
        let flags: FeatureFlags = serde_json::from_str(r#"{"katex": false}"#).unwrap();
        assert!(flags.mermaid);
        assert!(!flags.katex);
        assert!(flags.callouts);
    }

    #[test]
    fn test_unknown_feature() {
        let err = Feature::parse("plantuml").unwrap_err();
        assert_eq!(err.code(), "UNKNOWN_FEATURE");
    }
}
