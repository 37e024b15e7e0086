use crate::app::domain::features::{Feature, FeatureFlags};
use crate::app::infrastructure::config_store::{SharedConfig, keys};
use crate::app::infrastructure::error::Result;

/// Feature flags for diagrams, math and callouts, persisted on every change.
pub struct AdvancedMarkdownManager {
    flags: FeatureFlags,
    config: SharedConfig,
}

impl AdvancedMarkdownManager {
    pub fn new(config: SharedConfig) -> Self {
        let flags = config
            .borrow()
            .get_as(keys::ADVANCED_MARKDOWN_FEATURES)
            .unwrap_or_default();
        Self { flags, config }
    }

    pub fn is_enabled(&self, name: &str) -> Result<bool> {
        Ok(self.flags.get(Feature::parse(name)?))
    }

    /// Set a flag. Returns `true` when the value actually changed.
    pub fn toggle(&mut self, name: &str, enabled: bool) -> Result<bool> {
        let feature = Feature::parse(name)?;
        let changed = self.flags.get(feature) != enabled;
        let mut next = self.flags;
        next.set(feature, enabled);
        self.config
            .borrow_mut()
            .set_as(keys::ADVANCED_MARKDOWN_FEATURES, &next)?;
        self.flags = next;
        if changed {
            tracing::info!(feature = name, enabled, "advanced markdown feature toggled");
        }
        Ok(changed)
    }

    pub fn enabled(&self) -> Vec<&'static str> {
        self.flags.enabled()
    }

    pub fn all(&self) -> FeatureFlags {
        self.flags
    }

    pub fn reset(&mut self) -> Result<()> {
        let defaults = FeatureFlags::default();
        self.config
            .borrow_mut()
            .set_as(keys::ADVANCED_MARKDOWN_FEATURES, &defaults)?;
        self.flags = defaults;
        Ok(())
    }
}
