use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::app::domain::action::ActionId;
use crate::app::domain::keybinding::Keybinding;
use crate::app::infrastructure::config_store::{SharedConfig, keys};
use crate::app::infrastructure::error::{AppError, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionInfo {
    pub id: ActionId,
    pub label: String,
    pub default_binding: Option<String>,
}

pub fn parse_action(id: &str) -> Result<ActionId> {
    ActionId::from_str(id).ok_or_else(|| AppError::NotFound(format!("action {}", id)))
}

/// Action → key binding registry.
///
/// Effective binding = override, else default. No two actions may share an
/// effective binding.
pub struct ShortcutRegistry {
    overrides: BTreeMap<ActionId, Keybinding>,
    config: SharedConfig,
}

impl ShortcutRegistry {
    pub fn new(config: SharedConfig) -> Self {
        let stored: BTreeMap<String, String> =
            config.borrow().get_as(keys::SHORTCUTS).unwrap_or_default();
        let mut registry = Self {
            overrides: BTreeMap::new(),
            config,
        };

        for (action, raw) in stored {
            let Some(action) = ActionId::from_str(&action) else {
                tracing::warn!(%action, "ignoring shortcut for unknown action");
                continue;
            };
            let binding = match Keybinding::parse(&raw) {
                Ok(b) => b,
                Err(e) => {
                    tracing::warn!(action = action.as_str(), error = %e, "ignoring malformed shortcut");
                    continue;
                }
            };
            if let Some(other) = registry.check_conflict(&binding, Some(action)) {
                tracing::warn!(
                    action = action.as_str(),
                    binding = %binding,
                    conflict_with = other.as_str(),
                    "ignoring conflicting shortcut override"
                );
                continue;
            }
            registry.overrides.insert(action, binding);
        }
        registry
    }

    pub fn default_binding(&self, action: ActionId) -> Option<Keybinding> {
        action
            .default_binding()
            .and_then(|raw| Keybinding::parse(raw).ok())
    }

    /// Effective binding for `action`.
    pub fn get(&self, action: ActionId) -> Option<Keybinding> {
        self.overrides
            .get(&action)
            .cloned()
            .or_else(|| self.default_binding(action))
    }

    /// Action other than `except` whose effective binding is `binding`.
    pub fn check_conflict(&self, binding: &Keybinding, except: Option<ActionId>) -> Option<ActionId> {
        ActionId::ALL
            .iter()
            .copied()
            .filter(|a| Some(*a) != except)
            .find(|a| self.get(*a).as_ref() == Some(binding))
    }

    pub fn set(&mut self, action: ActionId, raw: &str) -> Result<Keybinding> {
        let binding = Keybinding::parse(raw)?;
        if self.get(action).as_ref() == Some(&binding) {
            return Ok(binding);
        }
        if let Some(other) = self.check_conflict(&binding, Some(action)) {
            return Err(AppError::Conflict {
                binding: binding.to_string(),
                conflict_with: other.as_str().to_string(),
            });
        }

        if self.default_binding(action).as_ref() == Some(&binding) {
            self.overrides.remove(&action);
        } else {
            self.overrides.insert(action, binding.clone());
        }
        self.persist()?;
        tracing::info!(action = action.as_str(), binding = %binding, "shortcut changed");
        Ok(binding)
    }

    /// Restore the default for `action`. Fails with `CONFLICT` if another
    /// action has since taken the default binding.
    pub fn reset(&mut self, action: ActionId) -> Result<Option<Keybinding>> {
        if !self.overrides.contains_key(&action) {
            return Ok(self.get(action));
        }
        if let Some(default) = self.default_binding(action) {
            if let Some(other) = self.check_conflict(&default, Some(action)) {
                return Err(AppError::Conflict {
                    binding: default.to_string(),
                    conflict_with: other.as_str().to_string(),
                });
            }
        }
        self.overrides.remove(&action);
        self.persist()?;
        Ok(self.get(action))
    }

    pub fn reset_all(&mut self) -> Result<()> {
        if self.overrides.is_empty() {
            return Ok(());
        }
        self.overrides.clear();
        self.persist()
    }

    /// Effective bindings of every action, keyed by action id.
    pub fn all(&self) -> BTreeMap<String, Option<String>> {
        ActionId::ALL
            .iter()
            .map(|a| (a.as_str().to_string(), self.get(*a).map(String::from)))
            .collect()
    }

    pub fn available_actions(&self) -> Vec<ActionInfo> {
        ActionId::ALL
            .iter()
            .map(|a| ActionInfo {
                id: *a,
                label: a.label().to_string(),
                default_binding: a.default_binding().map(str::to_string),
            })
            .collect()
    }

    fn persist(&self) -> Result<()> {
        let stored: BTreeMap<&str, &str> = self
            .overrides
            .iter()
            .map(|(a, b)| (a.as_str(), b.as_str()))
            .collect();
        self.config.borrow_mut().set_as(keys::SHORTCUTS, &stored)
    }
}
