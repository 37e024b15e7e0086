use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::app::domain::template::{Template, TemplateOrigin};
use crate::app::infrastructure::config_store::{SharedConfig, keys};
use crate::app::infrastructure::error::{AppError, Result};
use crate::app::services::text_ops::{
    current_timestamp_millis, find_placeholders, first_placeholder_position,
};

const README: &str = "# {{project_name}}

{{description}}

## Installation

```bash
{{install_command}}
```

## Usage

{{usage}}

## License

{{license}}
";

const BLOG_POST: &str = "---
title: {{title}}
date: {{date}}
tags: [{{tags}}]
---

# {{title}}

{{introduction}}

## {{section_heading}}

{{content}}

## Conclusion

{{conclusion}}
";

const MEETING_NOTES: &str = "# Meeting Notes: {{meeting_title}}

**Date:** {{date}}
**Attendees:** {{attendees}}

## Agenda

1. {{agenda_item}}

## Discussion

{{discussion}}

## Action Items

- [ ] {{action_item}} (owner: {{owner}})

## Next Meeting

{{next_meeting}}
";

const DOCUMENTATION: &str = "# {{component_name}}

> {{summary}}

## Overview

{{overview}}

## API

### `{{function_name}}`

{{function_description}}

## Examples

```{{language}}
{{example}}
```

## See Also

- {{related}}
";

const CHANGELOG: &str = "# Changelog

## [{{version}}] - {{date}}

### Added

- {{added}}

### Changed

- {{changed}}

### Fixed

- {{fixed}}
";

pub fn built_in_templates() -> Vec<Template> {
    vec![
        Template::built_in("readme", "README", "Project", "Project README with install and usage sections", README),
        Template::built_in("blog-post", "Blog Post", "Writing", "Blog post with front matter", BLOG_POST),
        Template::built_in("meeting-notes", "Meeting Notes", "Business", "Agenda, discussion and action items", MEETING_NOTES),
        Template::built_in("documentation", "Documentation", "Technical", "Component or API reference page", DOCUMENTATION),
        Template::built_in("changelog", "Changelog", "Project", "Keep-a-changelog style release notes", CHANGELOG),
    ]
}

/// Optional fields supplied when saving a custom template.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplateMetadata {
    pub category: Option<String>,
    pub description: Option<String>,
}

/// Partial update of a custom template.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplateChanges {
    pub name: Option<String>,
    pub content: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
}

pub struct TemplateManager {
    built_ins: Vec<Template>,
    config: SharedConfig,
}

impl TemplateManager {
    pub fn new(config: SharedConfig) -> Self {
        Self {
            built_ins: built_in_templates(),
            config,
        }
    }

    fn load_custom(&self) -> Vec<Template> {
        let list: Vec<Template> = self
            .config
            .borrow()
            .get_as(keys::CUSTOM_TEMPLATES)
            .unwrap_or_default();
        // Entries claiming to be built-in never come from user storage
        list.into_iter().filter(|t| !t.is_built_in()).collect()
    }

    fn store_custom(&self, list: &[Template]) -> Result<()> {
        self.config.borrow_mut().set_as(keys::CUSTOM_TEMPLATES, &list)
    }

    fn is_built_in_id(&self, id: &str) -> bool {
        self.built_ins.iter().any(|t| t.id == id)
    }

    fn ensure_mutable(&self, id: &str) -> Result<()> {
        match self.built_ins.iter().find(|t| t.id == id) {
            Some(template) if !template.is_mutable() => Err(AppError::Immutable(id.to_string())),
            _ => Ok(()),
        }
    }

    pub fn get(&self, id: &str) -> Option<Template> {
        self.built_ins
            .iter()
            .find(|t| t.id == id)
            .cloned()
            .or_else(|| self.load_custom().into_iter().find(|t| t.id == id))
    }

    pub fn all(&self) -> Vec<Template> {
        let mut all = self.built_ins.clone();
        all.extend(self.load_custom());
        all
    }

    pub fn built_ins(&self) -> Vec<Template> {
        self.built_ins.clone()
    }

    pub fn custom(&self) -> Vec<Template> {
        self.load_custom()
    }

    pub fn save_custom(
        &mut self,
        name: &str,
        content: &str,
        metadata: TemplateMetadata,
    ) -> Result<Template> {
        if name.trim().is_empty() {
            return Err(AppError::InvalidArgument("template name is empty".to_string()));
        }
        let template = Template {
            id: Uuid::new_v4().to_string(),
            name: name.trim().to_string(),
            category: metadata
                .category
                .filter(|c| !c.trim().is_empty())
                .unwrap_or_else(|| "Custom".to_string()),
            description: metadata.description.unwrap_or_default(),
            content: content.to_string(),
            placeholders: find_placeholders(content),
            origin: TemplateOrigin::Custom {
                created_at: current_timestamp_millis(),
                last_used: None,
            },
        };

        let mut list = self.load_custom();
        list.push(template.clone());
        self.store_custom(&list)?;
        tracing::info!(id = %template.id, name = %template.name, "custom template saved");
        Ok(template)
    }

    /// Returns `false` when no custom template has `id`.
    pub fn delete_custom(&mut self, id: &str) -> Result<bool> {
        self.ensure_mutable(id)?;
        let mut list = self.load_custom();
        let before = list.len();
        list.retain(|t| t.id != id);
        if list.len() == before {
            return Ok(false);
        }
        self.store_custom(&list)?;
        Ok(true)
    }

    pub fn update_custom(&mut self, id: &str, changes: TemplateChanges) -> Result<bool> {
        self.ensure_mutable(id)?;
        if matches!(&changes.name, Some(n) if n.trim().is_empty()) {
            return Err(AppError::InvalidArgument("template name is empty".to_string()));
        }
        let mut list = self.load_custom();
        let Some(template) = list.iter_mut().find(|t| t.id == id) else {
            return Ok(false);
        };
        if let Some(name) = changes.name {
            template.name = name.trim().to_string();
        }
        if let Some(content) = changes.content {
            template.set_content(content);
        }
        if let Some(category) = changes.category {
            template.category = category;
        }
        if let Some(description) = changes.description {
            template.description = description;
        }
        self.store_custom(&list)?;
        Ok(true)
    }

    /// Record use of a custom template. Built-ins are not tracked.
    pub fn mark_used(&mut self, id: &str) -> Result<()> {
        if self.is_built_in_id(id) {
            return Ok(());
        }
        let mut list = self.load_custom();
        let template = list
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| AppError::NotFound(format!("template {}", id)))?;
        if let TemplateOrigin::Custom { last_used, .. } = &mut template.origin {
            *last_used = Some(current_timestamp_millis());
        }
        self.store_custom(&list)
    }

    pub fn find_placeholders(&self, content: &str) -> Vec<String> {
        find_placeholders(content)
    }

    /// Byte offset of the first placeholder, or -1.
    pub fn first_placeholder_position(&self, content: &str) -> i64 {
        first_placeholder_position(content)
            .map(|p| p as i64)
            .unwrap_or(-1)
    }

    pub fn by_category(&self, category: &str) -> Vec<Template> {
        self.all()
            .into_iter()
            .filter(|t| t.category == category)
            .collect()
    }

    pub fn categories(&self) -> Vec<String> {
        let mut categories: Vec<String> = self.all().into_iter().map(|t| t.category).collect();
        categories.sort();
        categories.dedup();
        categories
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::infrastructure::config_store::ConfigStore;
    use tempfile::TempDir;

    fn manager(dir: &TempDir) -> TemplateManager {
        let config = ConfigStore::open(dir.path().join("config.json")).into_shared();
        TemplateManager::new(config)
    }

    #[test]
    fn test_required_built_ins_present() {
        let dir = TempDir::new().unwrap();
        let tm = manager(&dir);
        for id in ["readme", "blog-post", "meeting-notes", "documentation"] {
            let t = tm.get(id).unwrap();
            assert!(t.is_built_in());
            assert!(!t.placeholders.is_empty());
        }
    }

    #[test]
    fn test_placeholders_are_distinct_and_present() {
        let dir = TempDir::new().unwrap();
        for t in manager(&dir).all() {
            let mut seen = t.placeholders.clone();
            seen.sort();
            seen.dedup();
            assert_eq!(seen.len(), t.placeholders.len(), "duplicates in {}", t.id);
            assert!(t.placeholders.iter().all(|p| t.content.contains(p.as_str())));
        }
    }

    #[test]
    fn test_built_ins_are_immutable() {
        let dir = TempDir::new().unwrap();
        let mut tm = manager(&dir);
        assert_eq!(tm.delete_custom("readme").unwrap_err().code(), "IMMUTABLE");
        let err = tm.update_custom("readme", TemplateChanges::default()).unwrap_err();
        assert_eq!(err.code(), "IMMUTABLE");
        tm.mark_used("readme").unwrap();
        assert!(tm.get("readme").unwrap().is_built_in());
    }

    #[test]
    fn test_custom_lifecycle_persists() {
        let dir = TempDir::new().unwrap();
        let id = {
            let mut tm = manager(&dir);
            let t = tm
                .save_custom("Standup", "Yesterday: {{done}}\nToday: {{todo}}", TemplateMetadata::default())
                .unwrap();
            assert_eq!(t.category, "Custom");
            assert_eq!(t.placeholders, vec!["{{done}}", "{{todo}}"]);
            t.id
        };

        let mut tm = manager(&dir);
        assert_eq!(tm.custom().len(), 1);
        let changes = TemplateChanges {
            content: Some("Blockers: {{blockers}}".to_string()),
            ..Default::default()
        };
        assert!(tm.update_custom(&id, changes).unwrap());
        assert_eq!(tm.get(&id).unwrap().placeholders, vec!["{{blockers}}"]);

        tm.mark_used(&id).unwrap();
        match tm.get(&id).unwrap().origin {
            TemplateOrigin::Custom { last_used, .. } => assert!(last_used.is_some()),
            TemplateOrigin::BuiltIn => panic!("custom template became built-in"),
        }

        assert!(tm.delete_custom(&id).unwrap());
        assert!(!tm.delete_custom(&id).unwrap());
        assert!(manager(&dir).custom().is_empty());
    }

    #[test]
    fn test_custom_ids_are_fresh() {
        let dir = TempDir::new().unwrap();
        let mut tm = manager(&dir);
        let a = tm.save_custom("A", "", TemplateMetadata::default()).unwrap();
        let b = tm.save_custom("A", "", TemplateMetadata::default()).unwrap();
        assert_ne!(a.id, b.id);
        assert!(Uuid::parse_str(&a.id).is_ok());
        assert!(tm.get(&a.id).unwrap().is_mutable());
        assert!(tm.save_custom("  ", "x", TemplateMetadata::default()).is_err());
    }

    #[test]
    fn test_categories_and_filtering() {
        let dir = TempDir::new().unwrap();
        let mut tm = manager(&dir);
        let meta = TemplateMetadata {
            category: Some("Personal".to_string()),
            description: None,
        };
        tm.save_custom("Diary", "{{mood}}", meta).unwrap();
        let cats = tm.categories();
        assert!(cats.contains(&"Personal".to_string()));
        assert!(cats.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(tm.by_category("Project").len(), 2);
        assert_eq!(tm.by_category("Personal").len(), 1);
    }

    #[test]
    fn test_first_placeholder_position() {
        let dir = TempDir::new().unwrap();
        let tm = manager(&dir);
        assert_eq!(tm.first_placeholder_position("ab {{c}}"), 3);
        assert_eq!(tm.first_placeholder_position("abc"), -1);
    }
}
