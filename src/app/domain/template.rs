use serde::{Deserialize, Serialize};

use crate::app::services::text_ops::find_placeholders;

/// Where a template comes from. Built-ins ship with the app and are read-only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateOrigin {
    BuiltIn,
    Custom {
        created_at: i64,
        last_used: Option<i64>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "TemplateRecord", into = "TemplateRecord")]
pub struct Template {
    pub id: String,
    pub name: String,
    pub category: String,
    pub description: String,
    pub content: String,
    pub placeholders: Vec<String>,
    pub origin: TemplateOrigin,
}

impl Template {
    pub fn built_in(id: &str, name: &str, category: &str, description: &str, content: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            category: category.to_string(),
            description: description.to_string(),
            content: content.to_string(),
            placeholders: find_placeholders(content),
            origin: TemplateOrigin::BuiltIn,
        }
    }

    pub fn is_built_in(&self) -> bool {
        matches!(self.origin, TemplateOrigin::BuiltIn)
    }

    /// Only user templates may be edited or deleted.
    pub fn is_mutable(&self) -> bool {
        !self.is_built_in()
    }

    pub fn set_content(&mut self, content: String) {
        self.placeholders = find_placeholders(&content);
        self.content = content;
    }
}

/// Flat wire and storage shape of a template.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TemplateRecord {
    id: String,
    name: String,
    #[serde(default)]
    category: String,
    #[serde(default)]
    description: String,
    content: String,
    #[serde(default)]
    placeholders: Vec<String>,
    #[serde(default)]
    is_built_in: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    created_at: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    last_used: Option<i64>,
}

impl From<Template> for TemplateRecord {
    fn from(t: Template) -> Self {
        let (is_built_in, created_at, last_used) = match t.origin {
            TemplateOrigin::BuiltIn => (true, None, None),
            TemplateOrigin::Custom {
                created_at,
                last_used,
            } => (false, Some(created_at), last_used),
        };
        Self {
            id: t.id,
            name: t.name,
            category: t.category,
            description: t.description,
            content: t.content,
            placeholders: t.placeholders,
            is_built_in,
            created_at,
            last_used,
        }
    }
}

impl From<TemplateRecord> for Template {
    fn from(r: TemplateRecord) -> Self {
        let origin = if r.is_built_in {
            TemplateOrigin::BuiltIn
        } else {
            TemplateOrigin::Custom {
                created_at: r.created_at.unwrap_or(0),
                last_used: r.last_used,
            }
        };
        // Placeholders are always derived from content, never trusted from disk
        let placeholders = find_placeholders(&r.content);
        Self {
            id: r.id,
            name: r.name,
            category: r.category,
            description: r.description,
            content: r.content,
            placeholders,
            origin,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_built_in_wire_shape() {
        let t = Template::built_in("readme", "README", "Project", "A readme", "# {{name}}");
        let json = serde_json::to_value(&t).unwrap();
        assert_eq!(json["isBuiltIn"], true);
        assert_eq!(json["placeholders"][0], "{{name}}");
        assert!(json.get("createdAt").is_none());
    }

    #[test]
    fn test_custom_round_trip() {
        let t = Template {
            id: "custom-1".to_string(),
            name: "Mine".to_string(),
            category: "Custom".to_string(),
            description: String::new(),
            content: "{{a}} {{b}}".to_string(),
            placeholders: vec!["{{a}}".to_string(), "{{b}}".to_string()],
            origin: TemplateOrigin::Custom {
                created_at: 10,
                last_used: Some(20),
            },
        };
        let json = serde_json::to_string(&t).unwrap();
        assert!(json.contains("\"lastUsed\":20"));
        let back: Template = serde_json::from_str(&json).unwrap();
        assert_eq!(back, t);
        assert!(back.is_mutable());
    }

    #[test]
    fn test_placeholders_rederived_on_load() {
        let json = r#"{"id":"c","name":"n","content":"{{x}}","placeholders":["{{stale}}"]}"#;
        let t: Template = serde_json::from_str(json).unwrap();
        assert_eq!(t.placeholders, vec!["{{x}}"]);
    }
}
