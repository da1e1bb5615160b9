//! Prompt template system for the upgrade analysis topics.
//!
//! This module provides:
//! - Handlebars-based prompt templates
//! - One template per analysis topic
//! - Rendering of typed contexts into `(system, user)` prompt pairs

use handlebars::Handlebars;
use serde::Serialize;
use std::collections::HashMap;

use crate::errors::{PlannerError, PlannerResult};

// Template modules
mod addon_compatibility;
mod addon_upgrade;
mod cluster_health;
mod cluster_summary;
mod control_plane;
mod deprecated_apis;
mod nodegroups;
mod test_validation;
mod version_changes;
mod version_skew;

// Re-export context types (not the template() functions to avoid ambiguity)
pub use addon_compatibility::AddonCompatibilityContext;
pub use addon_upgrade::AddonUpgradeContext;
pub use cluster_health::ClusterHealthContext;
pub use cluster_summary::ClusterSummaryContext;
pub use control_plane::ControlPlaneContext;
pub use deprecated_apis::DeprecatedApisContext;
pub use nodegroups::NodegroupsContext;
pub use test_validation::TestValidationContext;
pub use version_changes::VersionChangesContext;
pub use version_skew::VersionSkewContext;

/// Template IDs, in the order the plan is generated
pub mod ids {
    pub const VERSION_SKEW: &str = "version-skew";
    pub const CLUSTER_SUMMARY: &str = "cluster-summary";
    pub const CLUSTER_HEALTH: &str = "cluster-health";
    pub const ADDON_COMPATIBILITY: &str = "addon-compatibility";
    pub const VERSION_CHANGES: &str = "version-changes";
    pub const DEPRECATED_APIS: &str = "deprecated-apis";
    pub const CONTROL_PLANE: &str = "control-plane";
    pub const ADDON_UPGRADE: &str = "addon-upgrade";
    pub const NODEGROUPS: &str = "nodegroups";
    pub const TEST_VALIDATION: &str = "test-validation";
}

/// Rendered in place of absent optional inputs
pub const NONE_TEXT: &str = "无";

/// A prompt template with system and user messages.
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    /// Template ID
    pub id: String,
    /// Description
    pub description: String,
    /// System prompt template
    pub system: String,
    /// User prompt template
    pub user: String,
}

impl PromptTemplate {
    /// Create a new prompt template.
    pub fn new(id: impl Into<String>, system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            description: String::new(),
            system: system.into(),
            user: user.into(),
        }
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Render the template with the given context.
    pub fn render<T: Serialize>(&self, context: &T) -> PlannerResult<(String, String)> {
        let mut handlebars = create_handlebars();

        handlebars
            .register_template_string("system", &self.system)
            .map_err(|e| self.error(format!("invalid system template: {e}")))?;

        handlebars
            .register_template_string("user", &self.user)
            .map_err(|e| self.error(format!("invalid user template: {e}")))?;

        let system = handlebars
            .render("system", context)
            .map_err(|e| self.error(format!("failed to render system prompt: {e}")))?;

        let user = handlebars
            .render("user", context)
            .map_err(|e| self.error(format!("failed to render user prompt: {e}")))?;

        Ok((system, user))
    }

    fn error(&self, reason: String) -> PlannerError {
        PlannerError::Template {
            template: self.id.clone(),
            reason,
        }
    }
}

/// Create a Handlebars instance with custom helpers.
pub(crate) fn create_handlebars() -> Handlebars<'static> {
    let mut handlebars = Handlebars::new();

    // Prompts and Markdown are not HTML
    handlebars.register_escape_fn(handlebars::no_escape);

    // Helper: {{{json value}}}
    handlebars.register_helper(
        "json",
        Box::new(
            |h: &handlebars::Helper,
             _: &Handlebars,
             _: &handlebars::Context,
             _: &mut handlebars::RenderContext,
             out: &mut dyn handlebars::Output| {
                if let Some(param) = h.param(0) {
                    let json = serde_json::to_string_pretty(param.value())
                        .unwrap_or_else(|_| "null".to_string());
                    out.write(&json)?;
                }
                Ok(())
            },
        ),
    );

    // Helper: {{or_none value}}
    handlebars.register_helper(
        "or_none",
        Box::new(
            |h: &handlebars::Helper,
             _: &Handlebars,
             _: &handlebars::Context,
             _: &mut handlebars::RenderContext,
             out: &mut dyn handlebars::Output| {
                let text = match h.param(0).map(handlebars::PathAndJson::value) {
                    Some(serde_json::Value::String(s)) if !s.is_empty() => s.clone(),
                    _ => NONE_TEXT.to_string(),
                };
                out.write(&text)?;
                Ok(())
            },
        ),
    );

    handlebars
}

/// Prompt manager for loading and rendering templates.
pub struct PromptManager {
    templates: HashMap<String, PromptTemplate>,
}

impl PromptManager {
    /// Create a new prompt manager with the topic templates.
    pub fn new() -> Self {
        let mut manager = Self {
            templates: HashMap::new(),
        };

        manager.register(version_skew::template());
        manager.register(cluster_summary::template());
        manager.register(cluster_health::template());
        manager.register(addon_compatibility::template());
        manager.register(version_changes::template());
        manager.register(deprecated_apis::template());
        manager.register(control_plane::template());
        manager.register(addon_upgrade::template());
        manager.register(nodegroups::template());
        manager.register(test_validation::template());

        manager
    }

    /// Register a template, replacing any with the same ID.
    pub fn register(&mut self, template: PromptTemplate) {
        self.templates.insert(template.id.clone(), template);
    }

    /// Get a template by ID.
    pub fn get(&self, id: &str) -> Option<&PromptTemplate> {
        self.templates.get(id)
    }

    /// Render a template with context.
    pub fn render<T: Serialize>(&self, id: &str, context: &T) -> PlannerResult<(String, String)> {
        let template = self.get(id).ok_or_else(|| PlannerError::Template {
            template: id.to_string(),
            reason: "template not found".to_string(),
        })?;
        template.render(context)
    }

    /// List all template IDs.
    pub fn template_ids(&self) -> Vec<&str> {
        self.templates.keys().map(String::as_str).collect()
    }
}

impl Default for PromptManager {
    fn default() -> Self {
        Self::new()
    }
}
