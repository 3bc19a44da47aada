//! Email templates

use bhada_errors::{AppError, AppResult};
use std::collections::HashMap;
use tera::Tera;
use tracing::debug;

/// Template registry
pub struct EmailTemplate {
    tera: Tera,
}

impl EmailTemplate {
    /// Load every `*.html` and `*.txt` file under `template_dir`
    pub fn new(template_dir: &str) -> AppResult<Self> {
        let pattern = format!("{}/**/*.{{html,txt}}", template_dir);
        let tera = Tera::new(&pattern)
            .map_err(|e| AppError::internal(format!("Failed to load email templates: {}", e)))?;

        debug!(template_dir = %template_dir, "Email templates loaded");

        Ok(Self { tera })
    }

    /// Build from in-memory template strings (tests)
    pub fn from_strings(templates: HashMap<String, String>) -> AppResult<Self> {
        let mut tera = Tera::default();

        for (name, content) in templates {
            tera.add_raw_template(&name, &content).map_err(|e| {
                AppError::internal(format!("Failed to add template {}: {}", name, e))
            })?;
        }

        Ok(Self { tera })
    }

    pub fn has_template(&self, template_name: &str) -> bool {
        self.tera.get_template_names().any(|name| name == template_name)
    }

    pub fn render(&self, template_name: &str, context: &serde_json::Value) -> AppResult<String> {
        let context = tera::Context::from_serialize(context)
            .map_err(|e| AppError::internal(format!("Failed to create template context: {}", e)))?;

        self.tera.render(template_name, &context).map_err(|e| {
            AppError::internal(format!("Failed to render template {}: {}", template_name, e))
        })
    }

    /// Render the `{name}.html` / `{name}.txt` pair
    pub fn render_pair(
        &self,
        name: &str,
        context: &serde_json::Value,
    ) -> AppResult<(String, String)> {
        let html = self.render(&format!("{}.html", name), context)?;
        let text = self.render(&format!("{}.txt", name), context)?;
        Ok((html, text))
    }
}
