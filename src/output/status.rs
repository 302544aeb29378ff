//! HTML status page templating

use crate::{
    error::{AppError, Result},
    models::StatusData,
};
use regex::{NoExpand, Regex};
use std::path::Path;

/// Content type of the status page
pub const HTML_CONTENT_TYPE: &str = "text/html; charset=utf-8";

/// Status page template, read once at startup.
///
/// The `let mailServerData = {...};` literal in the template is replaced
/// with a JSON object of current values on every render. Nested braces one
/// level deep are supported, as used by `lastUpdated`.
#[derive(Debug, Clone)]
pub struct StatusTemplate {
    template: String,
    data_literal: Regex,
}

impl StatusTemplate {
    /// Read the template from `path`. A missing file is a configuration error.
    pub fn load(path: &Path) -> Result<Self> {
        let template = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => {
                AppError::config(format!("Status HTML file not found: {}", path.display()))
            }
            _ => AppError::io(format!("Error loading status HTML template {}: {}", path.display(), e)),
        })?;

        let status = Self::from_string(template)?;
        if !status.has_data_literal() {
            tracing::warn!(
                path = %path.display(),
                "Status template has no mailServerData literal, it will be served unchanged"
            );
        }
        tracing::info!("Successfully loaded status HTML template from {}", path.display());

        Ok(status)
    }

    pub fn from_string<S: Into<String>>(template: S) -> Result<Self> {
        Ok(Self {
            template: template.into(),
            data_literal: Regex::new(r"let\s+mailServerData\s*=\s*\{(?:[^{}]*(?:\{[^{}]*\})*)*\};")?,
        })
    }

    pub fn has_data_literal(&self) -> bool {
        self.data_literal.is_match(&self.template)
    }

    /// Template with the data literal replaced by `status` as a JSON object
    pub fn render(&self, status: &StatusData) -> String {
        match serde_json::to_string_pretty(status) {
            Ok(object) => {
                let literal = format!("let mailServerData = {};", object);
                self.data_literal
                    .replace_all(&self.template, NoExpand(&literal))
                    .into_owned()
            }
            Err(e) => {
                tracing::error!("Could not serialize status data: {}", e);
                self.template.clone()
            }
        }
    }
}
