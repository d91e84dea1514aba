// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Template lookup and `{{ key }}` substitution.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use async_trait::async_trait;
use herald_core::{HeraldError, RenderContext, TemplateRenderer};
use regex::{Captures, Regex};
use serde_json::Value;
use tracing::debug;

/// `{{ key }}` or `{{ nested.key }}` placeholders.
static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{\s*([A-Za-z0-9_.\-]+)\s*\}\}").unwrap());

/// Substitutes placeholders from `context`.
///
/// Dotted keys walk nested objects. Missing keys and nulls render empty,
/// strings render without quotes, other values render as JSON.
pub fn substitute(source: &str, context: &RenderContext) -> String {
    PLACEHOLDER
        .replace_all(source, |caps: &Captures<'_>| lookup(context, &caps[1]))
        .into_owned()
}

fn lookup(context: &RenderContext, key: &str) -> String {
    let mut parts = key.split('.');
    let first = parts.next().and_then(|k| context.get(k));
    let value = parts.fold(first, |value, part| match value {
        Some(Value::Object(map)) => map.get(part),
        Some(Value::Array(items)) => part.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    });
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Locale-specific template keys to try, most specific first.
///
/// `pt-BR` yields `pt-BR/{template}`, `pt/{template}`, then `{template}`.
fn candidates(template: &str, locale: &str) -> Vec<String> {
    let mut keys = Vec::with_capacity(3);
    if !locale.is_empty() {
        keys.push(format!("{locale}/{template}"));
        if let Some((base, _)) = locale.split_once(['-', '_']) {
            keys.push(format!("{base}/{template}"));
        }
    }
    keys.push(template.to_string());
    keys
}

/// Loads templates from a directory tree: `{dir}/{locale}/{template}` with
/// fallback to the base language and then to `{dir}/{template}`.
#[derive(Debug, Clone)]
pub struct FileTemplateRenderer {
    dir: PathBuf,
}

impl FileTemplateRenderer {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    async fn load(&self, template: &str, locale: &str) -> Result<String, HeraldError> {
        if Path::new(template).is_absolute() || template.split('/').any(|p| p == "..") {
            return Err(HeraldError::Template(format!(
                "template `{template}` must be a relative path inside the template directory"
            )));
        }
        for key in candidates(template, locale) {
            let path = self.dir.join(&key);
            match tokio::fs::read_to_string(&path).await {
                Ok(content) => {
                    debug!(template, path = %path.display(), "template loaded");
                    return Ok(content);
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => {
                    return Err(HeraldError::Template(format!(
                        "failed to read {}: {e}",
                        path.display()
                    )));
                }
            }
        }
        Err(HeraldError::Template(format!(
            "template `{template}` not found in {}",
            self.dir.display()
        )))
    }
}

#[async_trait]
impl TemplateRenderer for FileTemplateRenderer {
    async fn render(
        &self,
        template: &str,
        context: &RenderContext,
        locale: &str,
    ) -> Result<String, HeraldError> {
        let source = self.load(template, locale).await?;
        Ok(substitute(&source, context))
    }
}

/// In-memory templates keyed the same way as [`FileTemplateRenderer`] paths.
#[derive(Debug, Clone, Default)]
pub struct InlineTemplateRenderer {
    templates: HashMap<String, String>,
}

impl InlineTemplateRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, source: impl Into<String>) -> Self {
        self.templates.insert(key.into(), source.into());
        self
    }
}

#[async_trait]
impl TemplateRenderer for InlineTemplateRenderer {
    async fn render(
        &self,
        template: &str,
        context: &RenderContext,
        locale: &str,
    ) -> Result<String, HeraldError> {
        candidates(template, locale)
            .iter()
            .find_map(|key| self.templates.get(key))
            .map(|source| substitute(source, context))
            .ok_or_else(|| HeraldError::Template(format!("template `{template}` not found")))
    }
}
