// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Template rendering contract.

use async_trait::async_trait;

use crate::error::HeraldError;
use crate::types::RenderContext;

/// Renders a template identifier against a context.
///
/// Implementations may pick a locale-specific variant of the template.
#[async_trait]
pub trait TemplateRenderer: Send + Sync {
    async fn render(
        &self,
        template: &str,
        context: &RenderContext,
        locale: &str,
    ) -> Result<String, HeraldError>;
}
