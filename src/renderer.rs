//! The renderer shared by both delivery adapters: context → HTML → PDF.

use std::path::{Path, PathBuf};

use crate::context::ContextMap;
use crate::error::RenderError;
use crate::layout_config::LayoutConfig;
use crate::pipeline::{generate_pdf, PipelineConfig};
use crate::templates::{self, PDF_TEMPLATE_NAME};
use crate::validate::validate;

/// Output of one full render.
#[derive(Debug, Clone)]
pub struct RenderedTicket {
    /// Exactly the markup the PDF was produced from.
    pub html: String,
    pub pdf: Vec<u8>,
    pub layout: LayoutConfig,
}

/// Owns the template directory and engine configuration. Holds no mutable
/// state, so one instance can serve every request for the life of a process.
#[derive(Debug, Clone)]
pub struct Renderer {
    template_dir: PathBuf,
    pipeline: PipelineConfig,
}

impl Renderer {
    /// Check the template directory before any work is done. A missing
    /// directory or a directory without the PDF template is fatal.
    pub fn new(template_dir: impl Into<PathBuf>) -> Result<Self, RenderError> {
        let template_dir = template_dir.into();
        if !template_dir.is_dir() {
            return Err(RenderError::dependency(format!(
                "template directory {} does not exist",
                template_dir.display()
            )));
        }
        if !template_dir.join(PDF_TEMPLATE_NAME).is_file() {
            return Err(RenderError::dependency(format!(
                "template {PDF_TEMPLATE_NAME} is missing from {}",
                template_dir.display()
            )));
        }
        log::debug!("using templates from {}", template_dir.display());
        Ok(Self {
            template_dir,
            pipeline: PipelineConfig::default(),
        })
    }

    /// Replace the engine configuration. A `base_url` left unset resolves
    /// against the template directory.
    pub fn with_pipeline(mut self, pipeline: PipelineConfig) -> Self {
        self.pipeline = pipeline;
        self
    }

    /// Use the TrueType font at `path` for any family without its own
    /// `@font-face`. The file must exist now rather than at first render.
    pub fn with_fallback_font(mut self, path: impl Into<PathBuf>) -> Result<Self, RenderError> {
        let path = path.into();
        if !path.is_file() {
            return Err(RenderError::dependency(format!("font {} does not exist", path.display())));
        }
        self.pipeline.fallback_font = Some(path);
        Ok(self)
    }

    pub fn template_dir(&self) -> &Path {
        &self.template_dir
    }

    pub fn pipeline(&self) -> &PipelineConfig {
        &self.pipeline
    }

    fn default_base_url(&self) -> String {
        self.template_dir.to_string_lossy().into_owned()
    }

    /// Render a template by name. Every interpolated value is escaped except
    /// those the template explicitly marks `| safe`.
    pub fn render_html(&self, context: &ContextMap, template: &str) -> Result<String, RenderError> {
        templates::render(&self.template_dir, template, context)
    }

    /// Convert HTML into PDF bytes. Relative references resolve against
    /// `base_url`, falling back to the configured one, then the template
    /// directory.
    pub fn render_pdf(&self, html: &str, base_url: Option<&str>) -> Result<Vec<u8>, RenderError> {
        self.render_pdf_with_layout(html, base_url).map(|(pdf, _)| pdf)
    }

    pub fn render_pdf_with_layout(
        &self,
        html: &str,
        base_url: Option<&str>,
    ) -> Result<(Vec<u8>, LayoutConfig), RenderError> {
        let mut config = self.pipeline.clone();
        config.base_url = base_url
            .map(str::to_string)
            .or(config.base_url)
            .or_else(|| Some(self.default_base_url()));
        generate_pdf(html, &config)
    }

    /// Validate, render HTML, then render the PDF from that same HTML.
    pub fn render_ticket(&self, context: &ContextMap, template: &str) -> Result<RenderedTicket, RenderError> {
        validate(context)?;
        let html = self.render_html(context, template)?;
        let (pdf, layout) = self.render_pdf_with_layout(&html, None)?;
        log::debug!("rendered {template}: {} bytes of HTML, {} bytes of PDF", html.len(), pdf.len());
        Ok(RenderedTicket { html, pdf, layout })
    }
}
