//! Template directory access through Tera.
//!
//! The directory is read from disk on every call. Templates are named by
//! their path relative to the directory (`ticket_weasy.html`,
//! `partials/chip.html`). Files ending in `.html`, `.htm` or `.xml` are
//! autoescaped.

use std::path::{Path, PathBuf};

use tera::{Context, Tera};

use crate::context::ContextMap;
use crate::error::RenderError;

/// Template rendered into the PDF.
pub const PDF_TEMPLATE_NAME: &str = "ticket_weasy.html";
/// Browser variant with the same field contract.
pub const BROWSER_TEMPLATE_NAME: &str = "ticket.html";

const TEMPLATE_EXTENSIONS: [&str; 3] = ["html", "htm", "xml"];

/// The `templates/` directory shipped with the crate.
pub fn default_template_dir() -> PathBuf {
    PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/templates"))
}

/// Load every template under `dir` into a fresh Tera instance.
pub fn load(dir: &Path) -> Result<Tera, RenderError> {
    let mut files = Vec::new();
    collect_template_files(dir, dir, &mut files)?;
    files.sort();

    let mut tera = Tera::default();
    let named: Vec<(PathBuf, Option<String>)> = files
        .into_iter()
        .map(|(name, path)| (path, Some(name)))
        .collect();
    tera.add_template_files(named)?;
    Ok(tera)
}

fn collect_template_files(
    root: &Path,
    dir: &Path,
    out: &mut Vec<(String, PathBuf)>,
) -> Result<(), RenderError> {
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            collect_template_files(root, &path, out)?;
            continue;
        }
        let is_template = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| TEMPLATE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()));
        if !is_template {
            continue;
        }
        if let Ok(relative) = path.strip_prefix(root) {
            let name = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            out.push((name, path));
        }
    }
    Ok(())
}

/// Render `name` from `dir` with `context`.
pub fn render(dir: &Path, name: &str, context: &ContextMap) -> Result<String, RenderError> {
    let tera = load(dir)?;
    if !tera.get_template_names().any(|n| n == name) {
        return Err(RenderError::TemplateNotFound(name.to_string()));
    }
    let context = Context::from_value(serde_json::Value::Object(context.clone()))?;
    Ok(tera.render(name, &context)?)
}
