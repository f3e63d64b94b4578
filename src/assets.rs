//! Asset resolution – turns `href`/`src` references found in a document into
//! bytes, relative to the document's base URL.
//!
//! Only local files and `data:` URIs are read. Remote references are never
//! fetched.

use std::path::{Path, PathBuf};

use base64::{engine::general_purpose::STANDARD as BASE64_STD, Engine as _};

use crate::dom::Tag;
use crate::error::RenderError;
use crate::style::StyledNode;

/// A decoded `data:<mime>;base64,<data>` URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUri {
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl DataUri {
    /// Parse a base64 data URI. Errors are human-readable and meant for logs.
    pub fn parse(src: &str) -> Result<Self, String> {
        let Some(rest) = src.strip_prefix("data:") else {
            let preview: String = src.chars().take(80).collect();
            return Err(format!("not a data URI: {preview:?}"));
        };
        let comma = rest
            .find(',')
            .ok_or_else(|| "invalid data URI: missing `,` separator".to_string())?;
        let header = &rest[..comma];
        if !header.split(';').any(|part| part.eq_ignore_ascii_case("base64")) {
            return Err("only base64-encoded data URIs are supported".to_string());
        }
        let mime = header.split(';').next().unwrap_or_default().trim().to_ascii_lowercase();
        let bytes = BASE64_STD
            .decode(rest[comma + 1..].trim())
            .map_err(|e| format!("base64 decode error: {e}"))?;
        Ok(Self { mime, bytes })
    }

    pub fn encode(mime: &str, bytes: &[u8]) -> String {
        format!("data:{mime};base64,{}", BASE64_STD.encode(bytes))
    }

    pub fn is_svg(&self) -> bool {
        self.mime == "image/svg+xml"
    }
}

/// Where a reference points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetLocation {
    Data,
    Remote,
    File(PathBuf),
}

/// Resolves references against a base directory.
#[derive(Debug, Clone, Default)]
pub struct AssetResolver {
    base: Option<PathBuf>,
}

impl AssetResolver {
    /// `base_url` is a directory path or a `file://` URL. Without one,
    /// relative references resolve against the working directory.
    pub fn new(base_url: Option<&str>) -> Self {
        Self {
            base: base_url.map(|url| PathBuf::from(strip_file_scheme(url))),
        }
    }

    pub fn base(&self) -> Option<&Path> {
        self.base.as_deref()
    }

    pub fn locate(&self, href: &str) -> AssetLocation {
        let href = href.trim();
        if href.starts_with("data:") {
            return AssetLocation::Data;
        }
        let lower = href.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") || href.starts_with("//") {
            return AssetLocation::Remote;
        }
        // Query strings and fragments never name part of a local file.
        let path = strip_file_scheme(href)
            .split(['?', '#'])
            .next()
            .unwrap_or_default();
        let path = Path::new(path);
        if path.is_absolute() {
            return AssetLocation::File(path.to_path_buf());
        }
        match &self.base {
            Some(base) => AssetLocation::File(base.join(path)),
            None => AssetLocation::File(path.to_path_buf()),
        }
    }

    /// Read the bytes behind `href`. Remote references are an error here;
    /// callers that tolerate them check [`AssetResolver::locate`] first.
    pub fn load(&self, href: &str) -> Result<Vec<u8>, RenderError> {
        match self.locate(href) {
            AssetLocation::Data => DataUri::parse(href)
                .map(|uri| uri.bytes)
                .map_err(|reason| RenderError::Asset {
                    href: truncate(href),
                    path: PathBuf::new(),
                    reason,
                }),
            AssetLocation::Remote => Err(RenderError::Asset {
                href: href.to_string(),
                path: PathBuf::new(),
                reason: "remote resources are not fetched".to_string(),
            }),
            AssetLocation::File(path) => std::fs::read(&path).map_err(|e| RenderError::Asset {
                href: href.to_string(),
                path,
                reason: e.to_string(),
            }),
        }
    }

    pub fn load_stylesheet(&self, href: &str) -> Result<String, RenderError> {
        let bytes = self.load(href)?;
        String::from_utf8(bytes).map_err(|e| RenderError::Asset {
            href: href.to_string(),
            path: self.path_of(href),
            reason: format!("stylesheet is not valid UTF-8: {e}"),
        })
    }

    /// Turn an image reference into a data URI. Missing and remote images
    /// are logged and yield `None`.
    pub fn inline_image(&self, src: &str) -> Option<String> {
        match self.locate(src) {
            AssetLocation::Data => Some(src.to_string()),
            AssetLocation::Remote => {
                log::warn!("skipping remote image {src}");
                None
            }
            AssetLocation::File(path) => match std::fs::read(&path) {
                Ok(bytes) => Some(DataUri::encode(mime_for(&path), &bytes)),
                Err(e) => {
                    log::warn!("skipping image {src} ({}): {e}", path.display());
                    None
                }
            },
        }
    }

    /// Rewrite every `<img src>` in the tree to a data URI, dropping images
    /// that cannot be loaded.
    pub fn inline_images(&self, nodes: &mut Vec<StyledNode>) {
        nodes.retain_mut(|node| match node {
            StyledNode::Element {
                tag: Tag::Img,
                attrs,
                ..
            } => {
                let Some(src) = attrs.get("src").filter(|s| !s.trim().is_empty()) else {
                    log::warn!("skipping <img> without src");
                    return false;
                };
                match self.inline_image(src) {
                    Some(data_uri) => {
                        attrs.insert("src".to_string(), data_uri);
                        true
                    }
                    None => false,
                }
            }
            StyledNode::Element { children, .. } => {
                self.inline_images(children);
                true
            }
            StyledNode::Text { .. } => true,
        });
    }

    fn path_of(&self, href: &str) -> PathBuf {
        match self.locate(href) {
            AssetLocation::File(path) => path,
            _ => PathBuf::new(),
        }
    }
}

fn strip_file_scheme(url: &str) -> &str {
    url.strip_prefix("file://").unwrap_or(url)
}

fn truncate(href: &str) -> String {
    href.chars().take(64).collect()
}

fn mime_for(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("svg") => "image/svg+xml",
        _ => "application/octet-stream",
    }
}
