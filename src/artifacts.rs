//! Debug artifacts: a rendered ticket written to disk as a paired
//! `ticket_weasy_debug_{YYYYMMDD-HHMMSS}.html` / `.pdf`.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};

use crate::context::ContextMap;
use crate::error::RenderError;
use crate::renderer::{RenderedTicket, Renderer};

pub const ARTIFACT_PREFIX: &str = "ticket_weasy_debug_";

/// `YYYYMMDD-HHMMSS` in local time.
pub fn timestamp_token(now: DateTime<Local>) -> String {
    now.format("%Y%m%d-%H%M%S").to_string()
}

/// File names sharing one timestamp token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub html: PathBuf,
    pub pdf: PathBuf,
    pub layout_json: PathBuf,
}

impl ArtifactPaths {
    pub fn new(output_dir: &Path, token: &str) -> Self {
        let stem = format!("{ARTIFACT_PREFIX}{token}");
        Self {
            html: output_dir.join(format!("{stem}.html")),
            pdf: output_dir.join(format!("{stem}.pdf")),
            layout_json: output_dir.join(format!("{stem}.layout.json")),
        }
    }
}

/// What a debug run wrote.
#[derive(Debug, Clone)]
pub struct WrittenArtifacts {
    pub html: PathBuf,
    pub pdf: PathBuf,
    pub layout_json: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct DebugRun<'a> {
    pub output_dir: &'a Path,
    pub template: &'a str,
    /// Also write the paginated layout as JSON.
    pub write_layout: bool,
}

/// Render `context` and write the artifacts, stamped with the current time.
pub fn generate_debug_artifacts(
    renderer: &Renderer,
    context: &ContextMap,
    run: &DebugRun<'_>,
) -> Result<WrittenArtifacts, RenderError> {
    generate_debug_artifacts_at(renderer, context, run, &timestamp_token(Local::now()))
}

/// Like [`generate_debug_artifacts`] with an explicit timestamp token.
///
/// Everything is rendered in memory first; nothing is written unless
/// validation and both renders succeed. If a later write fails, the files
/// already written by this run are removed again.
pub fn generate_debug_artifacts_at(
    renderer: &Renderer,
    context: &ContextMap,
    run: &DebugRun<'_>,
    token: &str,
) -> Result<WrittenArtifacts, RenderError> {
    fs::create_dir_all(run.output_dir)?;

    let RenderedTicket { html, pdf, layout } = renderer.render_ticket(context, run.template)?;
    let layout_json = run.write_layout.then(|| layout.to_json()).transpose()?;

    let paths = ArtifactPaths::new(run.output_dir, token);
    let mut written: Vec<&Path> = Vec::new();

    let mut outputs: Vec<(&Path, &[u8])> = vec![
        (paths.html.as_path(), html.as_bytes()),
        (paths.pdf.as_path(), pdf.as_slice()),
    ];
    if let Some(json) = &layout_json {
        outputs.push((paths.layout_json.as_path(), json.as_bytes()));
    }

    for (path, bytes) in outputs {
        if let Err(e) = fs::write(path, bytes) {
            for done in &written {
                if let Err(cleanup) = fs::remove_file(done) {
                    log::warn!("could not remove {}: {cleanup}", done.display());
                }
            }
            return Err(e.into());
        }
        log::debug!("wrote {} ({} bytes)", path.display(), bytes.len());
        written.push(path);
    }

    let layout_json = layout_json.map(|_| paths.layout_json);
    Ok(WrittenArtifacts {
        html: paths.html,
        pdf: paths.pdf,
        layout_json,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn token_format() {
        let at = Local.with_ymd_and_hms(2025, 11, 12, 8, 5, 9).unwrap();
        assert_eq!(timestamp_token(at), "20251112-080509");
    }

    #[test]
    fn paths_share_the_token() {
        let paths = ArtifactPaths::new(Path::new("/tmp/out"), "20251112-080509");
        assert_eq!(
            paths.html,
            PathBuf::from("/tmp/out/ticket_weasy_debug_20251112-080509.html")
        );
        assert_eq!(
            paths.pdf,
            PathBuf::from("/tmp/out/ticket_weasy_debug_20251112-080509.pdf")
        );
        assert_eq!(
            paths.layout_json,
            PathBuf::from("/tmp/out/ticket_weasy_debug_20251112-080509.layout.json")
        );
    }
}
