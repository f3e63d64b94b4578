//! ticket-debug – render the synthetic ticket once and keep the artifacts.
//!
//! Usage:
//!   ticket-debug [--output-dir DIR] [--fixture standard|stress] [--layout-json]
//!
//! Writes `ticket_weasy_debug_{YYYYMMDD-HHMMSS}.html` and `.pdf` into the
//! output directory (the system temp directory by default) and prints both
//! paths.

use std::path::PathBuf;
use std::process;

use clap::Parser;

use ticket_forge::artifacts::{generate_debug_artifacts, DebugRun};
use ticket_forge::context::{build_context_with, Fixture};
use ticket_forge::error::RenderError;
use ticket_forge::pipeline::{PageOrientation, PipelineConfig};
use ticket_forge::renderer::Renderer;
use ticket_forge::templates::{default_template_dir, PDF_TEMPLATE_NAME};

#[derive(Parser, Debug)]
#[command(name = "ticket-debug", version, about = "Render the ticket to HTML and PDF debug artifacts", long_about = None)]
struct Cli {
    /// Directory the artifacts are written to (created if absent)
    #[arg(long, value_name = "DIR", default_value_os_t = std::env::temp_dir())]
    output_dir: PathBuf,

    /// Directory holding the ticket templates
    #[arg(long, env = "TICKET_TEMPLATE_DIR", value_name = "DIR", default_value_os_t = default_template_dir())]
    template_dir: PathBuf,

    /// Template to render, by path relative to the template directory
    #[arg(long, default_value = PDF_TEMPLATE_NAME)]
    template: String,

    /// Which synthetic values to fill the ticket with
    #[arg(long, value_enum, default_value_t = Fixture::Stress)]
    fixture: Fixture,

    /// TrueType font used for text without its own @font-face
    #[arg(long, env = "TICKET_FONT", value_name = "PATH")]
    font: Option<PathBuf>,

    /// Lay the ticket out on a landscape page
    #[arg(long)]
    landscape: bool,

    /// Also write the paginated layout as JSON
    #[arg(long)]
    layout_json: bool,
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();
    if let Err(e) = run(&cli) {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<(), RenderError> {
    let mut renderer = Renderer::new(&cli.template_dir)?;
    if let Some(font) = &cli.font {
        renderer = renderer.with_fallback_font(font)?;
    }
    if cli.landscape {
        let pipeline = PipelineConfig {
            orientation: PageOrientation::Landscape,
            ..renderer.pipeline().clone()
        };
        renderer = renderer.with_pipeline(pipeline);
    }

    let context = build_context_with(cli.fixture).to_map()?;
    let written = generate_debug_artifacts(
        &renderer,
        &context,
        &DebugRun {
            output_dir: &cli.output_dir,
            template: &cli.template,
            write_layout: cli.layout_json,
        },
    )?;

    println!("HTML saved to {}", written.html.display());
    println!("PDF saved to {}", written.pdf.display());
    if let Some(layout) = &written.layout_json {
        println!("Layout saved to {}", layout.display());
    }
    Ok(())
}
