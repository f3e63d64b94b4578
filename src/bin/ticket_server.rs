//! ticket-server – serves the ticket PDF over HTTP.
//!
//! `GET /public/tickets/{ticket_id}/pdf` renders the ticket on demand and
//! returns it as an attachment named `ticket-{ticket_id}.pdf`.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use clap::Parser;

use ticket_forge::error::RenderError;
use ticket_forge::renderer::Renderer;
use ticket_forge::server::router;
use ticket_forge::templates::default_template_dir;

#[derive(Parser, Debug)]
#[command(name = "ticket-server", version, about = "Serve ticket PDFs over HTTP", long_about = None)]
struct Cli {
    /// Port to listen on
    #[arg(long, env = "PORT", default_value_t = 8000)]
    port: u16,

    /// Address to bind
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    host: std::net::IpAddr,

    /// Directory holding the ticket templates
    #[arg(long, env = "TICKET_TEMPLATE_DIR", value_name = "DIR", default_value_os_t = default_template_dir())]
    template_dir: PathBuf,

    /// TrueType font used for text without its own @font-face
    #[arg(long, env = "TICKET_FONT", value_name = "PATH")]
    font: Option<PathBuf>,
}

fn build_renderer(cli: &Cli) -> Result<Renderer, RenderError> {
    let renderer = Renderer::new(&cli.template_dir)?;
    match &cli.font {
        Some(font) => renderer.with_fallback_font(font),
        None => Ok(renderer),
    }
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let renderer = match build_renderer(&cli) {
        Ok(renderer) => Arc::new(renderer),
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    };

    let addr = SocketAddr::new(cli.host, cli.port);
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            eprintln!("Error: could not bind {addr}: {e}");
            process::exit(1);
        }
    };
    log::info!(
        "serving tickets on http://{addr} from {}",
        renderer.template_dir().display()
    );

    if let Err(e) = axum::serve(listener, router(renderer).into_make_service()).await {
        eprintln!("Error: server stopped: {e}");
        process::exit(1);
    }
}
