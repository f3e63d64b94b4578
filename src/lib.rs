//! # ticket-forge – travel ticket rendering
//!
//! A ticket is described by a typed [`context::TicketContext`], checked by
//! [`validate()`], rendered into HTML through Tera templates and converted to
//! PDF by an in-process pipeline. The pipeline stages are:
//!
//! 1. **Parse** – HTML string → DOM tree plus `<head>` metadata ([`dom`])
//! 2. **Cascade** – stylesheets and `@page` rules ([`css`]), computed styles ([`style`])
//! 3. **Assets** – stylesheets, fonts and images resolved against a base directory ([`assets`])
//! 4. **Layout** – compute flexbox/grid layout with Taffy ([`layout`])
//! 5. **Paginate** – split into pages ([`pagination`])
//! 6. **Render** – emit PDF bytes via printpdf ([`render`])
//!
//! Two adapters sit on top of [`Renderer`]: an axum endpoint ([`server`]) and
//! a debug command that writes paired HTML/PDF artifacts ([`artifacts`]).

pub mod artifacts;
pub mod assets;
pub mod context;
pub mod css;
pub mod dom;
pub mod error;
pub mod fonts;
pub mod layout;
pub mod layout_config;
pub mod pagination;
pub mod pipeline;
pub mod render;
pub mod renderer;
pub mod server;
pub mod style;
pub mod svg;
pub mod templates;
pub mod validate;

// Re-exports for convenience
pub use context::{build_context, build_context_with, ContextMap, Fixture, TicketContext};
pub use error::{RenderError, ValidationError};
pub use pipeline::{generate_pdf, PageOrientation, PipelineConfig};
pub use renderer::{RenderedTicket, Renderer};
pub use validate::validate;
