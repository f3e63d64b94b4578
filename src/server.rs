//! HTTP delivery: `GET /public/tickets/{ticket_id}/pdf`.
//!
//! The ticket id only names the download. Every request renders the same
//! synthetic ticket from [`build_context`]; there is no data source to look
//! the id up in yet.

use std::sync::Arc;

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;

use crate::context::build_context;
use crate::error::RenderError;
use crate::renderer::Renderer;
use crate::templates::PDF_TEMPLATE_NAME;

pub const TICKET_PDF_ROUTE: &str = "/public/tickets/{ticket_id}/pdf";

pub fn router(renderer: Arc<Renderer>) -> Router {
    Router::new()
        .route(TICKET_PDF_ROUTE, get(ticket_pdf))
        .with_state(renderer)
}

fn download_name(ticket_id: &str) -> String {
    format!("ticket-{ticket_id}.pdf")
}

async fn ticket_pdf(State(renderer): State<Arc<Renderer>>, Path(ticket_id): Path<String>) -> Response {
    let Ok(disposition) =
        HeaderValue::from_str(&format!("attachment; filename={}", download_name(&ticket_id)))
    else {
        return (StatusCode::BAD_REQUEST, "invalid ticket id").into_response();
    };

    let rendered = tokio::task::spawn_blocking(move || -> Result<Vec<u8>, RenderError> {
        let context = build_context().to_map()?;
        Ok(renderer.render_ticket(&context, PDF_TEMPLATE_NAME)?.pdf)
    })
    .await;

    match rendered {
        Ok(Ok(pdf)) => {
            log::info!("rendered ticket {ticket_id} ({} bytes)", pdf.len());
            build_pdf_response(pdf, disposition)
        }
        Ok(Err(e)) => {
            log::error!("failed to render ticket {ticket_id}: {e}");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
        Err(e) => {
            log::error!("render task for ticket {ticket_id} did not complete: {e}");
            (StatusCode::INTERNAL_SERVER_ERROR, "render task failed").into_response()
        }
    }
}

fn build_pdf_response(pdf: Vec<u8>, disposition: HeaderValue) -> Response {
    let length = pdf.len();
    let mut response = Response::new(Body::from(pdf));
    *response.status_mut() = StatusCode::OK;

    let headers = response.headers_mut();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/pdf"));
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(length));
    headers.insert(header::CONTENT_DISPOSITION, disposition);

    response
}
