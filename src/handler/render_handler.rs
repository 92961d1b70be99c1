use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use bson::oid::ObjectId;
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info};

use crate::middlewares::auth_middleware::AuthContext;
use crate::service::quote_flow_service::{QuoteFlowService, QuoteFlowServiceImpl};
use crate::util::error::ServiceError;
use crate::util::pdf::{render_quote_html, PdfRenderService};

pub struct RenderState {
    pub flow: Arc<QuoteFlowServiceImpl>,
    pub renderer: Arc<PdfRenderService>,
}

#[derive(Debug, Deserialize)]
pub struct GenerateQuoteParams {
    #[serde(rename = "quoteId")]
    pub quote_id: String,
}

fn message_response(status: StatusCode, message: String) -> Response {
    (status, Json(json!({ "message": message }))).into_response()
}

/// `GET /api/generate-quote?quoteId=<id>`: prints a finalized quote to PDF.
/// Errors come back as JSON `{message}` with 400/404/500.
pub async fn generate_quote_handler(
    State(state): State<Arc<RenderState>>,
    Extension(ctx): Extension<AuthContext>,
    Query(params): Query<GenerateQuoteParams>,
) -> Response {
    info!("Generating quote PDF for {}", params.quote_id);

    let id = match ObjectId::parse_str(&params.quote_id) {
        Ok(id) => id,
        Err(_) => {
            return message_response(StatusCode::BAD_REQUEST, "Invalid quote id".to_string());
        }
    };

    let detail = match state.flow.get_quote(&ctx, id).await {
        Ok(detail) => detail,
        Err(ServiceError::NotFound(msg)) => {
            return message_response(StatusCode::NOT_FOUND, msg);
        }
        Err(e) => {
            error!("Failed to load quote for rendering: {}", e);
            return message_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to load quote".to_string(),
            );
        }
    };

    // Only finalized quotes have a printable document
    if !detail.info.is_finalized() {
        return message_response(
            StatusCode::BAD_REQUEST,
            "Quote is not finalized yet".to_string(),
        );
    }

    let html = match render_quote_html(&detail.info, &detail.current) {
        Ok(html) => html,
        Err(e) => {
            error!("Template rendering failed: {}", e);
            return message_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to render quote".to_string(),
            );
        }
    };

    match state.renderer.render(&html).await {
        Ok(bytes) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "application/pdf")],
            bytes,
        )
            .into_response(),
        Err(e) => {
            error!("PDF rendering failed: {}", e);
            message_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to render quote".to_string(),
            )
        }
    }
}
