use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Multipart, Path, Query, State};
use axum::response::IntoResponse;
use axum::{Extension, Json};
use bson::oid::ObjectId;
use bytes::BytesMut;
use tracing::{debug, error, info};
use validator::Validate;

use crate::dto::quote_dto::{
    CreateQuoteRequest, File, ProviderRevisionRequest, RejectQuoteRequest,
};
use crate::middlewares::auth_middleware::AuthContext;
use crate::service::quote_flow_service::{QuoteFlowService, QuoteFlowServiceImpl};
use crate::util::error::HandlerError;

fn parse_object_id(raw: &str, what: &str) -> Result<ObjectId, HandlerError> {
    ObjectId::parse_str(raw).map_err(|_| HandlerError::bad_request(format!("Invalid {} id", what)))
}

/// Multipart submission: a `json` part carrying the request body plus
/// optional `file<N>` parts with the reference image for entry N.
pub async fn create_quote_handler(
    State(service): State<Arc<QuoteFlowServiceImpl>>,
    Extension(ctx): Extension<AuthContext>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, HandlerError> {
    info!("[create_quote_handler] Handler called");
    let mut json_data: Option<CreateQuoteRequest> = None;
    let mut images: HashMap<usize, File> = HashMap::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| HandlerError::bad_request(format!("Failed to get next field: {}", e)))?
    {
        let name = field.name().map(|s| s.to_string()).unwrap_or_default();
        debug!("[create_quote_handler] Processing field: {}", name);

        if name == "json" {
            let data = field
                .bytes()
                .await
                .map_err(|e| HandlerError::bad_request(format!("Failed to read json field: {}", e)))?;
            let request: CreateQuoteRequest = serde_json::from_slice(&data).map_err(|e| {
                error!("[create_quote_handler] Invalid JSON: {}", e);
                HandlerError::bad_request(format!("Invalid JSON: {}", e))
            })?;
            json_data = Some(request);
        } else if let Some(index) = name.strip_prefix("file") {
            let index: usize = index
                .parse()
                .map_err(|_| HandlerError::bad_request(format!("Invalid file field: {}", name)))?;
            let filename = field.file_name().map(|s| s.to_string()).unwrap_or_default();
            let content_type = field.content_type().map(|s| s.to_string()).unwrap_or_default();

            let mut buf = BytesMut::new();
            let mut stream = field;
            while let Some(chunk) = stream.chunk().await.map_err(|e| {
                HandlerError::bad_request(format!("Failed to read file chunk: {}", e))
            })? {
                buf.extend_from_slice(&chunk);
            }
            info!(
                "[create_quote_handler] Received file for entry {}: {} ({} bytes)",
                index,
                filename,
                buf.len()
            );
            images.insert(
                index,
                File {
                    filename,
                    content_type,
                    size: buf.len(),
                    content: buf.to_vec(),
                },
            );
        }
    }

    let request = json_data
        .ok_or_else(|| HandlerError::bad_request("Missing quote JSON data".to_string()))?;

    // Server-side re-validation before any write
    if let Err(e) = request.validate() {
        return Err(HandlerError::bad_request(format!("Validation error: {}", e)));
    }

    let created = service.create_quote(&ctx, request, images).await?;
    Ok(Json(created))
}

pub async fn list_quotes_handler(
    State(service): State<Arc<QuoteFlowServiceImpl>>,
    Extension(ctx): Extension<AuthContext>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<impl IntoResponse, HandlerError> {
    let page = params.get("page").and_then(|v| v.parse().ok()).unwrap_or(1);
    let limit = params.get("limit").and_then(|v| v.parse().ok()).unwrap_or(20);
    let listing = service.list_active(&ctx, page, limit).await?;
    Ok(Json(listing))
}

pub async fn get_quote_handler(
    State(service): State<Arc<QuoteFlowServiceImpl>>,
    Extension(ctx): Extension<AuthContext>,
    Path((id,)): Path<(String,)>,
) -> Result<impl IntoResponse, HandlerError> {
    let id = parse_object_id(&id, "quote")?;
    let detail = service.get_quote(&ctx, id).await?;
    Ok(Json(detail))
}

pub async fn accept_quote_handler(
    State(service): State<Arc<QuoteFlowServiceImpl>>,
    Extension(ctx): Extension<AuthContext>,
    Path((id,)): Path<(String,)>,
) -> Result<impl IntoResponse, HandlerError> {
    let id = parse_object_id(&id, "quote")?;
    let detail = service.accept_quote(&ctx, id).await?;
    Ok(Json(detail))
}

pub async fn reject_quote_handler(
    State(service): State<Arc<QuoteFlowServiceImpl>>,
    Extension(ctx): Extension<AuthContext>,
    Path((id,)): Path<(String,)>,
    Json(payload): Json<RejectQuoteRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    let id = parse_object_id(&id, "quote")?;
    if let Err(e) = payload.validate() {
        return Err(HandlerError::bad_request(format!("Validation error: {}", e)));
    }
    let detail = service.reject_quote(&ctx, id, payload).await?;
    Ok(Json(detail))
}

pub async fn finalize_quote_handler(
    State(service): State<Arc<QuoteFlowServiceImpl>>,
    Extension(ctx): Extension<AuthContext>,
    Path((id,)): Path<(String,)>,
) -> Result<impl IntoResponse, HandlerError> {
    let id = parse_object_id(&id, "quote")?;
    let detail = service.finalize_quote(&ctx, id).await?;
    Ok(Json(detail))
}

pub async fn submit_provider_revision_handler(
    State(service): State<Arc<QuoteFlowServiceImpl>>,
    Extension(ctx): Extension<AuthContext>,
    Path((id,)): Path<(String,)>,
    Json(payload): Json<ProviderRevisionRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    let id = parse_object_id(&id, "quote")?;
    if let Err(e) = payload.validate() {
        return Err(HandlerError::bad_request(format!("Validation error: {}", e)));
    }
    let detail = service.submit_provider_revision(&ctx, id, payload).await?;
    Ok(Json(detail))
}

pub async fn select_provider_quote_handler(
    State(service): State<Arc<QuoteFlowServiceImpl>>,
    Extension(ctx): Extension<AuthContext>,
    Path((id, provider_quote_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, HandlerError> {
    let id = parse_object_id(&id, "quote")?;
    let provider_quote_id = parse_object_id(&provider_quote_id, "provider quote")?;
    let detail = service
        .select_provider_quote(&ctx, id, provider_quote_id)
        .await?;
    Ok(Json(detail))
}
