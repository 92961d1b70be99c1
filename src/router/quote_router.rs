use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::handler::quote_handler::{
    accept_quote_handler, create_quote_handler, finalize_quote_handler, get_quote_handler,
    list_quotes_handler, reject_quote_handler, select_provider_quote_handler,
    submit_provider_revision_handler,
};
use crate::handler::render_handler::{generate_quote_handler, RenderState};
use crate::middlewares::auth_middleware::{require_auth, AuthState};
use crate::service::quote_flow_service::QuoteFlowServiceImpl;

/// Quote workflow routes. Everything here requires a valid access token; the
/// per-action role checks live in the service's policy gate.
pub fn quote_router(
    service: Arc<QuoteFlowServiceImpl>,
    render_state: Arc<RenderState>,
    auth_state: Arc<AuthState>,
) -> Router {
    let quotes = Router::new()
        .route("/quotes", post(create_quote_handler))
        .route("/quotes", get(list_quotes_handler))
        .route("/quotes/{id}", get(get_quote_handler))
        .route("/quotes/{id}/accept", post(accept_quote_handler))
        .route("/quotes/{id}/reject", post(reject_quote_handler))
        .route("/quotes/{id}/finalize", post(finalize_quote_handler))
        .route(
            "/quotes/{id}/provider-revisions",
            post(submit_provider_revision_handler),
        )
        .route(
            "/quotes/{id}/provider-quotes/{provider_quote_id}/select",
            post(select_provider_quote_handler),
        )
        .route_layer(middleware::from_fn_with_state(
            auth_state.clone(),
            require_auth,
        ))
        .with_state(service);

    let render = Router::new()
        .route("/api/generate-quote", get(generate_quote_handler))
        .route_layer(middleware::from_fn_with_state(auth_state, require_auth))
        .with_state(render_state);

    quotes.merge(render)
}
