//! HTTP surface for the quote companion

pub mod chat_api;
pub mod quote_api;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::agent::QuoteAgent;

#[derive(Clone)]
pub struct AppState {
    pub agent: Arc<QuoteAgent>,
}

pub fn build_router(agent: Arc<QuoteAgent>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/chat", post(chat_api::chat))
        .route("/chat/feedback", post(chat_api::feedback))
        .route("/chat/history/:session_id", get(chat_api::history))
        .route("/chat/tools", get(chat_api::tools))
        .route(
            "/quotes",
            get(quote_api::get_all_quotes).post(quote_api::create_quote),
        )
        .route("/quotes/categories/", get(quote_api::get_categories))
        .route("/quotes/:category", get(quote_api::get_quotes_by_category))
        .route("/healthz", get(|| async { "OK" }))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(AppState { agent })
}
