//! Quote catalogue endpoints

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use serde_json::json;
use tracing::error;

use crate::api::AppState;

#[derive(Debug, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<usize>,
}

pub async fn get_quotes_by_category(
    State(state): State<AppState>,
    Path(category): Path<String>,
    Query(query): Query<LimitQuery>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let limit = query.limit.unwrap_or(15).clamp(1, 100);
    match state.agent.database().quotes.get_by_category(&category, limit) {
        Ok(quotes) => Ok(Json(json!({ "category": category, "quotes": quotes }))),
        Err(e) => {
            error!("Error fetching quotes: {}", e);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Error fetching quotes: {}", e),
            ))
        }
    }
}

pub async fn get_all_quotes(
    State(state): State<AppState>,
    Query(query): Query<LimitQuery>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let limit = query.limit.unwrap_or(100).clamp(1, 500);
    match state.agent.database().quotes.get_all(limit) {
        Ok(quotes) => Ok(Json(json!({ "quotes": quotes }))),
        Err(e) => {
            error!("Error fetching quotes: {}", e);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Error fetching quotes: {}", e),
            ))
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct QuoteCreate {
    pub category: String,
    pub quote: String,
    pub author: String,
}

pub async fn create_quote(
    State(state): State<AppState>,
    Json(payload): Json<QuoteCreate>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    if payload.quote.trim().is_empty() {
        return Err((StatusCode::BAD_REQUEST, "Quote cannot be empty".to_string()));
    }

    match state
        .agent
        .database()
        .quotes
        .insert(&payload.category, &payload.quote, &payload.author)
    {
        Ok(quote) => Ok(Json(json!({
            "message": "Quote created successfully",
            "quote": quote,
        }))),
        Err(e) => {
            error!("Error creating quote: {}", e);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Error creating quote: {}", e),
            ))
        }
    }
}

pub async fn get_categories() -> impl IntoResponse {
    Json(json!({
        "categories": [
            {"name": "motivational", "description": "Boost your motivation and drive"},
            {"name": "romantic", "description": "Express your love and feelings"},
            {"name": "funny", "description": "Brighten your day with humor"},
            {"name": "inspirational", "description": "Find hope and inspiration"},
        ]
    }))
}
