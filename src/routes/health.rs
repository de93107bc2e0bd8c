use axum::{Json, extract::State};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    response::{ApiResponse, Meta},
    state::AppState,
};

#[derive(Serialize, ToSchema)]
pub struct HealthData {
    pub status: String,
    /// Collections that could not be read.
    pub unreadable: Vec<String>,
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "OK", body = ApiResponse<HealthData>),
    ),
        tag = "Health"
)]
pub async fn health_check(State(state): State<AppState>) -> Json<ApiResponse<HealthData>> {
    let checks = [
        (state.users.collection(), state.users.all().await.is_ok()),
        (state.restaurants.collection(), state.restaurants.all().await.is_ok()),
        (state.menu_items.collection(), state.menu_items.all().await.is_ok()),
        (state.orders.collection(), state.orders.all().await.is_ok()),
        (state.products.collection(), state.products.all().await.is_ok()),
    ];
    let unreadable: Vec<String> = checks
        .iter()
        .filter(|(_, ok)| !ok)
        .map(|(name, _)| name.to_string())
        .collect();

    let status = if unreadable.is_empty() { "ok" } else { "degraded" };
    let data = HealthData {
        status: status.to_string(),
        unreadable,
    };

    Json(ApiResponse::success(
        "Health check",
        data,
        Some(Meta::empty()),
    ))
}
