use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};
use uuid::Uuid;

use crate::{
    dto::restaurants::{RestaurantDetail, RestaurantList, SearchQuery},
    error::AppResult,
    response::ApiResponse,
    services::restaurant_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_restaurants))
        .route("/search", get(search_restaurants))
        .route("/{id}", get(get_restaurant))
}

#[utoipa::path(
    get,
    path = "/api/restaurants",
    responses(
        (status = 200, description = "All restaurants", body = ApiResponse<RestaurantList>)
    ),
    tag = "Restaurants"
)]
pub async fn list_restaurants(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<RestaurantList>>> {
    let resp = restaurant_service::list_restaurants(&state).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/restaurants/search",
    params(
        ("query" = Option<String>, Query, description = "Matches restaurant name, cuisine or dish name")
    ),
    responses(
        (status = 200, description = "Matching restaurants", body = ApiResponse<RestaurantList>)
    ),
    tag = "Restaurants"
)]
pub async fn search_restaurants(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> AppResult<Json<ApiResponse<RestaurantList>>> {
    let resp = match query.query.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
        Some(q) => restaurant_service::search(&state, q).await?,
        None => restaurant_service::list_restaurants(&state).await?,
    };
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/restaurants/{id}",
    params(
        ("id" = Uuid, Path, description = "Restaurant ID")
    ),
    responses(
        (status = 200, description = "Restaurant with its menu", body = ApiResponse<RestaurantDetail>),
        (status = 404, description = "Restaurant not found")
    ),
    tag = "Restaurants"
)]
pub async fn get_restaurant(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<RestaurantDetail>>> {
    let resp = restaurant_service::restaurant_detail(&state, id).await?;
    Ok(Json(resp))
}
