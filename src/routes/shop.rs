use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{delete, get, post},
};
use uuid::Uuid;

use crate::{
    cart::CartSummary,
    dto::{
        cart::{AddToCartRequest, UpdateCartRequest},
        shop::{ChatReply, ChatRequest},
    },
    error::AppResult,
    middleware::auth::AuthUser,
    response::ApiResponse,
    services::shop_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/cart", get(view_cart).post(add_to_cart).put(update_cart))
        .route("/cart/{product_id}", delete(remove_from_cart))
        .route("/order", post(place_order))
}

#[utoipa::path(
    get,
    path = "/api/shop/cart",
    responses(
        (status = 200, description = "Shop cart lines, orphaned lines and total", body = ApiResponse<CartSummary>)
    ),
    security(("bearer_auth" = [])),
    tag = "Shop"
)]
pub async fn view_cart(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<CartSummary>>> {
    let resp = shop_service::view_cart(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/shop/cart",
    request_body = AddToCartRequest,
    responses(
        (status = 200, description = "Add a product to the shop cart", body = ApiResponse<CartSummary>),
        (status = 400, description = "Unknown product")
    ),
    security(("bearer_auth" = [])),
    tag = "Shop"
)]
pub async fn add_to_cart(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<AddToCartRequest>,
) -> AppResult<Json<ApiResponse<CartSummary>>> {
    let resp = shop_service::add_to_cart(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/shop/cart",
    request_body = UpdateCartRequest,
    responses(
        (status = 200, description = "Set a line's quantity; zero or less removes it", body = ApiResponse<CartSummary>),
        (status = 404, description = "Product not in cart")
    ),
    security(("bearer_auth" = [])),
    tag = "Shop"
)]
pub async fn update_cart(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<UpdateCartRequest>,
) -> AppResult<Json<ApiResponse<CartSummary>>> {
    let resp = shop_service::update_cart(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/shop/cart/{product_id}",
    params(
        ("product_id" = Uuid, Path, description = "Product ID")
    ),
    responses(
        (status = 200, description = "Remove a line", body = ApiResponse<CartSummary>),
        (status = 404, description = "Product not in cart")
    ),
    security(("bearer_auth" = [])),
    tag = "Shop"
)]
pub async fn remove_from_cart(
    State(state): State<AppState>,
    user: AuthUser,
    Path(product_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<CartSummary>>> {
    let resp = shop_service::remove_from_cart(&state, &user, product_id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/shop/order",
    responses(
        (status = 200, description = "Confirm the shop cart and empty it", body = ApiResponse<CartSummary>),
        (status = 400, description = "Empty cart")
    ),
    security(("bearer_auth" = [])),
    tag = "Shop"
)]
pub async fn place_order(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<CartSummary>>> {
    let resp = shop_service::place_order(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/chatbot",
    request_body = ChatRequest,
    responses(
        (status = 200, description = "Canned support reply", body = ChatReply)
    ),
    tag = "Shop"
)]
pub async fn chatbot(
    State(state): State<AppState>,
    Json(payload): Json<ChatRequest>,
) -> Json<ChatReply> {
    Json(shop_service::chat(&state, payload).await)
}
