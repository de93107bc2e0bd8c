use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, patch, put},
};
use uuid::Uuid;

use crate::{
    dto::{
        menu::{MenuByCategory, MenuItemRequest},
        orders::{OrderList, OrderView, UpdateOrderStatusRequest},
        restaurants::{RestaurantDashboard, RestaurantRequest},
    },
    error::AppResult,
    middleware::auth::AuthUser,
    models::{MenuItem, Order, Restaurant},
    response::ApiResponse,
    routes::params::OrderListQuery,
    services::{menu_service, order_service, restaurant_service},
    state::AppState,
};

/// Routes for restaurant operators, nested under `/api/portal`.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(dashboard))
        .route("/restaurant", put(edit_restaurant).post(create_restaurant))
        .route("/menu", get(menu).post(add_menu_item))
        .route("/menu/{id}", put(edit_menu_item).delete(delete_menu_item))
        .route("/orders", get(list_orders))
        .route("/orders/{id}", get(get_order))
        .route("/orders/{id}/status", patch(update_order_status))
}

#[utoipa::path(
    get,
    path = "/api/portal/dashboard",
    responses(
        (status = 200, description = "Restaurant, its orders and menu", body = ApiResponse<RestaurantDashboard>),
        (status = 403, description = "Not a restaurant account"),
        (status = 404, description = "No restaurant yet")
    ),
    security(("bearer_auth" = [])),
    tag = "Portal"
)]
pub async fn dashboard(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<RestaurantDashboard>>> {
    let resp = restaurant_service::dashboard(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/portal/restaurant",
    request_body = RestaurantRequest,
    responses(
        (status = 200, description = "Create the operator's restaurant", body = ApiResponse<Restaurant>),
        (status = 400, description = "Invalid input or restaurant already exists"),
        (status = 403, description = "Not a restaurant account")
    ),
    security(("bearer_auth" = [])),
    tag = "Portal"
)]
pub async fn create_restaurant(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<RestaurantRequest>,
) -> AppResult<Json<ApiResponse<Restaurant>>> {
    let resp = restaurant_service::create_restaurant(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/portal/restaurant",
    request_body = RestaurantRequest,
    responses(
        (status = 200, description = "Edit the operator's restaurant", body = ApiResponse<Restaurant>),
        (status = 403, description = "Not a restaurant account"),
        (status = 404, description = "No restaurant yet")
    ),
    security(("bearer_auth" = [])),
    tag = "Portal"
)]
pub async fn edit_restaurant(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<RestaurantRequest>,
) -> AppResult<Json<ApiResponse<Restaurant>>> {
    let resp = restaurant_service::edit_restaurant(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/portal/menu",
    responses(
        (status = 200, description = "Menu grouped by category", body = ApiResponse<MenuByCategory>)
    ),
    security(("bearer_auth" = [])),
    tag = "Portal"
)]
pub async fn menu(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<MenuByCategory>>> {
    let resp = menu_service::menu_by_category(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/portal/menu",
    request_body = MenuItemRequest,
    responses(
        (status = 200, description = "Add a menu item", body = ApiResponse<MenuItem>),
        (status = 400, description = "Invalid input")
    ),
    security(("bearer_auth" = [])),
    tag = "Portal"
)]
pub async fn add_menu_item(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<MenuItemRequest>,
) -> AppResult<Json<ApiResponse<MenuItem>>> {
    let resp = menu_service::add_menu_item(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/portal/menu/{id}",
    params(
        ("id" = Uuid, Path, description = "Menu item ID")
    ),
    request_body = MenuItemRequest,
    responses(
        (status = 200, description = "Edit a menu item", body = ApiResponse<MenuItem>),
        (status = 403, description = "Item belongs to another restaurant"),
        (status = 404, description = "Not Found")
    ),
    security(("bearer_auth" = [])),
    tag = "Portal"
)]
pub async fn edit_menu_item(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<MenuItemRequest>,
) -> AppResult<Json<ApiResponse<MenuItem>>> {
    let resp = menu_service::edit_menu_item(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/portal/menu/{id}",
    params(
        ("id" = Uuid, Path, description = "Menu item ID")
    ),
    responses(
        (status = 200, description = "Delete a menu item"),
        (status = 403, description = "Item belongs to another restaurant"),
        (status = 404, description = "Not Found")
    ),
    security(("bearer_auth" = [])),
    tag = "Portal"
)]
pub async fn delete_menu_item(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = menu_service::delete_menu_item(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/portal/orders",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
        ("status" = Option<String>, Query, description = "Filter by status"),
        ("sort_order" = Option<String>, Query, description = "Sort order: asc, desc")
    ),
    responses(
        (status = 200, description = "Orders placed with the operator's restaurant", body = ApiResponse<OrderList>)
    ),
    security(("bearer_auth" = [])),
    tag = "Portal"
)]
pub async fn list_orders(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<OrderListQuery>,
) -> AppResult<Json<ApiResponse<OrderList>>> {
    let resp = restaurant_service::restaurant_orders(&state, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/portal/orders/{id}",
    params(
        ("id" = Uuid, Path, description = "Order ID")
    ),
    responses(
        (status = 200, description = "Order with customer details", body = ApiResponse<OrderView>),
        (status = 403, description = "Order belongs to another restaurant"),
        (status = 404, description = "Not Found")
    ),
    security(("bearer_auth" = [])),
    tag = "Portal"
)]
pub async fn get_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<OrderView>>> {
    let resp = restaurant_service::restaurant_order_detail(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/api/portal/orders/{id}/status",
    params(
        ("id" = Uuid, Path, description = "Order ID")
    ),
    request_body = UpdateOrderStatusRequest,
    responses(
        (status = 200, description = "Update order status", body = ApiResponse<Order>),
        (status = 400, description = "Invalid status"),
        (status = 403, description = "Order belongs to another restaurant"),
        (status = 404, description = "Not Found")
    ),
    security(("bearer_auth" = [])),
    tag = "Portal"
)]
pub async fn update_order_status(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateOrderStatusRequest>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let resp = order_service::update_order_status(&state, &user, id, payload).await?;
    Ok(Json(resp))
}
