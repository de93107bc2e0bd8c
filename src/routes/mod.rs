use axum::{Router, routing::post};

use crate::state::AppState;

pub mod admin;
pub mod auth;
pub mod cart;
pub mod doc;
pub mod health;
pub mod orders;
pub mod params;
pub mod portal;
pub mod products;
pub mod restaurants;
pub mod shop;

// Build the API router without binding state; it will be provided at the top level.
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/restaurants", restaurants::router())
        .nest("/cart", cart::router())
        .nest("/orders", orders::route())
        .nest("/portal", portal::router())
        .nest("/admin", admin::router())
        .nest("/products", products::router())
        .nest("/shop", shop::router())
        .route("/chatbot", post(shop::chatbot))
}
