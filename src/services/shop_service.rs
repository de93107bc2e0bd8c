use chrono::Local;
use uuid::Uuid;

use crate::{
    cart::{Cart, CartStore, CartSummary, aggregate},
    dto::{
        cart::{AddToCartRequest, UpdateCartRequest},
        require_quantity,
        shop::{ChatReply, ChatRequest},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::Product,
    response::{ApiResponse, Meta},
    services::cart_service::{add_line, remove_line, set_line},
    state::AppState,
};

const CHAT_REPLY: &str = "Thank you for your message. Our team will get back to you soon.";

pub async fn view_cart(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<CartSummary>> {
    let summary = summarize(state, user).await?;
    Ok(ApiResponse::success("OK", summary, Some(Meta::empty())))
}

pub async fn add_to_cart(
    state: &AppState,
    user: &AuthUser,
    payload: AddToCartRequest,
) -> AppResult<ApiResponse<CartSummary>> {
    let quantity = payload.quantity.unwrap_or(1);
    require_quantity(quantity)?;

    let product = state.products.find_by_id(payload.item_id).await?;
    let product = match product {
        Some(p) => p,
        None => return Err(AppError::BadRequest("Product not found".to_string())),
    };

    add_line(state.shop_carts.as_ref(), user.user_id, product.id, quantity).await;
    let summary = summarize(state, user).await?;
    Ok(ApiResponse::success(
        format!("Added {} {} to your cart", quantity, product.name),
        summary,
        None,
    ))
}

pub async fn update_cart(
    state: &AppState,
    user: &AuthUser,
    payload: UpdateCartRequest,
) -> AppResult<ApiResponse<CartSummary>> {
    set_line(
        state.shop_carts.as_ref(),
        user.user_id,
        payload.item_id,
        payload.quantity,
    )
    .await?;
    let summary = summarize(state, user).await?;
    Ok(ApiResponse::success("Cart updated", summary, None))
}

pub async fn remove_from_cart(
    state: &AppState,
    user: &AuthUser,
    item_id: Uuid,
) -> AppResult<ApiResponse<CartSummary>> {
    remove_line(state.shop_carts.as_ref(), user.user_id, item_id).await?;
    let summary = summarize(state, user).await?;
    Ok(ApiResponse::success("Item removed from cart", summary, None))
}

/// Confirm the shop cart and empty it. Nothing is persisted; the returned
/// summary is the receipt.
pub async fn place_order(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<CartSummary>> {
    let cart = state.shop_carts.get(user.user_id).await;
    if cart.is_empty() {
        return Err(AppError::BadRequest("Your cart is empty".into()));
    }

    let products = state.products.all().await?;
    let summary = aggregate(&cart, &products)?;
    if summary.lines.is_empty() {
        return Err(AppError::BadRequest(
            "None of the products in your cart are available any more".into(),
        ));
    }

    state
        .shop_carts
        .update(user.user_id, |current| {
            if *current == cart {
                *current = Cart::default();
            }
        })
        .await;

    tracing::info!(user_id = %user.user_id, total = summary.total, "shop order placed");
    state
        .audit
        .record(
            Some(user.user_id),
            "shop_order",
            "products",
            serde_json::json!({ "total": summary.total, "lines": summary.lines.len() }),
        )
        .await;

    Ok(ApiResponse::success(
        "Order placed successfully! Thank you for shopping with us.",
        summary,
        Some(Meta::empty()),
    ))
}

/// Canned support reply, sent after the configured delay.
pub async fn chat(state: &AppState, payload: ChatRequest) -> ChatReply {
    tracing::debug!(length = payload.message.len(), "chat message received");
    if !state.config.chatbot_delay.is_zero() {
        tokio::time::sleep(state.config.chatbot_delay).await;
    }
    ChatReply {
        message: CHAT_REPLY.to_string(),
        timestamp: Local::now().format("%H:%M %p").to_string(),
    }
}

async fn summarize(state: &AppState, user: &AuthUser) -> AppResult<CartSummary> {
    let cart = state.shop_carts.get(user.user_id).await;
    if cart.is_empty() {
        return Ok(aggregate::<Product>(&cart, &[])?);
    }
    let products = state.products.all().await?;
    let summary = aggregate(&cart, &products)?;
    if !summary.orphans.is_empty() {
        tracing::warn!(
            user_id = %user.user_id,
            orphans = summary.orphans.len(),
            "shop cart references deleted products"
        );
    }
    Ok(summary)
}
