use uuid::Uuid;

use crate::{
    cart::{CartStore, CartSummary, MAX_QUANTITY, aggregate},
    dto::{
        cart::{AddToCartRequest, UpdateCartRequest},
        require_quantity,
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::MenuItem,
    response::{ApiResponse, Meta},
    state::AppState,
};

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

    let item = state.menu_items.find_by_id(payload.item_id).await?;
    let item = match item {
        Some(i) => i,
        None => return Err(AppError::BadRequest("item not found".to_string())),
    };
    if !item.is_available {
        return Err(AppError::BadRequest(format!("{} is not available", item.name)));
    }

    add_line(state.menu_carts.as_ref(), user.user_id, item.id, quantity).await;
    tracing::debug!(user_id = %user.user_id, item_id = %item.id, quantity, "added to cart");

    let summary = summarize(state, user).await?;
    Ok(ApiResponse::success(
        format!("Added {} {} to your cart", quantity, item.name),
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
        state.menu_carts.as_ref(),
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
    remove_line(state.menu_carts.as_ref(), user.user_id, item_id).await?;
    let summary = summarize(state, user).await?;
    Ok(ApiResponse::success("Item removed from cart", summary, None))
}

async fn summarize(state: &AppState, user: &AuthUser) -> AppResult<CartSummary> {
    let cart = state.menu_carts.get(user.user_id).await;
    if cart.is_empty() {
        return Ok(aggregate::<MenuItem>(&cart, &[])?);
    }
    let menu = state.menu_items.all().await?;
    let restaurants = state.restaurants.all().await?;
    let summary = aggregate(&cart, &menu)?.with_restaurant_names(&restaurants);
    if !summary.orphans.is_empty() {
        tracing::warn!(
            user_id = %user.user_id,
            orphans = summary.orphans.len(),
            "cart references deleted menu items"
        );
    }
    Ok(summary)
}

pub(crate) async fn add_line<S: CartStore>(carts: &S, session: Uuid, item_id: Uuid, quantity: u32) {
    carts.update(session, |cart| cart.add(item_id, quantity)).await;
}

/// Change the quantity of a line already in the cart; zero or less drops it.
/// Dropping a line that is not there succeeds and changes nothing.
pub(crate) async fn set_line<S: CartStore>(
    carts: &S,
    session: Uuid,
    item_id: Uuid,
    quantity: i64,
) -> AppResult<()> {
    if quantity > i64::from(MAX_QUANTITY) {
        return Err(AppError::BadRequest(format!(
            "quantity must not exceed {MAX_QUANTITY}"
        )));
    }
    let mut present = false;
    carts
        .update(session, |cart| {
            present = cart.quantity_of(item_id).is_some();
            if present {
                cart.set_quantity(item_id, quantity);
            }
        })
        .await;
    if !present && quantity > 0 {
        return Err(AppError::NotFound);
    }
    Ok(())
}

pub(crate) async fn remove_line<S: CartStore>(carts: &S, session: Uuid, item_id: Uuid) -> AppResult<()> {
    let mut removed = false;
    carts
        .update(session, |cart| removed = cart.remove(item_id))
        .await;
    if !removed {
        return Err(AppError::NotFound);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cart::MemoryCartStore;

    #[tokio::test]
    async fn zeroing_a_missing_line_is_a_no_op() -> anyhow::Result<()> {
        let carts = MemoryCartStore::default();
        let session = Uuid::new_v4();
        let kept = Uuid::new_v4();
        add_line(&carts, session, kept, 2).await;

        set_line(&carts, session, Uuid::new_v4(), 0).await?;
        set_line(&carts, session, Uuid::new_v4(), -3).await?;
        assert_eq!(carts.get(session).await.quantity_of(kept), Some(2));

        let missing = set_line(&carts, session, Uuid::new_v4(), 4).await;
        assert!(matches!(missing, Err(AppError::NotFound)));
        Ok(())
    }

    #[tokio::test]
    async fn oversized_quantity_is_rejected_untouched() -> anyhow::Result<()> {
        let carts = MemoryCartStore::default();
        let session = Uuid::new_v4();
        let item = Uuid::new_v4();
        add_line(&carts, session, item, 2).await;

        let result = set_line(&carts, session, item, i64::MAX).await;
        assert!(matches!(result, Err(AppError::BadRequest(_))));
        assert_eq!(carts.get(session).await.quantity_of(item), Some(2));
        Ok(())
    }
}
