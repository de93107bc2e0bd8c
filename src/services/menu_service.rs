use chrono::Utc;
use uuid::Uuid;

use crate::{
    dto::menu::{MenuByCategory, MenuCategory, MenuItemRequest},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_restaurant},
    models::MenuItem,
    response::{ApiResponse, Meta},
    services::restaurant_service::owned_restaurant,
    state::AppState,
    uploads,
};

pub async fn menu_by_category(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<MenuByCategory>> {
    ensure_restaurant(user)?;
    let restaurant = owned_restaurant(state, user).await?;
    let items = state
        .menu_items
        .find_all_by(|m| m.restaurant_id == restaurant.id)
        .await?;

    Ok(ApiResponse::success(
        "Menu",
        MenuByCategory {
            restaurant,
            categories: group_by_category(items),
        },
        Some(Meta::empty()),
    ))
}

pub async fn add_menu_item(
    state: &AppState,
    user: &AuthUser,
    payload: MenuItemRequest,
) -> AppResult<ApiResponse<MenuItem>> {
    ensure_restaurant(user)?;
    payload.validate()?;
    let restaurant = owned_restaurant(state, user).await?;

    let item = state
        .menu_items
        .append(MenuItem {
            id: Uuid::new_v4(),
            restaurant_id: restaurant.id,
            name: payload.name.trim().to_string(),
            description: payload.description.trim().to_string(),
            price: payload.price,
            category: payload.category.trim().to_string(),
            image: payload.image.filter(|i| !i.trim().is_empty()),
            is_veg: payload.is_veg,
            is_available: payload.is_available.unwrap_or(true),
            created_at: Utc::now(),
        })
        .await?;

    state
        .audit
        .record(
            Some(user.user_id),
            "menu_item_create",
            "menu_items",
            serde_json::json!({ "item_id": item.id, "restaurant_id": restaurant.id }),
        )
        .await;

    Ok(ApiResponse::success(
        "Menu item added successfully!",
        item,
        Some(Meta::empty()),
    ))
}

pub async fn edit_menu_item(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: MenuItemRequest,
) -> AppResult<ApiResponse<MenuItem>> {
    ensure_restaurant(user)?;
    payload.validate()?;
    let restaurant = owned_restaurant(state, user).await?;

    let new_image = payload.image.filter(|i| !i.trim().is_empty());
    let mut replaced_image = None;
    let item = state
        .menu_items
        .update(id, |item| {
            if item.restaurant_id != restaurant.id {
                return Err(AppError::Forbidden);
            }
            item.name = payload.name.trim().to_string();
            item.description = payload.description.trim().to_string();
            item.price = payload.price;
            item.category = payload.category.trim().to_string();
            item.is_veg = payload.is_veg;
            item.is_available = payload.is_available.unwrap_or(item.is_available);
            if let Some(image) = new_image {
                if item.image.as_ref() != Some(&image) {
                    replaced_image = item.image.replace(image);
                }
            }
            Ok(())
        })
        .await?;

    if let Some(old) = replaced_image {
        uploads::remove_image(&state.config.upload_dir, &old).await;
    }

    state
        .audit
        .record(
            Some(user.user_id),
            "menu_item_update",
            "menu_items",
            serde_json::json!({ "item_id": item.id }),
        )
        .await;

    Ok(ApiResponse::success(
        "Menu item updated successfully!",
        item,
        Some(Meta::empty()),
    ))
}

/// Delete one of the operator's dishes. Carts still holding it keep an
/// orphan line; past orders keep their snapshot.
pub async fn delete_menu_item(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_restaurant(user)?;
    let restaurant = owned_restaurant(state, user).await?;

    let item = state.menu_items.find_by_id(id).await?;
    let item = match item {
        Some(i) => i,
        None => return Err(AppError::NotFound),
    };
    if item.restaurant_id != restaurant.id {
        return Err(AppError::Forbidden);
    }

    let removed = state.menu_items.remove(id).await?;
    let cleanup = match &removed.image {
        Some(image) => Some(uploads::remove_image(&state.config.upload_dir, image).await),
        None => None,
    };

    state
        .audit
        .record(
            Some(user.user_id),
            "menu_item_delete",
            "menu_items",
            serde_json::json!({ "item_id": id, "image_cleanup": cleanup.map(|c| format!("{c:?}")) }),
        )
        .await;

    Ok(ApiResponse::success(
        "Menu item deleted successfully!",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

/// Group dishes by category in order of first appearance; a blank
/// category reads "Uncategorized".
pub(crate) fn group_by_category(items: Vec<MenuItem>) -> Vec<MenuCategory> {
    let mut categories: Vec<MenuCategory> = Vec::new();
    for item in items {
        let category = if item.category.trim().is_empty() {
            "Uncategorized".to_string()
        } else {
            item.category.clone()
        };
        match categories.iter_mut().find(|c| c.category == category) {
            Some(group) => group.items.push(item),
            None => categories.push(MenuCategory {
                category,
                items: vec![item],
            }),
        }
    }
    categories
}
