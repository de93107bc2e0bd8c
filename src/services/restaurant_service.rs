use chrono::Utc;
use uuid::Uuid;

use crate::{
    dto::{
        orders::{OrderList, OrderView},
        restaurants::{RestaurantDashboard, RestaurantDetail, RestaurantList, RestaurantRequest},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_restaurant},
    models::{MenuItem, Restaurant},
    response::{ApiResponse, Meta, paginate},
    routes::params::{OrderListQuery, SortOrder},
    services::order_service::{order_views, sort_by_created},
    state::AppState,
    uploads,
};

/// The restaurant operated by the signed-in user.
pub async fn owned_restaurant(state: &AppState, user: &AuthUser) -> AppResult<Restaurant> {
    let restaurant = state
        .restaurants
        .find_one_by(|r| r.owner_id == user.user_id)
        .await?;
    match restaurant {
        Some(r) => Ok(r),
        None => Err(AppError::NotFound),
    }
}

pub async fn list_restaurants(state: &AppState) -> AppResult<ApiResponse<RestaurantList>> {
    let items = state.restaurants.all().await?;
    let meta = Meta::total(items.len());
    Ok(ApiResponse::success("Restaurants", RestaurantList { items }, Some(meta)))
}

pub async fn restaurant_detail(state: &AppState, id: Uuid) -> AppResult<ApiResponse<RestaurantDetail>> {
    let restaurant = state.restaurants.find_by_id(id).await?;
    let restaurant = match restaurant {
        Some(r) => r,
        None => return Err(AppError::NotFound),
    };
    let menu_items = state.menu_items.find_all_by(|m| m.restaurant_id == id).await?;

    Ok(ApiResponse::success(
        "Restaurant",
        RestaurantDetail {
            restaurant,
            menu_items,
        },
        None,
    ))
}

/// Restaurants whose name or a cuisine matches, then restaurants serving a
/// dish whose name matches. Case-insensitive, no duplicates.
pub async fn search(state: &AppState, query: &str) -> AppResult<ApiResponse<RestaurantList>> {
    let restaurants = state.restaurants.all().await?;
    let menu_items = state.menu_items.all().await?;
    let items = search_restaurants(&restaurants, &menu_items, query);
    let meta = Meta::total(items.len());
    Ok(ApiResponse::success("Search results", RestaurantList { items }, Some(meta)))
}

pub(crate) fn search_restaurants(
    restaurants: &[Restaurant],
    menu_items: &[MenuItem],
    query: &str,
) -> Vec<Restaurant> {
    let needle = query.trim().to_lowercase();

    let mut found: Vec<Restaurant> = restaurants
        .iter()
        .filter(|r| {
            r.name.to_lowercase().contains(&needle)
                || r.cuisines.iter().any(|c| c.to_lowercase().contains(&needle))
        })
        .cloned()
        .collect();

    for item in menu_items
        .iter()
        .filter(|m| m.name.to_lowercase().contains(&needle))
    {
        if found.iter().any(|r| r.id == item.restaurant_id) {
            continue;
        }
        if let Some(r) = restaurants.iter().find(|r| r.id == item.restaurant_id) {
            found.push(r.clone());
        }
    }
    found
}

pub async fn dashboard(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<RestaurantDashboard>> {
    ensure_restaurant(user)?;
    let restaurant = owned_restaurant(state, user).await?;
    let mut orders = state
        .orders
        .find_all_by(|o| o.restaurant_id == restaurant.id)
        .await?;
    sort_by_created(&mut orders, SortOrder::Desc);
    let menu_items = state
        .menu_items
        .find_all_by(|m| m.restaurant_id == restaurant.id)
        .await?;

    Ok(ApiResponse::success(
        "Dashboard",
        RestaurantDashboard {
            restaurant,
            orders,
            menu_items,
        },
        Some(Meta::empty()),
    ))
}

/// Open the operator's restaurant. An operator has at most one.
pub async fn create_restaurant(
    state: &AppState,
    user: &AuthUser,
    payload: RestaurantRequest,
) -> AppResult<ApiResponse<Restaurant>> {
    ensure_restaurant(user)?;
    payload.validate()?;

    let restaurant = Restaurant {
        id: Uuid::new_v4(),
        owner_id: user.user_id,
        name: payload.name.trim().to_string(),
        description: payload.description.trim().to_string(),
        address: payload.address.trim().to_string(),
        phone: payload.phone.trim().to_string(),
        cuisines: clean_cuisines(payload.cuisines),
        image: payload.image.filter(|i| !i.trim().is_empty()),
        delivery_fee: payload.delivery_fee,
        min_order: payload.min_order,
        rating: 0.0,
        review_count: 0,
        created_at: Utc::now(),
    };

    let owner_id = user.user_id;
    let restaurant = state
        .restaurants
        .append_checked(restaurant, |existing| {
            if existing.iter().any(|r| r.owner_id == owner_id) {
                return Err(AppError::BadRequest("You already have a restaurant".into()));
            }
            Ok(())
        })
        .await?;

    tracing::info!(restaurant_id = %restaurant.id, owner_id = %owner_id, "restaurant created");
    state
        .audit
        .record(
            Some(user.user_id),
            "restaurant_create",
            "restaurants",
            serde_json::json!({ "restaurant_id": restaurant.id }),
        )
        .await;

    Ok(ApiResponse::success(
        "Restaurant created successfully!",
        restaurant,
        Some(Meta::empty()),
    ))
}

pub async fn edit_restaurant(
    state: &AppState,
    user: &AuthUser,
    payload: RestaurantRequest,
) -> AppResult<ApiResponse<Restaurant>> {
    ensure_restaurant(user)?;
    payload.validate()?;
    let existing = owned_restaurant(state, user).await?;

    let new_image = payload.image.filter(|i| !i.trim().is_empty());
    let replaced_image = match (&existing.image, &new_image) {
        (Some(old), Some(new)) if old != new => Some(old.clone()),
        _ => None,
    };

    let restaurant = state
        .restaurants
        .update(existing.id, |r| {
            r.name = payload.name.trim().to_string();
            r.description = payload.description.trim().to_string();
            r.address = payload.address.trim().to_string();
            r.phone = payload.phone.trim().to_string();
            r.cuisines = clean_cuisines(payload.cuisines);
            if new_image.is_some() {
                r.image = new_image;
            }
            r.delivery_fee = payload.delivery_fee;
            r.min_order = payload.min_order;
            Ok::<(), AppError>(())
        })
        .await?;

    if let Some(old) = replaced_image {
        uploads::remove_image(&state.config.upload_dir, &old).await;
    }

    state
        .audit
        .record(
            Some(user.user_id),
            "restaurant_update",
            "restaurants",
            serde_json::json!({ "restaurant_id": restaurant.id }),
        )
        .await;

    Ok(ApiResponse::success(
        "Restaurant updated successfully!",
        restaurant,
        Some(Meta::empty()),
    ))
}

pub async fn restaurant_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    ensure_restaurant(user)?;
    let restaurant = owned_restaurant(state, user).await?;
    let status = query.status_filter()?;

    let mut orders = state
        .orders
        .find_all_by(|o| o.restaurant_id == restaurant.id && status.is_none_or(|s| o.status == s))
        .await?;
    sort_by_created(&mut orders, query.sort_order.unwrap_or(SortOrder::Desc));

    let (page, limit, offset) = query.pagination().normalize();
    let (orders, meta) = paginate(orders, page, limit, offset);
    let users = state.users.all().await?;
    let items = order_views(orders, std::slice::from_ref(&restaurant), Some(&users));
    Ok(ApiResponse::success("Orders", OrderList { items }, Some(meta)))
}

pub async fn restaurant_order_detail(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderView>> {
    ensure_restaurant(user)?;
    let restaurant = owned_restaurant(state, user).await?;
    let order = state.orders.find_by_id(id).await?;
    let order = match order {
        Some(o) => o,
        None => return Err(AppError::NotFound),
    };
    if order.restaurant_id != restaurant.id {
        return Err(AppError::Forbidden);
    }

    let users = state.users.all().await?;
    let view = order_views(vec![order], std::slice::from_ref(&restaurant), Some(&users)).remove(0);
    Ok(ApiResponse::success("OK", view, Some(Meta::empty())))
}

fn clean_cuisines(cuisines: Vec<String>) -> Vec<String> {
    cuisines
        .into_iter()
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn restaurant(name: &str, cuisines: &[&str]) -> Restaurant {
        Restaurant {
            id: Uuid::new_v4(),
            owner_id: Uuid::new_v4(),
            name: name.into(),
            description: "".into(),
            address: "".into(),
            phone: "".into(),
            cuisines: cuisines.iter().map(|c| c.to_string()).collect(),
            image: None,
            delivery_fee: 0,
            min_order: 0,
            rating: 0.0,
            review_count: 0,
            created_at: Utc::now(),
        }
    }

    fn dish(restaurant_id: Uuid, name: &str) -> MenuItem {
        MenuItem {
            id: Uuid::new_v4(),
            restaurant_id,
            name: name.into(),
            description: "".into(),
            price: 100,
            category: "Mains".into(),
            image: None,
            is_veg: false,
            is_available: true,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn search_matches_name_cuisine_and_dishes_once() {
        let thai = restaurant("Bangkok Kitchen", &["Thai"]);
        let pizza = restaurant("Luigi's", &["Italian", "Pizza"]);
        let diner = restaurant("Main Street Diner", &["American"]);
        let restaurants = vec![thai.clone(), pizza.clone(), diner.clone()];
        let menu = vec![
            dish(diner.id, "Pizza Burger"),
            dish(pizza.id, "Margherita Pizza"),
        ];

        let found = search_restaurants(&restaurants, &menu, "PIZZA");
        let ids: Vec<Uuid> = found.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![pizza.id, diner.id]);

        let found = search_restaurants(&restaurants, &menu, "thai");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, thai.id);
    }

    #[test]
    fn cuisines_are_trimmed_and_blank_dropped() {
        let cleaned = clean_cuisines(vec![" Thai ".into(), "".into(), "Vegan".into()]);
        assert_eq!(cleaned, vec!["Thai".to_string(), "Vegan".to_string()]);
    }
}
