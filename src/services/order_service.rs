use std::collections::HashMap;

use chrono::Utc;
use uuid::Uuid;

use crate::{
    cart::{Cart, CartStore},
    dto::orders::{CheckoutRequest, CheckoutResponse, OrderList, OrderView, UpdateOrderStatusRequest},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_restaurant},
    models::{Order, OrderStatus, Restaurant, User, UserProfile},
    response::{ApiResponse, Meta, paginate},
    routes::params::{OrderListQuery, SortOrder},
    services::restaurant_service::owned_restaurant,
    state::AppState,
    workflow::plan_checkout,
};

/// Turn the session cart into one pending order per restaurant.
pub async fn checkout(
    state: &AppState,
    user: &AuthUser,
    payload: CheckoutRequest,
) -> AppResult<ApiResponse<CheckoutResponse>> {
    payload.validate()?;

    let cart = state.menu_carts.get(user.user_id).await;
    if cart.is_empty() {
        return Err(AppError::BadRequest("Your cart is empty".into()));
    }

    let menu = state.menu_items.all().await?;
    let plan = plan_checkout(&cart, &menu)?;
    if plan.orders.is_empty() {
        return Err(AppError::BadRequest(
            "None of the items in your cart are available any more".into(),
        ));
    }
    if !plan.dropped.is_empty() {
        tracing::warn!(
            user_id = %user.user_id,
            dropped = plan.dropped.len(),
            "checkout skipped deleted menu items"
        );
    }

    let now = Utc::now();
    let drafts = plan
        .orders
        .iter()
        .map(|draft| Order {
            id: Uuid::new_v4(),
            user_id: user.user_id,
            restaurant_id: draft.restaurant_id,
            items: draft.items.clone(),
            total: draft.total,
            address: payload.address.trim().to_string(),
            phone: payload.phone.trim().to_string(),
            payment_method: payload.payment_method.trim().to_string(),
            status: OrderStatus::Pending,
            created_at: now,
            updated_at: now,
        })
        .collect();

    // every order is durable before the cart goes away
    let orders = state.orders.append_many(drafts).await?;

    // lines added while checking out stay in the cart
    state
        .menu_carts
        .update(user.user_id, |current| {
            if *current == cart {
                *current = Cart::default();
            }
        })
        .await;

    let order_ids: Vec<Uuid> = orders.iter().map(|o| o.id).collect();
    tracing::info!(user_id = %user.user_id, orders = orders.len(), "checkout complete");
    state
        .audit
        .record(
            Some(user.user_id),
            "checkout",
            "orders",
            serde_json::json!({ "order_ids": order_ids }),
        )
        .await;

    let message = if plan.dropped.is_empty() {
        "Order placed successfully!".to_string()
    } else {
        format!(
            "Order placed; {} item(s) no longer on the menu were left out",
            plan.dropped.len()
        )
    };

    Ok(ApiResponse::success(
        message,
        CheckoutResponse {
            total: plan.total(),
            orders,
            dropped_items: plan.dropped,
        },
        Some(Meta::empty()),
    ))
}

/// The signed-in customer's orders, newest first.
pub async fn list_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    let status = query.status_filter()?;
    let mut orders = state
        .orders
        .find_all_by(|o| o.user_id == user.user_id && status.is_none_or(|s| o.status == s))
        .await?;
    sort_by_created(&mut orders, query.sort_order.unwrap_or(SortOrder::Desc));

    let (page, limit, offset) = query.pagination().normalize();
    let (orders, meta) = paginate(orders, page, limit, offset);

    let restaurants = state.restaurants.all().await?;
    let items = order_views(orders, &restaurants, None);
    Ok(ApiResponse::success("Ok", OrderList { items }, Some(meta)))
}

/// One order, visible to its customer, any admin, or the operator of the
/// restaurant it was placed with.
pub async fn get_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderView>> {
    let order = state.orders.find_by_id(id).await?;
    let order = match order {
        Some(o) => o,
        None => return Err(AppError::NotFound),
    };

    if !can_view(state, user, &order).await? {
        return Err(AppError::Forbidden);
    }

    let restaurants = state.restaurants.all().await?;
    let users = state.users.all().await?;
    let view = order_views(vec![order], &restaurants, Some(&users)).remove(0);
    Ok(ApiResponse::success("OK", view, Some(Meta::empty())))
}

async fn can_view(state: &AppState, user: &AuthUser, order: &Order) -> AppResult<bool> {
    if order.user_id == user.user_id || user.is_admin() {
        return Ok(true);
    }
    if user.is_restaurant() {
        let owns = state
            .restaurants
            .find_one_by(|r| r.owner_id == user.user_id && r.id == order.restaurant_id)
            .await?;
        return Ok(owns.is_some());
    }
    Ok(false)
}

/// Move an order to another status. Only the operator of the order's
/// restaurant may do this, and only to one of the six known statuses.
pub async fn update_order_status(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateOrderStatusRequest,
) -> AppResult<ApiResponse<Order>> {
    ensure_restaurant(user)?;
    let restaurant = owned_restaurant(state, user).await?;
    let status: OrderStatus = payload
        .status
        .parse()
        .map_err(|_| AppError::BadRequest("Invalid status".into()))?;
    let policy = state.config.transition_policy;

    let mut previous = None;
    let order = state
        .orders
        .update(id, |order| {
            if order.restaurant_id != restaurant.id {
                return Err(AppError::Forbidden);
            }
            if !policy.allows(order.status, status) {
                return Err(AppError::BadRequest(format!(
                    "Cannot move order from {} to {}",
                    order.status, status
                )));
            }
            previous = Some(order.status);
            order.status = status;
            order.updated_at = Utc::now();
            Ok(())
        })
        .await?;

    tracing::info!(order_id = %order.id, from = ?previous, to = %status, "order status updated");
    state
        .audit
        .record(
            Some(user.user_id),
            "order_status_update",
            "orders",
            serde_json::json!({ "order_id": order.id, "status": order.status }),
        )
        .await;

    Ok(ApiResponse::success(
        "Order status updated successfully!",
        order,
        Some(Meta::empty()),
    ))
}

pub(crate) fn sort_by_created(orders: &mut [Order], sort_order: SortOrder) {
    match sort_order {
        SortOrder::Asc => orders.sort_by(|a, b| a.created_at.cmp(&b.created_at)),
        SortOrder::Desc => orders.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
    }
}

/// Attach restaurant names, and customer profiles when `users` is given.
pub(crate) fn order_views(
    orders: Vec<Order>,
    restaurants: &[Restaurant],
    users: Option<&[User]>,
) -> Vec<OrderView> {
    let restaurant_names: HashMap<Uuid, &str> = restaurants
        .iter()
        .map(|r| (r.id, r.name.as_str()))
        .collect();
    let customers: HashMap<Uuid, &User> = users
        .unwrap_or_default()
        .iter()
        .map(|u| (u.id, u))
        .collect();

    orders
        .into_iter()
        .map(|order| OrderView {
            restaurant_name: restaurant_names
                .get(&order.restaurant_id)
                .copied()
                .unwrap_or("Unknown Restaurant")
                .to_string(),
            customer: customers
                .get(&order.user_id)
                .map(|u| UserProfile::from((*u).clone())),
            order,
        })
        .collect()
}
