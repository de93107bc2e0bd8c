use uuid::Uuid;

use crate::{
    dto::{
        admin::{DashboardStats, RestaurantOwnerList, RestaurantWithOwner, UserList},
        orders::{OrderList, OrderView},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::{Order, OrderStatus, User, UserProfile},
    response::{ApiResponse, Meta, paginate},
    routes::params::{OrderListQuery, SortOrder},
    services::order_service::{order_views, sort_by_created},
    state::AppState,
};

const RECENT_ORDERS: usize = 10;

pub async fn dashboard(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<DashboardStats>> {
    ensure_admin(user)?;
    let users = state.users.all().await?;
    let restaurants = state.restaurants.all().await?;
    let mut orders = state.orders.all().await?;
    sort_by_created(&mut orders, SortOrder::Desc);

    let stats = DashboardStats {
        user_count: customer_count(&users),
        restaurant_count: restaurants.len(),
        order_count: orders.len(),
        total_revenue: revenue(&orders),
        recent_orders: order_views(
            orders.into_iter().take(RECENT_ORDERS).collect(),
            &restaurants,
            Some(&users),
        ),
    };
    Ok(ApiResponse::success("Dashboard", stats, Some(Meta::empty())))
}

fn customer_count(users: &[User]) -> usize {
    users
        .iter()
        .filter(|u| !u.is_admin && !u.is_restaurant)
        .count()
}

/// Revenue counts delivered orders only. It saturates rather than wrapping
/// when the ledger holds hand-edited totals.
fn revenue(orders: &[Order]) -> i64 {
    orders
        .iter()
        .filter(|o| o.status == OrderStatus::Delivered)
        .fold(0_i64, |sum, o| sum.saturating_add(o.total))
}

pub async fn list_users(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<UserList>> {
    ensure_admin(user)?;
    let items: Vec<UserProfile> = state
        .users
        .all()
        .await?
        .into_iter()
        .map(UserProfile::from)
        .collect();
    let meta = Meta::total(items.len());
    Ok(ApiResponse::success("Users", UserList { items }, Some(meta)))
}

pub async fn list_restaurants(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<RestaurantOwnerList>> {
    ensure_admin(user)?;
    let users = state.users.all().await?;
    let items: Vec<RestaurantWithOwner> = state
        .restaurants
        .all()
        .await?
        .into_iter()
        .map(|restaurant| RestaurantWithOwner {
            owner_name: users
                .iter()
                .find(|u| u.id == restaurant.owner_id)
                .map(|u| u.name.clone())
                .unwrap_or_else(|| "Unknown".to_string()),
            restaurant,
        })
        .collect();
    let meta = Meta::total(items.len());
    Ok(ApiResponse::success(
        "Restaurants",
        RestaurantOwnerList { items },
        Some(meta),
    ))
}

pub async fn list_all_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    ensure_admin(user)?;
    let status = query.status_filter()?;
    let mut orders = state
        .orders
        .find_all_by(|o| status.is_none_or(|s| o.status == s))
        .await?;
    sort_by_created(&mut orders, query.sort_order.unwrap_or(SortOrder::Desc));

    let (page, limit, offset) = query.pagination().normalize();
    let (orders, meta) = paginate(orders, page, limit, offset);

    let restaurants = state.restaurants.all().await?;
    let users = state.users.all().await?;
    let items = order_views(orders, &restaurants, Some(&users));
    Ok(ApiResponse::success("Orders", OrderList { items }, Some(meta)))
}

pub async fn get_order_admin(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderView>> {
    ensure_admin(user)?;
    let order = state.orders.find_by_id(id).await?;
    let order = match order {
        Some(o) => o,
        None => return Err(AppError::NotFound),
    };

    let restaurants = state.restaurants.all().await?;
    let users = state.users.all().await?;
    let view = order_views(vec![order], &restaurants, Some(&users)).remove(0);
    Ok(ApiResponse::success("Order found", view, Some(Meta::empty())))
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn order(total: i64, status: OrderStatus) -> Order {
        Order {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            restaurant_id: Uuid::new_v4(),
            items: Vec::new(),
            total,
            address: "1 Main St".into(),
            phone: "555".into(),
            payment_method: "cash".into(),
            status,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn user(is_admin: bool, is_restaurant: bool) -> User {
        User {
            id: Uuid::new_v4(),
            name: "someone".into(),
            email: format!("{}@example.com", Uuid::new_v4()),
            password_hash: String::new(),
            is_admin,
            is_restaurant,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn revenue_counts_only_delivered_orders() {
        let orders = vec![
            order(1000, OrderStatus::Delivered),
            order(500, OrderStatus::Pending),
            order(250, OrderStatus::Delivered),
            order(700, OrderStatus::Cancelled),
        ];
        assert_eq!(revenue(&orders), 1250);
    }

    #[test]
    fn revenue_saturates_instead_of_wrapping() {
        let orders = vec![
            order(i64::MAX, OrderStatus::Delivered),
            order(1, OrderStatus::Delivered),
        ];
        assert_eq!(revenue(&orders), i64::MAX);
    }

    #[test]
    fn customer_count_excludes_staff() {
        let users = vec![user(false, false), user(true, false), user(false, true), user(false, false)];
        assert_eq!(customer_count(&users), 2);
    }
}
