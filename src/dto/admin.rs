use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    dto::orders::OrderView,
    models::{Restaurant, UserProfile},
};

#[derive(Debug, Serialize, ToSchema)]
pub struct DashboardStats {
    /// Users that are neither admins nor restaurant operators.
    pub user_count: usize,
    pub restaurant_count: usize,
    pub order_count: usize,
    /// Sum of delivered order totals.
    pub total_revenue: i64,
    pub recent_orders: Vec<OrderView>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UserList {
    pub items: Vec<UserProfile>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RestaurantWithOwner {
    pub restaurant: Restaurant,
    pub owner_name: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RestaurantOwnerList {
    pub items: Vec<RestaurantWithOwner>,
}
