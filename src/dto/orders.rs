use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    dto::require,
    error::AppResult,
    models::{Order, UserProfile},
    workflow::DroppedLine,
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CheckoutRequest {
    pub address: String,
    pub phone: String,
    pub payment_method: String,
}

impl CheckoutRequest {
    pub fn validate(&self) -> AppResult<()> {
        require("address", &self.address)?;
        require("phone", &self.phone)?;
        require("payment_method", &self.payment_method)
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CheckoutResponse {
    pub orders: Vec<Order>,
    /// Cart lines left out because their menu item no longer exists.
    pub dropped_items: Vec<DroppedLine>,
    pub total: i64,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateOrderStatusRequest {
    pub status: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderView {
    pub order: Order,
    pub restaurant_name: String,
    pub customer: Option<UserProfile>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderList {
    pub items: Vec<OrderView>,
}
