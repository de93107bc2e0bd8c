use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    dto::require,
    error::{AppError, AppResult},
    models::{MenuItem, Order, Restaurant},
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct RestaurantRequest {
    pub name: String,
    pub description: String,
    pub address: String,
    pub phone: String,
    pub cuisines: Vec<String>,
    pub image: Option<String>,
    #[serde(default)]
    pub delivery_fee: i64,
    #[serde(default)]
    pub min_order: i64,
}

impl RestaurantRequest {
    pub fn validate(&self) -> AppResult<()> {
        require("name", &self.name)?;
        require("description", &self.description)?;
        require("address", &self.address)?;
        require("phone", &self.phone)?;
        if self.cuisines.iter().all(|c| c.trim().is_empty()) {
            return Err(AppError::BadRequest("cuisines is required".into()));
        }
        if self.delivery_fee < 0 || self.min_order < 0 {
            return Err(AppError::BadRequest(
                "delivery_fee and min_order must not be negative".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SearchQuery {
    pub query: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RestaurantList {
    pub items: Vec<Restaurant>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RestaurantDetail {
    pub restaurant: Restaurant,
    pub menu_items: Vec<MenuItem>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RestaurantDashboard {
    pub restaurant: Restaurant,
    pub orders: Vec<Order>,
    pub menu_items: Vec<MenuItem>,
}
