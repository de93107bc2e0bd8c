use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    dto::{require, require_price},
    error::AppResult,
    models::{MenuItem, Restaurant},
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct MenuItemRequest {
    pub name: String,
    pub description: String,
    pub price: i64,
    pub category: String,
    pub image: Option<String>,
    #[serde(default)]
    pub is_veg: bool,
    /// Defaults to true.
    pub is_available: Option<bool>,
}

impl MenuItemRequest {
    pub fn validate(&self) -> AppResult<()> {
        require("name", &self.name)?;
        require("description", &self.description)?;
        require("category", &self.category)?;
        require_price("price", self.price)
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MenuCategory {
    pub category: String,
    pub items: Vec<MenuItem>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MenuByCategory {
    pub restaurant: Restaurant,
    pub categories: Vec<MenuCategory>,
}
