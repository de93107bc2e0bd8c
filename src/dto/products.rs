use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    dto::{require, require_price},
    error::AppResult,
    models::Product,
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct ProductRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: i64,
    #[serde(default)]
    pub category: String,
    /// Stored upload filename; the placeholder image when absent.
    pub image: Option<String>,
}

impl ProductRequest {
    pub fn validate(&self) -> AppResult<()> {
        require("name", &self.name)?;
        require_price("price", self.price)
    }
}

#[derive(Serialize, ToSchema)]
#[serde(transparent)]
pub struct ProductList {
    #[schema(value_type = Vec<Product>)]
    pub items: Vec<Product>,
}
