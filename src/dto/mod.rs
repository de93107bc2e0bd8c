pub mod admin;
pub mod auth;
pub mod cart;
pub mod menu;
pub mod orders;
pub mod products;
pub mod restaurants;
pub mod shop;

use crate::{
    cart::MAX_QUANTITY,
    error::{AppError, AppResult},
};

/// Highest accepted price, in minor units.
pub const MAX_PRICE: i64 = 100_000_000;

/// Reject a blank form field before anything is persisted.
pub(crate) fn require(field: &str, value: &str) -> AppResult<()> {
    if value.trim().is_empty() {
        return Err(AppError::BadRequest(format!("{field} is required")));
    }
    Ok(())
}

pub(crate) fn require_price(field: &str, value: i64) -> AppResult<()> {
    if value <= 0 {
        return Err(AppError::BadRequest(format!("{field} must be greater than 0")));
    }
    if value > MAX_PRICE {
        return Err(AppError::BadRequest(format!(
            "{field} must not exceed {MAX_PRICE}"
        )));
    }
    Ok(())
}

/// Quantities a client may ask for in one add-to-cart request.
pub(crate) fn require_quantity(value: u32) -> AppResult<()> {
    if value == 0 {
        return Err(AppError::BadRequest(
            "quantity must be greater than 0".to_string(),
        ));
    }
    if value > MAX_QUANTITY {
        return Err(AppError::BadRequest(format!(
            "quantity must not exceed {MAX_QUANTITY}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn price_bounds() {
        assert!(require_price("price", 1).is_ok());
        assert!(require_price("price", MAX_PRICE).is_ok());
        assert!(matches!(require_price("price", 0), Err(AppError::BadRequest(_))));
        assert!(matches!(
            require_price("price", MAX_PRICE + 1),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn quantity_bounds() {
        assert!(require_quantity(1).is_ok());
        assert!(require_quantity(MAX_QUANTITY).is_ok());
        assert!(matches!(require_quantity(0), Err(AppError::BadRequest(_))));
        assert!(matches!(
            require_quantity(MAX_QUANTITY + 1),
            Err(AppError::BadRequest(_))
        ));
    }
}
