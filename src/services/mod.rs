pub mod admin_service;
pub mod auth_service;
pub mod cart_service;
pub mod menu_service;
pub mod order_service;
pub mod product_service;
pub mod restaurant_service;
pub mod shop_service;
