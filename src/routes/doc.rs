use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    cart::{CartLine, CartLineView, CartSummary},
    dto::{
        admin::{DashboardStats, RestaurantOwnerList, RestaurantWithOwner, UserList},
        auth::{LoginRequest, LoginResponse, RegisterRequest, UserType},
        cart::{AddToCartRequest, UpdateCartRequest},
        menu::{MenuByCategory, MenuCategory, MenuItemRequest},
        orders::{CheckoutRequest, CheckoutResponse, OrderList, OrderView, UpdateOrderStatusRequest},
        products::{ProductList, ProductRequest},
        restaurants::{RestaurantDashboard, RestaurantDetail, RestaurantList, RestaurantRequest},
        shop::{ChatReply, ChatRequest},
    },
    models::{MenuItem, Order, OrderLine, OrderStatus, Product, Restaurant, UserProfile},
    response::{ApiResponse, Meta},
    routes::{admin, auth, cart, health, orders, params, portal, products, restaurants, shop},
    workflow::DroppedLine,
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::register,
        auth::login,
        auth::me,
        restaurants::list_restaurants,
        restaurants::search_restaurants,
        restaurants::get_restaurant,
        cart::cart_list,
        cart::add_to_cart,
        cart::update_cart,
        cart::remove_from_cart,
        orders::list_order,
        orders::checkout,
        orders::get_order,
        portal::dashboard,
        portal::create_restaurant,
        portal::edit_restaurant,
        portal::menu,
        portal::add_menu_item,
        portal::edit_menu_item,
        portal::delete_menu_item,
        portal::list_orders,
        portal::get_order,
        portal::update_order_status,
        admin::dashboard,
        admin::list_users,
        admin::list_restaurants,
        admin::list_all_orders,
        admin::get_order_admin,
        products::list_products,
        products::get_product,
        products::create_product,
        products::update_product,
        products::delete_product,
        shop::view_cart,
        shop::add_to_cart,
        shop::update_cart,
        shop::remove_from_cart,
        shop::place_order,
        shop::chatbot
    ),
    components(
        schemas(
            UserProfile,
            UserType,
            Restaurant,
            MenuItem,
            Product,
            Order,
            OrderLine,
            OrderStatus,
            CartLine,
            CartLineView,
            CartSummary,
            DroppedLine,
            RegisterRequest,
            LoginRequest,
            LoginResponse,
            AddToCartRequest,
            UpdateCartRequest,
            CheckoutRequest,
            CheckoutResponse,
            UpdateOrderStatusRequest,
            OrderView,
            OrderList,
            RestaurantRequest,
            RestaurantList,
            RestaurantDetail,
            RestaurantDashboard,
            MenuItemRequest,
            MenuCategory,
            MenuByCategory,
            ProductRequest,
            ProductList,
            DashboardStats,
            UserList,
            RestaurantWithOwner,
            RestaurantOwnerList,
            ChatRequest,
            ChatReply,
            params::Pagination,
            params::ProductQuery,
            params::OrderListQuery,
            Meta,
            ApiResponse<Product>,
            ApiResponse<ProductList>,
            ApiResponse<CartSummary>,
            ApiResponse<OrderList>,
            ApiResponse<OrderView>,
            ApiResponse<CheckoutResponse>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Registration, login and session"),
        (name = "Restaurants", description = "Public restaurant browsing and search"),
        (name = "Cart", description = "Marketplace cart"),
        (name = "Orders", description = "Checkout and customer orders"),
        (name = "Portal", description = "Restaurant operator endpoints"),
        (name = "Admin", description = "Admin endpoints"),
        (name = "Products", description = "Snack shop catalog"),
        (name = "Shop", description = "Snack shop cart, ordering and chat"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
