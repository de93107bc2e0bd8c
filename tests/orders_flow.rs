use storefront_api::{
    config::AppConfig,
    dto::{
        auth::{LoginRequest, RegisterRequest, UserType},
        cart::AddToCartRequest,
        menu::MenuItemRequest,
        orders::{CheckoutRequest, UpdateOrderStatusRequest},
        products::ProductRequest,
        restaurants::RestaurantRequest,
    },
    error::AppError,
    middleware::auth::{AuthUser, decode_token},
    models::{MenuItem, OrderStatus, Restaurant, User},
    routes::params::OrderListQuery,
    services::{
        admin_service, auth_service, cart_service, menu_service, order_service, product_service,
        restaurant_service, shop_service,
    },
    state::AppState,
    workflow::TransitionPolicy,
};
use tempfile::TempDir;

async fn setup() -> anyhow::Result<(TempDir, AppState)> {
    let dir = tempfile::tempdir()?;
    let state = AppState::open(AppConfig::for_data_dir(dir.path(), "test-secret")).await?;
    Ok((dir, state))
}

async fn create_user(
    state: &AppState,
    name: &str,
    is_admin: bool,
    is_restaurant: bool,
) -> anyhow::Result<(User, AuthUser)> {
    let email = format!("{}@example.com", name.to_lowercase().replace(' ', "."));
    let user = auth_service::create_user(state, name, &email, "secret123", is_admin, is_restaurant).await?;
    let session = AuthUser {
        user_id: user.id,
        name: user.name.clone(),
        is_admin,
        is_restaurant,
    };
    Ok((user, session))
}

fn restaurant_request(name: &str) -> RestaurantRequest {
    RestaurantRequest {
        name: name.into(),
        description: format!("{name} serves food"),
        address: "1 High Street".into(),
        phone: "555-0100".into(),
        cuisines: vec!["Fusion".into()],
        image: None,
        delivery_fee: 0,
        min_order: 0,
    }
}

fn dish(name: &str, price: i64) -> MenuItemRequest {
    MenuItemRequest {
        name: name.into(),
        description: format!("{name}, freshly made"),
        price,
        category: "Mains".into(),
        image: None,
        is_veg: false,
        is_available: None,
    }
}

async fn open_restaurant(
    state: &AppState,
    operator: &AuthUser,
    name: &str,
    price: i64,
) -> anyhow::Result<(Restaurant, MenuItem)> {
    let restaurant = restaurant_service::create_restaurant(state, operator, restaurant_request(name))
        .await?
        .data
        .expect("restaurant");
    let item = menu_service::add_menu_item(state, operator, dish(&format!("{name} special"), price))
        .await?
        .data
        .expect("menu item");
    Ok((restaurant, item))
}

fn add(item_id: uuid::Uuid, quantity: u32) -> AddToCartRequest {
    AddToCartRequest {
        item_id,
        quantity: Some(quantity),
    }
}

fn delivery() -> CheckoutRequest {
    CheckoutRequest {
        address: "22 Baker Street".into(),
        phone: "555-0199".into(),
        payment_method: "cash".into(),
    }
}

fn status(value: &str) -> UpdateOrderStatusRequest {
    UpdateOrderStatusRequest {
        status: value.into(),
    }
}

// Customer fills a cart from two restaurants, checks out, and each operator
// sees only their own order.
#[tokio::test]
async fn checkout_splits_cart_per_restaurant() -> anyhow::Result<()> {
    let (_dir, state) = setup().await?;
    let (_, customer) = create_user(&state, "Customer", false, false).await?;
    let (_, op_a) = create_user(&state, "Operator A", false, true).await?;
    let (_, op_b) = create_user(&state, "Operator B", false, true).await?;

    let (rest_a, item_a) = open_restaurant(&state, &op_a, "Alpha", 1000).await?;
    let (rest_b, item_b) = open_restaurant(&state, &op_b, "Beta", 500).await?;

    cart_service::add_to_cart(&state, &customer, add(item_a.id, 1)).await?;
    cart_service::add_to_cart(&state, &customer, add(item_b.id, 1)).await?;

    let cart = cart_service::view_cart(&state, &customer).await?.data.expect("cart");
    assert_eq!(cart.total, 1500);

    let placed = order_service::checkout(&state, &customer, delivery())
        .await?
        .data
        .expect("checkout");
    assert_eq!(placed.orders.len(), 2);
    assert_eq!(placed.total, 1500);
    assert!(placed.dropped_items.is_empty());

    let order_a = placed
        .orders
        .iter()
        .find(|o| o.restaurant_id == rest_a.id)
        .expect("order for A");
    let order_b = placed
        .orders
        .iter()
        .find(|o| o.restaurant_id == rest_b.id)
        .expect("order for B");
    assert_eq!(order_a.total, 1000);
    assert_eq!(order_b.total, 500);
    assert!(placed.orders.iter().all(|o| o.status == OrderStatus::Pending));

    let cart = cart_service::view_cart(&state, &customer).await?.data.expect("cart");
    assert!(cart.lines.is_empty());
    assert_eq!(cart.total, 0);

    let mine = order_service::list_orders(&state, &customer, OrderListQuery::default())
        .await?
        .data
        .expect("orders");
    assert_eq!(mine.items.len(), 2);

    let for_a = restaurant_service::restaurant_orders(&state, &op_a, OrderListQuery::default())
        .await?
        .data
        .expect("orders");
    assert_eq!(for_a.items.len(), 1);
    assert_eq!(for_a.items[0].order.id, order_a.id);
    assert_eq!(
        for_a.items[0].customer.as_ref().map(|c| c.id),
        Some(customer.user_id)
    );

    let audit = state.audit.entries().await?;
    assert!(audit.iter().any(|e| e.action == "checkout" && e.user_id == Some(customer.user_id)));
    Ok(())
}

#[tokio::test]
async fn only_the_owning_operator_changes_status() -> anyhow::Result<()> {
    let (_dir, state) = setup().await?;
    let (_, customer) = create_user(&state, "Customer", false, false).await?;
    let (_, admin) = create_user(&state, "Admin", true, false).await?;
    let (_, op_a) = create_user(&state, "Operator A", false, true).await?;
    let (_, op_b) = create_user(&state, "Operator B", false, true).await?;

    let (_, item_a) = open_restaurant(&state, &op_a, "Alpha", 1000).await?;
    open_restaurant(&state, &op_b, "Beta", 500).await?;

    cart_service::add_to_cart(&state, &customer, add(item_a.id, 2)).await?;
    let placed = order_service::checkout(&state, &customer, delivery())
        .await?
        .data
        .expect("checkout");
    let order_id = placed.orders[0].id;

    let denied = order_service::update_order_status(&state, &op_b, order_id, status("confirmed")).await;
    assert!(matches!(denied, Err(AppError::Forbidden)));

    let denied = order_service::update_order_status(&state, &customer, order_id, status("confirmed")).await;
    assert!(matches!(denied, Err(AppError::Forbidden)));

    let invalid = order_service::update_order_status(&state, &op_a, order_id, status("shipped")).await;
    assert!(matches!(invalid, Err(AppError::BadRequest(_))));

    let stored = state.orders.find_by_id(order_id).await?.expect("order");
    assert_eq!(stored.status, OrderStatus::Pending);

    let updated = order_service::update_order_status(&state, &op_a, order_id, status("out_for_delivery"))
        .await?
        .data
        .expect("order");
    assert_eq!(updated.status, OrderStatus::OutForDelivery);

    let seen = admin_service::get_order_admin(&state, &admin, order_id)
        .await?
        .data
        .expect("order");
    assert_eq!(seen.order.status, OrderStatus::OutForDelivery);
    assert_eq!(seen.restaurant_name, "Alpha");

    let other_customer_view = order_service::get_order(&state, &op_b, order_id).await;
    assert!(matches!(other_customer_view, Err(AppError::Forbidden)));
    Ok(())
}

#[tokio::test]
async fn linear_policy_rejects_skipping_steps() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let mut config = AppConfig::for_data_dir(dir.path(), "test-secret");
    config.transition_policy = TransitionPolicy::Linear;
    let state = AppState::open(config).await?;

    let (_, customer) = create_user(&state, "Customer", false, false).await?;
    let (_, op) = create_user(&state, "Operator", false, true).await?;
    let (_, item) = open_restaurant(&state, &op, "Alpha", 700).await?;

    cart_service::add_to_cart(&state, &customer, add(item.id, 1)).await?;
    let placed = order_service::checkout(&state, &customer, delivery())
        .await?
        .data
        .expect("checkout");
    let order_id = placed.orders[0].id;

    let skipped = order_service::update_order_status(&state, &op, order_id, status("delivered")).await;
    assert!(matches!(skipped, Err(AppError::BadRequest(_))));

    order_service::update_order_status(&state, &op, order_id, status("confirmed")).await?;
    order_service::update_order_status(&state, &op, order_id, status("cancelled")).await?;

    let reopened = order_service::update_order_status(&state, &op, order_id, status("pending")).await;
    assert!(matches!(reopened, Err(AppError::BadRequest(_))));
    Ok(())
}

#[tokio::test]
async fn deleted_menu_item_becomes_an_orphan_line() -> anyhow::Result<()> {
    let (_dir, state) = setup().await?;
    let (_, customer) = create_user(&state, "Customer", false, false).await?;
    let (_, op) = create_user(&state, "Operator", false, true).await?;

    let (_, kept) = open_restaurant(&state, &op, "Alpha", 400).await?;
    let gone = menu_service::add_menu_item(&state, &op, dish("Seasonal soup", 650))
        .await?
        .data
        .expect("menu item");

    cart_service::add_to_cart(&state, &customer, add(kept.id, 2)).await?;
    cart_service::add_to_cart(&state, &customer, add(gone.id, 1)).await?;
    menu_service::delete_menu_item(&state, &op, gone.id).await?;

    let cart = cart_service::view_cart(&state, &customer).await?.data.expect("cart");
    assert_eq!(cart.lines.len(), 1);
    assert_eq!(cart.total, 800);
    assert_eq!(cart.orphans.len(), 1);
    assert_eq!(cart.orphans[0].item_id, gone.id);

    let placed = order_service::checkout(&state, &customer, delivery())
        .await?
        .data
        .expect("checkout");
    assert_eq!(placed.orders.len(), 1);
    assert_eq!(placed.total, 800);
    assert_eq!(placed.dropped_items.len(), 1);
    Ok(())
}

#[tokio::test]
async fn empty_cart_cannot_check_out() -> anyhow::Result<()> {
    let (_dir, state) = setup().await?;
    let (_, customer) = create_user(&state, "Customer", false, false).await?;

    let result = order_service::checkout(&state, &customer, delivery()).await;
    assert!(matches!(result, Err(AppError::BadRequest(_))));
    assert!(state.orders.all().await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn operator_gets_one_restaurant() -> anyhow::Result<()> {
    let (_dir, state) = setup().await?;
    let (_, op) = create_user(&state, "Operator", false, true).await?;
    let (_, customer) = create_user(&state, "Customer", false, false).await?;

    restaurant_service::create_restaurant(&state, &op, restaurant_request("First")).await?;
    let second = restaurant_service::create_restaurant(&state, &op, restaurant_request("Second")).await;
    assert!(matches!(second, Err(AppError::BadRequest(_))));

    let not_operator = restaurant_service::create_restaurant(&state, &customer, restaurant_request("Nope")).await;
    assert!(matches!(not_operator, Err(AppError::Forbidden)));

    assert_eq!(state.restaurants.all().await?.len(), 1);
    Ok(())
}

#[tokio::test]
async fn register_then_login_yields_a_valid_session() -> anyhow::Result<()> {
    let (_dir, state) = setup().await?;
    auth_service::register_user(
        &state,
        RegisterRequest {
            name: "Rita".into(),
            email: "rita@example.com".into(),
            password: "hunter22".into(),
            confirm_password: "hunter22".into(),
            user_type: UserType::Restaurant,
        },
    )
    .await?;

    let bad = auth_service::login_user(
        &state,
        LoginRequest {
            email: "rita@example.com".into(),
            password: "wrong".into(),
        },
    )
    .await;
    assert!(matches!(bad, Err(AppError::BadRequest(_))));

    let login = auth_service::login_user(
        &state,
        LoginRequest {
            email: "RITA@example.com".into(),
            password: "hunter22".into(),
        },
    )
    .await?
    .data
    .expect("login");
    let token = login.token.strip_prefix("Bearer ").expect("bearer prefix");
    let session = decode_token(token, &state.config.jwt_secret)?;
    assert_eq!(session.user_id, login.user.id);
    assert!(session.is_restaurant());
    assert!(!session.is_admin());
    Ok(())
}

#[tokio::test]
async fn duplicate_email_is_rejected() -> anyhow::Result<()> {
    let (_dir, state) = setup().await?;
    create_user(&state, "Customer", false, false).await?;

    let again = auth_service::create_user(&state, "Other", "CUSTOMER@example.com", "pw", false, false).await;
    assert!(matches!(again, Err(AppError::BadRequest(_))));
    assert_eq!(state.users.all().await?.len(), 1);
    Ok(())
}

#[tokio::test]
async fn shop_cart_totals_and_place_order() -> anyhow::Result<()> {
    let (_dir, state) = setup().await?;
    let (_, admin) = create_user(&state, "Admin", true, false).await?;
    let (_, customer) = create_user(&state, "Customer", false, false).await?;

    let product = product_service::create_product(
        &state,
        &admin,
        ProductRequest {
            name: "Pretzel".into(),
            description: "Salted".into(),
            price: 250,
            category: "Baked".into(),
            image: None,
        },
    )
    .await?
    .data
    .expect("product");
    assert_eq!(product.image, "default.jpg");

    let denied = product_service::create_product(
        &state,
        &customer,
        ProductRequest {
            name: "Contraband".into(),
            description: String::new(),
            price: 100,
            category: String::new(),
            image: None,
        },
    )
    .await;
    assert!(matches!(denied, Err(AppError::Forbidden)));

    let cart = shop_service::add_to_cart(&state, &customer, add(product.id, 3))
        .await?
        .data
        .expect("cart");
    assert_eq!(cart.lines.len(), 1);
    assert_eq!(cart.lines[0].line_total, 750);
    assert_eq!(cart.total, 750);

    // the marketplace cart is separate
    let menu_cart = cart_service::view_cart(&state, &customer).await?.data.expect("cart");
    assert!(menu_cart.lines.is_empty());

    let receipt = shop_service::place_order(&state, &customer)
        .await?
        .data
        .expect("receipt");
    assert_eq!(receipt.total, 750);

    let cart = shop_service::view_cart(&state, &customer).await?.data.expect("cart");
    assert!(cart.lines.is_empty());

    let again = shop_service::place_order(&state, &customer).await;
    assert!(matches!(again, Err(AppError::BadRequest(_))));
    Ok(())
}

#[tokio::test]
async fn deleting_a_product_removes_its_upload() -> anyhow::Result<()> {
    let (dir, state) = setup().await?;
    let (_, admin) = create_user(&state, "Admin", true, false).await?;
    let uploads = dir.path().join("uploads");
    std::fs::create_dir_all(&uploads)?;
    std::fs::write(uploads.join("chips.jpg"), b"img")?;
    std::fs::write(uploads.join("chips2.jpg"), b"img")?;

    let product = product_service::create_product(
        &state,
        &admin,
        ProductRequest {
            name: "Chips".into(),
            description: String::new(),
            price: 150,
            category: "Fried".into(),
            image: Some("chips.jpg".into()),
        },
    )
    .await?
    .data
    .expect("product");

    product_service::update_product(
        &state,
        &admin,
        product.id,
        ProductRequest {
            name: "Chips".into(),
            description: String::new(),
            price: 175,
            category: "Fried".into(),
            image: Some("chips2.jpg".into()),
        },
    )
    .await?;
    assert!(!uploads.join("chips.jpg").exists());

    product_service::delete_product(&state, &admin, product.id).await?;
    assert!(!uploads.join("chips2.jpg").exists());
    assert!(state.products.find_by_id(product.id).await?.is_none());
    Ok(())
}

#[tokio::test]
async fn oversized_prices_and_quantities_are_rejected() -> anyhow::Result<()> {
    let (_dir, state) = setup().await?;
    let (_, customer) = create_user(&state, "Customer", false, false).await?;
    let (_, operator) = create_user(&state, "Operator", false, true).await?;
    let (_, item) = open_restaurant(&state, &operator, "Gamma", 800).await?;

    let pricey = menu_service::add_menu_item(&state, &operator, dish("Caviar", 4_000_000_000_000_000_000)).await;
    assert!(matches!(pricey, Err(AppError::BadRequest(_))));

    let too_many = cart_service::add_to_cart(&state, &customer, add(item.id, u32::MAX)).await;
    assert!(matches!(too_many, Err(AppError::BadRequest(_))));
    let cart = cart_service::view_cart(&state, &customer).await?.data.expect("cart");
    assert!(cart.lines.is_empty());

    // a price edited on disk past the limit still cannot wrap the totals
    cart_service::add_to_cart(&state, &customer, add(item.id, 3)).await?;
    state
        .menu_items
        .update(item.id, |m| {
            m.price = 4_000_000_000_000_000_000;
            Ok::<(), AppError>(())
        })
        .await?;

    let view = cart_service::view_cart(&state, &customer).await;
    assert!(matches!(view, Err(AppError::BadRequest(_))));
    let checkout = order_service::checkout(&state, &customer, delivery()).await;
    assert!(matches!(checkout, Err(AppError::BadRequest(_))));
    assert!(state.orders.all().await?.is_empty());
    Ok(())
}
