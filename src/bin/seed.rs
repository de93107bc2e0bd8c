use storefront_api::{
    config::AppConfig,
    dto::{menu::MenuItemRequest, products::ProductRequest, restaurants::RestaurantRequest},
    middleware::auth::AuthUser,
    models::User,
    services::{auth_service, menu_service, product_service, restaurant_service},
    state::AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;
    let admin_email = std::env::var("ADMIN_EMAIL").unwrap_or_else(|_| "admin@example.com".into());
    let admin_password = std::env::var("ADMIN_PASSWORD").unwrap_or_else(|_| "admin123".into());

    let state = AppState::open(config).await?;

    let admin = ensure_user(&state, "Admin", &admin_email, &admin_password, true, false).await?;
    let owner = ensure_user(&state, "Demo Kitchen", "kitchen@example.com", "kitchen123", false, true).await?;
    let customer = ensure_user(&state, "Demo Customer", "user@example.com", "user123", false, false).await?;

    seed_restaurant(&state, &owner).await?;
    seed_products(&state, &admin).await?;

    println!(
        "Seed completed. Admin ID: {}, Operator ID: {}, Customer ID: {}",
        admin.id, owner.id, customer.id
    );
    Ok(())
}

async fn ensure_user(
    state: &AppState,
    name: &str,
    email: &str,
    password: &str,
    is_admin: bool,
    is_restaurant: bool,
) -> anyhow::Result<User> {
    let existing = state
        .users
        .find_one_by(|u| u.email.eq_ignore_ascii_case(email))
        .await?;
    if let Some(user) = existing {
        println!("User {email} already exists");
        return Ok(user);
    }

    let user = auth_service::create_user(state, name, email, password, is_admin, is_restaurant).await?;
    println!("Created user {email} (admin={is_admin}, restaurant={is_restaurant})");
    Ok(user)
}

fn session(user: &User) -> AuthUser {
    AuthUser {
        user_id: user.id,
        name: user.name.clone(),
        is_admin: user.is_admin,
        is_restaurant: user.is_restaurant,
    }
}

async fn seed_restaurant(state: &AppState, owner: &User) -> anyhow::Result<()> {
    let operator = session(owner);
    if state
        .restaurants
        .find_one_by(|r| r.owner_id == owner.id)
        .await?
        .is_some()
    {
        println!("Demo restaurant already exists");
        return Ok(());
    }

    restaurant_service::create_restaurant(
        state,
        &operator,
        RestaurantRequest {
            name: "Demo Kitchen".into(),
            description: "Curries, breads and sweets".into(),
            address: "12 Market Street".into(),
            phone: "555-0100".into(),
            cuisines: vec!["Indian".into(), "Vegetarian".into()],
            image: None,
            delivery_fee: 299,
            min_order: 1000,
        },
    )
    .await?;

    let dishes = [
        ("Paneer Tikka", "Grilled cottage cheese", 899, "Starters", true),
        ("Butter Chicken", "Tomato and cream curry", 1299, "Mains", false),
        ("Dal Makhani", "Slow cooked black lentils", 999, "Mains", true),
        ("Garlic Naan", "Tandoor baked flatbread", 299, "Breads", true),
        ("Gulab Jamun", "Milk dumplings in syrup", 499, "Desserts", true),
    ];
    for (name, description, price, category, is_veg) in dishes {
        menu_service::add_menu_item(
            state,
            &operator,
            MenuItemRequest {
                name: name.into(),
                description: description.into(),
                price,
                category: category.into(),
                image: None,
                is_veg,
                is_available: Some(true),
            },
        )
        .await?;
    }

    println!("Seeded demo restaurant");
    Ok(())
}

async fn seed_products(state: &AppState, admin: &User) -> anyhow::Result<()> {
    if !state.products.all().await?.is_empty() {
        println!("Products already seeded");
        return Ok(());
    }

    let admin = session(admin);
    let products = [
        ("Salted Pretzels", "Crunchy baked pretzels", 250, "Baked"),
        ("Masala Chips", "Spiced potato chips", 150, "Fried"),
        ("Choco Cookies", "Double chocolate cookies", 300, "Baked"),
        ("Trail Mix", "Nuts, seeds and raisins", 450, "Healthy"),
    ];
    for (name, description, price, category) in products {
        product_service::create_product(
            state,
            &admin,
            ProductRequest {
                name: name.into(),
                description: description.into(),
                price,
                category: category.into(),
                image: None,
            },
        )
        .await?;
    }

    println!("Seeded products");
    Ok(())
}
