use chrono::Utc;
use uuid::Uuid;

use crate::{
    dto::products::{ProductList, ProductRequest},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::{DEFAULT_PRODUCT_IMAGE, Product},
    response::{ApiResponse, Meta},
    routes::params::{ProductQuery, ProductSortBy, SortOrder},
    state::AppState,
    uploads,
};

pub async fn list_products(
    state: &AppState,
    query: ProductQuery,
) -> AppResult<ApiResponse<ProductList>> {
    let products = state.products.all().await?;
    let items = filter_products(products, &query);
    let meta = Meta::total(items.len());
    Ok(ApiResponse::success("Products", ProductList { items }, Some(meta)))
}

pub(crate) fn filter_products(products: Vec<Product>, query: &ProductQuery) -> Vec<Product> {
    let search = query
        .q
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_lowercase);
    let category = query.category.as_deref().filter(|c| !c.is_empty());

    let mut items: Vec<Product> = products
        .into_iter()
        .filter(|p| {
            search.as_ref().is_none_or(|s| {
                p.name.to_lowercase().contains(s) || p.description.to_lowercase().contains(s)
            })
        })
        .filter(|p| category.is_none_or(|c| p.category.eq_ignore_ascii_case(c)))
        .collect();

    let sort_by = query.sort_by.unwrap_or(ProductSortBy::CreatedAt);
    let sort_order = query.sort_order.unwrap_or(SortOrder::Desc);
    items.sort_by(|a, b| {
        let ord = match sort_by {
            ProductSortBy::CreatedAt => a.created_at.cmp(&b.created_at),
            ProductSortBy::Price => a.price.cmp(&b.price),
            ProductSortBy::Name => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
        };
        match sort_order {
            SortOrder::Asc => ord,
            SortOrder::Desc => ord.reverse(),
        }
    });
    items
}

pub async fn get_product(state: &AppState, id: Uuid) -> AppResult<ApiResponse<Product>> {
    let result = state.products.find_by_id(id).await?;
    let result = match result {
        Some(p) => p,
        None => return Err(AppError::NotFound),
    };
    Ok(ApiResponse::success("Product", result, None))
}

pub async fn create_product(
    state: &AppState,
    user: &AuthUser,
    payload: ProductRequest,
) -> AppResult<ApiResponse<Product>> {
    ensure_admin(user)?;
    payload.validate()?;

    let image = payload
        .image
        .filter(|i| !i.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_PRODUCT_IMAGE.to_string());
    let product = state
        .products
        .append(Product {
            id: Uuid::new_v4(),
            name: payload.name.trim().to_string(),
            description: payload.description.trim().to_string(),
            price: payload.price,
            category: payload.category.trim().to_string(),
            image,
            created_at: Utc::now(),
        })
        .await?;

    state
        .audit
        .record(
            Some(user.user_id),
            "product_create",
            "products",
            serde_json::json!({ "product_id": product.id }),
        )
        .await;

    Ok(ApiResponse::success(
        "Product added successfully!",
        product,
        Some(Meta::empty()),
    ))
}

pub async fn update_product(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: ProductRequest,
) -> AppResult<ApiResponse<Product>> {
    ensure_admin(user)?;
    payload.validate()?;

    let new_image = payload.image.filter(|i| !i.trim().is_empty());
    let mut replaced_image = None;
    let product = state
        .products
        .update(id, |p| {
            p.name = payload.name.trim().to_string();
            p.description = payload.description.trim().to_string();
            p.price = payload.price;
            p.category = payload.category.trim().to_string();
            if let Some(image) = new_image {
                if p.image != image {
                    replaced_image = Some(std::mem::replace(&mut p.image, image));
                }
            }
            Ok::<(), AppError>(())
        })
        .await?;

    if let Some(old) = replaced_image {
        uploads::remove_image(&state.config.upload_dir, &old).await;
    }

    state
        .audit
        .record(
            Some(user.user_id),
            "product_update",
            "products",
            serde_json::json!({ "product_id": product.id }),
        )
        .await;

    Ok(ApiResponse::success(
        "Product updated successfully!",
        product,
        Some(Meta::empty()),
    ))
}

pub async fn delete_product(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(user)?;
    let removed = state.products.remove(id).await?;
    let cleanup = uploads::remove_image(&state.config.upload_dir, &removed.image).await;

    state
        .audit
        .record(
            Some(user.user_id),
            "product_delete",
            "products",
            serde_json::json!({ "product_id": id, "image_cleanup": format!("{cleanup:?}") }),
        )
        .await;

    Ok(ApiResponse::success(
        "Product deleted successfully!",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn product(name: &str, price: i64, category: &str, age_minutes: i64) -> Product {
        Product {
            id: Uuid::new_v4(),
            name: name.into(),
            description: format!("{name} snack"),
            price,
            category: category.into(),
            image: DEFAULT_PRODUCT_IMAGE.into(),
            created_at: Utc::now() - Duration::minutes(age_minutes),
        }
    }

    fn catalog() -> Vec<Product> {
        vec![
            product("Pretzel", 300, "Baked", 30),
            product("Chips", 150, "Fried", 20),
            product("Cookie", 250, "Baked", 10),
        ]
    }

    fn names(items: &[Product]) -> Vec<&str> {
        items.iter().map(|p| p.name.as_str()).collect()
    }

    #[test]
    fn default_listing_is_newest_first() {
        let items = filter_products(catalog(), &ProductQuery::default());
        assert_eq!(names(&items), vec!["Cookie", "Chips", "Pretzel"]);
    }

    #[test]
    fn category_and_price_sort() {
        let query = ProductQuery {
            category: Some("baked".into()),
            sort_by: Some(ProductSortBy::Price),
            sort_order: Some(SortOrder::Asc),
            ..Default::default()
        };
        let items = filter_products(catalog(), &query);
        assert_eq!(names(&items), vec!["Cookie", "Pretzel"]);
    }

    #[test]
    fn search_matches_description_case_insensitively() {
        let query = ProductQuery {
            q: Some("CHIPS".into()),
            ..Default::default()
        };
        let items = filter_products(catalog(), &query);
        assert_eq!(names(&items), vec!["Chips"]);
    }
}
