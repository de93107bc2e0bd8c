use std::{collections::HashMap, future::Future};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::{MenuItem, Product, Restaurant};

/// Most units of one item a single cart line can hold.
pub const MAX_QUANTITY: u32 = 999;

/// A line or cart total that does not fit in an `i64` of minor units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("cart total is too large")]
pub struct TotalOverflow;

/// `price * quantity`, or [`TotalOverflow`] when it does not fit.
pub fn line_total(price: i64, quantity: u32) -> Result<i64, TotalOverflow> {
    price.checked_mul(i64::from(quantity)).ok_or(TotalOverflow)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CartLine {
    pub item_id: Uuid,
    pub quantity: u32,
}

/// Quantities the shopper wants, in the order items were first added.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn quantity_of(&self, item_id: Uuid) -> Option<u32> {
        self.lines
            .iter()
            .find(|line| line.item_id == item_id)
            .map(|line| line.quantity)
    }

    /// Add `quantity` more of an item, merging with an existing line.
    /// A line never holds more than [`MAX_QUANTITY`].
    pub fn add(&mut self, item_id: Uuid, quantity: u32) {
        if quantity == 0 {
            return;
        }
        let quantity = quantity.min(MAX_QUANTITY);
        match self.lines.iter_mut().find(|line| line.item_id == item_id) {
            Some(line) => line.quantity = line.quantity.saturating_add(quantity).min(MAX_QUANTITY),
            None => self.lines.push(CartLine { item_id, quantity }),
        }
    }

    /// Set the quantity of an item; zero or less drops the line.
    pub fn set_quantity(&mut self, item_id: Uuid, quantity: i64) {
        if quantity <= 0 {
            self.remove(item_id);
            return;
        }
        let quantity = u32::try_from(quantity).unwrap_or(u32::MAX).min(MAX_QUANTITY);
        match self.lines.iter_mut().find(|line| line.item_id == item_id) {
            Some(line) => line.quantity = quantity,
            None => self.lines.push(CartLine { item_id, quantity }),
        }
    }

    pub fn remove(&mut self, item_id: Uuid) -> bool {
        let before = self.lines.len();
        self.lines.retain(|line| line.item_id != item_id);
        self.lines.len() != before
    }
}

/// Per-session cart storage.
pub trait CartStore: Send + Sync {
    fn get(&self, session: Uuid) -> impl Future<Output = Cart> + Send;

    fn set(&self, session: Uuid, cart: Cart) -> impl Future<Output = ()> + Send;

    fn clear(&self, session: Uuid) -> impl Future<Output = ()> + Send;

    /// Apply `change` to the session's cart atomically and return the result.
    fn update<F>(&self, session: Uuid, change: F) -> impl Future<Output = Cart> + Send
    where
        F: FnOnce(&mut Cart) + Send;
}

#[derive(Debug, Default)]
pub struct MemoryCartStore {
    carts: RwLock<HashMap<Uuid, Cart>>,
}

impl CartStore for MemoryCartStore {
    async fn get(&self, session: Uuid) -> Cart {
        self.carts
            .read()
            .await
            .get(&session)
            .cloned()
            .unwrap_or_default()
    }

    async fn set(&self, session: Uuid, cart: Cart) {
        let mut carts = self.carts.write().await;
        if cart.is_empty() {
            carts.remove(&session);
        } else {
            carts.insert(session, cart);
        }
    }

    async fn clear(&self, session: Uuid) {
        self.carts.write().await.remove(&session);
    }

    async fn update<F>(&self, session: Uuid, change: F) -> Cart
    where
        F: FnOnce(&mut Cart) + Send,
    {
        let mut carts = self.carts.write().await;
        let cart = carts.entry(session).or_default();
        change(cart);
        let updated = cart.clone();
        if updated.is_empty() {
            carts.remove(&session);
        }
        updated
    }
}

/// A catalog record that can sit in a cart.
pub trait Purchasable {
    fn item_id(&self) -> Uuid;
    fn display_name(&self) -> &str;
    fn unit_price(&self) -> i64;

    fn restaurant_id(&self) -> Option<Uuid> {
        None
    }
}

impl Purchasable for MenuItem {
    fn item_id(&self) -> Uuid {
        self.id
    }

    fn display_name(&self) -> &str {
        &self.name
    }

    fn unit_price(&self) -> i64 {
        self.price
    }

    fn restaurant_id(&self) -> Option<Uuid> {
        Some(self.restaurant_id)
    }
}

impl Purchasable for Product {
    fn item_id(&self) -> Uuid {
        self.id
    }

    fn display_name(&self) -> &str {
        &self.name
    }

    fn unit_price(&self) -> i64 {
        self.price
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct CartLineView {
    pub item_id: Uuid,
    pub name: String,
    pub unit_price: i64,
    pub quantity: u32,
    pub line_total: i64,
    pub restaurant_id: Option<Uuid>,
    pub restaurant_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct CartSummary {
    pub lines: Vec<CartLineView>,
    /// Lines whose item no longer exists. They never count towards `total`.
    pub orphans: Vec<CartLine>,
    pub total: i64,
}

impl CartSummary {
    /// Fill in restaurant names; a vanished restaurant reads "Unknown Restaurant".
    pub fn with_restaurant_names(mut self, restaurants: &[Restaurant]) -> Self {
        let names: HashMap<Uuid, &str> = restaurants
            .iter()
            .map(|r| (r.id, r.name.as_str()))
            .collect();
        for line in &mut self.lines {
            if let Some(restaurant_id) = line.restaurant_id {
                let name = names
                    .get(&restaurant_id)
                    .copied()
                    .unwrap_or("Unknown Restaurant");
                line.restaurant_name = Some(name.to_string());
            }
        }
        self
    }
}

/// Price every cart line against the current catalog.
pub fn aggregate<P: Purchasable>(cart: &Cart, catalog: &[P]) -> Result<CartSummary, TotalOverflow> {
    let by_id: HashMap<Uuid, &P> = catalog.iter().map(|p| (p.item_id(), p)).collect();

    let mut lines = Vec::with_capacity(cart.lines().len());
    let mut orphans = Vec::new();
    let mut total = 0_i64;

    for line in cart.lines() {
        match by_id.get(&line.item_id) {
            Some(item) => {
                let line_total = line_total(item.unit_price(), line.quantity)?;
                total = total.checked_add(line_total).ok_or(TotalOverflow)?;
                lines.push(CartLineView {
                    item_id: line.item_id,
                    name: item.display_name().to_string(),
                    unit_price: item.unit_price(),
                    quantity: line.quantity,
                    line_total,
                    restaurant_id: item.restaurant_id(),
                    restaurant_name: None,
                });
            }
            None => orphans.push(*line),
        }
    }

    Ok(CartSummary {
        lines,
        orphans,
        total,
    })
}
