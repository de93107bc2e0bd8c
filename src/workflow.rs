//! Order lifecycle rules and the checkout split.

use std::{collections::HashMap, fmt, str::FromStr};

use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    cart::{Cart, CartLine, TotalOverflow, line_total},
    models::{MenuItem, OrderLine, OrderStatus},
};

/// How far an operator may move an order in one step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TransitionPolicy {
    /// Any of the six statuses may be set at any time.
    #[default]
    Unconstrained,
    /// Only the next step of the delivery path, or `cancelled` while the
    /// order is still open.
    Linear,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownPolicy(pub String);

impl fmt::Display for UnknownPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown order transition policy {:?} (expected unconstrained or linear)",
            self.0
        )
    }
}

impl std::error::Error for UnknownPolicy {}

impl FromStr for TransitionPolicy {
    type Err = UnknownPolicy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "unconstrained" => Ok(TransitionPolicy::Unconstrained),
            "linear" => Ok(TransitionPolicy::Linear),
            _ => Err(UnknownPolicy(s.to_string())),
        }
    }
}

impl OrderStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }

    /// The following step on the delivery path.
    pub fn next(&self) -> Option<OrderStatus> {
        match self {
            OrderStatus::Pending => Some(OrderStatus::Confirmed),
            OrderStatus::Confirmed => Some(OrderStatus::Preparing),
            OrderStatus::Preparing => Some(OrderStatus::OutForDelivery),
            OrderStatus::OutForDelivery => Some(OrderStatus::Delivered),
            OrderStatus::Delivered | OrderStatus::Cancelled => None,
        }
    }
}

impl TransitionPolicy {
    pub fn allows(&self, from: OrderStatus, to: OrderStatus) -> bool {
        match self {
            TransitionPolicy::Unconstrained => true,
            TransitionPolicy::Linear => {
                from == to
                    || from.next() == Some(to)
                    || (to == OrderStatus::Cancelled && !from.is_terminal())
            }
        }
    }
}

/// One order to be written at checkout, covering a single restaurant.
#[derive(Debug, Clone, PartialEq)]
pub struct DraftOrder {
    pub restaurant_id: Uuid,
    pub items: Vec<OrderLine>,
    pub total: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct DroppedLine {
    pub item_id: Uuid,
    pub quantity: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutPlan {
    pub orders: Vec<DraftOrder>,
    /// Cart lines whose menu item is gone; they are not purchased.
    pub dropped: Vec<DroppedLine>,
}

impl CheckoutPlan {
    /// Cannot overflow: `plan_checkout` bounds the sum of every order.
    pub fn total(&self) -> i64 {
        self.orders.iter().map(|o| o.total).sum()
    }
}

/// Split a cart into one draft order per restaurant, snapshotting each
/// line's name and price from the menu as it is now. Restaurants keep the
/// order in which they first appear in the cart. Fails when any order, or
/// all of them together, would total more than an `i64` holds.
pub fn plan_checkout(cart: &Cart, menu: &[MenuItem]) -> Result<CheckoutPlan, TotalOverflow> {
    let by_id: HashMap<Uuid, &MenuItem> = menu.iter().map(|m| (m.id, m)).collect();

    let mut orders: Vec<DraftOrder> = Vec::new();
    let mut dropped = Vec::new();
    let mut grand_total = 0_i64;

    for &CartLine { item_id, quantity } in cart.lines() {
        let Some(item) = by_id.get(&item_id) else {
            dropped.push(DroppedLine { item_id, quantity });
            continue;
        };

        let line = OrderLine {
            item_id,
            name: item.name.clone(),
            price: item.price,
            quantity,
            line_total: line_total(item.price, quantity)?,
        };
        grand_total = grand_total
            .checked_add(line.line_total)
            .ok_or(TotalOverflow)?;

        match orders
            .iter_mut()
            .find(|draft| draft.restaurant_id == item.restaurant_id)
        {
            Some(draft) => {
                draft.total = draft
                    .total
                    .checked_add(line.line_total)
                    .ok_or(TotalOverflow)?;
                draft.items.push(line);
            }
            None => orders.push(DraftOrder {
                restaurant_id: item.restaurant_id,
                total: line.line_total,
                items: vec![line],
            }),
        }
    }

    Ok(CheckoutPlan { orders, dropped })
}
