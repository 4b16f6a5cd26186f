use super::{Cents, ProductId, Request};
use crate::macros::setter;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub order_id: String,
    pub placed_on: NaiveDate,
    pub status: OrderStatus,
    pub total: Cents,
    pub items: Vec<OrderItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItem {
    pub product_id: ProductId,
    pub title: String,
    pub quantity: u32,
    pub price: Cents,
}

#[derive(Debug, Copy, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Shipped,
    Delivered,
    Cancelled,
    Returned,
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "Pending"),
            Self::Shipped => write!(f, "Shipped"),
            Self::Delivered => write!(f, "Delivered"),
            Self::Cancelled => write!(f, "Cancelled"),
            Self::Returned => write!(f, "Returned"),
        }
    }
}

/// List recent orders, newest first, one page at a time.
#[derive(Debug, Clone, Serialize)]
pub struct ListOrders {
    page: u32,
}

impl ListOrders {
    pub fn new() -> Self {
        Self { page: 1 }
    }

    setter!(page: u32);
}

impl Default for ListOrders {
    fn default() -> Self {
        Self::new()
    }
}

impl Request for ListOrders {
    type Response = OrdersResponse;

    fn path(&self) -> Cow<'_, str> {
        "/orders".into()
    }

    fn query(&self) -> Vec<(&'static str, String)> {
        vec![("page", self.page.to_string())]
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrdersResponse {
    pub orders: Vec<Order>,
    pub next_page: Option<u32>,
}
