use super::{Cents, ProductId, Request};
use crate::macros::setter;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cart {
    pub items: Vec<CartItem>,
    pub subtotal: Cents,
}

impl Cart {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartItem {
    /// Line-item id, distinct from the product id; used for removal.
    pub item_id: String,
    pub product_id: ProductId,
    pub title: String,
    pub quantity: u32,
    pub unit_price: Cents,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartResponse {
    pub cart: Cart,
}

/// Fetch the current cart contents.
#[derive(Debug, Clone, Default, Serialize)]
pub struct GetCart;

impl GetCart {
    pub fn new() -> Self {
        Self
    }
}

impl Request for GetCart {
    type Response = CartResponse;

    fn path(&self) -> Cow<'_, str> {
        "/cart".into()
    }
}

/// Add a product to the cart.
#[derive(Debug, Clone, Serialize)]
pub struct AddToCart {
    product_id: ProductId,
    quantity: u32,
}

impl AddToCart {
    pub fn new<P>(product_id: P) -> Self
    where
        P: Into<ProductId>,
    {
        Self {
            product_id: product_id.into(),
            quantity: 1,
        }
    }

    setter!(quantity: u32);
}

impl Request for AddToCart {
    type Response = CartResponse;
    const METHOD: Method = Method::POST;

    fn path(&self) -> Cow<'_, str> {
        "/cart/items".into()
    }

    fn form(&self) -> Option<Vec<(&'static str, String)>> {
        Some(vec![
            ("product_id", self.product_id.to_string()),
            ("quantity", self.quantity.to_string()),
        ])
    }
}

/// Remove a line item from the cart.
#[derive(Debug, Clone, Serialize)]
pub struct RemoveFromCart {
    item_id: String,
}

impl RemoveFromCart {
    pub fn new(item_id: impl Into<String>) -> Self {
        Self {
            item_id: item_id.into(),
        }
    }
}

impl Request for RemoveFromCart {
    type Response = CartResponse;
    const METHOD: Method = Method::POST;

    fn path(&self) -> Cow<'_, str> {
        format!("/cart/items/{}/remove", self.item_id).into()
    }
}
