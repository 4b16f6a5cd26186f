use super::{Cents, ProductId, Request};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subscription {
    pub subscription_id: String,
    pub product_id: ProductId,
    pub title: String,
    pub status: SubscriptionStatus,
    pub price: Cents,
    pub interval_weeks: u32,
    pub next_delivery: Option<NaiveDate>,
}

#[derive(Debug, Copy, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    Active,
    Paused,
    Cancelled,
}

impl std::fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Active => write!(f, "Active"),
            Self::Paused => write!(f, "Paused"),
            Self::Cancelled => write!(f, "Cancelled"),
        }
    }
}

/// List the account's subscribe-and-save style subscriptions.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ListSubscriptions;

impl ListSubscriptions {
    pub fn new() -> Self {
        Self
    }
}

impl Request for ListSubscriptions {
    type Response = SubscriptionsResponse;

    fn path(&self) -> Cow<'_, str> {
        "/subscriptions".into()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriptionsResponse {
    pub subscriptions: Vec<Subscription>,
}
