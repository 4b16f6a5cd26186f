use super::{Cents, ProductId, Request};
use crate::macros::setter;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub product_id: ProductId,
    pub title: String,
    pub price: Option<Cents>,
    pub rating: Option<f32>,
}

/// Full-text product search.
#[derive(Debug, Clone, Serialize)]
pub struct SearchProducts {
    query: String,
    page: u32,
}

impl SearchProducts {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            page: 1,
        }
    }

    setter!(page: u32);
}

impl Request for SearchProducts {
    type Response = SearchResponse;

    fn path(&self) -> Cow<'_, str> {
        "/search".into()
    }

    fn query(&self) -> Vec<(&'static str, String)> {
        vec![("q", self.query.clone()), ("page", self.page.to_string())]
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    pub results: Vec<Product>,
    pub total_results: Option<u64>,
}
