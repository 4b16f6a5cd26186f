use anyhow::Result;
use serde::Serialize;
use zon_api::endpoints::cart::CartResponse;
use zon_api::endpoints::orders::OrdersResponse;
use zon_api::endpoints::search::SearchResponse;
use zon_api::endpoints::subscriptions::SubscriptionsResponse;

fn emit_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn orders(response: &OrdersResponse, json: bool) -> Result<()> {
    if json {
        return emit_json(response);
    }
    if response.orders.is_empty() {
        println!("No orders found.");
        return Ok(());
    }
    println!(
        "{:<16} {:<12} {:<11} {:>10}",
        "ORDER", "PLACED", "STATUS", "TOTAL"
    );
    for order in &response.orders {
        println!(
            "{:<16} {:<12} {:<11} {:>10}",
            order.order_id,
            order.placed_on.to_string(),
            order.status.to_string(),
            format!("${}", order.total),
        );
        for item in &order.items {
            println!("    {} x{}  [{}]", item.title, item.quantity, item.product_id);
        }
    }
    if let Some(next) = response.next_page {
        println!("(more orders on page {next})");
    }
    Ok(())
}

pub fn cart(response: &CartResponse, json: bool) -> Result<()> {
    if json {
        return emit_json(response);
    }
    let cart = &response.cart;
    if cart.is_empty() {
        println!("Your cart is empty.");
        return Ok(());
    }
    println!("{:<14} {:>4} {:>10}  TITLE", "ITEM", "QTY", "PRICE");
    for item in &cart.items {
        println!(
            "{:<14} {:>4} {:>10}  {}",
            item.item_id,
            item.quantity,
            format!("${}", item.unit_price),
            item.title,
        );
    }
    println!("{:>31}", format!("subtotal ${}", cart.subtotal));
    Ok(())
}

pub fn search(response: &SearchResponse, json: bool) -> Result<()> {
    if json {
        return emit_json(response);
    }
    if response.results.is_empty() {
        println!("No results.");
        return Ok(());
    }
    for product in &response.results {
        let price = product
            .price
            .map_or_else(|| "unavailable".to_string(), |p| format!("${p}"));
        let rating = product
            .rating
            .map_or_else(String::new, |r| format!("  {r:.1}★"));
        println!("[{}] {:>12}{}  {}", product.product_id, price, rating, product.title);
    }
    if let Some(total) = response.total_results {
        println!("({total} results total)");
    }
    Ok(())
}

pub fn subscriptions(response: &SubscriptionsResponse, json: bool) -> Result<()> {
    if json {
        return emit_json(response);
    }
    if response.subscriptions.is_empty() {
        println!("No subscriptions.");
        return Ok(());
    }
    println!(
        "{:<14} {:<10} {:>8} {:<12}  TITLE",
        "ID", "STATUS", "PRICE", "NEXT"
    );
    for sub in &response.subscriptions {
        let next = sub
            .next_delivery
            .map_or_else(|| "-".to_string(), |d| d.to_string());
        println!(
            "{:<14} {:<10} {:>8} {:<12}  {} (every {} weeks)",
            sub.subscription_id,
            sub.status.to_string(),
            format!("${}", sub.price),
            next,
            sub.title,
            sub.interval_weeks,
        );
    }
    Ok(())
}
