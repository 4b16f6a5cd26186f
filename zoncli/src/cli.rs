use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "zoncli", version, about = "The Zon storefront from your terminal")]
pub struct Cli {
    /// Emit JSON instead of tables.
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Sign in through the browser.
    Login,
    /// Forget the stored credential.
    Logout,
    /// Show whether you are signed in and when the token expires.
    Status,
    /// List recent orders.
    Orders {
        #[arg(long, default_value_t = 1)]
        page: u32,
    },
    /// Inspect or change the cart.
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Search the catalog.
    Search {
        query: String,
        #[arg(long, default_value_t = 1)]
        page: u32,
    },
    /// List subscriptions.
    Subscriptions,
}

#[derive(Debug, Subcommand)]
pub enum CartAction {
    /// Show the current cart.
    Show,
    /// Add a product to the cart.
    Add {
        product_id: String,
        #[arg(long, default_value_t = 1)]
        quantity: u32,
    },
    /// Remove a line item from the cart.
    Remove { item_id: String },
}
