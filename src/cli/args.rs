use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;

use crate::models::{cart::ProductId, role::Role};

#[derive(Parser)]
#[command(name = "procure")]
#[command(about = "Procurement storefront cart, checkout and budget tracking")]
#[command(version = "0.1.0")]
pub struct Args {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Sign in and out
    Session {
        #[command(subcommand)]
        command: SessionCommands,
    },
    /// Cart management commands
    Cart {
        #[command(subcommand)]
        command: CartCommands,
    },
    /// Submit the cart as an order
    Checkout {
        /// Delivery destination (office, classroom, campus)
        #[arg(long)]
        destination: String,
        /// Department the order is charged to
        #[arg(long)]
        department: String,
        /// Requested delivery date (YYYY-MM-DD format)
        #[arg(long)]
        deliver_by: Option<NaiveDate>,
        /// Contact phone for the delivery
        #[arg(long)]
        phone: Option<String>,
        /// Notes for the supplier
        #[arg(long)]
        notes: Option<String>,
        /// Skip confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Show budget utilization
    Budget {
        /// Department to fetch from the backend (defaults to the session's)
        #[arg(short, long)]
        department: Option<String>,
        /// Allocated amount, to compute locally instead of fetching
        #[arg(long, requires = "spent")]
        allocated: Option<Decimal>,
        /// Spent amount, to compute locally instead of fetching
        #[arg(long, requires = "allocated")]
        spent: Option<Decimal>,
    },
}

#[derive(Subcommand)]
pub enum SessionCommands {
    /// Start a session
    Login {
        #[arg(short, long)]
        username: String,
        /// staff, manager, director or admin
        #[arg(short, long, default_value = "staff")]
        role: Role,
        #[arg(short, long)]
        department: Option<String>,
    },
    /// End the session and clear its cart
    Logout,
    /// Show current session
    Status,
}

#[derive(Subcommand)]
pub enum CartCommands {
    /// Add a product to the cart
    Add {
        /// Product ID
        id: ProductId,
        /// Product name
        #[arg(short, long)]
        name: String,
        /// Unit price
        #[arg(short, long)]
        price: Decimal,
        /// Quantity to add
        #[arg(short, long, default_value_t = 1)]
        quantity: u32,
        /// Product category
        #[arg(short, long)]
        category: Option<String>,
    },
    /// Remove a product from the cart
    Remove {
        /// Product ID
        id: ProductId,
    },
    /// Set a product's quantity; zero or less removes it
    Set {
        /// Product ID
        id: ProductId,
        /// New quantity
        #[arg(allow_negative_numbers = true)]
        quantity: i64,
    },
    /// Empty the cart
    Clear {
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },
    /// Show cart contents, totals and approval tier
    Show,
}
