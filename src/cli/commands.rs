use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use console::{style, Emoji};
use dialoguer::{theme::ColorfulTheme, Confirm};
use rust_decimal::Decimal;
use tracing::{error, info, warn};

use crate::{
    api::HttpProcurementApi,
    cli::args::*,
    models::{
        cart::{Product, ProductId},
        order::CheckoutRequest,
        role::Role,
        session::cart_key,
    },
    services::{
        budget_service, CartStore, OrderService, OrderServiceError, SessionError, SessionService,
    },
    storage::{FileStore, KeyValueStore},
    utils::{
        formatting::{format_budget, format_cart_table, format_date, format_money, format_pricing, format_tier},
        Config,
    },
};

static CHECKMARK: Emoji<'_, '_> = Emoji("✅ ", "");
static CROSS: Emoji<'_, '_> = Emoji("❌ ", "");
static WARNING: Emoji<'_, '_> = Emoji("⚠️ ", "");
static INFO: Emoji<'_, '_> = Emoji("ℹ️ ", "");
static CART: Emoji<'_, '_> = Emoji("🛒 ", "");

pub struct CliApp {
    config: Config,
    session_service: Arc<SessionService>,
    cart: Arc<CartStore>,
    order_service: OrderService,
}

impl CliApp {
    pub fn new(config: Config) -> Result<Self> {
        let store: Arc<dyn KeyValueStore> = Arc::new(
            FileStore::new(&config.storage_dir).context("Failed to open storage directory")?,
        );

        let session_service = Arc::new(SessionService::new(store.clone()));
        let key = cart_key(config.storefront, session_service.current().as_ref());
        let cart = Arc::new(CartStore::open(store, key));
        session_service.on_session_end(cart.clone());

        let api = HttpProcurementApi::new(
            &config.api_url,
            config.api_token.clone(),
            config.api_timeout,
        )
        .context("Failed to initialize API client")?;
        let order_service = OrderService::new(Arc::new(api));

        Ok(Self {
            config,
            session_service,
            cart,
            order_service,
        })
    }

    pub async fn run(&self, args: Args) -> Result<()> {
        match args.command {
            Commands::Session { command } => self.handle_session_command(command),
            Commands::Cart { command } => self.handle_cart_command(command),
            Commands::Checkout {
                destination,
                department,
                deliver_by,
                phone,
                notes,
                yes,
            } => {
                self.handle_checkout(destination, department, deliver_by, phone, notes, yes)
                    .await
            }
            Commands::Budget {
                department,
                allocated,
                spent,
            } => self.handle_budget(department, allocated, spent).await,
        }
    }

    // Session Commands
    fn handle_session_command(&self, command: SessionCommands) -> Result<()> {
        match command {
            SessionCommands::Login {
                username,
                role,
                department,
            } => self.handle_login(username, role, department),
            SessionCommands::Logout => self.handle_logout(),
            SessionCommands::Status => self.handle_session_status(),
        }
    }

    fn handle_login(&self, username: String, role: Role, department: Option<String>) -> Result<()> {
        match self.session_service.start(&username, role, department) {
            Ok(session) => {
                println!("{} Signed in as {}", CHECKMARK, style(&session.username).green());
                println!("Role: {}", style(session.role).yellow());
                if let Some(department) = &session.department {
                    println!("Department: {}", style(department).cyan());
                }
                info!("User {} signed in", session.username);
            }
            Err(e) => {
                println!("{} Sign in failed: {}", CROSS, style(&e).red());
                error!("Sign in failed: {}", e);
            }
        }

        Ok(())
    }

    fn handle_logout(&self) -> Result<()> {
        match self.session_service.end() {
            Ok(()) => {
                println!("{} Signed out, cart cleared", CHECKMARK);
                info!("User signed out");
            }
            Err(e) => {
                println!("{} Sign out failed: {}", CROSS, style(&e).red());
                error!("Sign out failed: {}", e);
            }
        }

        Ok(())
    }

    fn handle_session_status(&self) -> Result<()> {
        match self.session_service.current() {
            Some(session) => {
                println!("{} {}", INFO, style("Session").bold().cyan());
                println!("Username: {}", style(&session.username).green());
                println!("Role: {}", style(session.role).yellow());
                println!(
                    "Department: {}",
                    style(session.department.as_deref().unwrap_or("-")).dim()
                );
                println!("Since: {}", style(format_date(&session.started_at)).dim());
                println!("Storefront: {}", style(self.config.storefront).cyan());
            }
            None => {
                println!("{} {}", WARNING, style("Not signed in").yellow());
                println!("Use {} to sign in", style("procure session login").cyan());
            }
        }

        Ok(())
    }

    // Cart Commands
    fn handle_cart_command(&self, command: CartCommands) -> Result<()> {
        match command {
            CartCommands::Add {
                id,
                name,
                price,
                quantity,
                category,
            } => self.handle_add(id, name, price, quantity, category),
            CartCommands::Remove { id } => self.handle_remove(id),
            CartCommands::Set { id, quantity } => self.handle_set_quantity(id, quantity),
            CartCommands::Clear { force } => self.handle_clear(force),
            CartCommands::Show => self.handle_show(),
        }
    }

    fn handle_add(
        &self,
        id: ProductId,
        name: String,
        price: Decimal,
        quantity: u32,
        category: Option<String>,
    ) -> Result<()> {
        let mut product = Product::new(id, name, price);
        product.category = category;

        match self.cart.add(product, quantity) {
            Ok(line) => {
                println!(
                    "{} {} x {} in cart",
                    CHECKMARK,
                    style(line.quantity).yellow(),
                    style(&line.name).green()
                );
            }
            Err(e) => {
                println!("{} Failed to add to cart: {}", CROSS, style(&e).red());
                warn!("Failed to add product {}: {}", id, e);
            }
        }

        Ok(())
    }

    fn handle_remove(&self, id: ProductId) -> Result<()> {
        if self.cart.remove(id) {
            println!("{} Product {} removed", CHECKMARK, id);
        } else {
            println!("{} Product {} is not in the cart", INFO, id);
        }
        Ok(())
    }

    fn handle_set_quantity(&self, id: ProductId, quantity: i64) -> Result<()> {
        match self.cart.set_quantity(id, quantity) {
            Some(line) => println!(
                "{} {} quantity set to {}",
                CHECKMARK,
                style(&line.name).green(),
                style(line.quantity).yellow()
            ),
            None if quantity <= 0 => println!("{} Product {} removed", CHECKMARK, id),
            None => println!("{} Product {} is not in the cart", INFO, id),
        }
        Ok(())
    }

    fn handle_clear(&self, force: bool) -> Result<()> {
        if self.cart.is_empty() {
            println!("{} Cart is already empty", INFO);
            return Ok(());
        }

        // Confirm unless force flag is used
        if !force {
            let theme = ColorfulTheme::default();
            let confirm = Confirm::with_theme(&theme)
                .with_prompt("Remove every item from the cart?")
                .default(false)
                .interact()?;

            if !confirm {
                println!("Cart left unchanged");
                return Ok(());
            }
        }

        self.cart.clear();
        println!("{} Cart cleared", CHECKMARK);
        Ok(())
    }

    fn handle_show(&self) -> Result<()> {
        let items = self.cart.items();
        if items.is_empty() {
            println!("{} Your {} cart is empty", CART, self.config.storefront);
            return Ok(());
        }

        println!(
            "{} {}",
            CART,
            style(format!("{} lines, {} items", items.len(), self.cart.total_quantity())).bold()
        );
        println!("{}", format_cart_table(&items));

        let pricing = self.cart.pricing();
        print!("{}", format_pricing(&pricing));

        let tier = self.order_service.classifier().classify(pricing.grand_total);
        println!("{}: {}", style("Approval").bold(), format_tier(&tier));
        if let Some(session) = self.session_service.current() {
            if !tier.is_satisfied_by(session.role) {
                println!(
                    "{} This order will be routed for approval after checkout",
                    INFO
                );
            }
        }

        Ok(())
    }

    // Checkout
    async fn handle_checkout(
        &self,
        destination: String,
        department: String,
        deliver_by: Option<NaiveDate>,
        phone: Option<String>,
        notes: Option<String>,
        yes: bool,
    ) -> Result<()> {
        let session = match self.session_service.require_role(Role::Staff) {
            Ok(session) => session,
            Err(e) => return self.report_session_error(e),
        };

        if self.cart.is_empty() {
            println!("{} Nothing to check out, the cart is empty", WARNING);
            return Ok(());
        }

        if !yes {
            let pricing = self.cart.pricing().rounded();
            let theme = ColorfulTheme::default();
            let confirm = Confirm::with_theme(&theme)
                .with_prompt(format!(
                    "Submit order of {} for {}?",
                    format_money(pricing.grand_total),
                    department
                ))
                .default(true)
                .interact()?;

            if !confirm {
                println!("Checkout cancelled");
                return Ok(());
            }
        }

        let request = CheckoutRequest {
            destination,
            department,
            deliver_by,
            contact_phone: phone,
            notes,
        };

        match self
            .order_service
            .checkout(self.config.storefront, &self.cart, request)
            .await
        {
            Ok(outcome) => {
                println!("{} Order submitted!", CHECKMARK);
                println!("Order ID: {}", style(&outcome.receipt.order_id).cyan());
                if let Some(status) = &outcome.receipt.status {
                    println!("Status: {}", style(status).yellow());
                }
                print!("{}", format_pricing(&outcome.pricing));
                println!("{}: {}", style("Approval").bold(), format_tier(&outcome.tier));
                info!(
                    "Order {} submitted by {}",
                    outcome.receipt.order_id, session.username
                );
            }
            Err(OrderServiceError::Submission { message, .. }) => {
                println!("{} {}", CROSS, style(message).red());
                println!("Your cart was kept, you can retry the checkout.");
            }
            Err(e) => {
                println!("{} Checkout failed: {}", CROSS, style(&e).red());
                error!("Checkout failed: {}", e);
            }
        }

        Ok(())
    }

    // Budget
    async fn handle_budget(
        &self,
        department: Option<String>,
        allocated: Option<Decimal>,
        spent: Option<Decimal>,
    ) -> Result<()> {
        if let (Some(allocated), Some(spent)) = (allocated, spent) {
            if allocated < Decimal::ZERO || spent < Decimal::ZERO {
                println!("{} Budget figures cannot be negative", CROSS);
                return Ok(());
            }
            let utilization = budget_service::utilization(allocated, spent);
            print!("{}", format_budget(&utilization));
            return Ok(());
        }

        let session = match self.session_service.require_role(Role::Manager) {
            Ok(session) => session,
            Err(e) => return self.report_session_error(e),
        };

        let department = match department.or(session.department) {
            Some(department) => department,
            None => {
                println!("{} No department given and none on the session", WARNING);
                return Ok(());
            }
        };

        match self.order_service.budget(&department).await {
            Ok(utilization) => {
                println!("{} {}", INFO, style(format!("Budget for {}", department)).bold());
                print!("{}", format_budget(&utilization));
            }
            // non-critical: report and carry on
            Err(e) => println!("{} {}", WARNING, style(&e).yellow()),
        }

        Ok(())
    }

    fn report_session_error(&self, e: SessionError) -> Result<()> {
        match e {
            SessionError::NotSignedIn => println!(
                "{} Please sign in first: {}",
                WARNING,
                style("procure session login").cyan()
            ),
            other => println!("{} {}", CROSS, style(other).red()),
        }
        Ok(())
    }
}
