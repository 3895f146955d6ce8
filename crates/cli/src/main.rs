//! DripHub CLI - drive the storefront client from a terminal.
//!
//! # Usage
//!
//! ```bash
//! # Add a product to the cart (fetched from the catalog)
//! driphub cart add 42
//!
//! # Add a product without asking the backend
//! driphub cart add 42 --name "Denim Jacket" --price 59.99
//!
//! # Sign in and check a protected route
//! driphub auth login -e shopper@example.com -p 'Secret#123'
//! driphub route check /checkout
//! ```
//!
//! # Commands
//!
//! - `cart` - Show and change the cart
//! - `wishlist` - Show and change the wishlist
//! - `auth` - Sign in, register, sign out, password reset
//! - `products` - Browse the catalog
//! - `route` - Ask the route gate about a path
//!
//! State (cart, wishlist, tokens, cached profile) lives in the JSON file named
//! by `DRIPHUB_STORAGE_PATH`, so it carries over between invocations.

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use driphub_core::Price;
use driphub_storefront::{config::StorefrontConfig, state::AppState, telemetry};

mod commands;

#[derive(Parser)]
#[command(name = "driphub")]
#[command(author, version, about = "DripHub storefront client")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show and change the shopping cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Show and change the wishlist
    Wishlist {
        #[command(subcommand)]
        action: WishlistAction,
    },
    /// Manage the signed-in session
    Auth {
        #[command(subcommand)]
        action: AuthAction,
    },
    /// Browse the product catalog
    Products {
        #[command(subcommand)]
        action: ProductsAction,
    },
    /// Inspect the route table and gate
    Route {
        #[command(subcommand)]
        action: RouteAction,
    },
}

/// Product details given on the command line instead of fetched.
#[derive(clap::Args)]
struct ProductArgs {
    /// Product id
    id: String,

    /// Product name (skips the catalog lookup together with `--price`)
    #[arg(long, requires = "price")]
    name: Option<String>,

    /// Unit price, e.g. `59.99`
    #[arg(long, requires = "name")]
    price: Option<Price>,

    /// Image URL
    #[arg(long)]
    image: Option<String>,
}

#[derive(Subcommand)]
enum CartAction {
    /// Add one unit of a product
    Add(ProductArgs),
    /// Remove a product line
    Remove {
        /// Product id
        id: String,
    },
    /// Set the quantity of a product line (values below 1 become 1)
    Set {
        /// Product id
        id: String,
        /// New quantity
        quantity: u32,
    },
    /// Empty the cart
    Clear,
    /// Print the cart and its total
    Show,
}

#[derive(Subcommand)]
enum WishlistAction {
    /// Save a product
    Add(ProductArgs),
    /// Remove a saved product
    Remove {
        /// Product id
        id: String,
    },
    /// Move a saved product into the cart
    Move {
        /// Product id
        id: String,
    },
    /// Print the wishlist
    Show,
}

#[derive(Subcommand)]
enum AuthAction {
    /// Sign in with email and password
    Login {
        #[arg(short, long)]
        email: String,

        #[arg(short, long)]
        password: String,
    },
    /// Create an account
    Register {
        #[arg(short, long)]
        name: String,

        #[arg(short, long)]
        email: String,

        #[arg(short, long)]
        password: String,

        /// Repeat of `--password`
        #[arg(short, long)]
        confirm: String,
    },
    /// Sign out and forget stored tokens
    Logout,
    /// Restore the session and print who is signed in
    Whoami,
    /// Request a password reset email
    Forgot {
        #[arg(short, long)]
        email: String,
    },
    /// Set a new password with a reset token
    Reset {
        #[arg(short, long)]
        token: String,

        #[arg(short, long)]
        password: String,

        /// Repeat of `--password`
        #[arg(short, long)]
        confirm: String,
    },
}

#[derive(Subcommand)]
enum ProductsAction {
    /// List products
    List {
        /// Only products in this category
        #[arg(long)]
        category: Option<String>,

        /// Sort order understood by the backend, e.g. `price_asc`
        #[arg(long)]
        sort: Option<String>,

        #[arg(long)]
        page: Option<u32>,
    },
    /// Show one product
    Show {
        /// Product id
        id: String,
    },
    /// Search products by text
    Search {
        /// Search text
        query: String,
    },
    /// List product categories
    Categories,
}

#[derive(Subcommand)]
enum RouteAction {
    /// Decide whether `path` may be shown to the current session
    Check {
        /// Path to check, e.g. `/checkout`
        path: String,
    },
    /// Print the route table
    List,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match StorefrontConfig::from_env() {
        Ok(config) => config,
        Err(e) => commands::exit_with(&format!("Invalid configuration: {e}")),
    };

    let sentry_guard = telemetry::init(&config);

    let result: Result<(), Box<dyn std::error::Error>> = run(cli, config).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        drop(sentry_guard);
        std::process::exit(1);
    }
}

async fn run(cli: Cli, config: StorefrontConfig) -> Result<(), Box<dyn std::error::Error>> {
    let state = AppState::open(config)?;
    state.watch_session_expiry();

    match cli.command {
        Commands::Cart { action } => match action {
            CartAction::Add(product) => commands::cart::add(&state, product).await?,
            CartAction::Remove { id } => commands::cart::remove(&state, &id)?,
            CartAction::Set { id, quantity } => commands::cart::set(&state, &id, quantity)?,
            CartAction::Clear => commands::cart::clear(&state)?,
            CartAction::Show => commands::cart::show(&state),
        },
        Commands::Wishlist { action } => match action {
            WishlistAction::Add(product) => commands::wishlist::add(&state, product).await?,
            WishlistAction::Remove { id } => commands::wishlist::remove(&state, &id)?,
            WishlistAction::Move { id } => commands::wishlist::move_to_cart(&state, &id)?,
            WishlistAction::Show => commands::wishlist::show(&state),
        },
        Commands::Auth { action } => match action {
            AuthAction::Login { email, password } => {
                commands::auth::login(&state, email, password).await?;
            }
            AuthAction::Register {
                name,
                email,
                password,
                confirm,
            } => commands::auth::register(&state, name, email, password, confirm).await?,
            AuthAction::Logout => commands::auth::logout(&state).await,
            AuthAction::Whoami => commands::auth::whoami(&state).await?,
            AuthAction::Forgot { email } => commands::auth::forgot(&state, &email).await?,
            AuthAction::Reset {
                token,
                password,
                confirm,
            } => commands::auth::reset(&state, token, password, confirm).await?,
        },
        Commands::Products { action } => match action {
            ProductsAction::List {
                category,
                sort,
                page,
            } => {
                commands::products::list(&state, category.as_deref(), sort.as_deref(), page)
                    .await?;
            }
            ProductsAction::Show { id } => commands::products::show(&state, &id).await?,
            ProductsAction::Search { query } => commands::products::search(&state, &query).await?,
            ProductsAction::Categories => commands::products::categories(&state).await?,
        },
        Commands::Route { action } => match action {
            RouteAction::Check { path } => commands::route::check(&state, &path).await,
            RouteAction::List => commands::route::list(),
        },
    }
    Ok(())
}
