//! AgriMap Market CLI - browse, shop and check out from the terminal.
//!
//! # Usage
//!
//! ```bash
//! # Browse the catalog
//! agrimap states
//! agrimap products --state kerala --category Spices
//!
//! # Build a cart (pass the printed session to later commands)
//! agrimap cart add <product-id> --quantity 2
//! agrimap cart show --session session_1718000000000_k3j9x0a2b
//!
//! # Check out and confirm the payment after the redirect back
//! agrimap checkout --session session_1718000000000_k3j9x0a2b
//! agrimap confirm cs_test_a1b2c3
//!
//! # Load a page as a browser would (auth fragment, payment return, ...)
//! agrimap open "/profile#session_id=abc123"
//! ```
//!
//! # Commands
//!
//! - `states`, `products`, `product` - Catalog reads
//! - `cart` - Show and change a session's cart
//! - `checkout` - Create a payment session
//! - `confirm` - Poll a payment session until it settles
//! - `open` - Run a full page load
//! - `whoami`, `logout` - Session management

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

use agrimap_storefront::{Storefront, StorefrontConfig, telemetry};

mod commands;
mod output;

#[derive(Parser)]
#[command(name = "agrimap")]
#[command(author, version, about = "AgriMap Market storefront CLI")]
struct Cli {
    /// Emit logs as JSON
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List producing states
    States,
    /// List products
    Products {
        /// State slug, e.g. `punjab`
        #[arg(short, long)]
        state: Option<String>,

        /// Category name, e.g. `Spices`
        #[arg(short, long)]
        category: Option<String>,
    },
    /// Show one product
    Product {
        /// Product ID
        id: String,
    },
    /// Show and change a cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Create a payment session for a cart
    Checkout {
        /// Cart session ID
        #[arg(long, env = "AGRIMAP_SESSION")]
        session: String,
    },
    /// Wait for a payment to settle
    Confirm {
        /// Payment session ID from the redirect back
        payment_session: String,
    },
    /// Load a page URL (absolute, or a path on the origin)
    Open {
        url: String,
    },
    /// Show the signed-in user
    Whoami,
    /// Sign out
    Logout,
}

#[derive(Subcommand)]
enum CartAction {
    /// Show the cart
    Show {
        #[arg(long, env = "AGRIMAP_SESSION")]
        session: String,
    },
    /// Add a product
    Add {
        /// Product ID
        product_id: String,

        #[arg(short, long, default_value_t = 1)]
        quantity: i64,

        /// Cart session ID; a new one is generated when omitted
        #[arg(long, env = "AGRIMAP_SESSION")]
        session: Option<String>,
    },
    /// Set a line's quantity (0 or less removes it)
    Update {
        /// Product ID
        product_id: String,

        #[arg(short, long, allow_negative_numbers = true)]
        quantity: i64,

        #[arg(long, env = "AGRIMAP_SESSION")]
        session: String,
    },
    /// Remove a line
    Remove {
        /// Product ID
        product_id: String,

        #[arg(long, env = "AGRIMAP_SESSION")]
        session: String,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match StorefrontConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            output::failure(&format!("Configuration error: {e}"));
            std::process::exit(2);
        }
    };

    // Sentry first so the tracing layer has a client to report to
    let _sentry_guard = telemetry::init_sentry(&config);
    telemetry::init_tracing(cli.log_json);

    let result: Result<(), Box<dyn std::error::Error>> = run(cli, config).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli, config: StorefrontConfig) -> Result<(), Box<dyn std::error::Error>> {
    let storefront = Storefront::new(config)?;

    let result = match cli.command {
        Commands::States => commands::catalog::states(&storefront).await,
        Commands::Products { state, category } => {
            commands::catalog::products(&storefront, state, category).await
        }
        Commands::Product { id } => commands::catalog::product(&storefront, &id).await,
        Commands::Cart { action } => match action {
            CartAction::Show { session } => commands::cart::show(&storefront, &session).await,
            CartAction::Add {
                product_id,
                quantity,
                session,
            } => commands::cart::add(&storefront, session.as_deref(), &product_id, quantity).await,
            CartAction::Update {
                product_id,
                quantity,
                session,
            } => commands::cart::update(&storefront, &session, &product_id, quantity).await,
            CartAction::Remove {
                product_id,
                session,
            } => commands::cart::remove(&storefront, &session, &product_id).await,
        },
        Commands::Checkout { session } => commands::cart::checkout(&storefront, &session).await,
        Commands::Confirm { payment_session } => {
            commands::payment::confirm(&storefront, &payment_session).await
        }
        Commands::Open { url } => commands::page::open(&storefront, &url).await,
        Commands::Whoami => commands::page::whoami(&storefront).await,
        Commands::Logout => commands::page::logout(&storefront).await,
    };

    output::notices(&storefront.notifications().drain());
    Ok(result?)
}
