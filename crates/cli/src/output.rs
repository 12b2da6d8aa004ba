//! Terminal rendering of storefront data.

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::collections::BTreeMap;

use agrimap_core::{Cart, Product, StateInfo, User};
use agrimap_storefront::notify::{Notice, NoticeLevel};
use agrimap_storefront::payment::PaymentState;

pub fn states(states: &BTreeMap<String, StateInfo>) {
    for (slug, state) in states {
        println!("{slug:<14} {}", state.name);
        println!("{:<14} {}", "", state.agricultural_products.join(", "));
    }
}

pub fn products(products: &[Product]) {
    if products.is_empty() {
        println!("No products found");
        return;
    }
    for product in products {
        println!(
            "{:<38} {:<28} {:>10}/{:<7} {}",
            product.id.as_str(),
            product.name,
            product.unit_price().to_string(),
            product.unit,
            product.state
        );
    }
}

pub fn product(product: &Product) {
    println!("{} ({})", product.name, product.id);
    println!("  {}", product.description);
    println!("  Price:     {} per {}", product.unit_price(), product.unit);
    println!("  Category:  {}", product.category);
    println!("  Farmer:    {} ({})", product.farmer_name, product.state);
    println!("  Available: {} {}", product.quantity_available, product.unit);
}

pub fn cart(cart: &Cart) {
    if cart.is_empty() {
        println!("Your cart is empty");
        return;
    }
    for line in cart.lines() {
        println!(
            "{:<28} x{:<4} {:>10}",
            line.product.name,
            line.cart_item.quantity,
            agrimap_core::Price::inr(line.total_price).to_string()
        );
    }
    println!("{} items, subtotal {}", cart.item_count(), cart.subtotal());
}

pub fn session(session: &str) {
    println!("Session: {session}");
}

pub fn user(user: Option<&User>) {
    match user {
        Some(user) => println!("Signed in as {} <{}>", user.name, user.email),
        None => println!("Not signed in"),
    }
}

pub fn payment(state: &PaymentState) {
    println!("{}", state.title());
    println!("{}", state.message());
    if let PaymentState::Success(session) = state
        && let Some(amount) = session.amount_total
    {
        println!(
            "Amount: {amount} {}",
            session.currency.as_deref().unwrap_or_default().to_uppercase()
        );
    }
}

pub fn line(text: &str) {
    println!("{text}");
}

pub fn notices(notices: &[Notice]) {
    for notice in notices {
        let marker = match notice.level {
            NoticeLevel::Success => "✓",
            NoticeLevel::Error => "✗",
        };
        eprintln!("{marker} {}", notice.message);
    }
}

pub fn failure(message: &str) {
    eprintln!("✗ {message}");
}
