//! Cart commands.

use driphub_core::ProductId;
use driphub_storefront::error::Result;
use driphub_storefront::state::AppState;

use super::resolve_product;
use crate::ProductArgs;

pub async fn add(state: &AppState, args: ProductArgs) -> Result<()> {
    let product = resolve_product(state, args).await?;
    let mut cart = state.cart();
    cart.add_to_cart(&product)?;
    println!(
        "Added {} (now {} in cart)",
        product.name,
        cart.cart_quantity_of(&product.id)
    );
    Ok(())
}

pub fn remove(state: &AppState, id: &str) -> Result<()> {
    state.cart().remove_from_cart(&ProductId::from(id))?;
    println!("Removed {id}");
    Ok(())
}

pub fn set(state: &AppState, id: &str, quantity: u32) -> Result<()> {
    let id = ProductId::from(id);
    let mut cart = state.cart();
    cart.update_quantity(&id, quantity)?;
    match cart.cart_quantity_of(&id) {
        0 => println!("{id} is not in the cart"),
        n => println!("{id} quantity is now {n}"),
    }
    Ok(())
}

pub fn clear(state: &AppState) -> Result<()> {
    state.cart().clear_cart()?;
    println!("Cart cleared");
    Ok(())
}

pub fn show(state: &AppState) {
    let cart = state.cart();
    if cart.cart().is_empty() {
        println!("Your cart is empty");
        return;
    }
    for item in cart.cart() {
        println!(
            "{:>3} x {:<32} {:>10}  {:>10}  [{}]",
            item.quantity,
            item.name,
            item.price.display(),
            item.line_total().display(),
            item.id
        );
    }
    println!(
        "{} line(s), {} unit(s), total {}",
        cart.cart_count(),
        cart.total_quantity(),
        cart.cart_total().display()
    );
}
