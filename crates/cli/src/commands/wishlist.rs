//! Wishlist commands.

use driphub_core::ProductId;
use driphub_storefront::error::{AppError, Result};
use driphub_storefront::state::AppState;

use super::resolve_product;
use crate::ProductArgs;

pub async fn add(state: &AppState, args: ProductArgs) -> Result<()> {
    let product = resolve_product(state, args).await?;
    state.cart().add_to_wishlist(&product)?;
    println!("Saved {}", product.name);
    Ok(())
}

pub fn remove(state: &AppState, id: &str) -> Result<()> {
    state.cart().remove_from_wishlist(&ProductId::from(id))?;
    println!("Removed {id} from the wishlist");
    Ok(())
}

pub fn move_to_cart(state: &AppState, id: &str) -> Result<()> {
    if !state.cart().move_to_cart(&ProductId::from(id))? {
        return Err(AppError::NotFound(format!("{id} is not in the wishlist")));
    }
    println!("Moved {id} to the cart");
    Ok(())
}

pub fn show(state: &AppState) {
    let cart = state.cart();
    if cart.wishlist().is_empty() {
        println!("Your wishlist is empty");
        return;
    }
    for item in cart.wishlist() {
        println!("{:<32} {:>10}  [{}]", item.name, item.price.display(), item.id);
    }
    println!("{} saved item(s)", cart.wishlist_count());
}
