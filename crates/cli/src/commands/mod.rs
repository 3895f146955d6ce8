//! Subcommand implementations. Results are written to stdout.

#![allow(clippy::print_stdout)]

pub mod auth;
pub mod cart;
pub mod products;
pub mod route;
pub mod wishlist;

use driphub_core::Product;
use driphub_storefront::error::Result;
use driphub_storefront::state::AppState;

use crate::ProductArgs;

/// Report a failure that happened before logging was set up, then exit.
#[allow(clippy::print_stderr)]
pub fn exit_with(message: &str) -> ! {
    eprintln!("{message}");
    std::process::exit(2);
}

/// Build the product from the arguments, or fetch it when only an id was
/// given.
async fn resolve_product(state: &AppState, args: ProductArgs) -> Result<Product> {
    let product = match (args.name, args.price) {
        (Some(name), Some(price)) => Product::new(args.id, name, price),
        _ => state.catalog().product(&args.id.into()).await?,
    };
    Ok(match args.image {
        Some(image) => product.with_image(image),
        None => product,
    })
}
