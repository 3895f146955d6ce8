//! Catalog commands.

use driphub_core::{Product, ProductId};
use driphub_storefront::error::Result;
use driphub_storefront::state::AppState;

fn print_products(products: &[Product]) {
    if products.is_empty() {
        println!("No products found");
        return;
    }
    for product in products {
        println!(
            "{:<12} {:<40} {:>10}",
            product.id,
            product.name,
            product.price.display()
        );
    }
}

pub async fn list(
    state: &AppState,
    category: Option<&str>,
    sort: Option<&str>,
    page: Option<u32>,
) -> Result<()> {
    let page = page.map(|p| p.to_string());
    let filters: Vec<(&str, &str)> = [
        ("category", category),
        ("sort", sort),
        ("page", page.as_deref()),
    ]
    .into_iter()
    .filter_map(|(key, value)| value.map(|v| (key, v)))
    .collect();

    let products = state.catalog().products(&filters).await?;
    print_products(&products);
    Ok(())
}

pub async fn show(state: &AppState, id: &str) -> Result<()> {
    let product = state.catalog().product(&ProductId::from(id)).await?;
    println!("{} [{}]", product.name, product.id);
    println!("Price: {}", product.price.display());
    if let Some(image) = &product.image {
        println!("Image: {image}");
    }
    for (key, value) in &product.extra {
        println!("{key}: {value}");
    }
    Ok(())
}

pub async fn search(state: &AppState, query: &str) -> Result<()> {
    let products = state.catalog().search(query).await?;
    print_products(&products);
    Ok(())
}

pub async fn categories(state: &AppState) -> Result<()> {
    for category in state.catalog().categories().await? {
        println!("{:<12} {}", category.id, category.name);
    }
    Ok(())
}
