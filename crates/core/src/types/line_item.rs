//! Cart and wishlist line items.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{Price, ProductId};

const fn one() -> u32 {
    1
}

/// A product line in the cart.
///
/// The cart holds at most one line per `id`; adding the same product again
/// bumps `quantity` instead of appending a second line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    pub id: ProductId,
    pub name: String,
    pub price: Price,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default = "one")]
    pub quantity: u32,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CartItem {
    /// `price × quantity` for this line.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.price.times(self.quantity)
    }
}

/// A saved product in the wishlist. Wishlist entries carry no quantity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WishlistItem {
    pub id: ProductId,
    pub name: String,
    pub price: Price,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl WishlistItem {
    /// A cart line for this saved product with a quantity of one.
    #[must_use]
    pub fn to_cart_item(&self) -> CartItem {
        CartItem {
            id: self.id.clone(),
            name: self.name.clone(),
            price: self.price,
            image: self.image.clone(),
            quantity: 1,
            extra: self.extra.clone(),
        }
    }
}
