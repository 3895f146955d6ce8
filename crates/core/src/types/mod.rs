//! Core types for DripHub.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod line_item;
pub mod price;
pub mod product;
pub mod user;

pub use email::{Email, EmailError};
pub use id::*;
pub use line_item::{CartItem, WishlistItem};
pub use price::{CurrencyCode, Price, PriceError};
pub use product::{Category, Product};
pub use user::UserProfile;
