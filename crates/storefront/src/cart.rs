//! Cart and wishlist state.
//!
//! [`CartStore`] owns the two ordered collections, applies mutations, and
//! writes the affected collection back to storage before returning. Totals
//! and counts are derived on demand and never stored.
//!
//! # Persistence
//!
//! A mutation that changes nothing (removing an absent id, re-adding a
//! wishlisted product) skips the write. When a write fails the in-memory
//! change is kept and the error is returned as a warning: storage is a
//! best-effort cache, so memory and disk may differ until the next
//! successful write.

use driphub_core::{CartItem, Price, Product, ProductId, WishlistItem};
use tracing::{debug, warn};

use crate::error::add_breadcrumb;
use crate::persist;
use crate::storage::{CART_KEY, SharedStore, StorageError, WISHLIST_KEY};

/// In-memory cart and wishlist, synchronized to a [`KeyValueStore`](crate::storage::KeyValueStore).
pub struct CartStore {
    store: SharedStore,
    cart: Vec<CartItem>,
    wishlist: Vec<WishlistItem>,
}

impl CartStore {
    /// Hydrate both collections from `store`.
    ///
    /// Missing or malformed stored data yields an empty collection.
    #[must_use]
    pub fn load(store: SharedStore) -> Self {
        let cart: Vec<CartItem> = persist::load_list(store.as_ref(), CART_KEY);
        let wishlist: Vec<WishlistItem> = persist::load_list(store.as_ref(), WISHLIST_KEY);
        debug!(
            cart_lines = cart.len(),
            wishlist_items = wishlist.len(),
            "hydrated cart state"
        );

        Self {
            store,
            cart,
            wishlist,
        }
    }

    /// Cart lines in insertion order.
    #[must_use]
    pub fn cart(&self) -> &[CartItem] {
        &self.cart
    }

    /// Wishlist entries in insertion order.
    #[must_use]
    pub fn wishlist(&self) -> &[WishlistItem] {
        &self.wishlist
    }

    // =========================================================================
    // Cart mutations
    // =========================================================================

    /// Add one unit of `product`.
    ///
    /// An existing line for the same id has its quantity incremented;
    /// otherwise a new line with quantity 1 is appended.
    ///
    /// # Errors
    ///
    /// Returns the storage error if the cart could not be written. The line
    /// is added regardless.
    pub fn add_to_cart(&mut self, product: &Product) -> Result<(), StorageError> {
        if let Some(line) = self.cart.iter_mut().find(|line| line.id == product.id) {
            line.quantity = line.quantity.saturating_add(1);
        } else {
            self.cart.push(product.to_cart_item());
        }

        add_breadcrumb(
            "cart",
            "Added to cart",
            &[("product_id", product.id.as_str())],
        );
        self.persist_cart()
    }

    /// Remove the line for `id`. Absent ids are ignored.
    ///
    /// # Errors
    ///
    /// Returns the storage error if the cart could not be written.
    pub fn remove_from_cart(&mut self, id: &ProductId) -> Result<(), StorageError> {
        let before = self.cart.len();
        self.cart.retain(|line| &line.id != id);
        if self.cart.len() == before {
            return Ok(());
        }

        add_breadcrumb("cart", "Removed from cart", &[("product_id", id.as_str())]);
        self.persist_cart()
    }

    /// Set the quantity of the line for `id`.
    ///
    /// Quantities below 1 are raised to 1; use [`remove_from_cart`](Self::remove_from_cart)
    /// to drop a line. Absent ids are ignored.
    ///
    /// # Errors
    ///
    /// Returns the storage error if the cart could not be written.
    pub fn update_quantity(&mut self, id: &ProductId, quantity: u32) -> Result<(), StorageError> {
        let quantity = quantity.max(1);
        let Some(line) = self.cart.iter_mut().find(|line| &line.id == id) else {
            return Ok(());
        };
        if line.quantity == quantity {
            return Ok(());
        }

        line.quantity = quantity;
        self.persist_cart()
    }

    /// Remove every cart line.
    ///
    /// # Errors
    ///
    /// Returns the storage error if the cart could not be written.
    pub fn clear_cart(&mut self) -> Result<(), StorageError> {
        if self.cart.is_empty() {
            return Ok(());
        }
        self.cart.clear();
        self.persist_cart()
    }

    // =========================================================================
    // Wishlist mutations
    // =========================================================================

    /// Save `product` to the wishlist unless it is already there.
    ///
    /// # Errors
    ///
    /// Returns the storage error if the wishlist could not be written.
    pub fn add_to_wishlist(&mut self, product: &Product) -> Result<(), StorageError> {
        if self.is_in_wishlist(&product.id) {
            return Ok(());
        }

        self.wishlist.push(product.to_wishlist_item());
        add_breadcrumb(
            "wishlist",
            "Added to wishlist",
            &[("product_id", product.id.as_str())],
        );
        self.persist_wishlist()
    }

    /// Remove `id` from the wishlist. Absent ids are ignored.
    ///
    /// # Errors
    ///
    /// Returns the storage error if the wishlist could not be written.
    pub fn remove_from_wishlist(&mut self, id: &ProductId) -> Result<(), StorageError> {
        let before = self.wishlist.len();
        self.wishlist.retain(|item| &item.id != id);
        if self.wishlist.len() == before {
            return Ok(());
        }
        self.persist_wishlist()
    }

    /// Move a wishlisted product into the cart.
    ///
    /// Returns `Ok(false)` if `id` is not in the wishlist.
    ///
    /// # Errors
    ///
    /// Returns the first storage error hit while writing either collection.
    /// Both in-memory changes are kept.
    pub fn move_to_cart(&mut self, id: &ProductId) -> Result<bool, StorageError> {
        let Some(pos) = self.wishlist.iter().position(|item| &item.id == id) else {
            return Ok(false);
        };
        let item = self.wishlist.remove(pos);

        if let Some(line) = self.cart.iter_mut().find(|line| line.id == item.id) {
            line.quantity = line.quantity.saturating_add(1);
        } else {
            self.cart.push(item.to_cart_item());
        }

        let wishlist_result = self.persist_wishlist();
        let cart_result = self.persist_cart();
        wishlist_result.and(cart_result).map(|()| true)
    }

    // =========================================================================
    // Derived values
    // =========================================================================

    /// Sum of `price × quantity` over every cart line, unrounded.
    #[must_use]
    pub fn cart_total(&self) -> Price {
        self.cart.iter().map(CartItem::line_total).sum()
    }

    /// Number of distinct cart lines (badge counter).
    #[must_use]
    pub fn cart_count(&self) -> usize {
        self.cart.len()
    }

    /// Number of wishlist entries (badge counter).
    #[must_use]
    pub fn wishlist_count(&self) -> usize {
        self.wishlist.len()
    }

    /// Sum of quantities over every cart line.
    #[must_use]
    pub fn total_quantity(&self) -> u64 {
        self.cart.iter().map(|line| u64::from(line.quantity)).sum()
    }

    /// Quantity of `id` in the cart, or 0.
    #[must_use]
    pub fn cart_quantity_of(&self, id: &ProductId) -> u32 {
        self.cart
            .iter()
            .find(|line| &line.id == id)
            .map_or(0, |line| line.quantity)
    }

    /// Whether `id` is saved in the wishlist.
    #[must_use]
    pub fn is_in_wishlist(&self, id: &ProductId) -> bool {
        self.wishlist.iter().any(|item| &item.id == id)
    }

    // =========================================================================
    // Persistence
    // =========================================================================

    fn persist_cart(&self) -> Result<(), StorageError> {
        persist::save_list(self.store.as_ref(), CART_KEY, &self.cart).inspect_err(|e| {
            warn!(error = %e, "failed to persist cart, keeping in-memory state");
        })
    }

    fn persist_wishlist(&self) -> Result<(), StorageError> {
        persist::save_list(self.store.as_ref(), WISHLIST_KEY, &self.wishlist).inspect_err(|e| {
            warn!(error = %e, "failed to persist wishlist, keeping in-memory state");
        })
    }
}

impl std::fmt::Debug for CartStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartStore")
            .field("cart", &self.cart)
            .field("wishlist", &self.wishlist)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::storage::{KeyValueStore, MemoryStore};

    fn product(id: &str, price: &str) -> Product {
        Product::new(id, format!("Product {id}"), Price::parse(price).unwrap())
    }

    fn fresh() -> (Arc<MemoryStore>, CartStore) {
        let store = Arc::new(MemoryStore::new());
        let cart = CartStore::load(store.clone());
        (store, cart)
    }

    #[test]
    fn test_add_twice_accumulates_quantity() {
        let (_, mut cart) = fresh();
        let p = product("1", "10");

        cart.add_to_cart(&p).unwrap();
        cart.add_to_cart(&p).unwrap();

        assert_eq!(cart.cart_count(), 1);
        assert_eq!(cart.cart()[0].quantity, 2);
        assert_eq!(cart.cart_quantity_of(&p.id), 2);
    }

    #[test]
    fn test_wishlist_add_is_idempotent() {
        let (_, mut cart) = fresh();
        let p = product("1", "10");

        cart.add_to_wishlist(&p).unwrap();
        cart.add_to_wishlist(&p).unwrap();

        assert_eq!(cart.wishlist_count(), 1);
        assert!(cart.is_in_wishlist(&p.id));
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let (_, mut cart) = fresh();
        cart.add_to_cart(&product("1", "10")).unwrap();
        let before = cart.cart().to_vec();

        cart.remove_from_cart(&ProductId::new("missing")).unwrap();
        cart.remove_from_wishlist(&ProductId::new("missing")).unwrap();

        assert_eq!(cart.cart(), before.as_slice());
    }

    #[test]
    fn test_total_and_counts() {
        let (_, mut cart) = fresh();
        let shirt = product("shirt", "10");
        let socks = product("socks", "5.50");
        cart.add_to_cart(&shirt).unwrap();
        cart.add_to_cart(&shirt).unwrap();
        cart.add_to_cart(&socks).unwrap();

        assert_eq!(cart.cart_total(), Price::parse("25.50").unwrap());
        assert_eq!(cart.cart_total().to_string(), "25.50");
        assert_eq!(cart.cart_count(), 2);
        assert_eq!(cart.total_quantity(), 3);
    }

    #[test]
    fn test_update_quantity_clamps_to_one() {
        let (_, mut cart) = fresh();
        let p = product("1", "10");
        cart.add_to_cart(&p).unwrap();

        cart.update_quantity(&p.id, 5).unwrap();
        assert_eq!(cart.cart_quantity_of(&p.id), 5);

        cart.update_quantity(&p.id, 0).unwrap();
        assert_eq!(cart.cart_quantity_of(&p.id), 1);
    }

    #[test]
    fn test_update_quantity_absent_is_noop() {
        let (store, mut cart) = fresh();
        cart.update_quantity(&ProductId::new("ghost"), 3).unwrap();
        assert!(cart.cart().is_empty());
        assert_eq!(store.get(CART_KEY).unwrap(), None);
    }

    #[test]
    fn test_round_trip_through_storage() {
        let (store, mut cart) = fresh();
        cart.add_to_cart(&product("b", "2")).unwrap();
        cart.add_to_cart(&product("a", "1")).unwrap();
        cart.add_to_cart(&product("b", "2")).unwrap();
        cart.update_quantity(&ProductId::new("a"), 4).unwrap();
        cart.add_to_wishlist(&product("w", "9.99")).unwrap();
        cart.add_to_wishlist(&product("v", "1")).unwrap();
        cart.remove_from_wishlist(&ProductId::new("w")).unwrap();

        let reloaded = CartStore::load(store);
        assert_eq!(reloaded.cart(), cart.cart());
        assert_eq!(reloaded.wishlist(), cart.wishlist());
        let ids: Vec<&str> = reloaded.cart().iter().map(|l| l.id.as_str()).collect();
        assert_eq!(ids, ["b", "a"]);
    }

    #[test]
    fn test_corrupt_storage_loads_empty() {
        let store = Arc::new(MemoryStore::new());
        store.set(CART_KEY, "definitely not json").unwrap();
        store.set(WISHLIST_KEY, "[{\"id\": 1}]").unwrap();

        let cart = CartStore::load(store);
        assert!(cart.cart().is_empty());
        assert!(cart.wishlist().is_empty());
    }

    #[test]
    fn test_reads_legacy_numeric_ids() {
        let store = Arc::new(MemoryStore::new());
        store
            .set(
                CART_KEY,
                r#"[{"id":1,"name":"Tee","price":10,"image":"/tee.png","quantity":2}]"#,
            )
            .unwrap();

        let cart = CartStore::load(store);
        assert_eq!(cart.cart_quantity_of(&ProductId::new("1")), 2);
    }

    #[test]
    fn test_write_failure_keeps_memory_state() {
        let store = Arc::new(MemoryStore::with_quota(16));
        let mut cart = CartStore::load(store.clone());

        let result = cart.add_to_cart(&product("1", "10"));

        assert!(matches!(result, Err(StorageError::QuotaExceeded { .. })));
        assert_eq!(cart.cart_count(), 1);
        assert_eq!(store.get(CART_KEY).unwrap(), None);
    }

    #[test]
    fn test_move_to_cart() {
        let (_, mut cart) = fresh();
        let p = product("1", "10");
        cart.add_to_wishlist(&p).unwrap();

        assert!(cart.move_to_cart(&p.id).unwrap());
        assert!(!cart.is_in_wishlist(&p.id));
        assert_eq!(cart.cart_quantity_of(&p.id), 1);

        assert!(!cart.move_to_cart(&p.id).unwrap());
    }

    #[test]
    fn test_clear_cart() {
        let (store, mut cart) = fresh();
        cart.add_to_cart(&product("1", "10")).unwrap();
        cart.clear_cart().unwrap();

        assert_eq!(cart.cart_total(), Price::ZERO);
        assert_eq!(store.get(CART_KEY).unwrap().as_deref(), Some("[]"));
    }
}
