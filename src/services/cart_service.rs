use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use rust_decimal::Decimal;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::{
    models::{
        cart::{is_valid_unit_price, CartItem, Product, ProductId, MAX_UNIT_PRICE},
        pricing::PricingResult,
    },
    services::{pricing_service, session_service::SessionEndListener},
    storage::KeyValueStore,
};

#[derive(Error, Debug, PartialEq, Eq)]
pub enum CartError {
    #[error("Quantity must be at least 1, got {quantity}")]
    InvalidQuantity { quantity: u32 },
    #[error("Unit price {unit_price} is outside 0..={max}")]
    InvalidPrice { unit_price: Decimal, max: Decimal },
}

pub type SubscriptionId = u64;

type Subscriber = Box<dyn Fn(&[CartItem]) + Send + Sync>;

/// The session's cart: ordered line items, mirrored to a `KeyValueStore` after every
/// mutation.
///
/// Invariants: product ids are unique and every quantity is at least 1. Persistence
/// failures are logged and swallowed, the in-memory cart stays authoritative.
pub struct CartStore {
    store: Arc<dyn KeyValueStore>,
    key: String,
    items: Mutex<Vec<CartItem>>,
    subscribers: Mutex<Vec<(SubscriptionId, Subscriber)>>,
    next_subscription: AtomicU64,
}

impl CartStore {
    /// Empty cart bound to `key`; nothing is read until `load`.
    pub fn new(store: Arc<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
            items: Mutex::new(Vec::new()),
            subscribers: Mutex::new(Vec::new()),
            next_subscription: AtomicU64::new(1),
        }
    }

    /// `new` followed by `load`.
    pub fn open(store: Arc<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        let cart = Self::new(store, key);
        cart.load();
        cart
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Replace the in-memory cart with the persisted record. Missing or unreadable
    /// records give an empty cart; this never fails.
    pub fn load(&self) {
        let items = match self.store.get(&self.key) {
            Ok(Some(raw)) => parse_record(&raw),
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!("Failed to read cart '{}': {}", self.key, e);
                Vec::new()
            }
        };

        debug!("Loaded {} cart lines from '{}'", items.len(), self.key);
        let snapshot = {
            let mut guard = self.lock_items();
            *guard = items;
            guard.clone()
        };
        self.notify(&snapshot);
    }

    /// Add `quantity` of `product`, merging into an existing line for the same id.
    pub fn add(&self, product: Product, quantity: u32) -> Result<CartItem, CartError> {
        if quantity == 0 {
            warn!("Rejected add of product {} with quantity 0", product.id);
            return Err(CartError::InvalidQuantity { quantity });
        }
        if !is_valid_unit_price(product.unit_price) {
            warn!(
                "Rejected add of product {} priced {}",
                product.id, product.unit_price
            );
            return Err(CartError::InvalidPrice {
                unit_price: product.unit_price,
                max: MAX_UNIT_PRICE,
            });
        }

        let product_id = product.id;
        let (line, snapshot) = {
            let mut items = self.lock_items();
            let line = match items.iter_mut().find(|item| item.product_id == product_id) {
                Some(existing) => {
                    existing.quantity = existing.quantity.saturating_add(quantity);
                    existing.clone()
                }
                None => {
                    let item = CartItem::from_product(product, quantity);
                    items.push(item.clone());
                    item
                }
            };
            (line, items.clone())
        };

        info!(
            "Added {} x product {} (now {})",
            quantity, product_id, line.quantity
        );
        self.commit(&snapshot);
        Ok(line)
    }

    /// Returns whether a line was removed. Unknown ids are a no-op.
    pub fn remove(&self, product_id: ProductId) -> bool {
        let snapshot = {
            let mut items = self.lock_items();
            let before = items.len();
            items.retain(|item| item.product_id != product_id);
            if items.len() == before {
                None
            } else {
                Some(items.clone())
            }
        };

        match snapshot {
            Some(snapshot) => {
                info!("Removed product {} from cart", product_id);
                self.commit(&snapshot);
                true
            }
            None => {
                debug!("Product {} not in cart, nothing to remove", product_id);
                false
            }
        }
    }

    /// Overwrite a line's quantity. Zero or less removes the line; values past
    /// `u32::MAX` are clamped. Returns the updated line, or `None` when the line was
    /// removed or never existed.
    pub fn set_quantity(&self, product_id: ProductId, quantity: i64) -> Option<CartItem> {
        if quantity <= 0 {
            self.remove(product_id);
            return None;
        }

        let quantity = u32::try_from(quantity).unwrap_or(u32::MAX);
        let (line, snapshot) = {
            let mut items = self.lock_items();
            let line = items
                .iter_mut()
                .find(|item| item.product_id == product_id)
                .map(|item| {
                    item.quantity = quantity;
                    item.clone()
                });
            (line, items.clone())
        };

        match line {
            Some(line) => {
                info!("Set product {} quantity to {}", product_id, quantity);
                self.commit(&snapshot);
                Some(line)
            }
            None => {
                debug!("Product {} not in cart, quantity unchanged", product_id);
                None
            }
        }
    }

    /// Empty the cart and delete the persisted record (not an empty record).
    pub fn clear(&self) {
        self.lock_items().clear();

        if let Err(e) = self.store.remove(&self.key) {
            warn!("Failed to remove cart record '{}': {}", self.key, e);
        }

        info!("Cart '{}' cleared", self.key);
        self.notify(&[]);
    }

    pub fn items(&self) -> Vec<CartItem> {
        self.lock_items().clone()
    }

    pub fn get(&self, product_id: ProductId) -> Option<CartItem> {
        self.lock_items()
            .iter()
            .find(|item| item.product_id == product_id)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.lock_items().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock_items().is_empty()
    }

    pub fn total_quantity(&self) -> u64 {
        self.lock_items()
            .iter()
            .map(|item| u64::from(item.quantity))
            .sum()
    }

    pub fn pricing(&self) -> PricingResult {
        pricing_service::price(&self.lock_items())
    }

    /// Register a callback that receives the cart after every change. Callbacks must
    /// not subscribe or unsubscribe from inside the callback.
    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&[CartItem]) + Send + Sync + 'static,
    {
        let id = self.next_subscription.fetch_add(1, Ordering::Relaxed);
        self.lock_subscribers().push((id, Box::new(callback)));
        id
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subscribers = self.lock_subscribers();
        let before = subscribers.len();
        subscribers.retain(|(sub_id, _)| *sub_id != id);
        subscribers.len() != before
    }

    fn commit(&self, snapshot: &[CartItem]) {
        self.persist(snapshot);
        self.notify(snapshot);
    }

    fn persist(&self, snapshot: &[CartItem]) {
        let json_data = match serde_json::to_string(snapshot) {
            Ok(json) => json,
            Err(e) => {
                warn!("Failed to serialize cart '{}': {}", self.key, e);
                return;
            }
        };

        if let Err(e) = self.store.set(&self.key, &json_data) {
            warn!("Failed to persist cart '{}': {}", self.key, e);
        }
    }

    fn notify(&self, snapshot: &[CartItem]) {
        for (_, callback) in self.lock_subscribers().iter() {
            callback(snapshot);
        }
    }

    fn lock_items(&self) -> MutexGuard<'_, Vec<CartItem>> {
        self.items
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn lock_subscribers(&self) -> MutexGuard<'_, Vec<(SubscriptionId, Subscriber)>> {
        self.subscribers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl SessionEndListener for CartStore {
    fn on_session_end(&self) {
        info!("Session ended, clearing cart '{}'", self.key);
        self.clear();
    }
}

/// Decode a persisted cart. Anything that is not a JSON array is dropped whole;
/// inside an array, unreadable entries and zero quantities are skipped and repeated
/// product ids are folded into their first occurrence.
fn parse_record(raw: &str) -> Vec<CartItem> {
    let value: serde_json::Value = match serde_json::from_str(raw) {
        Ok(value) => value,
        Err(e) => {
            debug!("Discarding unparseable cart record: {}", e);
            return Vec::new();
        }
    };

    let entries = match value {
        serde_json::Value::Array(entries) => entries,
        _ => {
            debug!("Discarding cart record that is not a list");
            return Vec::new();
        }
    };

    let mut items: Vec<CartItem> = Vec::with_capacity(entries.len());
    for entry in entries {
        let item: CartItem = match serde_json::from_value(entry) {
            Ok(item) => item,
            Err(e) => {
                debug!("Skipping malformed cart entry: {}", e);
                continue;
            }
        };

        if item.quantity == 0 {
            continue;
        }
        if item.unit_price > MAX_UNIT_PRICE {
            debug!(
                "Skipping cart entry for product {} priced {}",
                item.product_id, item.unit_price
            );
            continue;
        }

        match items.iter_mut().find(|existing| existing.product_id == item.product_id) {
            Some(existing) => existing.quantity = existing.quantity.saturating_add(item.quantity),
            None => items.push(item),
        }
    }

    items
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{InMemoryStore, StorageError};
    use std::sync::atomic::AtomicUsize;

    const KEY: &str = "cart.office.guest";

    fn product(id: ProductId, cents: i64) -> Product {
        Product::new(id, format!("Product {}", id), Decimal::new(cents, 2))
    }

    fn cart() -> (CartStore, Arc<InMemoryStore>) {
        let store = Arc::new(InMemoryStore::new());
        (CartStore::new(store.clone(), KEY), store)
    }

    #[test]
    fn test_readding_increments_quantity() {
        let (cart, _) = cart();
        cart.add(product(7, 1000), 1).unwrap();
        let line = cart.add(product(7, 1000), 3).unwrap();

        assert_eq!(line.quantity, 4);
        assert_eq!(cart.len(), 1);
        assert_eq!(cart.get(7).unwrap().quantity, 4);
    }

    #[test]
    fn test_add_rejects_zero_quantity() {
        let (cart, store) = cart();
        assert_eq!(
            cart.add(product(1, 100), 0),
            Err(CartError::InvalidQuantity { quantity: 0 })
        );
        assert!(cart.is_empty());
        assert!(!store.contains_key(KEY));
    }

    #[test]
    fn test_add_rejects_out_of_range_prices() {
        let (cart, store) = cart();
        let pricey = Product::new(1, "Yacht", Decimal::from_i128_with_scale(10_i128.pow(20), 0));

        assert!(matches!(
            cart.add(pricey, 1),
            Err(CartError::InvalidPrice { .. })
        ));
        assert!(matches!(
            cart.add(Product::new(2, "Rebate", Decimal::new(-100, 2)), 1),
            Err(CartError::InvalidPrice { .. })
        ));
        assert!(cart.is_empty());
        assert!(!store.contains_key(KEY));
    }

    #[test]
    fn test_max_price_at_max_quantity_still_prices() {
        let (cart, _) = cart();
        cart.add(Product::new(1, "Mainframe", MAX_UNIT_PRICE), 1).unwrap();
        cart.set_quantity(1, 4_000_000_000);

        let pricing = cart.pricing();
        assert_eq!(pricing.subtotal, MAX_UNIT_PRICE * Decimal::from(4_000_000_000_u32));
        assert!(pricing.grand_total > pricing.subtotal);
    }

    #[test]
    fn test_set_quantity_zero_removes_line() {
        let (cart, _) = cart();
        cart.add(product(7, 1000), 2).unwrap();

        assert!(cart.set_quantity(7, 0).is_none());
        assert!(cart.get(7).is_none());
        assert!(cart.is_empty());
    }

    #[test]
    fn test_set_quantity_negative_and_unknown() {
        let (cart, _) = cart();
        cart.add(product(1, 100), 2).unwrap();

        assert!(cart.set_quantity(99, 5).is_none());
        assert_eq!(cart.len(), 1);

        assert!(cart.set_quantity(1, -3).is_none());
        assert!(cart.is_empty());
    }

    #[test]
    fn test_set_quantity_clamps_huge_values() {
        let (cart, _) = cart();
        cart.add(product(1, 100), 1).unwrap();
        let line = cart.set_quantity(1, i64::MAX).unwrap();
        assert_eq!(line.quantity, u32::MAX);
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let (cart, _) = cart();
        cart.add(product(1, 100), 1).unwrap();
        assert!(!cart.remove(2));
        assert!(cart.remove(1));
        assert!(!cart.remove(1));
    }

    #[test]
    fn test_clear_removes_record_and_is_idempotent() {
        let (cart, store) = cart();
        cart.add(product(1, 100), 1).unwrap();
        assert!(store.contains_key(KEY));

        cart.clear();
        assert!(cart.is_empty());
        assert!(!store.contains_key(KEY));

        cart.clear();
        assert!(cart.is_empty());
    }

    #[test]
    fn test_display_order_is_insertion_order() {
        let (cart, _) = cart();
        cart.add(product(3, 100), 1).unwrap();
        cart.add(product(1, 100), 1).unwrap();
        cart.add(product(2, 100), 1).unwrap();
        cart.add(product(3, 100), 1).unwrap();

        let ids: Vec<ProductId> = cart.items().iter().map(|i| i.product_id).collect();
        assert_eq!(ids, vec![3, 1, 2]);
    }

    #[test]
    fn test_parse_record_rejects_non_lists() {
        assert!(parse_record("not json").is_empty());
        assert!(parse_record(r#"{"product_id": 1, "quantity": 2}"#).is_empty());
        assert!(parse_record("null").is_empty());
    }

    #[test]
    fn test_parse_record_normalizes_entries() {
        let raw = r#"[
            {"product_id": 1, "name": "Pens", "unit_price": "2.50", "quantity": 2},
            {"product_id": 2, "name": "Ghost", "unit_price": "9.99", "quantity": 0},
            {"name": "No id"},
            "garbage",
            {"product_id": 1, "name": "Pens", "unit_price": "2.50", "quantity": 3},
            {"product_id": 3, "name": "Free sample"}
        ]"#;
        let items = parse_record(raw);

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].product_id, 1);
        assert_eq!(items[0].quantity, 5);
    }

    #[test]
    fn test_parse_record_skips_absurd_prices() {
        let raw = r#"[
            {"product_id": 1, "name": "Broken", "unit_price": "70000000000000000000000000000", "quantity": 1},
            {"product_id": 2, "name": "Paper", "unit_price": "5.00", "quantity": 1}
        ]"#;
        let items = parse_record(raw);

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].product_id, 2);
    }

    #[test]
    fn test_overpriced_record_loads_and_prices_without_panicking() {
        let store = Arc::new(InMemoryStore::new());
        store
            .set(
                KEY,
                r#"[{"product_id": 1, "name": "Broken", "unit_price": "70000000000000000000000000000", "quantity": 3}]"#,
            )
            .unwrap();

        let cart = CartStore::open(store, KEY);
        assert!(cart.is_empty());
        assert_eq!(cart.pricing().grand_total, Decimal::ZERO);
    }

    #[test]
    fn test_missing_price_counts_as_zero() {
        let items = parse_record(r#"[{"product_id": 4, "name": "Mystery", "quantity": 2}]"#);
        assert_eq!(items.len(), 1);
        assert_eq!(pricing_service::subtotal(&items), Decimal::ZERO);
    }

    #[test]
    fn test_subscribers_see_every_mutation() {
        let (cart, _) = cart();
        let calls = Arc::new(AtomicUsize::new(0));
        let last_len = Arc::new(AtomicUsize::new(usize::MAX));

        let id = {
            let calls = calls.clone();
            let last_len = last_len.clone();
            cart.subscribe(move |items| {
                calls.fetch_add(1, Ordering::SeqCst);
                last_len.store(items.len(), Ordering::SeqCst);
            })
        };

        cart.add(product(1, 100), 1).unwrap();
        cart.add(product(2, 100), 1).unwrap();
        cart.set_quantity(2, 5);
        cart.remove(1);
        assert_eq!(calls.load(Ordering::SeqCst), 4);
        assert_eq!(last_len.load(Ordering::SeqCst), 1);

        cart.clear();
        assert_eq!(calls.load(Ordering::SeqCst), 5);
        assert_eq!(last_len.load(Ordering::SeqCst), 0);

        // no-ops don't notify
        cart.remove(42);
        assert_eq!(calls.load(Ordering::SeqCst), 5);

        assert!(cart.unsubscribe(id));
        cart.add(product(1, 100), 1).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 5);
    }

    struct FailingStore;

    impl KeyValueStore for FailingStore {
        fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
            Err(StorageError::IoError(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "denied",
            )))
        }

        fn set(&self, _key: &str, value: &str) -> Result<(), StorageError> {
            Err(StorageError::QuotaExceeded {
                needed: value.len(),
                available: 0,
            })
        }

        fn remove(&self, _key: &str) -> Result<(), StorageError> {
            Err(StorageError::IoError(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "denied",
            )))
        }
    }

    #[test]
    fn test_storage_failures_never_reach_the_caller() {
        let cart = CartStore::open(Arc::new(FailingStore), KEY);
        assert!(cart.is_empty());

        cart.add(product(1, 1999), 2).unwrap();
        assert_eq!(cart.get(1).unwrap().quantity, 2);
        assert_eq!(cart.pricing().subtotal, Decimal::new(3998, 2));

        cart.clear();
        assert!(cart.is_empty());
    }

    #[test]
    fn test_session_end_clears_cart() {
        let (cart, store) = cart();
        cart.add(product(1, 100), 1).unwrap();

        cart.on_session_end();
        assert!(cart.is_empty());
        assert!(!store.contains_key(KEY));
    }
}
