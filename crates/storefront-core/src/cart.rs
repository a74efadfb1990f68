//! Cart Domain Model
//!
//! Line items, identity keys and the pure state transitions behind the
//! cart store. Prices use `rust_decimal` and are written to the wire as
//! JSON numbers.

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

/// Identity of a line: two additions with equal keys merge into one line.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LineKey {
    pub id: String,
    pub size: Option<String>,
}

impl LineKey {
    pub fn new(id: impl Into<String>, size: Option<String>) -> Self {
        Self { id: id.into(), size }
    }

    /// Key for a product without size variants
    pub fn plain(id: impl Into<String>) -> Self {
        Self::new(id, None)
    }

    /// Key for a sized variant
    pub fn sized(id: impl Into<String>, size: impl Into<String>) -> Self {
        Self::new(id, Some(size.into()))
    }
}

impl std::fmt::Display for LineKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.size {
            Some(size) => write!(f, "{}/{}", self.id, size),
            None => write!(f, "{}", self.id),
        }
    }
}

/// One distinct product/quantity entry in a cart
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CartLine {
    /// Product ID
    pub id: String,

    /// Display name; older records may lack one
    #[serde(default)]
    pub name: String,

    /// Unit price in major currency units (never negative)
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,

    /// Product image URL
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "empty_string_as_none"
    )]
    pub image: Option<String>,

    /// Size variant
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,

    /// Always >= 1 once stored in a cart
    #[serde(alias = "qty", deserialize_with = "lenient_quantity")]
    pub quantity: u32,
}

impl CartLine {
    pub fn key(&self) -> LineKey {
        LineKey::new(self.id.clone(), self.size.clone())
    }

    pub fn matches(&self, key: &LineKey) -> bool {
        self.id == key.id && self.size == key.size
    }

    /// `price * quantity`
    pub fn subtotal(&self) -> Decimal {
        self.price * Decimal::from(self.quantity)
    }
}

/// An item being added to the cart
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NewLine {
    pub id: String,
    pub name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub size: Option<String>,
    /// Defaults to 1 when absent or zero
    #[serde(default, alias = "qty")]
    pub quantity: Option<u32>,
}

impl NewLine {
    pub fn new(id: impl Into<String>, name: impl Into<String>, price: Decimal) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            price,
            image: None,
            size: None,
            quantity: None,
        }
    }

    pub fn size(mut self, size: impl Into<String>) -> Self {
        self.size = Some(size.into());
        self
    }

    pub fn image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }

    pub fn quantity(mut self, quantity: u32) -> Self {
        self.quantity = Some(quantity);
        self
    }

    pub fn key(&self) -> LineKey {
        LineKey::new(self.id.clone(), self.size.clone())
    }

    fn effective_quantity(&self) -> u32 {
        match self.quantity {
            Some(0) | None => 1,
            Some(q) => q,
        }
    }
}

/// Coerce a numeric quantity: non-finite or `<= 0` yields `None` (remove the
/// line), positive fractions are floored, and values past `u32::MAX` saturate.
pub fn coerce_quantity(value: f64) -> Option<u32> {
    if !value.is_finite() || value <= 0.0 {
        return None;
    }
    let floored = value.floor();
    if floored < 1.0 {
        return None;
    }
    if floored >= f64::from(u32::MAX) {
        return Some(u32::MAX);
    }
    // In range and integral after the checks above.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let quantity = floored as u32;
    Some(quantity)
}

/// Coerce raw form input (e.g. a quantity `<input>`). Unparsable text is
/// treated like a non-finite number.
pub fn parse_quantity(input: &str) -> Option<u32> {
    input.trim().parse::<f64>().ok().and_then(coerce_quantity)
}

/// Ordered list of line items
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CartState {
    lines: Vec<CartLine>,
}

impl CartState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from arbitrary lines, restoring the cart invariants
    pub fn from_lines(lines: Vec<CartLine>) -> Self {
        let mut state = Self { lines };
        state.normalize();
        state
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn into_lines(self) -> Vec<CartLine> {
        self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn get(&self, key: &LineKey) -> Option<&CartLine> {
        self.lines.iter().find(|l| l.matches(key))
    }

    /// Sum of `price * quantity`
    pub fn total(&self) -> Decimal {
        self.lines.iter().map(CartLine::subtotal).sum()
    }

    /// Sum of quantities
    pub fn count(&self) -> u64 {
        self.lines.iter().map(|l| u64::from(l.quantity)).sum()
    }

    /// Merge into an existing line or append a new one
    pub fn add(&mut self, item: NewLine) {
        let quantity = item.effective_quantity();
        let key = item.key();

        if let Some(line) = self.lines.iter_mut().find(|l| l.matches(&key)) {
            line.quantity = line.quantity.saturating_add(quantity);
            return;
        }

        self.lines.push(CartLine {
            id: item.id,
            name: item.name,
            price: item.price.max(Decimal::ZERO),
            image: item.image.filter(|s| !s.is_empty()),
            size: item.size,
            quantity,
        });
    }

    /// Set a line's quantity; an invalid quantity removes the line.
    /// Returns whether the state changed.
    pub fn set_quantity(&mut self, key: &LineKey, quantity: f64) -> bool {
        match coerce_quantity(quantity) {
            None => self.remove(key),
            Some(q) => match self.lines.iter_mut().find(|l| l.matches(key)) {
                Some(line) if line.quantity != q => {
                    line.quantity = q;
                    true
                }
                _ => false,
            },
        }
    }

    /// Remove a line; absent keys are a no-op. Returns whether a line was removed.
    pub fn remove(&mut self, key: &LineKey) -> bool {
        let before = self.lines.len();
        self.lines.retain(|l| !l.matches(key));
        self.lines.len() != before
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Drop zero quantities, clamp negative prices and merge duplicate keys
    /// into their first occurrence.
    pub fn normalize(&mut self) {
        let mut merged: Vec<CartLine> = Vec::with_capacity(self.lines.len());
        for mut line in self.lines.drain(..) {
            if line.quantity == 0 {
                continue;
            }
            line.price = line.price.max(Decimal::ZERO);
            let key = line.key();
            match merged.iter_mut().find(|l| l.matches(&key)) {
                Some(existing) => {
                    existing.quantity = existing.quantity.saturating_add(line.quantity);
                }
                None => merged.push(line),
            }
        }
        self.lines = merged;
    }

    /// Snapshot handed to the checkout flow
    pub fn snapshot(&self) -> CheckoutSnapshot {
        CheckoutSnapshot {
            items: self.lines.clone(),
            total: self.total(),
        }
    }
}

/// Read-only copy of the cart at the moment checkout was opened
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CheckoutSnapshot {
    pub items: Vec<CartLine>,
    #[serde(with = "rust_decimal::serde::float")]
    pub total: Decimal,
}

impl CheckoutSnapshot {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.is_empty()))
}

/// Older carts stored whatever number the quantity input produced.
/// Invalid values become 0 and are dropped by `CartState::normalize`.
fn lenient_quantity<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = f64::deserialize(deserializer)?;
    Ok(coerce_quantity(value).unwrap_or(0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn tee() -> NewLine {
        NewLine::new("tee", "Rooted Tee", dec!(25.00)).size("M")
    }

    #[test]
    fn test_repeated_adds_sum_quantities() {
        let mut cart = CartState::new();
        cart.add(tee());
        cart.add(tee().quantity(3));
        cart.add(tee());

        assert_eq!(cart.len(), 1);
        assert_eq!(cart.get(&LineKey::sized("tee", "M")).unwrap().quantity, 5);
        assert_eq!(cart.count(), 5);
    }

    #[test]
    fn test_sizes_are_distinct_lines() {
        let mut cart = CartState::new();
        cart.add(tee());
        cart.add(NewLine::new("tee", "Rooted Tee", dec!(25.00)).size("L"));
        cart.add(NewLine::new("tee", "Rooted Tee", dec!(25.00)));

        assert_eq!(cart.len(), 3);
    }

    #[test]
    fn test_add_coerces_price_and_quantity() {
        let mut cart = CartState::new();
        cart.add(NewLine::new("gift", "Gift Card", dec!(-4)).quantity(0).image(""));

        let line = &cart.lines()[0];
        assert_eq!(line.price, Decimal::ZERO);
        assert_eq!(line.quantity, 1);
        assert_eq!(line.image, None);
    }

    #[test]
    fn test_invalid_quantity_removes_line() {
        for bad in [0.0, -5.0, f64::NAN, f64::INFINITY, 0.4] {
            let mut cart = CartState::new();
            cart.add(tee());
            assert!(cart.set_quantity(&LineKey::sized("tee", "M"), bad));
            assert!(cart.is_empty(), "quantity {bad} should remove the line");
        }
    }

    #[test]
    fn test_set_quantity_has_no_upper_clamp() {
        let mut cart = CartState::new();
        cart.add(tee());
        cart.set_quantity(&LineKey::sized("tee", "M"), 250.0);
        assert_eq!(cart.count(), 250);

        cart.set_quantity(&LineKey::sized("tee", "M"), 2.9);
        assert_eq!(cart.count(), 2);
    }

    #[test]
    fn test_set_quantity_on_missing_line_is_noop() {
        let mut cart = CartState::new();
        cart.add(tee());
        assert!(!cart.set_quantity(&LineKey::plain("mug"), 3.0));
        assert_eq!(cart.count(), 1);
    }

    #[test]
    fn test_remove_missing_is_noop() {
        let mut cart = CartState::new();
        cart.add(tee());
        let before = cart.clone();

        assert!(!cart.remove(&LineKey::plain("nope")));
        assert_eq!(cart, before);

        assert!(cart.remove(&LineKey::sized("tee", "M")));
        assert!(!cart.remove(&LineKey::sized("tee", "M")));
    }

    #[test]
    fn test_total_tracks_every_mutation() {
        let mut cart = CartState::new();
        cart.add(tee().quantity(2));
        cart.add(NewLine::new("mug", "Mug", dec!(5.50)));
        assert_eq!(cart.total(), dec!(55.50));

        cart.set_quantity(&LineKey::plain("mug"), 3.0);
        assert_eq!(cart.total(), dec!(66.50));

        cart.remove(&LineKey::sized("tee", "M"));
        assert_eq!(cart.total(), dec!(16.50));

        cart.clear();
        assert_eq!(cart.total(), Decimal::ZERO);
    }

    #[test]
    fn test_parse_quantity() {
        assert_eq!(parse_quantity(" 3 "), Some(3));
        assert_eq!(parse_quantity("0"), None);
        assert_eq!(parse_quantity("abc"), None);
        assert_eq!(parse_quantity("1e12"), Some(u32::MAX));
    }

    #[test]
    fn test_legacy_script_records_deserialize() {
        let json = r#"[
            {"id":"soap","name":"Soap","price":8,"image":"","qty":2},
            {"id":"soap","name":"Soap","price":8,"image":"","qty":1},
            {"id":"salt","name":"Salt","price":4.5,"qty":-1}
        ]"#;
        let lines: Vec<CartLine> = serde_json::from_str(json).unwrap();
        let cart = CartState::from_lines(lines);

        assert_eq!(cart.len(), 1);
        let soap = cart.get(&LineKey::plain("soap")).unwrap();
        assert_eq!(soap.quantity, 3);
        assert_eq!(soap.image, None);
    }

    #[test]
    fn test_state_serializes_as_sequence() {
        let mut cart = CartState::new();
        cart.add(tee());
        let value = serde_json::to_value(&cart).unwrap();
        assert!(value.is_array());
        assert_eq!(value[0]["price"], serde_json::json!(25.0));
        assert_eq!(value[0]["quantity"], serde_json::json!(1));
    }
}
