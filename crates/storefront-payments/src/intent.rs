//! Payment Intent Requests
//!
//! Validation and amount computation for `POST /api/create-payment-intent`.
//! The amount is the sum of `price * quantity * 100` over all items,
//! rounded once after summing.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde_json::Value;
use storefront_core::{Catalog, IntentItem, PaymentIntentRequest};

use crate::error::{PaymentError, Result};

const MINOR_UNITS: Decimal = Decimal::ONE_HUNDRED;

/// Validate a raw request body.
///
/// `items` missing, not an array or empty is `InvalidInput("Invalid items")`;
/// so is any item with a missing or negative price or a quantity below 1.
pub fn parse_request(body: &Value) -> Result<PaymentIntentRequest> {
    let raw_items = body
        .get("items")
        .and_then(Value::as_array)
        .filter(|items| !items.is_empty())
        .ok_or_else(|| PaymentError::InvalidInput("Invalid items".into()))?;

    let mut items = Vec::with_capacity(raw_items.len());
    for (index, raw) in raw_items.iter().enumerate() {
        let item: IntentItem = serde_json::from_value(raw.clone())
            .map_err(|e| PaymentError::InvalidInput(format!("Invalid item {index}: {e}")))?;

        if item.price < Decimal::ZERO {
            return Err(PaymentError::InvalidInput(format!("Invalid item {index}: negative price")));
        }
        if item.quantity == 0 {
            return Err(PaymentError::InvalidInput(format!("Invalid item {index}: quantity must be positive")));
        }
        items.push(item);
    }

    Ok(PaymentIntentRequest { items })
}

/// Amount in minor currency units: `round(sum(price * quantity * 100))`
pub fn compute_amount(items: &[IntentItem]) -> Result<i64> {
    let overflow = || PaymentError::InvalidInput("Order amount is too large".into());

    let mut sum = Decimal::ZERO;
    for item in items {
        let line = item
            .price
            .checked_mul(Decimal::from(item.quantity))
            .and_then(|v| v.checked_mul(MINOR_UNITS))
            .ok_or_else(overflow)?;
        sum = sum.checked_add(line).ok_or_else(overflow)?;
    }

    sum.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .ok_or_else(overflow)
}

/// Replace client-supplied prices with catalog prices.
///
/// Every item must name a known product and, for sized products, a size
/// the product offers.
pub fn apply_catalog_prices(items: &[IntentItem], catalog: &Catalog) -> Result<Vec<IntentItem>> {
    items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            let id = item
                .id
                .as_deref()
                .ok_or_else(|| PaymentError::InvalidInput(format!("Invalid item {index}: missing product id")))?;
            let product = catalog
                .get(id)
                .ok_or_else(|| PaymentError::InvalidInput(format!("Unknown product '{id}'")))?;
            if !product.sizes.is_empty() && !product.offers_size(item.size.as_deref()) {
                return Err(PaymentError::InvalidInput(format!(
                    "Product '{id}' is not available in size {}",
                    item.size.as_deref().unwrap_or("(none)")
                )));
            }

            if product.price != item.price {
                tracing::warn!(
                    product = %id,
                    client_price = %item.price,
                    catalog_price = %product.price,
                    "Client price differs from catalog"
                );
            }

            Ok(IntentItem {
                id: Some(product.id.clone()),
                name: product.name.clone(),
                price: product.price,
                quantity: item.quantity,
                size: item.size.clone(),
            })
        })
        .collect()
}

/// Convert minor units back to a major-unit amount
pub fn from_minor_units(amount: i64) -> Decimal {
    Decimal::new(amount, 2)
}
