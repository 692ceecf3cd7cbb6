//! Typed span attributes.
//!
//! Each stage records a dedicated struct; [`SpanAttributes::key_values`]
//! flattens it into the name/value pairs a trace backend expects.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::fmt;

use crate::catalog::Tier;

/// A single attribute value.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeValue::Str(s) => f.write_str(s),
            AttributeValue::Int(i) => write!(f, "{i}"),
            AttributeValue::Float(x) => write!(f, "{x}"),
            AttributeValue::Bool(b) => write!(f, "{b}"),
        }
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<i64> for AttributeValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<u32> for AttributeValue {
    fn from(value: u32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<usize> for AttributeValue {
    fn from(value: usize) -> Self {
        Self::Int(i64::try_from(value).unwrap_or(i64::MAX))
    }
}

impl From<f64> for AttributeValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for AttributeValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<Decimal> for AttributeValue {
    fn from(value: Decimal) -> Self {
        Self::Float(value.to_f64().unwrap_or_default())
    }
}

/// One attribute as exported.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyValue {
    pub key: &'static str,
    pub value: AttributeValue,
}

impl KeyValue {
    pub fn new(key: &'static str, value: impl Into<AttributeValue>) -> Self {
        Self {
            key,
            value: value.into(),
        }
    }
}

/// A per-stage attribute set.
pub trait SpanAttributes {
    fn key_values(&self) -> Vec<KeyValue>;
}

/// Attributes of an order on the request span.
#[derive(Debug, Clone)]
pub struct OrderAttributes {
    pub order_id: u32,
    pub user_id: u32,
    pub total: Decimal,
    pub items_count: usize,
}

impl SpanAttributes for OrderAttributes {
    fn key_values(&self) -> Vec<KeyValue> {
        vec![
            KeyValue::new("order.id", self.order_id),
            KeyValue::new("order.user_id", self.user_id),
            KeyValue::new("order.total", self.total),
            KeyValue::new("order.items_count", self.items_count),
        ]
    }
}

#[derive(Debug, Clone)]
pub struct InventoryAttributes {
    pub items_checked: usize,
    pub all_available: bool,
}

impl SpanAttributes for InventoryAttributes {
    fn key_values(&self) -> Vec<KeyValue> {
        vec![
            KeyValue::new("inventory.items_checked", self.items_checked),
            KeyValue::new("inventory.all_available", self.all_available),
        ]
    }
}

#[derive(Debug, Clone)]
pub struct PaymentAttributes {
    pub amount: Decimal,
    pub method: &'static str,
    pub duration_ms: f64,
}

impl SpanAttributes for PaymentAttributes {
    fn key_values(&self) -> Vec<KeyValue> {
        vec![
            KeyValue::new("payment.amount", self.amount),
            KeyValue::new("payment.method", self.method),
            KeyValue::new("payment.duration_ms", self.duration_ms),
        ]
    }
}

#[derive(Debug, Clone)]
pub struct NotificationAttributes {
    pub channel: &'static str,
    pub recipient: String,
}

impl SpanAttributes for NotificationAttributes {
    fn key_values(&self) -> Vec<KeyValue> {
        vec![
            KeyValue::new("notification.type", self.channel),
            KeyValue::new("notification.recipient", self.recipient.clone()),
        ]
    }
}

#[derive(Debug, Clone)]
pub struct CheckoutAttributes {
    pub user_id: u32,
    pub user_tier: Tier,
    pub subtotal: Decimal,
}

impl SpanAttributes for CheckoutAttributes {
    fn key_values(&self) -> Vec<KeyValue> {
        vec![
            KeyValue::new("checkout.user_id", self.user_id),
            KeyValue::new("checkout.user_tier", self.user_tier.as_str()),
            KeyValue::new("checkout.subtotal", self.subtotal),
        ]
    }
}

#[derive(Debug, Clone)]
pub struct CartAttributes {
    pub items: usize,
}

impl SpanAttributes for CartAttributes {
    fn key_values(&self) -> Vec<KeyValue> {
        vec![KeyValue::new("cart.items", self.items)]
    }
}

/// Only recorded when a discount actually applies.
#[derive(Debug, Clone)]
pub struct DiscountAttributes {
    pub percent: u32,
    pub reason: &'static str,
}

impl SpanAttributes for DiscountAttributes {
    fn key_values(&self) -> Vec<KeyValue> {
        vec![
            KeyValue::new("discount.percent", self.percent),
            KeyValue::new("discount.reason", self.reason),
        ]
    }
}

#[derive(Debug, Clone)]
pub struct TaxAttributes {
    pub rate: Decimal,
    pub amount: Decimal,
}

impl SpanAttributes for TaxAttributes {
    fn key_values(&self) -> Vec<KeyValue> {
        vec![
            KeyValue::new("tax.rate", self.rate),
            KeyValue::new("tax.amount", self.amount),
        ]
    }
}

#[derive(Debug, Clone)]
pub struct ChargeAttributes {
    pub total: Decimal,
    pub currency: &'static str,
    pub declined: bool,
}

impl SpanAttributes for ChargeAttributes {
    fn key_values(&self) -> Vec<KeyValue> {
        let mut kvs = vec![
            KeyValue::new("payment.total", self.total),
            KeyValue::new("payment.currency", self.currency),
        ];
        if self.declined {
            kvs.push(KeyValue::new("error", true));
        }
        kvs
    }
}

#[derive(Debug, Clone)]
pub struct ShipmentAttributes {
    pub tracking: String,
    pub carrier: &'static str,
}

impl SpanAttributes for ShipmentAttributes {
    fn key_values(&self) -> Vec<KeyValue> {
        vec![
            KeyValue::new("shipment.tracking", self.tracking.clone()),
            KeyValue::new("shipment.carrier", self.carrier),
        ]
    }
}

/// Simulated database query.
#[derive(Debug, Clone)]
pub struct DbQueryAttributes {
    pub system: &'static str,
    pub statement: String,
    pub rows_returned: usize,
}

impl SpanAttributes for DbQueryAttributes {
    fn key_values(&self) -> Vec<KeyValue> {
        vec![
            KeyValue::new("db.system", self.system),
            KeyValue::new("db.statement", self.statement.clone()),
            KeyValue::new("db.rows_returned", self.rows_returned),
        ]
    }
}
