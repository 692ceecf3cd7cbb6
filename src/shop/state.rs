//! Per-request transaction state.
//!
//! Owned by exactly one request flow and mutated in place by successive
//! stages. Never shared, so no locking.

use rust_decimal::Decimal;

use crate::catalog::{Product, User};

/// Where a transaction is in its pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Selecting,
    Validating,
    Discounting,
    Taxing,
    Charging,
    Notifying,
    Shipping,
    Declined,
    Completed,
}

impl Phase {
    pub fn is_terminal(self) -> bool {
        matches!(self, Phase::Declined | Phase::Completed)
    }

    /// Whether `next` may directly follow `self`.
    pub fn can_advance_to(self, next: Phase) -> bool {
        use Phase::*;
        matches!(
            (self, next),
            (Selecting, Validating)
                | (Validating, Discounting)
                | (Validating, Charging)
                | (Discounting, Taxing)
                | (Taxing, Charging)
                | (Charging, Declined)
                | (Charging, Shipping)
                | (Charging, Notifying)
                | (Shipping, Completed)
                | (Notifying, Completed)
        )
    }
}

#[derive(Debug, Clone)]
pub struct TransactionState {
    pub user: User,
    pub items: Vec<Product>,
    /// Sum of item prices, reduced in place by any discount.
    pub subtotal: Decimal,
    pub discount_percent: u32,
    pub tax: Decimal,
    pub payment_approved: bool,
    pub tracking_id: Option<String>,
    phase: Phase,
}

impl TransactionState {
    pub fn new(user: User, items: Vec<Product>) -> Self {
        let subtotal = items.iter().map(|p| p.price).sum();
        Self {
            user,
            items,
            subtotal,
            discount_percent: 0,
            tax: Decimal::ZERO,
            payment_approved: false,
            tracking_id: None,
            phase: Phase::Selecting,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn advance(&mut self, next: Phase) {
        debug_assert!(
            self.phase.can_advance_to(next),
            "invalid transition {:?} -> {:?}",
            self.phase,
            next
        );
        tracing::trace!(from = ?self.phase, to = ?next, "Transaction phase changed");
        self.phase = next;
    }

    /// Post-discount subtotal plus tax, unrounded.
    pub fn total(&self) -> Decimal {
        self.subtotal + self.tax
    }

    pub fn item_names(&self) -> Vec<String> {
        self.items.iter().map(|p| p.name.clone()).collect()
    }
}
