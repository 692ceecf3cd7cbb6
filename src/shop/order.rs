//! Order creation.
//!
//! select → validate-inventory → process-payment → send-notification → finalize.
//! No stage in this flow declines; an order always completes unless a
//! stage faults.

use rand::Rng;
use tokio::time::Instant;
use tracing::{info, warn};

use super::outcome::{OrderResult, Report, TransactionStatus};
use super::state::{Phase, TransactionState};
use super::{latency, rules, Endpoint, Shop};
use crate::error::ShopResult;
use crate::observability::attributes::{
    InventoryAttributes, NotificationAttributes, OrderAttributes, PaymentAttributes,
};
use crate::observability::SpanHandle;

const VALIDATE_INVENTORY: &str = "validate-inventory";
const PROCESS_PAYMENT: &str = "process-payment";
const SEND_NOTIFICATION: &str = "send-notification";

impl Shop {
    /// Create an order for a random user and one to three random products.
    pub async fn create_order<R: Rng + Send>(&self, rng: &mut R) -> ShopResult<Report> {
        let started = Instant::now();
        let endpoint = Endpoint::Orders;
        self.record_request(endpoint);

        let result = self
            .tracer
            .with_span(None, endpoint.span_name(), move |root| self.run_order(root, rng))
            .await;
        self.reporter.order(endpoint, started, result)
    }

    async fn run_order<R: Rng + Send>(
        &self,
        root: SpanHandle,
        rng: &mut R,
    ) -> ShopResult<OrderResult> {
        let user = self.catalog.pick_random_user(rng).clone();
        let items = self
            .catalog
            .pick_random_products(rng, 1, 3)
            .into_iter()
            .cloned()
            .collect();
        let mut state = TransactionState::new(user, items);
        let order_id = rules::order_id(rng);

        root.record(&OrderAttributes {
            order_id,
            user_id: state.user.id,
            total: state.subtotal,
            items_count: state.items.len(),
        });
        info!(order_id, user = %state.user.name, total = %state.subtotal, "Creating order");

        state.advance(Phase::Validating);
        let span = root.child(VALIDATE_INVENTORY);
        span.clone()
            .scope(self.validate_inventory(&span, &state, order_id, rng))
            .await?;

        state.advance(Phase::Charging);
        let span = root.child(PROCESS_PAYMENT);
        span.clone()
            .scope(self.process_payment(&span, &state, order_id, rng))
            .await?;
        state.payment_approved = true;

        state.advance(Phase::Notifying);
        let span = root.child(SEND_NOTIFICATION);
        span.clone()
            .scope(self.send_notification(&span, &state, order_id, rng))
            .await?;

        state.advance(Phase::Completed);
        Ok(OrderResult {
            order_id,
            user: state.user.name.clone(),
            items: state.item_names(),
            total: rules::round_money(state.subtotal),
            status: TransactionStatus::Completed,
        })
    }

    async fn validate_inventory<R: Rng + Send>(
        &self,
        span: &SpanHandle,
        state: &TransactionState,
        order_id: u32,
        rng: &mut R,
    ) -> ShopResult<()> {
        latency::simulate(self.settings.latency.inventory, rng).await;
        span.record(&InventoryAttributes {
            items_checked: state.items.len(),
            all_available: true,
        });
        info!(order_id, items = state.items.len(), "Inventory validated");
        Ok(())
    }

    async fn process_payment<R: Rng + Send>(
        &self,
        span: &SpanHandle,
        state: &TransactionState,
        order_id: u32,
        rng: &mut R,
    ) -> ShopResult<()> {
        let delay = latency::simulate(self.settings.latency.payment, rng).await;
        let duration_ms = delay.as_micros() as f64 / 1000.0;
        span.record(&PaymentAttributes {
            amount: state.subtotal,
            method: "credit_card",
            duration_ms,
        });
        if rules::is_slow(delay, self.settings.slow_payment_threshold_ms) {
            warn!(order_id, duration_ms = duration_ms.round(), "Slow payment processing detected");
        }
        info!(order_id, amount = %state.subtotal, "Payment processed");
        Ok(())
    }

    async fn send_notification<R: Rng + Send>(
        &self,
        span: &SpanHandle,
        state: &TransactionState,
        order_id: u32,
        rng: &mut R,
    ) -> ShopResult<()> {
        latency::simulate(self.settings.latency.notification, rng).await;
        span.record(&NotificationAttributes {
            channel: "email",
            recipient: state.user.email.clone(),
        });
        info!(order_id, email = %state.user.email, "Order confirmation sent");
        Ok(())
    }
}
