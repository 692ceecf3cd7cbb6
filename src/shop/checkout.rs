//! Checkout.
//!
//! validate-cart → apply-discounts → calculate-tax → charge-payment →
//! create-shipment, all under a `checkout-flow` span. The charge stage is
//! the only one that can decline; a decline skips shipment.

use rand::Rng;
use tokio::time::Instant;
use tracing::{error, info};

use super::outcome::{CheckoutOutcome, CheckoutResult, DeclinedCheckout, Report, TransactionStatus};
use super::state::{Phase, TransactionState};
use super::{latency, rules, Endpoint, Shop};
use crate::error::{ShopError, ShopResult};
use crate::observability::attributes::{
    CartAttributes, ChargeAttributes, CheckoutAttributes, DiscountAttributes, ShipmentAttributes,
    TaxAttributes,
};
use crate::observability::SpanHandle;

const CHECKOUT_FLOW: &str = "checkout-flow";
const VALIDATE_CART: &str = "validate-cart";
const APPLY_DISCOUNTS: &str = "apply-discounts";
const CALCULATE_TAX: &str = "calculate-tax";
const CHARGE_PAYMENT: &str = "charge-payment";
const CREATE_SHIPMENT: &str = "create-shipment";

impl Shop {
    /// Check out a random user with one to four random products.
    ///
    /// A declined payment yields a 402 report, not an error.
    pub async fn checkout<R: Rng + Send>(&self, rng: &mut R) -> ShopResult<Report> {
        let started = Instant::now();
        let endpoint = Endpoint::Checkout;
        self.record_request(endpoint);

        let result = self
            .tracer
            .with_span(None, endpoint.span_name(), move |root| self.run_checkout(root, rng))
            .await;
        self.reporter.checkout(endpoint, started, result)
    }

    async fn run_checkout<R: Rng + Send>(
        &self,
        root: SpanHandle,
        rng: &mut R,
    ) -> ShopResult<CheckoutOutcome> {
        let user = self.catalog.pick_random_user(rng).clone();
        let items = self
            .catalog
            .pick_random_products(rng, 1, 4)
            .into_iter()
            .cloned()
            .collect();
        self.check_out_cart(root, TransactionState::new(user, items), rng)
            .await
    }

    async fn check_out_cart<R: Rng + Send>(
        &self,
        root: SpanHandle,
        mut state: TransactionState,
        rng: &mut R,
    ) -> ShopResult<CheckoutOutcome> {
        info!(
            user = %state.user.name,
            cart_size = state.items.len(),
            tier = %state.user.tier,
            "Checkout started"
        );

        let flow = root.child(CHECKOUT_FLOW);
        flow.clone()
            .scope(self.checkout_flow(&flow, &mut state, rng))
            .await
    }

    async fn checkout_flow<R: Rng + Send>(
        &self,
        flow: &SpanHandle,
        state: &mut TransactionState,
        rng: &mut R,
    ) -> ShopResult<CheckoutOutcome> {
        flow.record(&CheckoutAttributes {
            user_id: state.user.id,
            user_tier: state.user.tier,
            subtotal: state.subtotal,
        });

        state.advance(Phase::Validating);
        let span = flow.child(VALIDATE_CART);
        span.clone().scope(self.validate_cart(&span, state, rng)).await?;

        state.advance(Phase::Discounting);
        let span = flow.child(APPLY_DISCOUNTS);
        span.clone().scope(self.apply_discounts(&span, state, rng)).await?;

        state.advance(Phase::Taxing);
        let span = flow.child(CALCULATE_TAX);
        span.clone().scope(self.calculate_tax(&span, state, rng)).await?;

        state.advance(Phase::Charging);
        let span = flow.child(CHARGE_PAYMENT);
        let approved = span.clone().scope(self.charge_payment(&span, state, rng)).await?;
        state.payment_approved = approved;

        if !state.payment_approved {
            state.advance(Phase::Declined);
            flow.mark_failed("Checkout failed - payment declined", None);
            return Ok(CheckoutOutcome::Declined(DeclinedCheckout {
                user: state.user.name.clone(),
                amount: rules::round_money(state.total()),
            }));
        }

        state.advance(Phase::Shipping);
        let span = flow.child(CREATE_SHIPMENT);
        let tracking = span.clone().scope(self.create_shipment(&span, rng)).await?;
        state.tracking_id = Some(tracking.clone());

        state.advance(Phase::Completed);
        Ok(CheckoutOutcome::Completed(CheckoutResult {
            user: state.user.name.clone(),
            items: state.item_names(),
            subtotal: rules::round_money(state.subtotal),
            tax: rules::round_money(state.tax),
            total: rules::round_money(state.total()),
            tracking,
            status: TransactionStatus::Completed,
        }))
    }

    async fn validate_cart<R: Rng + Send>(
        &self,
        span: &SpanHandle,
        state: &TransactionState,
        rng: &mut R,
    ) -> ShopResult<()> {
        if state.items.is_empty() {
            return Err(ShopError::Stage {
                stage: VALIDATE_CART,
                message: "cart is empty".to_string(),
            });
        }
        latency::simulate(self.settings.latency.cart, rng).await;
        span.record(&CartAttributes {
            items: state.items.len(),
        });
        Ok(())
    }

    async fn apply_discounts<R: Rng + Send>(
        &self,
        span: &SpanHandle,
        state: &mut TransactionState,
        rng: &mut R,
    ) -> ShopResult<()> {
        let tier = state.user.tier;
        let percent = rules::draw_discount(tier, rng);
        if percent > 0 {
            state.subtotal = rules::apply_discount(state.subtotal, percent);
            state.discount_percent = percent;
            span.record(&DiscountAttributes {
                percent,
                reason: rules::discount_reason(tier),
            });
            info!(discount = percent, tier = %tier, "Discount applied");
        }
        latency::simulate(self.settings.latency.discount, rng).await;
        Ok(())
    }

    async fn calculate_tax<R: Rng + Send>(
        &self,
        span: &SpanHandle,
        state: &mut TransactionState,
        rng: &mut R,
    ) -> ShopResult<()> {
        let rate = self.settings.tax_rate;
        state.tax = rules::tax_for(state.subtotal, rate);
        span.record(&TaxAttributes {
            rate,
            amount: state.tax,
        });
        latency::simulate(self.settings.latency.tax, rng).await;
        Ok(())
    }

    /// Returns whether the payment was approved.
    async fn charge_payment<R: Rng + Send>(
        &self,
        span: &SpanHandle,
        state: &TransactionState,
        rng: &mut R,
    ) -> ShopResult<bool> {
        latency::simulate(self.settings.latency.charge, rng).await;
        let total = state.total();
        let declined = rules::payment_declined(rng, self.settings.payment_failure_rate);
        span.record(&ChargeAttributes {
            total,
            currency: "USD",
            declined,
        });
        if declined {
            span.mark_failed("Payment declined", None);
            error!(user = %state.user.name, amount = %total, "Payment failed");
            return Ok(false);
        }
        Ok(true)
    }

    async fn create_shipment<R: Rng + Send>(
        &self,
        span: &SpanHandle,
        rng: &mut R,
    ) -> ShopResult<String> {
        let tracking = rules::tracking_id(rng);
        span.record(&ShipmentAttributes {
            tracking: tracking.clone(),
            carrier: "express",
        });
        latency::simulate(self.settings.latency.shipment, rng).await;
        info!(tracking = %tracking, "Shipment created");
        Ok(tracking)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::data;
    use crate::observability::metrics::{ORDERS_TOTAL, REQUEST_DURATION};
    use crate::observability::{AttributeValue, SpanStatus};
    use crate::shop::testing;
    use crate::shop::{ErrorBody, ResponseBody};
    use rust_decimal::Decimal;

    const STAGES: [&str; 5] = [
        VALIDATE_CART,
        APPLY_DISCOUNTS,
        CALCULATE_TAX,
        CHARGE_PAYMENT,
        CREATE_SHIPMENT,
    ];

    #[tokio::test(start_paused = true)]
    async fn test_successful_checkout() {
        let (sink, shop) = testing::shop(testing::settings(0.0));
        let mut rng = shop.request_rng();

        let report = shop.checkout(&mut rng).await.unwrap();
        assert_eq!(report.status.code(), 201);
        let ResponseBody::Checkout(checkout) = report.body else {
            panic!("expected a checkout body");
        };
        assert!((1..=4).contains(&checkout.items.len()));
        assert!(checkout.tracking.starts_with("TRK-"));
        let cent = Decimal::new(1, 2);
        assert!((checkout.tax - checkout.subtotal * Decimal::new(20, 2)).abs() <= cent);
        assert!((checkout.total - (checkout.subtotal + checkout.tax)).abs() <= cent);

        let flow = sink.span_named(CHECKOUT_FLOW).unwrap();
        let root = sink.span_named("POST /api/checkout").unwrap();
        assert_eq!(flow.parent_id, Some(root.span_id));
        assert!(!flow.is_error());
        for stage in STAGES {
            let span = sink.span_named(stage).unwrap();
            assert_eq!(span.parent_id, Some(flow.span_id));
        }
        assert_eq!(
            sink.counter(ORDERS_TOTAL, &[("status", "completed".into())]),
            1
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_declined_checkout_skips_shipment() {
        let (sink, shop) = testing::shop(testing::settings(1.0));
        let (logs, _guard) = testing::capture_logs();
        let mut rng = shop.request_rng();

        let report = shop.checkout(&mut rng).await.unwrap();
        assert_eq!(report.status.code(), 402);
        assert_eq!(report.body, ResponseBody::Error(ErrorBody::new("Payment declined")));

        let charge = sink.span_named(CHARGE_PAYMENT).unwrap();
        assert!(charge.is_error());
        assert_eq!(charge.attribute("error"), Some(&AttributeValue::Bool(true)));

        let flow = sink.span_named(CHECKOUT_FLOW).unwrap();
        assert_eq!(
            flow.status,
            SpanStatus::Error {
                message: "Checkout failed - payment declined".to_string()
            }
        );
        assert!(sink.span_named(CREATE_SHIPMENT).is_none());
        assert!(!sink.span_named("POST /api/checkout").unwrap().is_error());

        assert_eq!(sink.counter_total(ORDERS_TOTAL), 0);
        assert_eq!(sink.histogram_count(REQUEST_DURATION), 1);
        assert!(logs.contents().contains("Payment failed"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_discount_recorded_only_when_applied() {
        let (sink, shop) = testing::shop(testing::settings(0.0));
        for _ in 0..20 {
            let mut rng = shop.request_rng();
            shop.checkout(&mut rng).await.unwrap();
        }

        let spans = sink.spans();
        let checkouts = spans.iter().filter(|s| s.name == CHECKOUT_FLOW);
        for flow in checkouts {
            let discount = spans
                .iter()
                .find(|s| s.name == APPLY_DISCOUNTS && s.parent_id == Some(flow.span_id))
                .unwrap();
            let tier = flow.attribute("checkout.user_tier").unwrap().to_string();
            match discount.attribute("discount.percent") {
                Some(AttributeValue::Int(p)) if tier == "premium" => {
                    assert!([10, 15, 20].contains(p));
                    assert_eq!(
                        discount.attribute("discount.reason"),
                        Some(&AttributeValue::Str("premium_tier".into()))
                    );
                }
                Some(AttributeValue::Int(p)) => assert_eq!(*p, 5),
                None => assert_eq!(tier, "standard"),
                other => panic!("unexpected discount attribute {other:?}"),
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_charge_stage_ends_once_per_checkout() {
        let (sink, shop) = testing::shop(testing::settings(0.5));
        for _ in 0..10 {
            let mut rng = shop.request_rng();
            shop.checkout(&mut rng).await.unwrap();
        }
        let spans = sink.spans();
        let charges = spans.iter().filter(|s| s.name == CHARGE_PAYMENT).count();
        let shipments = spans.iter().filter(|s| s.name == CREATE_SHIPMENT).count();
        let declined = spans
            .iter()
            .filter(|s| s.name == CHARGE_PAYMENT && s.is_error())
            .count();
        assert_eq!(charges, 10);
        assert_eq!(shipments + declined, 10);
        assert_eq!(sink.counter_total(ORDERS_TOTAL) as usize, shipments);
    }

    #[tokio::test(start_paused = true)]
    async fn test_checkout_duration_covers_stage_minimums() {
        for (failure_rate, ships) in [(0.0, true), (1.0, false)] {
            let (sink, shop) = testing::shop(testing::settings(failure_rate));
            let mut rng = shop.request_rng();
            let report = shop.checkout(&mut rng).await.unwrap();
            assert_eq!(report.status.code(), if ships { 201 } else { 402 });

            let latency = &shop.settings().latency;
            let mut floor = latency.cart.min_ms
                + latency.discount.min_ms
                + latency.tax.min_ms
                + latency.charge.min_ms;
            if ships {
                floor += latency.shipment.min_ms;
            }

            let samples =
                sink.histogram(REQUEST_DURATION, &[("endpoint", "/api/checkout".into())]);
            assert_eq!(samples.len(), 1);
            assert!(samples[0] >= floor as f64, "{} < {floor}", samples[0]);
            assert_eq!(sink.span_named(CREATE_SHIPMENT).is_some(), ships);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_stage_fault_fails_every_enclosing_span_once() {
        let (sink, shop) = testing::shop(testing::settings(0.0));
        let mut rng = shop.request_rng();
        let started = Instant::now();
        let empty_cart = TransactionState::new(data::users()[1].clone(), Vec::new());

        let result = shop
            .tracer
            .with_span(None, Endpoint::Checkout.span_name(), |root| {
                shop.check_out_cart(root, empty_cart, &mut rng)
            })
            .await;
        let err = shop
            .reporter
            .checkout(Endpoint::Checkout, started, result)
            .unwrap_err();
        assert!(matches!(err, ShopError::Stage { stage: VALIDATE_CART, .. }));

        let spans = sink.spans();
        for name in [VALIDATE_CART, CHECKOUT_FLOW, "POST /api/checkout"] {
            let matching: Vec<_> = spans.iter().filter(|s| s.name == name).collect();
            assert_eq!(matching.len(), 1, "{name} ended more than once");
            assert_eq!(
                matching[0].status,
                SpanStatus::Error {
                    message: "stage validate-cart failed: cart is empty".to_string()
                },
                "{name}"
            );
        }
        assert_eq!(spans.len(), 3);
        assert!(sink.span_named(APPLY_DISCOUNTS).is_none());

        assert_eq!(sink.histogram_count(REQUEST_DURATION), 1);
        assert_eq!(sink.counter_total(ORDERS_TOTAL), 0);
    }
}
