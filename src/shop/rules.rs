//! Business rules as pure functions of their inputs and an explicit RNG.

use rand::Rng;
use rust_decimal::{Decimal, RoundingStrategy};
use std::time::Duration;

use crate::catalog::Tier;

/// Discount draws for premium users.
pub const PREMIUM_DISCOUNTS: [u32; 3] = [10, 15, 20];

/// Discount draws for standard users; three in four get nothing.
pub const STANDARD_DISCOUNTS: [u32; 4] = [0, 0, 0, 5];

/// Draw a discount percent for a tier.
pub fn draw_discount<R: Rng + ?Sized>(tier: Tier, rng: &mut R) -> u32 {
    match tier {
        Tier::Premium => PREMIUM_DISCOUNTS[rng.gen_range(0..PREMIUM_DISCOUNTS.len())],
        Tier::Standard => STANDARD_DISCOUNTS[rng.gen_range(0..STANDARD_DISCOUNTS.len())],
    }
}

pub fn discount_reason(tier: Tier) -> &'static str {
    match tier {
        Tier::Premium => "premium_tier",
        Tier::Standard => "promo",
    }
}

/// `subtotal * (1 - percent / 100)`.
pub fn apply_discount(subtotal: Decimal, percent: u32) -> Decimal {
    subtotal * (Decimal::ONE - Decimal::from(percent) / Decimal::ONE_HUNDRED)
}

pub fn tax_for(subtotal: Decimal, rate: Decimal) -> Decimal {
    subtotal * rate
}

/// Round half away from zero to cents.
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Independent decline draw with probability `failure_rate`.
pub fn payment_declined<R: Rng + ?Sized>(rng: &mut R, failure_rate: f64) -> bool {
    rng.gen::<f64>() < failure_rate
}

/// `TRK-` followed by six digits.
pub fn tracking_id<R: Rng + ?Sized>(rng: &mut R) -> String {
    format!("TRK-{}", rng.gen_range(100_000..=999_999))
}

/// Five-digit order number.
pub fn order_id<R: Rng + ?Sized>(rng: &mut R) -> u32 {
    rng.gen_range(10_000..=99_999)
}

pub fn is_slow(latency: Duration, threshold_ms: u64) -> bool {
    latency > Duration::from_millis(threshold_ms)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn dec(cents: i64) -> Decimal {
        Decimal::new(cents, 2)
    }

    #[test]
    fn test_premium_discount_scenario() {
        let subtotal = apply_discount(dec(10000), 15);
        assert_eq!(subtotal, dec(8500));

        let tax = tax_for(subtotal, dec(20));
        assert_eq!(tax, dec(1700));
        assert_eq!(round_money(subtotal + tax), dec(10200));
    }

    #[test]
    fn test_zero_discount_leaves_subtotal() {
        assert_eq!(apply_discount(dec(18998), 0), dec(18998));
        assert_eq!(tax_for(dec(18998), dec(20)), Decimal::new(37996, 3));
    }

    #[test]
    fn test_discount_is_deterministic() {
        let subtotal = dec(57997);
        for percent in [5, 10, 15, 20] {
            assert_eq!(apply_discount(subtotal, percent), apply_discount(subtotal, percent));
        }
    }

    #[test]
    fn test_discount_draws_stay_in_tier_sets() {
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..500 {
            assert!(PREMIUM_DISCOUNTS.contains(&draw_discount(Tier::Premium, &mut rng)));
            assert!(STANDARD_DISCOUNTS.contains(&draw_discount(Tier::Standard, &mut rng)));
        }
    }

    #[test]
    fn test_standard_tier_mostly_undiscounted() {
        let mut rng = StdRng::seed_from_u64(11);
        let zero = (0..4000)
            .filter(|_| draw_discount(Tier::Standard, &mut rng) == 0)
            .count();
        assert!((2700..=3300).contains(&zero), "zero draws: {zero}");
    }

    #[test]
    fn test_same_seed_same_draws() {
        let mut a = StdRng::seed_from_u64(5);
        let mut b = StdRng::seed_from_u64(5);
        for _ in 0..20 {
            assert_eq!(draw_discount(Tier::Premium, &mut a), draw_discount(Tier::Premium, &mut b));
            assert_eq!(tracking_id(&mut a), tracking_id(&mut b));
        }
    }

    #[test]
    fn test_rounding_is_half_away_from_zero() {
        assert_eq!(round_money(Decimal::new(10005, 3)), dec(1001));
        assert_eq!(round_money(Decimal::new(10004, 3)), dec(1000));
        assert_eq!(round_money(dec(3999)), dec(3999));
    }

    #[test]
    fn test_decline_probability_edges() {
        let mut rng = StdRng::seed_from_u64(9);
        assert!((0..100).all(|_| !payment_declined(&mut rng, 0.0)));
        assert!((0..100).all(|_| payment_declined(&mut rng, 1.0)));
    }

    #[test]
    fn test_identifier_formats() {
        let mut rng = StdRng::seed_from_u64(21);
        for _ in 0..200 {
            let tracking = tracking_id(&mut rng);
            assert_eq!(tracking.len(), 10);
            assert!(tracking.starts_with("TRK-"));
            assert!(tracking[4..].chars().all(|c| c.is_ascii_digit()));

            assert!((10_000..=99_999).contains(&order_id(&mut rng)));
        }
    }

    #[test]
    fn test_slow_threshold_is_exclusive() {
        assert!(is_slow(Duration::from_millis(180), 150));
        assert!(!is_slow(Duration::from_millis(150), 150));
    }
}
