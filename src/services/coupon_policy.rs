//! Discount math. Pure: nothing here touches the database or marks a
//! coupon as used.

use rust_decimal::Decimal;

use crate::{
    entity::coupons::{CouponKind, Model as CouponModel},
    money,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CouponPolicy {
    NoCoupon,
    Applied {
        kind: CouponKind,
        /// Cents for flat/no-threshold, hundredths of the 0-10 multiplier for
        /// percentage.
        value: i64,
        min_spend: i64,
    },
}

impl CouponPolicy {
    pub fn from_coupon(coupon: &CouponModel) -> Self {
        let min_spend = match coupon.coupon_type {
            CouponKind::NoThreshold => 0,
            CouponKind::Flat | CouponKind::Percentage => coupon.min_spend,
        };
        CouponPolicy::Applied {
            kind: coupon.coupon_type,
            value: coupon.value,
            min_spend,
        }
    }

    /// Whether the coupon takes effect for this dish subtotal.
    pub fn applies_to(&self, subtotal: i64) -> bool {
        match *self {
            CouponPolicy::NoCoupon => false,
            CouponPolicy::Applied { min_spend, .. } => subtotal >= min_spend,
        }
    }

    /// Discount in cents, always within `0..=subtotal`.
    pub fn discount(&self, subtotal: i64) -> i64 {
        if subtotal <= 0 || !self.applies_to(subtotal) {
            return 0;
        }
        let CouponPolicy::Applied { kind, value, .. } = *self else {
            return 0;
        };
        let raw = match kind {
            CouponKind::Flat | CouponKind::NoThreshold => value.min(subtotal),
            CouponKind::Percentage => {
                let rate = Decimal::ONE - money::to_decimal(value) / Decimal::TEN;
                money::from_decimal(money::to_decimal(subtotal) * rate).unwrap_or(0)
            }
        };
        raw.clamp(0, subtotal)
    }
}

/// Amounts for one order before it is persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quote {
    pub subtotal: i64,
    pub delivery_fee: i64,
    pub discount: i64,
    pub total_amount: i64,
    pub pay_amount: i64,
    pub coupon_applied: bool,
}

pub fn quote(subtotal: i64, delivery_fee: i64, policy: &CouponPolicy) -> Quote {
    let discount = policy.discount(subtotal);
    let total_amount = subtotal + delivery_fee;
    Quote {
        subtotal,
        delivery_fee,
        discount,
        total_amount,
        pay_amount: (total_amount - discount).max(0),
        coupon_applied: policy.applies_to(subtotal),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn applied(kind: CouponKind, value: i64, min_spend: i64) -> CouponPolicy {
        CouponPolicy::Applied {
            kind,
            value,
            min_spend,
        }
    }

    #[test]
    fn no_coupon_means_no_discount() {
        let q = quote(10_000, 500, &CouponPolicy::NoCoupon);
        assert_eq!(q.discount, 0);
        assert_eq!(q.pay_amount, 10_500);
        assert!(!q.coupon_applied);
    }

    #[test]
    fn flat_coupon_over_threshold() {
        let q = quote(10_000, 500, &applied(CouponKind::Flat, 2_000, 5_000));
        assert_eq!(q.discount, 2_000);
        assert_eq!(q.total_amount, 10_500);
        assert_eq!(q.pay_amount, 8_500);
        assert!(q.coupon_applied);
    }

    #[test]
    fn min_spend_not_reached_is_a_silent_no_op() {
        let q = quote(3_000, 500, &applied(CouponKind::Flat, 2_000, 5_000));
        assert_eq!(q.discount, 0);
        assert_eq!(q.pay_amount, 3_500);
        assert!(!q.coupon_applied);
    }

    #[test]
    fn flat_discount_is_capped_at_subtotal() {
        let policy = applied(CouponKind::NoThreshold, 5_000, 0);
        assert_eq!(policy.discount(1_200), 1_200);
        let q = quote(1_200, 300, &policy);
        assert_eq!(q.pay_amount, 300);
    }

    #[test]
    fn percentage_uses_ten_point_scale() {
        let q = quote(20_000, 500, &applied(CouponKind::Percentage, 850, 0));
        assert_eq!(q.discount, 3_000);
        assert_eq!(q.pay_amount, 17_500);
    }

    #[test]
    fn percentage_rounds_to_cents() {
        // 9.99 * 0.15 = 1.4985
        assert_eq!(applied(CouponKind::Percentage, 850, 0).discount(999), 150);
    }

    #[test]
    fn out_of_range_percentage_stays_within_subtotal() {
        assert_eq!(applied(CouponKind::Percentage, 1_200, 0).discount(1_000), 0);
        assert_eq!(applied(CouponKind::Percentage, -500, 0).discount(1_000), 1_000);
    }

    #[test]
    fn negative_flat_value_never_adds_to_the_bill() {
        assert_eq!(applied(CouponKind::Flat, -300, 0).discount(1_000), 0);
    }

    #[test]
    fn no_threshold_ignores_stored_min_spend() {
        let now = chrono::Utc::now().into();
        let coupon = CouponModel {
            id: uuid::Uuid::new_v4(),
            merchant_id: uuid::Uuid::new_v4(),
            coupon_name: "welcome".into(),
            coupon_type: CouponKind::NoThreshold,
            value: 300,
            min_spend: 10_000,
            total: 10,
            used: 0,
            start_time: now,
            end_time: now,
            is_active: true,
            created_at: now,
        };
        let policy = CouponPolicy::from_coupon(&coupon);
        assert_eq!(policy.discount(1_000), 300);
    }

    #[test]
    fn pay_amount_matches_total_minus_discount() {
        let policies = [
            CouponPolicy::NoCoupon,
            applied(CouponKind::Flat, 2_000, 5_000),
            applied(CouponKind::NoThreshold, 99_999, 0),
            applied(CouponKind::Percentage, 500, 1_000),
        ];
        for policy in policies {
            for subtotal in [0, 1, 999, 5_000, 123_456] {
                let q = quote(subtotal, 250, &policy);
                assert_eq!(q.pay_amount, (q.total_amount - q.discount).max(0));
                assert!(q.discount >= 0 && q.discount <= subtotal);
            }
        }
    }
}
