use chrono::Utc;
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::sea_query::{Expr, LockType};
use sea_orm::{
    ColumnTrait, DatabaseTransaction, EntityTrait, QueryFilter, QueryOrder, QuerySelect,
    TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit,
    entity::{
        coupons::{Column as CouponCol, Entity as Coupons},
        order_items::{Column as OrderItemCol, Entity as OrderItems, Model as OrderItemModel},
        orders::{Column as OrderCol, Entity as Orders, Model as OrderModel, OrderStatus},
        students::Entity as Students,
        user_coupons::{Column as UserCouponCol, Entity as UserCoupons},
    },
    error::{OrderError, OrderResult},
    services::{
        coupon_grants::{self, GrantOutcome},
        inventory, ledger,
        order_service::transition,
    },
    state::AppState,
};

/// A committed payment plus the side-channel coupon grant outcome.
#[derive(Debug, Clone)]
pub struct Settlement {
    pub order: OrderModel,
    pub items: Vec<OrderItemModel>,
    pub grants: GrantOutcome,
}

impl Settlement {
    pub fn coupons_granted(&self) -> usize {
        self.grants.granted
    }
}

/// Pay a pending-payment order from the student's wallet.
///
/// Debit, status flip, coupon redemption, merchant/platform credit, stock
/// adjustment and coupon grants commit together. Any failure leaves the order
/// pending payment with no balance or stock changed. A second call for the
/// same order fails with [`OrderError::InvalidOrderState`].
pub async fn settle_payment(state: &AppState, order_id: Uuid) -> OrderResult<Settlement> {
    let txn = state.orm.begin().await?;

    let order = Orders::find_by_id(order_id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(OrderError::OrderNotFound)?;

    let settlement = settle_locked(&txn, order).await?;
    txn.commit().await?;

    let order = &settlement.order;
    tracing::info!(
        order_id = %order.id,
        order_no = %order.order_no,
        pay_amount = order.pay_amount,
        coupons_granted = settlement.coupons_granted(),
        "order paid"
    );
    audit::record(
        &state.orm,
        Some(order.student_id),
        "order_paid",
        "orders",
        serde_json::json!({
            "order_id": order.id,
            "pay_amount": order.pay_amount,
            "coupons_granted": settlement.coupons_granted(),
        }),
    )
    .await;

    Ok(settlement)
}

/// Settlement steps on an order row already locked by `txn`.
pub(crate) async fn settle_locked(
    txn: &DatabaseTransaction,
    order: OrderModel,
) -> OrderResult<Settlement> {
    if order.status != OrderStatus::PendingPayment {
        return Err(OrderError::InvalidOrderState {
            current: order.status,
            requested: OrderStatus::PendingAcceptance,
        });
    }

    Students::find_by_id(order.student_id)
        .one(txn)
        .await?
        .ok_or(OrderError::StudentNotFound)?;
    ledger::debit_student(txn, order.student_id, order.pay_amount).await?;

    let now: DateTimeWithTimeZone = Utc::now().into();
    let order = transition(
        txn,
        &order,
        OrderStatus::PendingAcceptance,
        Some((OrderCol::PaidAt, now)),
    )
    .await?;

    if let Some(coupon_id) = order.coupon_id {
        redeem_coupon(txn, order.student_id, coupon_id, now).await?;
    }

    ledger::post_settlement(txn, &order).await?;

    let items = OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(order.id))
        .order_by_asc(OrderItemCol::CreatedAt)
        .all(txn)
        .await?;
    inventory::apply_sale(txn, &items).await?;

    let grants = coupon_grants::issue_grants_isolated(txn, order.student_id, order.merchant_id).await;

    Ok(Settlement {
        order,
        items,
        grants,
    })
}

/// Mark the student's grant used and count the redemption on the coupon.
async fn redeem_coupon(
    txn: &DatabaseTransaction,
    student_id: Uuid,
    coupon_id: Uuid,
    now: DateTimeWithTimeZone,
) -> OrderResult<()> {
    let grant = UserCoupons::find()
        .filter(UserCouponCol::StudentId.eq(student_id))
        .filter(UserCouponCol::CouponId.eq(coupon_id))
        .filter(UserCouponCol::IsUsed.eq(false))
        .lock(LockType::Update)
        .one(txn)
        .await?
        .ok_or_else(|| OrderError::InvalidCoupon("coupon has already been used".into()))?;

    let marked = UserCoupons::update_many()
        .col_expr(UserCouponCol::IsUsed, Expr::value(true))
        .col_expr(UserCouponCol::UseTime, Expr::value(now))
        .filter(UserCouponCol::Id.eq(grant.id))
        .filter(UserCouponCol::IsUsed.eq(false))
        .exec(txn)
        .await?;
    if marked.rows_affected == 0 {
        return Err(OrderError::InvalidCoupon("coupon has already been used".into()));
    }

    Coupons::update_many()
        .col_expr(CouponCol::Used, Expr::col(CouponCol::Used).add(1))
        .filter(CouponCol::Id.eq(coupon_id))
        .exec(txn)
        .await?;
    Ok(())
}
