//! Wallet movements between students, merchants and the platform.
//!
//! Debits are single conditional updates; zero rows affected means the
//! balance was short.

use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter};
use uuid::Uuid;

use crate::{
    entity::{
        merchants::{Column as MerchantCol, Entity as Merchants},
        orders::Model as OrderModel,
        students::{Column as StudentCol, Entity as Students},
    },
    error::{OrderError, OrderResult},
    services::platform_config,
};

/// How a payment is split between merchant and platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Posting {
    /// `pay_amount - delivery_fee`, not clamped at zero.
    pub merchant_credit: i64,
    pub platform_credit: i64,
}

pub fn split(pay_amount: i64, delivery_fee: i64) -> Posting {
    Posting {
        merchant_credit: pay_amount - delivery_fee,
        platform_credit: delivery_fee,
    }
}

/// Take `amount` from a student's wallet, failing without any change when
/// the balance is short.
pub async fn debit_student<C: ConnectionTrait>(
    conn: &C,
    student_id: Uuid,
    amount: i64,
) -> OrderResult<()> {
    let result = Students::update_many()
        .col_expr(StudentCol::Wallet, Expr::col(StudentCol::Wallet).sub(amount))
        .filter(StudentCol::Id.eq(student_id))
        .filter(StudentCol::Wallet.gte(amount))
        .exec(conn)
        .await?;
    if result.rows_affected == 0 {
        return Err(OrderError::InsufficientFunds);
    }
    Ok(())
}

pub async fn credit_student<C: ConnectionTrait>(
    conn: &C,
    student_id: Uuid,
    amount: i64,
) -> OrderResult<()> {
    let result = Students::update_many()
        .col_expr(StudentCol::Wallet, Expr::col(StudentCol::Wallet).add(amount))
        .filter(StudentCol::Id.eq(student_id))
        .exec(conn)
        .await?;
    if result.rows_affected == 0 {
        return Err(OrderError::StudentNotFound);
    }
    Ok(())
}

/// Take `amount` back from a merchant; never drives the balance negative.
pub async fn debit_merchant<C: ConnectionTrait>(
    conn: &C,
    merchant_id: Uuid,
    amount: i64,
) -> OrderResult<()> {
    let result = Merchants::update_many()
        .col_expr(MerchantCol::Wallet, Expr::col(MerchantCol::Wallet).sub(amount))
        .filter(MerchantCol::Id.eq(merchant_id))
        .filter(MerchantCol::Wallet.gte(amount))
        .exec(conn)
        .await?;
    if result.rows_affected == 0 {
        return Err(OrderError::InsufficientMerchantFunds);
    }
    Ok(())
}

/// Credit the merchant and the platform for a paid order, splitting on the
/// delivery fee captured when the order was placed.
pub async fn post_settlement<C: ConnectionTrait>(
    conn: &C,
    order: &OrderModel,
) -> OrderResult<Posting> {
    let posting = split(order.pay_amount, order.delivery_fee);

    Merchants::update_many()
        .col_expr(
            MerchantCol::Wallet,
            Expr::col(MerchantCol::Wallet).add(posting.merchant_credit),
        )
        .filter(MerchantCol::Id.eq(order.merchant_id))
        .exec(conn)
        .await?;

    let earnings =
        platform_config::accrue_delivery_fee_earnings(conn, posting.platform_credit).await?;

    tracing::debug!(
        order_id = %order.id,
        merchant_credit = posting.merchant_credit,
        platform_credit = posting.platform_credit,
        platform_total = earnings,
        "settlement posted"
    );
    Ok(posting)
}

/// Move the full paid amount from the merchant back to the student.
pub async fn reverse_payment<C: ConnectionTrait>(conn: &C, order: &OrderModel) -> OrderResult<()> {
    debit_merchant(conn, order.merchant_id, order.pay_amount).await?;
    credit_student(conn, order.student_id, order.pay_amount).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::split;

    #[test]
    fn split_balances_to_pay_amount() {
        let posting = split(8_500, 500);
        assert_eq!(posting.merchant_credit, 8_000);
        assert_eq!(posting.platform_credit, 500);
        assert_eq!(posting.merchant_credit + posting.platform_credit, 8_500);
    }

    #[test]
    fn split_never_clamps_merchant_credit() {
        let posting = split(200, 500);
        assert_eq!(posting.merchant_credit, -300);
        assert_eq!(posting.merchant_credit + posting.platform_credit, 200);
    }
}
