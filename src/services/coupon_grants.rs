//! Hands out coupon copies to a student after a successful payment.

use chrono::Utc;
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseTransaction, DbErr, EntityTrait, QueryFilter, Set,
    TransactionTrait,
};
use uuid::Uuid;

use crate::entity::{
    coupons::{Column as CouponCol, Entity as Coupons},
    user_coupons::{ActiveModel as UserCouponActive, Column as UserCouponCol, Entity as UserCoupons},
};

/// Outcome of grant issuance, kept apart from the payment it follows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GrantOutcome {
    pub granted: usize,
    pub error: Option<String>,
}

/// Grant one copy of each currently running coupon of `merchant_id` that the
/// student does not hold yet and that still has supply. Returns the number of
/// new grants.
pub async fn issue_grants<C: ConnectionTrait>(
    conn: &C,
    student_id: Uuid,
    merchant_id: Uuid,
    now: DateTimeWithTimeZone,
) -> Result<usize, DbErr> {
    let candidates = Coupons::find()
        .filter(CouponCol::MerchantId.eq(merchant_id))
        .filter(CouponCol::IsActive.eq(true))
        .all(conn)
        .await?;

    let mut granted = 0;
    for coupon in candidates
        .iter()
        .filter(|c| c.is_within_window(now) && c.has_supply())
    {
        // The unique (student_id, coupon_id) index turns a duplicate into a no-op.
        let inserted = UserCoupons::insert(UserCouponActive {
            id: Set(Uuid::new_v4()),
            student_id: Set(student_id),
            coupon_id: Set(coupon.id),
            is_used: Set(false),
            use_time: Set(None),
            get_time: Set(now),
        })
        .on_conflict(
            OnConflict::columns([UserCouponCol::StudentId, UserCouponCol::CouponId])
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(conn)
        .await?;
        granted += inserted as usize;
    }
    Ok(granted)
}

/// Run [`issue_grants`] inside a savepoint of `txn`. A failure rolls back the
/// grants only and is reported in the outcome instead of being returned.
pub async fn issue_grants_isolated(
    txn: &DatabaseTransaction,
    student_id: Uuid,
    merchant_id: Uuid,
) -> GrantOutcome {
    match try_issue_in_savepoint(txn, student_id, merchant_id).await {
        Ok(granted) => GrantOutcome {
            granted,
            error: None,
        },
        Err(err) => {
            tracing::warn!(
                error = %err,
                %student_id,
                %merchant_id,
                "coupon grant issuance failed; payment kept"
            );
            GrantOutcome {
                granted: 0,
                error: Some(err.to_string()),
            }
        }
    }
}

async fn try_issue_in_savepoint(
    txn: &DatabaseTransaction,
    student_id: Uuid,
    merchant_id: Uuid,
) -> Result<usize, DbErr> {
    let savepoint = txn.begin().await?;
    match issue_grants(&savepoint, student_id, merchant_id, Utc::now().into()).await {
        Ok(granted) => {
            savepoint.commit().await?;
            Ok(granted)
        }
        Err(err) => {
            savepoint.rollback().await?;
            Err(err)
        }
    }
}
