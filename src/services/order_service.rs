use chrono::{DateTime, Utc};
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::sea_query::{Expr, LockType};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit,
    entity::{
        addresses::{Column as AddressCol, Entity as Addresses},
        cart_items::{Column as CartCol, Entity as CartItems},
        coupons::{Entity as Coupons, Model as CouponModel},
        dishes::{Column as DishCol, Entity as Dishes},
        order_items::{
            ActiveModel as OrderItemActive, Column as OrderItemCol, Entity as OrderItems,
            Model as OrderItemModel,
        },
        orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders, Model as OrderModel, OrderStatus},
        refunds::{self, ActiveModel as RefundActive, Column as RefundCol, Entity as Refunds},
        user_coupons::{Column as UserCouponCol, Entity as UserCoupons},
    },
    error::{OrderError, OrderResult},
    services::{
        coupon_grants::GrantOutcome,
        coupon_policy::{self, CouponPolicy},
        inventory, ledger, payment_service, platform_config,
    },
    state::AppState,
};

const ORDER_NO_ATTEMPTS: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryAddress {
    /// Already formatted by the caller.
    Text(String),
    /// One of the student's saved addresses.
    Saved(Uuid),
}

#[derive(Debug, Clone)]
pub struct NewOrder {
    pub student_id: Uuid,
    pub merchant_id: Uuid,
    pub address: DeliveryAddress,
    pub coupon_id: Option<Uuid>,
    /// Restrict the order to these cart rows; all of the student's rows for
    /// the merchant otherwise.
    pub cart_item_ids: Option<Vec<Uuid>>,
    /// `PendingAcceptance` settles the order in the same transaction.
    pub initial_status: Option<OrderStatus>,
    pub remark: Option<String>,
}

#[derive(Debug, Clone)]
pub struct PlacedOrder {
    pub order: OrderModel,
    pub items: Vec<OrderItemModel>,
    /// Present when the order was settled on creation.
    pub grants: Option<GrantOutcome>,
}

impl PlacedOrder {
    pub fn coupons_granted(&self) -> usize {
        self.grants.as_ref().map_or(0, |g| g.granted)
    }
}

pub fn generate_order_no(now: DateTime<Utc>) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("ORD{}{}", now.format("%Y%m%d"), suffix[..12].to_uppercase())
}

async fn allocate_order_no<C: ConnectionTrait>(conn: &C) -> OrderResult<String> {
    for _ in 0..ORDER_NO_ATTEMPTS {
        let candidate = generate_order_no(Utc::now());
        let taken = Orders::find()
            .filter(OrderCol::OrderNo.eq(candidate.as_str()))
            .count(conn)
            .await?;
        if taken == 0 {
            return Ok(candidate);
        }
        tracing::warn!(order_no = %candidate, "order number collision, retrying");
    }
    Err(DbErr::Custom("could not allocate a unique order number".into()).into())
}

async fn resolve_address<C: ConnectionTrait>(
    conn: &C,
    student_id: Uuid,
    address: &DeliveryAddress,
) -> OrderResult<String> {
    match address {
        DeliveryAddress::Text(text) => {
            let text = text.trim();
            if text.is_empty() {
                return Err(OrderError::AddressNotFound);
            }
            Ok(text.to_string())
        }
        DeliveryAddress::Saved(id) => Addresses::find_by_id(*id)
            .filter(AddressCol::StudentId.eq(student_id))
            .one(conn)
            .await?
            .map(|a| a.formatted())
            .ok_or(OrderError::AddressNotFound),
    }
}

/// The coupon must belong to the merchant, be running, and be held unused by
/// the student.
async fn load_redeemable_coupon<C: ConnectionTrait>(
    conn: &C,
    student_id: Uuid,
    merchant_id: Uuid,
    coupon_id: Uuid,
    now: DateTimeWithTimeZone,
) -> OrderResult<CouponModel> {
    let invalid = |reason: &str| OrderError::InvalidCoupon(reason.to_string());

    let coupon = Coupons::find_by_id(coupon_id)
        .one(conn)
        .await?
        .ok_or_else(|| invalid("coupon does not exist"))?;
    if coupon.merchant_id != merchant_id {
        return Err(invalid("coupon belongs to another merchant"));
    }
    if !coupon.is_active {
        return Err(invalid("coupon is not active"));
    }
    if !coupon.is_within_window(now) {
        return Err(invalid("coupon is outside its validity window"));
    }

    let grant = UserCoupons::find()
        .filter(UserCouponCol::StudentId.eq(student_id))
        .filter(UserCouponCol::CouponId.eq(coupon_id))
        .one(conn)
        .await?
        .ok_or_else(|| invalid("coupon is not held by this student"))?;
    if grant.is_used {
        return Err(invalid("coupon has already been used"));
    }
    Ok(coupon)
}

/// Build an order from the student's cart rows for one merchant.
///
/// The order, its lines and the removal of the consumed cart rows commit
/// together. With `initial_status = PendingAcceptance` the payment is settled
/// inside the same transaction.
pub async fn create_order(state: &AppState, input: NewOrder) -> OrderResult<PlacedOrder> {
    let settle_now = match input.initial_status.unwrap_or(OrderStatus::PendingPayment) {
        OrderStatus::PendingPayment => false,
        OrderStatus::PendingAcceptance => true,
        requested => {
            return Err(OrderError::InvalidOrderState {
                current: OrderStatus::PendingPayment,
                requested,
            });
        }
    };

    let txn = state.orm.begin().await?;
    let address = resolve_address(&txn, input.student_id, &input.address).await?;

    let mut finder = CartItems::find()
        .find_also_related(Dishes)
        .filter(CartCol::StudentId.eq(input.student_id))
        .filter(DishCol::MerchantId.eq(input.merchant_id))
        .order_by_asc(CartCol::CreatedAt);
    if let Some(ids) = input.cart_item_ids.as_ref() {
        finder = finder.filter(CartCol::Id.is_in(ids.iter().copied()));
    }
    let rows = finder.all(&txn).await?;
    if rows.is_empty() {
        return Err(OrderError::EmptyCart);
    }

    let mut lines = Vec::with_capacity(rows.len());
    let mut subtotal: i64 = 0;
    for (cart, dish) in rows {
        let dish = dish.ok_or(OrderError::DishUnavailable(cart.dish_id))?;
        if cart.quantity < 1 {
            return Err(OrderError::InvalidQuantity);
        }
        inventory::ensure_orderable(&dish, cart.quantity)?;
        subtotal = dish
            .price
            .checked_mul(i64::from(cart.quantity))
            .and_then(|line| subtotal.checked_add(line))
            .ok_or(OrderError::AmountOverflow)?;
        lines.push((cart, dish));
    }

    let delivery_fee = platform_config::delivery_fee(&txn, state.settings.default_delivery_fee).await?;
    if subtotal.checked_add(delivery_fee).is_none() {
        return Err(OrderError::AmountOverflow);
    }
    let now: DateTimeWithTimeZone = Utc::now().into();

    let coupon = match input.coupon_id {
        Some(coupon_id) => Some(
            load_redeemable_coupon(&txn, input.student_id, input.merchant_id, coupon_id, now)
                .await?,
        ),
        None => None,
    };
    let policy = coupon
        .as_ref()
        .map(CouponPolicy::from_coupon)
        .unwrap_or(CouponPolicy::NoCoupon);
    let quote = coupon_policy::quote(subtotal, delivery_fee, &policy);
    // A coupon whose threshold is not met is not attached, so it stays usable.
    let coupon_id = coupon.filter(|_| quote.coupon_applied).map(|c| c.id);
    tracing::debug!(
        subtotal = quote.subtotal,
        delivery_fee = quote.delivery_fee,
        discount = quote.discount,
        pay_amount = quote.pay_amount,
        "order quoted"
    );

    let order_no = allocate_order_no(&txn).await?;
    let order = OrderActive {
        id: Set(Uuid::new_v4()),
        order_no: Set(order_no),
        student_id: Set(input.student_id),
        merchant_id: Set(input.merchant_id),
        total_amount: Set(quote.total_amount),
        delivery_fee: Set(quote.delivery_fee),
        discount_amount: Set(quote.discount),
        pay_amount: Set(quote.pay_amount),
        coupon_id: Set(coupon_id),
        status: Set(OrderStatus::PendingPayment),
        address: Set(address),
        remark: Set(input.remark.filter(|r| !r.trim().is_empty())),
        created_at: Set(now),
        paid_at: Set(None),
        finished_at: Set(None),
        updated_at: Set(now),
    }
    .insert(&txn)
    .await?;

    let mut items = Vec::with_capacity(lines.len());
    for (cart, dish) in &lines {
        let item = OrderItemActive {
            id: Set(Uuid::new_v4()),
            order_id: Set(order.id),
            dish_id: Set(dish.id),
            quantity: Set(cart.quantity),
            price: Set(dish.price),
            created_at: Set(now),
        }
        .insert(&txn)
        .await?;
        items.push(item);
    }

    let consumed: Vec<Uuid> = lines.iter().map(|(cart, _)| cart.id).collect();
    let deleted = CartItems::delete_many()
        .filter(CartCol::Id.is_in(consumed.iter().copied()))
        .exec(&txn)
        .await?;
    // Another checkout consumed some of these rows first.
    if deleted.rows_affected != consumed.len() as u64 {
        return Err(OrderError::EmptyCart);
    }

    let placed = if settle_now {
        let settlement = payment_service::settle_locked(&txn, order).await?;
        PlacedOrder {
            order: settlement.order,
            items: settlement.items,
            grants: Some(settlement.grants),
        }
    } else {
        PlacedOrder {
            order,
            items,
            grants: None,
        }
    };

    txn.commit().await?;

    let order = &placed.order;
    tracing::info!(
        order_id = %order.id,
        order_no = %order.order_no,
        status = %order.status,
        pay_amount = order.pay_amount,
        "order created"
    );
    audit::record(
        &state.orm,
        Some(order.student_id),
        "order_created",
        "orders",
        serde_json::json!({
            "order_id": order.id,
            "order_no": order.order_no,
            "status": order.status,
            "coupons_granted": placed.coupons_granted(),
        }),
    )
    .await;

    Ok(placed)
}

/// Move `order` to `next` if the lifecycle allows it and nobody else moved it
/// first. `stamp` sets one extra timestamp column alongside the status.
pub(crate) async fn transition<C: ConnectionTrait>(
    conn: &C,
    order: &OrderModel,
    next: OrderStatus,
    stamp: Option<(OrderCol, DateTimeWithTimeZone)>,
) -> OrderResult<OrderModel> {
    if !order.status.can_transition_to(next) {
        return Err(OrderError::InvalidOrderState {
            current: order.status,
            requested: next,
        });
    }

    let now: DateTimeWithTimeZone = Utc::now().into();
    let mut update = Orders::update_many()
        .col_expr(OrderCol::Status, Expr::value(next))
        .col_expr(OrderCol::UpdatedAt, Expr::value(now));
    if let Some((column, at)) = stamp {
        update = update.col_expr(column, Expr::value(at));
    }
    let result = update
        .filter(OrderCol::Id.eq(order.id))
        .filter(OrderCol::Status.eq(order.status))
        .exec(conn)
        .await?;

    let current = Orders::find_by_id(order.id)
        .one(conn)
        .await?
        .ok_or(OrderError::OrderNotFound)?;
    if result.rows_affected == 0 {
        return Err(OrderError::InvalidOrderState {
            current: current.status,
            requested: next,
        });
    }
    Ok(current)
}

/// Cancel an order. A paid order (pending acceptance) first moves the full
/// paid amount back from the merchant to the student.
pub async fn cancel_order(state: &AppState, order_id: Uuid) -> OrderResult<OrderModel> {
    let txn = state.orm.begin().await?;

    let order = Orders::find_by_id(order_id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(OrderError::OrderNotFound)?;

    let was_paid = order.status == OrderStatus::PendingAcceptance;
    let cancelled = transition(&txn, &order, OrderStatus::Cancelled, None).await?;
    if was_paid {
        ledger::reverse_payment(&txn, &order).await?;
    }

    txn.commit().await?;

    tracing::info!(order_id = %order.id, refunded = was_paid, "order cancelled");
    audit::record(
        &state.orm,
        Some(order.student_id),
        "order_cancelled",
        "orders",
        serde_json::json!({
            "order_id": order.id,
            "refunded_amount": if was_paid { order.pay_amount } else { 0 },
        }),
    )
    .await;

    Ok(cancelled)
}

/// Merchant-side progress: accept (`PendingDelivery`) or deliver
/// (`Delivered`). Payment and cancellation have their own entry points.
pub async fn advance_order_status(
    state: &AppState,
    merchant_id: Uuid,
    order_id: Uuid,
    next: OrderStatus,
) -> OrderResult<OrderModel> {
    let txn = state.orm.begin().await?;

    let order = Orders::find()
        .filter(
            Condition::all()
                .add(OrderCol::Id.eq(order_id))
                .add(OrderCol::MerchantId.eq(merchant_id)),
        )
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(OrderError::OrderNotFound)?;

    let now: DateTimeWithTimeZone = Utc::now().into();
    let stamp = match next {
        OrderStatus::PendingDelivery => None,
        OrderStatus::Delivered => Some((OrderCol::FinishedAt, now)),
        requested => {
            return Err(OrderError::InvalidOrderState {
                current: order.status,
                requested,
            });
        }
    };
    let updated = transition(&txn, &order, next, stamp).await?;
    txn.commit().await?;

    tracing::info!(order_id = %order.id, from = %order.status, to = %next, "order status changed");
    audit::record(
        &state.orm,
        Some(merchant_id),
        "order_status_changed",
        "orders",
        serde_json::json!({ "order_id": order.id, "from": order.status, "to": next }),
    )
    .await;

    Ok(updated)
}

/// Record a refund request for a paid order. One request per order.
pub async fn request_refund(
    state: &AppState,
    student_id: Uuid,
    order_id: Uuid,
    reason: &str,
) -> OrderResult<refunds::Model> {
    let reason = reason.trim();
    if reason.is_empty() {
        return Err(OrderError::MissingRefundReason);
    }

    let txn = state.orm.begin().await?;
    let order = find_student_order(&txn, student_id, order_id).await?;
    if !order.status.is_paid() {
        return Err(OrderError::InvalidOrderState {
            current: order.status,
            requested: OrderStatus::Cancelled,
        });
    }

    let existing = Refunds::find()
        .filter(RefundCol::OrderId.eq(order.id))
        .count(&txn)
        .await?;
    if existing > 0 {
        return Err(OrderError::RefundAlreadyRequested);
    }

    let refund = RefundActive {
        id: Set(Uuid::new_v4()),
        order_id: Set(order.id),
        student_id: Set(student_id),
        refund_amount: Set(order.pay_amount),
        reason: Set(reason.to_string()),
        status: Set(refunds::STATUS_REQUESTED.to_string()),
        created_at: Set(Utc::now().into()),
    }
    .insert(&txn)
    .await?;
    txn.commit().await?;

    audit::record(
        &state.orm,
        Some(student_id),
        "refund_requested",
        "refunds",
        serde_json::json!({ "order_id": order.id, "refund_id": refund.id }),
    )
    .await;

    Ok(refund)
}

async fn find_student_order<C: ConnectionTrait>(
    conn: &C,
    student_id: Uuid,
    order_id: Uuid,
) -> OrderResult<OrderModel> {
    Orders::find()
        .filter(
            Condition::all()
                .add(OrderCol::StudentId.eq(student_id))
                .add(OrderCol::Id.eq(order_id)),
        )
        .one(conn)
        .await?
        .ok_or(OrderError::OrderNotFound)
}

pub async fn get_order(
    state: &AppState,
    student_id: Uuid,
    order_id: Uuid,
) -> OrderResult<(OrderModel, Vec<OrderItemModel>)> {
    let order = find_student_order(&state.orm, student_id, order_id).await?;
    let items = OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(order.id))
        .order_by_asc(OrderItemCol::CreatedAt)
        .all(&state.orm)
        .await?;
    Ok((order, items))
}

/// Newest first. Returns the page and the total row count.
pub async fn list_orders(
    state: &AppState,
    student_id: Uuid,
    status: Option<OrderStatus>,
    limit: u64,
    offset: u64,
) -> OrderResult<(Vec<OrderModel>, u64)> {
    let mut condition = Condition::all().add(OrderCol::StudentId.eq(student_id));
    if let Some(status) = status {
        condition = condition.add(OrderCol::Status.eq(status));
    }

    let finder = Orders::find()
        .filter(condition)
        .order_by_desc(OrderCol::CreatedAt);
    let total = finder.clone().count(&state.orm).await?;
    let orders = finder.limit(limit).offset(offset).all(&state.orm).await?;
    Ok((orders, total))
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn order_numbers_carry_the_date() {
        let day = Utc.with_ymd_and_hms(2026, 3, 9, 12, 0, 0).unwrap();
        let no = generate_order_no(day);
        assert!(no.starts_with("ORD20260309"), "{no}");
        assert_eq!(no.len(), 3 + 8 + 12);
        assert!(no[11..].chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_lowercase()));
    }

    #[test]
    fn order_numbers_do_not_repeat() {
        let now = Utc::now();
        let numbers: std::collections::HashSet<_> =
            (0..1_000).map(|_| generate_order_no(now)).collect();
        assert_eq!(numbers.len(), 1_000);
    }
}
