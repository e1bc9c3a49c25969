use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entity::{cart_items, dishes, order_items, orders, orders::OrderStatus, refunds};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Dish {
    pub id: Uuid,
    pub merchant_id: Uuid,
    pub dish_name: String,
    pub price: i64,
    pub stock: i32,
    pub is_shelf: bool,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CartItem {
    pub id: Uuid,
    pub dish_id: Uuid,
    pub quantity: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Order {
    pub id: Uuid,
    pub order_no: String,
    pub student_id: Uuid,
    pub merchant_id: Uuid,
    pub total_amount: i64,
    pub delivery_fee: i64,
    pub discount_amount: i64,
    pub pay_amount: i64,
    pub coupon_id: Option<Uuid>,
    pub status: OrderStatus,
    pub address: String,
    pub remark: Option<String>,
    pub created_at: DateTime<Utc>,
    pub paid_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OrderItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub dish_id: Uuid,
    pub quantity: i32,
    pub price: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Refund {
    pub id: Uuid,
    pub order_id: Uuid,
    pub refund_amount: i64,
    pub reason: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl From<dishes::Model> for Dish {
    fn from(model: dishes::Model) -> Self {
        Self {
            id: model.id,
            merchant_id: model.merchant_id,
            dish_name: model.dish_name,
            price: model.price,
            stock: model.stock,
            is_shelf: model.is_shelf,
        }
    }
}

impl From<cart_items::Model> for CartItem {
    fn from(model: cart_items::Model) -> Self {
        Self {
            id: model.id,
            dish_id: model.dish_id,
            quantity: model.quantity,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}

impl From<orders::Model> for Order {
    fn from(model: orders::Model) -> Self {
        Self {
            id: model.id,
            order_no: model.order_no,
            student_id: model.student_id,
            merchant_id: model.merchant_id,
            total_amount: model.total_amount,
            delivery_fee: model.delivery_fee,
            discount_amount: model.discount_amount,
            pay_amount: model.pay_amount,
            coupon_id: model.coupon_id,
            status: model.status,
            address: model.address,
            remark: model.remark,
            created_at: model.created_at.with_timezone(&Utc),
            paid_at: model.paid_at.map(|dt| dt.with_timezone(&Utc)),
            finished_at: model.finished_at.map(|dt| dt.with_timezone(&Utc)),
        }
    }
}

impl From<order_items::Model> for OrderItem {
    fn from(model: order_items::Model) -> Self {
        Self {
            id: model.id,
            order_id: model.order_id,
            dish_id: model.dish_id,
            quantity: model.quantity,
            price: model.price,
        }
    }
}

impl From<refunds::Model> for Refund {
    fn from(model: refunds::Model) -> Self {
        Self {
            id: model.id,
            order_id: model.order_id,
            refund_amount: model.refund_amount,
            reason: model.reason,
            status: model.status,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}
