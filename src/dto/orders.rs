use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    entity::orders::OrderStatus,
    error::OrderError,
    models::{Order, OrderItem},
    services::order_service::{DeliveryAddress, NewOrder},
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateOrderRequest {
    pub merchant_id: Uuid,
    /// Free-text address; ignored when `address_id` is given.
    pub address: Option<String>,
    pub address_id: Option<Uuid>,
    pub coupon_id: Option<Uuid>,
    pub cart_item_ids: Option<Vec<Uuid>>,
    pub initial_status: Option<OrderStatus>,
    pub remark: Option<String>,
}

impl CreateOrderRequest {
    pub fn into_new_order(self, student_id: Uuid) -> Result<NewOrder, OrderError> {
        let address = match (self.address_id, self.address) {
            (Some(id), _) => DeliveryAddress::Saved(id),
            (None, Some(text)) => DeliveryAddress::Text(text),
            (None, None) => return Err(OrderError::AddressNotFound),
        };
        Ok(NewOrder {
            student_id,
            merchant_id: self.merchant_id,
            address,
            coupon_id: self.coupon_id,
            cart_item_ids: self.cart_item_ids,
            initial_status: self.initial_status,
            remark: self.remark,
        })
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateOrderStatusRequest {
    pub status: OrderStatus,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RefundRequest {
    pub reason: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderWithItems {
    pub order: Order,
    pub items: Vec<OrderItem>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PlacedOrderResponse {
    pub order: Order,
    pub items: Vec<OrderItem>,
    pub coupons_granted: usize,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaymentResponse {
    pub success: bool,
    pub order: Order,
    pub coupons_granted: usize,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderList {
    pub items: Vec<Order>,
}
