use std::fmt;

use sea_orm::entity::prelude::*;
use sea_orm::sea_query::StringLen;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(24))")]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[sea_orm(string_value = "pending_payment")]
    PendingPayment,
    #[sea_orm(string_value = "pending_acceptance")]
    PendingAcceptance,
    #[sea_orm(string_value = "pending_delivery")]
    PendingDelivery,
    #[sea_orm(string_value = "delivered")]
    Delivered,
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
}

impl OrderStatus {
    /// The only legal edges of the order lifecycle.
    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (self, next),
            (PendingPayment, PendingAcceptance)
                | (PendingPayment, Cancelled)
                | (PendingAcceptance, PendingDelivery)
                | (PendingAcceptance, Cancelled)
                | (PendingDelivery, Delivered)
        )
    }

    /// Money has moved from the student for orders in these states.
    pub fn is_paid(self) -> bool {
        matches!(
            self,
            OrderStatus::PendingAcceptance | OrderStatus::PendingDelivery | OrderStatus::Delivered
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::PendingPayment => "pending_payment",
            OrderStatus::PendingAcceptance => "pending_acceptance",
            OrderStatus::PendingDelivery => "pending_delivery",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub order_no: String,
    pub student_id: Uuid,
    pub merchant_id: Uuid,
    /// Dish subtotal plus delivery fee, before discount.
    pub total_amount: i64,
    /// Fee in force when the order was placed.
    pub delivery_fee: i64,
    pub discount_amount: i64,
    /// `max(0, total_amount - discount_amount)`.
    pub pay_amount: i64,
    pub coupon_id: Option<Uuid>,
    pub status: OrderStatus,
    pub address: String,
    pub remark: Option<String>,
    pub created_at: DateTimeWithTimeZone,
    pub paid_at: Option<DateTimeWithTimeZone>,
    pub finished_at: Option<DateTimeWithTimeZone>,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::students::Entity",
        from = "Column::StudentId",
        to = "super::students::Column::Id"
    )]
    Students,
    #[sea_orm(
        belongs_to = "super::merchants::Entity",
        from = "Column::MerchantId",
        to = "super::merchants::Column::Id"
    )]
    Merchants,
    #[sea_orm(has_many = "super::order_items::Entity")]
    OrderItems,
}

impl Related<super::students::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Students.def()
    }
}

impl Related<super::merchants::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Merchants.def()
    }
}

impl Related<super::order_items::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OrderItems.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::OrderStatus::{self, *};

    #[test]
    fn transition_table_allows_only_lifecycle_edges() {
        let all = [
            PendingPayment,
            PendingAcceptance,
            PendingDelivery,
            Delivered,
            Cancelled,
        ];
        let legal: &[(OrderStatus, OrderStatus)] = &[
            (PendingPayment, PendingAcceptance),
            (PendingPayment, Cancelled),
            (PendingAcceptance, PendingDelivery),
            (PendingAcceptance, Cancelled),
            (PendingDelivery, Delivered),
        ];
        for from in all {
            for to in all {
                assert_eq!(
                    from.can_transition_to(to),
                    legal.contains(&(from, to)),
                    "{from} -> {to}"
                );
            }
        }
    }

    #[test]
    fn terminal_states_have_no_exit() {
        for to in [PendingPayment, PendingAcceptance, PendingDelivery, Delivered, Cancelled] {
            assert!(!Delivered.can_transition_to(to));
            assert!(!Cancelled.can_transition_to(to));
        }
    }
}
