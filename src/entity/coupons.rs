use sea_orm::entity::prelude::*;
use sea_orm::sea_query::StringLen;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "snake_case")]
pub enum CouponKind {
    /// `value` cents off once `min_spend` is reached.
    #[sea_orm(string_value = "flat")]
    Flat,
    /// `value` is a 0-10 multiplier in hundredths: 850 pays 85% of the subtotal.
    #[sea_orm(string_value = "percentage")]
    Percentage,
    /// Like `Flat` with `min_spend` forced to zero.
    #[sea_orm(string_value = "no_threshold")]
    NoThreshold,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "coupons")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub merchant_id: Uuid,
    pub coupon_name: String,
    pub coupon_type: CouponKind,
    pub value: i64,
    pub min_spend: i64,
    pub total: i32,
    pub used: i32,
    pub start_time: DateTimeWithTimeZone,
    pub end_time: DateTimeWithTimeZone,
    pub is_active: bool,
    pub created_at: DateTimeWithTimeZone,
}

impl Model {
    pub fn is_within_window(&self, now: DateTimeWithTimeZone) -> bool {
        self.start_time <= now && now <= self.end_time
    }

    pub fn has_supply(&self) -> bool {
        self.used < self.total
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::merchants::Entity",
        from = "Column::MerchantId",
        to = "super::merchants::Column::Id"
    )]
    Merchants,
    #[sea_orm(has_many = "super::user_coupons::Entity")]
    UserCoupons,
}

impl Related<super::merchants::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Merchants.def()
    }
}

impl Related<super::user_coupons::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::UserCoupons.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
