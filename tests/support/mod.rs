#![allow(dead_code)]

use chrono::{Duration, Utc};
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::sea_query::Index;
use sea_orm::{
    ActiveModelTrait, ConnectOptions, ConnectionTrait, Database, EntityTrait, Schema, Set,
};
use uuid::Uuid;

use campus_food_api::{
    entity::{
        Addresses, AuditLogs, CartItems, Coupons, Dishes, Merchants, OrderItems, Orders,
        PlatformConfig, Refunds, Students, UserCoupons, addresses, cart_items,
        coupons::{self, CouponKind},
        dishes, merchants, students, user_coupons,
    },
    services::platform_config::{self, DEFAULT_DELIVERY_FEE},
    state::{AppState, Settings},
};

/// Fresh in-memory database with the full schema.
///
/// A single connection keeps every query on the same SQLite memory database.
pub async fn setup_state() -> anyhow::Result<AppState> {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options
        .max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);
    let orm = Database::connect(options).await?;

    let backend = orm.get_database_backend();
    let schema = Schema::new(backend);
    let tables = [
        schema.create_table_from_entity(Students),
        schema.create_table_from_entity(Merchants),
        schema.create_table_from_entity(Dishes),
        schema.create_table_from_entity(CartItems),
        schema.create_table_from_entity(Addresses),
        schema.create_table_from_entity(Coupons),
        schema.create_table_from_entity(UserCoupons),
        schema.create_table_from_entity(Orders),
        schema.create_table_from_entity(OrderItems),
        schema.create_table_from_entity(Refunds),
        schema.create_table_from_entity(PlatformConfig),
        schema.create_table_from_entity(AuditLogs),
    ];
    for table in &tables {
        orm.execute(backend.build(table)).await?;
    }

    let cart_unique = Index::create()
        .name("uq_cart_items_student_dish")
        .table(CartItems)
        .col(cart_items::Column::StudentId)
        .col(cart_items::Column::DishId)
        .unique()
        .to_owned();
    orm.execute(backend.build(&cart_unique)).await?;

    let grant_unique = Index::create()
        .name("uq_user_coupons_student_coupon")
        .table(UserCoupons)
        .col(user_coupons::Column::StudentId)
        .col(user_coupons::Column::CouponId)
        .unique()
        .to_owned();
    orm.execute(backend.build(&grant_unique)).await?;

    Ok(AppState::new(
        orm,
        Settings {
            default_delivery_fee: 0,
            jwt_secret: "test-secret".into(),
        },
    ))
}

fn now() -> DateTimeWithTimeZone {
    Utc::now().into()
}

pub async fn set_delivery_fee(state: &AppState, cents: i64) -> anyhow::Result<()> {
    platform_config::set_amount(&state.orm, DEFAULT_DELIVERY_FEE, cents).await?;
    Ok(())
}

pub async fn create_student(state: &AppState, wallet: i64) -> anyhow::Result<Uuid> {
    let id = Uuid::new_v4();
    students::ActiveModel {
        id: Set(id),
        student_no: Set(id.simple().to_string()[..12].to_string()),
        name: Set("Test Student".into()),
        wallet: Set(wallet),
        created_at: Set(now()),
    }
    .insert(&state.orm)
    .await?;
    Ok(id)
}

pub async fn create_merchant(state: &AppState, wallet: i64) -> anyhow::Result<Uuid> {
    let merchant = merchants::ActiveModel {
        id: Set(Uuid::new_v4()),
        merchant_name: Set("Test Kitchen".into()),
        is_open: Set(true),
        wallet: Set(wallet),
        created_at: Set(now()),
    }
    .insert(&state.orm)
    .await?;
    Ok(merchant.id)
}

pub async fn create_dish(
    state: &AppState,
    merchant_id: Uuid,
    price: i64,
    stock: i32,
) -> anyhow::Result<Uuid> {
    let dish = dishes::ActiveModel {
        id: Set(Uuid::new_v4()),
        merchant_id: Set(merchant_id),
        dish_name: Set("Fried Rice".into()),
        price: Set(price),
        stock: Set(stock),
        is_shelf: Set(true),
        created_at: Set(now()),
    }
    .insert(&state.orm)
    .await?;
    Ok(dish.id)
}

pub async fn create_address(state: &AppState, student_id: Uuid) -> anyhow::Result<Uuid> {
    let address = addresses::ActiveModel {
        id: Set(Uuid::new_v4()),
        student_id: Set(student_id),
        recipient: Set("Li Lei".into()),
        phone: Set("13800000000".into()),
        campus: Set("East".into()),
        building: Set("Dorm 7".into()),
        detail: Set("Room 302".into()),
        created_at: Set(now()),
    }
    .insert(&state.orm)
    .await?;
    Ok(address.id)
}

/// A running coupon with `total` copies. `value` uses the hundredths scale of
/// the coupon table (`850` is an 8.5 rating).
pub async fn create_coupon(
    state: &AppState,
    merchant_id: Uuid,
    kind: CouponKind,
    value: i64,
    min_spend: i64,
    total: i32,
) -> anyhow::Result<Uuid> {
    let start = now() - Duration::days(1);
    let coupon = coupons::ActiveModel {
        id: Set(Uuid::new_v4()),
        merchant_id: Set(merchant_id),
        coupon_name: Set("Test coupon".into()),
        coupon_type: Set(kind),
        value: Set(value),
        min_spend: Set(min_spend),
        total: Set(total),
        used: Set(0),
        start_time: Set(start),
        end_time: Set(start + Duration::days(30)),
        is_active: Set(true),
        created_at: Set(start),
    }
    .insert(&state.orm)
    .await?;
    Ok(coupon.id)
}

pub async fn grant_coupon(state: &AppState, student_id: Uuid, coupon_id: Uuid) -> anyhow::Result<()> {
    user_coupons::ActiveModel {
        id: Set(Uuid::new_v4()),
        student_id: Set(student_id),
        coupon_id: Set(coupon_id),
        is_used: Set(false),
        use_time: Set(None),
        get_time: Set(now()),
    }
    .insert(&state.orm)
    .await?;
    Ok(())
}

pub async fn deactivate_coupon(state: &AppState, coupon_id: Uuid) -> anyhow::Result<()> {
    let coupon = Coupons::find_by_id(coupon_id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| anyhow::anyhow!("coupon {coupon_id} missing"))?;
    let mut active: coupons::ActiveModel = coupon.into();
    active.is_active = Set(false);
    active.update(&state.orm).await?;
    Ok(())
}

/// Move the coupon's validity window entirely into the past.
pub async fn expire_coupon(state: &AppState, coupon_id: Uuid) -> anyhow::Result<()> {
    let coupon = Coupons::find_by_id(coupon_id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| anyhow::anyhow!("coupon {coupon_id} missing"))?;
    let ended = now() - Duration::days(1);
    let mut active: coupons::ActiveModel = coupon.into();
    active.start_time = Set(ended - Duration::days(7));
    active.end_time = Set(ended);
    active.update(&state.orm).await?;
    Ok(())
}

pub async fn take_off_shelf(state: &AppState, dish_id: Uuid) -> anyhow::Result<()> {
    let dish = Dishes::find_by_id(dish_id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| anyhow::anyhow!("dish {dish_id} missing"))?;
    let mut active: dishes::ActiveModel = dish.into();
    active.is_shelf = Set(false);
    active.update(&state.orm).await?;
    Ok(())
}

pub async fn coupon_used(state: &AppState, coupon_id: Uuid) -> anyhow::Result<i32> {
    Ok(Coupons::find_by_id(coupon_id)
        .one(&state.orm)
        .await?
        .map(|c| c.used)
        .unwrap_or_default())
}

pub async fn student_wallet(state: &AppState, id: Uuid) -> anyhow::Result<i64> {
    Ok(Students::find_by_id(id)
        .one(&state.orm)
        .await?
        .map(|s| s.wallet)
        .unwrap_or_default())
}

pub async fn merchant_wallet(state: &AppState, id: Uuid) -> anyhow::Result<i64> {
    Ok(Merchants::find_by_id(id)
        .one(&state.orm)
        .await?
        .map(|m| m.wallet)
        .unwrap_or_default())
}

pub async fn dish_stock(state: &AppState, id: Uuid) -> anyhow::Result<i32> {
    Ok(Dishes::find_by_id(id)
        .one(&state.orm)
        .await?
        .map(|d| d.stock)
        .unwrap_or_default())
}
