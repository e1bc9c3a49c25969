use chrono::{Duration, Utc};
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use uuid::Uuid;

use campus_food_api::{
    config::AppConfig,
    db::{OrmConn, create_pool, orm_from_pool, run_migrations},
    entity::{
        coupons::{self, CouponKind},
        dishes, merchants,
        students::{self, Column as StudentCol, Entity as Students},
    },
    services::platform_config::{self, DEFAULT_DELIVERY_FEE, DELIVERY_FEE_EARNINGS},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let pool = create_pool(&config.database_url, 2).await?;
    // Ensure migrations are applied.
    run_migrations(&pool).await?;
    let orm = orm_from_pool(pool);

    let student_id = ensure_student(&orm, "2024000001", "Demo Student", 20_000).await?;
    let merchant_id = seed_merchant(&orm).await?;

    platform_config::set_amount(&orm, DEFAULT_DELIVERY_FEE, config.default_delivery_fee).await?;
    let earnings = platform_config::delivery_fee_earnings(&orm).await?;
    platform_config::set_amount(&orm, DELIVERY_FEE_EARNINGS, earnings).await?;

    println!("Seed completed. Student ID: {student_id}, Merchant ID: {merchant_id}");
    Ok(())
}

async fn ensure_student(
    orm: &OrmConn,
    student_no: &str,
    name: &str,
    wallet: i64,
) -> anyhow::Result<Uuid> {
    if let Some(existing) = Students::find()
        .filter(StudentCol::StudentNo.eq(student_no))
        .one(orm)
        .await?
    {
        println!("Student {student_no} already present");
        return Ok(existing.id);
    }

    let student = students::ActiveModel {
        id: Set(Uuid::new_v4()),
        student_no: Set(student_no.to_string()),
        name: Set(name.to_string()),
        wallet: Set(wallet),
        created_at: Set(Utc::now().into()),
    }
    .insert(orm)
    .await?;

    println!("Ensured student {student_no}");
    Ok(student.id)
}

async fn seed_merchant(orm: &OrmConn) -> anyhow::Result<Uuid> {
    let now: DateTimeWithTimeZone = Utc::now().into();
    let merchant = merchants::ActiveModel {
        id: Set(Uuid::new_v4()),
        merchant_name: Set("North Gate Noodles".into()),
        is_open: Set(true),
        wallet: Set(0),
        created_at: Set(now),
    }
    .insert(orm)
    .await?;

    // (name, price in cents, stock; 0 = untracked)
    let menu = vec![
        ("Beef Noodle Soup", 1_800, 0),
        ("Dumplings (12)", 1_500, 40),
        ("Scallion Pancake", 600, 25),
        ("Soy Milk", 300, 0),
    ];
    for (name, price, stock) in menu {
        dishes::ActiveModel {
            id: Set(Uuid::new_v4()),
            merchant_id: Set(merchant.id),
            dish_name: Set(name.to_string()),
            price: Set(price),
            stock: Set(stock),
            is_shelf: Set(true),
            created_at: Set(now),
        }
        .insert(orm)
        .await?;
    }

    coupons::ActiveModel {
        id: Set(Uuid::new_v4()),
        merchant_id: Set(merchant.id),
        coupon_name: Set("3 off 20".into()),
        coupon_type: Set(CouponKind::Flat),
        value: Set(300),
        min_spend: Set(2_000),
        total: Set(100),
        used: Set(0),
        start_time: Set(now),
        end_time: Set(now + Duration::days(30)),
        is_active: Set(true),
        created_at: Set(now),
    }
    .insert(orm)
    .await?;

    println!("Seeded merchant {} with menu and coupon", merchant.id);
    Ok(merchant.id)
}
