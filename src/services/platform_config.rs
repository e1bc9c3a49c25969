use chrono::Utc;
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::sea_query::LockType;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QuerySelect, Set,
};
use uuid::Uuid;

use crate::{
    entity::platform_config::{
        ActiveModel as ConfigActive, Column as ConfigCol, Entity as PlatformConfig,
    },
    error::{OrderError, OrderResult},
    money,
};

pub const DEFAULT_DELIVERY_FEE: &str = "default_delivery_fee";
pub const DELIVERY_FEE_EARNINGS: &str = "delivery_fee_earnings";

async fn read_amount<C: ConnectionTrait>(conn: &C, key: &str) -> OrderResult<Option<i64>> {
    let row = PlatformConfig::find()
        .filter(ConfigCol::ConfigKey.eq(key))
        .one(conn)
        .await?;
    match row {
        Some(row) => money::parse(&row.config_value)
            .map(Some)
            .ok_or_else(|| OrderError::Config(key.to_string())),
        None => Ok(None),
    }
}

/// Current delivery fee in cents, or `fallback` when the key is unset.
pub async fn delivery_fee<C: ConnectionTrait>(conn: &C, fallback: i64) -> OrderResult<i64> {
    let fee = read_amount(conn, DEFAULT_DELIVERY_FEE).await?.unwrap_or(fallback);
    if fee < 0 {
        return Err(OrderError::Config(DEFAULT_DELIVERY_FEE.to_string()));
    }
    Ok(fee)
}

pub async fn delivery_fee_earnings<C: ConnectionTrait>(conn: &C) -> OrderResult<i64> {
    Ok(read_amount(conn, DELIVERY_FEE_EARNINGS).await?.unwrap_or(0))
}

/// Add `amount` cents to the platform's delivery-fee revenue and return the
/// new total. The row is created on first use.
pub async fn accrue_delivery_fee_earnings<C: ConnectionTrait>(
    conn: &C,
    amount: i64,
) -> OrderResult<i64> {
    let row = PlatformConfig::find()
        .filter(ConfigCol::ConfigKey.eq(DELIVERY_FEE_EARNINGS))
        .lock(LockType::Update)
        .one(conn)
        .await?;

    let now: DateTimeWithTimeZone = Utc::now().into();
    let total = match row {
        Some(row) => {
            let current = money::parse(&row.config_value)
                .ok_or_else(|| OrderError::Config(DELIVERY_FEE_EARNINGS.to_string()))?;
            let total = current + amount;
            let mut active: ConfigActive = row.into();
            active.config_value = Set(money::format(total));
            active.updated_at = Set(now);
            active.update(conn).await?;
            total
        }
        None => {
            ConfigActive {
                id: Set(Uuid::new_v4()),
                config_key: Set(DELIVERY_FEE_EARNINGS.to_string()),
                config_value: Set(money::format(amount)),
                updated_at: Set(now),
            }
            .insert(conn)
            .await?;
            amount
        }
    };
    Ok(total)
}

/// Insert or overwrite a configuration value.
pub async fn set_amount<C: ConnectionTrait>(conn: &C, key: &str, cents: i64) -> OrderResult<()> {
    let row = PlatformConfig::find()
        .filter(ConfigCol::ConfigKey.eq(key))
        .one(conn)
        .await?;
    let now: DateTimeWithTimeZone = Utc::now().into();
    match row {
        Some(row) => {
            let mut active: ConfigActive = row.into();
            active.config_value = Set(money::format(cents));
            active.updated_at = Set(now);
            active.update(conn).await?;
        }
        None => {
            ConfigActive {
                id: Set(Uuid::new_v4()),
                config_key: Set(key.to_string()),
                config_value: Set(money::format(cents)),
                updated_at: Set(now),
            }
            .insert(conn)
            .await?;
        }
    }
    Ok(())
}
