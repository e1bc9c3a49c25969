//! Stock bookkeeping for settled orders.
//!
//! `stock` carries two sentinels: `0` means the dish is not stock-tracked and
//! is never decremented, `-1` means the last tracked unit is gone. Selling
//! exactly the remaining units lands on `-1`, never on `0`.

use sea_orm::sea_query::{Expr, LockType};
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QuerySelect};

use crate::{
    entity::{
        dishes::{self, Column as DishCol, Entity as Dishes, SOLD_OUT_STOCK, UNLIMITED_STOCK},
        order_items::Model as OrderItemModel,
    },
    error::{OrderError, OrderResult},
};

/// Whether `quantity` units can be taken from a dish with this stock value.
pub fn can_fulfil(stock: i32, quantity: i32) -> bool {
    stock == UNLIMITED_STOCK || (stock != SOLD_OUT_STOCK && stock >= quantity)
}

/// Stock after selling `quantity` units; `None` when the dish is untracked or
/// there is not enough left.
pub fn stock_after_sale(stock: i32, quantity: i32) -> Option<i32> {
    if stock == UNLIMITED_STOCK || !can_fulfil(stock, quantity) {
        return None;
    }
    if stock == quantity {
        Some(SOLD_OUT_STOCK)
    } else {
        Some(stock - quantity)
    }
}

/// Decrement stock for every line of a settled order.
pub async fn apply_sale<C: ConnectionTrait>(conn: &C, items: &[OrderItemModel]) -> OrderResult<()> {
    for item in items {
        let dish = Dishes::find_by_id(item.dish_id)
            .lock(LockType::Update)
            .one(conn)
            .await?
            .ok_or(OrderError::DishUnavailable(item.dish_id))?;

        if dish.stock == UNLIMITED_STOCK {
            continue;
        }
        let next = stock_after_sale(dish.stock, item.quantity)
            .ok_or(OrderError::InsufficientStock(dish.id))?;

        let updated = Dishes::update_many()
            .col_expr(DishCol::Stock, Expr::value(next))
            .filter(DishCol::Id.eq(dish.id))
            .filter(DishCol::Stock.eq(dish.stock))
            .exec(conn)
            .await?;
        if updated.rows_affected == 0 {
            return Err(OrderError::InsufficientStock(dish.id));
        }
        tracing::debug!(dish_id = %dish.id, from = dish.stock, to = next, "stock adjusted");
    }
    Ok(())
}

/// Reject dishes that cannot be ordered right now.
pub fn ensure_orderable(dish: &dishes::Model, quantity: i32) -> OrderResult<()> {
    if !dish.is_shelf {
        return Err(OrderError::DishUnavailable(dish.id));
    }
    if !can_fulfil(dish.stock, quantity) {
        return Err(OrderError::InsufficientStock(dish.id));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unlimited_stock_is_untouched() {
        assert_eq!(stock_after_sale(0, 1), None);
        assert_eq!(stock_after_sale(0, 500), None);
        assert!(can_fulfil(0, 500));
    }

    #[test]
    fn selling_the_last_units_marks_sold_out() {
        assert_eq!(stock_after_sale(3, 3), Some(-1));
        assert_eq!(stock_after_sale(1, 1), Some(-1));
    }

    #[test]
    fn partial_sale_decrements() {
        assert_eq!(stock_after_sale(5, 3), Some(2));
    }

    #[test]
    fn sold_out_and_short_stock_cannot_fulfil() {
        assert!(!can_fulfil(-1, 1));
        assert!(!can_fulfil(2, 3));
        assert_eq!(stock_after_sale(2, 3), None);
        assert_eq!(stock_after_sale(-1, 1), None);
    }
}
