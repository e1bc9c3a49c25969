use chrono::Utc;
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, ModelTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit,
    entity::{
        cart_items::{ActiveModel as CartActive, Column as CartCol, Entity as CartItems, Model as CartModel},
        dishes::{Entity as Dishes, Model as DishModel},
    },
    error::{OrderError, OrderResult},
    state::AppState,
};

pub async fn list_cart(state: &AppState, student_id: Uuid) -> OrderResult<Vec<(CartModel, DishModel)>> {
    let rows = CartItems::find()
        .find_also_related(Dishes)
        .filter(CartCol::StudentId.eq(student_id))
        .order_by_asc(CartCol::CreatedAt)
        .all(&state.orm)
        .await?;
    Ok(rows
        .into_iter()
        .filter_map(|(cart, dish)| dish.map(|dish| (cart, dish)))
        .collect())
}

/// Add `quantity` units of a dish; an existing row for the same dish grows
/// instead of a second row being created.
pub async fn add_to_cart(
    state: &AppState,
    student_id: Uuid,
    dish_id: Uuid,
    quantity: i32,
) -> OrderResult<CartModel> {
    if quantity < 1 {
        return Err(OrderError::InvalidQuantity);
    }

    let txn = state.orm.begin().await?;
    let dish = Dishes::find_by_id(dish_id)
        .one(&txn)
        .await?
        .filter(|d| d.is_shelf)
        .ok_or(OrderError::DishUnavailable(dish_id))?;

    let existing = CartItems::find()
        .filter(CartCol::StudentId.eq(student_id))
        .filter(CartCol::DishId.eq(dish.id))
        .one(&txn)
        .await?;

    let now: DateTimeWithTimeZone = Utc::now().into();
    let item = match existing {
        Some(item) => {
            let quantity = item.quantity + quantity;
            let mut active: CartActive = item.into();
            active.quantity = Set(quantity);
            active.updated_at = Set(now);
            active.update(&txn).await?
        }
        None => {
            CartActive {
                id: Set(Uuid::new_v4()),
                student_id: Set(student_id),
                dish_id: Set(dish.id),
                quantity: Set(quantity),
                created_at: Set(now),
                updated_at: Set(now),
            }
            .insert(&txn)
            .await?
        }
    };
    txn.commit().await?;

    audit::record(
        &state.orm,
        Some(student_id),
        "cart_update",
        "cart_items",
        serde_json::json!({ "dish_id": dish_id, "quantity": item.quantity }),
    )
    .await;

    Ok(item)
}

/// Set a row's quantity. Anything below 1 deletes the row and returns `None`.
pub async fn update_cart_quantity(
    state: &AppState,
    student_id: Uuid,
    cart_id: Uuid,
    quantity: i32,
) -> OrderResult<Option<CartModel>> {
    let item = CartItems::find_by_id(cart_id)
        .filter(CartCol::StudentId.eq(student_id))
        .one(&state.orm)
        .await?
        .ok_or(OrderError::CartItemNotFound)?;

    let dish_id = item.dish_id;
    let updated = if quantity < 1 {
        item.delete(&state.orm).await?;
        None
    } else {
        if quantity > item.quantity {
            Dishes::find_by_id(dish_id)
                .one(&state.orm)
                .await?
                .filter(|d| d.is_shelf)
                .ok_or(OrderError::DishUnavailable(dish_id))?;
        }
        let mut active: CartActive = item.into();
        active.quantity = Set(quantity);
        active.updated_at = Set(Utc::now().into());
        Some(active.update(&state.orm).await?)
    };

    audit::record(
        &state.orm,
        Some(student_id),
        if updated.is_some() { "cart_update" } else { "cart_remove" },
        "cart_items",
        serde_json::json!({ "cart_id": cart_id, "dish_id": dish_id, "quantity": quantity.max(0) }),
    )
    .await;

    Ok(updated)
}

pub async fn remove_cart_item(state: &AppState, student_id: Uuid, cart_id: Uuid) -> OrderResult<()> {
    let result = CartItems::delete_many()
        .filter(CartCol::Id.eq(cart_id))
        .filter(CartCol::StudentId.eq(student_id))
        .exec(&state.orm)
        .await?;
    if result.rows_affected == 0 {
        return Err(OrderError::CartItemNotFound);
    }

    audit::record(
        &state.orm,
        Some(student_id),
        "cart_remove",
        "cart_items",
        serde_json::json!({ "cart_id": cart_id }),
    )
    .await;
    Ok(())
}
