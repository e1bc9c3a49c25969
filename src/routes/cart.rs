use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, put},
};
use uuid::Uuid;

use crate::{
    dto::cart::{AddToCartRequest, CartLine, CartList, UpdateCartRequest},
    error::AppResult,
    middleware::auth::{AuthUser, ensure_student},
    models::CartItem,
    response::{ApiResponse, Meta},
    services::cart_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(cart_list).post(add_to_cart))
        .route("/{id}", put(update_cart_item).delete(remove_from_cart))
}

#[utoipa::path(
    get,
    path = "/api/cart",
    responses(
        (status = 200, description = "List cart items for current student", body = ApiResponse<CartList>)
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn cart_list(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<CartList>>> {
    ensure_student(&user)?;
    let rows = cart_service::list_cart(&state, user.user_id).await?;
    let total = rows.len();
    let items = rows
        .into_iter()
        .map(|(item, dish)| CartLine {
            item: item.into(),
            dish: dish.into(),
        })
        .collect();

    let meta = Meta::new(1, total as i64, total as u64);
    Ok(Json(ApiResponse::success("OK", CartList { items }, Some(meta))))
}

#[utoipa::path(
    post,
    path = "/api/cart",
    request_body = AddToCartRequest,
    responses(
        (status = 200, description = "Dish added to cart", body = ApiResponse<CartItem>)
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn add_to_cart(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<AddToCartRequest>,
) -> AppResult<Json<ApiResponse<CartItem>>> {
    ensure_student(&user)?;
    let item =
        cart_service::add_to_cart(&state, user.user_id, payload.dish_id, payload.quantity).await?;
    Ok(Json(ApiResponse::ok(item.into())))
}

#[utoipa::path(
    put,
    path = "/api/cart/{id}",
    params(("id" = Uuid, Path, description = "Cart item id")),
    request_body = UpdateCartRequest,
    responses(
        (status = 200, description = "Quantity updated; a quantity below 1 removes the item", body = ApiResponse<CartItem>)
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn update_cart_item(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateCartRequest>,
) -> AppResult<Json<ApiResponse<Option<CartItem>>>> {
    ensure_student(&user)?;
    let item = cart_service::update_cart_quantity(&state, user.user_id, id, payload.quantity).await?;
    Ok(Json(ApiResponse::success("Updated", item.map(Into::into), Some(Meta::empty()))))
}

#[utoipa::path(
    delete,
    path = "/api/cart/{id}",
    params(("id" = Uuid, Path, description = "Cart item id")),
    responses(
        (status = 200, description = "Removed from cart")
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn remove_from_cart(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    ensure_student(&user)?;
    cart_service::remove_cart_item(&state, user.user_id, id).await?;
    Ok(Json(ApiResponse::success(
        "Removed from cart",
        serde_json::json!({}),
        Some(Meta::empty()),
    )))
}
