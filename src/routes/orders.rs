use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post},
};
use sea_orm::EntityTrait;
use uuid::Uuid;

use crate::{
    dto::orders::{
        CreateOrderRequest, OrderList, OrderWithItems, PaymentResponse, PlacedOrderResponse,
        RefundRequest, UpdateOrderStatusRequest,
    },
    entity::Orders,
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ROLE_MERCHANT, ROLE_STUDENT, ensure_merchant, ensure_student},
    models::{Order, Refund},
    response::{ApiResponse, Meta},
    routes::params::OrderListQuery,
    services::{order_service, payment_service},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_orders).post(create_order))
        .route("/{id}", get(get_order))
        .route("/{id}/pay", post(pay_order))
        .route("/{id}/cancel", post(cancel_order))
        .route("/{id}/status", post(update_order_status))
        .route("/{id}/refund", post(request_refund))
}

#[utoipa::path(
    get,
    path = "/api/orders",
    params(OrderListQuery),
    responses((status = 200, description = "Orders of the current student", body = ApiResponse<OrderList>)),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn list_orders(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<OrderListQuery>,
) -> AppResult<Json<ApiResponse<OrderList>>> {
    ensure_student(&user)?;
    let (page, limit, offset) = query.pagination().normalize();
    let (orders, total) =
        order_service::list_orders(&state, user.user_id, query.status, limit as u64, offset as u64)
            .await?;

    let data = OrderList {
        items: orders.into_iter().map(Into::into).collect(),
    };
    let meta = Meta::new(page, limit, total);
    Ok(Json(ApiResponse::success("Ok", data, Some(meta))))
}

#[utoipa::path(
    post,
    path = "/api/orders",
    request_body = CreateOrderRequest,
    responses((status = 200, description = "Order created from the cart", body = ApiResponse<PlacedOrderResponse>)),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn create_order(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateOrderRequest>,
) -> AppResult<Json<ApiResponse<PlacedOrderResponse>>> {
    ensure_student(&user)?;
    let input = payload.into_new_order(user.user_id)?;
    let placed = order_service::create_order(&state, input).await?;

    let coupons_granted = placed.coupons_granted();
    let data = PlacedOrderResponse {
        order: placed.order.into(),
        items: placed.items.into_iter().map(Into::into).collect(),
        coupons_granted,
    };
    Ok(Json(ApiResponse::success("Order created", data, Some(Meta::empty()))))
}

#[utoipa::path(
    get,
    path = "/api/orders/{id}",
    params(("id" = Uuid, Path, description = "Order id")),
    responses((status = 200, description = "Order with its lines", body = ApiResponse<OrderWithItems>)),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn get_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<OrderWithItems>>> {
    ensure_student(&user)?;
    let (order, items) = order_service::get_order(&state, user.user_id, id).await?;
    let data = OrderWithItems {
        order: order.into(),
        items: items.into_iter().map(Into::into).collect(),
    };
    Ok(Json(ApiResponse::ok(data)))
}

#[utoipa::path(
    post,
    path = "/api/orders/{id}/pay",
    params(("id" = Uuid, Path, description = "Order id")),
    responses((status = 200, description = "Order paid from the wallet", body = ApiResponse<PaymentResponse>)),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn pay_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<PaymentResponse>>> {
    ensure_student(&user)?;
    // Ownership first; the settlement itself re-checks status under lock.
    order_service::get_order(&state, user.user_id, id).await?;
    let settlement = payment_service::settle_payment(&state, id).await?;

    let coupons_granted = settlement.coupons_granted();
    let data = PaymentResponse {
        success: true,
        order: settlement.order.into(),
        coupons_granted,
    };
    Ok(Json(ApiResponse::success("Payment recorded", data, Some(Meta::empty()))))
}

#[utoipa::path(
    post,
    path = "/api/orders/{id}/cancel",
    params(("id" = Uuid, Path, description = "Order id")),
    responses((status = 200, description = "Order cancelled", body = ApiResponse<Order>)),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn cancel_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let order = Orders::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    let is_party = match user.role.as_str() {
        ROLE_STUDENT => order.student_id == user.user_id,
        ROLE_MERCHANT => order.merchant_id == user.user_id,
        _ => false,
    };
    if !is_party {
        return Err(AppError::Forbidden);
    }

    let order = order_service::cancel_order(&state, id).await?;
    Ok(Json(ApiResponse::success("Order cancelled", order.into(), Some(Meta::empty()))))
}

#[utoipa::path(
    post,
    path = "/api/orders/{id}/status",
    params(("id" = Uuid, Path, description = "Order id")),
    request_body = UpdateOrderStatusRequest,
    responses((status = 200, description = "Order accepted or delivered", body = ApiResponse<Order>)),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn update_order_status(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateOrderStatusRequest>,
) -> AppResult<Json<ApiResponse<Order>>> {
    ensure_merchant(&user)?;
    let order =
        order_service::advance_order_status(&state, user.user_id, id, payload.status).await?;
    Ok(Json(ApiResponse::success("Order updated", order.into(), Some(Meta::empty()))))
}

#[utoipa::path(
    post,
    path = "/api/orders/{id}/refund",
    params(("id" = Uuid, Path, description = "Order id")),
    request_body = RefundRequest,
    responses((status = 200, description = "Refund requested", body = ApiResponse<Refund>)),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn request_refund(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<RefundRequest>,
) -> AppResult<Json<ApiResponse<Refund>>> {
    ensure_student(&user)?;
    let refund = order_service::request_refund(&state, user.user_id, id, &payload.reason).await?;
    Ok(Json(ApiResponse::success("Refund requested", refund.into(), Some(Meta::empty()))))
}
